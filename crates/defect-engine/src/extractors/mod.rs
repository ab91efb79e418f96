pub mod numerals;
