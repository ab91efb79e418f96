//! Built-in detectors

mod citation;
mod contradiction;
mod grammar;

pub use citation::CitationDetector;
pub use contradiction::ContradictionDetector;
pub use grammar::GrammarDetector;
