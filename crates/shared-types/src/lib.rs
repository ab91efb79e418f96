pub mod report;
pub mod types;

pub use report::{hash_document, ErrorReport};
pub use types::{Category, Defect, DetectorStatus, Finding, MimeKind, Severity, Span};
