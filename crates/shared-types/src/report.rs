//! Error report returned for one analysis request

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Defect, DetectorStatus};

/// Result of analysing one document.
///
/// `errors` are ordered by span start, then by descending severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub document_ref: String,
    pub errors: Vec<Defect>,
    pub detector_status: BTreeMap<String, DetectorStatus>,
}

impl ErrorReport {
    /// No defects were found (not the same as a failed analysis).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when at least one detector did not finish successfully.
    pub fn is_partial(&self) -> bool {
        self.detector_status.values().any(|s| !s.is_ok())
    }
}

/// Compute SHA-256 hash of document bytes
pub fn hash_document(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Document hash function is deterministic
        #[test]
        fn hash_document_deterministic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
            let hash1 = hash_document(&data);
            let hash2 = hash_document(&data);
            prop_assert_eq!(&hash1, &hash2);
            prop_assert_eq!(hash1.len(), 64); // SHA-256 hex is 64 chars
        }
    }
}
