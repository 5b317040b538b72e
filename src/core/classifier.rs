// ULP Validator - core/classifier.rs
//
// Structural line classification. Pure and stateless: the only rule is that
// a stripped, non-empty line splits into exactly three `:`-separated
// segments, with the third segment free to contain further colons.
// Field contents are not inspected.

use crate::core::model::{Classification, RejectReason};
use crate::util::constants::{RECORD_DELIMITER, RECORD_PARTS};

/// Classify a raw line (trailing newline allowed).
pub fn classify(raw: &str) -> Classification {
    let stripped = raw.trim();

    if stripped.is_empty() {
        return Classification::Rejected(RejectReason::EmptyLine);
    }

    if stripped.splitn(RECORD_PARTS, RECORD_DELIMITER).count() != RECORD_PARTS {
        return Classification::Rejected(RejectReason::NotEnoughParts);
    }

    Classification::Valid(stripped.to_string())
}
