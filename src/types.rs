//! Shared data model for the embedding pipeline.

use sha2::{Digest, Sha256};

/// A single embedding vector as returned by a provider.
///
/// The component count is fixed by the provider's model and identical for
/// every vector produced in one run.
pub type EmbeddingVector = Vec<f32>;

/// One input unit: a text plus its position in the caller-supplied list.
///
/// The index is assigned once from the original ordering and never
/// reassigned, so error reports and resume offsets always refer to the
/// caller's view of the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Zero-based position in the original input list.
    pub index: usize,
    /// The text to embed.
    pub text: String,
}

impl Record {
    /// Create a record at the given absolute position.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Derives a deterministic checkpoint key from an exact ordered set of texts.
///
/// Each record's length is hashed along with its bytes so that reshuffling
/// content across record boundaries changes the key. Callers may instead
/// supply their own key to [`crate::pipeline::EmbeddingPipeline::run`]; this
/// helper just gives them a sound default.
pub fn content_hash<S: AsRef<str>>(records: &[S]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        let text = record.as_ref();
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Checks that a checkpoint key is usable as a storage identifier.
///
/// Keys become file names in the filesystem backend, so only ASCII
/// alphanumerics, `-`, and `_` are accepted.
pub fn is_valid_hash_key(hash: &str) -> bool {
    !hash.is_empty()
        && hash
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        let records = vec!["first journey", "second journey"];
        assert_eq!(content_hash(&records), content_hash(&records));
    }

    #[test]
    fn content_hash_depends_on_order() {
        let forward = content_hash(&["a", "b"]);
        let reversed = content_hash(&["b", "a"]);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn content_hash_respects_record_boundaries() {
        // Same concatenated bytes, different record split.
        assert_ne!(content_hash(&["ab", "c"]), content_hash(&["a", "bc"]));
    }

    #[test]
    fn hash_key_validation() {
        assert!(is_valid_hash_key("abc123_DEF-456"));
        assert!(!is_valid_hash_key(""));
        assert!(!is_valid_hash_key("../escape"));
        assert!(!is_valid_hash_key("has space"));
    }
}
