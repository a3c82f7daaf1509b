use crate::types::RecordId;
use sha2::{Digest, Sha256};

/// Version constants stamped on stored classifications
pub mod versions {
    /// Bump when tokenization or scoring changes in a way that alters results
    pub const CLASSIFIER_VERSION: &str = "1.0.0";
}

/// Lookup key for a prior classification of a (document, dictionary) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassificationKey {
    pub document_id: RecordId,
    pub dictionary_id: RecordId,
}

impl ClassificationKey {
    pub fn new(document_id: RecordId, dictionary_id: RecordId) -> Self {
        Self {
            document_id,
            dictionary_id,
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.document_id.as_bytes());
        hasher.update(self.dictionary_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn pair_order_matters() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            ClassificationKey::new(a, b).to_cache_hash(),
            ClassificationKey::new(a, b).to_cache_hash()
        );
        assert_ne!(
            ClassificationKey::new(a, b).to_cache_hash(),
            ClassificationKey::new(b, a).to_cache_hash()
        );
    }
}
