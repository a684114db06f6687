use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::SelError;
use crate::serde::{to_json_bytes, JsonLayout};

/// Incremental SHA-256 over numeric columns and JSON documents.
///
/// Every item is length-prefixed, so column and document boundaries are part
/// of the hash. Column values are hashed as little-endian IEEE-754 bits with
/// `-0.0` folded into `0.0` and every NaN folded into one canonical NaN.
pub struct ContentHasher {
    digest: Sha256,
}

impl ContentHasher {
    /// Starts a hash whose input is tagged with `kind` (e.g. `"record-set"`).
    pub fn new(kind: &str) -> Self {
        let mut hasher = Self {
            digest: Sha256::new(),
        };
        hasher.bytes(kind.as_bytes());
        hasher
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.digest.update((bytes.len() as u64).to_le_bytes());
        self.digest.update(bytes);
    }

    /// Feeds one named column.
    pub fn column(&mut self, name: &str, values: &[f64]) -> &mut Self {
        self.bytes(name.as_bytes());
        self.digest.update((values.len() as u64).to_le_bytes());
        for value in values {
            let canonical = if value.is_nan() {
                f64::NAN
            } else if *value == 0.0 {
                0.0
            } else {
                *value
            };
            self.digest.update(canonical.to_bits().to_le_bytes());
        }
        self
    }

    /// Feeds the compact sorted-key JSON form of `value`.
    pub fn document<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, SelError> {
        let bytes = to_json_bytes(value, JsonLayout::Compact)?;
        self.bytes(&bytes);
        Ok(self)
    }

    /// Lower-case hex digest.
    pub fn finish(self) -> String {
        format!("{:x}", self.digest.finalize())
    }
}

/// Hash of a single serializable document, such as a pipeline configuration.
pub fn document_hash<T: Serialize>(value: &T) -> Result<String, SelError> {
    let mut hasher = ContentHasher::new("document");
    hasher.document(value)?;
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_hash(name: &str, values: &[f64]) -> String {
        let mut hasher = ContentHasher::new("record-set");
        hasher.column(name, values);
        hasher.finish()
    }

    #[test]
    fn signed_zero_and_nan_payloads_hash_alike() {
        assert_eq!(column_hash("B0_MM", &[0.0]), column_hash("B0_MM", &[-0.0]));
        let quiet = f64::from_bits(0x7ff8_0000_0000_0001);
        assert_eq!(column_hash("BDT", &[quiet]), column_hash("BDT", &[f64::NAN]));
    }

    #[test]
    fn column_boundaries_matter() {
        let mut split = ContentHasher::new("record-set");
        split.column("a", &[1.0]).column("b", &[2.0]);
        let mut joined = ContentHasher::new("record-set");
        joined.column("a", &[1.0, 2.0]);
        assert_ne!(split.finish(), joined.finish());
    }

    #[test]
    fn kind_tags_separate_hashes() {
        let mut a = ContentHasher::new("record-set");
        a.column("x", &[]);
        let mut b = ContentHasher::new("document");
        b.column("x", &[]);
        assert_ne!(a.finish(), b.finish());
        assert_eq!(document_hash(&[1, 2]).unwrap().len(), 64);
    }
}
