use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Derive a stable document id from an arbitrary origin string (a file
/// path, a collection key, a UUID from the host application).
pub fn document_id(origin: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(origin.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within one document.
///
/// Ids look like `a3f91c2-17`. The counter is part of the document state and
/// is cloned along with it, so a staged copy of a document hands out the
/// same ids as the committed one when the same ops replay against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(origin: &str) -> Self {
        Self {
            seed: document_id(origin),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate the next sequential id.
    pub fn next_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Advance past an id minted elsewhere (op replay from another copy of
    /// the document), so this generator never re-issues it.
    pub fn observe(&mut self, id: &str) {
        if let Some(suffix) = id.strip_prefix(&format!("{}-", self.seed)) {
            if let Ok(n) = suffix.parse::<u64>() {
                self.count = self.count.max(n);
            }
        }
    }
}
