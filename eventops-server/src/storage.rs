//! Payment-proof image storage
//!
//! Paid song requests attach a proof-of-payment image that staff review
//! before approval. The service only needs store/delete against an opaque
//! key, so the backend sits behind the [`ProofStore`] trait; the shipped
//! implementation writes to the local data directory and the files are
//! served statically under `/proofs`.

use eventops_common::{Error, Result};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Upload size limit for proof images (5 MB)
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

/// Accepted proof image content types
pub const ALLOWED_PROOF_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A stored proof image: public URL plus the key used to delete it later
#[derive(Debug, Clone)]
pub struct StoredProof {
    pub url: String,
    pub key: String,
}

/// Object storage for proof images
pub trait ProofStore: Send + Sync {
    /// Persist image bytes, returning the public URL and deletion key
    fn store(&self, bytes: &[u8], content_type: &str) -> Result<StoredProof>;

    /// Remove a previously stored image by key
    fn delete(&self, key: &str) -> Result<()>;
}

/// Local-filesystem proof storage under `<data-dir>/proofs`
pub struct LocalProofStore {
    root: PathBuf,
}

impl LocalProofStore {
    /// Create the store, ensuring the proofs directory exists
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(LocalProofStore { root })
    }

    /// Directory the static file route serves from
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn extension_for(content_type: &str) -> Result<&'static str> {
        match content_type {
            "image/jpeg" | "image/jpg" => Ok("jpg"),
            "image/png" => Ok("png"),
            "image/webp" => Ok("webp"),
            other => Err(Error::InvalidInput(format!(
                "Unsupported proof image type: {other}"
            ))),
        }
    }
}

impl ProofStore for LocalProofStore {
    fn store(&self, bytes: &[u8], content_type: &str) -> Result<StoredProof> {
        let ext = Self::extension_for(content_type)?;
        let key = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.root.join(&key);

        std::fs::write(&path, bytes)?;
        info!("Stored proof image {} ({} bytes)", key, bytes.len());

        Ok(StoredProof {
            url: format!("/proofs/{key}"),
            key,
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        // Keys are generated UUID filenames; reject anything path-like
        if key.contains('/') || key.contains("..") {
            return Err(Error::InvalidInput(format!("Invalid proof key: {key}")));
        }
        std::fs::remove_file(self.root.join(key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalProofStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalProofStore::new(dir.path().join("proofs")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_store_and_delete_round_trip() {
        let (_dir, store) = store();

        let stored = store.store(b"fake image bytes", "image/png").unwrap();
        assert!(stored.url.starts_with("/proofs/"));
        assert!(stored.key.ends_with(".png"));
        assert!(store.root().join(&stored.key).exists());

        store.delete(&stored.key).unwrap();
        assert!(!store.root().join(&stored.key).exists());
    }

    #[test]
    fn test_store_rejects_unknown_content_type() {
        let (_dir, store) = store();
        assert!(store.store(b"gif", "image/gif").is_err());
        assert!(store.store(b"pdf", "application/pdf").is_err());
    }

    #[test]
    fn test_delete_missing_key_errors() {
        let (_dir, store) = store();
        // Callers treat proof deletion as best-effort; the error surfaces
        // so they can log it
        assert!(store.delete("does-not-exist.png").is_err());
    }

    #[test]
    fn test_delete_rejects_path_traversal() {
        let (_dir, store) = store();
        assert!(store.delete("../outside.png").is_err());
    }
}
