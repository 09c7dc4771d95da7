//! Streamed content hashing.
//!
//! Files are fed through BLAKE3 in fixed-size blocks so arbitrarily
//! large files hash in bounded memory.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Read buffer size for hashing. 64 KiB keeps memory flat while staying
/// large enough to amortize syscall overhead.
pub(crate) const BLOCK_SIZE: usize = 64 * 1024;

/// Compute the BLAKE3 digest of a file's content as a hex string.
pub fn hash_file(path: &Path) -> CoreResult<String> {
    let mut file = File::open(path).map_err(|e| CoreError::HashFailure {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; BLOCK_SIZE];

    loop {
        let n = file.read(&mut buf).map_err(|e| CoreError::HashFailure {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_same_hash() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, "hello").unwrap();
        fs::write(&b, "hello").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_different_content_different_hash() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, "hello").unwrap();
        fs::write(&b, "world").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_missing_file_is_hash_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = hash_file(&temp_dir.path().join("gone.bin"));
        assert!(matches!(result, Err(CoreError::HashFailure { .. })));
    }
}
