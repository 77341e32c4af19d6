//! Subresource integrity checking
//!
//! Lock manifests record an SRI string (`<algo>-<base64 digest>`) for each
//! tarball. Pre-fetched tarballs are verified against it before they are
//! trusted into the cache.
//!
//! https://w3c.github.io/webappsec-subresource-integrity

use crate::error::{CrossnpmError, CrossnpmResult};
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fs;
use std::path::Path;

/// A parsed subresource integrity value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integrity {
    pub algo: Algo,
    /// Hex-encoded expected digest
    pub digest: String,
}

/// Digest algorithms accepted in SRI strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algo {
    Sha256,
    Sha384,
    Sha512,
}

impl Integrity {
    /// Parse an SRI string like `sha512-q83f...==`
    pub fn parse(sri: &str) -> CrossnpmResult<Self> {
        let (algo, value) = sri
            .split_once('-')
            .ok_or_else(|| CrossnpmError::IntegrityUnsupported(sri.to_string()))?;

        let algo = match algo {
            "sha256" => Algo::Sha256,
            "sha384" => Algo::Sha384,
            "sha512" => Algo::Sha512,
            _ => return Err(CrossnpmError::IntegrityUnsupported(sri.to_string())),
        };

        let raw = base64::engine::general_purpose::STANDARD
            .decode(value)
            .map_err(|_| CrossnpmError::IntegrityUnsupported(sri.to_string()))?;

        Ok(Self {
            algo,
            digest: hex::encode(raw),
        })
    }

    /// Check a file's contents against this integrity value
    pub fn verify_file(&self, path: &Path) -> CrossnpmResult<()> {
        let contents = fs::read(path)
            .map_err(|e| CrossnpmError::io(format!("reading {}", path.display()), e))?;

        let actual = match self.algo {
            Algo::Sha256 => hex::encode(Sha256::digest(&contents)),
            Algo::Sha384 => hex::encode(Sha384::digest(&contents)),
            Algo::Sha512 => hex::encode(Sha512::digest(&contents)),
        };

        if actual == self.digest {
            Ok(())
        } else {
            Err(CrossnpmError::IntegrityMismatch(path.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sri_for(algo: &str, data: &[u8]) -> String {
        let digest: Vec<u8> = match algo {
            "sha256" => Sha256::digest(data).to_vec(),
            "sha384" => Sha384::digest(data).to_vec(),
            "sha512" => Sha512::digest(data).to_vec(),
            _ => unreachable!(),
        };
        format!(
            "{}-{}",
            algo,
            base64::engine::general_purpose::STANDARD.encode(digest)
        )
    }

    #[test]
    fn parse_valid_sri() {
        let sri = sri_for("sha512", b"tarball bytes");
        let integrity = Integrity::parse(&sri).unwrap();
        assert_eq!(integrity.algo, Algo::Sha512);
        assert_eq!(integrity.digest.len(), 128);
    }

    #[test]
    fn parse_rejects_unknown_algo() {
        let err = Integrity::parse("md5-abcd").unwrap_err();
        assert!(matches!(err, CrossnpmError::IntegrityUnsupported(_)));
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(Integrity::parse("sha512").is_err());
    }

    #[test]
    fn parse_rejects_bad_base64() {
        assert!(Integrity::parse("sha256-!!not-base64!!").is_err());
    }

    #[test]
    fn verify_matching_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg.tgz");
        fs::write(&path, b"tarball bytes").unwrap();

        for algo in ["sha256", "sha384", "sha512"] {
            let integrity = Integrity::parse(&sri_for(algo, b"tarball bytes")).unwrap();
            integrity.verify_file(&path).unwrap();
        }
    }

    #[test]
    fn verify_detects_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg.tgz");
        fs::write(&path, b"tampered bytes").unwrap();

        let integrity = Integrity::parse(&sri_for("sha512", b"tarball bytes")).unwrap();
        let err = integrity.verify_file(&path).unwrap_err();
        assert!(matches!(err, CrossnpmError::IntegrityMismatch(_)));
    }
}
