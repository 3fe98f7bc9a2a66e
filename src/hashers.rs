//! Pure, stateless fingerprint functions: `Path -> String`.
//!
//! Grounded on `dwetterau-photo-manager`'s `compute_trailing_hash`/
//! `compute_full_hash` (streamed SHA-256 over a fixed-size buffer),
//! generalized from a trailing-1MiB window to a leading-1024-byte partial
//! hash as required by spec.md 4.A.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{Result, ScanError};

/// Bytes read for the cheap first-pass fingerprint.
pub const PARTIAL_HASH_SIZE: u64 = 1024;

/// Block size used when streaming a file for the full hash.
const FULL_HASH_BLOCK_SIZE: usize = 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tiff", "bmp"];

/// Hash of the first 1024 bytes of `path`, or the whole file if smaller.
pub fn partial_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; PARTIAL_HASH_SIZE as usize];
    let mut total = 0usize;
    loop {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
        if total == buf.len() {
            break;
        }
    }
    buf.truncate(total);

    let mut hasher = Sha256::new();
    hasher.update(&buf);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash of the entire file content, streamed in fixed-size blocks.
pub fn full_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; FULL_HASH_BLOCK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Returns true if `path`'s extension matches a supported image format,
/// case-insensitively.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Perceptual fingerprint for supported image extensions.
///
/// Fails with [`ScanError::UnsupportedImageFormat`] for anything else —
/// callers are expected to have already branched on [`is_image_path`], this
/// is the defensive re-check for direct callers (e.g. tests).
pub fn image_hash(path: &Path) -> Result<String> {
    if !is_image_path(path) {
        return Err(ScanError::UnsupportedImageFormat(path.to_path_buf()));
    }

    let img = image::open(path).map_err(|_| ScanError::UnsupportedImageFormat(path.to_path_buf()))?;
    let hasher = image_hasher::HasherConfig::new().to_hasher();
    let hash = hasher.hash_image(&img);
    Ok(hash.to_base64())
}
