//! Content fingerprints.
//!
//! Files are streamed in fixed-size chunks so large videos are never loaded
//! in memory.

use crate::error::{Result, ToolError};
use sha2::Digest;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithmKind {
    #[default]
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithmKind::Md5 => "md5",
            HashAlgorithmKind::Sha1 => "sha1",
            HashAlgorithmKind::Sha224 => "sha224",
            HashAlgorithmKind::Sha256 => "sha256",
            HashAlgorithmKind::Sha384 => "sha384",
            HashAlgorithmKind::Sha512 => "sha512",
        };
        write!(f, "{}", name)
    }
}

/// Lowercase hexadecimal digest of the file content
pub fn hash_file(path: &Path, algorithm: HashAlgorithmKind) -> Result<String> {
    let file = File::open(path).map_err(|e| ToolError::io(path, e))?;
    match algorithm {
        HashAlgorithmKind::Md5 => {
            let mut context = md5::Context::new();
            stream(file, path, |chunk| context.consume(chunk))?;
            Ok(format!("{:x}", context.compute()))
        }
        HashAlgorithmKind::Sha1 => digest::<sha1::Sha1>(file, path),
        HashAlgorithmKind::Sha224 => digest::<sha2::Sha224>(file, path),
        HashAlgorithmKind::Sha256 => digest::<sha2::Sha256>(file, path),
        HashAlgorithmKind::Sha384 => digest::<sha2::Sha384>(file, path),
        HashAlgorithmKind::Sha512 => digest::<sha2::Sha512>(file, path),
    }
}

fn digest<D: Digest>(file: File, path: &Path) -> Result<String> {
    let mut hasher = D::new();
    stream(file, path, |chunk| hasher.update(chunk))?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect())
}

fn stream(mut file: File, path: &Path, mut consume: impl FnMut(&[u8])) -> Result<()> {
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer).map_err(|e| ToolError::io(path, e))?;
        if read == 0 {
            return Ok(());
        }
        consume(&buffer[..read]);
    }
}
