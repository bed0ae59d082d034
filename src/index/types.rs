use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Number of bytes in an index ngram
pub const NGRAM_SIZE: usize = 3;

/// Index of a file within the store (0-based)
pub type FileId = u32;

/// Branch identifier, one bit in a file's branch mask
pub type BranchId = u32;

/// Fixed-width token of lower-cased text, packed big-endian into an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ngram(u64);

impl Ngram {
    /// Pack up to eight bytes into a key.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= 8);
        Self(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Key of the ngram starting at `pos` in `text`.
    #[inline]
    pub fn at(text: &[u8], pos: usize) -> Self {
        Self::from_bytes(&text[pos..pos + NGRAM_SIZE])
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; NGRAM_SIZE] {
        let mut out = [0u8; NGRAM_SIZE];
        for (i, b) in out.iter_mut().enumerate() {
            *b = (self.0 >> (8 * (NGRAM_SIZE - 1 - i))) as u8;
        }
        out
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ngram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// A byte range inside the posting blob. Never owns data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    pub offset: u32,
    pub size: u32,
}

impl Section {
    pub fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Configuration for loading a directory into an index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Label for the whole index
    pub repo_name: String,
    /// Files larger than this are skipped (bytes)
    pub max_file_size: u64,
    /// Directory names that are never descended into
    pub ignored_paths: Vec<String>,
    /// Skip files that look binary
    pub skip_binary: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            repo_name: String::new(),
            // Offsets are u32, keep well clear of the limit
            max_file_size: 16 * 1024 * 1024,
            ignored_paths: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
            ],
            skip_binary: true,
        }
    }
}

impl BuildConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        let config = serde_json::from_reader(file)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngram_packing() {
        let g = Ngram::from_bytes(b"abc");
        assert_eq!(g.raw(), 0x616263);
        assert_eq!(g.to_bytes(), *b"abc");
        assert_eq!(Ngram::at(b"xxabcxx", 2), g);
        assert_ne!(Ngram::from_bytes(b"abd"), g);
    }

    #[test]
    fn test_section_end() {
        let s = Section::new(u32::MAX, 10);
        assert_eq!(s.end(), u32::MAX as u64 + 10);
        assert!(Section::default().is_empty());
    }

    #[test]
    fn test_build_config_partial_json() {
        let config: BuildConfig = serde_json::from_str(r#"{"repo_name": "demo"}"#).unwrap();
        assert_eq!(config.repo_name, "demo");
        assert!(config.skip_binary);
        assert_eq!(config.ignored_paths.len(), 3);
    }
}
