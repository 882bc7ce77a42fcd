//! Shared helpers for the swiftlit CLI: address parsing, image hashing, and
//! the YAML function manifest.

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use swiftlit_core::model::Function;

/// Parse an address written as hex (`0x1000`) or decimal (`4096`).
pub fn parse_address(text: &str) -> Result<u64> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        text.parse::<u64>()
    };
    parsed.map_err(|_| anyhow!("Invalid address: {text:?}"))
}

/// Parse a `start:end` function range.
pub fn parse_func_range(text: &str) -> Result<Function> {
    let (start, end) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid function range {text:?}: expected start:end"))?;
    let function = Function::new(parse_address(start)?, parse_address(end)?);
    if function.byte_len() == 0 {
        return Err(anyhow!("Empty function range {text:?}"));
    }
    Ok(function)
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open image for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read image for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// YAML manifest describing where a raw image loads and which functions to
/// scan. Addresses are strings so hex stays unambiguous:
///
/// ```yaml
/// base: "0x100000000"
/// functions:
///   - start: "0x100004000"
///     end: "0x100004040"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ScanManifest {
    pub base: Option<String>,
    #[serde(default)]
    pub functions: Vec<ManifestFunction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFunction {
    pub start: String,
    pub end: String,
}

impl ScanManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest at {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse manifest at {}", path.display()))
    }

    pub fn base_address(&self) -> Result<Option<u64>> {
        self.base.as_deref().map(parse_address).transpose()
    }

    pub fn function_ranges(&self) -> Result<Vec<Function>> {
        self.functions
            .iter()
            .map(|f| parse_func_range(&format!("{}:{}", f.start, f.end)))
            .collect()
    }
}
