use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use swiftlit_core::loader::LoadedImage;
use swiftlit_core::signatures::{SymbolResolver, SIGNATURES};

/// One catalog row, with the address it resolves to when an object file was
/// given.
#[derive(Debug, Serialize)]
struct SignatureRow {
    symbol: &'static str,
    prototype: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<u64>,
}

/// List the known-signature catalog, optionally resolved against an object
/// file's symbol table.
pub fn signatures_command(object: Option<String>, json: bool) -> Result<()> {
    let loaded = match object {
        Some(path) => {
            let path = Path::new(&path);
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read object file {}", path.display()))?;
            Some(LoadedImage::parse(&bytes).with_context(|| {
                format!("Failed to parse object file {}", path.display())
            })?)
        }
        None => None,
    };

    let rows: Vec<SignatureRow> = SIGNATURES
        .iter()
        .map(|entry| SignatureRow {
            symbol: entry.symbol,
            prototype: entry.prototype,
            address: loaded.as_ref().and_then(|l| l.resolve(entry.symbol)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Signatures ({}):", rows.len());
    for row in &rows {
        match row.address {
            Some(addr) => println!("  - {} @ {addr:#x}", row.symbol),
            None => println!("  - {}", row.symbol),
        }
        println!("      {}", row.prototype);
    }
    if loaded.is_some() {
        let resolved = rows.iter().filter(|r| r.address.is_some()).count();
        println!("{resolved} of {} symbols resolve in this image", rows.len());
    }

    Ok(())
}
