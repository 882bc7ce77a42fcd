use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;
use swiftlit_core::annotator::{AnnotationReport, SwiftStringAnnotator};
use swiftlit_core::host::ScriptedHost;
use swiftlit_core::loader::LoadedImage;
use swiftlit_core::memory::{MemoryImage, SparseImage};
use swiftlit_core::model::Function;
use swiftlit_core::resolve::BackwardScanner;

use swiftlit::{parse_address, parse_func_range, sha256_file, ScanManifest};

/// Serializable result of one `scan` invocation.
#[derive(Debug, Serialize)]
struct ScanReport {
    image: String,
    sha256: String,
    generated_at: String,
    functions: Vec<AnnotationReport>,
}

/// Run the annotation pass over the requested functions and print results.
pub fn scan_command(
    image: &str,
    base: Option<String>,
    funcs: &[String],
    manifest: Option<String>,
    object: bool,
    json: bool,
) -> Result<()> {
    let image_path = Path::new(image);
    if !image_path.is_file() {
        return Err(anyhow!("Image file does not exist: {}", image_path.display()));
    }
    let sha256 = sha256_file(image_path)?;

    let mut functions: Vec<Function> =
        funcs.iter().map(|f| parse_func_range(f)).collect::<Result<_>>()?;

    let manifest = match manifest {
        Some(path) => Some(ScanManifest::load(Path::new(&path))?),
        None => None,
    };
    if let Some(manifest) = &manifest {
        functions.extend(manifest.function_ranges()?);
    }

    let bytes = fs::read(image_path)
        .with_context(|| format!("Failed to read image at {}", image_path.display()))?;

    let reports = if object {
        let loaded = LoadedImage::parse(&bytes)
            .with_context(|| format!("Failed to parse object file {}", image_path.display()))?;
        if functions.is_empty() {
            functions = loaded.functions().to_vec();
        }
        if functions.is_empty() {
            return Err(anyhow!("No function symbols in {}; pass --func", image_path.display()));
        }
        run_pass(loaded.image(), &functions)?
    } else {
        let base = match (base.as_deref(), &manifest) {
            (Some(text), _) => parse_address(text)?,
            (None, Some(m)) => m.base_address()?.ok_or_else(|| {
                anyhow!("A load address is required: pass --base or set it in the manifest")
            })?,
            (None, None) => {
                return Err(anyhow!(
                    "A load address is required: pass --base or set it in the manifest"
                ));
            }
        };
        if functions.is_empty() {
            return Err(anyhow!("No functions to scan: pass --func or a manifest"));
        }
        let mut sparse = SparseImage::new();
        sparse.map(base, bytes);
        run_pass(&sparse, &functions)?
    };

    if json {
        let report = ScanReport {
            image: image_path.display().to_string(),
            sha256,
            generated_at: Utc::now().to_rfc3339(),
            functions: reports,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("swiftlit v{}", swiftlit_core::version());
    println!("Image: {} (sha256 {sha256})", image_path.display());
    for report in &reports {
        println!(
            "Function {:#x}..{:#x}: {} site(s), {} annotated, {} skipped",
            report.function.start,
            report.function.end,
            report.sites.len(),
            report.annotated(),
            report.skipped()
        );
        for site in &report.sites {
            match (&site.literal, &site.skipped) {
                (Some(literal), _) => {
                    let value = site.site.resolved_value.unwrap_or_default();
                    let defined = site.site.defining_addr.unwrap_or_default();
                    println!(
                        "  - {:#x}: {:?} (base {value:#x}, defined at {defined:#x})",
                        site.site.target_addr, literal.text
                    );
                }
                (None, Some(reason)) => {
                    println!("  - {:#x}: skipped: {reason}", site.site.match_addr);
                }
                (None, None) => {}
            }
        }
    }

    Ok(())
}

fn run_pass(image: &dyn MemoryImage, functions: &[Function]) -> Result<Vec<AnnotationReport>> {
    let scanner = BackwardScanner::new(image);
    let annotator = SwiftStringAnnotator::new(image, &scanner);
    let mut host = ScriptedHost::new();

    functions
        .iter()
        .map(|function| {
            annotator.annotate_function(function, &mut host).with_context(|| {
                format!("Failed to scan function {:#x}..{:#x}", function.start, function.end)
            })
        })
        .collect()
}
