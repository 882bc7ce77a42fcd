use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Swift ARM64 string-literal and signature annotator.
///
/// This CLI is a thin wrapper around `swiftlit-core` (exposed in code as
/// `swiftlit_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "swiftlit",
    version,
    about = "Swift ARM64 string-literal annotator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan functions for Swift string sites and report recovered literals.
    ///
    /// The image is either a raw memory dump mapped at `--base`, or a
    /// Mach-O/ELF object file with `--object` (functions then come from the
    /// symbol table unless `--func` narrows them).
    Scan {
        /// Path to the image file.
        image: String,

        /// Load address for a raw image (hex accepted, e.g. 0x100000000).
        #[arg(long)]
        base: Option<String>,

        /// Function range to scan, as `start:end`. Repeatable.
        #[arg(long = "func")]
        funcs: Vec<String>,

        /// YAML manifest naming the load address and function ranges.
        #[arg(long)]
        manifest: Option<String>,

        /// Parse the image as a Mach-O/ELF object instead of raw bytes.
        #[arg(long, default_value_t = false)]
        object: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the known-signature catalog.
    ///
    /// With `--object`, each catalog symbol is resolved against the file's
    /// symbol table and reported with the address it would be applied at.
    Signatures {
        /// Object file to resolve catalog symbols against.
        #[arg(long)]
        object: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Decode one instruction word from a raw image.
    Decode {
        /// Path to the raw image file.
        image: String,

        /// Load address of the image.
        #[arg(long)]
        base: String,

        /// Address of the instruction to decode.
        addr: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Scan { image, base, funcs, manifest, object, json } => {
            commands::scan_command(&image, base, &funcs, manifest, object, json)
        }
        Command::Signatures { object, json } => commands::signatures_command(object, json),
        Command::Decode { image, base, addr } => commands::decode_command(&image, &base, &addr),
    }
}
