//! Command-line argument parsing and orchestration (§4.10, §6). Grounded in
//! the teacher's `src/main.rs` dispatch pattern and `cli/src/perm/rand.rs`'s
//! per-command `CliArgs` + `fn main(args) -> anyhow::Result<()>` shape,
//! adapted to a single-command binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use crate::error::PatchFitError;
use crate::filesize::parse_filesize;
use crate::freespace::Freespace;
use crate::loader;
use crate::target::Target;

#[derive(Parser, Debug)]
#[command(name = "patchfit", about = "Fits and writes declaratively-specified binary patches into a target file.", long_about = None)]
pub struct CliArgs {
    /// The file to patch.
    pub target: PathBuf,
    /// The patch JSON file describing what to write.
    pub patch: PathBuf,

    #[arg(short = 'o', long)]
    /// Output file path; if absent, the target is overwritten in place.
    pub output: Option<PathBuf>,

    #[arg(short = 'f', long = "free-input")]
    /// Freespace JSON file to read.
    pub free_input: Option<PathBuf>,

    #[arg(short = 'F', long = "free-output")]
    /// Freespace JSON file to write on exit, reflecting space consumed by this run.
    pub free_output: Option<PathBuf>,

    #[arg(short = 'd', long)]
    /// Pointer-defaults JSON file; defaults are empty if absent.
    pub defaults: Option<PathBuf>,

    #[arg(short = 'r', long, num_args = 1..)]
    /// Explicit root patch names. If absent, every name starting with `_` is a root.
    pub roots: Option<Vec<String>>,

    #[arg(short = 'l', long)]
    /// Append virtual freespace up to SIZE bytes past the current end of file
    /// (e.g. "64k", "2mb"); see the filesize suffix rules in the README.
    pub limit: Option<String>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    /// Raise the log level; repeatable (-v info, -vv debug, -vvv trace).
    /// Ignored if `RUST_LOG` is set.
    pub verbose: u8,
}

/// Initializes `env_logger` at a level derived from `-v` count, deferring to
/// `RUST_LOG` if it is set, matching the teacher's `init_env_logger`.
pub fn init_env_logger(verbose: u8) -> Result<()> {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init()
        .context("could not initialize logger")
}

fn default_roots(patch_map: &crate::propagate::PatchMap) -> Vec<String> {
    patch_map
        .keys()
        .filter(|name| name.starts_with('_'))
        .cloned()
        .collect()
}

/// Runs the full load → propagate → fit → write → save pipeline for one
/// invocation (§4.10's orchestration sequence).
pub fn run(args: CliArgs) -> Result<()> {
    let target_bytes = std::fs::read(&args.target)
        .with_context(|| format!("could not read target file {}", args.target.display()))?;

    let freespace = match &args.free_input {
        Some(path) => loader::load_freespace_file(path)
            .with_context(|| format!("could not load freespace file {}", path.display()))?,
        None => Freespace::new(),
    };

    let mut target = Target::new(target_bytes, freespace);

    if let Some(limit) = &args.limit {
        let size = parse_filesize(limit)?;
        let size: u64 = size
            .try_into()
            .map_err(|_| PatchFitError::InvalidFilesize(limit.clone()))?;
        target.extend_limit(size);
    }

    info!("loading patch file {}", args.patch.display());
    let patch_map = loader::load_patch_file(&args.patch, args.defaults.as_deref())
        .with_context(|| format!("could not load patch file {}", args.patch.display()))?;

    let roots = args.roots.clone().unwrap_or_else(|| default_roots(&patch_map));
    info!("using root set: {roots:?}");

    let result = target.write_patch(&patch_map, &roots);
    let fit_map = match result {
        Ok(fit_map) => fit_map,
        Err(PatchFitError::FittingFailed) => {
            error!("fitting failed: no placement satisfies every constraint");
            return Err(PatchFitError::FittingFailed.into());
        }
        Err(e) => return Err(e.into()),
    };

    let output_path = args.output.as_ref().unwrap_or(&args.target);
    std::fs::write(output_path, target.data())
        .with_context(|| format!("could not write output file {}", output_path.display()))?;

    if let Some(free_output) = &args.free_output {
        let json = loader::freespace_to_json(target.freespace());
        let text = serde_json::to_string_pretty(&json).context("could not serialize freespace")?;
        std::fs::write(free_output, text)
            .with_context(|| format!("could not write freespace file {}", free_output.display()))?;
    }

    info!(
        "patched {} bytes across {} patch(es)",
        target.data().len(),
        fit_map.len()
    );
    Ok(())
}
