use clap::Parser;
use patchfit::cli::{init_env_logger, run, CliArgs};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_env_logger(args.verbose)?;
    run(args)
}
