use anyhow::{Context, Result};
use std::{env, num::NonZeroUsize, path::PathBuf};
use structopt::StructOpt;
use train::{config::Config, RunOptions};

#[derive(Debug, Clone, StructOpt)]
/// Produce Faster R-CNN training batches and log their statistics
struct Args {
    #[structopt(long, default_value = "train.json5")]
    /// configuration file
    pub config_file: PathBuf,
    #[structopt(long, default_value = "4")]
    /// number of threads pulling from the feed
    pub num_workers: NonZeroUsize,
    #[structopt(long, default_value = "100")]
    /// total number of batches to produce
    pub num_batches: usize,
    #[structopt(long)]
    /// lock the feed for the whole batch rather than the cursor only
    pub lock_whole_batch: bool,
}

fn main() -> Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let Args {
        config_file,
        num_workers,
        num_batches,
        lock_whole_batch,
    } = Args::from_args();
    let config = Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;

    train::start(
        config,
        RunOptions {
            num_workers,
            num_batches,
            lock_whole_batch,
        },
    )?;

    Ok(())
}
