//! rssfs - Mount RSS and Atom feeds as a read-only FUSE filesystem.
//!
//! Usage: rssfs [--config <path>] [--mountpoint <dir>]

use anyhow::{Context, Result};
use clap::Parser;
use rssfs_core::{Config, HtmlRenderer, HttpFeedSource, Materializer, Owner, TreeBuilder};
use rssfs_fuse::{MountConfig, RssFS};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rssfs")]
#[command(about = "Mount RSS and Atom feeds as a read-only filesystem")]
#[command(version)]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/rssfs/config.toml)
    #[arg(short, long, env = "RSSFS_CONFIG")]
    config: Option<PathBuf>,

    /// Mountpoint, overriding the configuration file
    #[arg(short, long)]
    mountpoint: Option<PathBuf>,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,

    /// Number of feed refresh workers
    #[arg(long, default_value_t = rssfs_fuse::config::DEFAULT_REFRESH_WORKERS)]
    workers: usize,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => rssfs_core::config::config_path().context("Failed to locate configuration")?,
    };
    let config = Config::load(&config_path).context("Failed to load configuration")?;
    let mountpoint = config
        .resolve_mountpoint(&config_path, cli.mountpoint.clone())
        .context("Failed to determine mountpoint")?;

    let owner = Owner::current().context("Failed to resolve the invoking user")?;

    info!(
        config = %config_path.display(),
        categories = config.categories.len(),
        feeds = config.feed_count(),
        "Building feed tree"
    );
    let source = Arc::new(HttpFeedSource::new());
    let root = TreeBuilder::new(source.clone())
        .build(&config.categories)
        .context("Failed to build feed tree")?;
    let materializer = Materializer::new(source, Arc::new(HtmlRenderer));

    let mount_config = MountConfig::default()
        .refresh_workers(cli.workers)
        .allow_other(cli.allow_other);
    let fs = RssFS::new(&root, materializer, owner, &mount_config)
        .context("Failed to initialize filesystem")?;

    // Set up channel for signal handling
    let (tx, rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to set signal handler")?;

    let handle = rssfs_fuse::mount(fs, &mountpoint, &mount_config)
        .with_context(|| format!("Failed to mount at {}", mountpoint.display()))?;

    info!(mountpoint = %handle.mountpoint().display(), "Serving (press Ctrl+C to unmount)");

    if rx.recv().is_err() {
        warn!("Signal channel closed unexpectedly");
    }

    info!("Unmounting");
    handle.unmount();
    Ok(())
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}
