//! `flocons-mountfs`: mounts a local or remote flocons tree as a FUSE
//! filesystem. Equivalent to the original's `bin/floconsfs.cpp` and the
//! teacher's `client/src/main.rs`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use fuser::MountOption;

use flocons_core::http_client::HttpFileService;
use flocons_core::service::LocalFileService;
use flocons_core::url::Url;
use flocons_core::FileService;

mod config;
mod fs;

use fs::{FsWrapper, MountFs};

/// Mounts `<source>` (a filesystem path or an `http(s)://` URL) at
/// `<mount_point>`.
#[derive(Parser, Debug)]
#[command(name = "flocons-mountfs", version, about)]
struct Args {
    /// Increase log verbosity (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Context name used when writing new containers to a local source.
    /// Ignored for a remote (HTTP) source, where the peer owns write
    /// identity. See SPEC_FULL.md §6.
    #[arg(short = 'H', long, default_value = "localhost")]
    hostname: String,

    /// Optional TOML file overriding the default cache settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// A local directory, or an `http(s)://` URL naming a peer running
    /// `flocons-httpd`.
    source: String,

    /// Where to mount the filesystem.
    mount_point: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "flocons_mountfs=info,flocons_core=info",
        1 => "flocons_mountfs=debug,flocons_core=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    let service: Box<dyn FileService> = if Url::is_valid(&args.source) {
        tracing::info!(source = %args.source, "mounting a remote flocons peer");
        Box::new(HttpFileService::new(&args.source)?)
    } else {
        tracing::info!(source = %args.source, "mounting a local flocons tree");
        std::fs::create_dir_all(&args.source)?;
        Box::new(LocalFileService::new(args.hostname.clone(), &args.source))
    };

    let config = config::load_config(args.config.as_deref());
    let mount_fs = MountFs::new(service, config);
    let wrapper = FsWrapper(Arc::new(Mutex::new(mount_fs)));

    let options = vec![MountOption::AutoUnmount, MountOption::FSName("flocons".to_string())];
    tracing::info!(mount_point = %args.mount_point.display(), "mounting");
    fuser::mount2(wrapper, &args.mount_point, &options)?;
    Ok(())
}
