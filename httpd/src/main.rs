//! `flocons-httpd`: exposes one `LocalFileService` over HTTP. Equivalent
//! to the original's `bin/floconsd.cpp` and the teacher's `server/src/main.rs`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use flocons_core::service::LocalFileService;
use flocons_core::FileService;

/// Serves one directory tree over HTTP as a flocons file service.
#[derive(Parser, Debug)]
#[command(name = "flocons-httpd", version, about)]
struct Args {
    /// Increase log verbosity (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Context name this daemon writes its containers under. Defaults to
    /// the local hostname in the original; this port defaults to a fixed
    /// name rather than pulling in a hostname crate no example in the
    /// pack depends on (see SPEC_FULL.md §6).
    #[arg(short = 'H', long, default_value = "localhost")]
    hostname: String,

    /// TCP port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Directory this daemon serves.
    data_folder: std::path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "flocons_httpd=info,flocons_core=info,tower_http=info",
        1 => "flocons_httpd=debug,flocons_core=debug,tower_http=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    std::fs::create_dir_all(&args.data_folder)?;
    let service: Arc<dyn FileService> = Arc::new(LocalFileService::new(args.hostname, &args.data_folder));
    let addr = SocketAddr::new(IpAddr::from([0, 0, 0, 0]), args.port);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(flocons_httpd::serve(service, addr))
}
