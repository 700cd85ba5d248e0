use std::process::ExitCode;
use std::time::Duration;

use arp_presence::{daemon, DaemonConfigBuilder};
use clap::Parser;
use log::{error, info};
use tracing_subscriber::EnvFilter;

/// Discovers hosts on local networks with ARP and reports them periodically
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Network interfaces to scan (e.g. `eth0` or `wlan0`)
    #[arg(required = true)]
    interfaces: Vec<String>,

    /// Seconds between scans
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// An HTTP POST endpoint (defaults to send to stdout)
    #[arg(long, default_value = "")]
    endpoint: String,

    /// Only use a single core (defaults to multicore)
    #[arg(long)]
    single_core: bool,

    /// Cache DNS responses for the endpoint
    #[arg(long)]
    cache_dns: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = match DaemonConfigBuilder::new(args.interfaces)
        .with_interval(Duration::from_secs(args.interval))
        .with_endpoint(&args.endpoint)
        .with_cache_dns(args.cache_dns)
        .build()
    {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let (mut builder, cores) = if args.single_core {
        (tokio::runtime::Builder::new_current_thread(), 1)
    } else {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.worker_threads(cores);
        (builder, cores)
    };
    let runtime = match builder.enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };
    info!("arp-presence initializing (#{} cores)", cores);

    match runtime.block_on(daemon::run(config)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
