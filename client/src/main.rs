use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use xbench::{Target, TransferConfig, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, FILL_BYTE};

mod trans_client;

use trans_client::TransClient;

#[derive(Parser, Debug)]
#[command(version, about = "Sends a fixed payload and reports throughput", long_about = None)]
struct Cli {
    /// Server to connect to: IP:PORT, tcp:IP:PORT, unix:PATH or vsock:CID:PORT
    #[arg(short, long, default_value_t = Target::default_client())]
    target: Target,

    /// Bytes per block
    #[arg(short = 's', long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Number of blocks to send
    #[arg(short = 'n', long, default_value_t = DEFAULT_BLOCK_COUNT)]
    block_count: usize,

    /// Byte the payload is filled with
    #[arg(long, default_value_t = FILL_BYTE)]
    fill_byte: u8,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TransferConfig::new()
        .with_block_size(cli.block_size)
        .with_block_count(cli.block_count)
        .with_fill_byte(cli.fill_byte);

    let client = TransClient::new(cli.target);
    let report = client
        .run(&config)
        .with_context(|| format!("transfer to {} failed", client.target()))?;

    info!("=== Send Complete ===");
    info!("Total sent: {} bytes", report.result.bytes_transferred);
    info!("Time: {:.6} seconds", report.result.elapsed.as_secs_f64());
    info!("Speed: {:.2} KB/s", report.result.kib_per_sec());
    if let Err(e) = &report.ack {
        warn!("Throughput above is valid, but the server did not acknowledge: {}", e);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
