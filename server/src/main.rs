use anyhow::Context;
use clap::Parser;
use log::{error, info};
use xbench::{Target, TransferConfig, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, RECV_CHUNK_SIZE};

mod trans_server;

use trans_server::TransServer;

#[derive(Parser, Debug)]
#[command(version, about = "Drains one transfer per run and reports throughput", long_about = None)]
struct Cli {
    /// Address to listen on: IP:PORT, tcp:IP:PORT, unix:PATH or vsock:CID:PORT
    #[arg(short, long, default_value_t = Target::default_server())]
    target: Target,

    /// Bytes per block the client is configured with
    #[arg(short = 's', long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Number of blocks the client is configured with
    #[arg(short = 'n', long, default_value_t = DEFAULT_BLOCK_COUNT)]
    block_count: usize,

    /// Bytes requested per read
    #[arg(long, default_value_t = RECV_CHUNK_SIZE)]
    recv_chunk: usize,

    /// Fail the run on a read error instead of treating it as end of stream
    #[arg(long)]
    strict_eof: bool,

    /// Number of transfers to serve, one connection each
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = TransferConfig::new()
        .with_block_size(cli.block_size)
        .with_block_count(cli.block_count)
        .with_recv_chunk_size(cli.recv_chunk)
        .with_strict_eof(cli.strict_eof);

    let server = TransServer::new(cli.target);
    for i in 1..=cli.runs {
        let report = server
            .run(&config)
            .with_context(|| format!("run {} on {} failed", i, server.target()))?;

        info!("=== Receive Complete ({}/{}) ===", i, cli.runs);
        info!("Peer: {}", report.peer);
        info!("Total received: {} bytes", report.result.bytes_transferred);
        info!("Time: {:.6} seconds", report.result.elapsed.as_secs_f64());
        info!("Speed: {:.2} KB/s", report.result.kib_per_sec());
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
