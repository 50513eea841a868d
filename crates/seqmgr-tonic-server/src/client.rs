//! `seqmgr-client`: mints FIDs against a running `seqmgr-server`.
//!
//! Each client thread owns one [`ClientSeq`] and leases meta-ranges over its
//! own gRPC channel. With `--print`, every FID is written to stdout as
//! `[seq:oid:ver]`. The throughput summary goes to stderr.

use anyhow::Context;
use clap::Parser;
use seqmgr_tonic_core::{
    seqmgr::{ClientSeq, Fid, SEQ_WIDTH, SeqConfig},
    transport::GrpcTransport,
};
use std::{
    thread,
    time::{Duration, Instant},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqmgr-client",
    version,
    about = "Mints FIDs from a seqmgr sequence server"
)]
struct ClientArgs {
    /// URL of the server to lease meta-ranges from.
    ///
    /// Environment variable: `SERVER_URL`
    #[arg(long, env = "SERVER_URL", default_value_t = String::from("http://127.0.0.1:50051"))]
    server_url: String,

    /// FIDs minted per client.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Number of concurrent clients, one thread each.
    #[arg(short, long, default_value_t = 1)]
    clients: usize,

    /// Object ids per sequence. Must match every other client of the
    /// deployment.
    ///
    /// Environment variable: `FID_WIDTH`
    #[arg(long, env = "FID_WIDTH", default_value_t = SEQ_WIDTH)]
    width: u32,

    /// Print every minted FID.
    #[arg(short, long, default_value_t = false)]
    print: bool,
}

struct Report {
    minted: usize,
    elapsed: Duration,
}

impl Report {
    fn print(&self, clients: usize) {
        let secs = self.elapsed.as_secs_f64();
        eprintln!(
            "{:>10} FIDs | {:>3} clients | {:>8.2} ms | {:>12.2} FID/sec",
            self.minted,
            clients,
            secs * 1000.0,
            self.minted as f64 / secs
        );
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = ClientArgs::parse();
    if args.clients == 0 {
        anyhow::bail!("--clients must be greater than 0");
    }

    let config = SeqConfig::default().with_width(args.width);
    config.validate().context("invalid client configuration")?;

    // The allocator blocks on the runtime from plain threads, so the runtime
    // is built by hand rather than through `#[tokio::main]`.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("can't build tokio runtime")?;

    let transports = (0..args.clients)
        .map(|_| runtime.block_on(GrpcTransport::connect(args.server_url.clone())))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("can't reach server at {}", args.server_url))?;

    let start = Instant::now();
    let minted = thread::scope(|s| -> anyhow::Result<Vec<Vec<Fid>>> {
        let handles: Vec<_> = transports
            .into_iter()
            .map(|transport| {
                let config = &config;
                s.spawn(move || -> anyhow::Result<Vec<Fid>> {
                    let client = ClientSeq::new(transport, config)?;
                    let fids = (0..args.count)
                        .map(|_| client.alloc_fid())
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(fids)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("client thread panicked"))?
            })
            .collect()
    })?;
    let report = Report {
        minted: minted.iter().map(Vec::len).sum(),
        elapsed: start.elapsed(),
    };

    if args.print {
        for fid in minted.iter().flatten() {
            println!("{fid}");
        }
    }
    report.print(args.clients);
    Ok(())
}
