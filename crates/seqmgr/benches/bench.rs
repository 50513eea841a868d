use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use seqmgr::{ClientSeq, MemoryStore, SeqConfig, ServerSeq};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of FIDs minted per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn controller(config: &SeqConfig) -> Arc<ServerSeq<MemoryStore>> {
    Arc::new(ServerSeq::controller(MemoryStore::new(), config.clone()).unwrap())
}

/// Hot path: every mint is served from the client's current sequence.
fn bench_mint_local(c: &mut Criterion) {
    let config = SeqConfig::default();
    let server = controller(&config);

    let mut group = c.benchmark_group("client/local");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let client = ClientSeq::new(Arc::clone(&server), &config).unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(client.alloc_fid().unwrap());
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

/// Refill path: a tiny width and meta chunk force frequent trips to the
/// server.
fn bench_mint_refill(c: &mut Criterion) {
    let config = SeqConfig::default()
        .with_width(2)
        .with_meta_chunk(1)
        .with_super_chunk(64);
    let server = controller(&config);

    let mut group = c.benchmark_group("client/refill");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let client = ClientSeq::new(Arc::clone(&server), &config).unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(client.alloc_fid().unwrap());
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

/// One client per core, all refilling from the same server.
fn bench_mint_threaded(c: &mut Criterion) {
    let config = SeqConfig::default().with_width(16).with_meta_chunk(8);
    let server = controller(&config);
    let threads = num_cpus::get();

    let mut group = c.benchmark_group(format!("client/threads/{threads}"));
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let barrier = Barrier::new(threads + 1);
            // `scope` joins every thread before returning.
            let start = scope(|s| {
                for _ in 0..threads {
                    let server = Arc::clone(&server);
                    let config = &config;
                    let barrier = &barrier;
                    s.spawn(move || {
                        let client = ClientSeq::new(server, config).unwrap();
                        barrier.wait();
                        for _ in 0..iters {
                            for _ in 0..TOTAL_IDS {
                                black_box(client.alloc_fid().unwrap());
                            }
                        }
                    });
                }
                barrier.wait();
                Instant::now()
            });
            start.elapsed()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_mint_local,
    bench_mint_refill,
    bench_mint_threaded
);
criterion_main!(benches);
