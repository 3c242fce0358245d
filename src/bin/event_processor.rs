// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! event_processor - Tail the event log, validate events, report latency.
//!
//! Usage:
//!   event_processor [log_path]
//!
//! Reads `TRADELOG_PATH` and falls back to `../data/event_log.bin` when no
//! positional argument is given. A producer thread tails the log into a
//! lock-free ring; a consumer thread validates each event and records its
//! processing latency; a monitor thread prints periodic throughput. SIGINT
//! and SIGTERM trigger a graceful drain-then-exit.

use clap::Parser;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use tradelog::clock::monotonic_nanos;
use tradelog::config::LogPathConfig;
use tradelog::frame::Frame;
use tradelog::histogram::LatencyHistogram;
use tradelog::reader::LogReader;
use tradelog::ring::SpscRing;
use tradelog::tailer::Tailer;
use tradelog::validator::Validator;

/// Ring capacity between the producer and consumer threads. Must stay a
/// power of two; usable capacity is one less (see `SpscRing`).
const RING_CAPACITY: usize = 4096;

/// How often the consumer flushes and resets its latency histogram.
const HISTOGRAM_FLUSH_INTERVAL: u64 = 10_000;

/// Default interval, in seconds, at which the monitor thread prints a
/// throughput line.
const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;

/// Timeout passed to `Tailer::wait_for_modification` on each idle cycle.
const TAIL_WAIT_TIMEOUT_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "event_processor")]
#[command(about = "Tail the trade event log, validate events, report latency")]
#[command(version)]
struct Args {
    /// Path to the event log file
    log_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds between monitor throughput reports
    #[arg(long, default_value_t = DEFAULT_STATS_INTERVAL_SECS)]
    stats_interval: u64,

    /// Suppress the monitor's periodic throughput line
    #[arg(short, long)]
    quiet: bool,
}

/// Shared counters the producer, consumer, and monitor threads publish
/// into and read from; each field has exactly one writer.
#[derive(Default)]
struct Counters {
    frames_read: AtomicU64,
    frames_processed: AtomicU64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .init();

    let config = LogPathConfig::resolve(args.log_path.as_deref())?;
    info!(path = %config.as_path().display(), "event_processor starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("shutdown signal received, draining");
            shutdown.store(true, Ordering::Release);
        })?;
    }

    let ring: Arc<SpscRing<Frame, RING_CAPACITY>> = Arc::new(SpscRing::new());
    let counters = Arc::new(Counters::default());

    let producer = {
        let ring = Arc::clone(&ring);
        let shutdown = Arc::clone(&shutdown);
        let counters = Arc::clone(&counters);
        let path = config.as_path().to_path_buf();
        std::thread::Builder::new()
            .name("producer".into())
            .spawn(move || producer_loop(&path, ring, shutdown, counters))?
    };

    let consumer = {
        let ring = Arc::clone(&ring);
        let shutdown = Arc::clone(&shutdown);
        let counters = Arc::clone(&counters);
        std::thread::Builder::new()
            .name("consumer".into())
            .spawn(move || consumer_loop(ring, shutdown, counters))?
    };

    let monitor = {
        let shutdown = Arc::clone(&shutdown);
        let counters = Arc::clone(&counters);
        let stats_interval = Duration::from_secs(args.stats_interval.max(1));
        let quiet = args.quiet;
        std::thread::Builder::new()
            .name("monitor".into())
            .spawn(move || monitor_loop(shutdown, counters, stats_interval, quiet))?
    };

    let producer_result = producer.join().expect("producer thread panicked");
    if let Err(err) = producer_result {
        error!("producer thread exited with error: {err}");
    }

    consumer.join().expect("consumer thread panicked");
    monitor.join().expect("monitor thread panicked");

    info!("event_processor stopped cleanly");
    Ok(())
}

/// Reads frames from the log via `LogReader` + `Tailer` and pushes them
/// into the ring. Exits once `shutdown` is observed with no frame in hand.
fn producer_loop(
    path: &std::path::Path,
    ring: Arc<SpscRing<Frame, RING_CAPACITY>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
) -> anyhow::Result<()> {
    // The reader requires at least the 16-byte file header to exist;
    // wait for the writer to create the file and header before opening.
    while !path.exists() && !shutdown.load(Ordering::Acquire) {
        std::thread::sleep(Duration::from_millis(TAIL_WAIT_TIMEOUT_MS));
    }
    if shutdown.load(Ordering::Acquire) {
        return Ok(());
    }

    let mut reader = LogReader::open(path)?;
    let mut tailer = Tailer::init(path)?;

    loop {
        match reader.read_next()? {
            Some(frame) => {
                counters.frames_read.fetch_add(1, Ordering::Relaxed);
                let mut pending = frame;
                loop {
                    match ring.try_push(pending) {
                        Ok(()) => break,
                        Err(returned) => {
                            if shutdown.load(Ordering::Acquire) {
                                warn!("shutdown requested with ring full; dropping in-flight frame");
                                break;
                            }
                            pending = returned;
                            std::thread::yield_now();
                        }
                    }
                }
            }
            None => {
                if shutdown.load(Ordering::Acquire) {
                    return Ok(());
                }
                if !reader.remap_if_grown()? {
                    tailer.wait_for_modification(TAIL_WAIT_TIMEOUT_MS)?;
                    reader.remap_if_grown()?;
                }
            }
        }
    }
}

/// Pops frames from the ring, validates them, and records processing
/// latency. Drains the ring fully before exiting on shutdown.
fn consumer_loop(
    ring: Arc<SpscRing<Frame, RING_CAPACITY>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
) {
    let validator = Validator::new();
    let mut histogram = LatencyHistogram::new();
    let mut since_flush = 0u64;

    loop {
        match ring.try_pop() {
            Some(frame) => {
                let start = monotonic_nanos();
                validator.validate(&frame);
                let elapsed = monotonic_nanos().saturating_sub(start);
                histogram.record(elapsed);
                counters.frames_processed.fetch_add(1, Ordering::Relaxed);

                since_flush += 1;
                if since_flush >= HISTOGRAM_FLUSH_INTERVAL {
                    info!("{}", histogram.summary());
                    histogram.clear();
                    since_flush = 0;
                }
            }
            None => {
                if shutdown.load(Ordering::Acquire) && ring.is_empty() {
                    break;
                }
                std::thread::yield_now();
            }
        }
    }

    if histogram.count() > 0 {
        info!("{}", histogram.summary());
    }
    info!(
        events_processed = validator.events_processed(),
        trades_validated = validator.trades_validated(),
        validation_errors = validator.validation_errors(),
        "final validation totals"
    );
}

/// Prints the per-interval read/process rate every `stats_interval`.
fn monitor_loop(shutdown: Arc<AtomicBool>, counters: Arc<Counters>, stats_interval: Duration, quiet: bool) {
    let mut last_read = 0u64;
    let mut last_processed = 0u64;
    let mut last_tick = Instant::now();

    while !shutdown.load(Ordering::Acquire) {
        std::thread::sleep(Duration::from_millis(100));
        if last_tick.elapsed() < stats_interval {
            continue;
        }

        let read = counters.frames_read.load(Ordering::Relaxed);
        let processed = counters.frames_processed.load(Ordering::Relaxed);
        let elapsed = last_tick.elapsed().as_secs_f64();

        if !quiet {
            info!(
                frames_read = read,
                frames_processed = processed,
                read_rate = (read - last_read) as f64 / elapsed,
                process_rate = (processed - last_processed) as f64 / elapsed,
                "throughput"
            );
        }

        last_read = read;
        last_processed = processed;
        last_tick = Instant::now();
    }
}
