use crate::counter::{encode_base36, write_base36};
use crate::date::{format_date, is_representable};
use crate::error::{Error, Result};
use crate::provider::{Clock, OsRandomSource, RandomSource, SystemClock};
use crate::stream::{BestCounter, CounterSource};
use crate::{meets_leading_zero_bits, Stamp, DIGEST_BITS, RANDOM_BYTES, STAMP_VERSION};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Timelike, Utc};
use derive_builder::Builder;
use flume::{Receiver, Sender};
use sha1::{Digest, Sha1};
use std::sync::atomic::{AtomicU64, Ordering};
use std::panic;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// Progress is published to the shared counter in batches of this many hashes.
const PROGRESS_BATCH: u64 = 4096;

/// Stamp minting engine.
///
/// The search always returns the lowest satisfying counter, so for a given
/// random field and date the result does not depend on `threads`.
#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Minter {
    #[builder(default = "crate::DEFAULT_BITS")]
    pub bits: u32,
    #[builder(default = "1")]
    pub threads: usize,
    /// Give up with `WorkNotFound` after this many counters.
    #[builder(default, setter(strip_option))]
    pub max_iterations: Option<u64>,
    /// Hashes tried by the most recent search.
    #[builder(default = "Arc::new(AtomicU64::new(0))")]
    pub progress: Arc<AtomicU64>,
    #[builder(default = "Arc::new(OsRandomSource)")]
    pub random: Arc<dyn RandomSource>,
    #[builder(default = "Arc::new(SystemClock)")]
    pub clock: Arc<dyn Clock>,
}

type Probe = dyn Fn(u64) -> bool + Send + Sync;

impl Minter {
    pub fn builder() -> MinterBuilder {
        MinterBuilder::default()
    }

    fn validate(&self) -> Result<()> {
        if self.bits > DIGEST_BITS {
            return Err(Error::InvalidConfig(format!(
                "bits must be <= {DIGEST_BITS}"
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        if self.max_iterations == Some(0) {
            return Err(Error::InvalidConfig("max_iterations must be >= 1".into()));
        }
        Ok(())
    }

    /// Mint a stamp for `resource` dated by the engine's clock.
    pub fn mint(&self, resource: &str) -> Result<Stamp> {
        self.mint_at(resource, self.clock.now())
    }

    /// Mint a stamp for `resource` carrying `date`, truncated to whole seconds.
    pub fn mint_at(&self, resource: &str, date: DateTime<Utc>) -> Result<Stamp> {
        self.validate()?;
        if resource.is_empty() {
            return Err(Error::Argument("resource must not be empty".into()));
        }
        if resource.contains(':') {
            return Err(Error::Argument(format!(
                "resource {resource:?} must not contain ':'"
            )));
        }
        let date = date
            .with_nanosecond(0)
            .filter(is_representable)
            .ok_or_else(|| {
                Error::Argument(format!("date {date} is outside the years 2000-2099"))
            })?;

        let random = self.random_field();
        let prefix = format!(
            "{STAMP_VERSION}:{}:{}:{resource}::{random}:",
            self.bits,
            format_date(&date)
        );

        debug!(bits = self.bits, threads = self.threads, %resource, "minting stamp");
        let started = Instant::now();
        let counter = search(
            self.bits,
            self.threads,
            self.max_iterations,
            self.progress.clone(),
            sha1_probe(prefix.as_bytes(), self.bits),
        )?;
        debug!(
            counter,
            attempts = self.progress.load(Ordering::SeqCst),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stamp minted"
        );

        Ok(Stamp::from_parts(
            self.bits,
            date,
            resource.to_owned(),
            String::new(),
            random,
            encode_base36(counter),
        ))
    }

    /// Base64 of fresh random bytes, padding stripped.
    fn random_field(&self) -> String {
        let mut bytes = [0u8; RANDOM_BYTES];
        self.random.fill(&mut bytes);
        STANDARD.encode(bytes).trim_end_matches('=').to_owned()
    }
}

impl MinterBuilder {
    pub fn build_validated(self) -> Result<Minter> {
        let minter = self
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        minter.validate()?;
        Ok(minter)
    }
}

/// Probe that hashes `prefix || base36(counter)`, reusing the prefix state.
fn sha1_probe(prefix: &[u8], bits: u32) -> Arc<Probe> {
    let base = Sha1::new_with_prefix(prefix);
    Arc::new(move |counter: u64| {
        let mut buf = [0u8; 13];
        let digits = write_base36(&mut buf, counter);
        let hash: [u8; 20] = base.clone().chain_update(digits).finalize().into();
        meets_leading_zero_bits(&hash, bits)
    })
}

/// Find the lowest counter accepted by `probe`.
fn search(
    bits: u32,
    threads: usize,
    max_iterations: Option<u64>,
    progress: Arc<AtomicU64>,
    probe: Arc<Probe>,
) -> Result<u64> {
    progress.store(0, Ordering::SeqCst);
    let counters = Arc::new(CounterSource::new(0, max_iterations));
    let best = Arc::new(BestCounter::new());
    let workers = threads.max(1);
    let (tx, rx): (Sender<u64>, Receiver<u64>) = flume::bounded(workers);

    let attempts = if workers == 1 {
        worker_loop(counters, best, progress.clone(), tx, probe)
    } else {
        let mut joins = Vec::with_capacity(workers);
        for _ in 0..workers {
            let worker_counters = counters.clone();
            let worker_best = best.clone();
            let worker_progress = progress.clone();
            let worker_tx = tx.clone();
            let worker_probe = probe.clone();
            joins.push(thread::spawn(move || {
                worker_loop(
                    worker_counters,
                    worker_best,
                    worker_progress,
                    worker_tx,
                    worker_probe,
                )
            }));
        }
        drop(tx);
        join_handles(joins)
    };

    match rx.try_iter().min() {
        Some(counter) => Ok(counter),
        None => {
            warn!(bits, attempts, "iteration cap reached without a stamp");
            Err(Error::WorkNotFound { attempts })
        }
    }
}

/// Test counters until the space runs out or none left can beat the best hit.
/// Returns the number of counters tried.
fn worker_loop(
    counters: Arc<CounterSource>,
    best: Arc<BestCounter>,
    progress: Arc<AtomicU64>,
    tx: Sender<u64>,
    probe: Arc<Probe>,
) -> u64 {
    let mut tried = 0u64;
    let mut unpublished = 0u64;
    while let Some(counter) = counters.fetch() {
        if best.should_stop(counter) {
            break;
        }
        tried += 1;
        unpublished += 1;
        if unpublished == PROGRESS_BATCH {
            progress.fetch_add(unpublished, Ordering::Relaxed);
            unpublished = 0;
        }
        if probe(counter) {
            best.record(counter);
            if tx.send(counter).is_err() {
                best.force_stop();
            }
            break;
        }
    }
    progress.fetch_add(unpublished, Ordering::SeqCst);
    tried
}

fn join_handles(joins: Vec<thread::JoinHandle<u64>>) -> u64 {
    joins
        .into_iter()
        .map(|handle| match handle.join() {
            Ok(tried) => tried,
            Err(payload) => panic::resume_unwind(payload),
        })
        .sum()
}
