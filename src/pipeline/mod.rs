//! Bounded ingest pipeline
//!
//! Front ends analyze files independently. Each worker turns one input into
//! that file's records without touching shared graph state; the calling
//! thread collects the per-file partitions and merges them into the
//! [`GraphBuilder`] in input order, so the result does not depend on
//! scheduling.
//!
//! ```text
//! producer ──bounded(jobs)──> N workers ──bounded(results)──> collector
//!                                                              │
//!                                       partitions[input order]┘──> merge (single writer)
//! ```

use crossbeam_channel::bounded;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

use crate::cancellation::CancellationToken;
use crate::errors::PipelineError;
use crate::graph::GraphBuilder;
use crate::models::FunctionRecord;

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads
    pub num_workers: usize,
    /// Channel capacity (inputs and results in flight)
    pub buffer_size: usize,
}

impl PoolConfig {
    /// Size the pool for a given number of inputs
    pub fn for_input_count(num_inputs: usize, workers: usize) -> Self {
        let num_workers = if workers > 0 {
            workers
        } else {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        };

        // Smaller buffers for bigger inputs keep in-flight records bounded
        let buffer_size = match num_inputs {
            0..=5_000 => 100,
            5_001..=20_000 => 50,
            _ => 25,
        };

        Self {
            num_workers: num_workers.clamp(1, num_inputs.max(1)),
            buffer_size,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::for_input_count(1_000, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub inputs: usize,
    pub processed: usize,
    pub failed: usize,
    pub records: usize,
    pub cancelled: bool,
}

/// Per-input record lists, in input order. Failed or skipped inputs are empty.
#[derive(Debug, Default)]
pub struct IngestOutput {
    pub partitions: Vec<Vec<FunctionRecord>>,
    pub stats: IngestStats,
}

impl IngestOutput {
    /// Merge every partition into `builder` on the calling thread.
    pub fn merge_into(self, builder: &mut GraphBuilder) -> usize {
        self.partitions
            .into_iter()
            .map(|records| builder.add_records(records))
            .sum()
    }
}

/// Run `extract` over `inputs` on a bounded worker pool.
///
/// Input-level failures are logged and counted; only a panicking worker
/// fails the whole run.
pub fn run_pool<T, F>(
    inputs: Vec<T>,
    config: &PoolConfig,
    cancel: &CancellationToken,
    extract: F,
) -> Result<IngestOutput, PipelineError>
where
    T: Send,
    F: Fn(&T) -> Result<Vec<FunctionRecord>, PipelineError> + Sync,
{
    let total = inputs.len();
    let mut partitions: Vec<Vec<FunctionRecord>> = (0..total).map(|_| Vec::new()).collect();
    let mut stats = IngestStats {
        inputs: total,
        ..Default::default()
    };
    if total == 0 {
        return Ok(IngestOutput { partitions, stats });
    }

    let workers = config.num_workers.max(1);
    let (job_tx, job_rx) = bounded::<(usize, T)>(config.buffer_size.max(1));
    let (res_tx, res_rx) =
        bounded::<(usize, Result<Vec<FunctionRecord>, PipelineError>)>(config.buffer_size.max(1));

    debug!("Ingest pool: {} inputs, {} workers", total, workers);

    let panicked = thread::scope(|s| {
        let extract = &extract;
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            let cancel = cancel.clone();
            handles.push(s.spawn(move || {
                for (i, input) in job_rx.iter() {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if res_tx.send((i, extract(&input))).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(job_rx);
        drop(res_tx);

        let producer_cancel = cancel.clone();
        s.spawn(move || {
            for job in inputs.into_iter().enumerate() {
                if producer_cancel.is_cancelled() || job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        for (i, result) in res_rx.iter() {
            match result {
                Ok(records) => {
                    stats.processed += 1;
                    stats.records += records.len();
                    partitions[i] = records;
                }
                Err(e) => {
                    warn!("Skipping input {}: {}", i, e);
                    stats.failed += 1;
                }
            }
        }

        handles
            .into_iter()
            .map(|h| h.join())
            .filter(Result::is_err)
            .count()
    });

    if panicked > 0 {
        return Err(PipelineError::WorkerPanicked);
    }

    stats.cancelled = cancel.is_cancelled();
    info!(
        "Ingested {} records from {}/{} inputs ({} failed{})",
        stats.records,
        stats.processed,
        stats.inputs,
        stats.failed,
        if stats.cancelled { ", cancelled" } else { "" }
    );
    Ok(IngestOutput { partitions, stats })
}

/// Decode one JSON file holding an array of function records.
pub fn read_records_file(path: &Path) -> Result<Vec<FunctionRecord>, PipelineError> {
    let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read record files in parallel.
pub fn ingest_files(
    paths: Vec<PathBuf>,
    config: &PoolConfig,
    cancel: &CancellationToken,
) -> Result<IngestOutput, PipelineError> {
    run_pool(paths, config, cancel, |p: &PathBuf| read_records_file(p))
}
