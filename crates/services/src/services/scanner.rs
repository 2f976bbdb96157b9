//! Background scan that warms the on-disk log cache.
//!
//! After each pipeline-list refresh the scan walks recent executions of
//! every known pipeline and pre-fetches their log blobs into the cache for
//! the search index. Every fetch at every level is best-effort: a failure
//! skips that unit of work and never aborts the pass.

use std::{sync::Arc, time::Duration};

use api::{ApiError, PipelineClient, models::PipelineSummary};
use async_trait::async_trait;
use logs::{LogKey, LogSource};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info, warn};

use crate::services::{cache::LogCache, search::SearchIndex};

/// Minimum time between two successful scan passes.
pub const COOL_DOWN: Duration = Duration::from_secs(60 * 60);

/// Recent executions fetched per pipeline.
const EXECUTIONS_PER_PIPELINE: u32 = 5;

/// Execution lookups the scanner needs, implemented by the live API client.
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    async fn recent_executions(
        &self,
        pipeline_id: &str,
        size: u32,
    ) -> Result<Vec<api::models::Execution>, ApiError>;

    async fn execution_detail(
        &self,
        plan_execution_id: &str,
    ) -> Result<api::models::ExecutionDetail, ApiError>;
}

#[async_trait]
impl ExecutionSource for PipelineClient {
    async fn recent_executions(
        &self,
        pipeline_id: &str,
        size: u32,
    ) -> Result<Vec<api::models::Execution>, ApiError> {
        self.executions(pipeline_id, size).await
    }

    async fn execution_detail(
        &self,
        plan_execution_id: &str,
    ) -> Result<api::models::ExecutionDetail, ApiError> {
        PipelineClient::execution_detail(self, plan_execution_id).await
    }
}

/// Counters for one scan pass, logged at completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub pipelines: usize,
    pub executions: usize,
    pub files_written: usize,
    pub skipped: usize,
}

/// Why a scan invocation did or did not do work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanStats),
    /// The cool-down window since the last successful pass has not elapsed.
    CoolingDown,
    /// Another scan is already in flight.
    AlreadyRunning,
}

/// The background log cache scanner.
///
/// Exclusive with itself and gated by [`COOL_DOWN`]; triggering it more
/// often than that is harmless.
pub struct ScanService {
    executions: Arc<dyn ExecutionSource>,
    logs: Arc<dyn LogSource>,
    cache: LogCache,
    index: Arc<dyn SearchIndex>,
    running: Mutex<()>,
}

impl ScanService {
    pub fn new(
        executions: Arc<dyn ExecutionSource>,
        logs: Arc<dyn LogSource>,
        cache: LogCache,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            executions,
            logs,
            cache,
            index,
            running: Mutex::new(()),
        }
    }

    /// Run one scan pass over the given pipeline list.
    pub async fn run(&self, pipelines: &[PipelineSummary]) -> ScanOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("log cache scan already in flight, skipping");
            return ScanOutcome::AlreadyRunning;
        };

        if let Some(age) = self.cache.marker_age() {
            if age < COOL_DOWN {
                debug!(age_secs = age.as_secs(), "log cache is fresh, skipping scan");
                return ScanOutcome::CoolingDown;
            }
        }

        let started = Instant::now();
        let mut stats = ScanStats::default();

        for pipeline in pipelines {
            match self.scan_pipeline(&pipeline.identifier, &mut stats).await {
                Ok(()) => stats.pipelines += 1,
                Err(e) => {
                    // One bad pipeline never stops the others.
                    debug!(pipeline = %pipeline.identifier, error = %e, "skipping pipeline in scan");
                    stats.skipped += 1;
                }
            }
        }

        if let Err(e) = self.cache.touch_marker() {
            warn!(error = %e, "failed to update scan cool-down marker");
        }
        self.index.rebuild();

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            pipelines = stats.pipelines,
            executions = stats.executions,
            files_written = stats.files_written,
            skipped = stats.skipped,
            "finished log cache scan"
        );
        ScanOutcome::Completed(stats)
    }

    async fn scan_pipeline(&self, pipeline_id: &str, stats: &mut ScanStats) -> Result<(), ApiError> {
        let executions = self
            .executions
            .recent_executions(pipeline_id, EXECUTIONS_PER_PIPELINE)
            .await?;

        for execution in executions {
            let detail = match self
                .executions
                .execution_detail(&execution.plan_execution_id)
                .await
            {
                Ok(detail) => detail,
                Err(e) => {
                    debug!(
                        plan_execution_id = %execution.plan_execution_id,
                        error = %e,
                        "skipping execution in scan"
                    );
                    stats.skipped += 1;
                    continue;
                }
            };
            stats.executions += 1;

            for node in detail.execution_graph.node_map.values() {
                let Some(raw_key) = node.log_base_key.as_deref() else {
                    continue;
                };
                let key = LogKey::new(raw_key);

                let lines = match self.logs.blob(&key).await {
                    Ok(lines) => lines,
                    Err(e) => {
                        debug!(key = %key, error = %e, "skipping node without retrievable logs");
                        stats.skipped += 1;
                        continue;
                    }
                };
                if lines.is_empty() {
                    continue;
                }

                match self.cache.write_entry(&key, &lines) {
                    Ok(_) => stats.files_written += 1,
                    Err(e) => {
                        warn!(key = %key, error = %e, "failed to write log cache entry");
                        stats.skipped += 1;
                    }
                }
            }
        }

        Ok(())
    }
}
