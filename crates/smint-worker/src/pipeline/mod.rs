//! Pipeline orchestrator.
//!
//! A run resolves the source and interest periods once, downloads the source
//! into a private workspace, then processes segments one at a time. Each
//! segment that publishes its metadata is submitted to the ledger right away;
//! confirmations run in the background and are joined once every segment has
//! been attempted.

mod commit;
mod segment;

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use smint_ledger::{DryRunLedger, JsonRpcLedger, TokenLedger};
use smint_media::{FfmpegExtractor, HttpDownloader, SegmentExtractor, SourceFetcher, TranscodeRunner, Workspace};
use smint_models::{
    segment_timeline, MetadataContext, RunDisposition, RunReport, TransactionOutcome,
};
use smint_sources::{HttpOracle, InterestOracle, RapidApiProvider, SourceResolver, VideoMetadataProvider};
use smint_storage::{ContentStore, MemoryStore, PinataClient};

use crate::config::{PipelineConfig, ServiceConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::task::RunRequest;

use commit::Confirmations;
use segment::SegmentContext;

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    pub provider: Arc<dyn VideoMetadataProvider>,
    pub oracle: Arc<dyn InterestOracle>,
    pub fetcher: Arc<dyn SourceFetcher>,
    pub extractor: Arc<dyn SegmentExtractor>,
    pub store: Arc<dyn ContentStore>,
    pub ledger: Arc<dyn TokenLedger>,
}

impl PipelineDeps {
    /// Wire the production clients. Dry runs publish to memory and record
    /// ledger writes instead of sending them.
    pub fn from_config(config: &PipelineConfig, services: &ServiceConfig) -> PipelineResult<Self> {
        let store: Arc<dyn ContentStore> = match (&services.storage, config.dry_run) {
            (_, true) => Arc::new(MemoryStore::new()),
            (Some(storage), false) => Arc::new(PinataClient::new(storage.clone())?),
            (None, false) => return Err(PipelineError::config("storage is not configured")),
        };
        let ledger: Arc<dyn TokenLedger> = match (&services.ledger, config.dry_run) {
            (_, true) => Arc::new(DryRunLedger::new()),
            (Some(ledger), false) => Arc::new(
                JsonRpcLedger::new(ledger.clone()).map_err(|e| PipelineError::config(e.to_string()))?,
            ),
            (None, false) => return Err(PipelineError::config("ledger is not configured")),
        };

        let runner = TranscodeRunner::new(&config.ffmpeg_path).with_timeout(config.transcoder_timeout);
        let fetcher = HttpDownloader::new(config.download_timeout)
            .map_err(|e| PipelineError::config(format!("download client: {}", e)))?;

        Ok(Self {
            provider: Arc::new(RapidApiProvider::new(services.provider.clone())?),
            oracle: Arc::new(HttpOracle::new(services.oracle.clone())?),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(FfmpegExtractor::new(runner, config.extraction.clone())),
            store,
            ledger,
        })
    }
}

/// Segment pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    deps: PipelineDeps,
    resolver: SourceResolver,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, deps: PipelineDeps) -> Self {
        let resolver = SourceResolver::new(
            deps.provider.clone(),
            config.max_source_duration_secs,
            config.accepted_container.clone(),
        );
        Self {
            config,
            deps,
            resolver,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &dyn TokenLedger {
        self.deps.ledger.as_ref()
    }

    /// Execute one run, bounded by the configured run timeout.
    ///
    /// Errors returned here are fatal to the run. Per-segment failures are
    /// reported inside the [`RunReport`].
    pub async fn run(&self, request: &RunRequest) -> PipelineResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let limit = self.config.run_timeout;
        let span = info_span!("run", run_id = %run_id);

        match tokio::time::timeout(limit, self.execute(&run_id, request))
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(run_id = %run_id, "Run exceeded {} seconds, abandoning", limit.as_secs());
                Err(PipelineError::Timeout(limit.as_secs()))
            }
        }
    }

    async fn execute(&self, run_id: &str, request: &RunRequest) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        info!(
            link = %request.link,
            segments = request.segment_count,
            threshold = request.score_threshold,
            "Run started"
        );

        let source = self.resolver.resolve(&request.link).await?;
        let periods = self
            .deps
            .oracle
            .interest_periods(&request.link, request.score_threshold)
            .await?;
        let segments = segment_timeline(source.duration_secs, request.segment_count)?;
        info!(
            periods = periods.len(),
            segment_duration = segments.first().map(|s| s.duration).unwrap_or_default(),
            "Timeline ready"
        );

        let workspace = Workspace::create(&self.config.work_dir, run_id, &self.config.accepted_container)
            .await
            .map_err(|e| {
                PipelineError::config(format!(
                    "cannot create workspace under {}: {}",
                    self.config.work_dir.display(),
                    e
                ))
            })?;
        self.deps
            .fetcher
            .fetch(source.resolved_url(), workspace.source_path())
            .await
            .map_err(PipelineError::upstream)?;

        let ctx = SegmentContext {
            run_id,
            workspace: &workspace,
            periods: &periods,
            metadata: MetadataContext {
                collection_name: &self.config.collection_name,
                source_link: &source.link,
                source_title: source.title.as_deref(),
                gateway_prefix: &self.config.gateway_prefix,
                segment_count: request.segment_count,
            },
        };

        let mut confirmations = Confirmations::new(self.deps.ledger.clone());
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        let mut ledger_outcomes: Vec<TransactionOutcome> = Vec::new();

        for segment in &segments {
            let success = match self.process_segment(&ctx, segment).await {
                Ok(success) => success,
                Err(failure) => {
                    failures.push(failure);
                    continue;
                }
            };

            match self
                .deps
                .ledger
                .submit_token_uri(&request.contract_address, segment.token_id(), &success.metadata_uri)
                .await
            {
                Ok(handle) => confirmations.spawn(segment.index, handle),
                Err(e) => {
                    let err = PipelineError::from(e);
                    warn!(segment = segment.index, "Ledger submission failed: {}", err);
                    ledger_outcomes.push(TransactionOutcome::failed(
                        segment.index,
                        segment.token_id(),
                        None,
                        err.to_string(),
                    ));
                }
            }
            successes.push(success);
        }

        info!(
            submitted = confirmations.len(),
            failed_segments = failures.len(),
            "All segments attempted, awaiting confirmations"
        );
        ledger_outcomes.extend(confirmations.join_all().await);
        ledger_outcomes.sort_by_key(|o| o.segment_index);
        for outcome in &ledger_outcomes {
            metrics::record_ledger_outcome(outcome.status);
        }

        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace: {}", e);
        }

        let confirmed = ledger_outcomes.iter().filter(|o| o.is_confirmed()).count();
        let disposition = RunDisposition::from_counts(confirmed, segments.len());
        metrics::record_run(disposition);
        info!(
            confirmed,
            total = segments.len(),
            disposition = ?disposition,
            "Run finished"
        );

        Ok(RunReport {
            run_id: run_id.to_string(),
            video_id: source.video_id.clone(),
            link: source.link.clone(),
            total_duration: source.duration_secs,
            segment_count: request.segment_count,
            segments: successes,
            failures,
            ledger: ledger_outcomes,
            disposition,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
