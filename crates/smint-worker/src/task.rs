//! Turning task input into a concrete run request.

use tracing::info;

use smint_ledger::TokenLedger;
use smint_models::{DirectTask, TaskInput};

use crate::config::{PipelineConfig, DRY_RUN_CONTRACT};
use crate::error::{PipelineError, PipelineResult};

/// Upper bound on segments per run, shared with direct task validation.
const MAX_SEGMENTS: u64 = 10_000;

/// Everything a run needs to know about what to process.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub link: String,
    pub segment_count: u32,
    pub score_threshold: f64,
    /// Collection the metadata references are written to
    pub contract_address: String,
}

/// Validate task input and resolve it into a [`RunRequest`].
///
/// Collection input reads its link and supply from the ledger; failures
/// there are upstream fetch errors and abort the run.
pub async fn resolve_task(
    input: &TaskInput,
    config: &PipelineConfig,
    ledger: &dyn TokenLedger,
) -> PipelineResult<RunRequest> {
    input.validate()?;

    match input {
        TaskInput::Direct(DirectTask {
            link,
            segment_count,
            score_threshold,
        }) => {
            let contract_address = match (&config.contract_address, config.dry_run) {
                (Some(address), _) => address.clone(),
                (None, true) => DRY_RUN_CONTRACT.to_string(),
                (None, false) => {
                    return Err(PipelineError::config(
                        "LEDGER_CONTRACT_ADDRESS is required for link-based tasks",
                    ))
                }
            };
            Ok(RunRequest {
                link: link.clone(),
                segment_count: *segment_count,
                score_threshold: *score_threshold,
                contract_address,
            })
        }
        TaskInput::Collection(task) => {
            if config.dry_run {
                return Err(PipelineError::validation(
                    "contractAddress input needs a live ledger and is not available in dry run",
                ));
            }

            let collection = ledger
                .read_collection(&task.contract_address)
                .await
                .map_err(PipelineError::upstream)?;
            if collection.max_supply == 0 || collection.max_supply > MAX_SEGMENTS {
                return Err(PipelineError::validation(format!(
                    "collection maxSupply {} is outside 1..={}",
                    collection.max_supply, MAX_SEGMENTS
                )));
            }

            info!(
                contract = %task.contract_address,
                link = %collection.video_url,
                segments = collection.max_supply,
                "Resolved collection task"
            );
            Ok(RunRequest {
                link: collection.video_url,
                segment_count: collection.max_supply as u32,
                score_threshold: config.default_score_threshold,
                contract_address: task.contract_address.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smint_ledger::{CollectionInfo, DryRunLedger, LedgerResult, Receipt, TxHandle};

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    struct CollectionLedger(u64);

    #[async_trait::async_trait]
    impl TokenLedger for CollectionLedger {
        async fn submit_token_uri(&self, _: &str, _: u64, _: &str) -> LedgerResult<TxHandle> {
            unreachable!()
        }

        async fn await_confirmation(&self, _: &TxHandle) -> LedgerResult<Receipt> {
            unreachable!()
        }

        async fn read_collection(&self, _: &str) -> LedgerResult<CollectionInfo> {
            Ok(CollectionInfo {
                video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                max_supply: self.0,
            })
        }
    }

    fn direct() -> TaskInput {
        TaskInput::from_json(r#"{"link":"https://youtu.be/dQw4w9WgXcQ","segmentCount":4,"scoreThreshold":0.3}"#)
            .unwrap()
    }

    fn collection() -> TaskInput {
        TaskInput::from_json(&format!(r#"{{"contractAddress":"{}"}}"#, CONTRACT)).unwrap()
    }

    #[tokio::test]
    async fn test_direct_uses_configured_contract() {
        let config = PipelineConfig {
            contract_address: Some(CONTRACT.to_string()),
            ..PipelineConfig::default()
        };
        let request = resolve_task(&direct(), &config, &DryRunLedger::new()).await.unwrap();
        assert_eq!(request.segment_count, 4);
        assert_eq!(request.score_threshold, 0.3);
        assert_eq!(request.contract_address, CONTRACT);
    }

    #[tokio::test]
    async fn test_direct_without_contract() {
        let err = resolve_task(&direct(), &PipelineConfig::default(), &DryRunLedger::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        let config = PipelineConfig {
            dry_run: true,
            ..PipelineConfig::default()
        };
        let request = resolve_task(&direct(), &config, &DryRunLedger::new()).await.unwrap();
        assert_eq!(request.contract_address, DRY_RUN_CONTRACT);
    }

    #[tokio::test]
    async fn test_collection_reads_ledger() {
        let config = PipelineConfig::default();
        let request = resolve_task(&collection(), &config, &CollectionLedger(6)).await.unwrap();
        assert_eq!(request.link, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(request.segment_count, 6);
        assert_eq!(request.score_threshold, config.default_score_threshold);
        assert_eq!(request.contract_address, CONTRACT);
    }

    #[tokio::test]
    async fn test_collection_zero_supply() {
        let err = resolve_task(&collection(), &PipelineConfig::default(), &CollectionLedger(0))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_collection_rejected_in_dry_run() {
        let config = PipelineConfig {
            dry_run: true,
            ..PipelineConfig::default()
        };
        let err = resolve_task(&collection(), &config, &DryRunLedger::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
