use log::{info, warn};
use masp_api::types::{BlockHeight, EpochRecord, EpochTarget, LookBack, MaspEpoch};
use tokio::time::{sleep, Duration};

use crate::error::CollectError;
use crate::plan::ScanPolicy;
use crate::resolver::EpochResolver;
use crate::source::ChainSource;
use crate::store::HistoryWriter;

#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    pub look_back: LookBack,
    pub policy: ScanPolicy,
    /// Pins the tip instead of asking the node for it.
    pub tip_height: Option<BlockHeight>,
    /// Pause between epochs, to stay under public node rate limits.
    pub epoch_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub tip_height: BlockHeight,
    pub tip_epoch: MaspEpoch,
    pub cursor: Option<MaspEpoch>,
    /// Epochs written by this run, oldest first.
    pub epochs: Vec<MaspEpoch>,
    pub rows: usize,
}

impl CollectSummary {
    /// The cursor a following run would start from.
    pub fn next_cursor(&self) -> Option<MaspEpoch> {
        self.epochs.last().copied().max(self.cursor)
    }
}

/// Collects every epoch newer than `cursor` and appends its rows.
///
/// All epochs are resolved before anything is written, then written oldest
/// first, one flush per epoch. A failure midway leaves a prefix of the
/// epochs on disk, so the next run's cursor still sits right below the
/// first missing epoch.
pub async fn collect_epochs<S: ChainSource>(
    source: &S,
    writer: &mut HistoryWriter,
    tokens: &[String],
    cursor: Option<MaspEpoch>,
    config: &CollectorConfig,
) -> Result<CollectSummary, CollectError> {
    let tip_height = match config.tip_height {
        Some(height) => height,
        None => source
            .tip_height()
            .await
            .map_err(|e| CollectError::rpc("tip height", e))?,
    };

    info!("Tip height: {}", tip_height);

    let resolution = EpochResolver::new(source, config.look_back, config.policy)
        .resolve(tip_height, cursor)
        .await?;

    let mut summary = CollectSummary {
        tip_height,
        tip_epoch: resolution.tip_epoch,
        cursor,
        epochs: Vec::with_capacity(resolution.targets.len()),
        rows: 0,
    };

    if resolution.targets.is_empty() {
        match cursor {
            Some(c) if c > resolution.tip_epoch => warn!(
                "Cursor {} is ahead of the node's tip epoch {}, is the node lagging?",
                c, resolution.tip_epoch
            ),
            _ => info!("Nothing to collect, MASP epoch {} is already recorded", resolution.tip_epoch),
        }
        return Ok(summary);
    }

    if tokens.is_empty() {
        return Err(CollectError::NoTokens { epochs: resolution.targets.len() });
    }

    for (i, target) in resolution.targets.iter().rev().enumerate() {
        if i > 0 && !config.epoch_delay.is_zero() {
            sleep(config.epoch_delay).await;
        }

        let records = fetch_epoch(source, tokens, target).await?;

        writer
            .append(&records)
            .map_err(|e| CollectError::Write { epoch: target.masp_epoch, source: e })?;

        info!(
            "✓ MASP epoch {} at height {}: wrote {} rows",
            target.masp_epoch,
            target.height,
            records.len()
        );

        summary.epochs.push(target.masp_epoch);
        summary.rows += records.len();
    }

    Ok(summary)
}

/// Reads the reward parameters of every token at the target's height.
pub async fn fetch_epoch<S: ChainSource>(
    source: &S,
    tokens: &[String],
    target: &EpochTarget,
) -> Result<Vec<EpochRecord>, CollectError> {
    let timestamp = source.block_time(target.height).await.map_err(|e| {
        CollectError::rpc(
            format!("block time at height {} (MASP epoch {})", target.height, target.masp_epoch),
            e,
        )
    })?;

    let mut records = Vec::with_capacity(tokens.len());

    for token in tokens {
        let rewards = source.token_rewards(token, target.height).await.map_err(|e| {
            CollectError::rpc(
                format!(
                    "rewards of {} at height {} (MASP epoch {})",
                    token, target.height, target.masp_epoch
                ),
                e,
            )
        })?;

        records.push(EpochRecord {
            epoch_number: target.masp_epoch,
            token_id: token.clone(),
            last_inflation: rewards.last_inflation,
            last_locked: rewards.last_locked,
            height: Some(target.height),
            timestamp: Some(timestamp.clone()),
        });
    }

    Ok(records)
}
