use log::debug;
use masp_api::consts::GENESIS_HEIGHT;
use masp_api::types::{BlockHeight, EpochTarget, LookBack, MaspEpoch};

use crate::error::CollectError;
use crate::plan::{plan_epochs, ScanPolicy};
use crate::source::ChainSource;

/// Epochs to collect, resolved against the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tip_height: BlockHeight,
    pub tip_epoch: MaspEpoch,
    /// Newest first. Each target's height is the last block of its epoch,
    /// or the tip for the current epoch.
    pub targets: Vec<EpochTarget>,
}

/// Walks backward from the tip, one epoch boundary at a time.
pub struct EpochResolver<'a, S> {
    source: &'a S,
    look_back: LookBack,
    policy: ScanPolicy,
}

impl<'a, S: ChainSource> EpochResolver<'a, S> {
    pub fn new(source: &'a S, look_back: LookBack, policy: ScanPolicy) -> Self {
        Self { source, look_back, policy }
    }

    /// Resolves every epoch newer than `cursor` to a height inside it.
    ///
    /// Epoch N is resolved before N-1: the height for N-1 is one block
    /// before the first block of N. Fails instead of truncating when a
    /// boundary lies outside the look-back window or before genesis.
    pub async fn resolve(
        &self,
        tip_height: BlockHeight,
        cursor: Option<MaspEpoch>,
    ) -> Result<Resolution, CollectError> {
        let tip_epoch = self.epoch_at(tip_height).await?;
        let epochs = plan_epochs(tip_epoch, cursor, &self.policy);

        debug!(
            "Tip height {} is in MASP epoch {}, {} epoch(s) after cursor {:?}",
            tip_height,
            tip_epoch,
            epochs.len(),
            cursor
        );

        let mut targets: Vec<EpochTarget> = Vec::with_capacity(epochs.len());
        let mut height = tip_height;

        for &epoch in &epochs {
            if let Some(&newer) = targets.last() {
                let start = self.epoch_start(newer.masp_epoch, newer.height, tip_height).await?;
                if start <= GENESIS_HEIGHT {
                    return Err(CollectError::NoEarlierBoundary { epoch: newer.masp_epoch });
                }

                height = start - 1;

                let found = self.epoch_at(height).await?;
                if found != epoch {
                    return Err(CollectError::EpochGap { expected: epoch, found, height });
                }
            }

            debug!("MASP epoch {} resolved to height {}", epoch, height);
            targets.push(EpochTarget { masp_epoch: epoch, height });
        }

        Ok(Resolution { tip_height, tip_epoch, targets })
    }

    /// Finds the first height of `epoch`, given a height known to be inside it.
    ///
    /// Gallops backward in doubling steps until a height in an earlier epoch
    /// is found, then bisects. Heights below the look-back window are never
    /// queried.
    async fn epoch_start(
        &self,
        epoch: MaspEpoch,
        known: BlockHeight,
        tip_height: BlockHeight,
    ) -> Result<BlockHeight, CollectError> {
        let oldest = self.look_back.oldest_height(tip_height);

        let mut inside = known;
        let mut step: u64 = 1;

        let mut before = loop {
            if inside <= oldest {
                if oldest <= GENESIS_HEIGHT {
                    return Ok(GENESIS_HEIGHT);
                }

                return Err(CollectError::InsufficientLookBack {
                    epoch: epoch.saturating_sub(1),
                    height: oldest - 1,
                    oldest,
                });
            }

            let probe = inside.saturating_sub(step).max(oldest);
            if self.epoch_at(probe).await? < epoch {
                break probe;
            }

            inside = probe;
            step = step.saturating_mul(2);
        };

        while inside - before > 1 {
            let mid = before + (inside - before) / 2;
            if self.epoch_at(mid).await? < epoch {
                before = mid;
            } else {
                inside = mid;
            }
        }

        Ok(inside)
    }

    async fn epoch_at(&self, height: BlockHeight) -> Result<MaspEpoch, CollectError> {
        self.source
            .masp_epoch_at(height)
            .await
            .map_err(|e| CollectError::rpc(format!("MASP epoch at height {}", height), e))
    }
}
