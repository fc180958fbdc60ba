#![allow(dead_code)]

use std::cell::RefCell;

use masp_api::types::{BlockHeight, MaspEpoch, TokenRewards};
use masp_client::RpcError;
use masp_collector::source::ChainSource;

/// In-memory chain with known MASP epoch boundaries.
pub struct MockChain {
    /// First height of each epoch, starting at `first_epoch`.
    starts: Vec<BlockHeight>,
    first_epoch: MaspEpoch,
    tip: BlockHeight,
    node_look_back: Option<u64>,
    fail_at: Option<MaspEpoch>,
    queried: RefCell<Vec<BlockHeight>>,
}

impl MockChain {
    /// `epochs` epochs of `epoch_len` blocks each, genesis at height 1, tip
    /// halfway through the last epoch.
    pub fn uniform(epochs: u64, epoch_len: u64) -> Self {
        let starts: Vec<_> = (0..epochs).map(|e| 1 + e * epoch_len).collect();
        let tip = starts[starts.len() - 1] + epoch_len / 2;
        Self::from_starts(0, starts, tip)
    }

    pub fn from_starts(first_epoch: MaspEpoch, starts: Vec<BlockHeight>, tip: BlockHeight) -> Self {
        Self {
            starts,
            first_epoch,
            tip,
            node_look_back: None,
            fail_at: None,
            queried: RefCell::new(Vec::new()),
        }
    }

    pub fn with_node_look_back(mut self, blocks: u64) -> Self {
        self.node_look_back = Some(blocks);
        self
    }

    pub fn failing_at(mut self, epoch: MaspEpoch) -> Self {
        self.fail_at = Some(epoch);
        self
    }

    pub fn tip(&self) -> BlockHeight {
        self.tip
    }

    pub fn epoch_of(&self, height: BlockHeight) -> MaspEpoch {
        let idx = self.starts.partition_point(|start| *start <= height);
        self.first_epoch + idx as u64 - 1
    }

    /// Last block of `epoch`, or the tip for the current one.
    pub fn last_height(&self, epoch: MaspEpoch) -> BlockHeight {
        let idx = (epoch - self.first_epoch) as usize;
        self.starts
            .get(idx + 1)
            .map(|next| next - 1)
            .unwrap_or(self.tip)
    }

    pub fn lowest_queried(&self) -> Option<BlockHeight> {
        self.queried.borrow().iter().copied().min()
    }

    pub fn rewards_for(epoch: MaspEpoch, token: &str) -> TokenRewards {
        TokenRewards {
            last_inflation: epoch as u128 * 1_000 + token.len() as u128,
            last_locked: epoch as u128 * 1_000_000,
        }
    }

    fn check_history(&self, height: BlockHeight) -> Result<(), RpcError> {
        match self.node_look_back {
            Some(limit) if self.tip.saturating_sub(height) > limit => Err(RpcError::LookBackExceeded { height, limit }),
            _ => Ok(()),
        }
    }
}

impl ChainSource for MockChain {
    async fn tip_height(&self) -> Result<BlockHeight, RpcError> {
        Ok(self.tip)
    }

    async fn masp_epoch_at(&self, height: BlockHeight) -> Result<MaspEpoch, RpcError> {
        self.queried.borrow_mut().push(height);

        if height == 0 || height > self.tip || height < self.starts[0] {
            return Err(RpcError::Malformed {
                url: "mock".into(),
                reason: format!("no epoch at height {}", height),
            });
        }

        Ok(self.epoch_of(height))
    }

    async fn block_time(&self, height: BlockHeight) -> Result<String, RpcError> {
        self.check_history(height)?;
        Ok(format!("2025-01-01T00:00:{:02}Z", height % 60))
    }

    async fn token_rewards(&self, token: &str, height: BlockHeight) -> Result<TokenRewards, RpcError> {
        self.check_history(height)?;

        let epoch = self.epoch_of(height);
        if self.fail_at == Some(epoch) {
            return Err(RpcError::Status { url: "mock".into(), status: 503 });
        }

        Ok(Self::rewards_for(epoch, token))
    }
}
