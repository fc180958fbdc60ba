use masp_api::types::{BlockHeight, MaspEpoch, TokenRewards};
use masp_client::{RpcClient, RpcError};

/// The chain queries the resolver and collector depend on.
#[allow(async_fn_in_trait)]
pub trait ChainSource {
    async fn tip_height(&self) -> Result<BlockHeight, RpcError>;

    async fn masp_epoch_at(&self, height: BlockHeight) -> Result<MaspEpoch, RpcError>;

    async fn block_time(&self, height: BlockHeight) -> Result<String, RpcError>;

    async fn token_rewards(&self, token: &str, height: BlockHeight) -> Result<TokenRewards, RpcError>;
}

impl ChainSource for RpcClient {
    async fn tip_height(&self) -> Result<BlockHeight, RpcError> {
        self.get_latest_height().await
    }

    async fn masp_epoch_at(&self, height: BlockHeight) -> Result<MaspEpoch, RpcError> {
        self.get_masp_epoch_at_height(height).await
    }

    async fn block_time(&self, height: BlockHeight) -> Result<String, RpcError> {
        self.get_block_time(height).await
    }

    async fn token_rewards(&self, token: &str, height: BlockHeight) -> Result<TokenRewards, RpcError> {
        self.get_token_rewards(token, height).await
    }
}
