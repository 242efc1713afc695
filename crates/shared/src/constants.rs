use std::time::Duration;

use alloy_primitives::U256;

use crate::domain::ChainId;

/// Chain the sale is deployed on.
pub const REQUIRED_CHAIN_ID: ChainId = ChainId(4);

/// 0.01 ether, the exact value sent with every mint.
pub const MINT_PRICE_WEI: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

pub const MAX_TOKEN_IDS: u64 = 20;

pub const PRESALE_DURATION: Duration = Duration::from_secs(5 * 60);

pub const SALE_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MINT_COUNT_POLL_INTERVAL: Duration = Duration::from_secs(5);
