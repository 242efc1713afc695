use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Human readable network name for well-known chain ids.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Mainnet"),
            4 => Some("Rinkeby"),
            5 => Some("Goerli"),
            11155111 => Some("Sepolia"),
            31337 => Some("Hardhat"),
            _ => None,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "chain {}", self.0),
        }
    }
}

/// Sale phase derived from the contract's presale flag and end timestamp.
///
/// Variants are ordered by lifecycle position so that later phases compare
/// greater; a recorded phase only ever moves forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    #[default]
    NotStarted,
    PresaleActive,
    PresaleEnded,
    PublicMintAvailable,
}

impl SaleState {
    /// Classifies one observation of the contract.
    ///
    /// `presale_end` is the unix timestamp fixed when the presale was started;
    /// it is ignored while the presale has not started.
    pub fn classify(presale_started: bool, presale_end: Option<u64>, now: u64) -> Self {
        if !presale_started {
            return SaleState::NotStarted;
        }
        match presale_end {
            Some(end) if now >= end => SaleState::PresaleEnded,
            _ => SaleState::PresaleActive,
        }
    }

    /// Merges an observation into the recorded phase without moving backwards.
    pub fn advance(self, observed: SaleState) -> SaleState {
        self.max(observed)
    }

    /// The phase an ended presale settles into without any further action.
    pub fn settle(self) -> SaleState {
        match self {
            SaleState::PresaleEnded => SaleState::PublicMintAvailable,
            other => other,
        }
    }

    pub fn presale_started(self) -> bool {
        self != SaleState::NotStarted
    }

    pub fn presale_ended(self) -> bool {
        matches!(
            self,
            SaleState::PresaleEnded | SaleState::PublicMintAvailable
        )
    }
}

impl fmt::Display for SaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaleState::NotStarted => "not_started",
            SaleState::PresaleActive => "presale_active",
            SaleState::PresaleEnded => "presale_ended",
            SaleState::PublicMintAvailable => "public_mint_available",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleOperation {
    ConnectWallet,
    PollSaleStatus,
    PollMintCount,
    StartPresale,
    PresaleMint,
    PublicMint,
}

impl SaleOperation {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            SaleOperation::StartPresale | SaleOperation::PresaleMint | SaleOperation::PublicMint
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SaleOperation::ConnectWallet => "connect_wallet",
            SaleOperation::PollSaleStatus => "poll_sale_status",
            SaleOperation::PollMintCount => "poll_mint_count",
            SaleOperation::StartPresale => "start_presale",
            SaleOperation::PresaleMint => "presale_mint",
            SaleOperation::PublicMint => "public_mint",
        }
    }
}

impl fmt::Display for SaleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
