//! Commands typed on stdin.

use client_core::Affordance;
use shared::domain::SaleOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Connect,
    StartPresale,
    /// Activates whichever mint the current affordance offers.
    Mint,
    Status,
    Quit,
}

impl UserCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "connect" => Some(Self::Connect),
            "start" => Some(Self::StartPresale),
            "mint" => Some(Self::Mint),
            "status" => Some(Self::Status),
            "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Resolves `mint` against the shown affordance so the terminal can only do
/// what the page would offer.
pub fn mint_operation(shown: Affordance) -> Option<SaleOperation> {
    match shown.action() {
        Some(op @ (SaleOperation::PresaleMint | SaleOperation::PublicMint)) => Some(op),
        _ => None,
    }
}

pub const HELP: &str = "commands: connect | start | mint | status | quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_case_insensitively() {
        assert_eq!(UserCommand::parse("connect"), Some(UserCommand::Connect));
        assert_eq!(UserCommand::parse("  START \n"), Some(UserCommand::StartPresale));
        assert_eq!(UserCommand::parse("Mint"), Some(UserCommand::Mint));
        assert_eq!(UserCommand::parse("status"), Some(UserCommand::Status));
        assert_eq!(UserCommand::parse("exit"), Some(UserCommand::Quit));
        assert_eq!(UserCommand::parse("withdraw"), None);
        assert_eq!(UserCommand::parse(""), None);
    }

    #[test]
    fn mint_follows_the_shown_affordance() {
        assert_eq!(
            mint_operation(Affordance::PresaleMint),
            Some(SaleOperation::PresaleMint)
        );
        assert_eq!(
            mint_operation(Affordance::PublicMint),
            Some(SaleOperation::PublicMint)
        );
        for shown in [
            Affordance::ConnectWallet,
            Affordance::Loading,
            Affordance::StartPresale,
            Affordance::PresaleNotStarted,
        ] {
            assert_eq!(mint_operation(shown), None, "{shown:?}");
        }
    }
}
