//! Decision table from controller state to the single action shown to the user.

use shared::domain::SaleOperation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RenderInputs {
    pub connected: bool,
    pub loading: bool,
    pub is_owner: bool,
    pub presale_started: bool,
    pub presale_ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    ConnectWallet,
    Loading,
    StartPresale,
    PresaleNotStarted,
    PresaleMint,
    PublicMint,
}

impl Affordance {
    pub const ALL: [Affordance; 6] = [
        Affordance::ConnectWallet,
        Affordance::Loading,
        Affordance::StartPresale,
        Affordance::PresaleNotStarted,
        Affordance::PresaleMint,
        Affordance::PublicMint,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Affordance::ConnectWallet => "Connect your wallet",
            Affordance::Loading => "Loading...",
            Affordance::StartPresale => "Start Presale!",
            Affordance::PresaleNotStarted => "Presale hasn't started!",
            Affordance::PresaleMint => {
                "Presale has started! If your address is whitelisted, mint a Crypto Dev: Presale Mint"
            }
            Affordance::PublicMint => "Public Mint",
        }
    }

    /// Operation triggered when the user activates this affordance.
    pub fn action(self) -> Option<SaleOperation> {
        match self {
            Affordance::ConnectWallet => Some(SaleOperation::ConnectWallet),
            Affordance::StartPresale => Some(SaleOperation::StartPresale),
            Affordance::PresaleMint => Some(SaleOperation::PresaleMint),
            Affordance::PublicMint => Some(SaleOperation::PublicMint),
            Affordance::Loading | Affordance::PresaleNotStarted => None,
        }
    }
}

/// Rows are checked top to bottom; the first match wins.
pub fn render(inputs: RenderInputs) -> Affordance {
    if !inputs.connected {
        return Affordance::ConnectWallet;
    }
    if inputs.loading {
        return Affordance::Loading;
    }
    if !inputs.presale_started {
        return if inputs.is_owner {
            Affordance::StartPresale
        } else {
            Affordance::PresaleNotStarted
        };
    }
    if inputs.presale_ended {
        Affordance::PublicMint
    } else {
        Affordance::PresaleMint
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn all_inputs() -> Vec<RenderInputs> {
        (0u8..32)
            .map(|bits| RenderInputs {
                connected: bits & 1 != 0,
                loading: bits & 2 != 0,
                is_owner: bits & 4 != 0,
                presale_started: bits & 8 != 0,
                presale_ended: bits & 16 != 0,
            })
            .collect()
    }

    #[test]
    fn disconnected_always_shows_connect() {
        for inputs in all_inputs().into_iter().filter(|i| !i.connected) {
            assert_eq!(render(inputs), Affordance::ConnectWallet, "{inputs:?}");
        }
    }

    #[test]
    fn loading_hides_every_action_once_connected() {
        for inputs in all_inputs()
            .into_iter()
            .filter(|i| i.connected && i.loading)
        {
            assert_eq!(render(inputs), Affordance::Loading, "{inputs:?}");
        }
    }

    #[test]
    fn owner_start_takes_priority_over_not_started_message() {
        let owner = RenderInputs {
            connected: true,
            is_owner: true,
            ..RenderInputs::default()
        };
        assert_eq!(render(owner), Affordance::StartPresale);

        let visitor = RenderInputs {
            is_owner: false,
            ..owner
        };
        assert_eq!(render(visitor), Affordance::PresaleNotStarted);
    }

    #[test]
    fn started_presale_shows_mint_for_everyone() {
        for is_owner in [false, true] {
            let active = RenderInputs {
                connected: true,
                is_owner,
                presale_started: true,
                ..RenderInputs::default()
            };
            assert_eq!(render(active), Affordance::PresaleMint);

            let ended = RenderInputs {
                presale_ended: true,
                ..active
            };
            assert_eq!(render(ended), Affordance::PublicMint);
        }
    }

    #[test]
    fn every_affordance_is_reachable() {
        let rendered: HashSet<_> = all_inputs().into_iter().map(render).collect();
        assert_eq!(rendered.len(), Affordance::ALL.len());
        for affordance in Affordance::ALL {
            assert!(rendered.contains(&affordance), "{affordance:?}");
        }
    }

    #[test]
    fn only_buttons_carry_actions() {
        assert_eq!(Affordance::Loading.action(), None);
        assert_eq!(Affordance::PresaleNotStarted.action(), None);
        assert_eq!(
            Affordance::PublicMint.action(),
            Some(SaleOperation::PublicMint)
        );
    }
}
