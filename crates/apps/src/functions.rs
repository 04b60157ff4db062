//! Function table of the DutchCrowdsale application.
//!
//! Every externally callable function is a variant here. Modules route on the
//! variant, never on raw selector bytes.

use rexec_primitives::Selector;

/// Which logic module implements a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Console,
    TokenConsole,
    Sale,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Crowdsale console
    InitCrowdsaleToken,
    UpdateGlobalMinContribution,
    WhitelistMulti,
    SetCrowdsaleStartAndDuration,
    InitializeCrowdsale,
    FinalizeCrowdsale,
    // Token console
    UpdateMultipleReservedTokens,
    RemoveReservedTokens,
    DistributeReservedTokens,
    SetTransferAgentStatus,
    // Sale
    Buy,
    // Token
    Transfer,
    TransferFrom,
    Approve,
    IncreaseApproval,
    DecreaseApproval,
}

impl Function {
    pub const ALL: [Function; 16] = [
        Function::InitCrowdsaleToken,
        Function::UpdateGlobalMinContribution,
        Function::WhitelistMulti,
        Function::SetCrowdsaleStartAndDuration,
        Function::InitializeCrowdsale,
        Function::FinalizeCrowdsale,
        Function::UpdateMultipleReservedTokens,
        Function::RemoveReservedTokens,
        Function::DistributeReservedTokens,
        Function::SetTransferAgentStatus,
        Function::Buy,
        Function::Transfer,
        Function::TransferFrom,
        Function::Approve,
        Function::IncreaseApproval,
        Function::DecreaseApproval,
    ];

    /// Canonical signature; its keccak prefix is the selector.
    pub const fn signature(self) -> &'static str {
        match self {
            Function::InitCrowdsaleToken => "initCrowdsaleToken(string,string,uint256)",
            Function::UpdateGlobalMinContribution => "updateGlobalMinContribution(uint256)",
            Function::WhitelistMulti => "whitelistMulti(address[],uint256[],uint256[])",
            Function::SetCrowdsaleStartAndDuration => {
                "setCrowdsaleStartAndDuration(uint256,uint256)"
            }
            Function::InitializeCrowdsale => "initializeCrowdsale()",
            Function::FinalizeCrowdsale => "finalizeCrowdsale()",
            Function::UpdateMultipleReservedTokens => {
                "updateMultipleReservedTokens(address[],uint256[],uint256[],uint256[])"
            }
            Function::RemoveReservedTokens => "removeReservedTokens(address)",
            Function::DistributeReservedTokens => "distributeReservedTokens(uint256)",
            Function::SetTransferAgentStatus => "setTransferAgentStatus(address,bool)",
            Function::Buy => "buy()",
            Function::Transfer => "transfer(address,uint256)",
            Function::TransferFrom => "transferFrom(address,address,uint256)",
            Function::Approve => "approve(address,uint256)",
            Function::IncreaseApproval => "increaseApproval(address,uint256)",
            Function::DecreaseApproval => "decreaseApproval(address,uint256)",
        }
    }

    pub fn selector(self) -> Selector {
        Selector::from_signature(self.signature())
    }

    pub fn from_selector(selector: Selector) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|function| function.selector() == selector)
    }

    pub const fn module(self) -> ModuleKind {
        match self {
            Function::InitCrowdsaleToken
            | Function::UpdateGlobalMinContribution
            | Function::WhitelistMulti
            | Function::SetCrowdsaleStartAndDuration
            | Function::InitializeCrowdsale
            | Function::FinalizeCrowdsale => ModuleKind::Console,
            Function::UpdateMultipleReservedTokens
            | Function::RemoveReservedTokens
            | Function::DistributeReservedTokens
            | Function::SetTransferAgentStatus => ModuleKind::TokenConsole,
            Function::Buy => ModuleKind::Sale,
            Function::Transfer
            | Function::TransferFrom
            | Function::Approve
            | Function::IncreaseApproval
            | Function::DecreaseApproval => ModuleKind::Token,
        }
    }
}

/// Signature of the init entrypoint.
pub const INIT_SIGNATURE: &str =
    "init(address,uint256,uint256,uint256,uint256,uint256,uint256)";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_selectors_are_unique() {
        let selectors: HashSet<Selector> = Function::ALL.iter().map(|f| f.selector()).collect();
        assert_eq!(selectors.len(), 16);
    }

    #[test]
    fn test_from_selector_round_trip() {
        for function in Function::ALL {
            assert_eq!(Function::from_selector(function.selector()), Some(function));
        }
        assert_eq!(
            Function::from_selector(Selector::from_signature("mint(uint256)")),
            None
        );
    }

    #[test]
    fn test_well_known_token_selectors() {
        assert_eq!(Function::Transfer.selector().to_string(), "0xa9059cbb");
        assert_eq!(Function::Approve.selector().to_string(), "0x095ea7b3");
    }
}
