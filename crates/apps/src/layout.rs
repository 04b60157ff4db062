//! Storage layout shared by the DutchCrowdsale modules.

use rexec_engine::{KeyBuilder, ReservationLayout};
use rexec_primitives::{Address, Word};

fn key(label: &str) -> Word {
    KeyBuilder::new(label).build()
}

// Sale configuration

pub fn team_wallet() -> Word {
    key("crowdsale.team_wallet")
}

/// Upper bound on tokens ever minted.
pub fn max_supply() -> Word {
    key("crowdsale.max_supply")
}

/// Tokens available to buyers.
pub fn sale_cap() -> Word {
    key("crowdsale.sale_cap")
}

pub fn start_rate() -> Word {
    key("crowdsale.start_rate")
}

pub fn end_rate() -> Word {
    key("crowdsale.end_rate")
}

pub fn start_time() -> Word {
    key("crowdsale.start_time")
}

pub fn duration() -> Word {
    key("crowdsale.duration")
}

pub fn global_min_contribution() -> Word {
    key("crowdsale.min_contribution")
}

pub fn token_initialized() -> Word {
    key("crowdsale.token_initialized")
}

// Sale progress

pub fn wei_raised() -> Word {
    key("crowdsale.wei_raised")
}

pub fn tokens_sold() -> Word {
    key("crowdsale.tokens_sold")
}

pub fn contributed(buyer: Address) -> Word {
    KeyBuilder::new("crowdsale.contributed").address(buyer).build()
}

// Whitelist

pub fn whitelist() -> Word {
    key("crowdsale.whitelist")
}

pub fn whitelist_item(index: u64) -> Word {
    KeyBuilder::from_key(whitelist()).index(index).build()
}

pub fn whitelist_listed(address: Address) -> Word {
    whitelist_entry(address).label("listed").build()
}

pub fn whitelist_minimum(address: Address) -> Word {
    whitelist_entry(address).label("minimum").build()
}

pub fn whitelist_maximum(address: Address) -> Word {
    whitelist_entry(address).label("maximum").build()
}

fn whitelist_entry(address: Address) -> KeyBuilder {
    KeyBuilder::new("crowdsale.whitelist.entry").address(address)
}

// Token

pub fn token_name() -> Word {
    key("token.name")
}

pub fn token_symbol() -> Word {
    key("token.symbol")
}

pub fn token_decimals() -> Word {
    key("token.decimals")
}

/// Tokens minted so far.
pub fn total_supply() -> Word {
    key("token.total_supply")
}

pub fn balance(owner: Address) -> Word {
    KeyBuilder::new("token.balances").address(owner).build()
}

pub fn allowance(owner: Address, spender: Address) -> Word {
    KeyBuilder::new("token.allowances")
        .address(owner)
        .address(spender)
        .build()
}

pub fn transfer_agent(agent: Address) -> Word {
    KeyBuilder::new("token.transfer_agents").address(agent).build()
}

pub fn reservations() -> ReservationLayout {
    ReservationLayout::new("token.reserved")
}
