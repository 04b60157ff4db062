//! Read-only views over a crowdsale instance.
//!
//! Getters take a [`StorageReader`], obtained from
//! [`ExecutionEngine::reader`](rexec_engine::ExecutionEngine::reader), and never
//! produce effects.

use rexec_engine::prelude::*;
use rexec_engine::{Reservation, ReservationBook};
use serde::Serialize;

use crate::layout;

use super::state::SaleState;

pub type ViewResult<T> = Result<T, ApplicationException>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrowdsaleInfo {
    pub wei_raised: u128,
    pub team_wallet: Address,
    pub min_contribution: u128,
    pub initialized: bool,
    pub finalized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u64,
    pub total_supply: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WhitelistStatus {
    pub minimum: u128,
    pub maximum: u128,
    pub contributed: u128,
}

pub fn crowdsale_info(storage: &StorageReader<'_>) -> ViewResult<CrowdsaleInfo> {
    let sale = SaleState::load(storage)?;
    Ok(CrowdsaleInfo {
        wei_raised: sale.wei_raised,
        team_wallet: sale.team_wallet,
        min_contribution: sale.min_contribution,
        initialized: sale.initialized,
        finalized: sale.finalized,
    })
}

/// `(start_time, end_time)` of the sale.
pub fn crowdsale_window(storage: &StorageReader<'_>) -> ViewResult<(u64, u64)> {
    let sale = SaleState::load(storage)?;
    Ok((sale.start_time, sale.end_time()))
}

/// Tokens per wei at `now`, zero outside the sale window.
pub fn current_rate(storage: &StorageReader<'_>, now: u64) -> ViewResult<u128> {
    Ok(SaleState::load(storage)?.current_rate(now)?.unwrap_or(0))
}

/// Whitelisted addresses in insertion order.
pub fn crowdsale_whitelist(storage: &StorageReader<'_>) -> ViewResult<Vec<Address>> {
    let len = storage.read_u64(layout::whitelist())?;
    Ok((0..len)
        .map(|i| storage.read_address(layout::whitelist_item(i)))
        .collect())
}

pub fn whitelist_status(storage: &StorageReader<'_>, buyer: Address) -> ViewResult<WhitelistStatus> {
    Ok(WhitelistStatus {
        minimum: storage.read_u128(layout::whitelist_minimum(buyer))?,
        maximum: storage.read_u128(layout::whitelist_maximum(buyer))?,
        contributed: storage.read_u128(layout::contributed(buyer))?,
    })
}

pub fn token_info(storage: &StorageReader<'_>) -> ViewResult<TokenInfo> {
    Ok(TokenInfo {
        name: storage.read_string(layout::token_name())?,
        symbol: storage.read_string(layout::token_symbol())?,
        decimals: storage.read_u64(layout::token_decimals())?,
        total_supply: storage.read_u128(layout::total_supply())?,
    })
}

pub fn balance_of(storage: &StorageReader<'_>, owner: Address) -> ViewResult<u128> {
    storage.read_u128(layout::balance(owner))
}

pub fn allowance(storage: &StorageReader<'_>, owner: Address, spender: Address) -> ViewResult<u128> {
    storage.read_u128(layout::allowance(owner, spender))
}

pub fn is_transfer_agent(storage: &StorageReader<'_>, agent: Address) -> bool {
    storage.read_bool(layout::transfer_agent(agent))
}

pub fn reserved_destinations(storage: &StorageReader<'_>) -> ViewResult<Vec<Address>> {
    let book = ReservationBook::load(storage, layout::reservations())?;
    Ok(book.destinations().collect())
}

pub fn reservation(storage: &StorageReader<'_>, destination: Address) -> ViewResult<Option<Reservation>> {
    let book = ReservationBook::load(storage, layout::reservations())?;
    Ok(book.get(destination).copied())
}

/// Tokens sold to buyers, excluding reserved allocations.
pub fn total_sold(storage: &StorageReader<'_>) -> ViewResult<u128> {
    storage.read_u128(layout::tokens_sold())
}
