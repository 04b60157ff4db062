//! Token purchases.

use rexec_engine::prelude::*;
use tracing::debug;

use crate::functions::Function;
use crate::layout;

use super::state::SaleState;

#[derive(Debug, Default, Clone, Copy)]
pub struct Sale;

impl LogicModule for Sale {
    fn name(&self) -> &'static str {
        "dutch-crowdsale-sale"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        match Function::from_selector(call.selector) {
            Some(Function::Buy) => buy(call),
            _ => Err(ApplicationException::new(reasons::UNKNOWN_FUNCTION)),
        }
    }
}

/// Limits that apply to one buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PurchaseLimits {
    minimum: u128,
    /// Cap on cumulative spend; zero means uncapped.
    maximum: u128,
}

fn purchase_limits(
    storage: &StorageReader<'_>,
    sale: &SaleState,
    buyer: Address,
) -> Result<PurchaseLimits, ApplicationException> {
    // An empty whitelist opens the sale to everyone.
    if storage.read_u64(layout::whitelist())? == 0 {
        return Ok(PurchaseLimits {
            minimum: sale.min_contribution,
            maximum: 0,
        });
    }
    ensure(
        storage.read_bool(layout::whitelist_listed(buyer)),
        reasons::SENDER_NOT_WHITELISTED,
    )?;
    Ok(PurchaseLimits {
        minimum: storage.read_u128(layout::whitelist_minimum(buyer))?,
        maximum: storage.read_u128(layout::whitelist_maximum(buyer))?,
    })
}

fn buy(call: &ModuleCall<'_>) -> ModuleResult {
    call.args().finish()?;
    let storage = &call.storage;
    let buyer = call.sender;
    let now = call.timestamp;

    let sale = SaleState::load(storage)?;
    ensure(sale.is_open(now), reasons::SALE_NOT_ACTIVE)?;
    ensure(call.value > 0, reasons::INVALID_AMT)?;
    let rate = sale
        .current_rate(now)?
        .ok_or_else(|| ApplicationException::new(reasons::SALE_NOT_ACTIVE))?;

    let limits = purchase_limits(storage, &sale, buyer)?;
    let contributed = storage.read_u128(layout::contributed(buyer))?;

    let mut spend = call.value;
    if limits.maximum > 0 {
        let allowance = limits.maximum.saturating_sub(contributed);
        ensure(allowance > 0, reasons::INVALID_AMT)?;
        spend = spend.min(allowance);
    }
    ensure(spend >= limits.minimum, reasons::INVALID_AMT)?;

    let overflow = || ApplicationException::new(reasons::DEFAULT_EXCEPTION);
    let unit = sale.token_unit()?;
    let mut tokens = spend.checked_mul(rate).ok_or_else(overflow)? / unit;
    let remaining = sale.tokens_remaining();
    if tokens > remaining {
        tokens = remaining;
        // Round up so the wallet is never paid less than the tokens are worth.
        spend = tokens.checked_mul(unit).ok_or_else(overflow)?.div_ceil(rate);
    }
    ensure(tokens > 0, reasons::INVALID_AMT)?;

    let balance = storage.read_u128(layout::balance(buyer))?;
    let minted = storage.read_u128(layout::total_supply())?;
    let sum = |a: u128, b: u128| a.checked_add(b).ok_or_else(overflow);

    debug!(
        exec_id = %call.execution_id(),
        buyer = %buyer,
        spend,
        tokens,
        rate,
        "purchase"
    );

    let mut effects = EffectSet::new();
    effects
        .set(layout::balance(buyer), sum(balance, tokens)?)
        .set(layout::total_supply(), sum(minted, tokens)?)
        .set(layout::tokens_sold(), sum(sale.tokens_sold, tokens)?)
        .set(layout::wei_raised(), sum(sale.wei_raised, spend)?)
        .set(layout::contributed(buyer), sum(contributed, spend)?)
        .pay(sale.team_wallet, spend);
    if call.value > spend {
        effects.pay(buyer, call.value - spend);
    }

    let mut data = Word::from(tokens).as_bytes().to_vec();
    data.extend_from_slice(Word::from(spend).as_bytes());
    effects.emit(Event::named(
        "Purchase(address,uint256,uint256)",
        vec![buyer.into()],
        data,
    ));
    Ok(effects)
}
