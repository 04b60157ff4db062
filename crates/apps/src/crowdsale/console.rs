//! Admin console of the crowdsale.

use rexec_engine::prelude::*;
use rexec_engine::ContextSlot;
use tracing::debug;

use crate::functions::Function;
use crate::layout;

use super::state::SaleState;

/// Largest accepted number of token decimals.
pub const MAX_DECIMALS: u64 = 18;

/// Most addresses accepted by one `whitelistMulti` call.
pub const MAX_WHITELIST_BATCH: usize = 64;

#[derive(Debug, Default, Clone, Copy)]
pub struct CrowdsaleConsole;

impl LogicModule for CrowdsaleConsole {
    fn name(&self) -> &'static str {
        "dutch-crowdsale-console"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        match Function::from_selector(call.selector) {
            Some(Function::InitCrowdsaleToken) => init_crowdsale_token(call),
            Some(Function::UpdateGlobalMinContribution) => update_global_min_contribution(call),
            Some(Function::WhitelistMulti) => whitelist_multi(call),
            Some(Function::SetCrowdsaleStartAndDuration) => set_start_and_duration(call),
            Some(Function::InitializeCrowdsale) => initialize_crowdsale(call),
            Some(Function::FinalizeCrowdsale) => finalize_crowdsale(call),
            _ => Err(ApplicationException::new(reasons::UNKNOWN_FUNCTION)),
        }
    }
}

/// Admin of a sale that has not been initialized yet.
fn ensure_configurable(call: &ModuleCall<'_>) -> Result<(), ApplicationException> {
    let storage = &call.storage;
    ensure(
        storage.is_admin(call.sender) && !storage.is_initialized(),
        reasons::NOT_ADMIN_OR_SALE_IS_INIT,
    )
}

fn init_crowdsale_token(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let name = args.string()?;
    let symbol = args.string()?;
    let decimals = args.uint64()?;
    args.finish()?;

    ensure(
        !name.is_empty() && !symbol.is_empty() && decimals <= MAX_DECIMALS,
        reasons::IMPROPER_INITIALIZATION,
    )?;
    ensure_configurable(call)?;

    debug!(exec_id = %call.execution_id(), %name, %symbol, decimals, "token initialized");

    let mut effects = EffectSet::new();
    effects
        .set_string(layout::token_name(), &name)
        .set_string(layout::token_symbol(), &symbol)
        .set(layout::token_decimals(), decimals)
        .set(layout::token_initialized(), true)
        .emit(Event::named(
            "CrowdsaleTokenInit(bytes32,bytes32,uint256)",
            vec![call.execution_id().into()],
            Word::from(decimals).as_bytes().to_vec(),
        ));
    Ok(effects)
}

fn update_global_min_contribution(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let minimum = args.uint()?;
    args.finish()?;
    ensure_configurable(call)?;

    let mut effects = EffectSet::new();
    effects.set(layout::global_min_contribution(), minimum);
    Ok(effects)
}

fn whitelist_multi(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let addresses = args.addresses()?;
    let minimums = args.uints()?;
    let maximums = args.uints()?;
    args.finish()?;

    let storage = &call.storage;
    ensure(
        storage.is_admin(call.sender) && !storage.is_finalized(),
        reasons::NOT_ADMIN_OR_STATUS_INVALID,
    )?;
    ensure(
        !addresses.is_empty() && addresses.len() <= MAX_WHITELIST_BATCH,
        reasons::DEFAULT_EXCEPTION,
    )?;
    ensure(
        minimums.len() == addresses.len() && maximums.len() == addresses.len(),
        reasons::ARRAY_LEN_MISMATCH,
    )?;

    let mut length = storage.read_u64(layout::whitelist())?;
    let mut effects = EffectSet::new();
    for (i, address) in addresses.iter().copied().enumerate() {
        ensure(!address.is_zero(), reasons::INVALID_DESTINATION)?;
        let already_listed = storage.read_bool(layout::whitelist_listed(address))
            || effects.pending(layout::whitelist_listed(address)).is_some();
        if !already_listed {
            effects
                .set(layout::whitelist_item(length), address)
                .set(layout::whitelist_listed(address), true);
            length += 1;
        }
        effects
            .set(layout::whitelist_minimum(address), minimums[i])
            .set(layout::whitelist_maximum(address), maximums[i]);
    }
    effects.set(layout::whitelist(), length);

    debug!(exec_id = %call.execution_id(), entries = addresses.len(), length, "whitelist updated");
    Ok(effects)
}

fn set_start_and_duration(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let start_time = args.uint64()?;
    let duration = args.uint64()?;
    args.finish()?;
    ensure_configurable(call)?;

    let sale = SaleState::load(&call.storage)?;
    ensure(
        start_time != sale.start_time || duration != sale.duration,
        reasons::DURATION_UNCHANGED,
    )?;
    ensure(
        duration > 0
            && start_time >= call.timestamp
            && start_time.checked_add(duration).is_some(),
        reasons::INVALID_CROWDSALE_STATUS,
    )?;

    let mut effects = EffectSet::new();
    effects
        .set(layout::start_time(), start_time)
        .set(layout::duration(), duration);
    Ok(effects)
}

fn initialize_crowdsale(call: &ModuleCall<'_>) -> ModuleResult {
    call.args().finish()?;
    ensure_configurable(call)?;

    let sale = SaleState::load(&call.storage)?;
    ensure(
        sale.token_initialized && call.timestamp < sale.start_time,
        reasons::CROWDSALE_STARTED_OR_TOKEN_NOT_INIT,
    )?;

    debug!(exec_id = %call.execution_id(), start_time = sale.start_time, "crowdsale initialized");

    let mut effects = EffectSet::new();
    effects
        .set(ContextSlot::Initialized.key(), true)
        .emit(Event::named(
            "CrowdsaleInitialized(bytes32,uint256)",
            vec![call.execution_id().into()],
            Word::from(sale.start_time).as_bytes().to_vec(),
        ));
    Ok(effects)
}

fn finalize_crowdsale(call: &ModuleCall<'_>) -> ModuleResult {
    call.args().finish()?;
    let storage = &call.storage;
    ensure(
        storage.is_admin(call.sender) && storage.is_initialized() && !storage.is_finalized(),
        reasons::NOT_ADMIN_OR_STATUS_INVALID,
    )?;

    debug!(exec_id = %call.execution_id(), "crowdsale finalized");

    let mut effects = EffectSet::new();
    effects
        .set(ContextSlot::Finalized.key(), true)
        .emit(Event::named(
            "CrowdsaleFinalized(bytes32)",
            vec![call.execution_id().into()],
            Vec::new(),
        ));
    Ok(effects)
}
