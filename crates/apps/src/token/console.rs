//! Admin console of the crowdsale token: reserved allocations and transfer
//! agents.

use rexec_engine::prelude::*;
use rexec_engine::ReservationBook;
use tracing::debug;

use crate::crowdsale::SaleState;
use crate::functions::Function;
use crate::layout;

#[derive(Debug, Default, Clone, Copy)]
pub struct TokenConsole;

impl LogicModule for TokenConsole {
    fn name(&self) -> &'static str {
        "dutch-crowdsale-token-console"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        match Function::from_selector(call.selector) {
            Some(Function::UpdateMultipleReservedTokens) => update_reserved_tokens(call),
            Some(Function::RemoveReservedTokens) => remove_reserved_tokens(call),
            Some(Function::DistributeReservedTokens) => distribute_reserved_tokens(call),
            Some(Function::SetTransferAgentStatus) => set_transfer_agent_status(call),
            _ => Err(ApplicationException::new(reasons::UNKNOWN_FUNCTION)),
        }
    }
}

fn ensure_configurable(call: &ModuleCall<'_>) -> Result<(), ApplicationException> {
    ensure(
        call.storage.is_admin(call.sender) && !call.storage.is_initialized(),
        reasons::NOT_ADMIN_OR_SALE_IS_INIT,
    )
}

fn update_reserved_tokens(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let destinations = args.addresses()?;
    let tokens = args.uints()?;
    let percents = args.uints()?;
    let precisions = args.uints()?;
    args.finish()?;
    ensure_configurable(call)?;

    let mut book = ReservationBook::load(&call.storage, layout::reservations())?;
    book.upsert_many(&destinations, &tokens, &percents, &precisions)?;

    // Flat allocations must fit in the supply left over by the sale cap.
    let sale = SaleState::load(&call.storage)?;
    let flat = book
        .entries()
        .iter()
        .try_fold(0u128, |sum, entry| sum.checked_add(entry.tokens));
    ensure(
        flat.is_some_and(|flat| flat <= sale.max_supply.saturating_sub(sale.sale_cap)),
        reasons::INVALID_AMT,
    )?;

    let mut effects = EffectSet::new();
    book.persist(&mut effects);
    debug!(exec_id = %call.execution_id(), reserved = book.len(), "reservations updated");
    Ok(effects)
}

fn remove_reserved_tokens(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let destination = args.address()?;
    args.finish()?;
    ensure_configurable(call)?;

    let mut book = ReservationBook::load(&call.storage, layout::reservations())?;
    book.remove(destination)?;

    let mut effects = EffectSet::new();
    book.persist(&mut effects);
    Ok(effects)
}

/// Mints the reserved allocation of up to `amount` destinations, taken from
/// the end of the list. Callable by anyone once the sale is finalized.
fn distribute_reserved_tokens(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let amount = args.uint64()?;
    args.finish()?;

    let storage = &call.storage;
    let amount = usize::try_from(amount).unwrap_or(usize::MAX);
    let mut book = ReservationBook::load(storage, layout::reservations())?;
    let taken = book.take_for_distribution(amount, storage.is_finalized())?;

    let overflow = || ApplicationException::new(reasons::DEFAULT_EXCEPTION);
    let sale = SaleState::load(storage)?;
    let total_sold = sale.tokens_sold;
    let mut minted = storage.read_u128(layout::total_supply())?;

    let mut effects = EffectSet::new();
    for reservation in &taken {
        let destination = reservation.destination;
        let previous = storage.read_u128(layout::balance(destination))?;
        let balance = reservation.distribution_amount(total_sold, previous)?;
        minted = minted
            .checked_add(balance - previous)
            .ok_or_else(overflow)?;
        effects.set(layout::balance(destination), balance).emit(Event::named(
            "ReservedTokensDistributed(address,uint256)",
            vec![destination.into()],
            Word::from(balance - previous).as_bytes().to_vec(),
        ));
    }
    ensure(minted <= sale.max_supply, reasons::INVALID_AMT)?;
    effects.set(layout::total_supply(), minted);
    book.persist(&mut effects);

    debug!(
        exec_id = %call.execution_id(),
        distributed = taken.len(),
        remaining = book.len(),
        "reserved tokens distributed"
    );
    Ok(effects)
}

fn set_transfer_agent_status(call: &ModuleCall<'_>) -> ModuleResult {
    let mut args = call.args();
    let agent = args.address()?;
    let allowed = args.boolean()?;
    args.finish()?;

    ensure(
        call.storage.is_admin(call.sender),
        reasons::NOT_ADMIN_OR_STATUS_INVALID,
    )?;
    ensure(!agent.is_zero(), reasons::INVALID_DESTINATION)?;

    let mut effects = EffectSet::new();
    effects
        .set(layout::transfer_agent(agent), allowed)
        .emit(Event::named(
            "TransferAgentStatusUpdate(address,bool)",
            vec![agent.into()],
            Word::from(allowed).as_bytes().to_vec(),
        ));
    Ok(effects)
}
