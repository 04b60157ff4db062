//! Token transfers and allowances.

use rexec_engine::prelude::*;

use crate::functions::Function;
use crate::layout;

const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
const APPROVAL_EVENT: &str = "Approval(address,address,uint256)";

#[derive(Debug, Default, Clone, Copy)]
pub struct Token;

impl LogicModule for Token {
    fn name(&self) -> &'static str {
        "dutch-crowdsale-token"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        let mut args = call.args();
        let effects = match Function::from_selector(call.selector) {
            Some(Function::Transfer) => {
                let to = args.address()?;
                let amount = args.uint()?;
                args.finish()?;
                transfer(call, call.sender, to, amount)?
            }
            Some(Function::TransferFrom) => {
                let from = args.address()?;
                let to = args.address()?;
                let amount = args.uint()?;
                args.finish()?;
                transfer_from(call, from, to, amount)?
            }
            Some(
                function @ (Function::Approve
                | Function::IncreaseApproval
                | Function::DecreaseApproval),
            ) => {
                let spender = args.address()?;
                let amount = args.uint()?;
                args.finish()?;
                let current = call
                    .storage
                    .read_u128(layout::allowance(call.sender, spender))?;
                let updated = match function {
                    Function::Approve => amount,
                    Function::IncreaseApproval => current
                        .checked_add(amount)
                        .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))?,
                    _ => current.saturating_sub(amount),
                };
                approve(call.sender, spender, updated)
            }
            _ => return Err(ApplicationException::new(reasons::UNKNOWN_FUNCTION)),
        };
        Ok(effects)
    }
}

/// Transfers are locked until the sale is finalized, except for transfer
/// agents.
fn ensure_unlocked(storage: &StorageReader<'_>, owner: Address) -> Result<(), ApplicationException> {
    ensure(
        storage.is_finalized() || storage.read_bool(layout::transfer_agent(owner)),
        reasons::TRANSFERS_LOCKED,
    )
}

fn move_tokens(
    storage: &StorageReader<'_>,
    effects: &mut EffectSet,
    from: Address,
    to: Address,
    amount: u128,
) -> Result<(), ApplicationException> {
    ensure(!to.is_zero(), reasons::INVALID_DESTINATION)?;
    let from_balance = storage.read_u128(layout::balance(from))?;
    ensure(from_balance >= amount, reasons::INSUFFICIENT_FUNDS)?;

    if from != to {
        let to_balance = storage
            .read_u128(layout::balance(to))?
            .checked_add(amount)
            .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))?;
        effects
            .set(layout::balance(from), from_balance - amount)
            .set(layout::balance(to), to_balance);
    }
    effects.emit(Event::named(
        TRANSFER_EVENT,
        vec![from.into(), to.into()],
        Word::from(amount).as_bytes().to_vec(),
    ));
    Ok(())
}

fn transfer(call: &ModuleCall<'_>, from: Address, to: Address, amount: u128) -> ModuleResult {
    ensure_unlocked(&call.storage, from)?;
    let mut effects = EffectSet::new();
    move_tokens(&call.storage, &mut effects, from, to, amount)?;
    Ok(effects)
}

fn transfer_from(call: &ModuleCall<'_>, from: Address, to: Address, amount: u128) -> ModuleResult {
    let storage = &call.storage;
    ensure_unlocked(storage, from)?;
    let allowance = storage.read_u128(layout::allowance(from, call.sender))?;
    ensure(allowance >= amount, reasons::INSUFFICIENT_FUNDS)?;

    let mut effects = EffectSet::new();
    move_tokens(storage, &mut effects, from, to, amount)?;
    effects.set(layout::allowance(from, call.sender), allowance - amount);
    Ok(effects)
}

fn approve(owner: Address, spender: Address, amount: u128) -> EffectSet {
    let mut effects = EffectSet::new();
    effects
        .set(layout::allowance(owner, spender), amount)
        .emit(Event::named(
            APPROVAL_EVENT,
            vec![owner.into(), spender.into()],
            Word::from(amount).as_bytes().to_vec(),
        ));
    effects
}
