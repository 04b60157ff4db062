//! Instantiation of a DutchCrowdsale.

use rexec_engine::prelude::*;
use tracing::debug;

use crate::layout;

/// Validated init arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleConfig {
    pub team_wallet: Address,
    /// Most tokens that may ever exist.
    pub total_supply: u128,
    /// Tokens offered to buyers.
    pub sale_cap: u128,
    /// Tokens per wei at the start of the sale.
    pub start_rate: u128,
    /// Tokens per wei at the end of the sale.
    pub end_rate: u128,
    /// Sale length in seconds.
    pub duration: u64,
    /// Unix time the sale opens.
    pub start_time: u64,
}

impl SaleConfig {
    pub fn decode(args: &mut ArgReader<'_>) -> Result<Self, ApplicationException> {
        let config = Self {
            team_wallet: args.address()?,
            total_supply: args.uint()?,
            sale_cap: args.uint()?,
            start_rate: args.uint()?,
            end_rate: args.uint()?,
            duration: args.uint64()?,
            start_time: args.uint64()?,
        };
        Ok(config)
    }

    /// Init calldata for this configuration.
    pub fn calldata(&self) -> Vec<u8> {
        CalldataBuilder::signature(crate::functions::INIT_SIGNATURE)
            .address(self.team_wallet)
            .uint(self.total_supply)
            .uint(self.sale_cap)
            .uint(self.start_rate)
            .uint(self.end_rate)
            .uint(u128::from(self.duration))
            .uint(u128::from(self.start_time))
            .build()
    }

    fn validate(&self, now: u64) -> Result<(), ApplicationException> {
        let valid = !self.team_wallet.is_zero()
            && self.total_supply > 0
            && self.sale_cap > 0
            && self.sale_cap <= self.total_supply
            && self.end_rate > 0
            && self.start_rate > self.end_rate
            && self.duration > 0
            && self.start_time >= now
            && self.start_time.checked_add(self.duration).is_some();
        ensure(valid, reasons::IMPROPER_INITIALIZATION)
    }
}

/// Init module: records the sale configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrowdsaleInit;

impl LogicModule for CrowdsaleInit {
    fn name(&self) -> &'static str {
        "dutch-crowdsale-init"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        let mut args = call.args();
        let config = SaleConfig::decode(&mut args)?;
        args.finish()?;
        config.validate(call.timestamp)?;

        debug!(
            exec_id = %call.execution_id(),
            team_wallet = %config.team_wallet,
            sale_cap = config.sale_cap,
            "initializing crowdsale"
        );

        let mut effects = EffectSet::new();
        effects
            .set(layout::team_wallet(), config.team_wallet)
            .set(layout::max_supply(), config.total_supply)
            .set(layout::sale_cap(), config.sale_cap)
            .set(layout::start_rate(), config.start_rate)
            .set(layout::end_rate(), config.end_rate)
            .set(layout::duration(), config.duration)
            .set(layout::start_time(), config.start_time)
            .emit(Event::named(
                "CrowdsaleCreated(address,uint256)",
                vec![Word::from(config.team_wallet)],
                Word::from(config.start_time).as_bytes().to_vec(),
            ));
        Ok(effects)
    }
}
