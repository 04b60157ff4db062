//! Sale state as seen by the crowdsale modules.

use rexec_engine::prelude::*;

use crate::layout;

/// Snapshot of the sale slots of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleState {
    pub team_wallet: Address,
    pub max_supply: u128,
    pub sale_cap: u128,
    pub start_rate: u128,
    pub end_rate: u128,
    pub start_time: u64,
    pub duration: u64,
    pub min_contribution: u128,
    pub wei_raised: u128,
    pub tokens_sold: u128,
    pub decimals: u32,
    pub token_initialized: bool,
    pub initialized: bool,
    pub finalized: bool,
}

impl SaleState {
    pub fn load(reader: &StorageReader<'_>) -> Result<Self, ApplicationException> {
        let decimals = u32::try_from(reader.read_u64(layout::token_decimals())?)
            .map_err(|_| ApplicationException::new(reasons::DEFAULT_EXCEPTION))?;
        Ok(Self {
            team_wallet: reader.read_address(layout::team_wallet()),
            max_supply: reader.read_u128(layout::max_supply())?,
            sale_cap: reader.read_u128(layout::sale_cap())?,
            start_rate: reader.read_u128(layout::start_rate())?,
            end_rate: reader.read_u128(layout::end_rate())?,
            start_time: reader.read_u64(layout::start_time())?,
            duration: reader.read_u64(layout::duration())?,
            min_contribution: reader.read_u128(layout::global_min_contribution())?,
            wei_raised: reader.read_u128(layout::wei_raised())?,
            tokens_sold: reader.read_u128(layout::tokens_sold())?,
            decimals,
            token_initialized: reader.read_bool(layout::token_initialized()),
            initialized: reader.is_initialized(),
            finalized: reader.is_finalized(),
        })
    }

    pub fn end_time(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Purchases are accepted.
    pub fn is_open(&self, now: u64) -> bool {
        self.initialized && !self.finalized && now >= self.start_time && now < self.end_time()
    }

    /// Tokens per wei at `now`, decaying linearly from the start rate to the
    /// end rate over the sale. `None` outside the sale window.
    pub fn current_rate(&self, now: u64) -> Result<Option<u128>, ApplicationException> {
        if self.duration == 0 || now < self.start_time || now >= self.end_time() {
            return Ok(None);
        }
        let elapsed = u128::from(now - self.start_time);
        let spread = self.start_rate.saturating_sub(self.end_rate);
        let decay = spread
            .checked_mul(elapsed)
            .map(|product| product / u128::from(self.duration))
            .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))?;
        Ok(Some(self.start_rate - decay))
    }

    /// Tokens still available to buyers.
    pub fn tokens_remaining(&self) -> u128 {
        self.sale_cap.saturating_sub(self.tokens_sold)
    }

    /// `10^decimals`, the number of wei-rate units per whole token.
    pub fn token_unit(&self) -> Result<u128, ApplicationException> {
        10u128
            .checked_pow(self.decimals)
            .ok_or_else(|| ApplicationException::new(reasons::DEFAULT_EXCEPTION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SaleState {
        SaleState {
            team_wallet: Address::from_low_u64(1),
            max_supply: 1_000,
            sale_cap: 500,
            start_rate: 100,
            end_rate: 50,
            start_time: 1_000,
            duration: 100,
            min_contribution: 0,
            wei_raised: 0,
            tokens_sold: 120,
            decimals: 0,
            token_initialized: true,
            initialized: true,
            finalized: false,
        }
    }

    #[test]
    fn test_rate_decays_linearly() {
        let sale = state();
        assert_eq!(sale.current_rate(999).unwrap(), None);
        assert_eq!(sale.current_rate(1_000).unwrap(), Some(100));
        assert_eq!(sale.current_rate(1_050).unwrap(), Some(75));
        assert_eq!(sale.current_rate(1_099).unwrap(), Some(51));
        assert_eq!(sale.current_rate(1_100).unwrap(), None);
    }

    #[test]
    fn test_window_and_remaining() {
        let mut sale = state();
        assert!(sale.is_open(1_000));
        assert!(!sale.is_open(1_100));
        assert_eq!(sale.tokens_remaining(), 380);

        sale.finalized = true;
        assert!(!sale.is_open(1_010));
    }
}
