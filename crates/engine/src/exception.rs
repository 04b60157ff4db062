//! Application-level exceptions.
//!
//! A module that rejects a call for a business reason returns an
//! [`ApplicationException`] instead of an [`crate::EffectSet`]. The engine
//! reports the reason through a notification and commits nothing; the call
//! itself still succeeds.

use thiserror::Error;

use crate::effects::EffectSet;

/// Recoverable business-rule rejection carrying a short reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("application exception: {reason}")]
pub struct ApplicationException {
    reason: String,
}

impl ApplicationException {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Reason cut to at most `max_len` bytes on a character boundary.
    pub fn truncated_reason(&self, max_len: usize) -> String {
        if self.reason.len() <= max_len {
            return self.reason.clone();
        }
        let mut end = max_len;
        while !self.reason.is_char_boundary(end) {
            end -= 1;
        }
        self.reason[..end].to_owned()
    }
}

/// Outcome of a logic module call.
pub type ModuleResult = Result<EffectSet, ApplicationException>;

/// Returns `Err(ApplicationException::new(reason))` unless `condition` holds.
pub fn ensure(condition: bool, reason: &str) -> Result<(), ApplicationException> {
    if condition {
        Ok(())
    } else {
        Err(ApplicationException::new(reason))
    }
}

/// Reason strings shared by the bundled modules.
pub mod reasons {
    pub const DEFAULT_EXCEPTION: &str = "DefaultException";
    pub const IMPROPER_INITIALIZATION: &str = "ImproperInitialization";
    pub const NOT_ADMIN_OR_SALE_IS_INIT: &str = "NotAdminOrSaleIsInit";
    pub const CROWDSALE_STARTED_OR_TOKEN_NOT_INIT: &str = "CrowdsaleStartedOrTokenNotInit";
    pub const NOT_ADMIN_OR_STATUS_INVALID: &str = "NotAdminOrStatusInvalid";
    pub const ARRAY_LEN_MISMATCH: &str = "ArrayLenMismatch";
    pub const INVALID_TIER_VALS: &str = "InvalidTierVals";
    pub const CANNOT_MODIFY_CURRENT_TIER: &str = "CannotModifyCurrentTier";
    pub const INVALID_CROWDSALE_STATUS: &str = "InvalidCrowdsaleStatus";
    pub const DURATION_UNCHANGED: &str = "DurationUnchanged";
    pub const INVALID_DESTINATION: &str = "InvalidDestination";
    pub const INVALID_AMT: &str = "InvalidAmt";
    pub const CROWDSALE_NOT_FINALIZED: &str = "CrowdsaleNotFinalized";
    pub const NO_REMAINING_DESTINATIONS: &str = "NoRemainingDestinations";
    pub const INSUFFICIENT_FUNDS: &str = "InsufficientFunds";
    pub const TRANSFERS_LOCKED: &str = "TransfersLocked";
    pub const SALE_NOT_ACTIVE: &str = "SaleNotActive";
    pub const SENDER_NOT_WHITELISTED: &str = "SenderNotWhitelisted";
    pub const UNKNOWN_FUNCTION: &str = "UnknownFunction";
}
