//! DutchCrowdsale: a sale whose token price decays linearly over time.

pub mod console;
pub mod getters;
pub mod init;
pub mod sale;
pub mod state;

pub use console::CrowdsaleConsole;
pub use init::{CrowdsaleInit, SaleConfig};
pub use sale::Sale;
pub use state::SaleState;
