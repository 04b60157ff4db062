//! Token issued by the crowdsale.

pub mod console;
pub mod transfer;

pub use console::TokenConsole;
pub use transfer::Token;
