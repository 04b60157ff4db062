//! # rexec-apps
//!
//! Applications built on the rexec engine. The bundled `DutchCrowdsale`
//! sells a token at a price that decays linearly from a start rate to an end
//! rate, with an admin console, a whitelist, reserved allocations and a
//! transfer-locked token.
//!
//! ```no_run
//! use rexec_apps::{crowdsale::SaleConfig, DutchCrowdsale, APP_NAME};
//! use rexec_engine::ExecutionEngine;
//! use rexec_primitives::Address;
//!
//! # fn main() -> rexec_engine::EngineResult<()> {
//! let provider = Address::from_low_u64(1);
//! let admin = Address::from_low_u64(2);
//! let mut engine = ExecutionEngine::in_memory();
//! let registry = engine.open_registry(provider)?;
//! DutchCrowdsale::new().register(&mut engine, provider, registry)?;
//!
//! let config = SaleConfig {
//!     team_wallet: Address::from_low_u64(3),
//!     total_supply: 1_000_000,
//!     sale_cap: 500_000,
//!     start_rate: 100,
//!     end_rate: 50,
//!     duration: 3_600,
//!     start_time: 4_000_000_000,
//! };
//! let instance = engine.create_instance(admin, APP_NAME, admin, registry, &config.calldata())?;
//! # let _ = instance;
//! # Ok(())
//! # }
//! ```

pub mod crowdsale;
pub mod functions;
pub mod layout;
pub mod token;

use std::sync::Arc;

use rexec_engine::{Binding, EngineResult, ExecutionEngine, LogicModule};
use rexec_primitives::{Address, ExecutionId, Selector, Word};
use rexec_store::Store;
use tracing::info;

pub use functions::{Function, ModuleKind, INIT_SIGNATURE};

/// Registered application name.
pub const APP_NAME: &str = "DutchCrowdsale";

/// Deterministic implementation address for a module label.
fn implementation_address(label: &str) -> Address {
    Word::keccak(label.as_bytes()).as_address()
}

/// Bindings of the DutchCrowdsale modules, one per [`ModuleKind`] plus init.
#[derive(Debug, Clone)]
pub struct DutchCrowdsale {
    init: Binding,
    console: Binding,
    token_console: Binding,
    sale: Binding,
    token: Binding,
}

impl Default for DutchCrowdsale {
    fn default() -> Self {
        Self::new()
    }
}

impl DutchCrowdsale {
    pub fn new() -> Self {
        fn bind(module: Arc<dyn LogicModule>) -> Binding {
            let address = implementation_address(module.name());
            Binding::new(address, module)
        }

        Self {
            init: bind(Arc::new(crowdsale::CrowdsaleInit)),
            console: bind(Arc::new(crowdsale::CrowdsaleConsole)),
            token_console: bind(Arc::new(token::TokenConsole)),
            sale: bind(Arc::new(crowdsale::Sale)),
            token: bind(Arc::new(token::Token)),
        }
    }

    pub fn init(&self) -> &Binding {
        &self.init
    }

    pub fn binding(&self, kind: ModuleKind) -> &Binding {
        match kind {
            ModuleKind::Console => &self.console,
            ModuleKind::TokenConsole => &self.token_console,
            ModuleKind::Sale => &self.sale,
            ModuleKind::Token => &self.token,
        }
    }

    /// Implementation address serving `function`.
    pub fn implementation(&self, function: Function) -> Address {
        self.binding(function.module()).address()
    }

    /// Parallel selector and binding tables covering every [`Function`].
    pub fn tables(&self) -> (Vec<Selector>, Vec<Binding>) {
        Function::ALL
            .iter()
            .map(|function| (function.selector(), self.binding(function.module()).clone()))
            .unzip()
    }

    /// Registers the application under [`APP_NAME`] in `registry_id`.
    pub fn register<S: Store>(
        &self,
        engine: &mut ExecutionEngine<S>,
        provider: Address,
        registry_id: ExecutionId,
    ) -> EngineResult<()> {
        let (selectors, implementations) = self.tables();
        engine.register_application(
            provider,
            registry_id,
            APP_NAME,
            self.init.clone(),
            &selectors,
            &implementations,
        )?;
        info!(registry = %registry_id, selectors = selectors.len(), "registered {}", APP_NAME);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_cover_every_function() {
        let app = DutchCrowdsale::new();
        let (selectors, implementations) = app.tables();
        assert_eq!(selectors.len(), 16);
        assert_eq!(implementations.len(), 16);

        let distinct: HashSet<Address> = implementations.iter().map(Binding::address).collect();
        assert_eq!(distinct.len(), 4);
        assert!(!distinct.contains(&app.init().address()));
    }

    #[test]
    fn test_implementation_routes_by_module() {
        let app = DutchCrowdsale::new();
        assert_eq!(
            app.implementation(Function::Buy),
            app.binding(ModuleKind::Sale).address()
        );
        assert_eq!(
            app.implementation(Function::Transfer),
            app.implementation(Function::Approve)
        );
        assert_ne!(
            app.implementation(Function::Transfer),
            app.implementation(Function::SetTransferAgentStatus)
        );
    }
}
