//! Logic module interface.

use std::fmt;
use std::sync::Arc;

use rexec_primitives::{Address, ExecutionId, Selector};

use crate::calldata::ArgReader;
use crate::exception::ModuleResult;
use crate::reader::StorageReader;

/// Inputs of one module invocation.
#[derive(Debug, Clone, Copy)]
pub struct ModuleCall<'a> {
    /// Authenticated caller.
    pub sender: Address,
    /// Value attached to the call.
    pub value: u128,
    /// Seconds since the Unix epoch, from the engine clock.
    pub timestamp: u64,
    /// Dispatched selector.
    pub selector: Selector,
    /// Calldata after the selector.
    pub args: &'a [u8],
    /// Read access to the instance's storage.
    pub storage: StorageReader<'a>,
}

impl<'a> ModuleCall<'a> {
    pub fn execution_id(&self) -> ExecutionId {
        self.storage.execution_id()
    }

    /// Decoder over the argument words.
    pub fn args(&self) -> ArgReader<'a> {
        ArgReader::new(self.args)
    }
}

/// Stateless computation unit bound to one or more selectors.
///
/// A module reads storage through [`ModuleCall::storage`] and returns the
/// effects it wants applied, or an application exception. It has no handle on
/// the engine and cannot write.
pub trait LogicModule: Send + Sync {
    /// Module name used in logs.
    fn name(&self) -> &'static str;

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult;
}

/// Implementation address paired with the module it names.
#[derive(Clone)]
pub struct Binding {
    address: Address,
    module: Arc<dyn LogicModule>,
}

impl Binding {
    pub fn new(address: Address, module: Arc<dyn LogicModule>) -> Self {
        Self { address, module }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn module(&self) -> &Arc<dyn LogicModule> {
        &self.module
    }

    pub(crate) fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        self.module.execute(call)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("address", &self.address)
            .field("module", &self.module.name())
            .finish()
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Binding {}
