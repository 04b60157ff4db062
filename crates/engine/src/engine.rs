//! The execution engine.
//!
//! The engine owns the store, the registries and every execution context. It
//! is the only component that writes storage: modules compute an
//! [`EffectSet`] against a read-only view and the engine validates and
//! applies it in one batch.

use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use rexec_config::{EngineSettings, VersionPolicy};
use rexec_primitives::{Address, ExecutionId, Selector, Word, SELECTOR_SIZE};
use rexec_store::{MemoryStore, ReadStore, Store, WriteBatch};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::context::{ContextSlot, ExecutionContext};
use crate::effects::{EffectSet, Event, ExecCounts, Payment};
use crate::error::{EngineError, EngineResult};
use crate::module::{Binding, ModuleCall};
use crate::notification::Notification;
use crate::reader::StorageReader;
use crate::registry::ApplicationRegistry;

/// Validated effects ready to apply.
struct CommitPlan {
    batch: WriteBatch,
    writes: Vec<(Word, Word)>,
    payments: Vec<Payment>,
    events: Vec<Event>,
}

/// Registry host and dispatcher.
pub struct ExecutionEngine<S: Store = MemoryStore> {
    store: S,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    registries: IndexMap<ExecutionId, ApplicationRegistry>,
    contexts: HashMap<ExecutionId, ExecutionContext>,
    nonce: u64,
    notifications: Vec<Notification>,
    delivered: HashMap<Address, u128>,
}

impl ExecutionEngine<MemoryStore> {
    /// In-memory engine with default settings and the system clock.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), EngineSettings::default())
    }
}

impl<S: Store> ExecutionEngine<S> {
    pub fn new(store: S, settings: EngineSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            settings,
            clock,
            registries: IndexMap::new(),
            contexts: HashMap::new(),
            nonce: 0,
            notifications: Vec::new(),
            delivered: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Creates an empty registry owned by `provider`.
    pub fn open_registry(&mut self, provider: Address) -> EngineResult<ExecutionId> {
        if provider.is_zero() {
            return Err(EngineError::InvalidAdmin);
        }
        let id = self.fresh_id(&[b"registry".as_slice(), provider.as_bytes()]);

        let mut batch = WriteBatch::new(id);
        batch.put(ContextSlot::Admin.key(), Word::from(provider));
        batch.put(ContextSlot::CreatedAt.key(), Word::from(self.clock.now()));
        self.store.write_batch(batch)?;

        self.nonce += 1;
        self.registries.insert(id, ApplicationRegistry::new(id, provider));
        info!(registry = %id, %provider, "opened registry");
        Ok(id)
    }

    pub fn registry(&self, registry_id: ExecutionId) -> Option<&ApplicationRegistry> {
        self.registries.get(&registry_id)
    }

    /// Registers an application in `registry_id`. Version 1 is final and current.
    pub fn register_application(
        &mut self,
        sender: Address,
        registry_id: ExecutionId,
        name: &str,
        init: Binding,
        selectors: &[Selector],
        implementations: &[Binding],
    ) -> EngineResult<()> {
        let registry = self
            .registries
            .get_mut(&registry_id)
            .ok_or(EngineError::UnknownRegistry(registry_id))?;
        registry.register_application(&self.store, sender, name, init, selectors, implementations)
    }

    /// Appends a pending version. It is not resolved against until finalized.
    pub fn register_app_version(
        &mut self,
        sender: Address,
        registry_id: ExecutionId,
        name: &str,
        init: Binding,
        selectors: &[Selector],
        implementations: &[Binding],
    ) -> EngineResult<u32> {
        let registry = self
            .registries
            .get_mut(&registry_id)
            .ok_or(EngineError::UnknownRegistry(registry_id))?;
        registry.register_app_version(&self.store, sender, name, init, selectors, implementations)
    }

    /// Finalizes `version`, making it current. Emits `ApplicationFinalization`.
    pub fn finalize_app_version(
        &mut self,
        sender: Address,
        registry_id: ExecutionId,
        name: &str,
        version: u32,
    ) -> EngineResult<()> {
        let registry = self
            .registries
            .get_mut(&registry_id)
            .ok_or(EngineError::UnknownRegistry(registry_id))?;
        let init = registry.finalize_app_version(&self.store, sender, name, version)?;
        self.notifications.push(Notification::ApplicationFinalization {
            execution_id: registry_id,
            implementation: init,
        });
        Ok(())
    }

    /// Current implementation of `selector`, or the zero address.
    pub fn resolve_implementation(
        &self,
        registry_id: ExecutionId,
        name: &str,
        selector: Selector,
    ) -> Address {
        self.registries
            .get(&registry_id)
            .map_or_else(Address::zero, |registry| {
                registry.resolve_implementation(name, selector)
            })
    }

    /// Instantiates `name` from `registry_id` by running its init module.
    ///
    /// `init_calldata` starts with a selector that the init module may
    /// inspect. An application exception from the init module aborts the call
    /// with [`EngineError::InvalidInitCalldata`] and leaves no trace.
    pub fn create_instance(
        &mut self,
        sender: Address,
        name: &str,
        admin: Address,
        registry_id: ExecutionId,
        init_calldata: &[u8],
    ) -> EngineResult<ExecutionId> {
        if admin.is_zero() {
            return Err(EngineError::InvalidAdmin);
        }
        let registry = self
            .registries
            .get(&registry_id)
            .ok_or(EngineError::UnknownRegistry(registry_id))?;
        let application = registry
            .application(name)
            .ok_or_else(|| EngineError::InvalidApplication(name.to_owned()))?;
        let version = application.current_version();
        let init = application.current().init().clone();
        let selector = Selector::from_calldata(init_calldata).map_err(|_| {
            EngineError::MalformedCalldata {
                len: init_calldata.len(),
            }
        })?;

        let execution_id = self.fresh_id(&[
            sender.as_bytes().as_slice(),
            registry_id.as_word().as_bytes(),
            name.as_bytes(),
        ]);
        let timestamp = self.clock.now();
        let call = ModuleCall {
            sender,
            value: 0,
            timestamp,
            selector,
            args: &init_calldata[SELECTOR_SIZE..],
            storage: StorageReader::new(&self.store, execution_id),
        };

        let effects = match init.execute(&call) {
            Ok(effects) => effects,
            Err(exception) => {
                let reason = exception.truncated_reason(self.settings.max_reason_length);
                warn!(application = name, %reason, "init module rejected calldata");
                return Err(EngineError::InvalidInitCalldata(reason));
            }
        };

        let mut plan = self.plan_commit(execution_id, init.address(), effects, 0)?;
        plan.batch.put(ContextSlot::Admin.key(), Word::from(admin));
        plan.batch.put(ContextSlot::CreatedAt.key(), Word::from(timestamp));
        self.store.write_batch(plan.batch)?;
        self.nonce += 1;

        let mut context = ExecutionContext {
            execution_id,
            registry_id,
            application: name.to_owned(),
            version,
            pinned_version: version,
            admin,
            initialized: false,
            finalized: false,
            created_at: timestamp,
        };
        for (key, value) in &plan.writes {
            context.observe_write(*key, *value);
        }
        self.contexts.insert(execution_id, context);

        self.deliver(execution_id, &plan.payments);
        self.notifications
            .extend(plan.events.into_iter().map(|event| Notification::Module {
                execution_id,
                event,
            }));
        self.notifications.push(Notification::ApplicationInitialized {
            execution_id,
            implementation: init.address(),
            admin,
            registry_id,
        });

        info!(exec_id = %execution_id, application = name, version, %admin, "created instance");
        Ok(execution_id)
    }

    /// Dispatches `calldata` with no value attached.
    pub fn exec(
        &mut self,
        sender: Address,
        execution_id: ExecutionId,
        calldata: &[u8],
    ) -> EngineResult<ExecCounts> {
        self.exec_payable(sender, execution_id, calldata, 0)
    }

    /// Dispatches `calldata` to the implementation bound to its selector.
    ///
    /// An application exception is an `Ok` with zero counts and an
    /// `ApplicationException` notification. Every `Err` leaves state untouched.
    ///
    /// The binding is resolved and committed under the same `&mut self`
    /// borrow, so the committing implementation is always the one bound to
    /// the selector. Writes are confined to `execution_id` and may not touch
    /// engine-owned slots (`UnauthorizedWrite`).
    pub fn exec_payable(
        &mut self,
        sender: Address,
        execution_id: ExecutionId,
        calldata: &[u8],
        value: u128,
    ) -> EngineResult<ExecCounts> {
        let context = self
            .contexts
            .get(&execution_id)
            .ok_or(EngineError::UnknownExecutionId(execution_id))?;
        let selector = Selector::from_calldata(calldata).map_err(|_| {
            EngineError::MalformedCalldata {
                len: calldata.len(),
            }
        })?;
        let pinned = match self.settings.version_policy {
            VersionPolicy::Latest => None,
            VersionPolicy::Pinned => Some(context.pinned_version),
        };
        let registry = self
            .registries
            .get(&context.registry_id)
            .ok_or(EngineError::UnknownRegistry(context.registry_id))?;
        let binding = registry
            .resolve(&context.application, pinned, selector)?
            .clone();
        let implementation = binding.address();

        debug!(
            exec_id = %execution_id,
            %selector,
            %implementation,
            module = binding.module().name(),
            "dispatching"
        );
        let call = ModuleCall {
            sender,
            value,
            timestamp: self.clock.now(),
            selector,
            args: &calldata[SELECTOR_SIZE..],
            storage: StorageReader::new(&self.store, execution_id),
        };

        let effects = match binding.execute(&call) {
            Ok(effects) => effects,
            Err(exception) => {
                let reason = exception.truncated_reason(self.settings.max_reason_length);
                info!(exec_id = %execution_id, %implementation, %reason, "application exception");
                self.notifications.push(Notification::ApplicationException {
                    execution_id,
                    implementation,
                    reason,
                });
                return Ok(ExecCounts::default());
            }
        };

        let plan = self.plan_commit(execution_id, implementation, effects, value)?;
        let counts = ExecCounts {
            events: plan.events.len(),
            payments: plan.payments.len(),
            writes: plan.writes.len(),
        };

        self.store.write_batch(plan.batch)?;
        if let Some(context) = self.contexts.get_mut(&execution_id) {
            for (key, value) in &plan.writes {
                context.observe_write(*key, *value);
            }
        }
        self.deliver(execution_id, &plan.payments);
        self.notifications
            .extend(plan.events.into_iter().map(|event| Notification::Module {
                execution_id,
                event,
            }));
        self.notifications.push(Notification::ApplicationExecution {
            execution_id,
            implementation,
        });

        debug!(
            exec_id = %execution_id,
            events = counts.events,
            payments = counts.payments,
            writes = counts.writes,
            "committed"
        );
        Ok(counts)
    }

    /// Hands the admin role of `execution_id` to `new_admin`.
    pub fn transfer_admin(
        &mut self,
        sender: Address,
        execution_id: ExecutionId,
        new_admin: Address,
    ) -> EngineResult<()> {
        self.ensure_admin(sender, execution_id)?;
        if new_admin.is_zero() {
            return Err(EngineError::InvalidAdmin);
        }
        let mut batch = WriteBatch::new(execution_id);
        batch.put(ContextSlot::Admin.key(), Word::from(new_admin));
        self.store.write_batch(batch)?;

        if let Some(context) = self.contexts.get_mut(&execution_id) {
            context.admin = new_admin;
        }
        info!(exec_id = %execution_id, from = %sender, to = %new_admin, "transferred admin");
        Ok(())
    }

    /// Re-pins `execution_id` to its application's current version.
    pub fn upgrade_instance(
        &mut self,
        sender: Address,
        execution_id: ExecutionId,
    ) -> EngineResult<u32> {
        let context = self.ensure_admin(sender, execution_id)?;
        let (registry_id, name) = (context.registry_id, context.application.clone());
        let current = self
            .registries
            .get(&registry_id)
            .and_then(|registry| registry.application(&name))
            .map(|application| application.current_version())
            .ok_or_else(|| EngineError::InvalidApplication(name.clone()))?;

        if let Some(context) = self.contexts.get_mut(&execution_id) {
            context.pinned_version = current;
        }
        info!(exec_id = %execution_id, version = current, "upgraded instance");
        Ok(current)
    }

    pub fn context(&self, execution_id: ExecutionId) -> Option<&ExecutionContext> {
        self.contexts.get(&execution_id)
    }

    /// Read-only view of an instance or registry partition.
    pub fn reader(&self, execution_id: ExecutionId) -> EngineResult<StorageReader<'_>> {
        if !self.contexts.contains_key(&execution_id) && !self.registries.contains_key(&execution_id)
        {
            return Err(EngineError::UnknownExecutionId(execution_id));
        }
        Ok(StorageReader::new(&self.store, execution_id))
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drains the notification log.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Total value delivered to `destination` so far.
    pub fn delivered(&self, destination: Address) -> u128 {
        self.delivered.get(&destination).copied().unwrap_or(0)
    }

    fn ensure_admin(
        &self,
        sender: Address,
        execution_id: ExecutionId,
    ) -> EngineResult<&ExecutionContext> {
        let context = self
            .contexts
            .get(&execution_id)
            .ok_or(EngineError::UnknownExecutionId(execution_id))?;
        if context.admin != sender {
            return Err(EngineError::NotAdmin {
                sender,
                execution_id,
            });
        }
        Ok(context)
    }

    /// Checks limits, payments and reserved slots before anything is applied.
    fn plan_commit(
        &self,
        execution_id: ExecutionId,
        implementation: Address,
        effects: EffectSet,
        value: u128,
    ) -> EngineResult<CommitPlan> {
        let settings = &self.settings;
        if effects.storage_writes().len() > settings.max_storage_writes {
            return Err(EngineError::limit(
                "storage writes",
                effects.storage_writes().len(),
                settings.max_storage_writes,
            ));
        }
        if effects.events().len() > settings.max_events {
            return Err(EngineError::limit(
                "events",
                effects.events().len(),
                settings.max_events,
            ));
        }
        if effects.payments().len() > settings.max_payments {
            return Err(EngineError::limit(
                "payments",
                effects.payments().len(),
                settings.max_payments,
            ));
        }

        let mut required: u128 = 0;
        for payment in effects.payments() {
            if payment.destination.is_zero() {
                return Err(EngineError::InvalidPayment(payment.destination));
            }
            required = required
                .checked_add(payment.amount)
                .ok_or(EngineError::InvalidPayment(payment.destination))?;
        }
        if required > value {
            return Err(EngineError::InsufficientValue {
                required,
                attached: value,
            });
        }

        // Later writes to the same key win; the slot keeps its first position.
        let mut collapsed: IndexMap<Word, Word> = IndexMap::new();
        for write in effects.storage_writes() {
            collapsed.insert(write.key, write.value);
        }

        let mut batch = WriteBatch::with_capacity(execution_id, collapsed.len() + 2);
        for (key, word) in &collapsed {
            if let Some(slot) = ContextSlot::from_key(*key) {
                if slot.engine_owned() {
                    return Err(EngineError::UnauthorizedWrite {
                        implementation,
                        key: *key,
                    });
                }
                let current = self.store.get_slot(execution_id, *key);
                if current.as_bool() && word.is_zero() {
                    return Err(EngineError::LifecycleRegression { slot: slot.label() });
                }
            }
            batch.put(*key, *word);
        }

        let (events, _, payments) = effects.into_parts();
        Ok(CommitPlan {
            batch,
            writes: collapsed.into_iter().collect(),
            payments,
            events,
        })
    }

    fn deliver(&mut self, execution_id: ExecutionId, payments: &[Payment]) {
        for payment in payments {
            let total = self.delivered.entry(payment.destination).or_insert(0);
            *total = total.saturating_add(payment.amount);
            self.notifications.push(Notification::DeliveredPayment {
                execution_id,
                destination: payment.destination,
                amount: payment.amount,
            });
        }
    }

    /// Derives an id from `parts` and the nonce, skipping ids already in use.
    fn fresh_id(&self, parts: &[&[u8]]) -> ExecutionId {
        let mut salt = self.nonce;
        loop {
            let salt_bytes = salt.to_be_bytes();
            let mut all: Vec<&[u8]> = parts.to_vec();
            all.push(&salt_bytes);
            let id = ExecutionId::derive(&all);
            if !self.contexts.contains_key(&id) && !self.registries.contains_key(&id) {
                return id;
            }
            salt = salt.wrapping_add(1);
        }
    }
}

impl<S: Store> std::fmt::Debug for ExecutionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("settings", &self.settings)
            .field("registries", &self.registries.len())
            .field("contexts", &self.contexts.len())
            .field("nonce", &self.nonce)
            .finish()
    }
}
