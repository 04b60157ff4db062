//! Application registry.
//!
//! A registry is an execution id owned by a provider address. It maps
//! application names to an append-only list of versions; each version binds an
//! init module plus an ordered selector table. Tables are resolved to trait
//! objects at registration, so dispatch is a map lookup.
//!
//! The in-memory tables are mirrored into the registry's own storage partition
//! so the registry can be inspected through the same key/value interface as
//! any instance.

use indexmap::IndexMap;
use rexec_primitives::{Address, ExecutionId, Selector, Word};
use rexec_store::{Store, WriteBatch};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::keys::KeyBuilder;
use crate::module::Binding;

/// One published selector table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppVersion {
    number: u32,
    init: Binding,
    bindings: IndexMap<Selector, Binding>,
    finalized: bool,
}

impl AppVersion {
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Instantiation entrypoint.
    pub fn init(&self) -> &Binding {
        &self.init
    }

    /// Selectors in registration order.
    pub fn selectors(&self) -> impl Iterator<Item = Selector> + '_ {
        self.bindings.keys().copied()
    }

    pub fn binding(&self, selector: Selector) -> Option<&Binding> {
        self.bindings.get(&selector)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

/// Named application with its version history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    name: String,
    versions: Vec<AppVersion>,
    current: u32,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of the version new dispatches resolve against.
    pub fn current_version(&self) -> u32 {
        self.current
    }

    pub fn current(&self) -> &AppVersion {
        &self.versions[(self.current - 1) as usize]
    }

    /// Versions are numbered from 1.
    pub fn version(&self, number: u32) -> Option<&AppVersion> {
        number
            .checked_sub(1)
            .and_then(|index| self.versions.get(index as usize))
    }

    pub fn versions(&self) -> &[AppVersion] {
        &self.versions
    }
}

/// Applications published by one provider.
#[derive(Debug, Clone)]
pub struct ApplicationRegistry {
    id: ExecutionId,
    provider: Address,
    applications: IndexMap<String, Application>,
}

impl ApplicationRegistry {
    pub(crate) fn new(id: ExecutionId, provider: Address) -> Self {
        Self {
            id,
            provider,
            applications: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn provider(&self) -> Address {
        self.provider
    }

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.applications.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    /// Registers `name` with version 1, already final and current.
    pub(crate) fn register_application(
        &mut self,
        store: &dyn Store,
        sender: Address,
        name: &str,
        init: Binding,
        selectors: &[Selector],
        implementations: &[Binding],
    ) -> EngineResult<()> {
        self.ensure_provider(sender)?;
        if self.applications.contains_key(name) {
            return Err(EngineError::DuplicateName(name.to_owned()));
        }
        let version = build_version(1, init, selectors, implementations, true)?;

        let mut batch = WriteBatch::new(self.id);
        mirror_version(&mut batch, name, &version);
        mirror_current(&mut batch, name, 1, 1);
        store.write_batch(batch)?;

        info!(
            registry = %self.id,
            application = name,
            selectors = version.len(),
            "registered application"
        );
        self.applications.insert(
            name.to_owned(),
            Application {
                name: name.to_owned(),
                versions: vec![version],
                current: 1,
            },
        );
        Ok(())
    }

    /// Appends a pending version. Returns its number.
    pub(crate) fn register_app_version(
        &mut self,
        store: &dyn Store,
        sender: Address,
        name: &str,
        init: Binding,
        selectors: &[Selector],
        implementations: &[Binding],
    ) -> EngineResult<u32> {
        self.ensure_provider(sender)?;
        let application = self
            .applications
            .get(name)
            .ok_or_else(|| EngineError::InvalidApplication(name.to_owned()))?;
        let number = application.versions.len() as u32 + 1;
        let version = build_version(number, init, selectors, implementations, false)?;

        let mut batch = WriteBatch::new(self.id);
        mirror_version(&mut batch, name, &version);
        mirror_current(&mut batch, name, application.current, number);
        store.write_batch(batch)?;

        debug!(registry = %self.id, application = name, version = number, "registered pending version");
        if let Some(application) = self.applications.get_mut(name) {
            application.versions.push(version);
        }
        Ok(number)
    }

    /// Marks a pending version final and current. Returns its init address.
    pub(crate) fn finalize_app_version(
        &mut self,
        store: &dyn Store,
        sender: Address,
        name: &str,
        number: u32,
    ) -> EngineResult<Address> {
        self.ensure_provider(sender)?;
        let application = self
            .applications
            .get(name)
            .ok_or_else(|| EngineError::InvalidApplication(name.to_owned()))?;
        let version = application
            .version(number)
            .ok_or_else(|| EngineError::unknown_version(name, number))?;
        if version.finalized {
            return Err(EngineError::VersionAlreadyFinalized {
                application: name.to_owned(),
                version: number,
            });
        }
        let init = version.init.address();
        let current = application.current.max(number);

        let mut batch = WriteBatch::new(self.id);
        batch.put(version_key(name, number).label("finalized").build(), Word::ONE);
        mirror_current(&mut batch, name, current, application.versions.len() as u32);
        store.write_batch(batch)?;

        info!(registry = %self.id, application = name, version = number, "finalized version");
        if let Some(application) = self.applications.get_mut(name) {
            application.current = current;
            application.versions[(number - 1) as usize].finalized = true;
        }
        Ok(init)
    }

    /// Implementation bound to `selector` in the current version, or the zero
    /// address when the application or selector is unknown.
    pub fn resolve_implementation(&self, name: &str, selector: Selector) -> Address {
        self.applications
            .get(name)
            .and_then(|application| application.current().binding(selector))
            .map_or_else(Address::zero, Binding::address)
    }

    /// Binding for `selector` in `version`, or in the current version.
    pub fn resolve(
        &self,
        name: &str,
        version: Option<u32>,
        selector: Selector,
    ) -> EngineResult<&Binding> {
        let application = self
            .applications
            .get(name)
            .ok_or_else(|| EngineError::InvalidApplication(name.to_owned()))?;
        let table = match version {
            Some(number) => application
                .version(number)
                .filter(|version| version.finalized)
                .ok_or_else(|| EngineError::unknown_version(name, number))?,
            None => application.current(),
        };
        table
            .binding(selector)
            .filter(|binding| !binding.address().is_zero())
            .ok_or_else(|| EngineError::unknown_selector(name, selector))
    }

    fn ensure_provider(&self, sender: Address) -> EngineResult<()> {
        if sender != self.provider {
            return Err(EngineError::NotRegistryProvider {
                sender,
                registry: self.id,
            });
        }
        Ok(())
    }
}

/// Storage key prefix of one application's metadata.
pub fn application_key(name: &str) -> KeyBuilder {
    KeyBuilder::new("rexec.registry.application").label(name)
}

fn version_key(name: &str, number: u32) -> KeyBuilder {
    application_key(name).label("version").index(u64::from(number))
}

fn mirror_current(batch: &mut WriteBatch, name: &str, current: u32, count: u32) {
    let base = application_key(name);
    batch.put(base.label("current").build(), Word::from(u64::from(current)));
    batch.put(base.label("versions").build(), Word::from(u64::from(count)));
}

fn mirror_version(batch: &mut WriteBatch, name: &str, version: &AppVersion) {
    let base = version_key(name, version.number);
    batch.put(base.label("init").build(), Word::from(version.init.address()));
    batch.put(base.label("selectors").build(), Word::from(version.len() as u64));
    for (index, (selector, binding)) in version.bindings.iter().enumerate() {
        batch.put(
            base.label("selectors").index(index as u64).build(),
            selector_word(*selector),
        );
        batch.put(
            base.label("implementations").word(selector_word(*selector)).build(),
            Word::from(binding.address()),
        );
    }
    batch.put(base.label("finalized").build(), Word::from(version.finalized));
}

fn selector_word(selector: Selector) -> Word {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(selector.as_bytes());
    Word::from_array(bytes)
}

fn build_version(
    number: u32,
    init: Binding,
    selectors: &[Selector],
    implementations: &[Binding],
    finalized: bool,
) -> EngineResult<AppVersion> {
    if selectors.is_empty() || implementations.is_empty() {
        return Err(EngineError::EmptyArray);
    }
    if selectors.len() != implementations.len() {
        return Err(EngineError::ArrayLenMismatch {
            selectors: selectors.len(),
            implementations: implementations.len(),
        });
    }
    if init.address().is_zero() {
        return Err(EngineError::InvalidImplementation(Selector::default()));
    }

    let mut bindings = IndexMap::with_capacity(selectors.len());
    for (selector, binding) in selectors.iter().zip(implementations) {
        if binding.address().is_zero() {
            return Err(EngineError::InvalidImplementation(*selector));
        }
        if bindings.insert(*selector, binding.clone()).is_some() {
            return Err(EngineError::DuplicateSelector(*selector));
        }
    }
    Ok(AppVersion {
        number,
        init,
        bindings,
        finalized,
    })
}
