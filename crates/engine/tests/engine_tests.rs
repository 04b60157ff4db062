//! End-to-end behaviour of the execution engine with a small counter
//! application.

use std::sync::Arc;

use proptest::prelude::*;
use rexec_config::{EngineSettings, VersionPolicy};
use rexec_engine::prelude::*;
use rexec_engine::{
    ContextSlot, EngineError, ExecCounts, ExecutionEngine, Lifecycle, ManualClock, Notification,
};
use rexec_store::{MemoryStore, ReadStore};

const START_TIME: u64 = 1_700_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sel(signature: &str) -> Selector {
    Selector::from_signature(signature)
}

fn count_key() -> Word {
    KeyBuilder::new("counter.count").build()
}

const COUNTER_SIGNATURES: [&str; 9] = [
    "increment()",
    "noop()",
    "fail()",
    "longFail()",
    "hijack()",
    "initialize()",
    "reset()",
    "finalize()",
    "pay(address,uint256)",
];

struct CounterInit;

impl LogicModule for CounterInit {
    fn name(&self) -> &'static str {
        "counter-init"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        let mut args = call.args();
        let start = args.uint()?;
        args.finish()?;
        ensure(start <= 1_000, reasons::IMPROPER_INITIALIZATION)?;

        let mut effects = EffectSet::new();
        effects
            .set(count_key(), start)
            .emit(Event::named("CounterCreated(uint256)", vec![Word::from(start)], vec![]));
        Ok(effects)
    }
}

struct Counter {
    step: u128,
}

impl LogicModule for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn execute(&self, call: &ModuleCall<'_>) -> ModuleResult {
        let count = call.storage.read_u128(count_key())?;
        let mut effects = EffectSet::new();
        let selector = call.selector;

        if selector == sel("increment()") {
            effects
                .set(count_key(), count + self.step)
                .emit(Event::named("Incremented(uint256)", vec![], Word::from(count + self.step).as_bytes().to_vec()));
        } else if selector == sel("noop()") {
            effects
                .set(count_key(), count)
                .emit(Event::named("Touched()", vec![], vec![]));
        } else if selector == sel("fail()") {
            return Err(ApplicationException::new(reasons::INVALID_AMT));
        } else if selector == sel("longFail()") {
            return Err(ApplicationException::new(
                "ThisReasonIsDefinitelyLongerThanThirtyTwoBytes",
            ));
        } else if selector == sel("hijack()") {
            effects
                .set(count_key(), count + 1)
                .set(ContextSlot::Admin.key(), call.sender);
        } else if selector == sel("initialize()") {
            ensure(call.storage.is_admin(call.sender), reasons::NOT_ADMIN_OR_SALE_IS_INIT)?;
            effects.set(ContextSlot::Initialized.key(), true);
        } else if selector == sel("reset()") {
            effects
                .set(ContextSlot::Initialized.key(), false)
                .set(count_key(), 0u64);
        } else if selector == sel("finalize()") {
            effects.set(ContextSlot::Finalized.key(), true);
        } else if selector == sel("pay(address,uint256)") {
            let mut args = call.args();
            let destination = args.address()?;
            let amount = args.uint()?;
            args.finish()?;
            effects
                .pay(destination, amount)
                .emit(Event::named("Paid(address,uint256)", vec![Word::from(destination)], vec![]));
        } else {
            return Err(ApplicationException::new(reasons::UNKNOWN_FUNCTION));
        }
        Ok(effects)
    }
}

fn provider() -> Address {
    Address::from_low_u64(0xfeed)
}

fn admin() -> Address {
    Address::from_low_u64(0xad)
}

fn user() -> Address {
    Address::from_low_u64(0x05e5)
}

fn counter_binding(address: u64, step: u128) -> Binding {
    Binding::new(Address::from_low_u64(address), Arc::new(Counter { step }))
}

fn init_binding() -> Binding {
    Binding::new(Address::from_low_u64(0x1417), Arc::new(CounterInit))
}

fn register_counter(
    engine: &mut ExecutionEngine,
    registry: ExecutionId,
    implementation: Binding,
) -> Result<(), EngineError> {
    let selectors: Vec<Selector> = COUNTER_SIGNATURES.iter().map(|s| sel(s)).collect();
    let implementations = vec![implementation; selectors.len()];
    engine.register_application(
        provider(),
        registry,
        "Counter",
        init_binding(),
        &selectors,
        &implementations,
    )
}

fn engine_with(settings: EngineSettings) -> (ExecutionEngine, ExecutionId) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(START_TIME));
    let mut engine = ExecutionEngine::with_clock(MemoryStore::new(), settings, clock);
    let registry = engine.open_registry(provider()).unwrap();
    register_counter(&mut engine, registry, counter_binding(0x100, 1)).unwrap();
    (engine, registry)
}

fn init_calldata(start: u128) -> Vec<u8> {
    CalldataBuilder::signature("init(uint256)").uint(start).build()
}

fn call(signature: &str) -> Vec<u8> {
    CalldataBuilder::signature(signature).build()
}

fn instance(engine: &mut ExecutionEngine, registry: ExecutionId, start: u128) -> ExecutionId {
    engine
        .create_instance(user(), "Counter", admin(), registry, &init_calldata(start))
        .unwrap()
}

#[test]
fn test_create_instance_commits_init_effects() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    engine.take_notifications();
    let id = instance(&mut engine, registry, 7);

    let reader = engine.reader(id).unwrap();
    assert_eq!(reader.read_u128(count_key()).unwrap(), 7);
    assert_eq!(reader.admin(), admin());
    assert_eq!(reader.created_at(), START_TIME);
    assert!(!reader.is_initialized());

    let context = engine.context(id).unwrap();
    assert_eq!(context.application(), "Counter");
    assert_eq!(context.registry_id(), registry);
    assert_eq!(context.version(), 1);
    assert_eq!(context.lifecycle(), Lifecycle::Created);

    let notifications = engine.take_notifications();
    assert_eq!(notifications.len(), 2);
    assert!(matches!(notifications[0], Notification::Module { execution_id, .. } if execution_id == id));
    assert_eq!(
        notifications[1],
        Notification::ApplicationInitialized {
            execution_id: id,
            implementation: init_binding().address(),
            admin: admin(),
            registry_id: registry,
        }
    );
}

#[test]
fn test_instances_get_distinct_ids() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let a = instance(&mut engine, registry, 1);
    let b = instance(&mut engine, registry, 1);
    assert_ne!(a, b);
    assert_ne!(a, registry);
}

#[test]
fn test_create_instance_failures_leave_no_trace() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let before = engine.store().snapshot();
    engine.take_notifications();

    let err = engine
        .create_instance(user(), "Missing", admin(), registry, &init_calldata(1))
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidApplication("Missing".into()));

    let err = engine
        .create_instance(user(), "Counter", admin(), registry, &init_calldata(5_000))
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidInitCalldata("ImproperInitialization".into()));

    let err = engine
        .create_instance(user(), "Counter", Address::zero(), registry, &init_calldata(1))
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidAdmin);

    let unknown = ExecutionId::derive(&[b"nowhere"]);
    let err = engine
        .create_instance(user(), "Counter", admin(), unknown, &init_calldata(1))
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownRegistry(unknown));

    assert_eq!(engine.store().snapshot(), before);
    assert!(engine.notifications().is_empty());

    // The failed attempts consumed no nonce: ids match a fresh engine's.
    let (mut fresh, fresh_registry) = engine_with(EngineSettings::default());
    assert_eq!(fresh_registry, registry);
    assert_eq!(
        instance(&mut engine, registry, 1),
        instance(&mut fresh, fresh_registry, 1)
    );
}

#[test]
fn test_dispatch_errors() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 0);

    let missing = ExecutionId::derive(&[b"missing"]);
    assert_eq!(
        engine.exec(user(), missing, &call("increment()")),
        Err(EngineError::UnknownExecutionId(missing))
    );
    assert_eq!(
        engine.exec(user(), id, &[0xaa, 0xbb]),
        Err(EngineError::MalformedCalldata { len: 2 })
    );
    assert_eq!(
        engine.exec(user(), id, &call("decrement()")),
        Err(EngineError::unknown_selector("Counter", sel("decrement()")))
    );
    assert_eq!(
        engine.resolve_implementation(registry, "Counter", sel("decrement()")),
        Address::zero()
    );
}

#[test]
fn test_idempotent_dispatch() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 3);

    let first = engine.exec(user(), id, &call("noop()")).unwrap();
    let second = engine.exec(user(), id, &call("noop()")).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        ExecCounts {
            events: 1,
            payments: 0,
            writes: 1
        }
    );
}

#[test]
fn test_unauthorized_write_is_atomic() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 3);
    let before = engine.store().snapshot();
    engine.take_notifications();

    let err = engine.exec(user(), id, &call("hijack()")).unwrap_err();
    assert_eq!(
        err,
        EngineError::UnauthorizedWrite {
            implementation: Address::from_low_u64(0x100),
            key: ContextSlot::Admin.key(),
        }
    );

    // Neither the counter write nor the admin write landed.
    assert_eq!(engine.store().snapshot(), before);
    assert_eq!(engine.reader(id).unwrap().read_u128(count_key()).unwrap(), 3);
    assert!(engine.notifications().is_empty());
}

#[test]
fn test_exception_suppresses_effects() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 3);
    let before = engine.store().snapshot();
    engine.take_notifications();

    let counts = engine.exec_payable(user(), id, &call("fail()"), 50).unwrap();
    assert!(counts.is_zero());
    assert_eq!(engine.store().snapshot(), before);
    assert_eq!(engine.delivered(user()), 0);

    let notifications = engine.take_notifications();
    assert_eq!(
        notifications,
        vec![Notification::ApplicationException {
            execution_id: id,
            implementation: Address::from_low_u64(0x100),
            reason: "InvalidAmt".into(),
        }]
    );
}

#[test]
fn test_exception_reason_is_truncated() {
    let settings = EngineSettings {
        max_reason_length: 8,
        ..EngineSettings::default()
    };
    let (mut engine, registry) = engine_with(settings);
    let id = instance(&mut engine, registry, 0);
    engine.take_notifications();

    engine.exec(user(), id, &call("longFail()")).unwrap();
    let notifications = engine.take_notifications();
    assert_eq!(notifications[0].exception_reason(), Some("ThisReas"));

    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 0);
    engine.take_notifications();
    engine.exec(user(), id, &call("longFail()")).unwrap();
    let reason = engine.take_notifications()[0]
        .exception_reason()
        .map(str::len);
    assert_eq!(reason, Some(32));
}

#[test]
fn test_lifecycle_flags_are_monotonic() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 3);

    // Module-enforced guard: only the admin may initialize.
    let counts = engine.exec(user(), id, &call("initialize()")).unwrap();
    assert!(counts.is_zero());
    assert!(!engine.context(id).unwrap().is_initialized());

    engine.exec(admin(), id, &call("initialize()")).unwrap();
    assert!(engine.context(id).unwrap().is_initialized());

    let before = engine.store().snapshot();
    let err = engine.exec(admin(), id, &call("reset()")).unwrap_err();
    assert_eq!(
        err,
        EngineError::LifecycleRegression {
            slot: ContextSlot::Initialized.label()
        }
    );
    assert_eq!(engine.store().snapshot(), before);
    assert!(engine.reader(id).unwrap().is_initialized());

    engine.exec(admin(), id, &call("finalize()")).unwrap();
    let context = engine.context(id).unwrap();
    assert_eq!(context.lifecycle(), Lifecycle::Finalized);
    assert!(context.is_initialized());
}

#[test]
fn test_payments_and_notification_order() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 0);
    let wallet = Address::from_low_u64(0x3a11e7);
    let pay = CalldataBuilder::signature("pay(address,uint256)")
        .address(wallet)
        .uint(40)
        .build();
    engine.take_notifications();

    let err = engine.exec_payable(user(), id, &pay, 39).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientValue {
            required: 40,
            attached: 39
        }
    );

    let counts = engine.exec_payable(user(), id, &pay, 40).unwrap();
    assert_eq!(
        counts,
        ExecCounts {
            events: 1,
            payments: 1,
            writes: 0
        }
    );
    engine.exec_payable(user(), id, &pay, 100).unwrap();
    assert_eq!(engine.delivered(wallet), 80);

    let names: Vec<&str> = engine.notifications().iter().map(Notification::name).collect();
    assert_eq!(
        names,
        vec![
            "DeliveredPayment",
            "Module",
            "ApplicationExecution",
            "DeliveredPayment",
            "Module",
            "ApplicationExecution"
        ]
    );
    assert!(engine.notifications().iter().all(|n| n.execution_id() == id));

    let to_nobody = CalldataBuilder::signature("pay(address,uint256)")
        .address(Address::zero())
        .uint(1)
        .build();
    assert_eq!(
        engine.exec_payable(user(), id, &to_nobody, 1),
        Err(EngineError::InvalidPayment(Address::zero()))
    );
}

#[test]
fn test_effect_limits() {
    let settings = EngineSettings {
        max_storage_writes: 1,
        ..EngineSettings::default()
    };
    let (mut engine, registry) = engine_with(settings);
    let id = instance(&mut engine, registry, 0);

    engine.exec(user(), id, &call("increment()")).unwrap();
    engine.exec(admin(), id, &call("initialize()")).unwrap();
    let err = engine.exec(admin(), id, &call("reset()")).unwrap_err();
    assert_eq!(err, EngineError::limit("storage writes", 2, 1));
}

#[test]
fn test_late_binding_follows_current_version() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 0);

    let selectors: Vec<Selector> = COUNTER_SIGNATURES.iter().map(|s| sel(s)).collect();
    let v2 = vec![counter_binding(0x200, 10); selectors.len()];
    let version = engine
        .register_app_version(provider(), registry, "Counter", init_binding(), &selectors, &v2)
        .unwrap();
    assert_eq!(version, 2);

    // Pending versions are not dispatched to.
    engine.exec(user(), id, &call("increment()")).unwrap();
    assert_eq!(engine.reader(id).unwrap().read_u128(count_key()).unwrap(), 1);

    engine.take_notifications();
    engine
        .finalize_app_version(provider(), registry, "Counter", 2)
        .unwrap();
    assert_eq!(
        engine.take_notifications(),
        vec![Notification::ApplicationFinalization {
            execution_id: registry,
            implementation: init_binding().address(),
        }]
    );

    engine.exec(user(), id, &call("increment()")).unwrap();
    assert_eq!(engine.reader(id).unwrap().read_u128(count_key()).unwrap(), 11);
    assert_eq!(
        engine.resolve_implementation(registry, "Counter", sel("increment()")),
        Address::from_low_u64(0x200)
    );
}

#[test]
fn test_pinned_instances_upgrade_explicitly() {
    let (mut engine, registry) = engine_with(EngineSettings::pinned());
    assert_eq!(engine.settings().version_policy, VersionPolicy::Pinned);
    let id = instance(&mut engine, registry, 0);

    let selectors: Vec<Selector> = COUNTER_SIGNATURES.iter().map(|s| sel(s)).collect();
    let v2 = vec![counter_binding(0x200, 10); selectors.len()];
    engine
        .register_app_version(provider(), registry, "Counter", init_binding(), &selectors, &v2)
        .unwrap();
    engine
        .finalize_app_version(provider(), registry, "Counter", 2)
        .unwrap();

    engine.exec(user(), id, &call("increment()")).unwrap();
    assert_eq!(engine.reader(id).unwrap().read_u128(count_key()).unwrap(), 1);

    assert_eq!(
        engine.upgrade_instance(user(), id),
        Err(EngineError::NotAdmin {
            sender: user(),
            execution_id: id
        })
    );
    assert_eq!(engine.upgrade_instance(admin(), id), Ok(2));
    engine.exec(user(), id, &call("increment()")).unwrap();
    assert_eq!(engine.reader(id).unwrap().read_u128(count_key()).unwrap(), 11);

    // Instances created after the upgrade start on the new version.
    let later = instance(&mut engine, registry, 0);
    assert_eq!(engine.context(later).unwrap().pinned_version(), 2);
}

#[test]
fn test_transfer_admin() {
    let (mut engine, registry) = engine_with(EngineSettings::default());
    let id = instance(&mut engine, registry, 0);
    let next = Address::from_low_u64(0x0e3);

    assert!(matches!(
        engine.transfer_admin(user(), id, next),
        Err(EngineError::NotAdmin { .. })
    ));
    assert_eq!(
        engine.transfer_admin(admin(), id, Address::zero()),
        Err(EngineError::InvalidAdmin)
    );

    engine.transfer_admin(admin(), id, next).unwrap();
    assert_eq!(engine.reader(id).unwrap().admin(), next);
    assert_eq!(engine.context(id).unwrap().admin(), next);

    // The module guard follows the stored admin.
    assert!(engine.exec(admin(), id, &call("initialize()")).unwrap().is_zero());
    assert!(!engine.exec(next, id, &call("initialize()")).unwrap().is_zero());
}

#[test]
fn test_registry_guards() {
    init_tracing();
    let mut engine = ExecutionEngine::in_memory();
    assert_eq!(engine.open_registry(Address::zero()), Err(EngineError::InvalidAdmin));

    let registry = engine.open_registry(provider()).unwrap();
    let err = engine
        .register_application(
            user(),
            registry,
            "Counter",
            init_binding(),
            &[sel("increment()")],
            &[counter_binding(0x100, 1)],
        )
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotRegistryProvider {
            sender: user(),
            registry
        }
    );

    register_counter(&mut engine, registry, counter_binding(0x100, 1)).unwrap();
    assert_eq!(
        register_counter(&mut engine, registry, counter_binding(0x100, 1)),
        Err(EngineError::DuplicateName("Counter".into()))
    );
    assert_eq!(engine.registry(registry).unwrap().len(), 1);

    // A second registry keeps its own namespace.
    let other = engine.open_registry(provider()).unwrap();
    assert_ne!(other, registry);
    register_counter(&mut engine, other, counter_binding(0x100, 1)).unwrap();
}

proptest! {
    #[test]
    fn prop_instances_are_isolated(ops in prop::collection::vec(0u8..4, 1..24)) {
        let (mut engine, registry) = engine_with(EngineSettings::default());
        let a = instance(&mut engine, registry, 1);
        let b = instance(&mut engine, registry, 1);
        let untouched = engine.store().slots(b);

        for op in ops {
            let calldata = match op {
                0 => call("increment()"),
                1 => call("fail()"),
                2 => call("hijack()"),
                _ => call("initialize()"),
            };
            let _ = engine.exec(admin(), a, &calldata);
        }

        prop_assert_eq!(engine.store().slots(b), untouched);
        prop_assert!(!engine.context(b).unwrap().is_initialized());
    }
}
