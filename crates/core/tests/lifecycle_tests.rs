//! Construction pipeline ordering, post-processor hooks, failures and disposal.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{EventLog, Node, OrderService, UserApi, UserService};
use serial_test::serial;
use sprig_core::config::{ConfigTrait, ENV_ALLOW_CIRCULAR_REFERENCES};
use sprig_core::container::same_bean;
use sprig_core::{
    BeanNameAware, BeanPostProcessor, BeanRef, Component, ComponentCatalog, ComponentDefinition,
    Container, ContainerConfig, ContainerState, CoreError, DisposableBean, Exposed,
    InitializingBean, Slot,
};

/// Records each lifecycle callback it receives into the event log
#[derive(Default)]
struct Tracked {
    event_log: Slot<EventLog>,
    name: parking_lot::Mutex<String>,
}

impl Tracked {
    fn record(&self, event: String) {
        if let Some(log) = self.event_log.get() {
            log.push(event);
        }
    }
}

impl BeanNameAware for Tracked {
    fn set_bean_name(&self, name: &str) {
        *self.name.lock() = name.to_string();
        self.record(format!("name:{}", name));
    }
}

impl InitializingBean for Tracked {
    fn after_properties_set(&self) -> Result<(), CoreError> {
        let name = self.name.lock().clone();
        if name == "faulty" {
            return Err(CoreError::system_error("cannot warm up"));
        }
        self.record(format!("init:{}", name));
        Ok(())
    }
}

impl DisposableBean for Tracked {
    fn destroy(&self) -> Result<(), CoreError> {
        let name = self.name.lock().clone();
        self.record(format!("destroy:{}", name));
        Ok(())
    }
}

impl Component for Tracked {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "eventLog" => self.event_log.inject(bean),
            // ordering-only dependencies
            _ => Ok(()),
        }
    }

    fn as_name_aware(&self) -> Option<&dyn BeanNameAware> {
        Some(self)
    }

    fn as_initializing(&self) -> Option<&dyn InitializingBean> {
        Some(self)
    }

    fn as_disposable(&self) -> Option<&dyn DisposableBean> {
        Some(self)
    }
}

fn tracked(name: &str) -> ComponentDefinition {
    ComponentDefinition::singleton::<Tracked>(name)
        .depends_on("eventLog")
        .name_aware()
        .initializer()
        .disposable()
}

/// Post-processor recording the hooks it runs for tracked beans
#[derive(Default)]
struct RecordingProcessor {
    event_log: Slot<EventLog>,
}

impl RecordingProcessor {
    fn record(&self, stage: &str, name: &str) {
        if let Some(log) = self.event_log.get() {
            if name.starts_with("tracked") {
                log.push(format!("{}:{}", stage, name));
            }
        }
    }
}

impl BeanPostProcessor for RecordingProcessor {
    fn before_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        self.record("before", name);
        Ok(bean)
    }

    fn after_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        self.record("after", name);
        Ok(bean)
    }
}

impl Component for RecordingProcessor {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "eventLog" => self.event_log.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }

    fn as_post_processor(self: Arc<Self>) -> Option<Arc<dyn BeanPostProcessor>> {
        Some(self)
    }
}

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

#[derive(Default)]
struct Quiet;

impl Greeter for Quiet {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

impl Component for Quiet {
    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn Greeter>)
    }
}

struct Loud;

impl Greeter for Loud {
    fn greet(&self) -> String {
        "HELLO".to_string()
    }
}

impl Component for Loud {
    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn Greeter>)
    }
}

/// Swaps the `greeter` bean after initialization and rejects `victim`
#[derive(Default)]
struct Swapper;

impl BeanPostProcessor for Swapper {
    fn before_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        if name == "victim" {
            return Err(CoreError::system_error("rejected by swapper"));
        }
        Ok(bean)
    }

    fn after_initialization(&self, bean: BeanRef, name: &str) -> Result<BeanRef, CoreError> {
        if name == "greeter" {
            return Ok(Arc::new(Loud));
        }
        Ok(bean)
    }
}

impl Component for Swapper {
    fn as_post_processor(self: Arc<Self>) -> Option<Arc<dyn BeanPostProcessor>> {
        Some(self)
    }
}

#[test]
fn test_pipeline_runs_callbacks_in_order() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<EventLog>("eventLog"))
        .with(tracked("tracked"))
        .with(
            ComponentDefinition::singleton::<RecordingProcessor>("recorder")
                .depends_on("eventLog")
                .post_processor(),
        );
    let container = Container::new(catalog).unwrap();

    let log = container.get_bean_of::<EventLog>("eventLog").unwrap();
    assert_eq!(
        log.events(),
        vec!["name:tracked", "before:tracked", "init:tracked", "after:tracked"]
    );
    assert_eq!(container.post_processor_count(), 1);
}

#[test]
fn test_post_processors_are_registered_before_other_singletons() {
    // the recorder comes last in the catalog yet sees every tracked
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<EventLog>("eventLog"))
        .with(tracked("tracked-a"))
        .with(tracked("tracked-b"))
        .with(
            ComponentDefinition::singleton::<RecordingProcessor>("recorder")
                .depends_on("eventLog")
                .post_processor(),
        );
    let container = Container::new(catalog).unwrap();

    let log = container.get_bean_of::<EventLog>("eventLog").unwrap();
    let afters: Vec<String> = log
        .events()
        .into_iter()
        .filter(|event| event.starts_with("after:"))
        .collect();
    assert_eq!(afters, vec!["after:tracked-a", "after:tracked-b"]);
}

#[test]
fn test_post_processor_replacement_is_published() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Quiet>("greeter"))
        .with(ComponentDefinition::singleton::<Swapper>("swapper").post_processor());
    let container = Container::new(catalog).unwrap();

    let greeter = container.get_bean_as::<dyn Greeter>("greeter").unwrap();
    assert_eq!(greeter.greet(), "HELLO");
    assert!(container.get_bean_of::<Quiet>("greeter").is_err());
}

#[test]
fn test_post_processor_failure_is_an_initialization_failure() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Quiet>("victim"))
        .with(ComponentDefinition::singleton::<Swapper>("swapper").post_processor());
    let err = Container::new(catalog).unwrap_err();
    assert!(matches!(err, CoreError::InitializationFailure { ref bean, .. } if bean == "victim"));
    assert!(err.to_string().contains("rejected by swapper"));
}

#[test]
fn test_initializer_failure_aborts_bootstrap() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<EventLog>("eventLog"))
        .with(tracked("faulty"));
    let err = Container::new(catalog).unwrap_err();
    assert!(matches!(err, CoreError::InitializationFailure { ref bean, .. } if bean == "faulty"));
}

static FLUSHED: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Flushable;

impl DisposableBean for Flushable {
    fn destroy(&self) -> Result<(), CoreError> {
        FLUSHED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Component for Flushable {
    fn as_disposable(&self) -> Option<&dyn DisposableBean> {
        Some(self)
    }
}

#[test]
fn test_failed_bootstrap_destroys_created_singletons() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Flushable>("buffer").disposable())
        .with(ComponentDefinition::from_factory::<Node, _>("database", || {
            Err(CoreError::system_error("connection refused"))
        }));
    let err = Container::new(catalog).unwrap_err();

    assert!(matches!(err, CoreError::ConstructionFailure { ref bean, .. } if bean == "database"));
    assert_eq!(FLUSHED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_prototype_leaves_no_trace() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<EventLog>("eventLog"))
        .with(tracked("faulty").with_scope(sprig_core::BeanScope::Prototype));
    let container = Container::new(catalog).unwrap();
    let created = container.singleton_count();

    for _ in 0..2 {
        // a stale in-construction entry would surface as a cycle on retry
        let err = container.get_bean("faulty").unwrap_err();
        assert!(matches!(err, CoreError::InitializationFailure { .. }));
    }
    assert_eq!(container.singleton_count(), created);
}

#[test]
fn test_required_dependency_missing() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<UserService>("userService").depends_on("orderService"));
    let err = Container::new(catalog).unwrap_err();

    match err {
        CoreError::RequiredDependencyMissing { bean, slot, target } => {
            assert_eq!(bean, "userService");
            assert_eq!(slot, "orderService");
            assert_eq!(target, "orderService");
        }
        other => panic!("expected a missing dependency, got {:?}", other),
    }
}

#[test]
fn test_optional_dependency_left_unset() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<UserService>("userService").optional("orderService"));
    let container = Container::new(catalog).unwrap();

    let users = container.get_bean_of::<UserService>("userService").unwrap();
    assert!(!users.order_service.is_set());
    assert!(users.method_with_orders().is_err());
}

#[test]
fn test_duplicate_definition_is_rejected() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Node>("node"))
        .with(ComponentDefinition::prototype::<Node>("node"));
    let err = Container::new(catalog).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateDefinition { name } if name == "node"));
}

#[test]
fn test_close_destroys_in_reverse_creation_order() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<EventLog>("eventLog"))
        .with(tracked("tracked-outer").depends_on("tracked-inner"))
        .with(tracked("tracked-inner"));
    let container = Container::new(catalog).unwrap();
    let log = container.get_bean_of::<EventLog>("eventLog").unwrap();

    container.close().unwrap();
    assert_eq!(container.state(), ContainerState::Closed);

    let destroyed: Vec<String> = log
        .events()
        .into_iter()
        .filter(|event| event.starts_with("destroy:"))
        .collect();
    assert_eq!(destroyed, vec!["destroy:tracked-outer", "destroy:tracked-inner"]);
}

#[test]
fn test_shared_across_threads() {
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<UserService>("userService").depends_on("orderService"))
        .with(ComponentDefinition::singleton::<OrderService>("orderService").depends_on("userService"))
        .with(ComponentDefinition::prototype::<Node>("request").depends_on("userService"));
    let container = Arc::new(Container::new(catalog).unwrap());
    let expected = container.get_bean("userService").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = Arc::clone(&container);
            std::thread::spawn(move || {
                let request = container.get_bean_of::<Node>("request").unwrap();
                request.link("userService").unwrap()
            })
        })
        .collect();

    for handle in handles {
        let seen = handle.join().unwrap();
        assert!(same_bean(&seen, &expected));
    }
    let users = container.get_bean_as::<dyn UserApi>("userService").unwrap();
    assert!(users.order_service().is_some());
}

#[test]
fn test_bootstrap_from_yaml_config() {
    let config = ContainerConfig::from_yaml_str("name: orders\nallow_circular_references: false\n")
        .unwrap();
    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Node>("a").depends_on("b"))
        .with(ComponentDefinition::singleton::<Node>("b"));
    let container = Container::bootstrap(catalog, config).unwrap();

    assert_eq!(container.config().name, "orders");
    assert!(!container.config().allow_circular_references);
    assert_eq!(container.describe().name, "orders");
}

#[test]
#[serial]
fn test_env_config_disables_circular_references() {
    std::env::set_var(ENV_ALLOW_CIRCULAR_REFERENCES, "false");
    let config = ContainerConfig::from_env();
    std::env::remove_var(ENV_ALLOW_CIRCULAR_REFERENCES);

    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<Node>("a").depends_on("b"))
        .with(ComponentDefinition::singleton::<Node>("b").depends_on("a"));
    let err = Container::bootstrap(catalog, config.unwrap()).unwrap_err();
    assert!(err.is_circular());
}
