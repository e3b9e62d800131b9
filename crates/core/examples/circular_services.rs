//! Example: two services that depend on each other, one of them advised
//!
//! Run with `RUST_LOG=sprig_core=debug` to watch the early reference being
//! created and published.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use sprig_core::aop::{JoinPoint, MethodInterceptor};
use sprig_core::{
    BeanRef, Component, ComponentCatalog, ComponentDefinition, Container, ContainerConfig,
    CoreError, Exposed, Slot,
};

pub trait Accounts: Send + Sync {
    fn open(&self, owner: &str) -> Result<u64, CoreError>;
}

pub trait Ledger: Send + Sync {
    fn record(&self, entry: String);
    fn entries(&self) -> Vec<String>;
}

#[derive(Default)]
struct AccountService {
    ledger: Slot<dyn Ledger>,
    next_id: Mutex<u64>,
}

impl Accounts for AccountService {
    fn open(&self, owner: &str) -> Result<u64, CoreError> {
        let ledger = self
            .ledger
            .get()
            .ok_or_else(|| CoreError::system_error("ledger not wired"))?;
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        ledger.record(format!("opened #{} for {}", next_id, owner));
        Ok(*next_id)
    }
}

impl Component for AccountService {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "ledgerService" => self.ledger.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }

    fn proxy(self: Arc<Self>, interceptor: Arc<MethodInterceptor>) -> Option<BeanRef> {
        Some(Arc::new(AccountServiceProxy {
            target: self,
            interceptor,
        }))
    }

    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn Accounts>)
    }
}

struct AccountServiceProxy {
    target: Arc<AccountService>,
    interceptor: Arc<MethodInterceptor>,
}

impl Accounts for AccountServiceProxy {
    fn open(&self, owner: &str) -> Result<u64, CoreError> {
        self.interceptor
            .invoke_fallible("open", || self.target.open(owner))
    }
}

impl Component for AccountServiceProxy {
    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn Accounts>)
    }
}

#[derive(Default)]
struct LedgerService {
    accounts: Slot<dyn Accounts>,
    entries: Mutex<Vec<String>>,
}

impl Ledger for LedgerService {
    fn record(&self, entry: String) {
        self.entries.lock().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl Component for LedgerService {
    fn inject(&self, slot: &str, bean: BeanRef) -> Result<(), CoreError> {
        match slot {
            "accountService" => self.accounts.inject(bean),
            _ => Err(CoreError::UnknownInjectionSlot {
                bean_type: self.component_type().to_string(),
                slot: slot.to_string(),
            }),
        }
    }

    fn expose(self: Arc<Self>) -> Exposed {
        Exposed::new(self as Arc<dyn Ledger>)
    }
}

#[derive(Default)]
struct AuditAspect {
    calls: Mutex<u32>,
}

impl AuditAspect {
    fn before_open(&self, join_point: &JoinPoint<'_>) -> Result<(), CoreError> {
        *self.calls.lock() += 1;
        println!("audit: entering {}.{}", join_point.target, join_point.method);
        Ok(())
    }
}

impl Component for AuditAspect {}

fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = ComponentCatalog::new()
        .with(ComponentDefinition::singleton::<AccountService>("accountService").depends_on("ledgerService"))
        .with(ComponentDefinition::singleton::<LedgerService>("ledgerService").depends_on("accountService"))
        .with(
            ComponentDefinition::singleton::<AuditAspect>("auditAspect").before::<AuditAspect, _>(
                "accountService.open",
                "beforeOpen",
                AuditAspect::before_open,
            ),
        );

    let config = ContainerConfig::new()
        .with_name("bank")
        .with_aspect_auto_proxy(true);
    let container = Container::bootstrap(catalog, config)?;

    let accounts = container.get_bean_as::<dyn Accounts>("accountService")?;
    accounts.open("ada")?;
    accounts.open("grace")?;

    let ledger = container.get_bean_as::<dyn Ledger>("ledgerService")?;
    for entry in ledger.entries() {
        println!("ledger: {}", entry);
    }

    let audit = container.get_bean_of::<AuditAspect>("auditAspect")?;
    println!("audited calls: {}", *audit.calls.lock());
    println!("{}", container.describe_json()?);

    container.close()
}
