//! Named module registration.
//!
//! Modules are attached and detached at runtime by name. Attach order is
//! preserved, and the first denial wins.

use std::fmt;
use std::sync::Arc;

use rangebook_core::{Address, Span};

use crate::error::{PermsError, Result};
use crate::hooks::{Decision, SupplyCheck, SupplyObserver, TransferCheck, TransferParticipants};

/// The hooks one module subscribes to.
#[derive(Clone, Default)]
pub struct ModuleHooks {
    pub transfer: Option<Arc<dyn TransferCheck>>,
    pub supply: Option<Arc<dyn SupplyCheck>>,
    pub observer: Option<Arc<dyn SupplyObserver>>,
}

impl ModuleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfer_check(mut self, check: Arc<dyn TransferCheck>) -> Self {
        self.transfer = Some(check);
        self
    }

    pub fn with_supply_check(mut self, check: Arc<dyn SupplyCheck>) -> Self {
        self.supply = Some(check);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SupplyObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

struct AttachedModule {
    name: String,
    hooks: ModuleHooks,
}

/// Ordered set of attached modules.
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<AttachedModule>,
}

impl fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| &m.name))
            .finish()
    }
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a module under a unique name.
    pub fn attach(&mut self, name: impl Into<String>, hooks: ModuleHooks) -> Result<()> {
        let name = name.into();
        if self.is_attached(&name) {
            return Err(PermsError::DuplicateModule(name));
        }
        self.modules.push(AttachedModule { name, hooks });
        Ok(())
    }

    /// Attach a module that only checks transfers.
    pub fn attach_transfer_check(
        &mut self,
        name: impl Into<String>,
        check: Arc<dyn TransferCheck>,
    ) -> Result<()> {
        self.attach(name, ModuleHooks::new().with_transfer_check(check))
    }

    /// Attach a module that only observes supply changes.
    pub fn attach_observer(
        &mut self,
        name: impl Into<String>,
        observer: Arc<dyn SupplyObserver>,
    ) -> Result<()> {
        self.attach(name, ModuleHooks::new().with_observer(observer))
    }

    /// Detach a module by name.
    pub fn detach(&mut self, name: &str) -> Result<()> {
        let before = self.modules.len();
        self.modules.retain(|m| m.name != name);
        if self.modules.len() == before {
            return Err(PermsError::ModuleNotFound(name.to_string()));
        }
        Ok(())
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name == name)
    }

    /// Names of attached modules, in attach order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.modules.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────────

    pub fn check_transfer(&self, participants: &TransferParticipants, amount: u64) -> Result<()> {
        for module in &self.modules {
            if let Some(check) = &module.hooks.transfer {
                into_result(&module.name, check.check_transfer(participants, amount))?;
            }
        }
        Ok(())
    }

    pub fn check_transfer_range(
        &self,
        participants: &TransferParticipants,
        span: Span,
    ) -> Result<()> {
        for module in &self.modules {
            if let Some(check) = &module.hooks.transfer {
                into_result(&module.name, check.check_transfer_range(participants, span))?;
            }
        }
        Ok(())
    }

    pub fn check_authorized_supply(&self, old: u64, new: u64) -> Result<()> {
        for module in &self.modules {
            if let Some(check) = &module.hooks.supply {
                into_result(&module.name, check.check_authorized_supply(old, new))?;
            }
        }
        Ok(())
    }

    pub fn notify_supply_changed(&self, owner: &Address, old: u64, new: u64) {
        for module in &self.modules {
            if let Some(observer) = &module.hooks.observer {
                observer.total_supply_changed(owner, old, new);
            }
        }
    }
}

fn into_result(module: &str, decision: Decision) -> Result<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(PermsError::Denied {
            module: module.to_string(),
            reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct DenyAll;

    impl TransferCheck for DenyAll {
        fn check_transfer(&self, _: &TransferParticipants, _: u64) -> Decision {
            Decision::deny("frozen")
        }
    }

    struct AllowAll;

    impl TransferCheck for AllowAll {}

    #[derive(Default)]
    struct Counter(AtomicU64);

    impl SupplyObserver for Counter {
        fn total_supply_changed(&self, _: &Address, _: u64, new: u64) {
            self.0.store(new, Ordering::SeqCst);
        }
    }

    fn parties() -> TransferParticipants {
        TransferParticipants::direct(Address::from_bytes([1; 20]), Address::from_bytes([2; 20]))
    }

    #[test]
    fn test_empty_set_allows() {
        let set = ModuleSet::new();
        assert!(set.check_transfer(&parties(), 10).is_ok());
        assert!(set.check_transfer_range(&parties(), Span::new(1, 2)).is_ok());
        assert!(set.check_authorized_supply(0, 10).is_ok());
    }

    #[test]
    fn test_attach_detach_roundtrip() {
        let mut set = ModuleSet::new();
        set.attach_transfer_check("freeze", Arc::new(DenyAll)).unwrap();
        assert_eq!(
            set.check_transfer(&parties(), 10),
            Err(PermsError::Denied {
                module: "freeze".into(),
                reason: "frozen".into()
            })
        );

        set.detach("freeze").unwrap();
        assert!(set.check_transfer(&parties(), 10).is_ok());
        assert_eq!(
            set.detach("freeze"),
            Err(PermsError::ModuleNotFound("freeze".into()))
        );
    }

    #[test]
    fn test_default_range_check_allows() {
        let mut set = ModuleSet::new();
        set.attach_transfer_check("freeze", Arc::new(DenyAll)).unwrap();
        // DenyAll only overrides amount-based checks.
        assert!(set.check_transfer_range(&parties(), Span::new(1, 5)).is_ok());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut set = ModuleSet::new();
        set.attach_transfer_check("kyc", Arc::new(AllowAll)).unwrap();
        assert_eq!(
            set.attach_transfer_check("kyc", Arc::new(AllowAll)),
            Err(PermsError::DuplicateModule("kyc".into()))
        );
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["kyc"]);
    }

    #[test]
    fn test_observers_notified() {
        let counter = Arc::new(Counter::default());
        let mut set = ModuleSet::new();
        set.attach_observer("checkpoint", counter.clone()).unwrap();
        set.notify_supply_changed(&Address::from_bytes([1; 20]), 0, 500);
        assert_eq!(counter.0.load(Ordering::SeqCst), 500);
    }
}
