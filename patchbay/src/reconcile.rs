//! Reconciliation of catalog state against the registry: enabled records
//! get their replacement installed, disabled ones get it removed.

use log::{debug, warn};

use crate::catalog::{Catalog, ToggleRecord};
use crate::registry::{PatchEntry, Registry};

impl Catalog {
    /// Reconciles the names in the catalog's `config` list, in order.
    pub fn reconcile_from_config(&mut self, registry: &Registry) {
        let names = self.config.clone();
        self.reconcile(registry, &names);
    }

    /// Reconciles an explicit list of names, in order, once per
    /// occurrence. An empty list means every registered patch.
    pub fn reconcile_by_names<S: AsRef<str>>(&mut self, registry: &Registry, names: &[S]) {
        let names: Vec<String> = names.iter().map(|s| s.as_ref().to_owned()).collect();
        self.reconcile(registry, &names);
    }

    fn reconcile(&mut self, registry: &Registry, names: &[String]) {
        if names.is_empty() {
            self.reconcile_all(registry);
        } else {
            for name in names {
                self.reconcile_named(registry, name);
            }
        }
    }

    /// Never fails: a name unknown to either side is logged and skipped.
    fn reconcile_named(&mut self, registry: &Registry, name: &str) {
        match (self.get_mut(name), registry.get(name)) {
            (Some(record), Some(entry)) => apply(record, entry),
            (None, None) => {
                debug!("unable to find '{}' in either the catalog or the registry", name)
            }
            (None, Some(_)) => debug!("unable to find '{}' in the catalog", name),
            (Some(_), None) => debug!("unable to find '{}' in the registry", name),
        }
    }

    /// Driven by the registry, so a missing-registry entry cannot occur
    /// in this direction.
    fn reconcile_all(&mut self, registry: &Registry) {
        for (name, entry) in registry.iter() {
            match self.get_mut(name) {
                Some(record) => apply(record, entry),
                None => warn!("unable to find '{}' in the catalog", name),
            }
        }
    }
}

fn apply(record: &mut ToggleRecord, entry: &PatchEntry) {
    if record.enabled {
        debug!("enabling {} patch '{}'", entry.kind(), record.name);
        let guard = entry.activate(record);
        record.guard = Some(guard);
    } else {
        debug!("disabling {} patch '{}'", entry.kind(), record.name);
        entry.deactivate();
        record.guard = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use patchslot::Slot;

    use super::*;
    use crate::test_utils::init_logging;

    type EchoFn = dyn Fn() -> &'static str + Send + Sync;

    fn record(name: &str, enabled: bool) -> ToggleRecord {
        ToggleRecord {
            name: name.to_owned(),
            value: None,
            enabled,
            guard: None,
        }
    }

    #[test]
    fn unknown_names_are_skipped() {
        init_logging();
        let slot: Slot<EchoFn> = Slot::new();

        let mut registry = Registry::new();
        registry.register_function("registered-only", &slot, |_| Arc::new(|| "x"));

        let mut catalog = Catalog::empty();
        catalog.insert(record("cataloged-only", true));

        catalog.reconcile_by_names(&registry, &["cataloged-only", "registered-only", "nowhere"]);
        assert!(!slot.is_active());
        assert!(catalog.get("cataloged-only").unwrap().guard.is_none());
    }

    #[test]
    fn empty_config_list_reconciles_all_registered() {
        init_logging();
        let slot: Slot<EchoFn> = Slot::new();

        let mut registry = Registry::new();
        registry.register_function("echo", &slot, |_| Arc::new(|| "patched"));

        let mut catalog = Catalog::empty();
        catalog.insert(record("echo", true));

        // no config list at all behaves like "all registered"
        catalog.reconcile_from_config(&registry);
        assert!(slot.is_active());
    }

    #[test]
    fn disabling_clears_the_guard() {
        init_logging();
        let slot: Slot<EchoFn> = Slot::new();

        let mut registry = Registry::new();
        registry.register_function("echo", &slot, |_| Arc::new(|| "patched"));

        let mut catalog = Catalog::empty();
        catalog.insert(record("echo", true));
        catalog.reconcile_by_names(&registry, &["echo"]);
        assert!(slot.is_active());
        assert!(catalog.get("echo").unwrap().guard.is_some());

        catalog.get_mut("echo").unwrap().enabled = false;
        catalog.reconcile_by_names(&registry, &["echo"]);
        assert!(!slot.is_active());
        assert!(catalog.get("echo").unwrap().guard.is_none());
    }

    #[test]
    fn repeated_names_are_processed_per_occurrence() {
        init_logging();
        let slot: Slot<EchoFn> = Slot::new();

        let mut registry = Registry::new();
        let installs = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&installs);
        registry.register_function("echo", &slot, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Arc::new(|| "patched")
        });

        let mut catalog = Catalog::empty();
        catalog.insert(record("echo", true));
        catalog.reconcile_by_names(&registry, &["echo", "echo"]);

        assert_eq!(installs.load(Ordering::SeqCst), 2);
        assert!(slot.is_active());
    }
}
