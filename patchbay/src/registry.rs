//! The patch registry: named patch points and their replacement
//! factories.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use patchslot::Slot;

use crate::catalog::{ToggleRecord, UndoHandle};

/// Classification of a registered target. Affects log wording only;
/// activation logic is uniform across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Function,
    Method,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Function => f.write_str("function"),
            TargetKind::Method => f.write_str("method"),
        }
    }
}

type ActivateFn = Box<dyn Fn(&ToggleRecord) -> UndoHandle + Send + Sync>;
type DeactivateFn = Box<dyn Fn() + Send + Sync>;

/// One registered patch point: its classification plus the pair of
/// procedures driving the underlying slot.
pub struct PatchEntry {
    kind: TargetKind,
    method: Option<String>,
    activate: ActivateFn,
    deactivate: DeactivateFn,
}

impl PatchEntry {
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Builds the replacement for `record` via the registered factory
    /// and installs it, returning the undo handle. Installing over an
    /// already-active replacement replaces it outright.
    pub fn activate(&self, record: &ToggleRecord) -> UndoHandle {
        (self.activate)(record)
    }

    /// Removes any installed replacement for the target. Needs no
    /// per-record state; deactivating a never-installed patch is a
    /// harmless no-op.
    pub fn deactivate(&self) {
        (self.deactivate)()
    }
}

/// Table of registered patch points, keyed by name.
///
/// Constructed explicitly and handed to reconciliation by reference, so
/// every test gets its own isolated registry. Append-only: the first
/// registration for a name wins, and iteration order is the sorted name
/// order.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, PatchEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plain-function patch point. `factory` builds the
    /// replacement from the matching toggle record, so replacement
    /// behavior can depend on the record's payload.
    pub fn register_function<T, F>(&mut self, name: &str, target: &Slot<T>, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ToggleRecord) -> Arc<T> + Send + Sync + 'static,
    {
        self.insert(name, Self::entry(TargetKind::Function, None, target, factory));
    }

    /// Registers an instance-method patch point. `method` names the host
    /// method routed through `target` and is recorded for diagnostics.
    pub fn register_method<T, F>(&mut self, name: &str, target: &Slot<T>, method: &str, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ToggleRecord) -> Arc<T> + Send + Sync + 'static,
    {
        self.insert(
            name,
            Self::entry(TargetKind::Method, Some(method.to_owned()), target, factory),
        );
    }

    fn entry<T, F>(
        kind: TargetKind,
        method: Option<String>,
        target: &Slot<T>,
        factory: F,
    ) -> PatchEntry
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ToggleRecord) -> Arc<T> + Send + Sync + 'static,
    {
        let install = target.clone();
        let remove = target.clone();
        PatchEntry {
            kind,
            method,
            activate: Box::new(move |record| {
                let guard = install.install(factory(record));
                let reapply = guard.clone();
                UndoHandle::new(move || guard.unpatch(), move || reapply.restore())
            }),
            deactivate: Box::new(move || remove.clear()),
        }
    }

    fn insert(&mut self, name: &str, entry: PatchEntry) {
        if self.entries.contains_key(name) {
            warn!("already registered '{}' as a {} patch", name, entry.kind);
            return;
        }
        match &entry.method {
            Some(method) => {
                debug!("registered '{}' as a method patch targeting '{}'", name, method)
            }
            None => debug!("registered '{}' as a {} patch", name, entry.kind),
        }
        self.entries.insert(name.to_owned(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&PatchEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatchEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
