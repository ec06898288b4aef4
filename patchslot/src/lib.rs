//! Runtime interception points.
//!
//! A [`Slot`] is the seam through which a function or method body can be
//! swapped out while the process runs. In-place machine-code patching is
//! unsafe and platform-specific; a slot is the portable substitute: host
//! code routes a call site through a slot, and whatever replacement is
//! currently installed wins over the original body.

use std::sync::Arc;

use parking_lot::RwLock;

/// One patchable seam.
///
/// `T` is usually a function trait object, e.g.
/// `dyn Fn(&str) -> u32 + Send + Sync`. Clones share the same underlying
/// state, so a slot can live in a static next to the code it intercepts
/// while registration code holds its own handle.
pub struct Slot<T: ?Sized> {
    active: Arc<RwLock<Option<Arc<T>>>>,
}

impl<T: ?Sized> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            active: Arc::clone(&self.active),
        }
    }
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Slot<T> {
    pub fn new() -> Self {
        Self {
            active: Arc::new(RwLock::new(None)),
        }
    }

    /// Makes `replacement` the active implementation and returns a guard
    /// that can undo or re-apply it. Last writer wins: installing over an
    /// already-active replacement drops the previous one outright, and
    /// guards handed out for it are orphaned.
    pub fn install(&self, replacement: Arc<T>) -> SlotGuard<T> {
        *self.active.write() = Some(Arc::clone(&replacement));
        SlotGuard {
            slot: self.clone(),
            replacement,
        }
    }

    /// Removes the active replacement, if any. Addressed at the slot
    /// itself, so no guard is needed; clearing an empty slot is a no-op.
    pub fn clear(&self) {
        *self.active.write() = None;
    }

    /// The currently installed replacement. Host dispatch reads this:
    /// call the result if present, fall through to the original body
    /// otherwise.
    pub fn installed(&self) -> Option<Arc<T>> {
        self.active.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.read().is_some()
    }
}

/// Undo handle for one [`Slot::install`].
///
/// Dropping a guard does nothing; an orphaned guard only touches the
/// slot again if [`unpatch`](SlotGuard::unpatch) or
/// [`restore`](SlotGuard::restore) is called on it.
pub struct SlotGuard<T: ?Sized> {
    slot: Slot<T>,
    replacement: Arc<T>,
}

impl<T: ?Sized> Clone for SlotGuard<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            replacement: Arc::clone(&self.replacement),
        }
    }
}

impl<T: ?Sized> SlotGuard<T> {
    /// Removes the replacement from the slot; the original body resumes.
    pub fn unpatch(&self) {
        self.slot.clear();
    }

    /// Re-installs the replacement this guard was created for. The
    /// identical `Arc` comes back, so state captured inside the
    /// replacement survives an unpatch/restore cycle.
    pub fn restore(&self) {
        *self.slot.active.write() = Some(Arc::clone(&self.replacement));
    }
}
