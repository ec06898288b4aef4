//! Configuration-driven toggling of runtime patch points.
//!
//! Host code registers named patch points (a [`patchslot::Slot`] plus a
//! replacement factory) in a [`Registry`]; an external `data.json` file
//! declares which of those names are enabled. Reconciliation joins the
//! two and installs or removes replacements accordingly.

pub mod catalog;
pub mod error;
mod reconcile;
pub mod registry;

#[cfg(test)]
mod test_utils;

pub use catalog::{Catalog, ToggleRecord, UndoHandle};
pub use error::{Error, Result};
pub use registry::{Registry, TargetKind};
