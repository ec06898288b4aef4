//! The data catalog: named toggle records loaded from an external file.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use log::error;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// File name searched for in each candidate directory.
pub const CATALOG_FILE: &str = "data.json";

/// Pair of procedures undoing or re-applying one installed patch.
///
/// Type-erased so that records targeting different signatures can share
/// one catalog. The two procedures are independent: `unpatch` fully
/// removes the replacement, `restore` re-applies the same replacement
/// after an unpatch.
pub struct UndoHandle {
    unpatch: Box<dyn Fn() + Send + Sync>,
    restore: Box<dyn Fn() + Send + Sync>,
}

impl UndoHandle {
    pub fn new(
        unpatch: impl Fn() + Send + Sync + 'static,
        restore: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            unpatch: Box::new(unpatch),
            restore: Box::new(restore),
        }
    }

    /// Fully removes the patch; original behavior resumes.
    pub fn unpatch(&self) {
        (self.unpatch)()
    }

    /// Re-applies the replacement this handle was created for.
    pub fn restore(&self) {
        (self.restore)()
    }
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UndoHandle")
    }
}

/// One named toggle entry.
#[derive(Debug, Deserialize)]
pub struct ToggleRecord {
    pub name: String,
    /// Opaque payload handed through to the replacement factory. A
    /// malformed payload is a defect at activation time, not load time.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub enabled: bool,
    /// Present exactly while the patch is installed.
    #[serde(skip)]
    pub guard: Option<UndoHandle>,
}

/// On-disk shape of the catalog file.
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    config: Vec<String>,
    #[serde(default)]
    data: Vec<ToggleRecord>,
}

/// Name-keyed toggle records plus the default reconciliation order.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Ordered list of names reconciled by
    /// [`reconcile_from_config`](Catalog::reconcile_from_config).
    pub config: Vec<String>,
    by_name: HashMap<String, ToggleRecord>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Candidate files tried by [`Catalog::load`], in priority order:
    /// `data.json`, `patch/data.json` and `etc/data.json` under the
    /// working directory.
    pub fn default_candidates() -> Result<Vec<PathBuf>> {
        let cwd = std::env::current_dir()?;
        Ok(vec![
            cwd.join(CATALOG_FILE),
            cwd.join("patch").join(CATALOG_FILE),
            cwd.join("etc").join(CATALOG_FILE),
        ])
    }

    /// Loads the catalog from the default candidate paths.
    ///
    /// Absence of configuration must not take the host process down, so
    /// every failure degrades to an empty catalog after logging.
    pub fn load() -> Self {
        match Self::default_candidates() {
            Ok(candidates) => Self::load_from(&candidates),
            Err(err) => {
                error!("unable to resolve {} candidate paths: {}", CATALOG_FILE, err);
                Self::empty()
            }
        }
    }

    /// Loads the catalog from explicit candidate paths; the first file
    /// that opens wins. Failures degrade to an empty catalog.
    pub fn load_from(candidates: &[PathBuf]) -> Self {
        match Self::try_load(candidates) {
            Ok(catalog) => catalog,
            Err(Error::CatalogNotFound) => {
                error!("unable to locate {}", CATALOG_FILE);
                Self::empty()
            }
            Err(Error::StdIO(err)) => {
                error!("unable to read {}: {}", CATALOG_FILE, err);
                Self::empty()
            }
            Err(Error::Json(err)) => {
                error!("unable to decode {}: {}", CATALOG_FILE, err);
                Self::empty()
            }
        }
    }

    fn try_load(candidates: &[PathBuf]) -> Result<Self> {
        let mut file = candidates
            .iter()
            .find_map(|path| File::open(path).ok())
            .ok_or(Error::CatalogNotFound)?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let decoded: CatalogFile = serde_json::from_str(&contents)?;

        let mut catalog = Catalog {
            config: decoded.config,
            by_name: HashMap::with_capacity(decoded.data.len()),
        };
        for record in decoded.data {
            // later duplicates overwrite earlier ones
            catalog.insert(record);
        }

        Ok(catalog)
    }

    /// Inserts `record`, replacing any record with the same name.
    pub fn insert(&mut self, record: ToggleRecord) {
        self.by_name.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&ToggleRecord> {
        self.by_name.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ToggleRecord> {
        self.by_name.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
