use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use patchslot::Slot;

pub fn init_logging() {
    let _ = pretty_env_logger::formatted_builder()
        .parse_default_env()
        .is_test(true)
        .try_init();
}

pub fn write_catalog(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("data.json");
    fs::write(&path, body).unwrap();
    path
}

pub type QuotaFn = dyn Fn(&str) -> u32 + Send + Sync;

/// Host-side service with one patchable free function.
pub struct QuotaService {
    slot: Slot<QuotaFn>,
}

impl QuotaService {
    pub fn new() -> Self {
        Self { slot: Slot::new() }
    }

    pub fn slot(&self) -> &Slot<QuotaFn> {
        &self.slot
    }

    /// Replacement wins over the built-in behavior.
    pub fn quota(&self, user: &str) -> u32 {
        if let Some(f) = self.slot.installed() {
            return f(user);
        }
        user.len() as u32
    }
}

pub type GreetFn = dyn Fn(&Greeter, &str) -> String + Send + Sync;

lazy_static! {
    /// Seam for [`Greeter::greet`]. A static, like a real host would
    /// keep next to the method it intercepts.
    pub static ref GREET_SLOT: Slot<GreetFn> = Slot::new();
}

pub struct Greeter {
    pub greeting: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        if let Some(f) = GREET_SLOT.installed() {
            return f(self, name);
        }
        format!("{}, {}", self.greeting, name)
    }
}
