use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::{Mutex, PoisonError};

use crate::ConfigSource;

/// The real process environment.
///
/// `unset` edits process-wide state. Call the barrier before spawning
/// threads that read or write the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn unset(&self, key: &str) {
        // SAFETY: see the type-level note; the caller is responsible for not
        // racing other environment access.
        unsafe { std::env::remove_var(key) }
    }
}

/// In-memory configuration for tests and embedders that do not want the
/// barrier to touch the real environment.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    vars: Mutex<HashMap<String, OsString>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<OsString>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OsString>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigSource for MemoryConfig {
    fn get(&self, key: &str) -> Option<OsString> {
        self.lock().get(key).cloned()
    }

    fn unset(&self, key: &str) {
        self.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NOTIFY_SOCKET;

    #[test]
    fn memory_get_and_unset() {
        let cfg = MemoryConfig::new().with(NOTIFY_SOCKET, "/run/systemd/notify");
        assert_eq!(cfg.get(NOTIFY_SOCKET), Some(OsString::from("/run/systemd/notify")));

        cfg.unset(NOTIFY_SOCKET);
        assert!(!cfg.contains(NOTIFY_SOCKET));
        assert_eq!(cfg.get(NOTIFY_SOCKET), None);

        // unsetting twice is harmless
        cfg.unset(NOTIFY_SOCKET);
    }

    #[test]
    fn works_through_a_reference() {
        fn take_and_clear(source: impl ConfigSource) -> Option<OsString> {
            let value = source.get("A");
            source.unset("A");
            value
        }

        let cfg = MemoryConfig::new().with("A", "1");
        assert_eq!(take_and_clear(&cfg), Some(OsString::from("1")));
        assert!(!cfg.contains("A"));
    }
}
