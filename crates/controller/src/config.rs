//! Operator-facing configuration, mirroring the configuration table in
//! `SPEC_FULL.md` §6: `tmp_path`/`out_path` are required, the two interval
//! knobs have the spec's defaults, and an additional `max_concurrent_submissions`
//! knob is an ambient, additive resource-control option (unbounded by
//! default) that doesn't change the documented per-submission algorithm.
//!
//! `#[serde(default)]` per field rather than `deny_unknown_fields` realizes
//! "unrecognized options are ignored" when this is loaded from an operator
//! config file.

use serde::{Deserialize, Serialize};

fn default_lookup_interval_ms() -> u64 {
    2_000
}

fn default_orphan_lookup_interval_ms() -> u64 {
    300_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tmp_path: String,
    pub out_path: String,
    #[serde(default = "default_lookup_interval_ms")]
    pub lookup_interval_ms: u64,
    #[serde(default = "default_orphan_lookup_interval_ms")]
    pub orphan_lookup_interval_ms: u64,
    #[serde(default)]
    pub max_concurrent_submissions: Option<usize>,
}

impl Config {
    pub fn new(tmp_path: impl Into<String>, out_path: impl Into<String>) -> Self {
        Self {
            tmp_path: tmp_path.into(),
            out_path: out_path.into(),
            lookup_interval_ms: default_lookup_interval_ms(),
            orphan_lookup_interval_ms: default_orphan_lookup_interval_ms(),
            max_concurrent_submissions: None,
        }
    }

    /// Overlays `FLOWC_TMP_PATH`, `FLOWC_OUT_PATH`, `FLOWC_LOOKUP_INTERVAL_MS`
    /// and `FLOWC_ORPHAN_LOOKUP_INTERVAL_MS` on top of `self`, leaving fields
    /// unset in the environment untouched.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("FLOWC_TMP_PATH") {
            self.tmp_path = v;
        }
        if let Ok(v) = std::env::var("FLOWC_OUT_PATH") {
            self.out_path = v;
        }
        if let Some(v) = std::env::var("FLOWC_LOOKUP_INTERVAL_MS").ok().and_then(|v| v.parse().ok()) {
            self.lookup_interval_ms = v;
        }
        if let Some(v) = std::env::var("FLOWC_ORPHAN_LOOKUP_INTERVAL_MS").ok().and_then(|v| v.parse().ok()) {
            self.orphan_lookup_interval_ms = v;
        }
        self
    }

    pub fn lookup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lookup_interval_ms)
    }

    pub fn orphan_lookup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.orphan_lookup_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::new("/tmp", "/out");
        assert_eq!(config.lookup_interval_ms, 2_000);
        assert_eq!(config.orphan_lookup_interval_ms, 300_000);
        assert_eq!(config.max_concurrent_submissions, None);
    }

    // SAFETY: std::env::set_var/remove_var are unsafe from edition 2024 due
    // to thread-unsoundness if another thread reads the environment
    // concurrently. Kept as one test (rather than split across `#[test]`
    // functions) because the default test harness runs tests in parallel on
    // separate threads, and two tests mutating the same process-global env
    // vars would race each other; a single sequential test has no such
    // sibling to race against. Always restores the environment before
    // returning, including on assertion failure (the guard's `Drop` still
    // runs during unwinding).
    #[test]
    fn env_overrides_parse_intervals_then_fall_back_to_defaults() {
        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                unsafe {
                    std::env::remove_var("FLOWC_LOOKUP_INTERVAL_MS");
                    std::env::remove_var("FLOWC_ORPHAN_LOOKUP_INTERVAL_MS");
                }
            }
        }
        let _guard = Guard;

        unsafe {
            std::env::set_var("FLOWC_LOOKUP_INTERVAL_MS", "42");
            std::env::set_var("FLOWC_ORPHAN_LOOKUP_INTERVAL_MS", "99");
        }
        let config = Config::new("/tmp", "/out").with_env_overrides();
        assert_eq!(config.lookup_interval_ms, 42);
        assert_eq!(config.orphan_lookup_interval_ms, 99);

        unsafe {
            std::env::remove_var("FLOWC_LOOKUP_INTERVAL_MS");
            std::env::remove_var("FLOWC_ORPHAN_LOOKUP_INTERVAL_MS");
        }
        let config = Config::new("/tmp", "/out").with_env_overrides();
        assert_eq!(config.lookup_interval_ms, 2_000);
        assert_eq!(config.orphan_lookup_interval_ms, 300_000);
    }
}
