//! Process-wide, read-only values shared by every resolution

use std::path::PathBuf;

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Overrides the platform cache directory
pub const CACHE_DIR_VAR: &str = "TYRANNO_CACHE_DIR";
/// Overrides the platform config directory
pub const CONFIG_DIR_VAR: &str = "TYRANNO_CONFIG_DIR";

const APP_DIR_NAME: &str = "tyranno";

/// Timestamps and directories captured once at startup
///
/// `now_*` never moves after capture, so every `now_utc()` in a run
/// renders the same instant.
#[derive(Debug, Clone)]
pub struct Environment {
    pub now_utc: DateTime<Utc>,
    pub now_local: DateTime<Local>,
    pub cache_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Environment {
    /// Capture the current time and resolve directories from the process environment
    pub fn capture() -> Self {
        let now_utc = Utc::now();
        let env = Self {
            now_utc,
            now_local: now_utc.with_timezone(&Local),
            cache_dir: dir_from_env(CACHE_DIR_VAR, dirs_next::cache_dir),
            config_dir: dir_from_env(CONFIG_DIR_VAR, dirs_next::config_dir),
        };
        log::debug!(
            "Captured environment at {} (cache: {}, config: {})",
            env.utc_timestamp(),
            env.cache_dir.display(),
            env.config_dir.display()
        );
        env
    }

    /// Build an environment pinned to a given instant
    pub fn at(now_utc: DateTime<Utc>) -> Self {
        Self {
            now_utc,
            now_local: now_utc.with_timezone(&Local),
            ..Self::capture()
        }
    }

    /// UTC timestamp with microseconds and a `Z` suffix
    pub fn utc_timestamp(&self) -> String {
        self.now_utc.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Local timestamp with microseconds and a numeric offset
    pub fn local_timestamp(&self) -> String {
        self.now_local.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::capture()
    }
}

fn dir_from_env(var: &str, platform: fn() -> Option<PathBuf>) -> PathBuf {
    match std::env::var_os(var) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => platform()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_utc_timestamp_format() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let env = Environment::at(instant);
        assert_eq!(env.utc_timestamp(), "2024-03-01T12:30:00.000000Z");
    }

    #[test]
    fn test_local_timestamp_is_same_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let env = Environment::at(instant);
        let parsed = DateTime::parse_from_rfc3339(&env.local_timestamp()).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), instant);
        assert!(!env.local_timestamp().ends_with('Z'));
    }

    #[test]
    fn test_capture_is_stable() {
        let env = Environment::capture();
        assert_eq!(env.utc_timestamp(), env.utc_timestamp());
        assert!(env.cache_dir.ends_with(APP_DIR_NAME) || std::env::var_os(CACHE_DIR_VAR).is_some());
    }
}
