//! Process environment helpers for test isolation.
//!
//! The process environment is global. Nothing here locks it: tests that call
//! these helpers must be serialized (for example with `serial_test::serial`).
//!
//! Code under test that only *reads* variables should take an
//! [`Environment`] instead, so tests can hand it a [`MapEnv`] and leave the
//! real environment alone.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Read access to a set of environment variables.
pub trait Environment {
    /// Returns the value of `name`, or `None` when it is unset or not UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        if !is_valid_key(name) {
            return None;
        }
        std::env::var(name).ok()
    }
}

/// An explicit, in-memory environment.
///
/// # Examples
///
/// ```
/// use command_harness_core::{Environment, MapEnv};
///
/// let env: MapEnv = [("EDITOR", "vi")].into_iter().collect();
/// assert_eq!(env.var("EDITOR").as_deref(), Some("vi"));
/// assert_eq!(env.var("PAGER"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl From<BTreeMap<String, String>> for MapEnv {
    fn from(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Sets every variable in `vars`.
///
/// All pairs are checked before any is applied, so an error leaves the
/// environment exactly as it was. The error names the first offending pair.
///
/// # Errors
///
/// Returns [`HarnessError::SetEnv`] if a key is empty or contains `=` or NUL,
/// or if a value contains NUL.
pub fn set_env(vars: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in vars {
        check_assignable(key, value)?;
    }
    for (key, value) in vars {
        write_var(key, value);
        debug!(key = %key, "set env var");
    }
    Ok(())
}

/// Removes every variable named in `vars`. Best effort: names that cannot
/// exist in the environment are skipped.
pub fn unset_env(vars: &BTreeMap<String, String>) {
    for key in vars.keys() {
        if is_valid_key(key) {
            remove_var(key);
            debug!(key = %key, "unset env var");
        }
    }
}

/// Captures and removes each variable in `names`, returning a guard that puts
/// the captured values back.
///
/// A variable that was unset before the call is unset again on restore; it
/// does not come back as an empty string.
///
/// ```no_run
/// use command_harness_core::unset_vars;
///
/// let restore = unset_vars(["HOME", "XDG_CONFIG_HOME"]);
/// assert!(std::env::var_os("HOME").is_none());
/// restore.restore();
/// ```
pub fn unset_vars<I, S>(names: I) -> EnvGuard
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut saved = Vec::new();
    for name in names {
        let name = name.as_ref();
        if !is_valid_key(name) {
            continue;
        }
        saved.push((name.to_string(), std::env::var_os(name)));
        remove_var(name);
        debug!(key = %name, "unset env var");
    }
    EnvGuard {
        saved,
        restored: false,
    }
}

/// Restores captured environment variables when dropped or when
/// [`restore`](EnvGuard::restore) is called, whichever comes first.
#[derive(Debug)]
#[must_use = "dropping the guard restores the environment immediately"]
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
    restored: bool,
}

impl EnvGuard {
    /// Applies `vars` like [`set_env`] and returns a guard that restores the
    /// previous values (or removes variables that did not exist).
    ///
    /// # Errors
    ///
    /// Same as [`set_env`]; on error nothing has been changed.
    pub fn set(vars: &BTreeMap<String, String>) -> Result<Self> {
        for (key, value) in vars {
            check_assignable(key, value)?;
        }
        let saved = vars
            .keys()
            .map(|key| (key.clone(), std::env::var_os(key)))
            .collect();
        set_env(vars)?;
        Ok(Self {
            saved,
            restored: false,
        })
    }

    /// Restores the captured values now.
    pub fn restore(mut self) {
        self.apply();
    }

    fn apply(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        // Reverse order: if a name was captured twice, the first capture holds
        // the real prior value and must be written last.
        for (key, value) in self.saved.iter().rev() {
            match value {
                Some(value) => write_var(key, value),
                None => remove_var(key),
            }
            debug!(key = %key, "restored env var");
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        self.apply();
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('=') && !key.contains('\0')
}

fn check_assignable(key: &str, value: &str) -> Result<()> {
    let reason = if !is_valid_key(key) {
        "variable name must be non-empty and free of '=' and NUL"
    } else if value.contains('\0') {
        "variable value must not contain NUL"
    } else {
        return Ok(());
    };
    Err(HarnessError::SetEnv {
        key: key.to_string(),
        value: value.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidInput, reason),
    })
}

// SAFETY (both helpers): environment mutation is unsound when other threads
// read the environment concurrently. Callers of this module serialize tests
// that touch the environment; keys and values are validated beforehand so the
// std calls cannot panic.
fn write_var(key: &str, value: impl AsRef<std::ffi::OsStr>) {
    unsafe {
        std::env::set_var(key, value);
    }
}

fn remove_var(key: &str) {
    unsafe {
        std::env::remove_var(key);
    }
}
