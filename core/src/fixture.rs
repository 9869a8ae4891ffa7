//! YAML fixtures describing a command test.
//!
//! # Example YAML
//!
//! ```yaml
//! env:
//!   EDITOR: vi
//!   PAGER: ""
//! flags:
//!   debug: true
//!   count: 3
//!   name: alice
//! args:
//!   - pos1
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::env::EnvGuard;
use crate::error::Result;
use crate::flags::FlagValue;
use crate::invocation::InvocationBuilder;

/// Environment, flags and positional arguments for one command test.
///
/// Every section is optional in YAML.
///
/// # Examples
///
/// ```
/// use command_harness_core::{FlagValue, HarnessFixture};
/// use tokio_util::sync::CancellationToken;
///
/// let fixture = HarnessFixture::from_yaml("flags: { count: 3 }\nargs: [a]\n").unwrap();
/// assert_eq!(fixture.flags["count"], FlagValue::Int(3));
///
/// let ctx = fixture.invocation(CancellationToken::new()).build();
/// assert_eq!(ctx.int_flag("count"), Some(3));
/// assert_eq!(ctx.args(), ["a"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessFixture {
    /// Variables applied for the duration of the test.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Flags passed to the invocation, typed by their YAML scalar. Floats and
    /// integers outside `i64` are passed as string flags.
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    /// Positional arguments, in order.
    #[serde(default)]
    pub args: Vec<String>,
}

impl HarnessFixture {
    /// Loads a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::HarnessError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::HarnessError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let fixture = serde_yaml::from_reader(reader)?;
        Ok(fixture)
    }

    /// Saves the fixture as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// A builder preloaded with this fixture's flags and arguments.
    pub fn invocation(&self, cancel: CancellationToken) -> InvocationBuilder {
        InvocationBuilder::new(cancel)
            .flags(self.flags.clone())
            .args(self.args.iter().cloned())
    }

    /// Applies the fixture's environment until the returned guard is dropped.
    pub fn apply_env(&self) -> Result<EnvGuard> {
        EnvGuard::set(&self.env)
    }
}
