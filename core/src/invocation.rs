//! Synthetic command-line invocations for testing command handlers.
//!
//! A command handler takes an [`InvocationContext`]. In production the
//! context wraps the `clap` matches of the real command line; in tests an
//! [`InvocationBuilder`] registers the flags a test needs, turns them into an
//! argument list, and parses it the same way.

use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::flags::{FlagKind, FlagValue, infer_flags};

/// Argument id under which positional arguments are collected.
///
/// Commands that want [`InvocationContext::args`] populated from real matches
/// should declare their positional argument with this id.
pub const POSITIONAL_ARGS: &str = "args";

const SYNTHETIC_COMMAND: &str = "default";

/// A parsed command-line call: flag values, positional arguments, the
/// command name (if any) and a cancellation handle for the code under test.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    command: Option<String>,
    matches: ArgMatches,
    args: Vec<String>,
    cancel: CancellationToken,
}

impl InvocationContext {
    /// Wraps matches produced by a real `clap` command.
    pub fn from_matches(
        command: Option<&str>,
        matches: ArgMatches,
        cancel: CancellationToken,
    ) -> Self {
        let args = matches
            .try_get_many::<String>(POSITIONAL_ARGS)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        Self {
            command: command.map(String::from),
            matches,
            args,
            cancel,
        }
    }

    /// Name of the command this invocation belongs to. Always `None` for
    /// synthesized invocations.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Returns the value of a boolean flag, or `None` if it is not a boolean
    /// flag or was not given.
    pub fn bool_flag(&self, name: &str) -> Option<bool> {
        self.matches.try_get_one::<bool>(name).ok().flatten().copied()
    }

    /// Returns the value of an integer flag.
    pub fn int_flag(&self, name: &str) -> Option<i64> {
        self.matches.try_get_one::<i64>(name).ok().flatten().copied()
    }

    /// Returns the value of a string flag.
    pub fn string_flag(&self, name: &str) -> Option<&str> {
        self.matches
            .try_get_one::<String>(name)
            .ok()
            .flatten()
            .map(String::as_str)
    }

    /// Returns a flag's value whatever its registered type.
    pub fn flag(&self, name: &str) -> Option<FlagValue> {
        self.bool_flag(name)
            .map(FlagValue::Bool)
            .or_else(|| self.int_flag(name).map(FlagValue::Int))
            .or_else(|| self.string_flag(name).map(FlagValue::from))
    }

    /// Returns `true` if the flag was given on the command line.
    pub fn is_set(&self, name: &str) -> bool {
        self.matches.try_contains_id(name).unwrap_or(false)
            && self.matches.value_source(name) == Some(ValueSource::CommandLine)
    }

    /// Positional arguments, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Positional argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The underlying `clap` matches.
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }

    /// Cancellation handle passed in by the caller.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Shorthand for `self.cancellation().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Builds an [`InvocationContext`] from typed flags and positional arguments.
///
/// # Examples
///
/// ```
/// use command_harness_core::{FlagValue, InvocationBuilder};
/// use tokio_util::sync::CancellationToken;
///
/// let ctx = InvocationBuilder::new(CancellationToken::new())
///     .flag("verbose", FlagValue::Bool(true))
///     .flag("retries", FlagValue::Int(2))
///     .flag("output", "out.json")
///     .arg("input.txt")
///     .build();
///
/// assert_eq!(ctx.bool_flag("verbose"), Some(true));
/// assert_eq!(ctx.int_flag("retries"), Some(2));
/// assert_eq!(ctx.string_flag("output"), Some("out.json"));
/// assert_eq!(ctx.args(), ["input.txt"]);
/// assert!(ctx.command().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    cancel: CancellationToken,
    flags: BTreeMap<String, FlagValue>,
    args: Vec<String>,
}

impl InvocationBuilder {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            flags: BTreeMap::new(),
            args: Vec::new(),
        }
    }

    /// Registers a flag with an explicit type and passes it as `--name=value`.
    pub fn flag(mut self, name: &str, value: impl Into<FlagValue>) -> Self {
        self.flags.insert(name.to_string(), value.into());
        self
    }

    /// Registers a flag whose type is inferred from `raw`
    /// (see [`FlagValue::infer`]).
    pub fn inferred_flag(self, name: &str, raw: &str) -> Self {
        self.flag(name, FlagValue::infer(raw))
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = (String, FlagValue)>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Appends a positional (or extra) argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The argument list that will be parsed: `--name=value` for each flag in
    /// name order, followed by the extra arguments in the order given.
    pub fn argv(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|(name, value)| format!("--{name}={value}"))
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Registers the flags, parses [`argv`](Self::argv), and returns the
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidFlag`] for a flag name that cannot be
    /// registered, or [`HarnessError::ParseError`] if parsing fails (for
    /// example an unknown `--flag` among the extra arguments).
    pub fn try_build(self) -> Result<InvocationContext> {
        let mut command = Command::new(SYNTHETIC_COMMAND)
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            // A flag repeated in the extra args overrides the synthesized one.
            .args_override_self(true)
            .arg(
                Arg::new(POSITIONAL_ARGS)
                    .action(ArgAction::Append)
                    .num_args(1..)
                    .trailing_var_arg(true),
            );

        for (name, value) in &self.flags {
            validate_flag_name(name)?;
            command = command.arg(flag_arg(name, value.kind()));
        }

        let argv = self.argv();
        debug!(argv = ?argv, "parsing synthesized invocation");
        let matches = command.try_get_matches_from(argv)?;
        Ok(InvocationContext::from_matches(None, matches, self.cancel))
    }

    /// Like [`try_build`](Self::try_build) but fails the calling test
    /// immediately on error.
    ///
    /// # Panics
    ///
    /// Panics if a flag cannot be registered or the argument list does not
    /// parse.
    #[track_caller]
    pub fn build(self) -> InvocationContext {
        match self.try_build() {
            Ok(ctx) => ctx,
            Err(err) => panic!("failed to build invocation context: {err}"),
        }
    }
}

/// Builds a context with positional arguments only.
#[track_caller]
pub fn invocation_context<I, S>(cancel: CancellationToken, args: I) -> InvocationContext
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    InvocationBuilder::new(cancel).args(args).build()
}

/// Builds a context from string-encoded flags whose types are inferred, plus
/// positional arguments.
///
/// # Examples
///
/// ```
/// use command_harness_core::invocation_context_with_flags;
/// use tokio_util::sync::CancellationToken;
///
/// let ctx = invocation_context_with_flags(
///     CancellationToken::new(),
///     [("debug", "true"), ("count", "3"), ("name", "alice")],
///     ["pos1"],
/// );
/// assert_eq!(ctx.bool_flag("debug"), Some(true));
/// assert_eq!(ctx.int_flag("count"), Some(3));
/// assert_eq!(ctx.string_flag("name"), Some("alice"));
/// assert_eq!(ctx.args(), ["pos1"]);
/// ```
#[track_caller]
pub fn invocation_context_with_flags<K, V, I, S>(
    cancel: CancellationToken,
    flags: impl IntoIterator<Item = (K, V)>,
    args: I,
) -> InvocationContext
where
    K: Into<String>,
    V: AsRef<str>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    InvocationBuilder::new(cancel)
        .flags(infer_flags(flags))
        .args(args)
        .build()
}

fn validate_flag_name(name: &str) -> Result<()> {
    let malformed = name.is_empty()
        || name == POSITIONAL_ARGS
        || name.starts_with('-')
        || name.contains('=')
        || name.chars().any(char::is_whitespace);
    if malformed {
        return Err(HarnessError::InvalidFlag(name.to_string()));
    }
    Ok(())
}

fn flag_arg(name: &str, kind: FlagKind) -> Arg {
    let arg = Arg::new(name.to_string())
        .long(name.to_string())
        .help(name.to_string())
        .action(ArgAction::Set);
    match kind {
        // `--name value` would swallow the next positional, so booleans
        // only take a value after `=`.
        FlagKind::Bool => arg
            .value_parser(clap::value_parser!(bool))
            .require_equals(true)
            .num_args(0..=1)
            .default_missing_value("true"),
        FlagKind::Int => arg
            .value_parser(clap::value_parser!(i64))
            .allow_negative_numbers(true),
        FlagKind::String => arg.value_parser(clap::value_parser!(String)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn test_inferred_flags_and_positional() {
        let ctx = invocation_context_with_flags(
            token(),
            [("debug", "true"), ("count", "3"), ("name", "alice")],
            ["pos1"],
        );

        assert_eq!(ctx.bool_flag("debug"), Some(true));
        assert_eq!(ctx.int_flag("count"), Some(3));
        assert_eq!(ctx.string_flag("name"), Some("alice"));
        assert_eq!(ctx.args(), ["pos1"]);
        assert_eq!(ctx.arg(1), None);
        assert!(ctx.command().is_none());
    }

    #[test]
    fn test_positional_only() {
        let ctx = invocation_context(token(), ["a", "b", "c"]);
        assert_eq!(ctx.args(), ["a", "b", "c"]);
        assert_eq!(ctx.flag("a"), None);
    }

    #[test]
    fn test_empty_invocation() {
        let ctx = invocation_context(token(), Vec::<String>::new());
        assert!(ctx.args().is_empty());
    }

    #[test]
    fn test_false_bool_flag() {
        let ctx = InvocationBuilder::new(token())
            .flag("dry-run", false)
            .build();
        assert_eq!(ctx.bool_flag("dry-run"), Some(false));
        assert!(ctx.is_set("dry-run"));
    }

    #[test]
    fn test_wrong_type_accessor_returns_none() {
        let ctx = InvocationBuilder::new(token()).flag("count", 3_i64).build();
        assert_eq!(ctx.string_flag("count"), None);
        assert_eq!(ctx.bool_flag("count"), None);
        assert_eq!(ctx.flag("count"), Some(FlagValue::Int(3)));
        assert!(!ctx.is_set("missing"));
    }

    #[test]
    fn test_explicit_string_avoids_int_inference() {
        let ctx = InvocationBuilder::new(token()).flag("zip", "02134").build();
        assert_eq!(ctx.string_flag("zip"), Some("02134"));
        assert_eq!(ctx.int_flag("zip"), None);
    }

    #[test]
    fn test_negative_int_flag() {
        let ctx = InvocationBuilder::new(token())
            .inferred_flag("offset", "-5")
            .build();
        assert_eq!(ctx.int_flag("offset"), Some(-5));
    }

    #[test]
    fn test_argv_is_sorted_by_flag_name() {
        let builder = InvocationBuilder::new(token())
            .flag("zeta", "z")
            .flag("alpha", true)
            .args(["x", "y"]);
        assert_eq!(builder.argv(), vec!["--alpha=true", "--zeta=z", "x", "y"]);
    }

    #[test]
    fn test_repeated_flag_in_extra_args_last_wins() {
        let ctx = InvocationBuilder::new(token())
            .flag("name", "from-builder")
            .args(["--name=from-args", "rest"])
            .build();
        assert_eq!(ctx.string_flag("name"), Some("from-args"));
        assert_eq!(ctx.args(), ["rest"]);
    }

    #[test]
    fn test_extra_args_reset_bool_and_string_flags() {
        let ctx = invocation_context_with_flags(
            token(),
            [("force", "true"), ("name", "a")],
            ["--force=false", "--name=b", "rest"],
        );
        assert_eq!(ctx.bool_flag("force"), Some(false));
        assert_eq!(ctx.string_flag("name"), Some("b"));
        assert_eq!(ctx.args(), ["rest"]);
    }

    #[test]
    fn test_flags_after_first_positional_are_positional() {
        let ctx = InvocationBuilder::new(token())
            .flag("verbose", true)
            .flag("level", 1_i64)
            .args(["pos1", "--level=9", "-x"])
            .try_build()
            .unwrap();
        assert_eq!(ctx.bool_flag("verbose"), Some(true));
        assert_eq!(ctx.int_flag("level"), Some(1));
        assert_eq!(ctx.args(), ["pos1", "--level=9", "-x"]);
    }

    #[test]
    fn test_false_bool_with_string_flag() {
        let ctx = InvocationBuilder::new(token())
            .flag("force", false)
            .flag("tag", "v1")
            .try_build()
            .unwrap();
        assert_eq!(ctx.bool_flag("force"), Some(false));
        assert_eq!(ctx.string_flag("tag"), Some("v1"));
    }

    #[test]
    fn test_unknown_flag_in_extra_args_is_error() {
        let err = InvocationBuilder::new(token())
            .arg("--nope")
            .try_build()
            .unwrap_err();
        assert!(matches!(err, HarnessError::ParseError(_)));
    }

    #[test]
    fn test_single_dash_long_flag_is_not_accepted() {
        let err = InvocationBuilder::new(token())
            .flag("force", true)
            .arg("-force")
            .try_build()
            .unwrap_err();
        assert!(matches!(err, HarnessError::ParseError(_)));
    }

    #[test]
    fn test_invalid_flag_names() {
        for name in ["", "args", "-x", "a=b", "two words"] {
            let err = InvocationBuilder::new(token())
                .flag(name, true)
                .try_build()
                .unwrap_err();
            assert!(
                matches!(err, HarnessError::InvalidFlag(ref n) if n == name),
                "expected InvalidFlag for {name:?}, got {err}"
            );
        }
    }

    #[test]
    #[should_panic(expected = "failed to build invocation context")]
    fn test_build_panics_on_parse_error() {
        let _ = InvocationBuilder::new(token()).arg("--unknown").build();
    }

    #[test]
    fn test_carries_cancellation_token() {
        let parent = token();
        let ctx = invocation_context(parent.child_token(), ["x"]);
        assert!(!ctx.is_cancelled());
        parent.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.cancellation().is_cancelled());
    }

    #[test]
    fn test_from_matches_wraps_real_command() {
        let cmd = Command::new("greet")
            .arg(Arg::new("loud").long("loud").action(ArgAction::SetTrue))
            .arg(Arg::new(POSITIONAL_ARGS).num_args(1..));
        let matches = cmd
            .try_get_matches_from(["greet", "--loud", "world"])
            .unwrap();

        let ctx = InvocationContext::from_matches(Some("greet"), matches, token());

        assert_eq!(ctx.command(), Some("greet"));
        assert_eq!(ctx.bool_flag("loud"), Some(true));
        assert_eq!(ctx.args(), ["world"]);
    }
}
