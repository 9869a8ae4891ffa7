//! Test harness for CLI command handlers.
//!
//! This crate provides the scaffolding needed to unit-test command handlers
//! without running a binary:
//!
//! - [`set_env`], [`unset_env`], [`unset_vars`] and [`EnvGuard`] — apply and
//!   restore process environment variables around a test.
//! - [`Environment`], [`ProcessEnv`], [`MapEnv`] — read-only environment
//!   access, so code under test can be given an explicit map instead.
//! - [`InvocationBuilder`] and [`InvocationContext`] — a synthesized,
//!   parsed command line (typed flags, positional arguments, cancellation
//!   token).
//! - [`HarnessFixture`] — the same inputs described in YAML.
//! - [`to_slash_all`] — path normalization for cross-platform assertions.
//!
//! Tests that mutate the process environment must not run concurrently with
//! each other; mark them with `#[serial_test::serial]`.
//!
//! # Example
//!
//! ```
//! use command_harness_core::*;
//! use tokio_util::sync::CancellationToken;
//!
//! fn greet(ctx: &InvocationContext, env: &dyn Environment) -> String {
//!     let name = ctx.arg(0).unwrap_or("world");
//!     let greeting = env.var("GREETING").unwrap_or_else(|| "hello".into());
//!     if ctx.bool_flag("shout").unwrap_or(false) {
//!         format!("{greeting} {name}").to_uppercase()
//!     } else {
//!         format!("{greeting} {name}")
//!     }
//! }
//!
//! let ctx = InvocationBuilder::new(CancellationToken::new())
//!     .flag("shout", true)
//!     .arg("alice")
//!     .build();
//! let env = MapEnv::new().with_var("GREETING", "hi");
//! assert_eq!(greet(&ctx, &env), "HI ALICE");
//! ```

mod env;
mod error;
mod fixture;
mod flags;
mod invocation;
mod paths;

pub use env::{EnvGuard, Environment, MapEnv, ProcessEnv, set_env, unset_env, unset_vars};
pub use error::{HarnessError, Result};
pub use fixture::HarnessFixture;
pub use flags::{FlagKind, FlagValue, infer_flags};
pub use invocation::{
    InvocationBuilder, InvocationContext, POSITIONAL_ARGS, invocation_context,
    invocation_context_with_flags,
};
pub use paths::{to_slash, to_slash_all};
