//! Command handlers.
//!
//! Handlers read their inputs from an [`InvocationContext`] and write to a
//! caller-supplied writer, so tests can drive them with synthesized contexts.

use std::io::Write;

use command_harness_core::{Environment, HarnessFixture, InvocationContext};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::version::{build_identifiers, current_version, prerelease_identifiers};

pub const BIN_NAME: &str = "cmd-harness";

/// `version [--format text|json] [--short]`
pub fn run_version(ctx: &InvocationContext, out: &mut dyn Write) -> Result<(), String> {
    ensure_not_cancelled(ctx)?;
    let version = current_version();
    let short = ctx.bool_flag("short").unwrap_or(false);

    let written = match ctx.string_flag("format").unwrap_or("text") {
        "text" if short => writeln!(out, "{version}"),
        "text" => writeln!(out, "{BIN_NAME} {version}"),
        "json" => {
            let value = json!({
                "version": version.to_string(),
                "major": version.major,
                "minor": version.minor,
                "patch": version.patch,
                "pre": prerelease_identifiers(&version),
                "build": build_identifiers(&version),
            });
            write_json(out, &value)
        }
        other => return Err(format!("Unknown format '{other}' (expected text or json)")),
    };
    written.map_err(|err| format!("Failed to write output: {err}"))
}

/// `env [--strict] NAMES...`
pub fn run_env(
    ctx: &InvocationContext,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> Result<(), String> {
    ensure_not_cancelled(ctx)?;
    if ctx.args().is_empty() {
        return Err("Specify at least one variable name".to_string());
    }
    let strict = ctx.bool_flag("strict").unwrap_or(false);

    for name in ctx.args() {
        let line = match env.var(name) {
            Some(value) => format!("{name}={value}"),
            None if strict => return Err(format!("Environment variable '{name}' is not set")),
            None => format!("{name} is not set"),
        };
        writeln!(out, "{line}").map_err(|err| format!("Failed to write output: {err}"))?;
    }
    Ok(())
}

/// `inspect FIXTURE`
///
/// Applies the fixture's environment for the duration of the command, builds
/// its invocation, and prints what was parsed.
pub fn run_inspect(
    ctx: &InvocationContext,
    env: &dyn Environment,
    out: &mut dyn Write,
) -> Result<(), String> {
    ensure_not_cancelled(ctx)?;
    let path = ctx
        .arg(0)
        .ok_or_else(|| "Specify a fixture file".to_string())?;
    let fixture = HarnessFixture::load(path)
        .map_err(|err| format!("Failed to load fixture '{path}': {err}"))?;
    debug!(path, flags = fixture.flags.len(), "loaded fixture");

    let guard = fixture
        .apply_env()
        .map_err(|err| format!("Failed to apply fixture env: {err}"))?;
    let env_values: Map<String, Value> = fixture
        .env
        .keys()
        .map(|name| (name.clone(), env.var(name).map_or(Value::Null, Value::from)))
        .collect();
    let parsed = fixture
        .invocation(ctx.cancellation().child_token())
        .try_build();
    guard.restore();
    let parsed = parsed.map_err(|err| format!("Invalid fixture '{path}': {err}"))?;

    let flags: Map<String, Value> = fixture
        .flags
        .keys()
        .map(|name| {
            let value = parsed
                .flag(name)
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null);
            (name.clone(), value)
        })
        .collect();

    let report = json!({
        "env": env_values,
        "flags": flags,
        "args": parsed.args(),
    });
    write_json(out, &report).map_err(|err| format!("Failed to write output: {err}"))
}

fn ensure_not_cancelled(ctx: &InvocationContext) -> Result<(), String> {
    if ctx.is_cancelled() {
        return Err("Cancelled".to_string());
    }
    Ok(())
}

fn write_json(out: &mut dyn Write, value: &Value) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
