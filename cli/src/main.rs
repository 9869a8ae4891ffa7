mod commands;
mod version;

use clap::{Arg, ArgAction, Command};
use command_harness_core::{InvocationContext, POSITIONAL_ARGS, ProcessEnv};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use commands::{BIN_NAME, run_env, run_inspect, run_version};

const DEFAULT_LOG_FILTER: &str = "warn";

fn cli() -> Command {
    Command::new(BIN_NAME)
        .about("Report the build version and inspect command-test environments")
        .version(version::current_version().to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("version")
                .about("Print the resolved build version.")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "json"])
                        .help("Output format (default: text)."),
                )
                .arg(
                    Arg::new("short")
                        .long("short")
                        .action(ArgAction::SetTrue)
                        .help("Print only the version number."),
                ),
        )
        .subcommand(
            Command::new("env")
                .about("Print environment variables by name.")
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail if any variable is not set."),
                )
                .arg(
                    Arg::new(POSITIONAL_ARGS)
                        .value_name("NAME")
                        .required(true)
                        .num_args(1..)
                        .help("Variable names to print."),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Load a YAML fixture and print the invocation it describes.")
                .arg(
                    Arg::new(POSITIONAL_ARGS)
                        .value_name("FIXTURE")
                        .required(true)
                        .num_args(1)
                        .help("Path to the fixture file."),
                ),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let matches = cli().get_matches();
    let cancel = CancellationToken::new();

    let result = match matches.subcommand() {
        Some((name, sub)) => {
            let ctx = InvocationContext::from_matches(Some(name), sub.clone(), cancel);
            let mut stdout = std::io::stdout().lock();
            match name {
                "version" => run_version(&ctx, &mut stdout),
                "env" => run_env(&ctx, &ProcessEnv, &mut stdout),
                "inspect" => run_inspect(&ctx, &ProcessEnv, &mut stdout),
                other => Err(format!("Unknown command '{other}'")),
            }
        }
        None => Err("No command given".to_string()),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
