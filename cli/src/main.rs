//! gatekeep CLI — driving adapter for the gatekeep filter.
//!
//! Subcommands:
//! - `check <config> [--strict]` — validate a filter configuration
//! - `eval <config> <message> [--trace]` — decide on a message
//! - `default-config` — print the starter configuration

use std::path::Path;
use std::process;

use gatekeep::{FilterConfig, Message, RuleChainError, DEFAULT_ACTION};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    debug!(command = %args[1], args = ?&args[2..], "running command");

    let result = match args[1].as_str() {
        "eval" => cmd_eval(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "default-config" => cmd_default_config(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(args: &[String]) -> Result<(), String> {
    let opts = parse_eval_args(args)?;

    let config = load_config(&opts.config)?;
    let msg = load_message(&opts.message)?;

    let chain = config.chain_for(&msg);
    if opts.trace {
        println!("{}", chain.evaluate_with_trace(&msg, DEFAULT_ACTION));
        return Ok(());
    }

    let compiled = config
        .compile()
        .map_err(|e| format!("config invalid: {e}"))?;
    let action = compiled.decide(&msg);
    debug!(outbound = msg.outbound, %action, "decided");
    println!("{action}");
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let (path, strict) = match args {
        [path] => (path, false),
        [path, flag] if flag == "--strict" => (path, true),
        [] => return Err("check requires a config file path".into()),
        _ => return Err(format!("unexpected argument \"{}\"", args[args.len() - 1])),
    };

    let config = load_config(path)?;
    if strict {
        check_strict(&config).map_err(|e| format!("config invalid: {e}"))?;
    }

    println!("Config valid");
    Ok(())
}

fn cmd_default_config() -> Result<(), String> {
    let text = FilterConfig::default()
        .to_yaml()
        .map_err(|e| format!("cannot render default config: {e}"))?;
    print!("{text}");
    Ok(())
}

fn check_strict(config: &FilterConfig) -> Result<(), String> {
    let label = |name: &str, e: RuleChainError| format!("{name}: {e}");
    config
        .sender_filter
        .validate_strict()
        .map_err(|e| label("sender_filter", e))?;
    config
        .receiver_filter
        .validate_strict()
        .map_err(|e| label("receiver_filter", e))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<FilterConfig, String> {
    FilterConfig::load(path).map_err(|e| format!("config invalid: {e}"))
}

fn load_message(path: &str) -> Result<Message, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq, Eq)]
struct EvalArgs {
    config: String,
    message: String,
    trace: bool,
}

fn parse_eval_args(args: &[String]) -> Result<EvalArgs, String> {
    let mut positional = Vec::new();
    let mut trace = false;

    for arg in args {
        match arg.as_str() {
            "--trace" => trace = true,
            flag if flag.starts_with("--") => {
                return Err(format!("unexpected argument \"{flag}\""));
            }
            value => positional.push(value.to_owned()),
        }
    }

    match <[String; 2]>::try_from(positional) {
        Ok([config, message]) => Ok(EvalArgs {
            config,
            message,
            trace,
        }),
        Err(_) => Err("eval requires a config file path and a message file path".into()),
    }
}

fn print_usage() {
    eprintln!(
        "Usage: gatekeep <command> [options]

Commands:
  check <config> [--strict]             Validate config (--strict: no empty rules)
  eval <config> <message> [--trace]     Decide on a message (accept/reject)
  default-config                        Print the default config as YAML
  help                                  Show this help

Set RUST_LOG (e.g. RUST_LOG=gatekeep=trace) for diagnostics."
    );
}
