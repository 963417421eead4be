//! dynaql - compile, check, and evaluate condition expressions.
//!
//! # Usage
//!
//! ```text
//! dynaql eval  '<expression>' [environment.json]
//! dynaql check '<expression>'
//! dynaql fmt   '<expression>'
//! ```
//!
//! The environment file is JSON with optional `item`, `names`, and `values`
//! keys; attribute values use the DynamoDB JSON encoding (`{"S": "x"}`).
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DYNAQL_MAX_DEPTH` | `128` | Maximum expression nesting depth |
//! | `DYNAQL_MAX_PARSE_ERRORS` | `16` | Syntax errors collected before giving up |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynaql_core::expression::{collect_names, collect_values};
use dynaql_core::{
    DynamoExpression, Environment, Evaluator, ExpressionConfig, ExpressionError, compile, parse,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "dynaql",
    version,
    about = "Compile, check, and evaluate condition expressions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate an expression and print the result as DynamoDB JSON
    Eval {
        /// Condition expression source
        expression: String,

        /// JSON file with `item`, `names`, and `values`
        environment: Option<PathBuf>,
    },
    /// Report every syntax error, or print the canonical form
    Check {
        /// Condition expression source
        expression: String,
    },
    /// Print the canonical form of an expression
    Fmt {
        /// Condition expression source
        expression: String,
    },
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` value.
/// Logs go to stderr so that stdout carries only results.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string())
}

fn load_environment(path: Option<&PathBuf>) -> Result<Environment> {
    let Some(path) = path else {
        return Ok(Environment::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read environment file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid environment file {}", path.display()))
}

/// Placeholders defined in `env` that `expr` never references.
fn unused_placeholders(expr: &DynamoExpression, env: &Environment) -> Vec<String> {
    let mut names = HashSet::new();
    let mut values = HashSet::new();
    if let Some(root) = expr.expression() {
        collect_names(root, &mut names);
        collect_values(root, &mut values);
    }

    let mut unused: Vec<String> = env
        .names
        .keys()
        .filter(|k| !names.contains(*k))
        .chain(env.values.keys().filter(|k| !values.contains(*k)))
        .cloned()
        .collect();
    unused.sort();
    unused
}

fn report(err: &ExpressionError) {
    let diagnostics = err.parse_errors();
    if diagnostics.is_empty() {
        eprintln!("error: {err}");
    } else {
        for diagnostic in diagnostics {
            eprintln!("error: {diagnostic}");
        }
    }
}

fn run_eval(
    expression: &str,
    environment: Option<&PathBuf>,
    config: &ExpressionConfig,
) -> Result<ExitCode> {
    let env = load_environment(environment)?;
    let expr = match compile(expression, config) {
        Ok(expr) => expr,
        Err(err) => {
            report(&err);
            return Ok(ExitCode::FAILURE);
        }
    };

    for placeholder in unused_placeholders(&expr, &env) {
        warn!(%placeholder, "placeholder is defined but never used");
    }

    match Evaluator::new(&env).evaluate_root(&expr) {
        Ok(value) => {
            debug!(%value, "evaluated expression");
            let json = serde_json::to_string(&value.into_attribute())
                .context("failed to serialize result")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            report(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_check(expression: &str, config: &ExpressionConfig) -> ExitCode {
    match parse(expression, config) {
        Ok(outcome) if outcome.is_clean() => {
            println!("{}", outcome.expression);
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            for err in &outcome.errors {
                println!("{err}");
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_fmt(expression: &str, config: &ExpressionConfig) -> ExitCode {
    match compile(expression, config) {
        Ok(expr) => {
            println!("{expr}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&log_level())?;

    let config = ExpressionConfig::from_env();
    debug!(max_depth = config.max_depth, max_errors = config.max_errors, "loaded limits");

    match cli.command {
        Commands::Eval {
            expression,
            environment,
        } => run_eval(&expression, environment.as_ref(), &config),
        Commands::Check { expression } => Ok(run_check(&expression, &config)),
        Commands::Fmt { expression } => Ok(run_fmt(&expression, &config)),
    }
}
