//! Parser limits.
//!
//! Driven by environment variables so that services embedding the compiler can
//! tighten the bounds without a rebuild.

use std::env;

use tracing::warn;

/// Default maximum nesting depth accepted by the parser.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default number of syntax errors collected before a parse is abandoned.
pub const DEFAULT_MAX_ERRORS: usize = 16;

/// Limits applied while compiling an expression.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpressionConfig {
    /// Maximum nesting depth (parentheses, prefix chains, and operator chains).
    pub max_depth: usize,
    /// Maximum number of syntax errors collected in one parse.
    pub max_errors: usize,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

impl ExpressionConfig {
    /// Create configuration from `DYNAQL_MAX_DEPTH` and `DYNAQL_MAX_PARSE_ERRORS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_depth: env_usize("DYNAQL_MAX_DEPTH", DEFAULT_MAX_DEPTH),
            max_errors: env_usize("DYNAQL_MAX_PARSE_ERRORS", DEFAULT_MAX_ERRORS),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(v) if v > 0 => v,
        _ => {
            warn!(key, value = %raw, default, "ignoring invalid limit");
            default
        }
    }
}
