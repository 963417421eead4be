//! Shared cache of compiled expressions.
//!
//! Compiled trees are immutable, so one [`DynamoExpression`] can be evaluated
//! against many environments from many threads. [`ExpressionCache`] keys them
//! by source text.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::config::ExpressionConfig;
use crate::error::ExpressionResult;
use crate::expression::{DynamoExpression, compile};

/// Thread-safe map from source text to its compiled tree.
///
/// Only successful compilations are cached; a failing source is recompiled
/// (and fails again) on every request.
#[derive(Debug)]
pub struct ExpressionCache {
    config: ExpressionConfig,
    inner: DashMap<String, Arc<DynamoExpression>>,
}

impl ExpressionCache {
    /// Create an empty cache that compiles with `config`.
    #[must_use]
    pub fn new(config: ExpressionConfig) -> Self {
        Self {
            config,
            inner: DashMap::new(),
        }
    }

    /// Limits used when compiling.
    #[must_use]
    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }

    /// Return the compiled tree for `source`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns the compilation error; nothing is cached in that case.
    pub fn get_or_compile(&self, source: &str) -> ExpressionResult<Arc<DynamoExpression>> {
        if let Some(hit) = self.inner.get(source) {
            debug!(source, "expression cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        debug!(source, "expression cache miss");
        let compiled = Arc::new(compile(source, &self.config)?);
        // Another thread may have compiled the same source meanwhile; keep the first.
        Ok(self
            .inner
            .entry(source.to_owned())
            .or_insert(compiled)
            .clone())
    }

    /// The cached tree for `source`, if any.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<Arc<DynamoExpression>> {
        self.inner.get(source).map(|v| Arc::clone(v.value()))
    }

    /// Drop every cached tree.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of cached trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(ExpressionConfig::default())
    }
}
