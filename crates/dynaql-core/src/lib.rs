//! Lexer, Pratt parser, and evaluator for DynamoDB-style condition expressions.
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod expression;

pub use cache::ExpressionCache;
pub use config::ExpressionConfig;
pub use error::{Arity, ExpressionError, ExpressionResult, ParseError};
pub use expression::{
    DynamoExpression, Environment, Evaluation, Evaluator, Value, compile, evaluate_source, parse,
};
