//! Condition expression compilation and evaluation.
//!
//! The pipeline is:
//!
//! 1. **Lexing**: tokenize the source into a token stream ending in `Eof`.
//! 2. **Parsing**: build a [`DynamoExpression`] with a Pratt parser that keeps
//!    going after syntax errors and reports all of them.
//! 3. **Evaluation**: walk the tree against an [`Environment`] to produce a
//!    [`Value`].

pub mod ast;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::{DynamoExpression, Expression, Node, collect_names, collect_values};
pub use evaluator::{Environment, Evaluation, Evaluator, evaluate_source};
pub use functions::FunctionName;
pub use lexer::Lexer;
pub use parser::{ParseOutcome, Parser, compile, parse, parse_condition};
pub use token::{Token, TokenKind};
pub use value::Value;
