//! Attribute value model for dynaql.
//!
//! Records evaluated by `dynaql-core` are maps from attribute name to
//! [`AttributeValue`]. The JSON form is the single-key object format used by
//! DynamoDB (`{"S": "hello"}`, `{"N": "42"}`, ...), so items captured from a
//! table can be fed to the evaluator unchanged.
#![allow(clippy::doc_markdown)]

pub mod attribute_value;

pub use attribute_value::{AttributeValue, Item};
