//! The built-in function registry.

use std::fmt;

use crate::error::{Arity, ExpressionError, ExpressionResult};

/// Functions callable from a condition expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    /// `attribute_exists(path)` - true if the attribute exists.
    AttributeExists,
    /// `attribute_not_exists(path)` - true if the attribute does not exist.
    AttributeNotExists,
    /// `attribute_type(path, type)` - true if the attribute has the given type descriptor.
    AttributeType,
    /// `begins_with(path, prefix)` - true if the string attribute starts with the prefix.
    BeginsWith,
    /// `contains(path, operand)` - substring, set member, or list element test.
    Contains,
    /// `size(path)` - length of the attribute.
    Size,
}

impl FunctionName {
    /// Every registered function.
    pub const ALL: [Self; 6] = [
        Self::AttributeExists,
        Self::AttributeNotExists,
        Self::AttributeType,
        Self::BeginsWith,
        Self::Contains,
        Self::Size,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttributeExists => "attribute_exists",
            Self::AttributeNotExists => "attribute_not_exists",
            Self::AttributeType => "attribute_type",
            Self::BeginsWith => "begins_with",
            Self::Contains => "contains",
            Self::Size => "size",
        }
    }

    /// Look up a function by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError::UnknownFunction` carrying the name as written.
    pub fn resolve(name: &str) -> ExpressionResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ExpressionError::UnknownFunction {
                name: name.to_owned(),
            })
    }

    /// Number of arguments the function takes.
    #[must_use]
    pub fn arity(self) -> Arity {
        match self {
            Self::AttributeExists | Self::AttributeNotExists | Self::Size => Arity(1),
            Self::AttributeType | Self::BeginsWith | Self::Contains => Arity(2),
        }
    }

    /// Fail unless `found` arguments match the arity.
    pub fn check_arity(self, found: usize) -> ExpressionResult<()> {
        let expected = self.arity();
        if expected.0 == found {
            Ok(())
        } else {
            Err(ExpressionError::Arity {
                function: self.as_str().to_owned(),
                expected,
                found,
            })
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
