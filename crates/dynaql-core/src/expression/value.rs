//! Evaluation results.

use std::fmt;

use dynaql_model::AttributeValue;

/// The result of evaluating an expression.
///
/// `Absent` is what a reference to a missing attribute evaluates to. It is a
/// value rather than an error so that `attribute_exists` and friends can tell
/// "not there" apart from a failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The referenced attribute does not exist.
    #[default]
    Absent,
    /// A concrete attribute value.
    Present(AttributeValue),
}

impl Value {
    /// Wrap a boolean as a present `BOOL` value.
    #[must_use]
    pub fn bool(b: bool) -> Self {
        Self::Present(AttributeValue::Bool(b))
    }

    /// True if the referenced attribute was missing.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the boolean if this is a present `BOOL` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.attribute().and_then(AttributeValue::as_bool)
    }

    /// The underlying attribute value, if present.
    #[must_use]
    pub fn attribute(&self) -> Option<&AttributeValue> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }

    /// Consume into the underlying attribute value, if present.
    #[must_use]
    pub fn into_attribute(self) -> Option<AttributeValue> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.attribute()
            .map_or("absent", AttributeValue::type_descriptor)
    }
}

impl From<AttributeValue> for Value {
    fn from(v: AttributeValue) -> Self {
        Self::Present(v)
    }
}

impl From<Option<AttributeValue>> for Value {
    fn from(v: Option<AttributeValue>) -> Self {
        v.map_or(Self::Absent, Self::Present)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("<absent>"),
            Self::Present(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_from_option() {
        assert!(Value::from(None).is_absent());
        assert_eq!(
            Value::from(Some(AttributeValue::Bool(true))).as_bool(),
            Some(true)
        );
    }

    #[test]
    fn test_should_wrap_booleans() {
        assert_eq!(Value::bool(false), Value::Present(AttributeValue::Bool(false)));
        assert!(!Value::bool(true).is_absent());
        assert!(Value::default().is_absent());
    }

    #[test]
    fn test_should_name_types() {
        assert_eq!(Value::Absent.type_name(), "absent");
        assert_eq!(Value::from(AttributeValue::number(3)).type_name(), "N");
        assert_eq!(Value::Absent.to_string(), "<absent>");
    }
}
