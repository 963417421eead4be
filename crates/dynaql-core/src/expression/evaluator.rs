//! Expression evaluator.
//!
//! Walks a parsed tree against an [`Environment`]: the item being tested plus
//! the `#name` and `:value` substitution maps. Evaluation produces a [`Value`];
//! references to missing attributes produce [`Value::Absent`] instead of an
//! error, and every comparison against an absent operand is `false`.

use std::collections::HashMap;
use std::str::FromStr;

use dynaql_model::{AttributeValue, Item};
use rust_decimal::Decimal;
use tracing::debug;

use super::ast::{
    BetweenExpression, CallExpression, DynamoExpression, Expression, Identifier,
    InfixExpression, InfixOperator, PrefixExpression, PrefixOperator,
};
use super::functions::FunctionName;
use super::parser::parse;
use super::value::Value;
use crate::config::ExpressionConfig;
use crate::error::{ExpressionError, ExpressionResult};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Everything an expression can refer to.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    /// The item under test.
    pub item: Item,
    /// Expression attribute name substitutions (`#name` -> attribute name).
    pub names: HashMap<String, String>,
    /// Expression attribute value substitutions (`:val` -> value).
    pub values: HashMap<String, AttributeValue>,
}

impl Environment {
    /// An environment over `item` with no substitutions.
    #[must_use]
    pub fn new(item: Item) -> Self {
        Self {
            item,
            ..Self::default()
        }
    }

    /// Add a `#name` substitution.
    #[must_use]
    pub fn with_name(mut self, placeholder: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), name.into());
        self
    }

    /// Add a `:value` substitution.
    #[must_use]
    pub fn with_value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.values.insert(placeholder.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluates expressions against one environment.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    env: &'a Environment,
}

impl<'a> Evaluator<'a> {
    /// Bind an evaluator to `env`.
    #[must_use]
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Evaluate a parse root.
    ///
    /// # Errors
    ///
    /// Fails if the root holds no expression or if evaluation fails.
    pub fn evaluate_root(&self, root: &DynamoExpression) -> ExpressionResult<Value> {
        let expr = root.expression().ok_or_else(|| {
            ExpressionError::invalid_operand("evaluation", "expression failed to parse")
        })?;
        self.evaluate(expr)
    }

    /// Evaluate an expression to a value.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError` on unresolved placeholders, incompatible
    /// operand types, unknown functions, or wrong argument counts.
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Identifier(ident) => self.resolve_identifier(ident),
            Expression::Number(n) => Ok(AttributeValue::N(n.value.clone()).into()),
            Expression::String(s) => Ok(AttributeValue::S(s.value.clone()).into()),
            Expression::Boolean(b) => Ok(Value::bool(b.value)),
            Expression::Prefix(prefix) => self.eval_prefix(prefix),
            Expression::Infix(infix) if infix.operator.is_logical() => self.eval_logical(infix),
            Expression::Infix(infix) if infix.operator.is_comparison() => {
                self.eval_compare(infix)
            }
            Expression::Infix(infix) => self.eval_arithmetic(infix),
            Expression::Call(call) => self.eval_call(call),
            Expression::Between(between) => self.eval_between(between),
        }
    }

    /// Evaluate an expression that must produce a boolean.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for a non-boolean result, or any error from
    /// [`Evaluator::evaluate`].
    pub fn evaluate_condition(&self, expr: &Expression) -> ExpressionResult<bool> {
        let value = self.evaluate(expr)?;
        value.as_bool().ok_or_else(|| {
            ExpressionError::type_mismatch(format!(
                "condition must evaluate to BOOL, found {}",
                value.type_name()
            ))
        })
    }

    fn eval_prefix(&self, prefix: &PrefixExpression) -> ExpressionResult<Value> {
        let operand = self.evaluate(&prefix.right)?;
        match prefix.operator {
            PrefixOperator::Not => operand.as_bool().map(|b| Value::bool(!b)).ok_or_else(|| {
                ExpressionError::type_mismatch(format!(
                    "NOT requires a BOOL operand, found {}",
                    operand.type_name()
                ))
            }),
            PrefixOperator::Negate => {
                let Some(attr) = operand.attribute() else {
                    return Err(ExpressionError::invalid_operand(
                        "-",
                        "operand refers to a missing attribute",
                    ));
                };
                let Some(n) = attr.as_n() else {
                    return Err(ExpressionError::type_mismatch(format!(
                        "negation requires a number, found {}",
                        attr.type_descriptor()
                    )));
                };
                Ok(AttributeValue::N(format_number(-parse_number(n)?)).into())
            }
        }
    }

    fn eval_logical(&self, infix: &InfixExpression) -> ExpressionResult<Value> {
        let left = self.boolean_operand(&infix.left, infix.operator)?;
        match (infix.operator, left) {
            (InfixOperator::And, false) => return Ok(Value::bool(false)),
            (InfixOperator::Or, true) => return Ok(Value::bool(true)),
            _ => {}
        }
        self.boolean_operand(&infix.right, infix.operator)
            .map(Value::bool)
    }

    fn boolean_operand(&self, expr: &Expression, op: InfixOperator) -> ExpressionResult<bool> {
        let value = self.evaluate(expr)?;
        value.as_bool().ok_or_else(|| {
            ExpressionError::type_mismatch(format!(
                "{op} requires BOOL operands, found {}",
                value.type_name()
            ))
        })
    }

    fn eval_compare(&self, infix: &InfixExpression) -> ExpressionResult<Value> {
        let lval = self.evaluate(&infix.left)?;
        let rval = self.evaluate(&infix.right)?;

        let (Some(lv), Some(rv)) = (lval.attribute(), rval.attribute()) else {
            // Comparing against a missing attribute is false, not an error.
            return Ok(Value::bool(false));
        };

        compare_values(lv, rv, infix.operator).map(Value::bool)
    }

    fn eval_arithmetic(&self, infix: &InfixExpression) -> ExpressionResult<Value> {
        let lval = self.evaluate(&infix.left)?;
        let rval = self.evaluate(&infix.right)?;

        let (Some(lv), Some(rv)) = (lval.attribute(), rval.attribute()) else {
            return Err(ExpressionError::invalid_operand(
                &infix.operator.to_string(),
                "operand refers to a missing attribute",
            ));
        };

        numeric_arithmetic(lv, rv, infix.operator == InfixOperator::Add).map(Value::from)
    }

    fn eval_between(&self, between: &BetweenExpression) -> ExpressionResult<Value> {
        let [low, high] = &*between.range;
        let v = self.evaluate(&between.left)?;
        let lo = self.evaluate(low)?;
        let hi = self.evaluate(high)?;

        let (Some(v), Some(lo), Some(hi)) = (v.attribute(), lo.attribute(), hi.attribute()) else {
            return Ok(Value::bool(false));
        };

        match (v, lo, hi) {
            (AttributeValue::N(_), AttributeValue::N(_), AttributeValue::N(_))
            | (AttributeValue::S(_), AttributeValue::S(_), AttributeValue::S(_)) => {
                // Bounds are taken in textual order; a reversed range is empty.
                let ge_low = compare_values(v, lo, InfixOperator::Ge)?;
                let le_high = compare_values(v, hi, InfixOperator::Le)?;
                Ok(Value::bool(ge_low && le_high))
            }
            _ => Err(ExpressionError::type_mismatch(format!(
                "BETWEEN requires N or S operands of one type, found {} BETWEEN {} AND {}",
                v.type_descriptor(),
                lo.type_descriptor(),
                hi.type_descriptor()
            ))),
        }
    }

    fn eval_call(&self, call: &CallExpression) -> ExpressionResult<Value> {
        let function = FunctionName::resolve(&call.function.value)?;
        function.check_arity(call.arguments.len())?;
        let args = call.arguments.as_slice();

        match function {
            FunctionName::AttributeExists => {
                let attr = self.path_argument(&args[0], function)?;
                Ok(Value::bool(!attr.is_absent()))
            }
            FunctionName::AttributeNotExists => {
                let attr = self.path_argument(&args[0], function)?;
                Ok(Value::bool(attr.is_absent()))
            }
            FunctionName::AttributeType => {
                let attr = self.path_argument(&args[0], function)?;
                let type_val = self.evaluate(&args[1])?;
                let Some(AttributeValue::S(expected_type)) = type_val.attribute() else {
                    return Err(ExpressionError::type_mismatch(
                        "attribute_type second argument must be a string",
                    ));
                };
                if !AttributeValue::is_type_descriptor(expected_type) {
                    return Err(ExpressionError::invalid_operand(
                        function.as_str(),
                        format!("unknown attribute type '{expected_type}'"),
                    ));
                }
                Ok(Value::bool(
                    attr.attribute()
                        .is_some_and(|v| v.type_descriptor() == expected_type),
                ))
            }
            FunctionName::BeginsWith => {
                let attr = self.path_argument(&args[0], function)?;
                let prefix_val = self.evaluate(&args[1])?;
                let Some(s) = attr.attribute().and_then(AttributeValue::as_s) else {
                    return Ok(Value::bool(false));
                };
                let Some(AttributeValue::S(prefix)) = prefix_val.attribute() else {
                    return Err(ExpressionError::type_mismatch(
                        "begins_with prefix must be a string",
                    ));
                };
                Ok(Value::bool(s.starts_with(prefix.as_str())))
            }
            FunctionName::Contains => {
                let attr = self.path_argument(&args[0], function)?;
                let search = self.evaluate(&args[1])?;
                let (Some(attr), Some(search)) = (attr.attribute(), search.attribute()) else {
                    return Ok(Value::bool(false));
                };
                Ok(Value::bool(contains(attr, search)))
            }
            FunctionName::Size => {
                let attr = self.path_argument(&args[0], function)?;
                match attr.attribute() {
                    None => Ok(Value::Absent),
                    Some(v) => {
                        let size = attribute_size(v)?;
                        Ok(AttributeValue::N(size.to_string()).into())
                    }
                }
            }
        }
    }

    /// Resolve a function argument that must name an attribute.
    fn path_argument(&self, arg: &Expression, function: FunctionName) -> ExpressionResult<Value> {
        match arg {
            Expression::Identifier(ident) if !ident.is_value_placeholder() => {
                self.resolve_identifier(ident)
            }
            _ => Err(ExpressionError::invalid_operand(
                function.as_str(),
                format!("argument must be an attribute path, found {arg}"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Operand resolution
// ---------------------------------------------------------------------------

impl<'a> Evaluator<'a> {
    /// Resolve an identifier: `:value` placeholders through the value map,
    /// everything else as a document path.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedValue` or `UnresolvedName` for unknown placeholders.
    pub fn resolve_identifier(&self, ident: &Identifier) -> ExpressionResult<Value> {
        if ident.is_value_placeholder() {
            return self
                .env
                .values
                .get(&ident.value)
                .cloned()
                .map(Value::Present)
                .ok_or_else(|| ExpressionError::UnresolvedValue {
                    name: ident.value.clone(),
                });
        }
        Ok(self.resolve_path(&ident.value)?.cloned().into())
    }

    /// Walk a dotted document path against the item, substituting `#name`
    /// segments through the names map.
    ///
    /// # Errors
    ///
    /// Returns `UnresolvedName` if a `#name` segment has no substitution.
    pub fn resolve_path(&self, path: &str) -> ExpressionResult<Option<&'a AttributeValue>> {
        let keys = path
            .split('.')
            .map(|segment| self.resolve_name(segment))
            .collect::<ExpressionResult<Vec<_>>>()?;

        let mut current: Option<&'a AttributeValue> = None;
        for (i, key) in keys.into_iter().enumerate() {
            current = if i == 0 {
                self.env.item.get(key)
            } else {
                current.and_then(AttributeValue::as_m).and_then(|m| m.get(key))
            };
            if current.is_none() {
                break;
            }
        }
        Ok(current)
    }

    fn resolve_name<'s>(&self, segment: &'s str) -> ExpressionResult<&'s str>
    where
        'a: 's,
    {
        if !segment.starts_with('#') {
            return Ok(segment);
        }
        self.env
            .names
            .get(segment)
            .map(String::as_str)
            .ok_or_else(|| ExpressionError::UnresolvedName {
                name: segment.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// End-to-end evaluation
// ---------------------------------------------------------------------------

/// Result of evaluating source text: a value, or the diagnostics explaining
/// why there is none.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The result, present when evaluation succeeded.
    pub value: Option<Value>,
    /// Every lexical, syntax, or evaluation error encountered.
    pub diagnostics: Vec<ExpressionError>,
}

impl Evaluation {
    fn failed(diagnostics: Vec<ExpressionError>) -> Self {
        Self {
            value: None,
            diagnostics,
        }
    }

    /// Returns `true` when a value was produced.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }

    /// Convert into a `Result`, keeping the first diagnostic on failure.
    ///
    /// # Errors
    ///
    /// Returns `Diagnostics` when several syntax errors were found, otherwise
    /// the single error.
    pub fn into_result(self) -> ExpressionResult<Value> {
        if let Some(value) = self.value {
            return Ok(value);
        }
        let mut diagnostics = self.diagnostics;
        if diagnostics.len() == 1 {
            return Err(diagnostics.remove(0));
        }
        let errors = diagnostics
            .iter()
            .flat_map(|d| d.parse_errors().iter().cloned())
            .collect();
        Err(ExpressionError::Diagnostics(errors))
    }
}

/// Parse `source` and evaluate it against `env`, collecting every diagnostic.
#[must_use]
pub fn evaluate_source(source: &str, env: &Environment, config: &ExpressionConfig) -> Evaluation {
    let outcome = match parse(source, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            debug!(error = %err, "expression failed to compile");
            return Evaluation::failed(vec![err]);
        }
    };

    if !outcome.is_clean() {
        debug!(errors = outcome.errors.len(), "expression has syntax errors");
        return Evaluation::failed(
            outcome
                .errors
                .into_iter()
                .map(ExpressionError::Parse)
                .collect(),
        );
    }

    match Evaluator::new(env).evaluate_root(&outcome.expression) {
        Ok(value) => Evaluation {
            value: Some(value),
            diagnostics: Vec::new(),
        },
        Err(err) => {
            debug!(error = %err, "expression failed to evaluate");
            Evaluation::failed(vec![err])
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Compare two values with a comparison operator.
///
/// Numbers and strings are ordered; every other type supports only `=` and
/// `<>`. Values of different types are not comparable.
fn compare_values(
    left: &AttributeValue,
    right: &AttributeValue,
    op: InfixOperator,
) -> ExpressionResult<bool> {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            let da = parse_number(a)?;
            let db = parse_number(b)?;
            Ok(compare_ord(&da, &db, op))
        }
        (AttributeValue::S(a), AttributeValue::S(b)) => Ok(compare_ord(a, b, op)),
        (l, r) if l.type_descriptor() == r.type_descriptor() => match op {
            InfixOperator::Eq => Ok(values_equal(l, r)),
            InfixOperator::Ne => Ok(!values_equal(l, r)),
            _ => Err(ExpressionError::type_mismatch(format!(
                "operator {op} cannot order {} values",
                l.type_descriptor()
            ))),
        },
        (l, r) => Err(ExpressionError::type_mismatch(format!(
            "cannot compare {} with {}",
            l.type_descriptor(),
            r.type_descriptor()
        ))),
    }
}

/// Equality by value: numbers compare numerically, sets ignore member order,
/// and lists and maps compare element-wise. Values of different types are
/// never equal.
fn values_equal(left: &AttributeValue, right: &AttributeValue) -> bool {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => numbers_equal(a, b),
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) => same_members(a, b),
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            same_members(&canonical_numbers(a), &canonical_numbers(b))
        }
        (AttributeValue::Bs(a), AttributeValue::Bs(b)) => same_members(a, b),
        (AttributeValue::L(a), AttributeValue::L(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (AttributeValue::M(a), AttributeValue::M(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => left == right,
    }
}

/// Numeric equality, falling back to the text when either side is not a
/// valid number.
fn numbers_equal(a: &str, b: &str) -> bool {
    match (parse_number(a), parse_number(b)) {
        (Ok(da), Ok(db)) => da == db,
        _ => a == b,
    }
}

fn canonical_numbers(members: &[String]) -> Vec<String> {
    members
        .iter()
        .map(|m| parse_number(m).map_or_else(|_| m.clone(), format_number))
        .collect()
}

fn same_members<T: Ord + Clone>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Generic ordered comparison.
fn compare_ord<T: Ord + ?Sized>(a: &T, b: &T, op: InfixOperator) -> bool {
    match op {
        InfixOperator::Eq => a == b,
        InfixOperator::Ne => a != b,
        InfixOperator::Lt => a < b,
        InfixOperator::Le => a <= b,
        InfixOperator::Gt => a > b,
        InfixOperator::Ge => a >= b,
        InfixOperator::And | InfixOperator::Or | InfixOperator::Add | InfixOperator::Sub => false,
    }
}

/// Parse a number string as an exact decimal. Plain (`-1.25`) and scientific
/// (`1.5e3`) notation are accepted.
fn parse_number(s: &str) -> ExpressionResult<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| ExpressionError::type_mismatch(format!("'{s}' is not a valid number")))
}

/// Perform numeric addition or subtraction.
fn numeric_arithmetic(
    a: &AttributeValue,
    b: &AttributeValue,
    is_add: bool,
) -> ExpressionResult<AttributeValue> {
    let (AttributeValue::N(na), AttributeValue::N(nb)) = (a, b) else {
        return Err(ExpressionError::type_mismatch(format!(
            "arithmetic requires number operands, found {} and {}",
            a.type_descriptor(),
            b.type_descriptor()
        )));
    };
    let da = parse_number(na)?;
    let db = parse_number(nb)?;
    let result = if is_add {
        da.checked_add(db)
    } else {
        da.checked_sub(db)
    };
    let result = result.ok_or_else(|| {
        ExpressionError::invalid_operand(
            if is_add { "+" } else { "-" },
            format!("{na} and {nb} overflow the number range"),
        )
    })?;
    Ok(AttributeValue::N(format_number(result)))
}

/// Format a number without trailing zeros (`2.50` becomes `2.5`, `-0` becomes `0`).
fn format_number(d: Decimal) -> String {
    d.normalize().to_string()
}

/// Length reported by `size()`.
fn attribute_size(val: &AttributeValue) -> ExpressionResult<usize> {
    match val {
        AttributeValue::S(s) => Ok(s.len()),
        AttributeValue::B(b) => Ok(b.len()),
        AttributeValue::Ss(v) | AttributeValue::Ns(v) => Ok(v.len()),
        AttributeValue::Bs(v) => Ok(v.len()),
        AttributeValue::L(v) => Ok(v.len()),
        AttributeValue::M(m) => Ok(m.len()),
        AttributeValue::N(_) | AttributeValue::Bool(_) | AttributeValue::Null(_) => {
            Err(ExpressionError::type_mismatch(format!(
                "size() is not defined for {}",
                val.type_descriptor()
            )))
        }
    }
}

/// `contains()`: substring, set membership, or list element.
fn contains(attr: &AttributeValue, search: &AttributeValue) -> bool {
    match (attr, search) {
        (AttributeValue::S(s), AttributeValue::S(sub)) => s.contains(sub.as_str()),
        (AttributeValue::Ss(set), AttributeValue::S(val)) => set.contains(val),
        (AttributeValue::Ns(set), AttributeValue::N(val)) => {
            set.iter().any(|member| numbers_equal(member, val))
        }
        (AttributeValue::Bs(set), AttributeValue::B(val)) => set.contains(val),
        (AttributeValue::L(list), _) => list.iter().any(|element| values_equal(element, search)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parser::parse_condition;

    fn env() -> Environment {
        serde_json::from_str(
            r##"{
                "item": {
                    "name": {"S": "Alice"},
                    "age": {"N": "30"},
                    "active": {"BOOL": true},
                    "tags": {"SS": ["red", "blue"]},
                    "scores": {"L": [{"N": "1"}, {"N": "2"}]},
                    "info": {"M": {"rating": {"N": "4.5"}, "city": {"S": "Oslo"}}},
                    "nothing": {"NULL": true}
                },
                "names": {"#n": "name", "#r": "rating"},
                "values": {":min": {"N": "18"}, ":who": {"S": "Alice"}, ":pre": {"S": "Al"}}
            }"##,
        )
        .unwrap()
    }

    fn eval(input: &str) -> ExpressionResult<Value> {
        let env = env();
        let expr = parse_condition(input).unwrap();
        Evaluator::new(&env).evaluate_root(&expr)
    }

    fn check(input: &str) -> bool {
        eval(input).unwrap().as_bool().unwrap()
    }

    #[test]
    fn test_should_evaluate_equality() {
        assert!(check("#n = :who"));
        assert!(check("name = 'Alice'"));
        assert!(!check("name <> :who"));
    }

    #[test]
    fn test_should_evaluate_numeric_comparison() {
        assert!(check("age > :min"));
        assert!(check("age >= 30 AND age <= 30"));
        assert!(check("info.#r < 5"));
        assert!(check("age = 30.0"));
    }

    #[test]
    fn test_should_compare_strings_lexicographically() {
        assert!(check("name < 'Bob'"));
        assert!(check("info.city > 'London'"));
    }

    #[test]
    fn test_should_short_circuit_and() {
        assert!(eval("TRUE AND (age < 'x')").is_err());
        assert!(!check("FALSE AND (age < 'x')"));
    }

    #[test]
    fn test_should_short_circuit_or() {
        assert!(eval("FALSE OR (age < 'x')").is_err());
        assert!(check("TRUE OR (age < 'x')"));
    }

    #[test]
    fn test_should_treat_reversed_between_as_empty() {
        assert!(!check("5 BETWEEN 10 AND 1"));
        assert!(check("5 BETWEEN 1 AND 10"));
        assert!(check("age BETWEEN :min AND 30"));
        assert!(check("name BETWEEN 'A' AND 'B'"));
    }

    #[test]
    fn test_should_reject_mixed_between_types() {
        assert!(matches!(
            eval("age BETWEEN 'a' AND 'z'"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        assert!(!check("missing BETWEEN 1 AND 2"));
    }

    #[test]
    fn test_should_fail_on_unknown_function() {
        assert_eq!(
            eval("foo(x)").unwrap_err(),
            ExpressionError::UnknownFunction {
                name: "foo".to_owned()
            }
        );
    }

    #[test]
    fn test_should_fail_on_wrong_arity() {
        assert!(matches!(
            eval("begins_with(name)"),
            Err(ExpressionError::Arity { found: 1, .. })
        ));
    }

    #[test]
    fn test_should_yield_absent_for_missing_attribute() {
        assert!(eval("missing").unwrap().is_absent());
        assert!(eval("info.missing.deeper").unwrap().is_absent());
        assert!(!check("attribute_exists(missing)"));
        assert!(check("attribute_not_exists(missing)"));
        assert!(check("attribute_exists(info.#r)"));
    }

    #[test]
    fn test_should_compare_absent_as_false() {
        assert!(!check("missing = 1"));
        assert!(!check("missing <> 1"));
    }

    #[test]
    fn test_should_reject_cross_type_comparison() {
        assert!(matches!(
            eval("age = 'thirty'"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_only_test_equality_for_unordered_types() {
        assert!(check("active = TRUE"));
        assert!(matches!(
            eval("active < TRUE"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_require_boolean_for_not_and_logic() {
        assert!(check("NOT (age < 10)"));
        assert!(matches!(eval("NOT age"), Err(ExpressionError::TypeMismatch { .. })));
        assert!(matches!(eval("age AND TRUE"), Err(ExpressionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_should_evaluate_arithmetic() {
        assert!(check("age + 1 = 31"));
        assert!(check("age - :min = 12"));
        assert!(check("-age < 0"));
        assert_eq!(
            eval("1.5 + 1.25").unwrap(),
            Value::from(AttributeValue::number("2.75"))
        );
        assert!(matches!(
            eval("missing + 1"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
        assert!(matches!(eval("name + 1"), Err(ExpressionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_should_evaluate_begins_with() {
        assert!(check("begins_with(name, :pre)"));
        assert!(!check("begins_with(name, 'Bo')"));
        assert!(!check("begins_with(age, 'Bo')"));
        assert!(matches!(
            eval("begins_with(name, 1)"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_evaluate_contains() {
        assert!(check("contains(name, 'lic')"));
        assert!(check("contains(tags, 'red')"));
        assert!(!check("contains(tags, 'green')"));
        assert!(check("contains(scores, 2)"));
        assert!(!check("contains(missing, 'x')"));
    }

    #[test]
    fn test_should_evaluate_size() {
        assert!(check("size(name) = 5"));
        assert!(check("size(tags) = 2"));
        assert!(check("size(info) > 1"));
        assert!(eval("size(missing)").unwrap().is_absent());
        assert!(matches!(eval("size(age)"), Err(ExpressionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_should_evaluate_attribute_type() {
        assert!(check("attribute_type(age, 'N')"));
        assert!(check("attribute_type(nothing, 'NULL')"));
        assert!(!check("attribute_type(name, 'N')"));
        assert!(matches!(
            eval("attribute_type(age, 'NUMBER')"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_should_require_path_arguments() {
        assert!(matches!(
            eval("attribute_exists(:min)"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
        assert!(matches!(
            eval("size('abc')"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_should_match_function_names_case_insensitively() {
        assert!(check("ATTRIBUTE_EXISTS(name)"));
    }

    #[test]
    fn test_should_report_unresolved_placeholders() {
        assert_eq!(
            eval("#missing = 1").unwrap_err(),
            ExpressionError::UnresolvedName {
                name: "#missing".to_owned()
            }
        );
        assert_eq!(
            eval("name = :missing").unwrap_err(),
            ExpressionError::UnresolvedValue {
                name: ":missing".to_owned()
            }
        );
    }

    #[test]
    fn test_should_compare_sets_ignoring_order() {
        let env = Environment::new(Item::from([(
            "tags".to_owned(),
            AttributeValue::Ss(vec!["a".to_owned(), "b".to_owned()]),
        )]))
        .with_value(":t", AttributeValue::Ss(vec!["b".to_owned(), "a".to_owned()]));
        let expr = parse_condition("tags = :t").unwrap();
        let evaluator = Evaluator::new(&env);
        assert!(
            evaluator
                .evaluate_condition(expr.expression().unwrap())
                .unwrap()
        );
    }

    #[test]
    fn test_should_compare_numbers_exactly() {
        assert!(!check("0.00000000000000001 = 0.00000000000000002"));
        assert!(check("0.00000000000000001 <> 0.00000000000000002"));
        assert!(check("0.00000000000000001 < 0.00000000000000002"));
        assert!(check("0.1 + 0.2 = 0.3"));
        assert!(check("0.1 + 0.2 <= 0.3"));
        assert!(check("0.1 + 0.2 BETWEEN 0 AND 0.3"));
        assert_eq!(
            eval("2.50 - 0.5").unwrap(),
            Value::from(AttributeValue::number("2"))
        );
    }

    #[test]
    fn test_should_accept_scientific_notation_in_values() {
        let env =
            Environment::new(Item::new()).with_value(":k", AttributeValue::number("1.5e3"));
        let expr = parse_condition(":k = 1500").unwrap();
        assert!(
            Evaluator::new(&env)
                .evaluate_condition(expr.expression().unwrap())
                .unwrap()
        );
    }

    #[test]
    fn test_should_match_numbers_by_value() {
        let env = Environment::new(Item::from([
            (
                "nums".to_owned(),
                AttributeValue::Ns(vec!["1".to_owned(), "2.50".to_owned()]),
            ),
            (
                "list".to_owned(),
                AttributeValue::L(vec![AttributeValue::number("3"), AttributeValue::string("x")]),
            ),
        ]))
        .with_value(
            ":same",
            AttributeValue::Ns(vec!["2.5".to_owned(), "1.0".to_owned()]),
        );
        let evaluator = Evaluator::new(&env);
        let cases = [
            ("contains(nums, 1.0)", true),
            ("contains(nums, 2.5)", true),
            ("contains(nums, 3)", false),
            ("contains(list, 3.00)", true),
            ("contains(list, 'x')", true),
            ("contains(list, 4)", false),
            ("nums = :same", true),
        ];
        for (input, expected) in cases {
            let expr = parse_condition(input).unwrap();
            assert_eq!(
                evaluator
                    .evaluate_condition(expr.expression().unwrap())
                    .unwrap(),
                expected,
                "{input}"
            );
        }
    }

    #[test]
    fn test_should_require_boolean_condition() {
        let env = env();
        let expr = parse_condition("age").unwrap();
        assert!(matches!(
            Evaluator::new(&env).evaluate_condition(expr.expression().unwrap()),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_should_evaluate_source_end_to_end() {
        let env = env();
        let config = ExpressionConfig::default();

        let ok = evaluate_source("#n = :who AND age > :min", &env, &config);
        assert!(ok.is_ok());
        assert_eq!(ok.value, Some(Value::bool(true)));

        let bad = evaluate_source("a = = 1 AND b < )", &env, &config);
        assert!(!bad.is_ok());
        assert_eq!(bad.diagnostics.len(), 2);
        assert!(matches!(
            bad.clone().into_result(),
            Err(ExpressionError::Diagnostics(ref errors)) if errors.len() == 2
        ));

        let lex = evaluate_source("a = @", &env, &config);
        assert_eq!(
            lex.diagnostics,
            vec![ExpressionError::Lex {
                offset: 4,
                found: '@'
            }]
        );
    }
}
