//! AST types for condition expressions.
//!
//! The parser produces a [`DynamoExpression`] holding one [`Statement`]. Every
//! node keeps the token that produced it, and every node prints itself back as
//! canonical source through `fmt::Display`: prefix and infix forms are fully
//! parenthesized, calls render as `f(a, b)`, and `BETWEEN` renders without
//! parentheses to match the surface grammar. Re-parsing the printed form
//! yields a tree that prints identically, which is what the tests use as the
//! structural equality check.

use std::collections::HashSet;
use std::fmt;

use super::lexer::quote;
use super::token::Token;

/// Behavior shared by every AST node.
pub trait Node: fmt::Display {
    /// Literal text of the token that anchors this node.
    fn token_literal(&self) -> &str;
}

/// The parse root.
#[derive(Debug, Clone)]
pub struct DynamoExpression {
    /// The single top-level statement.
    pub statement: Statement,
}

impl DynamoExpression {
    /// The root expression, absent when the statement failed to parse.
    #[must_use]
    pub fn expression(&self) -> Option<&Expression> {
        match &self.statement {
            Statement::Expression(stmt) => stmt.expression.as_ref(),
        }
    }
}

impl Node for DynamoExpression {
    fn token_literal(&self) -> &str {
        self.statement.token_literal()
    }
}

impl fmt::Display for DynamoExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.statement.fmt(f)
    }
}

/// Statement forms.
#[derive(Debug, Clone)]
pub enum Statement {
    /// A bare expression.
    Expression(ExpressionStatement),
}

impl Node for Statement {
    fn token_literal(&self) -> &str {
        match self {
            Self::Expression(stmt) => stmt.token_literal(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(stmt) => stmt.fmt(f),
        }
    }
}

/// A statement consisting of one expression.
#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    /// First token of the statement.
    pub token: Token,
    /// The expression; `None` if it could not be parsed.
    pub expression: Option<Expression>,
}

impl Node for ExpressionStatement {
    fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

impl fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expression {
            Some(expr) => expr.fmt(f),
            None => Ok(()),
        }
    }
}

/// Expression forms.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Attribute reference.
    Identifier(Identifier),
    /// Numeric literal.
    Number(NumberLiteral),
    /// String literal.
    String(StringLiteral),
    /// `TRUE` or `FALSE`.
    Boolean(BooleanLiteral),
    /// Unary operator application.
    Prefix(PrefixExpression),
    /// Binary operator application.
    Infix(InfixExpression),
    /// Function call.
    Call(CallExpression),
    /// `left BETWEEN low AND high`.
    Between(BetweenExpression),
}

impl Expression {
    /// Visit this expression and all sub-expressions in source order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        match self {
            Self::Prefix(p) => {
                visit(self);
                p.right.walk(visit);
            }
            Self::Infix(i) => {
                i.left.walk(visit);
                visit(self);
                i.right.walk(visit);
            }
            Self::Call(c) => {
                visit(self);
                for arg in &c.arguments {
                    arg.walk(visit);
                }
            }
            Self::Between(b) => {
                b.left.walk(visit);
                visit(self);
                for bound in b.range.iter() {
                    bound.walk(visit);
                }
            }
            Self::Identifier(_) | Self::Number(_) | Self::String(_) | Self::Boolean(_) => {
                visit(self);
            }
        }
    }

    /// Attribute references in source order. Function names are not included.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&Identifier> {
        let mut out = Vec::new();
        self.walk(&mut |expr| {
            if let Self::Identifier(ident) = expr {
                out.push(ident);
            }
        });
        out
    }

    fn is_between(&self) -> bool {
        matches!(self, Self::Between(_))
    }
}

impl Node for Expression {
    fn token_literal(&self) -> &str {
        match self {
            Self::Identifier(e) => e.token_literal(),
            Self::Number(e) => e.token_literal(),
            Self::String(e) => e.token_literal(),
            Self::Boolean(e) => e.token_literal(),
            Self::Prefix(e) => e.token_literal(),
            Self::Infix(e) => e.token_literal(),
            Self::Call(e) => e.token_literal(),
            Self::Between(e) => e.token_literal(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(e) => e.fmt(f),
            Self::Number(e) => e.fmt(f),
            Self::String(e) => e.fmt(f),
            Self::Boolean(e) => e.fmt(f),
            Self::Prefix(e) => e.fmt(f),
            Self::Infix(e) => e.fmt(f),
            Self::Call(e) => e.fmt(f),
            Self::Between(e) => e.fmt(f),
        }
    }
}

/// Prints an operand, grouping a bare `BETWEEN` that would otherwise re-parse
/// with different binding.
struct Grouped<'a>(&'a Expression);

impl fmt::Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_between() {
            write!(f, "({})", self.0)
        } else {
            self.0.fmt(f)
        }
    }
}

macro_rules! token_node {
    ($name:ident) => {
        impl Node for $name {
            fn token_literal(&self) -> &str {
                &self.token.literal
            }
        }
    };
}

/// A bare attribute name, `#name` / `:value` placeholder, or dotted path.
#[derive(Debug, Clone)]
pub struct Identifier {
    /// The identifier token.
    pub token: Token,
    /// The name as written.
    pub value: String,
}

impl Identifier {
    /// Returns `true` for `#name` placeholders.
    #[must_use]
    pub fn is_name_placeholder(&self) -> bool {
        self.value.starts_with('#')
    }

    /// Returns `true` for `:value` placeholders.
    #[must_use]
    pub fn is_value_placeholder(&self) -> bool {
        self.value.starts_with(':')
    }
}

token_node!(Identifier);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A numeric literal, kept in its source form.
#[derive(Debug, Clone)]
pub struct NumberLiteral {
    /// The number token.
    pub token: Token,
    /// The digits as written.
    pub value: String,
}

token_node!(NumberLiteral);

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A string literal with escapes decoded.
#[derive(Debug, Clone)]
pub struct StringLiteral {
    /// The string token.
    pub token: Token,
    /// The decoded contents.
    pub value: String,
}

token_node!(StringLiteral);

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.value))
    }
}

/// A `TRUE` or `FALSE` literal.
#[derive(Debug, Clone)]
pub struct BooleanLiteral {
    /// The keyword token.
    pub token: Token,
    /// The literal's truth value.
    pub value: bool,
}

token_node!(BooleanLiteral);

impl fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.value { "TRUE" } else { "FALSE" })
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// Logical negation (`NOT`).
    Not,
    /// Arithmetic negation (`-`).
    Negate,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => write!(f, "NOT"),
            Self::Negate => write!(f, "-"),
        }
    }
}

/// A prefix operator applied to one operand: `(NOT a)`, `(-a)`.
#[derive(Debug, Clone)]
pub struct PrefixExpression {
    /// The operator token.
    pub token: Token,
    /// The unary operator.
    pub operator: PrefixOperator,
    /// The operand.
    pub right: Box<Expression>,
}

token_node!(PrefixExpression);

impl fmt::Display for PrefixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            // Word operators need a separator or they fuse with the operand.
            PrefixOperator::Not => write!(f, "(NOT {})", self.right),
            PrefixOperator::Negate => write!(f, "(-{})", Grouped(&self.right)),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
}

impl InfixOperator {
    /// Returns `true` for `AND` and `OR`.
    #[must_use]
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Sub => "-",
        };
        f.write_str(s)
    }
}

/// A binary operator applied to two operands: `(left op right)`.
#[derive(Debug, Clone)]
pub struct InfixExpression {
    /// The operator token.
    pub token: Token,
    /// Left operand.
    pub left: Box<Expression>,
    /// The binary operator.
    pub operator: InfixOperator,
    /// Right operand.
    pub right: Box<Expression>,
}

token_node!(InfixExpression);

impl fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_logical() {
            write!(f, "({} {} {})", self.left, self.operator, self.right)
        } else {
            write!(
                f,
                "({} {} {})",
                Grouped(&self.left),
                self.operator,
                Grouped(&self.right)
            )
        }
    }
}

/// A call of a named function with ordered arguments.
#[derive(Debug, Clone)]
pub struct CallExpression {
    /// The `(` token.
    pub token: Token,
    /// The function name as written.
    pub function: Identifier,
    /// Arguments in call order.
    pub arguments: Vec<Expression>,
}

token_node!(CallExpression);

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// Range test `left BETWEEN range[0] AND range[1]`.
///
/// The bounds are kept in textual order; nothing guarantees
/// `range[0] <= range[1]`.
#[derive(Debug, Clone)]
pub struct BetweenExpression {
    /// The `BETWEEN` token.
    pub token: Token,
    /// The value being tested.
    pub left: Box<Expression>,
    /// Inclusive lower and upper bounds.
    pub range: Box<[Expression; 2]>,
}

token_node!(BetweenExpression);

impl fmt::Display for BetweenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [low, high] = &*self.range;
        write!(
            f,
            "{} BETWEEN {} AND {}",
            Grouped(&self.left),
            Grouped(low),
            Grouped(high)
        )
    }
}

// ---------------------------------------------------------------------------
// Placeholder collection
// ---------------------------------------------------------------------------

/// Collect every `#name` placeholder referenced by `expr`, including the ones
/// embedded in dotted paths.
#[allow(clippy::implicit_hasher)]
pub fn collect_names(expr: &Expression, names: &mut HashSet<String>) {
    for ident in expr.identifiers() {
        for segment in ident.value.split('.') {
            if segment.starts_with('#') {
                names.insert(segment.to_owned());
            }
        }
    }
}

/// Collect every `:value` placeholder referenced by `expr`.
#[allow(clippy::implicit_hasher)]
pub fn collect_values(expr: &Expression, values: &mut HashSet<String>) {
    for ident in expr.identifiers() {
        if ident.is_value_placeholder() {
            values.insert(ident.value.clone());
        }
    }
}
