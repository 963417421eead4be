//! Pratt parser for condition expressions.
//!
//! Binding power, lowest to highest:
//!
//! | level     | operators                          | associativity |
//! |-----------|------------------------------------|---------------|
//! | `Or`      | `OR`                               | left          |
//! | `And`     | `AND`                              | left          |
//! | `Not`     | prefix `NOT`                       | right         |
//! | `Compare` | `=` `<>` `<` `<=` `>` `>=` `BETWEEN` | none        |
//! | `Sum`     | `+` `-`                            | left          |
//! | `Prefix`  | prefix `-`                         | right         |
//! | `Call`    | `(` after an identifier            | left          |
//!
//! Parsing is error tolerant. A syntax error is recorded, the parser skips to
//! the next `AND`/`OR` (the statement boundary of this language), and parsing
//! resumes there so that later, independent errors are reported by the same
//! call. Only the first statement becomes the tree; the ones parsed after a
//! recovery exist to surface diagnostics.

use tracing::{debug, trace};

use super::ast::{
    BetweenExpression, BooleanLiteral, CallExpression, DynamoExpression, Expression,
    ExpressionStatement, Identifier, InfixExpression, InfixOperator, NumberLiteral,
    PrefixExpression, PrefixOperator, Statement, StringLiteral,
};
use super::lexer::{Lexer, unquote};
use super::token::{Token, TokenKind};
use crate::config::ExpressionConfig;
use crate::error::{ExpressionError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Not,
    Compare,
    Sum,
    Prefix,
    Call,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Or => Self::Or,
            TokenKind::And => Self::And,
            TokenKind::Between => Self::Compare,
            k if k.is_comparison() => Self::Compare,
            TokenKind::Plus | TokenKind::Minus => Self::Sum,
            TokenKind::LParen => Self::Call,
            _ => Self::Lowest,
        }
    }
}

/// How a production failed.
#[derive(Debug)]
enum Failure {
    /// Recorded; the parser resynchronizes and continues.
    Syntax(ParseError),
    /// Recorded; no further input is parsed.
    Halt(ParseError),
    /// Aborts the whole parse.
    Fatal(ExpressionError),
}

type ParseResult<T> = Result<T, Failure>;

/// The tree produced by a parse together with every syntax error found.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The (possibly partial) tree.
    pub expression: DynamoExpression,
    /// Syntax errors in source order.
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    /// Returns `true` when no syntax errors were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The tree if the parse was clean.
    ///
    /// # Errors
    ///
    /// Returns `ExpressionError::Diagnostics` carrying every syntax error.
    pub fn into_result(self) -> Result<DynamoExpression, ExpressionError> {
        if self.errors.is_empty() {
            Ok(self.expression)
        } else {
            Err(ExpressionError::Diagnostics(self.errors))
        }
    }
}

/// Parser over a lexed token stream.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
    max_errors: usize,
    errors: Vec<ParseError>,
    halted: bool,
}

impl Parser {
    /// Create a parser. A trailing `Eof` token is added if missing.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>, config: &ExpressionConfig) -> Self {
        if !tokens.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            let end = tokens
                .last()
                .map_or(0, |t| t.offset + t.literal.len());
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: config.max_depth,
            max_errors: config.max_errors,
            errors: Vec::new(),
            halted: false,
        }
    }

    /// Parse the token stream into a tree plus diagnostics.
    ///
    /// # Errors
    ///
    /// Returns a terminal error when nesting exceeds the depth limit or more
    /// syntax errors than the configured maximum are found.
    pub fn parse(mut self) -> Result<ParseOutcome, ExpressionError> {
        let token = self.peek().clone();
        let expression = self.parse_statement()?;

        while !self.halted && !self.at(TokenKind::Eof) {
            if let Some(extra) = self.parse_statement()? {
                trace!(expression = %extra, "discarding statement parsed after recovery");
            }
        }

        trace!(errors = self.errors.len(), "parsed expression");
        Ok(ParseOutcome {
            expression: DynamoExpression {
                statement: Statement::Expression(ExpressionStatement { token, expression }),
            },
            errors: self.errors,
        })
    }

    fn parse_statement(&mut self) -> Result<Option<Expression>, ExpressionError> {
        let failure = match self.parse_expression(Precedence::Lowest) {
            Ok(expr) if self.at(TokenKind::Eof) => return Ok(Some(expr)),
            Ok(expr) => {
                let tok = self.peek();
                let err = ParseError::new(tok.offset, "end of expression", tok.describe());
                self.record(err)?;
                self.synchronize();
                return Ok(Some(expr));
            }
            Err(failure) => failure,
        };

        match failure {
            Failure::Syntax(err) => {
                debug!(
                    offset = err.offset,
                    expected = %err.expected,
                    found = %err.found,
                    "recovering from syntax error"
                );
                self.record(err)?;
                self.synchronize();
            }
            Failure::Halt(err) => {
                debug!(offset = err.offset, "syntax error ends the parse");
                self.record(err)?;
                self.halted = true;
            }
            Failure::Fatal(err) => return Err(err),
        }
        Ok(None)
    }

    fn record(&mut self, err: ParseError) -> Result<(), ExpressionError> {
        self.errors.push(err);
        if self.errors.len() > self.max_errors {
            return Err(ExpressionError::TooManyErrors {
                limit: self.max_errors,
                errors: std::mem::take(&mut self.errors),
            });
        }
        Ok(())
    }

    /// Skip to just past the next `AND`/`OR`, or to the end of input.
    fn synchronize(&mut self) {
        while !self.at(TokenKind::Eof) {
            let tok = self.advance();
            if matches!(tok.kind, TokenKind::And | TokenKind::Or) {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Token cursor
// ---------------------------------------------------------------------------

impl Parser {
    fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !tok.is(TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> Failure {
        let tok = self.peek();
        Failure::Syntax(ParseError::new(tok.offset, expected, tok.describe()))
    }

    fn descend(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Failure::Fatal(ExpressionError::TooDeep {
                limit: self.max_depth,
                offset: self.peek().offset,
            }));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

impl Parser {
    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let saved = self.depth;
        let result = self.parse_expression_above(precedence);
        self.depth = saved;
        result
    }

    /// Parse a prefix form, then fold in every operator that binds tighter
    /// than `precedence`. Each fold counts toward the depth limit because it
    /// adds a level to the tree.
    fn parse_expression_above(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        self.descend()?;
        let mut left = self.parse_prefix()?;
        let mut compared = false;

        loop {
            let kind = self.peek().kind;
            if Precedence::of(kind) <= precedence {
                return Ok(left);
            }
            self.descend()?;

            left = match kind {
                TokenKind::Between => {
                    self.guard_comparison_chain(&mut compared)?;
                    self.parse_between(left)?
                }
                k if k.is_comparison() => {
                    self.guard_comparison_chain(&mut compared)?;
                    self.parse_infix(left)?
                }
                TokenKind::LParen => self.parse_call(left)?,
                _ => self.parse_infix(left)?,
            };
        }
    }

    /// Comparisons do not associate: `a < b < c` needs parentheses.
    fn guard_comparison_chain(&self, compared: &mut bool) -> ParseResult<()> {
        if *compared {
            return Err(self.unexpected("AND, OR, or ')' after a comparison"));
        }
        *compared = true;
        Ok(())
    }

    fn parse_prefix(&mut self) -> ParseResult<Expression> {
        let expr = match self.peek().kind {
            TokenKind::Ident => {
                let token = self.advance();
                Expression::Identifier(Identifier {
                    value: token.literal.clone(),
                    token,
                })
            }
            TokenKind::Number => {
                let token = self.advance();
                Expression::Number(NumberLiteral {
                    value: token.literal.clone(),
                    token,
                })
            }
            TokenKind::String => {
                let token = self.advance();
                Expression::String(StringLiteral {
                    value: unquote(&token.literal),
                    token,
                })
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Expression::Boolean(BooleanLiteral {
                    value: token.is(TokenKind::True),
                    token,
                })
            }
            TokenKind::Not => self.parse_prefix_operator(PrefixOperator::Not, Precedence::Not)?,
            TokenKind::Minus => {
                self.parse_prefix_operator(PrefixOperator::Negate, Precedence::Prefix)?
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen, "')'")?;
                inner
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(expr)
    }

    fn parse_prefix_operator(
        &mut self,
        operator: PrefixOperator,
        precedence: Precedence,
    ) -> ParseResult<Expression> {
        let token = self.advance();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Prefix(PrefixExpression {
            token,
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_infix(&mut self, left: Expression) -> ParseResult<Expression> {
        let kind = self.peek().kind;
        let operator = match kind {
            TokenKind::Eq => InfixOperator::Eq,
            TokenKind::Ne => InfixOperator::Ne,
            TokenKind::Lt => InfixOperator::Lt,
            TokenKind::Le => InfixOperator::Le,
            TokenKind::Gt => InfixOperator::Gt,
            TokenKind::Ge => InfixOperator::Ge,
            TokenKind::And => InfixOperator::And,
            TokenKind::Or => InfixOperator::Or,
            TokenKind::Plus => InfixOperator::Add,
            TokenKind::Minus => InfixOperator::Sub,
            _ => return Err(self.unexpected("operator")),
        };
        let token = self.advance();
        let right = self.parse_expression(Precedence::of(kind))?;
        Ok(Expression::Infix(InfixExpression {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_between(&mut self, left: Expression) -> ParseResult<Expression> {
        let token = self.advance();
        let low = self.parse_expression(Precedence::Compare)?;
        if !self.at(TokenKind::And) {
            let tok = self.peek();
            return Err(Failure::Halt(ParseError::new(
                tok.offset,
                "AND in BETWEEN",
                tok.describe(),
            )));
        }
        self.advance();
        let high = self.parse_expression(Precedence::Compare)?;
        Ok(Expression::Between(BetweenExpression {
            token,
            left: Box::new(left),
            range: Box::new([low, high]),
        }))
    }

    fn parse_call(&mut self, callee: Expression) -> ParseResult<Expression> {
        // The callee must be the identifier token itself; `(f)(x)` is not a call.
        let follows_ident = self.pos > 0 && self.tokens[self.pos - 1].is(TokenKind::Ident);
        let function = match callee {
            Expression::Identifier(function) if follows_ident => function,
            _ => return Err(self.unexpected("operator")),
        };
        let token = self.advance();

        let mut arguments = Vec::new();
        if self.at(TokenKind::RParen) {
            self.advance();
        } else {
            loop {
                arguments.push(self.parse_expression(Precedence::Lowest)?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }

        Ok(Expression::Call(CallExpression {
            token,
            function,
            arguments,
        }))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lex and parse `input`, returning the tree with all syntax errors.
///
/// # Errors
///
/// Returns lexical errors and the terminal parse errors (`TooDeep`,
/// `TooManyErrors`). Ordinary syntax errors are reported in the outcome.
pub fn parse(input: &str, config: &ExpressionConfig) -> Result<ParseOutcome, ExpressionError> {
    let tokens = Lexer::tokenize(input)?;
    Parser::new(tokens, config).parse()
}

/// Lex and parse `input`, failing if any syntax error was found.
///
/// # Errors
///
/// Returns `ExpressionError::Diagnostics` with every syntax error, or any
/// error [`parse`] returns.
pub fn compile(input: &str, config: &ExpressionConfig) -> Result<DynamoExpression, ExpressionError> {
    parse(input, config)?.into_result()
}

/// Compile a condition expression with the default limits.
///
/// # Errors
///
/// See [`compile`].
pub fn parse_condition(input: &str) -> Result<DynamoExpression, ExpressionError> {
    compile(input, &ExpressionConfig::default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::Node;

    fn canonical(input: &str) -> String {
        parse_condition(input).unwrap().to_string()
    }

    fn root(input: &str) -> Expression {
        parse_condition(input).unwrap().expression().cloned().unwrap()
    }

    fn errors(input: &str) -> Vec<ParseError> {
        parse(input, &ExpressionConfig::default()).unwrap().errors
    }

    #[test]
    fn test_should_parse_simple_comparison() {
        match root("#name = :val") {
            Expression::Infix(infix) => {
                assert!(matches!(*infix.left, Expression::Identifier(ref i) if i.value == "#name"));
                assert_eq!(infix.operator, InfixOperator::Eq);
                assert!(matches!(*infix.right, Expression::Identifier(ref i) if i.value == ":val"));
            }
            other => panic!("expected Infix, got {other:?}"),
        }
    }

    #[test]
    fn test_should_bind_and_tighter_than_or() {
        assert_eq!(canonical("a OR b AND c"), "(a OR (b AND c))");
        assert_eq!(canonical("a AND b OR c"), "((a AND b) OR c)");
    }

    #[test]
    fn test_should_bind_not_to_its_immediate_operand() {
        assert_eq!(canonical("NOT a AND b"), "((NOT a) AND b)");
        assert_eq!(canonical("NOT a = b"), "(NOT (a = b))");
        assert_eq!(canonical("NOT NOT a"), "(NOT (NOT a))");
    }

    #[test]
    fn test_should_associate_logical_operators_left() {
        assert_eq!(canonical("a AND b AND c"), "((a AND b) AND c)");
        assert_eq!(canonical("a OR b OR c"), "((a OR b) OR c)");
        assert_eq!(canonical("a - b - c = d"), "(((a - b) - c) = d)");
    }

    #[test]
    fn test_should_bind_between_tighter_than_trailing_and() {
        let expr = root("a BETWEEN 1 AND 2 AND b");
        let Expression::Infix(infix) = expr else {
            panic!("expected AND at the root");
        };
        assert_eq!(infix.operator, InfixOperator::And);
        match *infix.left {
            Expression::Between(ref between) => {
                let [low, high] = &*between.range;
                assert_eq!(low.to_string(), "1");
                assert_eq!(high.to_string(), "2");
            }
            ref other => panic!("expected Between, got {other:?}"),
        }
        assert!(matches!(*infix.right, Expression::Identifier(ref i) if i.value == "b"));
    }

    #[test]
    fn test_should_keep_between_bounds_in_textual_order() {
        assert_eq!(canonical("x BETWEEN 10 AND 1"), "x BETWEEN 10 AND 1");
        assert_eq!(canonical("x BETWEEN :hi + 1 AND -2"), "x BETWEEN (:hi + 1) AND (-2)");
    }

    #[test]
    fn test_should_parse_calls() {
        assert_eq!(canonical("attribute_exists(#n)"), "attribute_exists(#n)");
        assert_eq!(
            canonical("begins_with(name, 'ab') AND size(tags) > 2"),
            r#"(begins_with(name, "ab") AND (size(tags) > 2))"#
        );
        match root("f()") {
            Expression::Call(call) => {
                assert_eq!(call.function.value, "f");
                assert!(call.arguments.is_empty());
                assert_eq!(call.token.literal, "(");
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn test_should_preserve_argument_order() {
        let Expression::Call(call) = root("contains(a, b, c)") else {
            panic!("expected Call");
        };
        let args: Vec<String> = call.arguments.iter().map(ToString::to_string).collect();
        assert_eq!(args, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_should_parse_literals() {
        assert_eq!(canonical("a = 'x'"), r#"(a = "x")"#);
        assert_eq!(canonical("a = 3.5"), "(a = 3.5)");
        assert_eq!(canonical("a = true OR false"), "((a = TRUE) OR FALSE)");
    }

    #[test]
    fn test_should_parse_case_insensitive_keywords() {
        assert_eq!(canonical("a between 1 and 2 or not b"), "(a BETWEEN 1 AND 2 OR (NOT b))");
    }

    #[test]
    fn test_should_use_parentheses_for_grouping() {
        assert_eq!(canonical("(a OR b) AND c"), "((a OR b) AND c)");
        assert_eq!(canonical("((a))"), "a");
    }

    #[test]
    fn test_should_round_trip_canonical_form() {
        let inputs = [
            "a OR b AND c",
            "NOT a AND b",
            "a BETWEEN 1 AND 2 AND b",
            "(a BETWEEN 1 AND 2) = TRUE",
            "-(a BETWEEN 1 AND 2) < 0",
            "(a BETWEEN 1 AND 2) BETWEEN x AND y",
            "NOT a BETWEEN :lo AND :hi",
            "begins_with(#p.#q, 'pre') OR size(info.tags) >= 3 - -1",
            "f(a BETWEEN 1 AND 2, (b OR c))",
            "x = 'quote \" and \\\\ slash'",
            "a <> b OR (c <= d AND e > f)",
        ];
        for input in inputs {
            let first = canonical(input);
            let second = canonical(&first);
            assert_eq!(first, second, "round-trip of {input:?}");
        }
    }

    #[test]
    fn test_should_reject_chained_comparisons() {
        let errs = errors("a < b < c");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].offset, 6);
        assert_eq!(errors("a BETWEEN 1 AND 2 BETWEEN 3 AND 4").len(), 1);
        assert!(errors("(a < b) < c").is_empty());
    }

    #[test]
    fn test_should_collect_two_independent_errors_in_order() {
        let errs = errors("a = = 1 AND b < )");
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].offset, 4);
        assert_eq!(errs[0].expected, "expression");
        assert_eq!(errs[1].offset, 16);
        assert_eq!(errs[1].found, "')'");
    }

    #[test]
    fn test_should_keep_partial_tree_with_trailing_garbage() {
        let outcome = parse("a = 1 )", &ExpressionConfig::default()).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].expected, "end of expression");
        assert_eq!(outcome.expression.to_string(), "(a = 1)");
    }

    #[test]
    fn test_should_leave_failed_statement_empty() {
        let outcome = parse("a = ", &ExpressionConfig::default()).unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.expression.expression().is_none());
        assert_eq!(outcome.expression.token_literal(), "a");
    }

    #[test]
    fn test_should_report_missing_closing_paren() {
        let errs = errors("(a = 1");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].expected, "')'");
        assert_eq!(errs[0].found, "EOF");
    }

    #[test]
    fn test_should_stop_after_missing_between_and() {
        let errs = errors("a BETWEEN 1 OR b = ) AND c = )");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].expected, "AND in BETWEEN");
        assert_eq!(errs[0].offset, 12);
    }

    #[test]
    fn test_should_reject_call_on_non_identifier() {
        let errs = errors("(a)(b)");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].found, "'('");
    }

    #[test]
    fn test_should_error_on_empty_input() {
        let errs = errors("   ");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].found, "EOF");
    }

    #[test]
    fn test_should_surface_lex_errors_as_terminal() {
        let err = parse("a = $", &ExpressionConfig::default()).unwrap_err();
        assert_eq!(err, ExpressionError::Lex { offset: 4, found: '$' });
    }

    #[test]
    fn test_should_reject_deep_nesting() {
        let config = ExpressionConfig {
            max_depth: 16,
            ..ExpressionConfig::default()
        };
        let input = format!("{}a{}", "(".repeat(40), ")".repeat(40));
        let err = parse(&input, &config).unwrap_err();
        assert!(matches!(err, ExpressionError::TooDeep { limit: 16, .. }));

        let chain = vec!["a"; 40].join(" AND ");
        assert!(matches!(
            parse(&chain, &config).unwrap_err(),
            ExpressionError::TooDeep { .. }
        ));
        assert!(parse("((a))", &config).unwrap().is_clean());
    }

    #[test]
    fn test_should_abort_after_too_many_errors() {
        let config = ExpressionConfig {
            max_errors: 2,
            ..ExpressionConfig::default()
        };
        let err = parse("= AND = AND = AND =", &config).unwrap_err();
        match err {
            ExpressionError::TooManyErrors { limit, errors } => {
                assert_eq!(limit, 2);
                assert_eq!(errors.len(), 3);
            }
            other => panic!("expected TooManyErrors, got {other:?}"),
        }
    }

    #[test]
    fn test_should_fail_compile_with_all_diagnostics() {
        let err = compile("a = = 1 OR b <", &ExpressionConfig::default()).unwrap_err();
        assert_eq!(err.parse_errors().len(), 2);
    }
}
