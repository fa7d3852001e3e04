//! Pratt parser producing a resolved [`Expr`].

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::builtins::{self, NAMESPACES};
use super::lexer::{tokenize, Token};
use super::value::Value;
use super::ParseError;
use crate::action::Field;
use std::ops::Range;

/// The name expressions use for their input sequence.
pub const INPUTS: &str = "v";

const COMPARISON_PREC: u8 = 30;
/// Between `and` and the comparisons: `not` operands stop at `and`/`or`.
const NOT_PREC: u8 = 25;
const UNARY_OPERAND_PREC: u8 = 60;

pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source).map_err(|offset| ParseError::InvalidToken { offset })?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut stream = TokenStream {
        source,
        tokens,
        pos: 0,
    };
    let expr = parse_expr(&mut stream)?;
    if stream.peek().is_some() {
        return Err(stream.unexpected("end of expression"));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Token stream
// ---------------------------------------------------------------------------

struct TokenStream<'a> {
    source: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl TokenStream<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    /// Error describing the token at the cursor.
    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some((_, span)) => ParseError::Unexpected {
                expected,
                found: self.source[span.clone()].to_string(),
                offset: span.start,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        if self.peek_is(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
enum InfixOp {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

/// Precedence, associativity and operator for an infix token. Higher binds
/// tighter.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, InfixOp)> {
    let info = match token {
        Token::Or => (10, Assoc::Left, InfixOp::Logical(LogicalOp::Or)),
        Token::And => (20, Assoc::Left, InfixOp::Logical(LogicalOp::And)),
        Token::EqEq => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Eq)),
        Token::BangEq => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Ne)),
        Token::Lt => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Lt)),
        Token::LtEq => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Le)),
        Token::Gt => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Gt)),
        Token::GtEq => (COMPARISON_PREC, Assoc::Left, InfixOp::Binary(BinaryOp::Ge)),
        Token::Plus => (40, Assoc::Left, InfixOp::Binary(BinaryOp::Add)),
        Token::Minus => (40, Assoc::Left, InfixOp::Binary(BinaryOp::Sub)),
        Token::Star => (50, Assoc::Left, InfixOp::Binary(BinaryOp::Mul)),
        Token::Slash => (50, Assoc::Left, InfixOp::Binary(BinaryOp::Div)),
        Token::SlashSlash => (50, Assoc::Left, InfixOp::Binary(BinaryOp::FloorDiv)),
        Token::Percent => (50, Assoc::Left, InfixOp::Binary(BinaryOp::Mod)),
        Token::StarStar => (60, Assoc::Right, InfixOp::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(info)
}

/// `body [if condition else otherwise]`
fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let body = parse_pratt(stream, 0)?;
    if !stream.peek_is(&Token::If) {
        return Ok(body);
    }
    stream.advance();
    let condition = parse_pratt(stream, 0)?;
    stream.expect(Token::Else, "'else'")?;
    let otherwise = parse_expr(stream)?;
    Ok(Expr::Conditional {
        condition: Box::new(condition),
        then: Box::new(body),
        otherwise: Box::new(otherwise),
    })
}

fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let mut left = parse_prefix(stream, min_prec)?;
    let mut compared = false;

    while let Some(token) = stream.peek() {
        let Some((prec, assoc, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(stream, next_prec)?;
        left = match op {
            InfixOp::Logical(op) => Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            // A comparison directly after another one at this level extends
            // the chain; `(a < b) < c` arrives as an atom and does not.
            InfixOp::Binary(op) if op.is_comparison() && compared => link(left, op, right),
            InfixOp::Binary(op) => {
                compared = op.is_comparison();
                Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        };
    }

    Ok(left)
}

/// Append `op right` to the comparison chain ending in `left`.
fn link(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    match left {
        Expr::Chain { first, mut links } => {
            links.push((op, right));
            Expr::Chain { first, links }
        }
        Expr::Binary {
            op: first_op,
            left: first,
            right: middle,
        } => Expr::Chain {
            first,
            links: vec![(first_op, *middle), (op, right)],
        },
        other => Expr::Binary {
            op,
            left: Box::new(other),
            right: Box::new(right),
        },
    }
}

/// Unary operators. `not` is only allowed where an `and`/`or` operand may
/// start and takes a comparison as its operand; `-` and `+` bind looser
/// than `**` only.
fn parse_prefix(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let (op, operand_prec) = match stream.peek() {
        Some(Token::Not) if min_prec > NOT_PREC => return Err(stream.unexpected("operand")),
        Some(Token::Not) => (UnaryOp::Not, NOT_PREC),
        Some(Token::Minus) => (UnaryOp::Neg, UNARY_OPERAND_PREC),
        Some(Token::Plus) => (UnaryOp::Pos, UNARY_OPERAND_PREC),
        _ => return parse_postfix(stream),
    };
    stream.advance();
    let operand = parse_pratt(stream, operand_prec)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::LBracket) => {
                stream.advance();
                let index = parse_expr(stream)?;
                stream.expect(Token::RBracket, "']'")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            }
            Some(Token::Dot) => {
                stream.advance();
                let name = stream.ident("field name")?;
                let field = Field::parse(&name).ok_or(ParseError::UnknownField(name))?;
                expr = Expr::Field {
                    target: Box::new(expr),
                    field,
                };
            }
            // Only named builtins are callable.
            Some(Token::LParen) => return Err(stream.unexpected("operator")),
            _ => break,
        }
    }

    Ok(expr)
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let expr = match stream.peek() {
        Some(Token::Int(i)) => Expr::Literal(Value::Int(*i)),
        Some(Token::Float(f)) => Expr::Literal(Value::Float(*f)),
        Some(Token::True) => Expr::Literal(Value::Bool(true)),
        Some(Token::False) => Expr::Literal(Value::Bool(false)),
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen, "')'")?;
            return Ok(inner);
        }
        Some(Token::LBracket) => {
            stream.advance();
            let items = parse_list(stream, Token::RBracket, "']'")?;
            return Ok(Expr::List(items));
        }
        Some(Token::Ident(_)) => return parse_name(stream),
        _ => return Err(stream.unexpected("expression")),
    };
    stream.advance();
    Ok(expr)
}

/// `v`, `name(args)`, `ns.name(args)` or `ns.constant`.
fn parse_name(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let name = stream.ident("name")?;
    if name == INPUTS {
        return Ok(Expr::Inputs);
    }

    let (namespace, name) = if NAMESPACES.contains(&name.as_str()) {
        if !stream.peek_is(&Token::Dot) {
            return Err(ParseError::UnknownName(name));
        }
        stream.advance();
        let member = stream.ident("name after '.'")?;
        (Some(name), member)
    } else {
        (None, name)
    };
    let qualified = || match &namespace {
        Some(ns) => format!("{ns}.{name}"),
        None => name.clone(),
    };

    if !stream.peek_is(&Token::LParen) {
        return namespace
            .as_deref()
            .and_then(|ns| builtins::constant(ns, &name))
            .map(|c| Expr::Literal(Value::Float(c)))
            .ok_or_else(|| ParseError::UnknownName(qualified()));
    }

    let func = builtins::lookup(namespace.as_deref(), &name)
        .ok_or_else(|| ParseError::UnknownName(qualified()))?;
    stream.advance();
    let args = parse_list(stream, Token::RParen, "')'")?;
    if !func.accepts(args.len()) {
        return Err(ParseError::Arity {
            name: func.name(),
            expected: func.arity_text(),
            found: args.len(),
        });
    }
    Ok(Expr::Call { func, args })
}

/// Comma separated expressions up to `close`, trailing comma allowed. The
/// opening delimiter has already been consumed.
fn parse_list(
    stream: &mut TokenStream,
    close: Token,
    expected: &'static str,
) -> Result<Vec<Expr>, ParseError> {
    let mut items = Vec::new();
    while !stream.peek_is(&close) {
        items.push(parse_expr(stream)?);
        if stream.peek_is(&Token::Comma) {
            stream.advance();
        } else {
            break;
        }
    }
    stream.expect(close, expected)?;
    Ok(items)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::builtins::Builtin;

    fn int(i: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Int(i)))
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: int(1),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: int(2),
                    right: int(3),
                }),
            }
        );
    }

    #[test]
    fn power_is_right_associative_and_beats_negation() {
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: int(2),
                    right: int(2),
                }),
            }
        );
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Pow,
                left: int(2),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Pow,
                    left: int(3),
                    right: int(2),
                }),
            }
        );
        assert!(parse("2 ** -1").is_ok());
    }

    #[test]
    fn not_covers_comparison() {
        let expr = parse("not v[0] == 1 and True").unwrap();
        let Expr::Logical { op: LogicalOp::And, left, .. } = expr else {
            panic!("expected and at the top, got {expr:?}");
        };
        assert!(matches!(
            *left,
            Expr::Unary { op: UnaryOp::Not, ref operand }
                if matches!(**operand, Expr::Binary { op: BinaryOp::Eq, .. })
        ));
    }

    #[test]
    fn conditional_expression() {
        let expr = parse("1 if v[0] else 2 if v[1] else 3").unwrap();
        let Expr::Conditional { otherwise, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*otherwise, Expr::Conditional { .. }));
    }

    #[test]
    fn calls_and_namespaces() {
        assert_eq!(
            parse("np.clip(v[0], 0, 1)").unwrap(),
            Expr::Call {
                func: Builtin::Clip,
                args: vec![
                    Expr::Index {
                        target: Box::new(Expr::Inputs),
                        index: int(0),
                    },
                    Expr::Literal(Value::Int(0)),
                    Expr::Literal(Value::Int(1)),
                ],
            }
        );
        assert_eq!(
            parse("math.pi").unwrap(),
            Expr::Literal(Value::Float(std::f64::consts::PI))
        );
    }

    #[test]
    fn fields_are_resolved() {
        assert_eq!(
            parse("v[0].fingerCurl").unwrap(),
            Expr::Field {
                target: Box::new(Expr::Index {
                    target: Box::new(Expr::Inputs),
                    index: int(0),
                }),
                field: Field::FingerCurl,
            }
        );
        assert_eq!(
            parse("v[0].__class__"),
            Err(ParseError::UnknownField("__class__".into()))
        );
    }

    #[test]
    fn lists_allow_trailing_comma() {
        assert_eq!(
            parse("[1, 2,]").unwrap(),
            Expr::List(vec![Expr::Literal(Value::Int(1)), Expr::Literal(Value::Int(2))])
        );
        assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(parse("open(1)"), Err(ParseError::UnknownName("open".into())));
        assert_eq!(parse("x + 1"), Err(ParseError::UnknownName("x".into())));
        assert_eq!(parse("math"), Err(ParseError::UnknownName("math".into())));
        assert_eq!(parse("math.system(1)"), Err(ParseError::UnknownName("math.system".into())));
        assert_eq!(parse("glm.pi"), Err(ParseError::UnknownName("glm.pi".into())));
    }

    #[test]
    fn rejects_bad_arity() {
        assert_eq!(
            parse("len(v, v)"),
            Err(ParseError::Arity {
                name: "len",
                expected: "1".into(),
                found: 2,
            })
        );
    }

    #[test]
    fn comparisons_chain() {
        let index0 = Expr::Index {
            target: Box::new(Expr::Inputs),
            index: int(0),
        };
        assert_eq!(
            parse("0 < v[0] <= 1").unwrap(),
            Expr::Chain {
                first: int(0),
                links: vec![(BinaryOp::Lt, index0), (BinaryOp::Le, Expr::Literal(Value::Int(1)))],
            }
        );
        assert!(matches!(parse("1 < 2 < 3 < 4").unwrap(), Expr::Chain { ref links, .. } if links.len() == 3));
        // parenthesised comparisons are operands, not links
        assert!(matches!(
            parse("(0 < v[0]) == True").unwrap(),
            Expr::Binary { op: BinaryOp::Eq, .. }
        ));
        assert!(matches!(
            parse("0 < v[0] and v[0] < 1").unwrap(),
            Expr::Logical { op: LogicalOp::And, .. }
        ));
    }

    #[test]
    fn not_only_starts_boolean_operands() {
        assert!(parse("not not v[0]").is_ok());
        assert!(parse("v[0] or not v[1]").is_ok());
        assert!(parse("1 if not v[0] else 2").is_ok());
        assert_eq!(
            parse("1 + not 0"),
            Err(ParseError::Unexpected {
                expected: "operand",
                found: "not".into(),
                offset: 4,
            })
        );
        assert!(matches!(parse("v[0] == not v[1]"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("-not v[0]"), Err(ParseError::Unexpected { .. })));
    }

    #[test]
    fn syntax_errors_point_at_the_token() {
        assert_eq!(
            parse("v[0] +"),
            Err(ParseError::UnexpectedEnd {
                expected: "expression"
            })
        );
        assert_eq!(
            parse("v[0] v[1]"),
            Err(ParseError::Unexpected {
                expected: "end of expression",
                found: "v".into(),
                offset: 5,
            })
        );
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("1 if v[0]"), Err(ParseError::UnexpectedEnd { expected: "'else'" }));
        assert!(matches!(parse("v[0](1)"), Err(ParseError::Unexpected { .. })));
    }
}
