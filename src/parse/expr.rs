//! Facilities for parsing debugger expressions.

use super::atom::{PError, symbol, unexpected};
use super::lex::{Token, TokenValue};
use super::types::{ParseError, SrcSpan};
use chumsky::{self, IterParser, Parser};
use num_bigint::BigInt;

//===========================================================================//

const PREC_OR: u8 = 0;
const PREC_AND: u8 = 1;
const PREC_COMPARE: u8 = 2;
const PREC_SUM: u8 = 3;

/// A binary operation between two expressions in an abstract syntax tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOpAst {
    /// Logical "and" of two booleans.
    And,
    /// Bitwise "and" of two integers.
    BitAnd,
    /// Bitwise "or" of two integers.
    BitOr,
    /// "Equals" comparison.
    CmpEq,
    /// "Greater than or equal to" comparison.
    CmpGe,
    /// "Greater than" comparison.
    CmpGt,
    /// "Less than or equal to" comparison.
    CmpLe,
    /// "Less than" comparison.
    CmpLt,
    /// "Not equal" comparison.
    CmpNe,
    /// Subtraction.
    Minus,
    /// Logical "or" of two booleans.
    Or,
    /// Addition.
    Plus,
}

impl BinOpAst {
    fn from_token(value: &TokenValue) -> Option<BinOpAst> {
        match value {
            TokenValue::AmpAmp => Some(BinOpAst::And),
            TokenValue::Amp => Some(BinOpAst::BitAnd),
            TokenValue::Pipe => Some(BinOpAst::BitOr),
            TokenValue::EqEq => Some(BinOpAst::CmpEq),
            TokenValue::GtEq => Some(BinOpAst::CmpGe),
            TokenValue::Gt => Some(BinOpAst::CmpGt),
            TokenValue::LtEq => Some(BinOpAst::CmpLe),
            TokenValue::Lt => Some(BinOpAst::CmpLt),
            TokenValue::BangEq => Some(BinOpAst::CmpNe),
            TokenValue::Minus => Some(BinOpAst::Minus),
            TokenValue::PipePipe => Some(BinOpAst::Or),
            TokenValue::Plus => Some(BinOpAst::Plus),
            _ => None,
        }
    }

    /// Operators with higher precedence bind more tightly.
    fn precedence(self) -> u8 {
        match self {
            BinOpAst::Or => PREC_OR,
            BinOpAst::And => PREC_AND,
            BinOpAst::CmpEq
            | BinOpAst::CmpGe
            | BinOpAst::CmpGt
            | BinOpAst::CmpLe
            | BinOpAst::CmpLt
            | BinOpAst::CmpNe => PREC_COMPARE,
            BinOpAst::BitAnd
            | BinOpAst::BitOr
            | BinOpAst::Minus
            | BinOpAst::Plus => PREC_SUM,
        }
    }

    pub(crate) fn parser<'a>(
        precedence: u8,
    ) -> impl Parser<'a, &'a [Token], (SrcSpan, BinOpAst), PError<'a>> + Clone
    {
        chumsky::prelude::any()
            .try_map(move |token: Token, span| {
                match BinOpAst::from_token(&token.value) {
                    Some(op) if op.precedence() == precedence => {
                        Ok((token.span, op))
                    }
                    _ => Err(unexpected(token, span)),
                }
            })
            .labelled("binary operator")
    }

    pub(crate) fn verb(self) -> &'static str {
        match self {
            BinOpAst::And | BinOpAst::BitAnd => "and",
            BinOpAst::BitOr | BinOpAst::Or => "or",
            BinOpAst::CmpEq
            | BinOpAst::CmpGe
            | BinOpAst::CmpGt
            | BinOpAst::CmpLe
            | BinOpAst::CmpLt
            | BinOpAst::CmpNe => "compare",
            BinOpAst::Minus => "subtract",
            BinOpAst::Plus => "add",
        }
    }
}

//===========================================================================//

/// A unary prefix operation on an expression in an abstract syntax tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnOpAst {
    /// Integer negation.
    Neg,
    /// Logical "not" of a boolean.
    Not,
}

impl UnOpAst {
    pub(crate) fn parser<'a>()
    -> impl Parser<'a, &'a [Token], (SrcSpan, UnOpAst), PError<'a>> + Clone {
        chumsky::prelude::any()
            .try_map(|token: Token, span| {
                let op = match token.value {
                    TokenValue::Minus => UnOpAst::Neg,
                    TokenValue::Bang => UnOpAst::Not,
                    _ => return Err(unexpected(token, span)),
                };
                Ok((token.span, op))
            })
            .labelled("unary operator")
    }

    pub(crate) fn verb(self) -> &'static str {
        match self {
            UnOpAst::Neg => "negate",
            UnOpAst::Not => "invert",
        }
    }
}

//===========================================================================//

/// An identifier in an expression or lvalue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentifierAst {
    /// The location in the input where this instance of the identifier
    /// appears.
    pub span: SrcSpan,
    /// The name of the identifier.
    pub name: String,
}

impl IdentifierAst {
    pub(crate) fn parser<'a>()
    -> impl Parser<'a, &'a [Token], IdentifierAst, PError<'a>> + Clone {
        chumsky::prelude::any()
            .try_map(|token: Token, span| {
                if let TokenValue::Identifier(name) = token.value {
                    Ok(IdentifierAst { name, span: token.span })
                } else {
                    Err(unexpected(token, span))
                }
            })
            .labelled("identifier")
    }
}

//===========================================================================//

/// The abstract syntax tree for an expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExprAst {
    /// The location in the input where this expression appears.
    pub span: SrcSpan,
    /// The contents of this expression.
    pub node: ExprAstNode,
}

impl ExprAst {
    pub(crate) fn parser<'a>()
    -> impl Parser<'a, &'a [Token], ExprAst, PError<'a>> + Clone {
        chumsky::prelude::recursive(|expr| {
            let parenthesized_expr = chumsky::prelude::group((
                symbol(TokenValue::ParenOpen),
                expr.clone(),
                symbol(TokenValue::ParenClose),
            ))
            .map(|(open, ast, close): (Token, ExprAst, Token)| ExprAst {
                span: open.span.merged_with(close.span),
                node: ast.node,
            });
            let index = chumsky::prelude::group((
                IdentifierAst::parser(),
                symbol(TokenValue::BracketOpen),
                expr,
                symbol(TokenValue::BracketClose),
            ))
            .map(
                |(id, _open, ast, close): (
                    IdentifierAst,
                    Token,
                    ExprAst,
                    Token,
                )| ExprAst {
                    span: id.span.merged_with(close.span),
                    node: ExprAstNode::Index(id, Box::new(ast)),
                },
            );
            let identifier = IdentifierAst::parser().map(|id| ExprAst {
                span: id.span,
                node: ExprAstNode::Identifier(id.name),
            });

            let expr_atom = chumsky::prelude::choice((
                parenthesized_expr,
                index,
                identifier,
                int_literal(),
            ))
            .labelled("subexpression");

            let unary = UnOpAst::parser().repeated().foldr(
                expr_atom,
                |(span, op), operand: ExprAst| ExprAst {
                    span: span.merged_with(operand.span),
                    node: ExprAstNode::UnOp((span, op), Box::new(operand)),
                },
            );
            let sum = binary_chain(unary, PREC_SUM);
            let comparison = binary_chain(sum, PREC_COMPARE);
            let conjunction = binary_chain(comparison, PREC_AND);
            binary_chain(conjunction, PREC_OR).labelled("expression")
        })
    }
}

/// Parses a left-associative chain of `operand`s joined by binary operators
/// of the given precedence.
fn binary_chain<'a, P>(
    operand: P,
    precedence: u8,
) -> impl Parser<'a, &'a [Token], ExprAst, PError<'a>> + Clone
where
    P: Parser<'a, &'a [Token], ExprAst, PError<'a>> + Clone,
{
    operand.clone().foldl(
        BinOpAst::parser(precedence).then(operand).repeated(),
        |lhs, (op, rhs)| {
            let span = lhs.span.merged_with(rhs.span);
            let node = ExprAstNode::BinOp(op, Box::new(lhs), Box::new(rhs));
            ExprAst { span, node }
        },
    )
}

//===========================================================================//

/// One node in the abstract syntax tree for an expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExprAstNode {
    /// A binary operation between two subexpressions.
    BinOp((SrcSpan, BinOpAst), Box<ExprAst>, Box<ExprAst>),
    /// An identifier.
    Identifier(String),
    /// A read from a memory space, such as `mem[sp + 2]`.
    Index(IdentifierAst, Box<ExprAst>),
    /// An integer literal.
    IntLiteral(BigInt),
    /// A unary operation on a subexpression.
    UnOp((SrcSpan, UnOpAst), Box<ExprAst>),
}

//===========================================================================//

fn int_literal<'a>()
-> impl Parser<'a, &'a [Token], ExprAst, PError<'a>> + Clone {
    chumsky::prelude::any()
        .try_map(|token: Token, span| {
            if let TokenValue::IntLiteral(int) = token.value {
                Ok(ExprAst {
                    span: token.span,
                    node: ExprAstNode::IntLiteral(int),
                })
            } else {
                Err(unexpected(token, span))
            }
        })
        .labelled("integer literal")
}

//===========================================================================//

/// Parses a sequence of tokens into an abstract syntax tree for an expression.
pub fn parse_expr(tokens: &[Token]) -> Result<ExprAst, Vec<ParseError>> {
    if tokens.is_empty() {
        return Err(vec![missing_input("expression")]);
    }
    ExprAst::parser()
        .parse(tokens)
        .into_result()
        .map_err(|errors| convert_errors(tokens, errors))
}

pub(crate) fn missing_input(what: &str) -> ParseError {
    ParseError::new(
        SrcSpan::from_byte_range(0..0),
        format!("expected {what}"),
    )
}

/// Converts chumsky errors, whose spans are token indices, into errors
/// whose spans are byte ranges in the input.
pub(crate) fn convert_errors<'a>(
    tokens: &[Token],
    errors: Vec<chumsky::error::Rich<'a, Token>>,
) -> Vec<ParseError> {
    errors
        .into_iter()
        .map(|error| {
            let index = error.span().start;
            let span = if index < tokens.len() {
                tokens[index].span
            } else {
                tokens[tokens.len() - 1].span.end_span()
            };
            let message = match error.found() {
                Some(token) => format!("unexpected {}", token.value.name()),
                None => "unexpected end of input".to_string(),
            };
            ParseError::new(span, message)
        })
        .collect()
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{BinOpAst, ExprAst, ExprAstNode, UnOpAst, parse_expr};
    use crate::parse::{IdentifierAst, ParseError, SrcSpan, TokenLexer};
    use num_bigint::BigInt;
    use std::ops::Range;

    fn parse(input: &str) -> Result<ExprAst, Vec<ParseError>> {
        parse_expr(&TokenLexer::tokenize(input)?)
    }

    fn span(range: Range<usize>) -> SrcSpan {
        SrcSpan::from_byte_range(range)
    }

    fn int_ast(range: Range<usize>, value: i32) -> ExprAst {
        ExprAst {
            span: span(range),
            node: ExprAstNode::IntLiteral(BigInt::from(value)),
        }
    }

    fn id_ast(range: Range<usize>, name: &str) -> ExprAst {
        ExprAst {
            span: span(range),
            node: ExprAstNode::Identifier(name.to_string()),
        }
    }

    #[test]
    fn identifier() {
        assert_eq!(parse("r15"), Ok(id_ast(0..3, "r15")));
    }

    #[test]
    fn int_literal() {
        assert_eq!(parse("123"), Ok(int_ast(0..3, 123)));
        assert_eq!(parse("0x4400"), Ok(int_ast(0..6, 0x4400)));
    }

    #[test]
    fn addition_is_left_associative() {
        assert_eq!(
            parse("1 + 2 - (3 + 4)"),
            Ok(ExprAst {
                span: span(0..15),
                node: ExprAstNode::BinOp(
                    (span(6..7), BinOpAst::Minus),
                    Box::new(ExprAst {
                        span: span(0..5),
                        node: ExprAstNode::BinOp(
                            (span(2..3), BinOpAst::Plus),
                            Box::new(int_ast(0..1, 1)),
                            Box::new(int_ast(4..5, 2)),
                        ),
                    }),
                    Box::new(ExprAst {
                        span: span(8..15),
                        node: ExprAstNode::BinOp(
                            (span(11..12), BinOpAst::Plus),
                            Box::new(int_ast(9..10, 3)),
                            Box::new(int_ast(13..14, 4)),
                        ),
                    }),
                ),
            })
        );
    }

    #[test]
    fn comparison_binds_looser_than_sum() {
        assert_eq!(
            parse("r5 == 1 + 2"),
            Ok(ExprAst {
                span: span(0..11),
                node: ExprAstNode::BinOp(
                    (span(3..5), BinOpAst::CmpEq),
                    Box::new(id_ast(0..2, "r5")),
                    Box::new(ExprAst {
                        span: span(6..11),
                        node: ExprAstNode::BinOp(
                            (span(8..9), BinOpAst::Plus),
                            Box::new(int_ast(6..7, 1)),
                            Box::new(int_ast(10..11, 2)),
                        ),
                    }),
                ),
            })
        );
    }

    #[test]
    fn or_binds_looser_than_and() {
        let ast = parse("zero || carry && r4 < 3").unwrap();
        let ExprAstNode::BinOp((_, op), lhs, rhs) = ast.node else {
            panic!("expected binary operation");
        };
        assert_eq!(op, BinOpAst::Or);
        assert_eq!(*lhs, id_ast(0..4, "zero"));
        let ExprAstNode::BinOp((_, op), _, _) = rhs.node else {
            panic!("expected binary operation");
        };
        assert_eq!(op, BinOpAst::And);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(
            parse("!-r4"),
            Ok(ExprAst {
                span: span(0..4),
                node: ExprAstNode::UnOp(
                    (span(0..1), UnOpAst::Not),
                    Box::new(ExprAst {
                        span: span(1..4),
                        node: ExprAstNode::UnOp(
                            (span(1..2), UnOpAst::Neg),
                            Box::new(id_ast(2..4, "r4")),
                        ),
                    }),
                ),
            })
        );
    }

    #[test]
    fn memory_index() {
        assert_eq!(
            parse("mem[sp]"),
            Ok(ExprAst {
                span: span(0..7),
                node: ExprAstNode::Index(
                    IdentifierAst {
                        span: span(0..3),
                        name: "mem".to_string(),
                    },
                    Box::new(id_ast(4..6, "sp")),
                ),
            })
        );
    }

    #[test]
    fn empty_input() {
        let errors = parse("").unwrap_err();
        assert_eq!(errors[0].message, "expected expression");
    }

    #[test]
    fn unexpected_token() {
        let errors = parse("1 + )").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unexpected ')'");
        assert_eq!(errors[0].span, span(4..5));
    }

    #[test]
    fn unexpected_end_of_input() {
        let errors = parse("(r4 + 1").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unexpected end of input");
        assert_eq!(errors[0].span, span(7..7));
    }
}

//===========================================================================//
