use super::atom::{PError, symbol};
use super::expr::{ExprAst, IdentifierAst, convert_errors, missing_input};
use super::lex::{Token, TokenValue};
use super::types::{ParseError, SrcSpan};
use chumsky::{self, Parser};

//===========================================================================//

/// The abstract syntax tree for an L-value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LValueAst {
    /// The location in the input where this L-value appears.
    pub span: SrcSpan,
    /// The contents of this L-value.
    pub node: LValueAstNode,
}

impl LValueAst {
    pub(crate) fn parser<'a>()
    -> impl Parser<'a, &'a [Token], LValueAst, PError<'a>> + Clone {
        let index = chumsky::prelude::group((
            IdentifierAst::parser(),
            symbol(TokenValue::BracketOpen),
            ExprAst::parser(),
            symbol(TokenValue::BracketClose),
        ))
        .map(
            |(id, _open, expr, close): (
                IdentifierAst,
                Token,
                ExprAst,
                Token,
            )| LValueAst {
                span: id.span.merged_with(close.span),
                node: LValueAstNode::Index(id, expr),
            },
        );
        let variable = IdentifierAst::parser().map(|id_ast| LValueAst {
            span: id_ast.span,
            node: LValueAstNode::Variable(id_ast.name),
        });
        chumsky::prelude::choice((index, variable))
    }
}

//===========================================================================//

/// One node in the abstract syntax tree for an L-value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LValueAstNode {
    /// Assign to a location in a memory space (`mem` or `byte`), at the
    /// address given by the specified expression.
    Index(IdentifierAst, ExprAst),
    /// Assign to a simulated processor register or status flag.
    Variable(String),
}

//===========================================================================//

/// Parses a sequence of tokens of the form `LVALUE = EXPR`.
pub fn parse_assignment(
    tokens: &[Token],
) -> Result<(LValueAst, ExprAst), Vec<ParseError>> {
    if tokens.is_empty() {
        return Err(vec![missing_input("assignment")]);
    }
    chumsky::prelude::group((
        LValueAst::parser(),
        symbol(TokenValue::Eq),
        ExprAst::parser(),
    ))
    .map(|(lvalue, _eq, expr): (LValueAst, Token, ExprAst)| (lvalue, expr))
    .parse(tokens)
    .into_result()
    .map_err(|errors| convert_errors(tokens, errors))
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{LValueAst, LValueAstNode, parse_assignment};
    use crate::parse::{
        ExprAst, ExprAstNode, IdentifierAst, ParseError, SrcSpan, TokenLexer,
    };
    use num_bigint::BigInt;

    fn parse(input: &str) -> Result<(LValueAst, ExprAst), Vec<ParseError>> {
        parse_assignment(&TokenLexer::tokenize(input)?)
    }

    #[test]
    fn register_assignment() {
        let (lvalue, expr) = parse("r15 = 0x10").unwrap();
        assert_eq!(
            lvalue,
            LValueAst {
                span: SrcSpan::from_byte_range(0..3),
                node: LValueAstNode::Variable("r15".to_string()),
            }
        );
        assert_eq!(expr.node, ExprAstNode::IntLiteral(BigInt::from(16)));
    }

    #[test]
    fn memory_assignment() {
        let (lvalue, expr) = parse("byte[sp + 1] = 7").unwrap();
        assert_eq!(lvalue.span, SrcSpan::from_byte_range(0..12));
        let LValueAstNode::Index(id, address) = lvalue.node else {
            panic!("expected index lvalue");
        };
        assert_eq!(
            id,
            IdentifierAst {
                span: SrcSpan::from_byte_range(0..4),
                name: "byte".to_string(),
            }
        );
        assert_eq!(address.span, SrcSpan::from_byte_range(5..11));
        assert_eq!(expr.node, ExprAstNode::IntLiteral(BigInt::from(7)));
    }

    #[test]
    fn missing_equals() {
        let errors = parse("r4 5").unwrap_err();
        assert_eq!(errors[0].message, "unexpected int literal");
    }
}

//===========================================================================//
