//! Facilities for parsing debugger expressions and assignments.

mod atom;
mod expr;
mod lex;
mod lvalue;
mod types;

pub use expr::{
    BinOpAst, ExprAst, ExprAstNode, IdentifierAst, UnOpAst, parse_expr,
};
pub use lex::{Token, TokenLexer, TokenValue};
pub use lvalue::{LValueAst, LValueAstNode, parse_assignment};
pub use types::{ParseError, ParseErrorLabel, ParseResult, SrcSpan};

//===========================================================================//
