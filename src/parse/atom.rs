use super::lex::{Token, TokenValue};
use chumsky::error::{LabelError, Rich, RichPattern};
use chumsky::span::SimpleSpan;
use chumsky::util::MaybeRef;
use chumsky::{self, Parser};

//===========================================================================//

/// The error type used for `chumsky::Parser`s in this crate.
pub(crate) type PError<'a> =
    chumsky::extra::Err<chumsky::error::Rich<'a, Token>>;

//===========================================================================//

pub(crate) fn symbol<'a>(
    value: TokenValue,
) -> impl Parser<'a, &'a [Token], Token, PError<'a>> + Clone {
    let name = value.name();
    chumsky::prelude::any()
        .try_map(move |token: Token, span| {
            if token.value == value {
                Ok(token)
            } else {
                Err(unexpected(token, span))
            }
        })
        .labelled(name)
}

/// Returns the error for a token that is not allowed where it appears.  The
/// token is kept in the error so that messages can name it.
pub(crate) fn unexpected<'a>(
    token: Token,
    span: SimpleSpan,
) -> Rich<'a, Token> {
    <Rich<'a, Token> as LabelError<
        'a,
        &'a [Token],
        RichPattern<'a, Token>,
    >>::expected_found([], Some(MaybeRef::Val(token)), span)
}

//===========================================================================//
