use super::types::{ParseError, SrcSpan};
use logos::{self, Logos};
use num_bigint::BigInt;

//===========================================================================//

fn decimal_literal_callback(lexer: &mut logos::Lexer<TokenKind>) -> BigInt {
    BigInt::parse_bytes(lexer.slice().as_bytes(), 10).unwrap_or_default()
}

fn hex_literal_callback(lexer: &mut logos::Lexer<TokenKind>) -> BigInt {
    let digits = &lexer.slice().as_bytes()[2..];
    BigInt::parse_bytes(digits, 16).unwrap_or_default()
}

#[derive(Debug, Eq, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum TokenKind {
    #[token("&")]
    Amp,
    #[token("&&")]
    AmpAmp,
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEq,
    #[token("]")]
    BracketClose,
    #[token("[")]
    BracketOpen,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[regex(r"[_A-Za-z][_A-Za-z0-9]*")]
    Identifier,
    #[regex(r"[0-9]+", decimal_literal_callback)]
    #[regex(r"0[xX][0-9A-Fa-f]+", hex_literal_callback)]
    IntLiteral(BigInt),
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token("-")]
    Minus,
    #[token(")")]
    ParenClose,
    #[token("(")]
    ParenOpen,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token("+")]
    Plus,
}

impl TokenKind {
    fn into_value(self, lexer: &logos::Lexer<TokenKind>) -> TokenValue {
        match self {
            TokenKind::Amp => TokenValue::Amp,
            TokenKind::AmpAmp => TokenValue::AmpAmp,
            TokenKind::Bang => TokenValue::Bang,
            TokenKind::BangEq => TokenValue::BangEq,
            TokenKind::BracketClose => TokenValue::BracketClose,
            TokenKind::BracketOpen => TokenValue::BracketOpen,
            TokenKind::Eq => TokenValue::Eq,
            TokenKind::EqEq => TokenValue::EqEq,
            TokenKind::Gt => TokenValue::Gt,
            TokenKind::GtEq => TokenValue::GtEq,
            TokenKind::Identifier => {
                TokenValue::Identifier(lexer.slice().to_string())
            }
            TokenKind::IntLiteral(int) => TokenValue::IntLiteral(int),
            TokenKind::Lt => TokenValue::Lt,
            TokenKind::LtEq => TokenValue::LtEq,
            TokenKind::Minus => TokenValue::Minus,
            TokenKind::ParenClose => TokenValue::ParenClose,
            TokenKind::ParenOpen => TokenValue::ParenOpen,
            TokenKind::Pipe => TokenValue::Pipe,
            TokenKind::PipePipe => TokenValue::PipePipe,
            TokenKind::Plus => TokenValue::Plus,
        }
    }
}

//===========================================================================//

/// The contents of a single lexical token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenValue {
    /// A "`&`" symbol.
    Amp,
    /// A "`&&`" symbol.
    AmpAmp,
    /// A "`!`" symbol.
    Bang,
    /// A "`!=`" symbol.
    BangEq,
    /// A "`]`" symbol.
    BracketClose,
    /// A "`[`" symbol.
    BracketOpen,
    /// A "`=`" symbol.
    Eq,
    /// A "`==`" symbol.
    EqEq,
    /// A "`>`" symbol.
    Gt,
    /// A "`>=`" symbol.
    GtEq,
    /// An identifier or keyword.
    Identifier(String),
    /// An integer literal, in decimal or `0x` hexadecimal.
    IntLiteral(BigInt),
    /// A "`<`" symbol.
    Lt,
    /// A "`<=`" symbol.
    LtEq,
    /// A "`-`" symbol.
    Minus,
    /// A "`)`" symbol.
    ParenClose,
    /// A "`(`" symbol.
    ParenOpen,
    /// A "`|`" symbol.
    Pipe,
    /// A "`||`" symbol.
    PipePipe,
    /// A "`+`" symbol.
    Plus,
}

impl TokenValue {
    /// Returns the human-readable name for this kind of token.
    pub fn name(&self) -> &'static str {
        match self {
            TokenValue::Amp => "'&'",
            TokenValue::AmpAmp => "'&&'",
            TokenValue::Bang => "'!'",
            TokenValue::BangEq => "'!='",
            TokenValue::BracketClose => "']'",
            TokenValue::BracketOpen => "'['",
            TokenValue::Eq => "'='",
            TokenValue::EqEq => "'=='",
            TokenValue::Gt => "'>'",
            TokenValue::GtEq => "'>='",
            TokenValue::Identifier(_) => "identifier",
            TokenValue::IntLiteral(_) => "int literal",
            TokenValue::Lt => "'<'",
            TokenValue::LtEq => "'<='",
            TokenValue::Minus => "'-'",
            TokenValue::ParenClose => "')'",
            TokenValue::ParenOpen => "'('",
            TokenValue::Pipe => "'|'",
            TokenValue::PipePipe => "'||'",
            TokenValue::Plus => "'+'",
        }
    }
}

//===========================================================================//

/// A single lexical token, including location information.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// The location in the input of the token.
    pub span: SrcSpan,
    /// The contents of the token.
    pub value: TokenValue,
}

//===========================================================================//

/// A lexer for tokenizing a line of debugger input.
pub struct TokenLexer<'a> {
    lexer: logos::Lexer<'a, TokenKind>,
}

impl<'a> TokenLexer<'a> {
    /// Constructs a new lexer in its initial state.
    pub fn new(input: &'a str) -> TokenLexer<'a> {
        TokenLexer { lexer: TokenKind::lexer(input) }
    }

    /// Tokenizes all of `input`, stopping at the first invalid character.
    pub fn tokenize(input: &str) -> Result<Vec<Token>, Vec<ParseError>> {
        TokenLexer::new(input)
            .collect::<Result<Vec<Token>, ParseError>>()
            .map_err(|error| vec![error])
    }
}

impl<'a> Iterator for TokenLexer<'a> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Result<Token, ParseError>> {
        let result = self.lexer.next()?;
        let span = SrcSpan::from_byte_range(self.lexer.span());
        Some(match result {
            Ok(kind) => {
                let value = kind.into_value(&self.lexer);
                Ok(Token { span, value })
            }
            Err(()) => {
                let message =
                    format!("invalid character: {}", self.lexer.slice());
                Err(ParseError::new(span, message))
            }
        })
    }
}

//===========================================================================//


//===========================================================================//
