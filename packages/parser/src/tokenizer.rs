use logos::Logos;
use std::fmt;

/// Token types for labeled-bracket treebank text
///
/// Everything that is not whitespace or a parenthesis is an atom: node
/// labels, words, traces, lemmata and metadata values all lex the same way.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token<'src> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[^() \t\n\r\f]+", |lex| lex.slice())]
    Atom(&'src str),
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Atom(s) => write!(f, "'{}'", s),
        }
    }
}

/// Tokenize a source string
pub fn tokenize(source: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    let lexer = Token::lexer(source);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}
