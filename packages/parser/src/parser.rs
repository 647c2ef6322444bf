use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use std::collections::BTreeMap;

/// Metadata child carrying the sentence identifier
pub const ID_KEY: &str = "ID";
/// Metadata child carrying nested key/value pairs
pub const METADATA_KEY: &str = "METADATA";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Split `word-lemma` tokens into a token and a lemma
    pub dash_lemmata: bool,
}

/// Recursive-descent parser for labeled-bracket treebank text
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
    options: ParseOptions,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, options: ParseOptions) -> Self {
        let tokens = tokenize(source);
        Self {
            tokens,
            pos: 0,
            options,
        }
    }

    /// Parse a complete treebank file
    pub fn parse_treebank(&mut self) -> ParseResult<Treebank> {
        let mut treebank = Treebank::new();

        while !self.is_at_end() {
            match self.peek() {
                Some((Token::LParen, _)) => {
                    treebank.roots.push(self.parse_root()?);
                }
                _ => {
                    return Err(ParseError::unexpected_token(
                        self.peek_span(),
                        "'(' starting a tree",
                        Self::format_token(self.peek()),
                    ));
                }
            }
        }

        Ok(treebank)
    }

    /// A root is either an unlabeled wrapper holding one tree plus metadata,
    /// or a bare labeled tree.
    fn parse_root(&mut self) -> ParseResult<Root> {
        let start = self.peek_span().start;
        let is_wrapper = matches!(
            self.tokens.get(self.pos + 1),
            Some((Token::LParen, _)) | Some((Token::RParen, _))
        );

        if !is_wrapper {
            let tree = self.parse_tree()?;
            return Ok(Root::new(tree));
        }

        self.expect(Token::LParen)?;
        let mut tree: Option<Tree> = None;
        let mut metadata = BTreeMap::new();

        while self.check(Token::LParen) {
            let child_span = self.peek_span();
            match self.tokens.get(self.pos + 1) {
                Some((Token::Atom(label), _)) if *label == ID_KEY => {
                    let child = self.parse_tree()?;
                    match child.body {
                        TreeBody::Leaf { token, .. } => {
                            metadata.insert(ID_KEY.to_string(), token);
                        }
                        TreeBody::Phrase(_) => {
                            return Err(ParseError::invalid_syntax(
                                child_span,
                                "ID must hold a single value",
                            ));
                        }
                    }
                }
                Some((Token::Atom(label), _)) if *label == METADATA_KEY => {
                    self.parse_metadata_block(&mut metadata)?;
                }
                _ => {
                    let child = self.parse_tree()?;
                    if tree.is_some() {
                        return Err(ParseError::invalid_syntax(
                            child_span,
                            "a root wrapper may hold only one tree",
                        ));
                    }
                    tree = Some(child);
                }
            }
        }

        self.expect(Token::RParen)?;
        let end = self.current_span().end;

        match tree {
            Some(tree) => Ok(Root {
                tree,
                metadata,
                span: Span::new(start, end),
            }),
            None => Err(ParseError::invalid_syntax(
                start..end,
                "root wrapper holds no tree",
            )),
        }
    }

    fn parse_metadata_block(&mut self, metadata: &mut BTreeMap<String, String>) -> ParseResult<()> {
        self.expect(Token::LParen)?;
        self.expect_atom("METADATA")?;

        while self.check(Token::LParen) {
            let span = self.peek_span();
            let entry = self.parse_tree()?;
            match entry.body {
                TreeBody::Leaf { token, .. } => {
                    metadata.insert(entry.label, token);
                }
                TreeBody::Phrase(_) => {
                    return Err(ParseError::invalid_syntax(
                        span,
                        "metadata entries must be (KEY VALUE) pairs",
                    ));
                }
            }
        }

        self.expect(Token::RParen)?;
        Ok(())
    }

    /// Parse `(LABEL TOKEN)` or `(LABEL tree+)`
    fn parse_tree(&mut self) -> ParseResult<Tree> {
        let start = self.peek_span().start;
        self.expect(Token::LParen)?;
        let label = self.expect_atom("a node label")?;

        match self.peek() {
            Some((Token::Atom(raw), _)) => {
                let raw = *raw;
                self.advance();
                self.expect(Token::RParen)?;

                let (token, lemma) = if self.options.dash_lemmata {
                    split_dash_lemma(raw)
                } else {
                    (raw.to_string(), None)
                };

                Ok(Tree {
                    label,
                    body: TreeBody::Leaf { token, lemma },
                    span: Span::new(start, self.current_span().end),
                })
            }
            Some((Token::LParen, _)) => {
                let mut children = Vec::new();
                while self.check(Token::LParen) {
                    children.push(self.parse_tree()?);
                }
                self.expect(Token::RParen)?;

                Ok(Tree {
                    label,
                    body: TreeBody::Phrase(children),
                    span: Span::new(start, self.current_span().end),
                })
            }
            Some((Token::RParen, _)) => {
                self.advance();
                Err(ParseError::empty_node(start..self.current_span().end, label))
            }
            None => Err(ParseError::unexpected_eof(
                self.peek_span().start,
                "a token or a child constituent",
            )),
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::unexpected_eof(
                self.peek_span().start,
                token.to_string(),
            ))
        } else {
            Err(ParseError::unexpected_token(
                self.peek_span(),
                token.to_string(),
                Self::format_token(self.peek()),
            ))
        }
    }

    fn expect_atom(&mut self, what: &str) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Atom(s), _)) => {
                let s = s.to_string();
                self.advance();
                Ok(s)
            }
            None => Err(ParseError::unexpected_eof(self.peek_span().start, what)),
            _ => Err(ParseError::unexpected_token(
                self.peek_span(),
                what,
                Self::format_token(self.peek()),
            )),
        }
    }

    /// Span of the token just consumed
    fn current_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| span.clone())
            .unwrap_or(0..0)
    }

    /// Span of the next token, or an empty span at the end of input
    fn peek_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or_else(|| {
                let end = self.tokens.last().map(|(_, span)| span.end).unwrap_or(0);
                end..end
            })
    }

    fn format_token(token: Option<&(Token, std::ops::Range<usize>)>) -> String {
        match token {
            None => "end of file".to_string(),
            Some((t, _)) => t.to_string(),
        }
    }
}

pub fn parse(source: &str) -> ParseResult<Treebank> {
    parse_with_options(source, ParseOptions::default())
}

pub fn parse_with_options(source: &str, options: ParseOptions) -> ParseResult<Treebank> {
    let mut parser = Parser::new(source, options);
    parser.parse_treebank()
}
