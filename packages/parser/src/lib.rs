pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{is_empty_category, split_dash_lemma, Root, Span, Tree, TreeBody, Treebank};
pub use error::{format_error, ParseError, ParseResult};
pub use parser::{parse, parse_with_options, ParseOptions, Parser};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let source = "(N cat)";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 4);
    }
}
