pub mod expr;
pub use expr::*;
pub mod from;
pub use from::*;
pub mod modifiers;
pub use modifiers::*;
pub mod query;
pub use query::*;
pub mod select;
pub use select::*;

use std::fmt;

use opal_error::{OpalError, Result};
use serde::{Deserialize, Serialize};

use crate::parser::Parser;
use crate::tokens::Token;

pub trait AstParseable: Sized {
    /// Parse an instance of Self from the provided parser.
    ///
    /// It's assumed that the parser is in the correct state for parsing Self,
    /// and if it isn't, an error should be returned.
    fn parse(parser: &mut Parser) -> Result<Self>;
}

#[cfg(test)]
mod testutil {
    use crate::tokens::Tokenizer;

    use super::*;

    /// Parse an AST node directly from a string.
    pub(crate) fn parse_ast<A: AstParseable>(s: &str) -> Result<A> {
        let toks = Tokenizer::new(s).tokenize()?;
        let mut parser = Parser::with_tokens(toks);
        A::parse(&mut parser)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub value: String,
    /// Whether the identifier was quoted in the sql text. Quoted identifiers
    /// always match exactly during binding.
    pub quoted: bool,
}

impl Ident {
    pub fn from_string(s: impl Into<String>) -> Self {
        Ident {
            value: s.into(),
            quoted: false,
        }
    }
}

impl AstParseable for Ident {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok,
            None => {
                return Err(OpalError::syntax(
                    "expected identifier, found end of statement",
                    Default::default(),
                ))
            }
        };

        match &tok.token {
            Token::Word(w) => Ok(Ident {
                value: w.value.clone(),
                quoted: w.quote.is_some(),
            }),
            other => Err(OpalError::syntax(
                format!("unexpected token: {other:?}, expected an identifier"),
                tok.location,
            )),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A dot-separated reference to an object, e.g. `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectReference(pub Vec<Ident>);

impl ObjectReference {
    /// Create an object reference from an iterator of strings.
    ///
    /// Useful in tests, probably unlikely that it should be used anywhere
    /// else.
    pub fn from_strings<S>(strings: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        ObjectReference(strings.into_iter().map(Ident::from_string).collect())
    }

    pub fn base(&self) -> Result<&Ident> {
        self.0
            .last()
            .ok_or_else(|| OpalError::Internal("empty object reference".to_string()))
    }
}

impl AstParseable for ObjectReference {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut idents = Vec::new();
        loop {
            idents.push(Ident::parse(parser)?);

            // Check if the next token is a period for possible compound
            // identifiers. If not, we're done.
            if !parser.consume_token(&Token::Period) {
                break;
            }
        }

        Ok(ObjectReference(idents))
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings: Vec<_> = self.0.iter().map(|ident| ident.value.clone()).collect();
        write!(f, "{}", strings.join("."))
    }
}
