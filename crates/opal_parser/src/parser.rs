use opal_error::{OpalError, Result, SourceLocation};

use crate::ast::{AstParseable, Ident, QueryNode};
use crate::keywords::Keyword;
use crate::statement::Statement;
use crate::tokens::{Token, TokenWithLocation, Tokenizer};

/// Parse sql text into statements.
pub fn parse(sql: &str) -> Result<Vec<Statement>> {
    let toks = Tokenizer::new(sql).tokenize()?;
    Parser::with_tokens(toks).parse_statements()
}

#[derive(Debug)]
pub struct Parser {
    toks: Vec<TokenWithLocation>,
    /// Index of token we should process next.
    pub(crate) idx: usize,
}

impl Parser {
    pub fn with_tokens(toks: Vec<TokenWithLocation>) -> Self {
        Parser { toks, idx: 0 }
    }

    pub fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            // Skip empty statements.
            while self.consume_token(&Token::SemiColon) {}
            if self.peek().is_none() {
                break;
            }

            statements.push(self.parse_statement()?);

            match self.peek() {
                Some(tok) if tok.token == Token::SemiColon => continue,
                Some(tok) => {
                    return Err(OpalError::syntax(
                        format!("unexpected token after statement: {:?}", tok.token),
                        tok.location,
                    ))
                }
                None => break,
            }
        }
        Ok(statements)
    }

    pub fn parse_statement(&mut self) -> Result<Statement> {
        let keyword = match self.peek() {
            Some(tok) => tok.keyword(),
            None => {
                return Err(OpalError::syntax(
                    "empty sql statement",
                    SourceLocation::default(),
                ))
            }
        };

        match keyword {
            Some(Keyword::SELECT) => Ok(Statement::Query(QueryNode::parse(self)?)),
            _ => Err(self.error_at_current("expected a sql statement")),
        }
    }

    /// Parse a single keyword.
    pub fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if tok.is_keyword(keyword) {
                return true;
            }
        }

        // Keyword doesn't match. Reset index and return.
        self.idx = idx;
        false
    }

    /// Parse an exact sequence of keywords.
    ///
    /// If the sequence doesn't match, idx is not changed, and false is
    /// returned.
    pub fn parse_keyword_sequence(&mut self, keywords: &[Keyword]) -> bool {
        let idx = self.idx;
        for keyword in keywords {
            if let Some(tok) = self.next() {
                if tok.is_keyword(*keyword) {
                    continue;
                }
            }

            // Keyword doesn't match. Reset index and return.
            self.idx = idx;
            return false;
        }
        true
    }

    /// Parse any one of the provided keywords, returning which one matched.
    pub fn parse_one_of_keywords(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        let idx = self.idx;
        let kw = self.next().and_then(|tok| tok.keyword());

        if let Some(kw) = kw {
            if keywords.contains(&kw) {
                return Some(kw);
            }
        }

        // No matches, reset index.
        self.idx = idx;
        None
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if !self.parse_keyword(keyword) {
            return Err(self.error_at_current(format!("expected keyword {keyword:?}")));
        }
        Ok(())
    }

    /// Consume the next token if it matches the expected token.
    pub fn consume_token(&mut self, expected: &Token) -> bool {
        let idx = self.idx;
        if let Some(tok) = self.next() {
            if &tok.token == expected {
                return true;
            }
        }
        self.idx = idx;
        false
    }

    pub fn expect_token(&mut self, expected: &Token) -> Result<()> {
        if !self.consume_token(expected) {
            return Err(self.error_at_current(format!("expected {expected:?}")));
        }
        Ok(())
    }

    /// Parse a comma-separated list of items.
    pub fn parse_comma_separated<T, F>(&mut self, mut f: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Parser) -> Result<T>,
    {
        let mut values = Vec::new();
        loop {
            values.push(f(self)?);
            if !self.consume_token(&Token::Comma) {
                break;
            }
        }
        Ok(values)
    }

    /// Parse an optional alias, either bare or following AS.
    ///
    /// A bare word is only treated as an alias if it's not one of the reserved
    /// keywords for the current clause.
    pub fn parse_alias(&mut self, reserved: &[Keyword]) -> Result<Option<Ident>> {
        let explicit = self.parse_keyword(Keyword::AS);

        let idx = self.idx;
        let tok = match self.next() {
            Some(tok) => tok.clone(),
            None if explicit => return Err(self.error_at_current("expected an alias after AS")),
            None => return Ok(None),
        };

        match &tok.token {
            Token::Word(word) => match word.keyword {
                Some(kw) if !explicit && reserved.contains(&kw) => {
                    // Unaliased, and the next word is part of the next
                    // clause.
                    self.idx = idx;
                    Ok(None)
                }
                _ => Ok(Some(Ident {
                    value: word.value.clone(),
                    quoted: word.quote.is_some(),
                })),
            },
            _ if explicit => Err(OpalError::syntax(
                "expected an alias after AS",
                tok.location,
            )),
            _ => {
                self.idx = idx;
                Ok(None)
            }
        }
    }

    /// Get the next non-whitespace token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&TokenWithLocation> {
        loop {
            if self.idx >= self.toks.len() {
                return None;
            }

            let tok = &self.toks[self.idx];
            self.idx += 1;

            if matches!(&tok.token, Token::Whitespace) {
                continue;
            }

            return Some(tok);
        }
    }

    /// Peek at the next non-whitespace token without consuming it.
    pub fn peek(&mut self) -> Option<&TokenWithLocation> {
        let idx = self.idx;
        let found = loop {
            if self.idx >= self.toks.len() {
                break None;
            }
            if matches!(self.toks[self.idx].token, Token::Whitespace) {
                self.idx += 1;
                continue;
            }
            break Some(self.idx);
        };
        self.idx = idx;
        found.map(|i| &self.toks[i])
    }

    /// Location of the token that would be returned by `next`, for error
    /// reporting.
    pub fn location(&mut self) -> SourceLocation {
        match self.peek() {
            Some(tok) => tok.location,
            None => self
                .toks
                .last()
                .map(|tok| tok.location)
                .unwrap_or_default(),
        }
    }

    pub fn error_at_current(&mut self, message: impl Into<String>) -> OpalError {
        let location = self.location();
        let message = match self.peek() {
            Some(tok) => format!("{}, got {:?}", message.into(), tok.token),
            None => format!("{}, found end of statement", message.into()),
        };
        OpalError::syntax(message, location)
    }
}
