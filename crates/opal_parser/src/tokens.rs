use opal_error::{OpalError, Result, SourceLocation};

use crate::keywords::{keyword_from_str, Keyword};

/// A word in a sql statement. Can either be a keyword, quoted identifier, or
/// a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Value of the word, with quotes stripped.
    pub value: String,
    /// Quote character if the word was quoted.
    pub quote: Option<char>,
    /// Keyword this word maps to, if any. Always None for quoted words.
    pub keyword: Option<Keyword>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    /// Unparsed number literal.
    Number(String),
    SingleQuotedString(String),
    Comma,
    Whitespace,
    Eq,
    DoubleEq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,
    LeftParen,
    RightParen,
    Period,
    SemiColon,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        match self {
            Token::Word(word) => word.keyword == Some(keyword),
            _ => false,
        }
    }
}

/// A token along with where it sits in the sql text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithLocation {
    pub token: Token,
    pub location: SourceLocation,
}

impl TokenWithLocation {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.token.is_keyword(keyword)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match &self.token {
            Token::Word(word) => word.keyword,
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    location: SourceLocation,
}

impl<'a> Tokenizer<'a> {
    pub fn new(sql: &'a str) -> Self {
        Tokenizer {
            chars: sql.chars().peekable(),
            location: SourceLocation::default(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithLocation>> {
        let mut toks = Vec::new();
        loop {
            let location = self.location;
            let token = match self.next_token()? {
                Some(token) => token,
                None => break,
            };
            toks.push(TokenWithLocation { token, location });
        }
        Ok(toks)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let tok = match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(|c| c.is_whitespace()) {
                    self.next();
                }
                Token::Whitespace
            }
            '\'' => Token::SingleQuotedString(self.take_quoted_string()?),
            '"' => {
                let start = self.location;
                self.next();
                let mut value = String::new();
                loop {
                    match self.next() {
                        Some('"') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Err(OpalError::syntax(
                                "unterminated quoted identifier",
                                start,
                            ))
                        }
                    }
                }
                Token::Word(Word {
                    value,
                    quote: Some('"'),
                    keyword: None,
                })
            }
            c if c.is_ascii_digit() => {
                let mut value = String::new();
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E')
                {
                    value.push(self.next().unwrap());
                }
                Token::Number(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut value = String::new();
                while self
                    .peek()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_')
                {
                    value.push(self.next().unwrap());
                }
                let keyword = keyword_from_str(&value);
                Token::Word(Word {
                    value,
                    quote: None,
                    keyword,
                })
            }
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '.' => self.single(Token::Period),
            ';' => self.single(Token::SemiColon),
            '+' => self.single(Token::Plus),
            '*' => self.single(Token::Mul),
            '/' => self.single(Token::Div),
            '%' => self.single(Token::Mod),
            '-' => {
                self.next();
                if self.peek() == Some('-') {
                    // Line comment, skip to end of line.
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.next();
                    }
                    return self.next_token();
                }
                Token::Minus
            }
            '=' => {
                self.next();
                if self.peek() == Some('=') {
                    self.next();
                    Token::DoubleEq
                } else {
                    Token::Eq
                }
            }
            '!' => {
                self.next();
                match self.next() {
                    Some('=') => Token::Neq,
                    _ => {
                        return Err(OpalError::syntax(
                            "expected '=' after '!'",
                            self.location,
                        ))
                    }
                }
            }
            '<' => {
                self.next();
                match self.peek() {
                    Some('=') => {
                        self.next();
                        Token::LtEq
                    }
                    Some('>') => {
                        self.next();
                        Token::Neq
                    }
                    _ => Token::Lt,
                }
            }
            '>' => {
                self.next();
                if self.peek() == Some('=') {
                    self.next();
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            '|' => {
                self.next();
                match self.next() {
                    Some('|') => Token::Concat,
                    _ => {
                        return Err(OpalError::syntax(
                            "expected '|' after '|'",
                            self.location,
                        ))
                    }
                }
            }
            other => {
                return Err(OpalError::syntax(
                    format!("unexpected character: {other}"),
                    self.location,
                ))
            }
        };

        Ok(Some(tok))
    }

    /// Consume a single-quoted string, handling doubled quote escapes.
    fn take_quoted_string(&mut self) -> Result<String> {
        let start = self.location;
        self.next();
        let mut value = String::new();
        loop {
            match self.next() {
                Some('\'') => {
                    // '' inside a string is an escaped quote.
                    if self.peek() == Some('\'') {
                        self.next();
                        value.push('\'');
                        continue;
                    }
                    return Ok(value);
                }
                Some(c) => value.push(c),
                None => return Err(OpalError::syntax("unterminated string literal", start)),
            }
        }
    }

    fn single(&mut self, tok: Token) -> Token {
        self.next();
        tok
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.location.line += 1;
            self.location.col = 0;
        } else {
            self.location.col += 1;
        }
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Tokenizer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !matches!(t, Token::Whitespace))
            .collect()
    }

    #[test]
    fn operators() {
        let toks = tokens("a <= b <> c || 'd'");
        assert_eq!(
            vec![
                Token::Word(Word {
                    value: "a".to_string(),
                    quote: None,
                    keyword: None
                }),
                Token::LtEq,
                Token::Word(Word {
                    value: "b".to_string(),
                    quote: None,
                    keyword: None
                }),
                Token::Neq,
                Token::Word(Word {
                    value: "c".to_string(),
                    quote: None,
                    keyword: None
                }),
                Token::Concat,
                Token::SingleQuotedString("d".to_string()),
            ],
            toks
        );
    }

    #[test]
    fn quoted_ident_keeps_case_and_never_keyword() {
        let toks = tokens("\"Year\"");
        assert_eq!(
            vec![Token::Word(Word {
                value: "Year".to_string(),
                quote: Some('"'),
                keyword: None
            })],
            toks
        );
    }

    #[test]
    fn string_escape() {
        let toks = tokens("'it''s'");
        assert_eq!(vec![Token::SingleQuotedString("it's".to_string())], toks);
    }

    #[test]
    fn locations_tracked() {
        let toks = Tokenizer::new("select\n  x").tokenize().unwrap();
        let word = toks.last().unwrap();
        assert_eq!(1, word.location.line);
        assert_eq!(2, word.location.col);
    }

    #[test]
    fn unterminated_string_errors() {
        Tokenizer::new("'oops").tokenize().unwrap_err();
    }
}
