/// Try to get a keyword from a string, ignoring string casing.
pub fn keyword_from_str(s: &str) -> Option<Keyword> {
    let s = unicase::Ascii::new(s);
    let idx = match KEYWORD_STRINGS.binary_search(&s) {
        Ok(idx) => idx,
        Err(_) => return None,
    };
    Some(ALL_KEYWORDS[idx])
}

/// Generate an enum of keywords.
macro_rules! define_keywords {
    ($($ident:ident),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($ident),*
        }

        pub const ALL_KEYWORDS: &'static [Keyword] = &[
            $(Keyword::$ident),*
        ];

        pub const KEYWORD_STRINGS: &'static [unicase::Ascii<&'static str>] = &[
            $(unicase::Ascii::new(stringify!($ident)),)*
        ];
    };
}

#[rustfmt::skip]
define_keywords!(
    ALL,
    AND,
    AS,
    ASC,
    BY,
    CROSS,
    DESC,
    FALSE,
    FIRST,
    FROM,
    INNER,
    JOIN,
    LAST,
    LEFT,
    LIMIT,
    NOT,
    NULL,
    NULLS,
    OFFSET,
    ON,
    OR,
    ORDER,
    OUTER,
    SELECT,
    TRUE,
    WHERE
);

/// Keywords that cannot be used as an implicit column alias.
///
/// `SELECT a b` aliases `a` to `b`, but `SELECT a FROM ...` must not treat
/// FROM as an alias.
pub const RESERVED_FOR_COLUMN_ALIAS: &[Keyword] = &[
    Keyword::FROM,
    Keyword::WHERE,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::OFFSET,
];

/// Keywords that cannot be used as an implicit table alias.
pub const RESERVED_FOR_TABLE_ALIAS: &[Keyword] = &[
    Keyword::ON,
    Keyword::WHERE,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::OFFSET,
    Keyword::JOIN,
    Keyword::INNER,
    Keyword::LEFT,
    Keyword::CROSS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        // (input, expected)
        let tests = [
            ("select", Some(Keyword::SELECT)),
            ("SeLeCt", Some(Keyword::SELECT)),
            ("SELECT", Some(Keyword::SELECT)),
            ("NOSELECT", None),
            ("order", Some(Keyword::ORDER)),
            ("nulls", Some(Keyword::NULLS)),
        ];

        for (input, expected) in tests {
            let got = keyword_from_str(input);
            assert_eq!(expected, got);
        }
    }
}
