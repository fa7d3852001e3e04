use logos::Logos;
use std::ops::Range;

/// Expression token. Keywords accept both the lowercase and the capitalised
/// spelling of booleans, since configs are often written by people used to
/// Python.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // === Keywords ===
    #[token("and")]
    #[token("&&")]
    And,
    #[token("or")]
    #[token("||")]
    Or,
    #[token("not")]
    #[token("!")]
    Not,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("true")]
    #[token("True")]
    True,
    #[token("false")]
    #[token("False")]
    False,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Tokenize `source`, keeping each token's byte span. Returns the offset of
/// the first unrecognised character on failure.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, usize> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn indexing_and_fields() {
        assert_eq!(
            kinds("v[0].fingerCurl"),
            vec![
                Token::Ident("v".into()),
                Token::LBracket,
                Token::Int(0),
                Token::RBracket,
                Token::Dot,
                Token::Ident("fingerCurl".into()),
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a ** b // c != d"),
            vec![
                Token::Ident("a".into()),
                Token::StarStar,
                Token::Ident("b".into()),
                Token::SlashSlash,
                Token::Ident("c".into()),
                Token::BangEq,
                Token::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(
            kinds("1 2.5 .5 3. 1e3 2.0e-2"),
            vec![
                Token::Int(1),
                Token::Float(2.5),
                Token::Float(0.5),
                Token::Float(3.0),
                Token::Float(1000.0),
                Token::Float(0.02),
            ]
        );
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(kinds("True"), vec![Token::True]);
        assert_eq!(kinds("android"), vec![Token::Ident("android".into())]);
        assert_eq!(kinds("x and not y"), vec![
            Token::Ident("x".into()),
            Token::And,
            Token::Not,
            Token::Ident("y".into()),
        ]);
    }

    #[test]
    fn spans_are_byte_offsets() {
        let tokens = tokenize("v[1] +  2").unwrap();
        assert_eq!(tokens[4].1, 5..6);
        assert_eq!(tokens[5].1, 8..9);
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(tokenize("v[0] $ 1"), Err(5));
        assert_eq!(tokenize("'text'"), Err(0));
    }
}
