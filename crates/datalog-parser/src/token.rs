use chumsky::prelude::*;
use std::fmt;

use crate::Span;

pub type SpannedToken = (Token, Span);
pub type LexError = Simple<char, Span>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(String),
    Variable(String),
    Number(String),
    String(String),
    Operator(String),
    RuleSep,
    LParen,
    RParen,
    Comma,
    Dot,
    Tilde,
    Question,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(text) => write!(f, "{}", text),
            Token::Variable(text) => write!(f, "{}", text),
            Token::Number(text) => write!(f, "{}", text),
            Token::String(text) => write!(f, "\"{}\"", text),
            Token::Operator(text) => write!(f, "{}", text),
            Token::RuleSep => write!(f, ":-"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Tilde => write!(f, "~"),
            Token::Question => write!(f, "?"),
        }
    }
}

fn string_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    let escape_sequence = just('\\').ignore_then(choice((
        just('"').to('"'),
        just('n').to('\n'),
        just('t').to('\t'),
        just('\\').to('\\'),
    )));

    let string_char = choice((
        escape_sequence,
        filter(|c| *c != '"' && *c != '\\' && *c != '\n'),
    ));

    just('"')
        .ignore_then(string_char.repeated())
        .then_ignore(just('"'))
        .collect::<String>()
        .labelled("string")
}

fn number_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .map(|(sign, digits): (Option<char>, String)| {
            if sign.is_some() {
                format!("-{}", digits)
            } else {
                digits
            }
        })
        .labelled("number")
}

fn identifier() -> impl Parser<char, Token, Error = LexError> + Clone {
    text::ident()
        .map(|ident: String| {
            let uppercase_initial = ident
                .chars()
                .next()
                .is_some_and(|first| first.is_uppercase());
            if uppercase_initial {
                Token::Variable(ident)
            } else {
                Token::Ident(ident)
            }
        })
        .labelled("identifier")
}

fn line_comment() -> impl Parser<char, (), Error = LexError> + Clone {
    just('%')
        .then(filter(|c| *c != '\n').repeated())
        .ignored()
        .labelled("comment")
}

fn spacing() -> impl Parser<char, (), Error = LexError> + Clone {
    line_comment()
        .or(text::whitespace().at_least(1).ignored())
        .repeated()
        .ignored()
}

pub fn lexer() -> impl Parser<char, Vec<SpannedToken>, Error = LexError> + Clone {
    let punct = choice((
        just(":-").to(Token::RuleSep),
        just('=').to(Token::Operator("=".to_string())),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
        just('~').to(Token::Tilde),
        just('?').to(Token::Question),
    ));

    let token = choice((
        string_literal().map(Token::String),
        number_literal().map(Token::Number),
        identifier(),
        punct,
    ))
    .map_with_span(|token, span| (token, span))
    .padded_by(spacing());

    token.repeated().then_ignore(end())
}
