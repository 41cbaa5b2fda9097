//! Statement parser for textual Datalog.
//!
//! Grammar, with `%` line comments and insignificant whitespace:
//!
//! ```text
//! program   := statement*
//! statement := clause '.'            assert
//!            | clause '~'            retract
//!            | literal '?'           query
//! clause    := literal (':-' literal (',' literal)*)?
//! literal   := pred | pred '(' term (',' term)* ')'
//! term      := Variable | Ident | Number | String
//! ```
//!
//! [`parse_program`] requires a terminator on every statement.
//! [`parse_statement`] accepts exactly one statement whose terminator may be
//! omitted; callers that already know the intended action (the engine's
//! single-statement helpers) use it and check the action themselves.

use chumsky::prelude::*;
use chumsky::stream::Stream;
use internment::Intern;

use crate::ast::{Action, Atom, Clause, Program, Statement, Term, Value};
use crate::token::{lexer, LexError, SpannedToken, Token};
use crate::{Span, SrcId};

type ParserError = Simple<Token, Span>;

#[derive(Debug, Clone)]
pub enum ParseError {
    Lex(LexError),
    Parse(ParserError),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(error) => error.span(),
            ParseError::Parse(error) => error.span(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParseError::Lex(error) => error.to_string(),
            ParseError::Parse(error) => error.to_string(),
        }
    }
}

fn lex_with_src(input: &str, src: SrcId) -> Result<Vec<SpannedToken>, Vec<ParseError>> {
    let len = input.chars().count();
    let eoi = Span::new(src, len..len);
    let stream = Stream::from_iter(
        eoi,
        input
            .chars()
            .enumerate()
            .map(|(idx, ch)| (ch, Span::new(src, idx..idx + 1))),
    );
    lexer()
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Lex).collect())
}

fn parse_with<T>(
    parser: impl Parser<Token, T, Error = ParserError>,
    input: &str,
    src: SrcId,
) -> Result<T, Vec<ParseError>> {
    let tokens = lex_with_src(input, src)?;
    let end = input.chars().count();
    let eoi = Span::new(src, end..end);
    let stream = Stream::from_iter(eoi, tokens.into_iter());
    parser
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Parse).collect())
}

fn term() -> impl Parser<Token, Term, Error = ParserError> + Clone {
    select! {
        Token::Variable(name) => Term::Variable(Intern::new(name)),
        Token::Ident(name) => Term::Constant(Value::Atom(Intern::new(name))),
        Token::String(text) => Term::Constant(Value::Str(Intern::new(text))),
    }
    .or(select! { Token::Number(digits) => digits }.try_map(|digits: String, span| {
        digits
            .parse::<i64>()
            .map(|n| Term::Constant(Value::Int(n)))
            .map_err(|_| ParserError::custom(span, "integer out of range"))
    }))
    .labelled("term")
}

fn literal() -> impl Parser<Token, Atom, Error = ParserError> + Clone {
    // Operator predicates (`=`) name primitives; they parse like any other
    // predicate symbol.
    select! {
        Token::Ident(name) => name,
        Token::Operator(name) => name,
    }
    .then(
        term()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .or_not(),
    )
    .map(|(predicate, terms)| Atom {
        predicate: Intern::new(predicate),
        terms: terms.unwrap_or_default(),
    })
    .labelled("literal")
}

fn clause() -> impl Parser<Token, Clause, Error = ParserError> + Clone {
    literal()
        .then(
            just(Token::RuleSep)
                .ignore_then(literal().separated_by(just(Token::Comma)).at_least(1))
                .or_not(),
        )
        .map(|(head, body)| Clause {
            head,
            body: body.unwrap_or_default(),
        })
        .labelled("clause")
}

fn terminator() -> impl Parser<Token, Action, Error = ParserError> + Clone {
    choice((
        just(Token::Dot).to(Action::Assert),
        just(Token::Tilde).to(Action::Retract),
        just(Token::Question).to(Action::Query),
    ))
    .labelled("terminator")
}

/// A query must be a single literal; `head :- body ?` is rejected here.
fn check_query_shape(
    clause: &Clause,
    action: Option<Action>,
    span: Span,
) -> Result<(), ParserError> {
    if action == Some(Action::Query) && !clause.is_fact() {
        Err(ParserError::custom(span, "a query is a single literal"))
    } else {
        Ok(())
    }
}

fn statement() -> impl Parser<Token, Statement, Error = ParserError> + Clone {
    clause()
        .then(terminator())
        .try_map(|(clause, action), span| {
            check_query_shape(&clause, Some(action), span)?;
            Ok(Statement { clause, action })
        })
        .labelled("statement")
}

fn program() -> impl Parser<Token, Program, Error = ParserError> + Clone {
    statement()
        .repeated()
        .map(|statements| Program { statements })
        .then_ignore(end())
        .labelled("program")
}

/// Parse a whole program; every statement must carry its terminator.
pub fn parse_program(input: &str, src: SrcId) -> Result<Program, Vec<ParseError>> {
    parse_with(program(), input, src)
}

/// Parse exactly one statement. The terminator may be omitted, in which case
/// the action comes back as `None` and the caller decides what was meant.
pub fn parse_statement(
    input: &str,
    src: SrcId,
) -> Result<(Clause, Option<Action>), Vec<ParseError>> {
    let single = clause()
        .then(terminator().or_not())
        .try_map(|(clause, action), span| {
            check_query_shape(&clause, action, span)?;
            Ok((clause, action))
        })
        .then_ignore(end());
    parse_with(single, input, src)
}
