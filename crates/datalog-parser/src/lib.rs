//! Parser for the textual Datalog surface syntax.
//!
//! Built as a chumsky combinator pipeline: a character-level lexer producing
//! spanned tokens, then a token-level statement parser. Statements are
//! clauses with a terminator selecting the action:
//!
//! - `ancestor(alice, bob).` asserts
//! - `ancestor(X, Z) :- ancestor(X, Y), ancestor(Y, Z).` asserts a rule
//! - `ancestor(alice, bob)~` retracts
//! - `ancestor(X, Y)?` queries
//!
//! `%` starts a line comment; whitespace is insignificant. Uppercase-initial
//! identifiers are variables; bare words, quoted strings, and integers are
//! constants.

pub mod ast;
mod parser;
mod span;
mod src;
mod token;

pub use ast::{Action, Atom, Clause, Program, Statement, Symbol, Term, Value};
pub use parser::{parse_program, parse_statement, ParseError};
pub use span::Span;
pub use src::SrcId;
pub use token::{LexError, Token};
