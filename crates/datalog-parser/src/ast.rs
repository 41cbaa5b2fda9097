//! Syntax tree for textual Datalog programs.
//!
//! A program is a list of statements; each statement is a clause plus the
//! action its terminator selects:
//!
//! - `ancestor(alice, bob).` asserts
//! - `ancestor(X, Z) :- ancestor(X, Y), ancestor(Y, Z).` asserts a rule
//! - `ancestor(alice, bob)~` retracts
//! - `ancestor(X, Y)?` queries (always a single literal, never a rule)
//!
//! Terms are variables (uppercase-initial) or constants (bare identifiers,
//! quoted strings, integers). Identifier text is interned; mapping equal
//! text to *the same engine object* is the engine's job, not the parser's.

use internment::Intern;
use std::fmt;

/// Interned string for identifiers.
pub type Symbol = Intern<String>;

/// A constant value in the surface syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Bare identifier constant, e.g. `alice`.
    Atom(Symbol),
    /// Quoted string constant, e.g. `"bob smith"`.
    Str(Symbol),
    /// Integer constant, e.g. `42`, `-7`.
    Int(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Atom(name) => write!(f, "{}", name),
            Value::Str(text) => write!(f, "{:?}", text.as_ref()),
            Value::Int(n) => write!(f, "{}", n),
        }
    }
}

/// An argument term: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Variable(Symbol),
    Constant(Value),
}

impl Term {
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{}", name),
            Term::Constant(value) => write!(f, "{}", value),
        }
    }
}

/// A predicate applied to terms: `ancestor(alice, X)`. Arity-zero atoms are
/// written bare: `done`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: Symbol,
    pub terms: Vec<Term>,
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate)?;
        if let Some((first, rest)) = self.terms.split_first() {
            write!(f, "({}", first)?;
            for term in rest {
                write!(f, ", {}", term)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// `head :- body`; a fact when the body is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub head: Atom,
    pub body: Vec<Atom>,
}

impl Clause {
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if let Some((first, rest)) = self.body.split_first() {
            write!(f, " :- {}", first)?;
            for part in rest {
                write!(f, ", {}", part)?;
            }
        }
        Ok(())
    }
}

/// What a statement's terminator asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `.`
    Assert,
    /// `~`
    Retract,
    /// `?`
    Query,
}

/// One terminated statement of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub clause: Clause,
    pub action: Action,
}

/// A parsed program: statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}
