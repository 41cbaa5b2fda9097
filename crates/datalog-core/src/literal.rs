//! Literals and clauses, with their canonical tags.
//!
//! A literal's *variant tag* identifies it up to consistent renaming of
//! variables; its *identity tag* identifies it exactly, variables included.
//! The prover keys its subgoal table by variant tag and deduplicates answers
//! by identity tag. Both are memoized on the literal, which is sound because
//! a literal's arguments never change after construction. Clause tags are
//! computed on demand (retraction is the only consumer) and share a single
//! variable-numbering map across head and body.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::database::Error;
use crate::id::Id;
use crate::term::{Pred, Term, Variable};

/// A predicate applied to terms, e.g. `ancestor(alice, X)`.
pub struct Literal {
    pred: Pred,
    args: Vec<Term>,
    variant_tag: OnceCell<String>,
    identity_tag: OnceCell<String>,
}

impl Literal {
    /// Build a literal, checking the argument count against the predicate's
    /// arity.
    pub fn new(pred: &Pred, args: Vec<Term>) -> Result<Rc<Literal>, Error> {
        if args.len() != pred.arity() {
            return Err(Error::ArityMismatch {
                predicate: pred.name(),
                expected: pred.arity(),
                actual: args.len(),
            });
        }
        Ok(Rc::new(Literal::raw(Rc::clone(pred), args)))
    }

    /// Construct without the arity check, for internal callers that preserve
    /// the argument count of an existing literal.
    pub(crate) fn raw(pred: Pred, args: Vec<Term>) -> Literal {
        Literal {
            pred,
            args,
            variant_tag: OnceCell::new(),
            identity_tag: OnceCell::new(),
        }
    }

    pub fn pred(&self) -> &Pred {
        &self.pred
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_constant)
    }

    pub(crate) fn has_var(&self, variable: &Rc<Variable>) -> bool {
        self.args.iter().any(|arg| arg.id() == variable.id())
    }

    /// Canonical string equal for two literals iff they are identical modulo
    /// a bijective renaming of variables.
    pub fn variant_tag(&self) -> &str {
        self.variant_tag.get_or_init(|| {
            let mut buf = String::new();
            self.write_tag(&mut buf, Some(&mut HashMap::new()));
            buf
        })
    }

    /// Canonical string equal for two literals iff they are identical,
    /// variables included.
    pub fn identity_tag(&self) -> &str {
        self.identity_tag.get_or_init(|| {
            let mut buf = String::new();
            self.write_tag(&mut buf, None);
            buf
        })
    }

    /// Tag encoding: `hex(pred-id)` then `,hex(const-id)` per constant. With
    /// a numbering map, variables render as `v0`, `v1`, ... in first
    /// occurrence order; without one, by their own id.
    fn write_tag(&self, buf: &mut String, mut var_numbers: Option<&mut HashMap<Id, usize>>) {
        buf.push_str(&format!("{:x}", self.pred.id()));
        for arg in &self.args {
            buf.push(',');
            match arg {
                Term::Constant(constant) => buf.push_str(&format!("{:x}", constant.id())),
                Term::Variable(variable) => match var_numbers.as_deref_mut() {
                    Some(numbers) => {
                        let next = numbers.len();
                        let number = *numbers.entry(variable.id()).or_insert(next);
                        buf.push_str(&format!("v{}", number));
                    }
                    None => buf.push_str(&format!("{:x}", variable.id())),
                },
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pred)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "({}", first)?;
            for arg in rest {
                write!(f, ", {}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A Horn clause `head :- body`. With an empty body it is a fact, otherwise
/// a rule.
pub struct Clause {
    head: Rc<Literal>,
    body: Vec<Rc<Literal>>,
}

impl Clause {
    pub fn new(head: Rc<Literal>, body: Vec<Rc<Literal>>) -> Clause {
        Clause { head, body }
    }

    pub fn fact(head: Rc<Literal>) -> Clause {
        Clause {
            head,
            body: Vec::new(),
        }
    }

    pub fn head(&self) -> &Rc<Literal> {
        &self.head
    }

    pub fn body(&self) -> &[Rc<Literal>] {
        &self.body
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// A clause is safe when every variable in the head also appears in the
    /// body. Only safe clauses may be asserted.
    pub fn is_safe(&self) -> bool {
        self.head.args().iter().all(|arg| match arg {
            Term::Variable(variable) => self.body.iter().any(|part| part.has_var(variable)),
            Term::Constant(_) => true,
        })
    }

    /// Variant tag for the whole clause: head and body tags under one shared
    /// variable numbering, body parts separated by `;`.
    pub fn variant_tag(&self) -> String {
        let mut numbers = HashMap::new();
        let mut buf = String::new();
        self.head.write_tag(&mut buf, Some(&mut numbers));
        for part in &self.body {
            buf.push(';');
            part.write_tag(&mut buf, Some(&mut numbers));
        }
        buf
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

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
