//! Assertion and retraction against database predicates.
//!
//! Each database predicate owns its clause list; clauses whose head uses the
//! predicate are appended on assert and removed by variant match on retract.
//! Within a predicate the list is an unordered bag as far as query answers
//! go, so removal swaps with the last element.

use std::fmt;
use std::rc::Rc;

use crate::literal::Clause;
use crate::term::{Relation, Symbol};

/// Errors surfaced by construction and mutation. Query evaluation never
/// fails; an unprovable target yields an empty answer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Literal constructed with the wrong number of arguments.
    ArityMismatch {
        predicate: Symbol,
        expected: usize,
        actual: usize,
    },
    /// Asserted clause has a head variable that is missing from the body.
    UnsafeClause,
    /// Assert or retract against a primitive predicate.
    NotADatabasePredicate,
    /// `retract_one` found no matching clause.
    NoSuchClause,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ArityMismatch {
                predicate,
                expected,
                actual,
            } => write!(
                f,
                "arity mismatch for {}: expected {} arguments, got {}",
                predicate, expected, actual
            ),
            Error::UnsafeClause => write!(f, "can't assert unsafe clause"),
            Error::NotADatabasePredicate => write!(f, "can't modify primitive predicate"),
            Error::NoSuchClause => write!(f, "retract found no matching clause"),
        }
    }
}

impl std::error::Error for Error {}

impl Clause {
    /// Add this clause to its head predicate's database. The clause must be
    /// safe and the predicate must not be primitive. Duplicates are stored.
    pub fn assert(self: Rc<Self>) -> Result<(), Error> {
        if !self.is_safe() {
            return Err(Error::UnsafeClause);
        }
        let pred = Rc::clone(self.head().pred());
        let Relation::Database(clauses) = pred.relation() else {
            return Err(Error::NotADatabasePredicate);
        };
        clauses.borrow_mut().push(self);
        Ok(())
    }

    /// Remove every stored clause that is a variant of this one (identical
    /// modulo variable renaming). Returns the number removed; removing
    /// nothing is not an error.
    pub fn retract(&self) -> Result<usize, Error> {
        let pred = Rc::clone(self.head().pred());
        let Relation::Database(clauses) = pred.relation() else {
            return Err(Error::NotADatabasePredicate);
        };
        let tag = self.variant_tag();
        let mut clauses = clauses.borrow_mut();
        let before = clauses.len();
        let mut i = 0;
        while i < clauses.len() {
            if clauses[i].variant_tag() == tag {
                clauses.swap_remove(i);
            } else {
                i += 1;
            }
        }
        Ok(before - clauses.len())
    }

    /// Remove exactly one stored variant of this clause. The body length is
    /// compared first to skip tag computation for clauses that cannot match.
    pub fn retract_one(&self) -> Result<(), Error> {
        let pred = Rc::clone(self.head().pred());
        let Relation::Database(clauses) = pred.relation() else {
            return Err(Error::NotADatabasePredicate);
        };
        let body_len = self.body().len();
        let tag = self.variant_tag();
        let mut clauses = clauses.borrow_mut();
        let found = clauses
            .iter()
            .position(|clause| clause.body().len() == body_len && clause.variant_tag() == tag);
        match found {
            Some(i) => {
                clauses.swap_remove(i);
                Ok(())
            }
            None => Err(Error::NoSuchClause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::primitive::Equals;
    use crate::term::{Constant, Predicate, Term, Value, Variable};
    use internment::Intern;

    fn atom(name: &str) -> Term {
        Term::Constant(Constant::new(Value::Atom(Intern::new(name.to_string()))))
    }

    fn var(name: &str) -> Term {
        Term::Variable(Variable::named(name))
    }

    // ===== Assert =====

    #[test]
    fn test_assert_fact() {
        let parent = Predicate::database("parent", 2);
        let fact = Clause::fact(Literal::new(&parent, vec![atom("john"), atom("mary")]).unwrap());
        Rc::new(fact).assert().unwrap();
        assert_eq!(parent.clause_count(), 1);
    }

    #[test]
    fn test_assert_unsafe_rejected() {
        let p = Predicate::database("p", 1);
        let q = Predicate::database("q", 1);
        let rule = Clause::new(
            Literal::new(&p, vec![var("X")]).unwrap(),
            vec![Literal::new(&q, vec![var("Y")]).unwrap()],
        );
        assert_eq!(Rc::new(rule).assert(), Err(Error::UnsafeClause));
        assert_eq!(p.clause_count(), 0);
    }

    #[test]
    fn test_assert_primitive_rejected() {
        let equals = Equals::pred();
        let one = atom("1");
        let fact = Clause::fact(Literal::new(&equals, vec![one.clone(), one.clone()]).unwrap());
        assert_eq!(Rc::new(fact).assert(), Err(Error::NotADatabasePredicate));
    }

    #[test]
    fn test_assert_duplicates_stored() {
        let p = Predicate::database("p", 1);
        let a = atom("a");
        for _ in 0..2 {
            let fact = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
            Rc::new(fact).assert().unwrap();
        }
        assert_eq!(p.clause_count(), 2);
    }

    // ===== Retract =====

    #[test]
    fn test_retract_all_variants() {
        let p = Predicate::database("p", 1);
        let a = atom("a");
        for _ in 0..2 {
            let fact = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
            Rc::new(fact).assert().unwrap();
        }
        let pattern = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
        assert_eq!(pattern.retract(), Ok(2));
        assert_eq!(p.clause_count(), 0);
        // Idempotent: a second retract removes nothing and still succeeds.
        assert_eq!(pattern.retract(), Ok(0));
    }

    #[test]
    fn test_retract_matches_modulo_renaming() {
        let p = Predicate::database("p", 1);
        let q = Predicate::database("q", 1);
        let x = var("X");
        let rule = Clause::new(
            Literal::new(&p, vec![x.clone()]).unwrap(),
            vec![Literal::new(&q, vec![x.clone()]).unwrap()],
        );
        Rc::new(rule).assert().unwrap();

        let z = var("Z");
        let pattern = Clause::new(
            Literal::new(&p, vec![z.clone()]).unwrap(),
            vec![Literal::new(&q, vec![z.clone()]).unwrap()],
        );
        assert_eq!(pattern.retract(), Ok(1));
        assert_eq!(p.clause_count(), 0);
    }

    #[test]
    fn test_retract_leaves_others() {
        let p = Predicate::database("p", 1);
        let a = atom("a");
        let b = atom("b");
        Rc::new(Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap()))
            .assert()
            .unwrap();
        Rc::new(Clause::fact(Literal::new(&p, vec![b.clone()]).unwrap()))
            .assert()
            .unwrap();
        let pattern = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
        assert_eq!(pattern.retract(), Ok(1));
        assert_eq!(p.clause_count(), 1);
    }

    #[test]
    fn test_retract_one() {
        let p = Predicate::database("p", 1);
        let a = atom("a");
        for _ in 0..2 {
            let fact = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
            Rc::new(fact).assert().unwrap();
        }
        let pattern = Clause::fact(Literal::new(&p, vec![a.clone()]).unwrap());
        pattern.retract_one().unwrap();
        assert_eq!(p.clause_count(), 1);
        pattern.retract_one().unwrap();
        assert_eq!(pattern.retract_one(), Err(Error::NoSuchClause));
    }

    #[test]
    fn test_retract_primitive_rejected() {
        let equals = Equals::pred();
        let one = atom("1");
        let pattern = Clause::fact(Literal::new(&equals, vec![one.clone(), one.clone()]).unwrap());
        assert_eq!(pattern.retract(), Err(Error::NotADatabasePredicate));
        assert_eq!(pattern.retract_one(), Err(Error::NotADatabasePredicate));
    }
}
