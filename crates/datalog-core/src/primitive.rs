//! Primitive predicates: clause sets computed on demand.
//!
//! A primitive predicate stores no clauses. When the prover opens a subgoal
//! on one, it calls [`Primitive::search`] with the target literal and treats
//! every emitted clause exactly like a database clause: rename, unify with
//! the target, recurse. Emitted clauses must be safe and headed by the
//! target's predicate. Primitives reject assert and retract.

use std::rc::Rc;

use crate::literal::{Clause, Literal};
use crate::term::{Pred, Predicate, Term};

/// Search callback of a primitive predicate. The implementation may inspect
/// which arguments of `target` are bound to specialize its output.
pub trait Primitive {
    fn search(&self, target: &Literal, emit: &mut dyn FnMut(Clause));
}

/// Equality, the reference primitive: `=(X, Y)` of arity 2.
///
/// - `=(X, Y)` emits nothing.
/// - `=(X, c)` and `=(c, Y)` emit the fact `=(c, c)`.
/// - `=(c, c)` (same constant) emits `=(c, c)`.
/// - `=(c1, c2)` with distinct constants emits nothing.
///
/// It never produces free-standing answers, but lets a rule such as
/// `f(X, Y) :- z(Y), =(X, Y)` bind `X` to the already-known value of `Y`.
pub struct Equals;

impl Equals {
    /// A ready-to-register predicate named `=`.
    pub fn pred() -> Pred {
        Predicate::primitive("=", 2, Box::new(Equals))
    }
}

impl Primitive for Equals {
    fn search(&self, target: &Literal, emit: &mut dyn FnMut(Clause)) {
        let constant = match (&target.args()[0], &target.args()[1]) {
            (Term::Variable(_), Term::Constant(c)) | (Term::Constant(c), Term::Variable(_)) => c,
            (Term::Constant(a), Term::Constant(b)) if a.id() == b.id() => a,
            _ => return,
        };
        let both = vec![
            Term::Constant(Rc::clone(constant)),
            Term::Constant(Rc::clone(constant)),
        ];
        let head = Literal::raw(Rc::clone(target.pred()), both);
        emit(Clause::fact(Rc::new(head)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Constant, Value, Variable};
    use internment::Intern;

    fn atom(name: &str) -> Term {
        Term::Constant(Constant::new(Value::Atom(Intern::new(name.to_string()))))
    }

    fn var(name: &str) -> Term {
        Term::Variable(Variable::named(name))
    }

    fn emitted(target: &Literal) -> Vec<Clause> {
        let mut clauses = Vec::new();
        Equals.search(target, &mut |clause| clauses.push(clause));
        clauses
    }

    #[test]
    fn test_both_variables_emit_nothing() {
        let equals = Equals::pred();
        let target = Literal::new(&equals, vec![var("X"), var("Y")]).unwrap();
        assert!(emitted(&target).is_empty());
    }

    #[test]
    fn test_one_constant_emits_reflexive_fact() {
        let equals = Equals::pred();
        let zero = atom("0");
        for args in [
            vec![var("X"), zero.clone()],
            vec![zero.clone(), var("Y")],
        ] {
            let target = Literal::new(&equals, args).unwrap();
            let clauses = emitted(&target);
            assert_eq!(clauses.len(), 1);
            let head = clauses[0].head();
            assert!(clauses[0].is_fact());
            assert_eq!(head.args()[0].id(), zero.id());
            assert_eq!(head.args()[1].id(), zero.id());
        }
    }

    #[test]
    fn test_same_constant_emits_fact() {
        let equals = Equals::pred();
        let one = atom("1");
        let target = Literal::new(&equals, vec![one.clone(), one.clone()]).unwrap();
        assert_eq!(emitted(&target).len(), 1);
    }

    #[test]
    fn test_distinct_constants_emit_nothing() {
        let equals = Equals::pred();
        let target = Literal::new(&equals, vec![atom("1"), atom("2")]).unwrap();
        assert!(emitted(&target).is_empty());
    }
}
