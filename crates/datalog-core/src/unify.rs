//! Unification and substitution.
//!
//! An [`Env`] maps variables (by id) to terms. Chains of variable-to-variable
//! bindings are allowed and resolved by [`Env::chase`]; cycles cannot form
//! because the unifier skips identical terms before binding, so `v -> v` is
//! never written. There is no occurs check: datalog terms are first order
//! and function free, so a variable can never occur inside the term it is
//! bound to.

use std::collections::HashMap;
use std::rc::Rc;

use crate::id::Id;
use crate::literal::{Clause, Literal};
use crate::term::{Term, Variable};

/// A substitution: a finite mapping from variables to terms.
#[derive(Default)]
pub struct Env {
    bindings: HashMap<Id, Term>,
}

impl Env {
    pub fn new() -> Env {
        Env::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn bind(&mut self, variable: &Rc<Variable>, term: Term) {
        self.bindings.insert(variable.id(), term);
    }

    pub fn get(&self, variable: &Rc<Variable>) -> Option<&Term> {
        self.bindings.get(&variable.id())
    }

    /// Follow variable-to-variable bindings until a constant or an unmapped
    /// variable is reached.
    pub fn chase(&self, term: &Term) -> Term {
        let mut current = term.clone();
        while let Term::Variable(variable) = &current {
            match self.bindings.get(&variable.id()) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        current
    }
}

/// Unify two literals. On success the returned environment makes both
/// literals structurally identical under substitution, modulo the identity
/// of still-free variables. Returns `None` when no such environment exists.
pub fn unify(a: &Literal, b: &Literal) -> Option<Env> {
    if a.pred().id() != b.pred().id() {
        return None;
    }
    let mut env = Env::new();
    for (left, right) in a.args().iter().zip(b.args()) {
        let left = env.chase(left);
        let right = env.chase(right);
        if left.id() == right.id() {
            continue;
        }
        match (&left, &right) {
            // Distinct constants cannot unify.
            (Term::Constant(_), Term::Constant(_)) => return None,
            (Term::Constant(_), Term::Variable(variable)) => env.bind(variable, left.clone()),
            (Term::Variable(variable), Term::Constant(_)) => env.bind(variable, right.clone()),
            (Term::Variable(_), Term::Variable(variable)) => env.bind(variable, left.clone()),
        }
    }
    Some(env)
}

impl Literal {
    /// Apply an environment to the arguments. Mapped variables are replaced,
    /// everything else passes through. Returns the same literal object when
    /// the environment is empty.
    pub fn substitute(self: &Rc<Self>, env: &Env) -> Rc<Literal> {
        if env.is_empty() || self.args().is_empty() {
            return Rc::clone(self);
        }
        let args = self
            .args()
            .iter()
            .map(|arg| match arg {
                Term::Variable(variable) => env
                    .get(variable)
                    .cloned()
                    .unwrap_or_else(|| arg.clone()),
                Term::Constant(_) => arg.clone(),
            })
            .collect();
        Rc::new(Literal::raw(Rc::clone(self.pred()), args))
    }

    /// Extend `env` with a fresh variable for every argument variable not
    /// already mapped.
    pub fn shuffle(&self, env: &mut Env) {
        for arg in self.args() {
            if let Term::Variable(variable) = arg {
                if env.get(variable).is_none() {
                    env.bind(variable, Term::Variable(Variable::fresh()));
                }
            }
        }
    }

    /// A copy with every variable renamed to a fresh one.
    pub fn rename(self: &Rc<Self>) -> Rc<Literal> {
        let mut env = Env::new();
        self.shuffle(&mut env);
        self.substitute(&env)
    }
}

impl Clause {
    /// Apply an environment to head and body.
    pub fn substitute(&self, env: &Env) -> Clause {
        Clause::new(
            self.head().substitute(env),
            self.body().iter().map(|part| part.substitute(env)).collect(),
        )
    }

    /// A copy with every variable renamed to a fresh one. For rules the body
    /// covers every head variable (safety), so shuffling the body suffices;
    /// facts shuffle the head.
    pub fn rename(&self) -> Clause {
        let mut env = Env::new();
        if self.body().is_empty() {
            self.head().shuffle(&mut env);
        } else {
            for part in self.body() {
                part.shuffle(&mut env);
            }
        }
        self.substitute(&env)
    }

    /// Drop the leading body literal and apply `env` to what remains. The
    /// resolution step: caller guarantees a non-empty body.
    pub(crate) fn drop_first(&self, env: &Env) -> Clause {
        Clause::new(
            self.head().substitute(env),
            self.body()[1..]
                .iter()
                .map(|part| part.substitute(env))
                .collect(),
        )
    }
}
