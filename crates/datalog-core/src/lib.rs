//! A tabled Datalog engine.
//!
//! Terms, constants, and predicates have object identity: two constants with
//! equal payloads are distinct terms unless they are the same object, so an
//! interning layer (see the `datalog-engine` crate) decides what "the same"
//! means for textual programs. Database predicates own a mutable clause
//! list; primitive predicates compute their clauses on demand from the query
//! target. Queries run a top-down, goal-directed search memoized per subgoal
//! variant, which terminates on recursive and mutually recursive programs.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use datalog_core::{Clause, Constant, Literal, Predicate, Term, Value, Variable};
//! use internment::Intern;
//!
//! let parent = Predicate::database("parent", 2);
//! let john = Term::Constant(Constant::new(Value::Atom(Intern::new("john".into()))));
//! let mary = Term::Constant(Constant::new(Value::Atom(Intern::new("mary".into()))));
//!
//! let fact = Clause::fact(Literal::new(&parent, vec![john.clone(), mary.clone()]).unwrap());
//! Rc::new(fact).assert().unwrap();
//!
//! let who = Term::Variable(Variable::named("X"));
//! let query = Literal::new(&parent, vec![who, mary]).unwrap();
//! assert_eq!(query.query().len(), 1);
//! ```

pub mod database;
pub mod id;
pub mod literal;
pub mod primitive;
pub mod prover;
pub mod term;
pub mod unify;

pub use database::Error;
pub use id::Id;
pub use literal::{Clause, Literal};
pub use primitive::{Equals, Primitive};
pub use prover::Answers;
pub use term::{Constant, Pred, Predicate, Symbol, Term, Value, Variable};
pub use unify::{unify, Env};
