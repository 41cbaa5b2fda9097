//! The tabled top-down prover.
//!
//! A query builds a fresh table of subgoals keyed by the target's variant
//! tag. Each subgoal records the facts discovered for its target
//! (deduplicated by identity tag, in discovery order) and the waiters, the
//! rules whose leftmost body literal the subgoal is proving, to resume when a
//! new fact arrives. Tabling makes the search terminate on recursive and
//! mutually recursive programs: a subgoal is created at most once per
//! variant, a fact is recorded at most once per identity, and a waiter is
//! resumed at most once per new fact.
//!
//! The search is driven by an explicit FIFO event queue rather than the
//! mutual recursion it describes (`search` / `discovered` / `resolve`), so
//! deeply recursive programs cannot overflow the stack. Answer sets are
//! identical either way; only the discovery order within a query can differ.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::literal::{Clause, Literal};
use crate::term::Relation;
use crate::unify::unify;

/// A rule waiting on a subgoal: `rule.body[0]` unifies with the subgoal's
/// target, and `subgoal` is where resolved clauses are reported.
#[derive(Clone)]
struct Waiter {
    subgoal: usize,
    rule: Rc<Clause>,
}

struct Subgoal {
    target: Rc<Literal>,
    /// Facts that unify with the target, keyed by identity tag.
    facts: IndexMap<String, Rc<Literal>>,
    waiters: Vec<Waiter>,
}

enum Event {
    /// Open a subgoal for `target`, registering `waiter` if one is given.
    Subgoal {
        target: Rc<Literal>,
        waiter: Option<Waiter>,
    },
    /// A clause whose head unifies with the subgoal's target was discovered.
    Clause { subgoal: usize, clause: Rc<Clause> },
    /// A fact that unifies with the subgoal's target was discovered.
    Fact { subgoal: usize, fact: Rc<Literal> },
}

#[derive(Default)]
struct Prover {
    /// Subgoal index by variant tag of the target.
    table: HashMap<String, usize>,
    subgoals: Vec<Subgoal>,
    queue: VecDeque<Event>,
}

impl Prover {
    fn run(target: Rc<Literal>) -> Vec<Rc<Literal>> {
        let mut prover = Prover::default();
        prover.queue.push_back(Event::Subgoal {
            target,
            waiter: None,
        });
        while let Some(event) = prover.queue.pop_front() {
            match event {
                Event::Subgoal { target, waiter } => prover.subgoal(target, waiter),
                Event::Clause { subgoal, clause } => prover.clause(subgoal, clause),
                Event::Fact { subgoal, fact } => prover.fact(subgoal, fact),
            }
        }
        prover.subgoals[0].facts.values().cloned().collect()
    }

    fn subgoal(&mut self, target: Rc<Literal>, waiter: Option<Waiter>) {
        // Two pending rules may ask for the same target; the later request
        // finds the subgoal already in the table and just waits on it.
        if let Some(&existing) = self.table.get(target.variant_tag()) {
            if let Some(waiter) = waiter {
                self.add_waiter(existing, waiter);
            }
            return;
        }
        let index = self.subgoals.len();
        self.table.insert(target.variant_tag().to_owned(), index);
        self.subgoals.push(Subgoal {
            target: Rc::clone(&target),
            facts: IndexMap::new(),
            waiters: waiter.into_iter().collect(),
        });
        self.produce(index, &target);
    }

    /// Feed the subgoal every clause its predicate can produce: the stored
    /// clause list for a database predicate, the search callback for a
    /// primitive.
    fn produce(&mut self, subgoal: usize, target: &Rc<Literal>) {
        let candidates: Vec<Rc<Clause>> = match target.pred().relation() {
            Relation::Database(clauses) => clauses.borrow().iter().map(Rc::clone).collect(),
            Relation::Primitive(primitive) => {
                let mut emitted = Vec::new();
                primitive.search(target, &mut |clause| emitted.push(Rc::new(clause)));
                emitted
            }
        };
        for clause in candidates {
            // Rename first so target variables are never captured.
            let renamed = clause.rename();
            if let Some(env) = unify(target, renamed.head()) {
                self.queue.push_back(Event::Clause {
                    subgoal,
                    clause: Rc::new(renamed.substitute(&env)),
                });
            }
        }
    }

    fn clause(&mut self, subgoal: usize, clause: Rc<Clause>) {
        if clause.is_fact() {
            self.queue.push_back(Event::Fact {
                subgoal,
                fact: Rc::clone(clause.head()),
            });
            return;
        }
        let first = Rc::clone(&clause.body()[0]);
        let waiter = Waiter {
            subgoal,
            rule: clause,
        };
        match self.table.get(first.variant_tag()) {
            Some(&existing) => self.add_waiter(existing, waiter),
            None => self.queue.push_back(Event::Subgoal {
                target: first,
                waiter: Some(waiter),
            }),
        }
    }

    fn fact(&mut self, subgoal: usize, fact: Rc<Literal>) {
        let sg = &mut self.subgoals[subgoal];
        let key = fact.identity_tag();
        if sg.facts.contains_key(key) {
            return;
        }
        sg.facts.insert(key.to_owned(), Rc::clone(&fact));
        let waiters = sg.waiters.clone();
        for waiter in waiters {
            if let Some(resolved) = resolve(&waiter.rule, &fact) {
                self.queue.push_back(Event::Clause {
                    subgoal: waiter.subgoal,
                    clause: Rc::new(resolved),
                });
            }
        }
    }

    /// Register a waiter on an existing subgoal and replay the facts it has
    /// already found, since they may have arrived before this waiter registered.
    fn add_waiter(&mut self, subgoal: usize, waiter: Waiter) {
        let known: Vec<Rc<Literal>> = {
            let sg = &mut self.subgoals[subgoal];
            sg.waiters.push(waiter.clone());
            sg.facts.values().cloned().collect()
        };
        for fact in known {
            if let Some(resolved) = resolve(&waiter.rule, &fact) {
                self.queue.push_back(Event::Clause {
                    subgoal: waiter.subgoal,
                    clause: Rc::new(resolved),
                });
            }
        }
    }
}

/// Simplify a rule with a fact that unifies with its leftmost body literal:
/// drop that literal and substitute through head and remaining body.
///
/// `ancestor(X, Z) :- ancestor(X, Y), ancestor(Y, Z)` resolved with
/// `ancestor(alice, bob)` gives `ancestor(alice, Z) :- ancestor(bob, Z)`.
fn resolve(rule: &Clause, fact: &Rc<Literal>) -> Option<Clause> {
    debug_assert!(!rule.body().is_empty(), "resolve needs a rule");
    debug_assert!(fact.is_ground(), "discovered facts are ground");
    let env = unify(&rule.body()[0], fact)?;
    Some(rule.drop_first(&env))
}

/// Facts answering a query, deduplicated and in discovery order.
#[derive(Debug)]
pub struct Answers {
    facts: Vec<Rc<Literal>>,
}

impl Answers {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Literal>> {
        self.facts.iter()
    }
}

impl<'a> IntoIterator for &'a Answers {
    type Item = &'a Rc<Literal>;
    type IntoIter = std::slice::Iter<'a, Rc<Literal>>;

    fn into_iter(self) -> Self::IntoIter {
        self.facts.iter()
    }
}

impl fmt::Display for Answers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.facts.is_empty() {
            return write!(f, "% empty");
        }
        for (i, fact) in self.facts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}.", fact)?;
        }
        Ok(())
    }
}

impl Literal {
    /// Prove this literal against the current database state, returning
    /// every derivable fact that unifies with it. An empty result means no
    /// proof was found, not an error. All query state is discarded on
    /// return.
    pub fn query(self: &Rc<Self>) -> Answers {
        Answers {
            facts: Prover::run(Rc::clone(self)),
        }
    }
}
