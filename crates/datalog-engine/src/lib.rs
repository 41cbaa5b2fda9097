//! Textual driver for the Datalog prover.
//!
//! The core engine works with objects that have identity; this crate decides
//! what "the same object" means for a textual session. An [`Engine`] keeps
//! one table of constants keyed by their rendered lexeme and one table of
//! predicates keyed by `name/arity`, so equal text always recovers the same
//! core object. Variables intern per parsed clause: `X` twice in one clause
//! is one variable, `X` in two clauses is two.
//!
//! The engine also reference-counts interned objects. Every successful
//! assert increments the count of each predicate and constant occurrence in
//! the clause; every clause removed by a retract decrements them; an object
//! whose count drops to zero leaves the tables. Registered primitives are
//! pinned and never evicted.
//!
//! Statements execute independently: [`Engine::process`] reports a batch of
//! per-statement responses and counts, and an error in one statement does
//! not stop the rest.

use std::collections::HashMap;
use std::rc::Rc;

use ariadne::{Config, Label, Report as Diagnostic, ReportKind};
use datalog_core::{
    Clause, Constant, Error as CoreError, Literal, Pred, Predicate, Symbol, Term, Value, Variable,
};
use datalog_parser::{ast, parse_program, parse_statement, ParseError, SrcId};
use indexmap::IndexMap;

pub use datalog_core::Answers;

/// Errors surfaced by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The input did not parse; holds rendered diagnostics.
    Parse(String),
    /// The input parsed but is not the kind of statement the call expects.
    Statement(String),
    /// The core engine rejected the operation.
    Core(CoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Parse(diagnostics) => write!(f, "{}", diagnostics),
            EngineError::Statement(message) => write!(f, "{}", message),
            EngineError::Core(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<CoreError> for EngineError {
    fn from(error: CoreError) -> Self {
        EngineError::Core(error)
    }
}

/// Statement counts for one processed input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub assertions: usize,
    pub retractions: usize,
    pub queries: usize,
    pub errors: usize,
}

/// Outcome of one statement, in input order.
#[derive(Debug)]
pub enum Response {
    Asserted {
        clause: String,
    },
    Retracted {
        clause: String,
        removed: usize,
    },
    Resolved {
        query: String,
        answers: Answers,
    },
    Failed {
        statement: String,
        error: EngineError,
    },
}

/// Interning layer and statement dispatcher over the core prover.
#[derive(Default)]
pub struct Engine {
    terms: IndexMap<String, Term>,
    predicates: IndexMap<String, Pred>,
    term_refs: HashMap<String, usize>,
    predicate_refs: HashMap<String, usize>,
}

impl Engine {
    pub fn new() -> Engine {
        Engine::default()
    }

    /// Install a primitive predicate under its `name/arity` key. Primitives
    /// are never evicted by reference counting.
    pub fn register_primitive(&mut self, pred: Pred) {
        let key = predicate_key(pred.name().as_ref(), pred.arity());
        self.predicates.insert(key, pred);
    }

    /// Parse and execute a whole program. Every statement is counted by
    /// kind; a statement that fails is reported and additionally counted as
    /// an error, without stopping the batch.
    pub fn process(&mut self, source: &str, input: &str) -> (Report, Vec<Response>) {
        let src = SrcId::from_name(source);
        let program = match parse_program(input, src) {
            Ok(program) => program,
            Err(errors) => {
                let error = EngineError::Parse(render_parse_errors(src, input, &errors));
                let report = Report {
                    errors: 1,
                    ..Report::default()
                };
                let failed = Response::Failed {
                    statement: input.trim().to_string(),
                    error,
                };
                return (report, vec![failed]);
            }
        };

        let mut report = Report::default();
        let mut responses = Vec::new();
        for statement in &program.statements {
            match statement.action {
                ast::Action::Assert => {
                    report.assertions += 1;
                    match self.assert_clause(&statement.clause) {
                        Ok(clause) => responses.push(Response::Asserted { clause }),
                        Err(error) => {
                            report.errors += 1;
                            responses.push(Response::Failed {
                                statement: statement.clause.to_string(),
                                error,
                            });
                        }
                    }
                }
                ast::Action::Retract => {
                    report.retractions += 1;
                    match self.retract_clause(&statement.clause) {
                        Ok((clause, removed)) => {
                            responses.push(Response::Retracted { clause, removed })
                        }
                        Err(error) => {
                            report.errors += 1;
                            responses.push(Response::Failed {
                                statement: statement.clause.to_string(),
                                error,
                            });
                        }
                    }
                }
                ast::Action::Query => {
                    report.queries += 1;
                    match self.query_literal(&statement.clause.head) {
                        Ok((query, answers)) => {
                            responses.push(Response::Resolved { query, answers })
                        }
                        Err(error) => {
                            report.errors += 1;
                            responses.push(Response::Failed {
                                statement: statement.clause.to_string(),
                                error,
                            });
                        }
                    }
                }
            }
        }
        (report, responses)
    }

    /// Execute only the asserts and retracts of a program, stopping at the
    /// first error. Queries are ignored. For bulk loading.
    pub fn batch(&mut self, source: &str, input: &str) -> Result<(usize, usize), EngineError> {
        let src = SrcId::from_name(source);
        let program = parse_program(input, src)
            .map_err(|errors| EngineError::Parse(render_parse_errors(src, input, &errors)))?;

        let mut assertions = 0;
        let mut retractions = 0;
        for statement in &program.statements {
            match statement.action {
                ast::Action::Assert => {
                    self.assert_clause(&statement.clause)?;
                    assertions += 1;
                }
                ast::Action::Retract => {
                    self.retract_clause(&statement.clause)?;
                    retractions += 1;
                }
                ast::Action::Query => {}
            }
        }
        Ok((assertions, retractions))
    }

    /// Assert exactly one clause. The `.` terminator may be omitted; any
    /// other terminator is an error.
    pub fn assert(&mut self, statement: &str) -> Result<(), EngineError> {
        let clause = self.single(statement, ast::Action::Assert, "assertion")?;
        self.assert_clause(&clause)?;
        Ok(())
    }

    /// Retract exactly one clause pattern, removing every variant match.
    /// Returns how many stored clauses were removed; zero is not an error.
    pub fn retract(&mut self, statement: &str) -> Result<usize, EngineError> {
        let clause = self.single(statement, ast::Action::Retract, "retraction")?;
        let (_, removed) = self.retract_clause(&clause)?;
        Ok(removed)
    }

    /// Run exactly one query literal.
    pub fn query(&mut self, statement: &str) -> Result<Answers, EngineError> {
        let clause = self.single(statement, ast::Action::Query, "query")?;
        if !clause.is_fact() {
            return Err(EngineError::Statement(format!(
                "expecting one query: {}",
                statement.trim()
            )));
        }
        let (_, answers) = self.query_literal(&clause.head)?;
        Ok(answers)
    }

    /// Number of constants currently interned.
    pub fn interned_term_count(&self) -> usize {
        self.terms.len()
    }

    /// Number of predicates currently interned, registered primitives
    /// included.
    pub fn interned_predicate_count(&self) -> usize {
        self.predicates.len()
    }

    fn single(
        &self,
        statement: &str,
        expected: ast::Action,
        kind: &str,
    ) -> Result<ast::Clause, EngineError> {
        let src = SrcId::repl();
        let (clause, action) = parse_statement(statement, src)
            .map_err(|errors| EngineError::Parse(render_parse_errors(src, statement, &errors)))?;
        match action {
            None => Ok(clause),
            Some(action) if action == expected => Ok(clause),
            Some(_) => Err(EngineError::Statement(format!(
                "expecting one {}: {}",
                kind,
                statement.trim()
            ))),
        }
    }

    fn assert_clause(&mut self, clause: &ast::Clause) -> Result<String, EngineError> {
        let recovered = self.recover_clause(clause)?;
        let rendered = recovered.to_string();
        Rc::clone(&recovered).assert()?;
        self.track_clause(&recovered, Track::Retain);
        Ok(rendered)
    }

    fn retract_clause(&mut self, clause: &ast::Clause) -> Result<(String, usize), EngineError> {
        let recovered = self.recover_clause(clause)?;
        let rendered = recovered.to_string();
        let removed = recovered.retract()?;
        // Every removed clause is a variant of the pattern, so it references
        // exactly the pattern's predicates and constants.
        for _ in 0..removed {
            self.track_clause(&recovered, Track::Release);
        }
        Ok((rendered, removed))
    }

    fn query_literal(&mut self, atom: &ast::Atom) -> Result<(String, Answers), EngineError> {
        let mut scope = HashMap::new();
        let target = self.recover_literal(atom, &mut scope)?;
        Ok((target.to_string(), target.query()))
    }

    fn recover_clause(&mut self, clause: &ast::Clause) -> Result<Rc<Clause>, EngineError> {
        // One variable scope per clause: equal names inside the clause are
        // one variable, and nothing leaks across clauses.
        let mut scope = HashMap::new();
        let head = self.recover_literal(&clause.head, &mut scope)?;
        let body = clause
            .body
            .iter()
            .map(|part| self.recover_literal(part, &mut scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Rc::new(Clause::new(head, body)))
    }

    fn recover_literal(
        &mut self,
        atom: &ast::Atom,
        scope: &mut HashMap<Symbol, Term>,
    ) -> Result<Rc<Literal>, EngineError> {
        let pred = self.intern_predicate(atom.predicate, atom.terms.len());
        let args = atom
            .terms
            .iter()
            .map(|term| match term {
                ast::Term::Variable(name) => scope
                    .entry(*name)
                    .or_insert_with(|| Term::Variable(Variable::named(name.as_ref().as_str())))
                    .clone(),
                ast::Term::Constant(value) => self.intern_constant(value),
            })
            .collect();
        Ok(Literal::new(&pred, args)?)
    }

    fn intern_predicate(&mut self, name: Symbol, arity: usize) -> Pred {
        let key = predicate_key(name.as_ref(), arity);
        Rc::clone(
            self.predicates
                .entry(key)
                .or_insert_with(|| Predicate::database(name.as_ref().as_str(), arity)),
        )
    }

    fn intern_constant(&mut self, value: &ast::Value) -> Term {
        self.terms
            .entry(value.to_string())
            .or_insert_with(|| {
                let value = match value {
                    ast::Value::Atom(name) => Value::Atom(*name),
                    ast::Value::Str(text) => Value::Str(*text),
                    ast::Value::Int(n) => Value::Int(*n),
                };
                Term::Constant(Constant::new(value))
            })
            .clone()
    }

    fn track_clause(&mut self, clause: &Clause, track: Track) {
        self.track_literal(clause.head(), track);
        for part in clause.body() {
            self.track_literal(part, track);
        }
    }

    fn track_literal(&mut self, literal: &Literal, track: Track) {
        let pred = literal.pred();
        let key = predicate_key(pred.name().as_ref(), pred.arity());
        if bump(&mut self.predicate_refs, &key, track) && !pred.is_primitive() {
            self.predicates.shift_remove(&key);
        }
        for arg in literal.args() {
            if let Term::Constant(constant) = arg {
                let key = constant.to_string();
                if bump(&mut self.term_refs, &key, track) {
                    self.terms.shift_remove(&key);
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Track {
    Retain,
    Release,
}

/// Adjust a reference count. Returns true when a release drops the count to
/// zero and the object should be evicted.
fn bump(counts: &mut HashMap<String, usize>, key: &str, track: Track) -> bool {
    match track {
        Track::Retain => {
            *counts.entry(key.to_owned()).or_insert(0) += 1;
            false
        }
        Track::Release => {
            let Some(count) = counts.get_mut(key) else {
                return false;
            };
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(key);
                true
            } else {
                false
            }
        }
    }
}

fn predicate_key(name: &str, arity: usize) -> String {
    format!("{}/{}", name, arity)
}

fn render_parse_errors(src: SrcId, input: &str, errors: &[ParseError]) -> String {
    let mut rendered = Vec::new();
    for error in errors {
        let span = error.span();
        let report = Diagnostic::build(ReportKind::Error, src, span.range().start)
            .with_config(Config::default().with_color(false))
            .with_message(error.message())
            .with_label(Label::new(span).with_message("unexpected input"))
            .finish();
        let _ = report.write(ariadne::sources([(src, input)]), &mut rendered);
    }
    String::from_utf8_lossy(&rendered).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_core::Equals;

    const SIMPLE_PROGRAM: &str = r#"
        ancestor(alice, "bob smith").
        ancestor(X, Y)?
        ancestor("bob smith", carol).
        ancestor(X, Y)?
        ancestor(X, Z) :- ancestor(X, Y), ancestor(Y, Z).
        ancestor(X, Y)?
        ancestor(X)?
        ancestor("bob smith", carol)~
        ancestor(alice, carol)?
    "#;

    fn resolved(responses: &[Response]) -> Vec<&Answers> {
        responses
            .iter()
            .filter_map(|response| match response {
                Response::Resolved { answers, .. } => Some(answers),
                _ => None,
            })
            .collect()
    }

    // ===== Process =====

    #[test]
    fn test_process_counts() {
        let mut engine = Engine::new();
        let (report, responses) = engine.process("test", SIMPLE_PROGRAM);
        assert_eq!(
            report,
            Report {
                assertions: 3,
                retractions: 1,
                queries: 5,
                errors: 0,
            }
        );
        assert_eq!(responses.len(), 9);
    }

    #[test]
    fn test_process_query_results() {
        let mut engine = Engine::new();
        let (_, responses) = engine.process("test", SIMPLE_PROGRAM);
        let answers = resolved(&responses);
        assert_eq!(answers.len(), 5);
        // One base fact, then two, then the closure adds alice -> carol.
        assert_eq!(answers[0].len(), 1);
        assert_eq!(answers[1].len(), 2);
        assert_eq!(answers[2].len(), 3);
        // ancestor(X)? names a different predicate, ancestor/1.
        assert_eq!(answers[3].len(), 0);
        // The derived fact is gone once its premise is retracted.
        assert_eq!(answers[4].len(), 0);
    }

    #[test]
    fn test_process_parse_error() {
        let mut engine = Engine::new();
        let (report, responses) = engine.process("test", "ancestor(?)");
        assert_eq!(
            report,
            Report {
                errors: 1,
                ..Report::default()
            }
        );
        assert!(matches!(
            responses[0],
            Response::Failed {
                error: EngineError::Parse(_),
                ..
            }
        ));
    }

    #[test]
    fn test_process_statement_error_does_not_abort() {
        let mut engine = Engine::new();
        let input = "p(X) :- q(Y). p(a). p(X)?";
        let (report, responses) = engine.process("test", input);
        assert_eq!(
            report,
            Report {
                assertions: 2,
                retractions: 0,
                queries: 1,
                errors: 1,
            }
        );
        assert!(matches!(
            responses[0],
            Response::Failed {
                error: EngineError::Core(CoreError::UnsafeClause),
                ..
            }
        ));
        assert_eq!(resolved(&responses)[0].len(), 1);
    }

    // ===== Batch =====

    #[test]
    fn test_batch_counts() {
        let mut engine = Engine::new();
        let (assertions, retractions) = engine.batch("test", SIMPLE_PROGRAM).unwrap();
        assert_eq!(assertions, 3);
        assert_eq!(retractions, 1);
    }

    #[test]
    fn test_batch_stops_at_first_error() {
        let mut engine = Engine::new();
        let result = engine.batch("test", "p(a). p(X) :- q(Y). p(b).");
        assert_eq!(result, Err(EngineError::Core(CoreError::UnsafeClause)));
        // p(b). was never reached.
        assert_eq!(engine.query("p(X)?").unwrap().len(), 1);
    }

    // ===== Single-statement helpers =====

    #[test]
    fn test_assert_accepts_dot_or_bare() {
        let mut engine = Engine::new();
        engine.assert("same(1, 1).").unwrap();
        engine.assert("same(1, 1)").unwrap();
        assert!(engine.assert("same(1, 1)?").is_err());
        assert!(engine.assert("same(1, 1)~").is_err());
        assert!(engine.assert("same(1, 1). same(2, 2).").is_err());
    }

    #[test]
    fn test_retract_accepts_tilde_or_bare() {
        let mut engine = Engine::new();
        assert_eq!(engine.retract("same(1, 1)~").unwrap(), 0);
        assert_eq!(engine.retract("same(1, 1)").unwrap(), 0);
        assert!(engine.retract("same(1, 1)?").is_err());
        assert!(engine.retract("same(1, 1).").is_err());
        assert!(engine.retract("same(1, 1)~ same(2, 2)~").is_err());
    }

    #[test]
    fn test_query_accepts_question_or_bare() {
        let mut engine = Engine::new();
        engine.query("same(1, 1)?").unwrap();
        engine.query("same(1, 1)").unwrap();
        assert!(engine.query("same(1, 1).").is_err());
        assert!(engine.query("same(1, 1)~").is_err());
        assert!(engine.query("same(1, 1)? same(2, 2)?").is_err());
    }

    #[test]
    fn test_retract_removes_duplicates_and_reports_count() {
        let mut engine = Engine::new();
        engine.assert("p(a).").unwrap();
        engine.assert("p(a).").unwrap();
        assert_eq!(engine.retract("p(a)~").unwrap(), 2);
        assert!(engine.query("p(a)?").unwrap().is_empty());
    }

    // ===== Interning =====

    #[test]
    fn test_equal_text_recovers_same_object() {
        let mut engine = Engine::new();
        engine.assert("parent(john, mary).").unwrap();
        // A separately parsed statement must reuse the same constants for a
        // ground query to match by identity.
        assert_eq!(engine.query("parent(john, mary)?").unwrap().len(), 1);
        assert!(engine.query("parent(mary, john)?").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_and_bare_lexemes_are_distinct() {
        let mut engine = Engine::new();
        engine.assert("p(alice).").unwrap();
        assert!(engine.query(r#"p("alice")?"#).unwrap().is_empty());
    }

    #[test]
    fn test_variable_scope_is_per_clause() {
        let mut engine = Engine::new();
        // Head and body share X inside one clause; an unsafe spelling where
        // the head variable is missing from the body must be rejected.
        assert_eq!(
            engine.assert("same(X, X) :- same(felix, felix)."),
            Err(EngineError::Core(CoreError::UnsafeClause))
        );
        engine.assert("same(felix, X) :- same(X, felix).").unwrap();
        engine.assert("same(felix, felix).").unwrap();
        engine.assert("same(sylvester, sylvester).").unwrap();

        let answers = engine.query("same(felix, X)?").unwrap();
        assert_eq!(answers.to_string(), "same(felix, felix).");

        let answers = engine.query("same(X, felix)?").unwrap();
        assert_eq!(answers.to_string(), "same(felix, felix).");

        // same(X, X)? matches both reflexive facts and nothing else.
        let answers = engine.query("same(X, X)?").unwrap();
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_rule_chains_across_predicates() {
        let mut engine = Engine::new();
        engine.assert("same(X, X) :- same(Y, Y), exists(X).").unwrap();
        engine.assert("same(felix, felix).").unwrap();
        engine.assert("exists(felix).").unwrap();
        engine.assert("exists(sylvester).").unwrap();
        let answers = engine.query("same(X, X)?").unwrap();
        assert_eq!(answers.len(), 2);
    }

    // ===== Reference counting =====

    #[test]
    fn test_eviction_at_zero() {
        let mut engine = Engine::new();
        engine.assert("p(alice).").unwrap();
        assert_eq!(engine.interned_term_count(), 1);
        assert_eq!(engine.interned_predicate_count(), 1);

        assert_eq!(engine.retract("p(alice)~").unwrap(), 1);
        assert_eq!(engine.interned_term_count(), 0);
        assert_eq!(engine.interned_predicate_count(), 0);
    }

    #[test]
    fn test_shared_constant_survives_partial_retract() {
        let mut engine = Engine::new();
        engine.assert("p(alice).").unwrap();
        engine.assert("q(alice).").unwrap();
        engine.retract("p(alice)~").unwrap();
        // alice is still referenced by q/1; p/1 is gone.
        assert_eq!(engine.interned_term_count(), 1);
        assert_eq!(engine.interned_predicate_count(), 1);
        assert_eq!(engine.query("q(alice)?").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_assert_changes_nothing() {
        let mut engine = Engine::new();
        engine.assert("p(alice).").unwrap();
        assert!(engine.assert("q(X) :- r(Y).").is_err());
        engine.retract("p(alice)~").unwrap();
        // The failed assert must not have pinned q/1 or r/1 counts.
        assert_eq!(engine.interned_term_count(), 0);
    }

    // ===== Primitives =====

    #[test]
    fn test_equality_primitive() {
        let mut engine = Engine::new();
        engine.register_primitive(Equals::pred());

        assert_eq!(engine.query("=(1, 1)?").unwrap().len(), 1);
        assert!(engine.query("=(1, 0)?").unwrap().is_empty());

        // A predicate merely named "equals" is an ordinary database one.
        engine.assert("equals(1, 2)").unwrap();

        assert_eq!(
            engine.assert("=(1, 0)"),
            Err(EngineError::Core(CoreError::NotADatabasePredicate))
        );
        assert_eq!(
            engine.retract("=(1, 1)"),
            Err(EngineError::Core(CoreError::NotADatabasePredicate))
        );

        let (report, _) = engine.process("bad assertion", "=(1, 0).");
        assert_eq!(
            report,
            Report {
                assertions: 1,
                errors: 1,
                ..Report::default()
            }
        );
    }

    #[test]
    fn test_equality_binds_in_rules() {
        let mut engine = Engine::new();
        engine.register_primitive(Equals::pred());
        engine.assert("z(X) :- =(X, 0).").unwrap();
        assert_eq!(engine.query("z(0)?").unwrap().len(), 1);
        assert!(engine.query("z(7)?").unwrap().is_empty());

        engine.assert("f(X, Y) :- z(X), =(X, Y).").unwrap();
        let answers = engine.query("f(X, Y)?").unwrap();
        assert_eq!(answers.to_string(), "f(0, 0).");
    }

    #[test]
    fn test_primitive_never_evicted() {
        let mut engine = Engine::new();
        engine.register_primitive(Equals::pred());
        engine.assert("z(X) :- =(X, 0).").unwrap();
        assert_eq!(engine.retract("z(X) :- =(X, 0)~").unwrap(), 1);
        // The rule is gone but = stays registered.
        assert_eq!(engine.interned_predicate_count(), 1);
        assert_eq!(engine.query("=(2, 2)?").unwrap().len(), 1);
    }
}
