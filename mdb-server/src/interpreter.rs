//! # Command Interpreter
//!
//! Translate one protocol line into store operations and a reply. The
//! interpreter owns no connection state; it only needs a shared handle to a
//! [`PersonStore`], so it is equally usable from tests and from handlers.

use core::fmt;
use std::sync::Arc;

use mdb_common::{MdbError, Person};
use mdb_engine::PersonStore;

use crate::command::{Command, CommandKind};

/// What the handler should write back after a command.
#[derive(Debug)]
pub enum Reply {
    Created(Person),
    Found(Person),
    Updated(Person),
    Deleted,
    Listing(Vec<Person>),
    Failed(MdbError),
}

impl Reply {
    /// Returns true for replies that report a client error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Created(person) => write!(f, "1 row inserted:\n{person}"),
            Reply::Found(person) => write!(f, "{person}"),
            Reply::Updated(person) => write!(f, "1 row updated:\n{person}"),
            Reply::Deleted => f.write_str("1 row deleted"),
            Reply::Listing(persons) if persons.is_empty() => f.write_str("No persons found"),
            Reply::Listing(persons) => {
                for (idx, person) in persons.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("\n\n")?;
                    }
                    write!(f, "{person}")?;
                }
                // Trailing blank line before the prompt.
                f.write_str("\n")
            }
            Reply::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Result of interpreting one line.
#[derive(Debug)]
pub enum Outcome {
    Reply(Reply),
    /// The client asked to end the session.
    Close,
}

#[derive(Debug)]
pub struct Response {
    pub kind: CommandKind,
    pub outcome: Outcome,
}

/// Stateless command executor bound to one store.
pub struct Interpreter<S: PersonStore + ?Sized> {
    store: Arc<S>,
}

impl<S: PersonStore + ?Sized> Clone for Interpreter<S> {
    fn clone(&self) -> Self {
        Interpreter {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PersonStore + ?Sized> Interpreter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Interpreter { store }
    }

    /// Interprets one raw line. Blank lines yield `None`.
    pub fn interpret(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let response = match Command::parse(line) {
            Ok(command) => Response {
                kind: command.kind(),
                outcome: self.execute(command),
            },
            Err(err) => Response {
                kind: CommandKind::Unknown,
                outcome: Outcome::Reply(Reply::Failed(err)),
            },
        };
        Some(response)
    }

    /// Runs a parsed command against the store.
    pub fn execute(&self, command: Command) -> Outcome {
        let reply = match command {
            Command::Set(params) => match params.validate().into_result() {
                Ok(()) => Reply::Created(self.store.create(params)),
                Err(errors) => Reply::Failed(errors.into()),
            },
            Command::Get { id } => match self.store.get(&id) {
                Some(person) => Reply::Found(person),
                None => Reply::Failed(MdbError::not_found(id)),
            },
            Command::Update { id, patch } => match patch.validate().into_result() {
                Ok(()) => match self.store.update(&id, patch) {
                    Some(person) => Reply::Updated(person),
                    None => Reply::Failed(MdbError::not_found(id)),
                },
                Err(errors) => Reply::Failed(errors.into()),
            },
            Command::Delete { id } => {
                if self.store.delete(&id) {
                    Reply::Deleted
                } else {
                    Reply::Failed(MdbError::not_found(id))
                }
            }
            Command::All => Reply::Listing(self.store.list()),
            Command::Exit => return Outcome::Close,
        };
        Outcome::Reply(reply)
    }
}

#[cfg(test)]
mod tests {
    use mdb_engine::MemoryStore;

    use super::*;

    fn interpreter() -> (Interpreter<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Interpreter::new(Arc::clone(&store)), store)
    }

    fn reply_text(interpreter: &Interpreter<MemoryStore>, line: &str) -> String {
        match interpreter.interpret(line).map(|r| r.outcome) {
            Some(Outcome::Reply(reply)) => reply.to_string(),
            other => panic!("unexpected outcome for {line:?}: {other:?}"),
        }
    }

    #[test]
    fn crud_round() {
        let (interpreter, store) = interpreter();

        let created = reply_text(&interpreter, "set alice 30 reading,chess");
        assert!(created.starts_with("1 row inserted:\nID: "));
        assert!(created.contains("Name: alice\nAge: 30\nHobbies: [reading, chess]"));
        let id = store.list()[0].id.clone();

        let found = reply_text(&interpreter, &format!("get {id}"));
        assert_eq!(found, store.get(&id).unwrap().to_string());

        let updated = reply_text(&interpreter, &format!("update {id} bob"));
        assert!(updated.starts_with("1 row updated:\n"));
        let person = store.get(&id).unwrap();
        assert_eq!(person.name, "bob");
        assert_eq!(person.age, "30");
        assert_eq!(person.hobbies, vec!["reading".to_string(), "chess".to_string()]);

        assert_eq!(reply_text(&interpreter, &format!("delete {id}")), "1 row deleted");
        assert_eq!(
            reply_text(&interpreter, &format!("get {id}")),
            format!("Person with ID {id} not found")
        );
        assert_eq!(
            reply_text(&interpreter, &format!("delete {id}")),
            format!("Person with ID {id} not found")
        );
    }

    #[test]
    fn validation_blocks_mutation() {
        let (interpreter, store) = interpreter();
        assert_eq!(
            reply_text(&interpreter, "set al 30 chess"),
            "name: name must be between 3 and 30 characters"
        );
        assert!(store.is_empty());

        let person = store.create(mdb_common::NewPerson::new("alice", "30", vec!["x".into()]));
        assert_eq!(
            reply_text(&interpreter, &format!("update {} bob 1234", person.id)),
            "age: age must be between 1 and 3 characters"
        );
        assert_eq!(store.get(&person.id).unwrap(), person);
    }

    #[test]
    fn lists_records() {
        let (interpreter, _) = interpreter();
        assert_eq!(reply_text(&interpreter, "all"), "No persons found");

        reply_text(&interpreter, "set alice 30 chess");
        reply_text(&interpreter, "set bobby 40 golf");
        let listing = reply_text(&interpreter, "ALL");
        assert_eq!(listing.matches("ID: ").count(), 2);
        assert!(listing.ends_with("Hobbies: [golf]\n"));
        assert!(listing.contains("Hobbies: [chess]\n\nID: "));
        assert!(listing.find("alice").unwrap() < listing.find("bobby").unwrap());
    }

    #[test]
    fn unknown_echoes_line() {
        let (interpreter, _) = interpreter();
        let response = interpreter.interpret("  Dance Now  ").unwrap();
        assert_eq!(response.kind, CommandKind::Unknown);
        match response.outcome {
            Outcome::Reply(reply) => {
                assert!(reply.is_error());
                assert_eq!(reply.to_string(), "unknown command: Dance Now");
            }
            Outcome::Close => panic!("unexpected close"),
        }
    }

    #[test]
    fn overlong_update_leaves_record_alone() {
        let (interpreter, store) = interpreter();
        let person = store.create(mdb_common::NewPerson::new("alice", "30", vec!["x".into()]));

        let line = format!("update {} bob 41 golf extra", person.id);
        assert_eq!(reply_text(&interpreter, &line), format!("unknown command: {line}"));
        assert_eq!(store.get(&person.id).unwrap(), person);
    }

    #[test]
    fn exit_and_blank_lines() {
        let (interpreter, _) = interpreter();
        assert!(interpreter.interpret("   ").is_none());
        let response = interpreter.interpret("EXIT").unwrap();
        assert_eq!(response.kind, CommandKind::Exit);
        assert!(matches!(response.outcome, Outcome::Close));
    }

    #[test]
    fn works_through_trait_object() {
        let store: Arc<dyn PersonStore> = Arc::new(MemoryStore::new());
        let interpreter = Interpreter::new(Arc::clone(&store));
        interpreter.interpret("set alice 30 chess").unwrap();
        assert_eq!(store.list().len(), 1);
    }
}
