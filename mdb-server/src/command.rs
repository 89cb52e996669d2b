//! # Command Parsing
//!
//! Turn one protocol line into a typed [`Command`]. Only the keyword is
//! case-insensitive; arguments keep their case. Any keyword or arity that
//! does not match the grammar becomes `MdbError::UnknownCommand` carrying the
//! original line.
//!
//! ```text
//! set <name> <age> <hobby1,hobby2,...>
//! get <id>
//! update <id> [name] [age] [hobby1,hobby2,...]
//! delete <id>
//! all
//! exit
//! ```

use core::fmt;

use mdb_common::{MdbError, MdbResult, NewPerson, PersonPatch};

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(NewPerson),
    Get { id: String },
    Update { id: String, patch: PersonPatch },
    Delete { id: String },
    All,
    Exit,
}

/// Command discriminant used for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Set,
    Get,
    Update,
    Delete,
    All,
    Exit,
    Unknown,
}

impl CommandKind {
    pub const COUNT: usize = 7;

    pub const ALL: [CommandKind; Self::COUNT] = [
        Self::Set,
        Self::Get,
        Self::Update,
        Self::Delete,
        Self::All,
        Self::Exit,
        Self::Unknown,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::All => "all",
            Self::Exit => "exit",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    /// Parses a trimmed, non-empty line.
    pub fn parse(line: &str) -> MdbResult<Command> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((keyword, rest)) = args.split_first() else {
            return Err(MdbError::unknown_command(line));
        };

        let command = match (keyword.to_ascii_lowercase().as_str(), rest) {
            ("set", [name, age, hobbies]) => {
                Command::Set(NewPerson::new(*name, *age, split_hobbies(hobbies)))
            }
            ("get", [id]) => Command::Get { id: id.to_string() },
            ("update", [id, fields @ ..]) if fields.len() <= 3 => Command::Update {
                id: id.to_string(),
                patch: PersonPatch {
                    name: fields.first().map(|name| name.to_string()),
                    age: fields.get(1).map(|age| age.to_string()),
                    hobbies: fields.get(2).map(|hobbies| split_hobbies(hobbies)),
                },
            },
            ("delete", [id]) => Command::Delete { id: id.to_string() },
            ("all", []) => Command::All,
            ("exit", []) => Command::Exit,
            _ => return Err(MdbError::unknown_command(line)),
        };
        Ok(command)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Set(_) => CommandKind::Set,
            Command::Get { .. } => CommandKind::Get,
            Command::Update { .. } => CommandKind::Update,
            Command::Delete { .. } => CommandKind::Delete,
            Command::All => CommandKind::All,
            Command::Exit => CommandKind::Exit,
        }
    }
}

/// Splits a comma list, dropping empty items.
fn split_hobbies(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|hobby| !hobby.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_set() {
        let command = Command::parse("SET Alice 30 reading,chess").unwrap();
        assert_eq!(
            command,
            Command::Set(NewPerson::new("Alice", "30", strings(&["reading", "chess"])))
        );
        assert_eq!(command.kind(), CommandKind::Set);
    }

    #[test]
    fn parses_positional_update() {
        let command = Command::parse("update abc bob").unwrap();
        assert_eq!(
            command,
            Command::Update {
                id: "abc".into(),
                patch: PersonPatch {
                    name: Some("bob".into()),
                    ..PersonPatch::default()
                },
            }
        );

        let command = Command::parse("update abc bob 41 golf").unwrap();
        let Command::Update { patch, .. } = command else {
            panic!("expected update");
        };
        assert_eq!(patch.age.as_deref(), Some("41"));
        assert_eq!(patch.hobbies, Some(strings(&["golf"])));

        let Command::Update { patch, .. } = Command::parse("update abc").unwrap() else {
            panic!("expected update");
        };
        assert!(patch.is_empty());
    }

    #[test]
    fn update_rejects_trailing_tokens() {
        let line = "update abc bob 41 golf extra";
        match Command::parse(line) {
            Err(MdbError::UnknownCommand { line: echoed }) => assert_eq!(echoed, line),
            other => panic!("trailing tokens parsed as {other:?}"),
        }
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(
            Command::parse("get abc").unwrap(),
            Command::Get { id: "abc".into() }
        );
        assert_eq!(
            Command::parse("Delete abc").unwrap(),
            Command::Delete { id: "abc".into() }
        );
        assert_eq!(Command::parse("ALL").unwrap(), Command::All);
        assert_eq!(Command::parse("exit").unwrap(), Command::Exit);
    }

    #[test]
    fn drops_empty_hobbies() {
        let Command::Set(params) = Command::parse("set bob 30 ,").unwrap() else {
            panic!("expected set");
        };
        assert!(params.hobbies.is_empty());

        let Command::Set(params) = Command::parse("set bob 30 a,,b").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(params.hobbies, strings(&["a", "b"]));
    }

    #[test]
    fn wrong_arity_is_unknown() {
        for line in [
            "set alice 30",
            "get",
            "get a b",
            "update",
            "update a b c d e",
            "delete",
            "all now",
            "exit please",
            "fly me to the moon",
        ] {
            match Command::parse(line) {
                Err(MdbError::UnknownCommand { line: echoed }) => assert_eq!(echoed, line),
                other => panic!("{line:?} parsed as {other:?}"),
            }
        }
    }
}
