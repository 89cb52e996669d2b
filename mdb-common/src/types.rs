//! # Record Types
//!
//! Purpose: Define the person record and the parameter shapes used to create
//! and partially update it.
//!
//! ## Design Principles
//!
//! 1. **Server-Assigned Identity**: `Person::id` is generated here and never
//!    taken from client input.
//! 2. **Explicit Absence**: Partial updates use `Option` so "not supplied" is
//!    distinct from any concrete value.
//! 3. **Owned Copies**: Records are plain `Clone` values; callers never hold
//!    references into a store.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Opaque unique identifier, immutable after creation.
    pub id: String,
    /// Display name, 3 to 30 characters.
    pub name: String,
    /// String-encoded age, kept as supplied by the client.
    pub age: String,
    /// Ordered, non-empty list of hobbies.
    pub hobbies: Vec<String>,
}

impl Person {
    /// Builds a new record with a freshly generated id.
    pub fn from_params(params: NewPerson) -> Self {
        Person {
            id: Uuid::new_v4().to_string(),
            name: params.name,
            age: params.age,
            hobbies: params.hobbies,
        }
    }

    /// Applies the supplied fields of a patch in place.
    ///
    /// Empty `name`/`age` strings count as "not supplied", matching the
    /// request-style front end where absent JSON fields decode as empty.
    pub fn apply(&mut self, patch: PersonPatch) {
        if let Some(name) = patch.name.filter(|name| !name.is_empty()) {
            self.name = name;
        }
        if let Some(age) = patch.age.filter(|age| !age.is_empty()) {
            self.age = age;
        }
        if let Some(hobbies) = patch.hobbies {
            self.hobbies = hobbies;
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Age: {}", self.age)?;
        write!(f, "Hobbies: [{}]", self.hobbies.join(", "))
    }
}

/// Parameters for creating a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

impl NewPerson {
    pub fn new(name: impl Into<String>, age: impl Into<String>, hobbies: Vec<String>) -> Self {
        NewPerson {
            name: name.into(),
            age: age.into(),
            hobbies,
        }
    }
}

/// Partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<Vec<String>>,
}

impl PersonPatch {
    /// Returns true if the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().is_none_or(str::is_empty)
            && self.age.as_deref().is_none_or(str::is_empty)
            && self.hobbies.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hobbies(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn generates_distinct_ids() {
        let a = Person::from_params(NewPerson::new("alice", "30", hobbies(&["chess"])));
        let b = Person::from_params(NewPerson::new("alice", "30", hobbies(&["chess"])));
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn apply_keeps_omitted_fields() {
        let mut person = Person::from_params(NewPerson::new("alice", "30", hobbies(&["chess"])));
        let id = person.id.clone();
        person.apply(PersonPatch {
            name: Some("bob".into()),
            ..PersonPatch::default()
        });
        assert_eq!(person.id, id);
        assert_eq!(person.name, "bob");
        assert_eq!(person.age, "30");
        assert_eq!(person.hobbies, hobbies(&["chess"]));
    }

    #[test]
    fn apply_treats_empty_strings_as_absent() {
        let mut person = Person::from_params(NewPerson::new("alice", "30", hobbies(&["chess"])));
        person.apply(PersonPatch {
            name: Some(String::new()),
            age: Some(String::new()),
            hobbies: None,
        });
        assert_eq!(person.name, "alice");
        assert_eq!(person.age, "30");
    }

    #[test]
    fn renders_record_block() {
        let person = Person {
            id: "42".into(),
            name: "alice".into(),
            age: "30".into(),
            hobbies: hobbies(&["reading", "chess"]),
        };
        assert_eq!(
            person.to_string(),
            "ID: 42\nName: alice\nAge: 30\nHobbies: [reading, chess]"
        );
    }

    #[test]
    fn decodes_request_body() {
        let params: NewPerson =
            serde_json::from_str(r#"{"name":"alice","age":"30","hobbies":["chess"]}"#).unwrap();
        assert_eq!(params, NewPerson::new("alice", "30", hobbies(&["chess"])));

        let patch: PersonPatch = serde_json::from_str(r#"{"age":"31"}"#).unwrap();
        assert_eq!(patch.age.as_deref(), Some("31"));
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());
        assert!(PersonPatch::default().is_empty());
    }
}
