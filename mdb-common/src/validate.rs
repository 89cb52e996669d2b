//! # Input Validation
//!
//! Field rules shared by every front end. A validation pass returns one
//! message per offending field; an empty result means the input is valid.
//!
//! ## Age Rule
//!
//! The length bound on `age` is skipped when the value is empty or `"0"`,
//! but the value must still parse as an integer. An empty age therefore
//! fails with the "must be a number" message rather than the length one.
//! Older servers speaking this protocol report the length message for `""`.
//! Both reject the value; only the message differs.

use core::fmt;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{NewPerson, PersonPatch};

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 30;
pub const MIN_AGE_LEN: usize = 1;
pub const MAX_AGE_LEN: usize = 3;
pub const MIN_HOBBIES: usize = 1;

/// Record field a validation message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Age,
    Hobbies,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Hobbies => "hobbies",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-keyed validation messages, iterated in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, &'static str>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }

    /// Converts into a `Result`, keeping `self` as the error when non-empty.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (field, message)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// Validates a full set of record fields.
pub fn validate(name: &str, age: &str, hobbies: &[String]) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if let Some(message) = check_name(name) {
        errors.insert(Field::Name, message);
    }
    if let Some(message) = check_age(age) {
        errors.insert(Field::Age, message);
    }
    if let Some(message) = check_hobbies(hobbies) {
        errors.insert(Field::Hobbies, message);
    }
    errors
}

fn check_name(name: &str) -> Option<&'static str> {
    let len = name.chars().count();
    (!(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len))
        .then_some("name must be between 3 and 30 characters")
}

fn check_age(age: &str) -> Option<&'static str> {
    let exempt = age.is_empty() || age == "0";
    if !exempt && !(MIN_AGE_LEN..=MAX_AGE_LEN).contains(&age.len()) {
        return Some("age must be between 1 and 3 characters");
    }
    age.parse::<i64>().is_err().then_some("age must be a number")
}

fn check_hobbies(hobbies: &[String]) -> Option<&'static str> {
    (hobbies.len() < MIN_HOBBIES).then_some("hobbies must have at least 1 item")
}

impl NewPerson {
    pub fn validate(&self) -> ValidationErrors {
        validate(&self.name, &self.age, &self.hobbies)
    }
}

impl PersonPatch {
    /// Validates only the fields the patch actually supplies.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if let Some(message) = self.name.as_deref().filter(|n| !n.is_empty()).and_then(check_name) {
            errors.insert(Field::Name, message);
        }
        if let Some(message) = self.age.as_deref().filter(|a| !a.is_empty()).and_then(check_age) {
            errors.insert(Field::Age, message);
        }
        if let Some(message) = self.hobbies.as_deref().and_then(check_hobbies) {
            errors.insert(Field::Hobbies, message);
        }
        errors
    }
}
