//! # Store Interface
//!
//! ## Design Principles
//!
//! 1. **Strategy Pattern**: Front ends depend on the `PersonStore` capability
//!    set, so a persistent implementation can replace the in-memory one
//!    without touching either front end.
//! 2. **Copies Out**: Every operation returns owned records; callers cannot
//!    alias or mutate stored state.
//! 3. **Infallible Core**: Absence is expressed as `None`/`false`, never as
//!    an error.
//! 4. **Zero-Cost Dispatch**: When used with generics, calls monomorphize to
//!    avoid dynamic dispatch overhead; `?Sized` bounds still admit
//!    `dyn PersonStore`.

use mdb_common::{NewPerson, Person, PersonPatch};

/// Strategy pattern: defines the store behavior surface for the front ends.
///
/// All methods must be safe to call concurrently from many handler tasks.
/// Inputs are assumed to be validated by the caller.
pub trait PersonStore: Send + Sync {
    /// Assigns a fresh id, appends the record and returns a copy of it.
    fn create(&self, params: NewPerson) -> Person;

    /// Returns a copy of the record with the given id.
    fn get(&self, id: &str) -> Option<Person>;

    /// Applies the supplied fields of `patch` and returns the updated record.
    fn update(&self, id: &str, patch: PersonPatch) -> Option<Person>;

    /// Removes the record with the given id. Returns true if it existed.
    fn delete(&self, id: &str) -> bool;

    /// Returns a snapshot of every record in insertion order.
    fn list(&self) -> Vec<Person>;
}
