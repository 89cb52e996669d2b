// mdb-common - Shared record types, validation and errors for MemoryDB
//
// Both front ends (the line protocol server and the request-style API) build
// on the types in this crate so they agree on what a valid record is.

pub mod error;
pub mod types;
pub mod validate;

// Re-export for convenience
pub use error::*;
pub use types::*;
pub use validate::*;
