//! # Domain Module
//!
//! Pure state and rules for the middleware: windowed sets, the membership
//! registry and the key rotation registry. Nothing here talks to a
//! collaborator or reads a clock; every operation takes `now` explicitly.

pub mod errors;
pub mod invariants;
pub mod key_registry;
pub mod membership;
pub mod value_objects;
pub mod windowed_set;

pub use errors::*;
pub use invariants::*;
pub use key_registry::*;
pub use membership::*;
pub use value_objects::*;
pub use windowed_set::*;
