// Core library for the Ductile event framework
// This crate contains the resolver: registrations, lifetimes, scopes and
// the extension points other crates plug into.

pub mod container;
pub mod error;
pub mod logging;
pub mod registration;
pub mod scope;
pub mod traits;
pub mod type_key;

// Re-export commonly used types
pub use container::*;
pub use error::*;
pub use registration::*;
pub use scope::*;
pub use traits::*;
pub use type_key::*;
