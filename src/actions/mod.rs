//! Mutating operations of the board and their uniform dispatch.
//!
//! Every request names one action. The dispatcher looks it up, checks the
//! caller's privilege and the submitted fields, and only then runs the
//! handler. Handlers return a value; the HTTP layer turns it into exactly
//! one response.

pub mod dispatcher;
pub mod error;
pub mod fields;
pub mod handlers;
pub mod links;
pub mod outcome;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatcher::Dispatcher;
pub use error::{ActionError, FailureKind, MessageKey};
pub use fields::Fields;
pub use handlers::Handlers;
pub use outcome::Outcome;
pub use registry::{Action, ActionRegistry};
