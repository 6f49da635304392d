//! Request identity: who is asking, from where, and what they may do.

pub mod address;
pub mod binder;
pub mod policy;
pub mod privilege;

pub use address::BoundAddress;
pub use binder::{RequestContext, SessionBinder};
pub use policy::{Principal, Requirement, permits, view_level};
pub use privilege::{Privilege, UnknownPrivilege};
