//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM.
//! - **memory**: mutex-guarded in-process store with the same constraints.
//!
//! Adapters only translate between storage representations and domain
//! types; they contain no business logic.

pub mod memory;
pub mod persistence;
