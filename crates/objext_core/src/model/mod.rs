//! Dynamic object model shared by hosts and extensions.
//!
//! # Responsibility
//! - Define values, explicit signatures and member tables.
//! - Keep call binding independent from composition logic.
//!
//! # Invariants
//! - Every callable carries an explicit `Signature`; nothing is inferred by
//!   reflection.

pub mod member;
pub mod signature;
pub mod value;
