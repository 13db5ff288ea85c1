//! Quadratic equation satisfiability arguments.
//!
//! - [`mapping`]: commitment configurations, [`commit`](mapping::commit) and the copy layout.
//! - [`inner`]: a committed witness satisfies one batched quadratic constraint.
//! - [`copy`]: a witness satisfies several quadratic constraints and shares
//!   values with commitments produced elsewhere.

pub mod copy;
pub mod inner;
pub mod mapping;
