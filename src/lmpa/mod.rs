//! Linear map preimage arguments (LMPA).
//!
//! Statements have the form `A·w = t` for a public matrix of group elements `A`,
//! a public image `t` and a secret scalar witness `w`.

pub mod no_zk;
pub mod simple_zk;
