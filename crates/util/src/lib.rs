//! Common Rust utilities used in ethsub. This crate does not include any
//! Ethereum specific code.

pub mod task;
