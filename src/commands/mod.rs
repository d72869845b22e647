//! # CLI Command Implementations
//!
//! The tool has a single command. It lives in its own module with:
//!
//! - An `Args` struct that defines the arguments and options, derived using
//!   `clap`.
//! - An `execute` function that takes the parsed `Args` and calls into the
//!   `add_project` library to perform the core logic.

pub mod add;
