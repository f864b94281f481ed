//! Runtime for executing a session
//!
//! The controller runs effects produced by the state machine. Remote calls
//! are spawned as tasks; their completions come back over a channel and are
//! applied on the same loop that handles user input.

mod controller;

#[cfg(test)]
pub mod testing;

pub use controller::SessionController;
