//! Reusable UI flows
//!
//! Each flow takes the session and the test case explicitly and returns a
//! `Result` the runner acts on. A flow records exactly one assertion.

pub mod create_page;
pub mod interact;
pub mod login;

pub use create_page::create_page;
pub use interact::{animated_type, move_pointer_and_click};
pub use login::login;
