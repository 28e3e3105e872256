//! Chat front end: commands, result sessions, and the polling loop.

pub mod handlers;
pub mod messages;
pub mod rate_limit;
pub mod runner;
pub mod session;

pub use handlers::{Bot, ButtonPress, Command};
pub use runner::run_polling;
