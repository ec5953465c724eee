//! Seams between the setup flow and the host

mod fetch;
mod runner;

pub use fetch::Fetcher;
pub use runner::{ChildProcess, CommandRunner};
