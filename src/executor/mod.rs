//! Guest command execution
//!
//! Guest steps hand their commands to a [`CommandRunner`]. Production
//! code uses [`ProcessRunner`]; tests record commands instead of running
//! them.

mod process;
#[cfg(test)]
pub(crate) mod recording;
mod traits;

pub use process::ProcessRunner;
pub use traits::{CommandRunner, GuestCommand};
