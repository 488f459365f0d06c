//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `create` - `create_from_iso` and `create`
//! - `start` - boot an installed image

pub mod create;
pub mod start;

pub use create::{cmd_create, cmd_create_from_iso};
pub use start::cmd_start;
