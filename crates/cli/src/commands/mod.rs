//! CLI command modules

pub mod records;
pub mod serve;

pub use records::{execute_delete_command, execute_list_command, execute_seed_command};
pub use serve::{execute_serve_command, ServeArgs};
