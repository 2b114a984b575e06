//! Command handlers.

pub mod config;
pub mod search;
pub mod serve;

pub use config::{run_config_check, run_config_show};
pub use search::{SearchCommandInput, run_search};
pub use serve::{ServeCommandInput, run_serve};
