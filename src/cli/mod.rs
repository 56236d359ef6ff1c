pub mod commands;
pub mod ui;
pub mod util;

pub use util::{CommandContext, load_agent, resolve_root, until_cancelled};
