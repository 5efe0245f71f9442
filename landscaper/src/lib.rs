pub mod cli;
pub mod credentials;
pub mod load_landscape;
pub mod render;

pub use cli::{execute, run, Cli, Commands};
