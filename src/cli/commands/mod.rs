pub mod codebase;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod run;
