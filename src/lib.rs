pub mod commands;
pub mod console;
pub mod consts;
pub mod diffing;
pub mod exceptions;
pub mod fs;
pub mod llm;
pub mod logging;
pub mod models;
pub mod patcher;
pub mod recipe;
pub mod utils;
pub mod vcs;
