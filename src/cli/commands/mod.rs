//! Command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod mapping;
pub mod tag;
pub mod template;
