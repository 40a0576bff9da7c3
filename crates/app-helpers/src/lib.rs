pub mod dirs;
pub mod list;
