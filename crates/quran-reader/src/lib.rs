// Quran reader front-end library exports

pub mod app;
pub mod command_processor;
pub mod config;
pub mod file_manager;
pub mod highlight;
pub mod status_manager;
pub mod text_width;

pub use app::App;
pub use command_processor::{Command, CommandProcessor};
pub use config::Config;
