pub mod commands;
pub mod ui;

pub use commands::generate::GenerateOptions;
pub use ui::Output;
