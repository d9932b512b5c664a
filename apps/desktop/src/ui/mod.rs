//! Line-oriented front end: command parsing, rendering, and the interactive loop.

pub mod app;
pub mod console;

pub use app::ConsoleApp;
