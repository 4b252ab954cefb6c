pub mod app;
pub mod config;
pub mod engine;
pub mod logging;
pub mod render;
pub mod shader;
pub mod terminal;
