pub mod app;
pub mod config;
pub mod logging;
pub mod selection;
pub mod source;
pub mod ui;
pub mod validation;
