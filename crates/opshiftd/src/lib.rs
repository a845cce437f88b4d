pub mod app;
pub mod logging;
pub mod operations;
pub mod replay;
pub mod trace;
