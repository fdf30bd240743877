pub mod config;
pub mod constants;
pub mod engine;
pub mod feedback;
pub mod logging;
pub mod state;
pub mod store;
pub mod workers;
