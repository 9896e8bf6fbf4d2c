pub mod config;
pub mod errors;
pub mod instance;
pub mod log;
pub mod orchestrator;
pub mod pool;
pub mod restart;
pub mod selector;
