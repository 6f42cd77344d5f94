pub mod client;
pub mod context;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod prompt_template;
pub mod providers;
pub mod transport;
