pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod renderer;
pub mod utils;
pub mod worker;
