pub mod config;
pub mod logger;
pub mod printer;
pub mod transforms;
