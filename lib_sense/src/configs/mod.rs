/// Address and reconnect settings for a `ClientEndpoint`.
pub mod config_endpoint;

pub use config_endpoint::*;
