pub mod http;
pub mod log;

pub use http::HttpStepReporter;
pub use log::LogStepReporter;
