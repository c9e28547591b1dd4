pub mod settings;

pub use settings::{AppConfig, BusinessConfig, CorsConfig, RelayConfig, ServerConfig, SubmissionConfig};
