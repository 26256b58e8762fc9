pub mod models;
pub mod services;

// Re-export models and the service entry points for external use
pub use models::*;
pub use services::*;
