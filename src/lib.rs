pub mod models;
pub mod error;
pub mod config;
pub mod catalog;
pub mod request;
pub mod verdict;
pub mod limiter;
pub mod engine;
pub mod scanner;
pub mod progress;
pub mod aggregate;
pub mod reporting;

// Re-export commonly used items
pub use models::*;
pub use error::*;
pub use config::*;
pub use catalog::*;
pub use request::*;
pub use verdict::*;
pub use limiter::*;
pub use engine::*;
pub use scanner::*;
pub use progress::*;
pub use aggregate::*;
pub use reporting::*;
