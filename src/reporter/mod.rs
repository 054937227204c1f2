pub mod handlers;
pub mod prompt;
pub mod service;

pub use handlers::router;
