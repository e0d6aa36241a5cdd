pub mod cache;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod store;
pub mod translate;
pub mod validation;

pub use config::Config;
pub use error::{ErrorEnvelope, ErrorKind, TranslateError};
pub use state::AppState;
