pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

pub use domain::session;
pub use domain::session::errors::AuthError;
pub use domain::session::service::AuthService;
pub use domain::session::service::SessionPolicy;
pub use domain::session::validator::SessionValidator;
