//! Service shell: application state, health checks, and the query surface

pub mod app;
pub mod health;
pub mod query;

pub use app::AppState;
pub use health::{HealthReport, HealthStatus};
pub use query::{QueryServer, QueryServerConfig};
