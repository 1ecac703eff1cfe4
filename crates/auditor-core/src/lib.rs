pub mod audit;
pub mod config;
pub mod logging;
pub mod mode;
pub mod relay;
pub mod state;

// Re-export main types for convenience
pub use audit::AuditReport;
pub use config::{Config, ConfigError};
pub use mode::RelayMode;
pub use relay::{HttpTransport, Relay, RelayError, Transport, ERROR_TEXT};
pub use state::{SubmissionSequence, Ticket};
