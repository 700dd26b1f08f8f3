pub mod client;
pub mod error;
pub mod import;
pub mod refresh;
pub mod session;

pub use client::{LocalStore, RemoteStore, RestStore};
pub use error::ClientError;
pub use refresh::{PeriodicRefresh, DEFAULT_REFRESH_INTERVAL};
pub use session::{AuthSession, ScoreSession, ViewMode};
