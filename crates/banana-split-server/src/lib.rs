/*
[INPUT]:  Public API exports for banana-split-server crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod error;
pub mod redirect_cookie;
pub mod routes;
pub mod state;

// Re-export main types for convenience
pub use config::{ProviderConfig, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use redirect_cookie::{CookieRedirectStore, REDIRECT_COOKIE};
pub use routes::{SESSION_COOKIE, build_router};
pub use state::{AppState, SharedState};
