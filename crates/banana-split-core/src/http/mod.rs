/*
[INPUT]:  HTTP client configuration and endpoints
[OUTPUT]: Verified tokens, provider users and verification responses
[POS]:    HTTP layer - provider and verification endpoint clients
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod verify;

pub use client::{AppCredentials, ClientConfig, ProviderClient};
pub use verify::VerifyClient;
