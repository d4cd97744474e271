pub mod gateway;
#[cfg(feature = "network")]
pub mod http;
pub mod json_store;
pub mod schema;
pub mod sync;

pub use gateway::{AuthGrant, Gateway, GatewayError};
pub use json_store::JsonStore;
pub use schema::{AppSettings, AppState, UserProfile, WordCountOption};
