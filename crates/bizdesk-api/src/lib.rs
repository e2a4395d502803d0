//! REST client for the bizdesk business API.
//!
//! All requests are authorized by [`bizdesk_auth::RequestAuthorizer`].
//! A 401/403 surfaces as [`ApiError::Unauthorized`] so the calling view can
//! route the user back to login.

mod client;
mod error;
mod models;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use models::{ChatMessage, ChatRole};
