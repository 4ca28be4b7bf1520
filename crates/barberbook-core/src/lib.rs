//! Core library for the barberbook appointment client.
//!
//! - [`auth`]: credentials, platform credential stores, the identity provider
//!   and the shared [`auth::SessionContext`]
//! - [`guard`]: route classification and the [`guard::SessionGuard`]
//! - [`api`]: the authenticated REST client with one-shot refresh-retry
//! - [`models`]: request/response schemas for the backend resources
//! - [`config`]: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, CredentialStore, Session, SessionContext, SessionEvent};
pub use config::{Config, Platform};
pub use guard::{Access, GuardState, RouteTable, SessionGuard, Verdict};
