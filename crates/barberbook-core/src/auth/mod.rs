//! Authentication module for managing credentials and the shared session.
//!
//! This module provides:
//! - `Credential`: bearer token + user id (+ provider refresh token)
//! - `CredentialStore`: key-value store abstraction with a keyring backend
//!   (native), a local-storage file backend (web) and an in-memory backend
//! - `IdentityProvider`: sign-in, sign-up and forced token refresh
//! - `SessionContext`: the single object injected into the guard and the
//!   API client, with a coalescing refresh gate and session events

pub mod credentials;
pub mod identity;
pub mod session;
pub mod storage;

pub use credentials::{open_store, Credential, CredentialStore, SecureStorage, StoreError};
pub use identity::{AuthFailure, FirebaseIdentity, IdentityProvider, ProviderSession};
pub use session::{AuthError, Session, SessionContext, SessionEvent, SessionEvents};
pub use storage::{LocalStorage, MemoryStore};
