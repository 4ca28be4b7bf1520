//! REST API client module for the barbershop backend.
//!
//! This module provides the `ApiClient` used by screens to read and change
//! appointments, customers, services, service requests and users.
//!
//! Authorization is a bearer ID token from the identity provider; expired
//! tokens are refreshed once per failed request.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
