//! Navigation guard.
//!
//! Every navigation runs a credential check before the screen may render.
//! Signed-out users on protected routes are sent to `/login`; signed-in
//! users on public routes (login, registration) are sent to `/`. Checks are
//! tagged with a transition id so a slow check never redirects after the
//! user has already moved on.

pub mod routes;
pub mod session_guard;

pub use routes::{Access, RouteTable, Verdict};
pub use session_guard::{GuardState, GuardTask, SessionGuard, Transition};
