use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::routes::{RouteTable, Verdict};
use crate::auth::{Session, SessionContext, SessionEvent, SessionEvents};

/// Redirect chains longer than this indicate a broken route table.
const MAX_REDIRECTS: usize = 4;

/// One navigation, tagged with the id its check result must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: u64,
    pub path: String,
}

/// What observers of the guard see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Check pending; hosts show a neutral loading indicator.
    Checking { transition: u64, path: String },
    Resolved {
        transition: u64,
        path: String,
        session: Session,
        verdict: Verdict,
    },
}

impl GuardState {
    pub fn transition(&self) -> u64 {
        match self {
            GuardState::Checking { transition, .. } | GuardState::Resolved { transition, .. } => {
                *transition
            }
        }
    }

    pub fn session(&self) -> Session {
        match self {
            GuardState::Checking { .. } => Session::checking(),
            GuardState::Resolved { session, .. } => *session,
        }
    }

    /// Children may render only for a resolved check that did not redirect.
    pub fn should_render(&self) -> bool {
        matches!(
            self,
            GuardState::Resolved {
                verdict: Verdict::Render,
                ..
            }
        )
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            GuardState::Resolved {
                verdict: Verdict::Redirect(to),
                ..
            } => Some(to),
            _ => None,
        }
    }
}

/// Gates rendering behind a credential check on every navigation.
pub struct SessionGuard {
    session: Arc<SessionContext>,
    routes: RouteTable,
    current: AtomicU64,
    state: watch::Sender<GuardState>,
}

impl SessionGuard {
    pub fn new(session: Arc<SessionContext>, routes: RouteTable) -> Self {
        let (state, _) = watch::channel(GuardState::Checking {
            transition: 0,
            path: String::new(),
        });
        Self {
            session,
            routes,
            current: AtomicU64::new(0),
            state,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Start a transition; any check still running for an older one
    /// becomes stale.
    pub fn begin(&self, path: &str) -> Transition {
        let mut id = 0;
        self.state.send_modify(|state| {
            id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GuardState::Checking {
                transition: id,
                path: path.to_string(),
            };
        });
        Transition {
            id,
            path: path.to_string(),
        }
    }

    pub fn is_current(&self, transition: &Transition) -> bool {
        self.current.load(Ordering::SeqCst) == transition.id
    }

    /// Resolve a transition. Returns `None`, publishing nothing, when a newer
    /// transition started while the store was being read.
    pub async fn check(&self, transition: &Transition) -> Option<Verdict> {
        let session = self.session.check().await;
        let verdict = self
            .routes
            .decide(&transition.path, session.is_authenticated());

        let mut applied = false;
        self.state.send_if_modified(|state| {
            if !self.is_current(transition) {
                return false;
            }
            *state = GuardState::Resolved {
                transition: transition.id,
                path: transition.path.clone(),
                session,
                verdict: verdict.clone(),
            };
            applied = true;
            true
        });

        if !applied {
            debug!(transition = transition.id, path = %transition.path, "Discarding stale check");
            return None;
        }

        if let Verdict::Redirect(ref to) = verdict {
            info!(from = %transition.path, to = %to, "Guard redirect");
        }
        Some(verdict)
    }

    pub async fn navigate(&self, path: &str) -> Option<Verdict> {
        let transition = self.begin(path);
        self.check(&transition).await
    }

    /// Navigate and follow redirects. Returns the path that renders, or
    /// `None` if a newer navigation took over.
    pub async fn settle(&self, path: &str) -> Option<String> {
        let mut path = path.to_string();
        for _ in 0..MAX_REDIRECTS {
            match self.navigate(&path).await? {
                Verdict::Render => return Some(path),
                Verdict::Redirect(to) => path = to,
            }
        }
        debug!(path = %path, "Redirect limit reached");
        None
    }

    /// Run the guard as a task following `navigation`.
    ///
    /// A pending check is dropped as soon as a newer path arrives. Session
    /// events (sign-in, sign-out, login required) re-check the current path.
    pub fn spawn(self: Arc<Self>, navigation: watch::Receiver<String>) -> GuardTask {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let events = self.session.subscribe();
        let handle = tokio::spawn(self.run(navigation, events, shutdown_rx));
        GuardTask {
            handle,
            shutdown: Some(shutdown_tx),
        }
    }

    async fn run(
        self: Arc<Self>,
        mut navigation: watch::Receiver<String>,
        mut events: SessionEvents,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut recheck = true;
        loop {
            if recheck {
                let path = navigation.borrow_and_update().clone();
                let transition = self.begin(&path);
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = self.check(&transition) => {}
                    changed = navigation.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!(transition = transition.id, "Navigation superseded pending check");
                        continue;
                    }
                }
            }

            tokio::select! {
                _ = &mut shutdown => break,
                changed = navigation.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    recheck = true;
                }
                event = events.recv() => match event {
                    Some(SessionEvent::TokenRefreshed) => recheck = false,
                    Some(event) => {
                        debug!(?event, "Session changed, re-checking route");
                        recheck = true;
                    }
                    None => break,
                },
            }
        }
        debug!("Guard task stopped");
    }
}

/// Handle to a running guard task. Dropping it stops the task.
pub struct GuardTask {
    handle: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl GuardTask {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}
