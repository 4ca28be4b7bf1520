use std::collections::HashSet;

/// Whether a screen needs a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// What the guard tells the host to do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Render,
    Redirect(String),
}

/// Static route classification. Anything not listed as public is protected.
#[derive(Debug, Clone)]
pub struct RouteTable {
    public: HashSet<String>,
    login: String,
    landing: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new("/login", "/").with_public(["login", "cadastro", "register", "forgot-password"])
    }
}

impl RouteTable {
    pub fn new(login: impl Into<String>, landing: impl Into<String>) -> Self {
        Self {
            public: HashSet::new(),
            login: login.into(),
            landing: landing.into(),
        }
    }

    /// Mark first path segments as public.
    pub fn with_public<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn landing(&self) -> &str {
        &self.landing
    }

    /// First segment of a path, ignoring query string, fragment and
    /// surrounding slashes. `/` yields an empty segment.
    pub fn segment(path: &str) -> &str {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        path.trim_start_matches('/').split('/').next().unwrap_or_default()
    }

    pub fn classify(&self, path: &str) -> Access {
        if self.public.contains(Self::segment(path)) {
            Access::Public
        } else {
            Access::Protected
        }
    }

    /// Pure guard decision for a resolved session.
    pub fn decide(&self, path: &str, authenticated: bool) -> Verdict {
        match (self.classify(path), authenticated) {
            (Access::Public, true) => Verdict::Redirect(self.landing.clone()),
            (Access::Protected, false) => Verdict::Redirect(self.login.clone()),
            _ => Verdict::Render,
        }
    }
}
