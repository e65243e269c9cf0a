//! Route admission: the allow/redirect decision made for an incoming path
//! before it is served. The decision sees only the edge-readable token slot
//! (the filter runs before any script executes) and is pure and total: every
//! path/flag combination yields exactly one outcome.

pub mod layer;

use url::form_urlencoded;

/// Route prefix tables and redirect targets, consumed from configuration.
/// Defaults mirror the client's shipped route map.
#[derive(Debug, Clone)]
pub struct RouteTables {
    pub protected: Vec<String>,
    pub auth_only: Vec<String>,
    pub public: Vec<String>,
    pub login_page: String,
    pub default_redirect: String,
}

impl Default for RouteTables {
    fn default() -> Self {
        Self {
            protected: vec!["/upload".to_string(), "/dashboard".to_string()],
            auth_only: vec!["/auth".to_string()],
            public: vec![
                "/".to_string(),
                "/lessons".to_string(),
                "/review".to_string(),
                "/auth".to_string(),
            ],
            login_page: "/auth".to_string(),
            default_redirect: "/dashboard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session.
    Protected,
    /// Must not be visited while authenticated, e.g. the login page.
    AuthOnly,
    /// No constraint.
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Redirect(String),
}

fn longest_match(prefixes: &[String], path: &str) -> Option<usize> {
    prefixes
        .iter()
        .filter(|prefix| path.starts_with(prefix.as_str()))
        .map(String::len)
        .max()
}

/// Classify a path by longest-prefix match over the three tables. Ties break
/// in priority order protected > auth-only > public; unmatched paths are
/// public.
#[must_use]
pub fn classify(tables: &RouteTables, path: &str) -> RouteClass {
    let protected = longest_match(&tables.protected, path);
    let auth_only = longest_match(&tables.auth_only, path);
    let public = longest_match(&tables.public, path);

    let best = protected.max(auth_only).max(public);
    match best {
        None => RouteClass::Public,
        Some(_) if protected == best => RouteClass::Protected,
        Some(_) if auth_only == best => RouteClass::AuthOnly,
        Some(_) => RouteClass::Public,
    }
}

/// Login page URL carrying the requested path as the return target.
#[must_use]
pub fn login_redirect(login_page: &str, path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{login_page}?returnUrl={encoded}")
}

/// The admission decision. `return_url` is the already-decoded `returnUrl`
/// query parameter of the request, if any; `has_edge_token` is the presence
/// of the token in the edge-readable slot.
#[must_use]
pub fn admit(
    tables: &RouteTables,
    path: &str,
    return_url: Option<&str>,
    has_edge_token: bool,
) -> Admission {
    match classify(tables, path) {
        RouteClass::Protected if !has_edge_token => {
            Admission::Redirect(login_redirect(&tables.login_page, path))
        }
        RouteClass::AuthOnly if has_edge_token => {
            let target = return_url
                .filter(|url| !url.is_empty())
                .map_or_else(|| tables.default_redirect.clone(), |url| url.to_string());
            Admission::Redirect(target)
        }
        _ => Admission::Allow,
    }
}
