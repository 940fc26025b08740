use axum::http::Method;
use once_cell::sync::Lazy;

/// Prefix shared by every JSON API path.
pub const API_PREFIX: &str = "/api";

/// Page the gate redirects unauthenticated browsers to.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Create-backup endpoint.
pub const BACKUPS_CREATE: &str = "/api/backups/create";
pub const BACKUPS_DELETE: &str = "/api/backups/delete";
pub const BACKUPS_DOWNLOAD: &str = "/api/backups/download";
pub const BACKUPS_LIST: &str = "/api/backups/list";
pub const PROCESS_STATUS: &str = "/api/pm2/status";

/// Identity provider routes (sign-in redirect, OAuth callback, sign-out).
pub const IDENTITY_PREFIX: &str = "/api/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path itself. A trailing slash is a different path, as in the router.
    Exact(&'static str),
    /// Matches the path and anything below it, on segment boundaries.
    Prefix(&'static str),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match *self {
            PathPattern::Exact(expected) => path == expected,
            PathPattern::Prefix(prefix) => match path.strip_prefix(prefix) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: PathPattern,
    /// The one method the route accepts; `None` accepts any.
    pub method: Option<Method>,
    pub access: Access,
}

impl RouteRule {
    fn api(path: &'static str, method: Method) -> Self {
        Self {
            pattern: PathPattern::Exact(path),
            method: Some(method),
            access: Access::Protected,
        }
    }

    fn public(pattern: PathPattern) -> Self {
        Self {
            pattern,
            method: None,
            access: Access::Public,
        }
    }
}

/// How a request path resolved against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Declared(&'a RouteRule),
    /// Under `/api` but not declared.
    UndeclaredApi,
    /// Any other path: a protected page with no method restriction.
    Page,
}

impl Resolution<'_> {
    pub fn access(&self) -> Access {
        match self {
            Resolution::Declared(rule) => rule.access,
            Resolution::UndeclaredApi | Resolution::Page => Access::Protected,
        }
    }
}

/// Ordered route rules; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            RouteRule::api(BACKUPS_CREATE, Method::POST),
            RouteRule::api(BACKUPS_DELETE, Method::DELETE),
            RouteRule::api(BACKUPS_DOWNLOAD, Method::GET),
            RouteRule::api(BACKUPS_LIST, Method::GET),
            RouteRule::api(PROCESS_STATUS, Method::GET),
            RouteRule::public(PathPattern::Prefix(IDENTITY_PREFIX)),
            RouteRule::public(PathPattern::Prefix(SIGN_IN_PATH)),
            RouteRule::public(PathPattern::Prefix("/static")),
            RouteRule::public(PathPattern::Prefix("/images")),
            RouteRule::public(PathPattern::Exact("/favicon.ico")),
            RouteRule::public(PathPattern::Exact("/robots.txt")),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        let normalized = is_normalized(path);
        let declared = self
            .rules
            .iter()
            // Dot segments could smuggle a protected path behind a public prefix.
            .filter(|rule| normalized || rule.access == Access::Protected)
            .find(|rule| rule.pattern.matches(path));

        match declared {
            Some(rule) => Resolution::Declared(rule),
            None if is_api_path(path) => Resolution::UndeclaredApi,
            None => Resolution::Page,
        }
    }
}

/// The route table used by the running server.
pub static ROUTES: Lazy<RouteTable> = Lazy::new(RouteTable::standard);

pub fn is_api_path(path: &str) -> bool {
    PathPattern::Prefix(API_PREFIX).matches(path)
}

/// True when no segment is `.` or `..`, literally or percent-encoded.
fn is_normalized(path: &str) -> bool {
    path.split('/').all(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment != "." && segment != ".."
    })
}
