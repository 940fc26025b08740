use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use super::routes::{is_api_path, Access, Resolution, RouteTable, SIGN_IN_PATH};
use crate::auth::{Session, SessionVerifier};
use crate::error::ApiError;

/// Characters escaped in the `callbackUrl` query value. `/` stays readable.
const CALLBACK_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to the handler. Carries the verified session when one was checked.
    Allow(Option<Session>),
    DenyUnauthorized(UnauthorizedShape),
    DenyMethodNotAllowed {
        path: String,
        allowed: Method,
        actual: Method,
    },
    /// Authenticated request to an API path that has no declared rule.
    DenyUndeclaredRoute { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedShape {
    Json,
    Redirect { callback_url: String },
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// Split into the session to attach, or the terminal denial response.
    pub fn into_outcome(self) -> Result<Option<Session>, Response> {
        match self {
            Decision::Allow(session) => Ok(session),
            Decision::DenyUnauthorized(UnauthorizedShape::Json) => {
                Err(ApiError::unauthorized("Unauthorized").into_response())
            }
            Decision::DenyUnauthorized(UnauthorizedShape::Redirect { callback_url }) => {
                Err(Redirect::temporary(&sign_in_location(&callback_url)).into_response())
            }
            Decision::DenyMethodNotAllowed { path, allowed, actual } => Err(ApiError::method_not_allowed(
                format!(
                    "Method Not Allowed: {} is not supported on {}. Use {}.",
                    actual, path, allowed
                ),
                allowed,
            )
            .into_response()),
            Decision::DenyUndeclaredRoute { path } => Err(ApiError::not_found(format!(
                "Not Found: no API route is declared for {}",
                path
            ))
            .into_response()),
        }
    }
}

/// Per-request authorization and method gate in front of every route.
pub struct RequestGate {
    routes: &'static RouteTable,
    verifier: Arc<dyn SessionVerifier>,
    bypass: bool,
}

impl RequestGate {
    pub fn new(routes: &'static RouteTable, verifier: Arc<dyn SessionVerifier>, bypass: bool) -> Self {
        if bypass {
            tracing::warn!("request gate bypass is enabled; every request will be allowed");
        }
        Self {
            routes,
            verifier,
            bypass,
        }
    }

    pub fn evaluate<B>(&self, request: &axum::http::Request<B>) -> Decision {
        if self.bypass {
            return Decision::Allow(None);
        }

        let path = request.uri().path();
        let resolution = self.routes.resolve(path);

        let session = match resolution.access() {
            Access::Public => None,
            Access::Protected => match self.verifier.verify(request.headers()) {
                Some(session) => Some(session),
                None => {
                    let shape = if is_api_path(path) {
                        UnauthorizedShape::Json
                    } else {
                        let callback_url = request
                            .uri()
                            .path_and_query()
                            .map(|pq| pq.as_str().to_string())
                            .unwrap_or_else(|| path.to_string());
                        UnauthorizedShape::Redirect { callback_url }
                    };
                    return Decision::DenyUnauthorized(shape);
                }
            },
        };

        match resolution {
            Resolution::Declared(rule) => match &rule.method {
                Some(allowed) if allowed != request.method() => Decision::DenyMethodNotAllowed {
                    path: path.to_string(),
                    allowed: allowed.clone(),
                    actual: request.method().clone(),
                },
                _ => Decision::Allow(session),
            },
            Resolution::UndeclaredApi => Decision::DenyUndeclaredRoute {
                path: path.to_string(),
            },
            Resolution::Page => Decision::Allow(session),
        }
    }
}

/// Axum middleware applying [`RequestGate::evaluate`] to every request.
pub async fn request_gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = gate.evaluate(&request);
    log_decision(&request, &decision);

    match decision.into_outcome() {
        Ok(session) => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Err(response) => response,
    }
}

fn log_decision(request: &Request, decision: &Decision) {
    let method = request.method();
    let path = request.uri().path();
    match decision {
        Decision::Allow(_) => tracing::debug!("gate allowed {} {}", method, path),
        Decision::DenyUnauthorized(_) => tracing::info!("gate denied {} {}: unauthenticated", method, path),
        Decision::DenyMethodNotAllowed { allowed, .. } => {
            tracing::warn!("gate denied {} {}: method not allowed, expected {}", method, path, allowed)
        }
        Decision::DenyUndeclaredRoute { .. } => {
            tracing::warn!("gate denied {} {}: misconfigured route, no API rule declared", method, path)
        }
    }
}

fn sign_in_location(callback_url: &str) -> String {
    format!(
        "{}?callbackUrl={}",
        SIGN_IN_PATH,
        utf8_percent_encode(callback_url, CALLBACK_ENCODE_SET)
    )
}
