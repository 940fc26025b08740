pub mod gate;
pub mod routes;

pub use gate::{request_gate_middleware, Decision, RequestGate, UnauthorizedShape};
pub use routes::{Access, PathPattern, Resolution, RouteRule, RouteTable, ROUTES};
