//! HTTP middleware stack for the gateway.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions; added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS headers (`Access-Control-Allow-Origin: *` on every response)
//! 5. `CatchPanicLayer` (turn panics into a JSON 500 that still gets CORS)

pub mod cors;
pub mod request_id;

pub use cors::{cors_middleware, preflight, webhook_preflight};
pub use request_id::request_id_middleware;
