//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. CORS: answers preflights, decorates every response
//! 2. Request log: request id, status, latency

pub mod request_log;
