//! Middleware shared by every mounted route.

use actix_web::middleware::Logger;

/// Returns the standard access-log middleware:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}
