//! Liveness check.

/// Always 200 while the process is serving.
pub async fn health() -> &'static str {
    "Server is running"
}
