//! Tracing/logging (shared setup).

/// Initialize process-wide logging with human-readable output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Pretty, "warn");
}

/// Initialize process-wide logging with JSON output.
pub fn init_json() {
    tracing::init(tracing::LogFormat::Json, "info");
}

/// Tracing configuration (filters, layers).
pub mod tracing;
