use uuid::Uuid;

/// Generate a new payload request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Log with request ID context
#[macro_export]
macro_rules! log_with_request_id {
    ($level:ident, $request_id:expr, $($arg:tt)+) => {
        log::$level!("[{}] {}", $request_id, format!($($arg)+));
    };
}
