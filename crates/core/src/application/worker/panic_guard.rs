// Panic isolation helpers for the processing loop

use tokio::task::JoinError;
use tracing::error;

/// Describe why a spawned processor task did not return.
///
/// Panics become a failure description instead of unwinding into the loop.
pub fn describe_join_error(err: JoinError) -> String {
    if err.is_cancelled() {
        return "processor task was cancelled".to_string();
    }

    let panic_info = err.into_panic();
    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };

    error!(panic_msg = %panic_msg, "Processor task panicked");
    format!("processor panicked: {}", panic_msg)
}
