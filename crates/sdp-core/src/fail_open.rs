//! Fail-open utilities for per-agent work
//!
//! One agent failing must never abort a round. Operations wrapped here log
//! their error and yield `None`, so the caller simply drops that agent's
//! contribution and carries on.
//!
//! DO NOT use fail-open for:
//! - Rule application (a claimed rule that fails aborts the round)
//! - Round-level outcomes (no proposals, cancellation)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation whose failure should be absorbed
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use sdp_core::fail_open::fail_open;
/// use sdp_core::Result;
///
/// async fn ask_specialist() -> Result<String> {
///     Ok("TDD".to_string())
/// }
///
/// async fn example() {
///     let answer = fail_open("consult architect", || ask_specialist()).await;
///     // answer is None if ask_specialist() failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed, continuing without it: {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SdpError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("test_op", || async { Ok::<_, SdpError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("test_op", || async {
            Err::<i32, _>(SdpError::AgentConsult {
                agent: "agent-1".to_string(),
                reason: "model unavailable".to_string(),
            })
        })
        .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_fail_open_keeps_inner_option() {
        let result = fail_open("test_op", || async { Ok::<Option<i32>, SdpError>(None) }).await;
        assert_eq!(result, Some(None));
    }
}
