//! # Guarded execution of one hook or listener call.
//!
//! Every module hook and every listener callback goes through [`guarded`]:
//!
//! ```text
//! guarded(fut, timeout)
//!   ├─ timeout = Some(d) ─► tokio::time::timeout(d, catch_unwind(fut))
//!   │                         └─ elapsed ─► Err(HookError::Timeout)
//!   └─ timeout = None    ─► catch_unwind(fut)
//!
//! catch_unwind(fut)
//!   ├─ Ok(Ok(()))   ─► Ok(())
//!   ├─ Ok(Err(e))   ─► Err(e)
//!   └─ Err(panic)   ─► Err(HookError::Panicked { info })
//! ```
//!
//! ## Rules
//! - A panic never crosses this boundary; it becomes a [`HookError::Panicked`].
//! - On timeout the inner future is dropped (the hook is abandoned, not killed).
//! - `AssertUnwindSafe` is used: a hook that panics while holding a lock may
//!   leave its own state inconsistent.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::error::HookError;

/// Runs `fut` with panic isolation and an optional deadline.
pub(crate) async fn guarded<F>(fut: F, timeout: Option<Duration>) -> Result<(), HookError>
where
    F: Future<Output = Result<(), HookError>>,
{
    let caught = AssertUnwindSafe(fut).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, caught).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => return Err(HookError::Timeout { timeout: limit }),
        },
        None => caught.await,
    };

    match outcome {
        Ok(res) => res,
        Err(payload) => Err(HookError::Panicked {
            info: panic_message(payload.as_ref()),
        }),
    }
}

/// Renders a panic payload (`&str` or `String`) as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ok_and_err_pass_through() {
        assert!(guarded(async { Ok(()) }, None).await.is_ok());
        let err = guarded(async { Err(HookError::fail("nope")) }, None)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "hook_failed");
    }

    #[tokio::test]
    async fn test_panic_becomes_hook_error() {
        let err = guarded(
            async {
                panic!("listener exploded");
                #[allow(unreachable_code)]
                Ok(())
            },
            None,
        )
        .await
        .unwrap_err();
        match err {
            HookError::Panicked { info } => assert_eq!(info, "listener exploded"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abandons_hook() {
        let limit = Duration::from_millis(50);
        let err = guarded(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            Some(limit),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HookError::Timeout { timeout } if timeout == limit));
    }

    #[tokio::test]
    async fn test_panic_in_synchronous_body_is_caught() {
        let sync_hook = || -> Result<(), HookError> { panic!("{}", String::from("owned")) };
        let err = guarded(async move { sync_hook() }, None).await.unwrap_err();
        assert!(matches!(err, HookError::Panicked { info } if info == "owned"));
    }
}
