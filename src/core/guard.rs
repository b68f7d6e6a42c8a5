//! # Panic isolation for user operations.
//!
//! Start and shutdown operations run on their own tokio tasks. [`guarded`]
//! catches a panic inside the operation so the task always completes with a
//! value, and the group can attribute the panic to the process that caused it.

use std::any::Any;
use std::future::Future;

use futures::FutureExt;

use crate::error::BoxError;

/// How one operation ended.
pub(crate) enum Outcome {
    Ok,
    Failed(BoxError),
    Panicked(String),
}

/// Awaits `fut`, converting a panic into [`Outcome::Panicked`].
pub(crate) async fn guarded<F>(fut: F) -> Outcome
where
    F: Future<Output = Result<(), BoxError>>,
{
    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Outcome::Ok,
        Ok(Err(err)) => Outcome::Failed(err),
        Err(payload) => Outcome::Panicked(panic_message(payload.as_ref())),
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outcomes() {
        assert!(matches!(guarded(async { Ok(()) }).await, Outcome::Ok));
        assert!(matches!(
            guarded(async { Err("nope".into()) }).await,
            Outcome::Failed(_)
        ));
        let boom = async {
            let code = 42;
            if code > 0 {
                panic!("lost {code}");
            }
            Ok(())
        };
        match guarded(boom).await {
            Outcome::Panicked(msg) => assert_eq!(msg, "lost 42"),
            _ => panic!("expected panic outcome"),
        }
    }
}
