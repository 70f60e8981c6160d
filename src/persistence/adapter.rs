//! Persistence adapter trait
//!
//! A sink the engine calls exactly once, after every document of the call
//! reached the target version. It never sees a partial result.

use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};

use super::errors::{PersistenceError, PersistenceResult};
use crate::migration::Payload;
use crate::BoxError;

/// Writes a fully migrated result somewhere
pub trait PersistenceAdapter: Send + Sync {
    /// Persist the migrated payload, shaped like the caller's input
    fn persist<'a>(&'a self, migrated: &'a Payload) -> BoxFuture<'a, PersistenceResult<()>>;
}

/// Adapter built from an async closure
///
/// The closure receives its own copy of the migrated payload.
pub struct FnAdapter<F> {
    f: F,
}

/// Wrap an async closure as a persistence adapter
pub fn adapter_fn<F, Fut>(f: F) -> FnAdapter<F>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    FnAdapter { f }
}

impl<F, Fut> PersistenceAdapter for FnAdapter<F>
where
    F: Fn(Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn persist<'a>(&'a self, migrated: &'a Payload) -> BoxFuture<'a, PersistenceResult<()>> {
        (self.f)(migrated.clone())
            .map(|result| result.map_err(PersistenceError::Adapter))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_adapter_fn_receives_payload() {
        let seen = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen);
        let adapter = adapter_fn(move |payload| {
            *recorder.lock().unwrap() = Some(payload);
            async { Ok::<_, BoxError>(()) }
        });

        let payload = Payload::Single(json!({"_v": 1}));
        adapter.persist(&payload).await.unwrap();

        assert_eq!(seen.lock().unwrap().clone(), Some(payload));
    }

    #[tokio::test]
    async fn test_adapter_fn_error_is_wrapped() {
        let adapter = adapter_fn(|_| async { Err::<(), BoxError>("write refused".into()) });

        let err = adapter.persist(&Payload::Many(vec![])).await.unwrap_err();
        assert_eq!(err.code(), "ADAPTER_ERROR");
        assert!(err.to_string().contains("write refused"));
    }
}
