//! Health check endpoints.
//!
//! Used by load balancers and monitoring systems to verify service health.

use axum::{extract::State, http::StatusCode, Json};
use keystore_core::reducer::Reducer;
use keystore_runtime::{HealthCheck, HealthStatus, Store};
use serde::Serialize;
use std::sync::Arc;

/// Liveness response body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Liveness {
    /// Always `"ok"`
    pub status: &'static str,
}

/// Liveness check.
///
/// ```text
/// GET /health  →  200 {"status":"ok"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<Liveness>) {
    (StatusCode::OK, Json(Liveness { status: "ok" }))
}

/// Readiness check backed by [`Store::health`].
///
/// - 200 OK: Healthy or Degraded
/// - 503 Service Unavailable: Unhealthy (the store is shutting down)
pub async fn health_check_with_store<S, A, E, R>(
    State(store): State<Arc<Store<S, A, E, R>>>,
) -> (StatusCode, Json<HealthCheck>)
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    let health = store.health();

    let status = match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystore_core::{effect::Effect, SmallVec};
    use std::time::Duration;

    #[derive(Clone)]
    struct NoopReducer;

    impl Reducer for NoopReducer {
        type State = ();
        type Action = ();
        type Environment = ();

        fn reduce(&self, _state: &mut (), _action: (), _env: &()) -> SmallVec<[Effect<()>; 4]> {
            SmallVec::new()
        }
    }

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Liveness { status: "ok" });
    }

    #[tokio::test]
    async fn test_health_check_with_healthy_store() {
        let store = Arc::new(Store::new((), NoopReducer, ()));

        let (status, Json(health)) = health_check_with_store(State(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_health_check_during_shutdown() {
        let store = Arc::new(Store::new((), NoopReducer, ()));
        assert!(store.shutdown(Duration::from_millis(100)).await.is_ok());

        let (status, Json(health)) = health_check_with_store(State(store)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.status, HealthStatus::Unhealthy);
    }
}
