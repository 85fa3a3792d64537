use tracing::warn;

use crate::{dto::health::HealthResponse, services::game_service, state::SharedState};

/// Probe the question source and report live counters.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let source_healthy = match state.questions().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "question source health check failed");
            false
        }
    };

    HealthResponse::new(
        source_healthy,
        game_service::is_active(state).await,
        state.connections().len(),
        state.spectators().subscriber_count(),
    )
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use futures::future::{self, BoxFuture};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{QuestionEntity, QuizEntity},
            question_store::{QuestionSource, memory::MemoryQuestionStore},
            storage::{StorageError, StorageResult},
        },
        state::{
            AppState,
            game::{QuestionId, QuizId},
        },
    };

    /// Source whose backend is unreachable.
    struct UnreachableSource;

    fn offline<T: Send + 'static>() -> BoxFuture<'static, StorageResult<T>> {
        Box::pin(future::ready(Err(StorageError::unavailable(
            "question source offline".into(),
            io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        ))))
    }

    impl QuestionSource for UnreachableSource {
        fn question_by_id(
            &self,
            _id: QuestionId,
        ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
            offline()
        }

        fn random_questions(
            &self,
            _count: usize,
        ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
            offline()
        }

        fn quiz_by_id(&self, _id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
            offline()
        }

        fn quiz_questions(
            &self,
            _id: QuizId,
        ) -> BoxFuture<'static, StorageResult<Option<Vec<QuestionEntity>>>> {
            offline()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            offline()
        }
    }

    #[tokio::test]
    async fn reachable_source_reports_ok() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(MemoryQuestionStore::default()),
            None,
        );
        let _spectator = state.spectators().subscribe();

        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert!(!health.game_active);
        assert_eq!(health.connections, 0);
        assert_eq!(health.spectators, 1);
    }

    #[tokio::test]
    async fn failing_source_reports_degraded() {
        let state = AppState::new(AppConfig::default(), Arc::new(UnreachableSource), None);

        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.spectators, 0);
    }
}
