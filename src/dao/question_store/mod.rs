#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use crate::dao::models::{QuestionEntity, QuizEntity, SessionSummaryEntity};
use crate::dao::storage::StorageResult;
use crate::state::game::{QuestionId, QuizId};
use futures::future::BoxFuture;

/// Read-only access to the question bank owned by an external collaborator.
pub trait QuestionSource: Send + Sync {
    fn question_by_id(
        &self,
        id: QuestionId,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn random_questions(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn quiz_by_id(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Questions of a quiz in play order; `None` when the quiz does not exist.
    fn quiz_questions(
        &self,
        id: QuizId,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<QuestionEntity>>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Optional destination for summaries of finished games.
pub trait SessionSink: Send + Sync {
    fn save_session(&self, summary: SessionSummaryEntity) -> BoxFuture<'static, StorageResult<()>>;
}
