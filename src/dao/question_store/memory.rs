//! Question bank held in memory, seeded from a JSON file at startup.

use std::{fs, io::ErrorKind, path::Path, sync::Arc};

use futures::future::{self, BoxFuture};
use indexmap::IndexMap;
use rand::{rng, seq::SliceRandom};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    dao::{
        models::{QuestionEntity, QuizEntity, SessionSummaryEntity},
        question_store::{QuestionSource, SessionSink},
        storage::{StorageError, StorageResult},
    },
    state::game::{QuestionId, QuizId},
};

/// On-disk layout of the question bank file.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub questions: Vec<QuestionEntity>,
    #[serde(default)]
    pub quizzes: Vec<QuizEntity>,
}

/// Finished-session summaries kept in memory; older ones are dropped first.
pub const MAX_SAVED_SESSIONS: usize = 100;

/// Question bank and session history kept in process memory.
///
/// The session history is bounded by [`MAX_SAVED_SESSIONS`]; use a durable
/// store such as CouchDB when every finished game must be kept.
#[derive(Clone, Default)]
pub struct MemoryQuestionStore {
    questions: Arc<IndexMap<QuestionId, QuestionEntity>>,
    quizzes: Arc<IndexMap<QuizId, QuizEntity>>,
    sessions: Arc<RwLock<Vec<SessionSummaryEntity>>>,
}

impl MemoryQuestionStore {
    /// Build a store from an already parsed bank, rejecting dangling or duplicate identifiers.
    pub fn from_bank(bank: QuestionBank) -> StorageResult<Self> {
        let mut questions = IndexMap::with_capacity(bank.questions.len());
        for question in bank.questions {
            let id = question.id;
            if questions.insert(id, question).is_some() {
                return Err(StorageError::corrupted(format!("duplicate question id {id}")));
            }
        }

        let mut quizzes = IndexMap::with_capacity(bank.quizzes.len());
        for quiz in bank.quizzes {
            if let Some(missing) = quiz
                .question_ids
                .iter()
                .find(|id| !questions.contains_key(*id))
            {
                return Err(StorageError::corrupted(format!(
                    "quiz {} references unknown question {missing}",
                    quiz.id
                )));
            }
            let id = quiz.id;
            if quizzes.insert(id, quiz).is_some() {
                return Err(StorageError::corrupted(format!("duplicate quiz id {id}")));
            }
        }

        Ok(Self {
            questions: Arc::new(questions),
            quizzes: Arc::new(quizzes),
            sessions: Arc::default(),
        })
    }

    /// Load the bank from `path`; a missing file yields an empty bank.
    pub fn from_file(path: &Path) -> StorageResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "question bank not found; starting with an empty bank");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read question bank `{}`", path.display()),
                    err,
                ));
            }
        };

        let bank = serde_json::from_str::<QuestionBank>(&contents).map_err(|err| {
            StorageError::corrupted(format!(
                "failed to parse question bank `{}`: {err}",
                path.display()
            ))
        })?;
        let store = Self::from_bank(bank)?;
        info!(
            path = %path.display(),
            questions = store.questions.len(),
            quizzes = store.quizzes.len(),
            "loaded question bank"
        );
        Ok(store)
    }

    /// Summaries handed to this store through [`SessionSink`], oldest first.
    pub async fn saved_sessions(&self) -> Vec<SessionSummaryEntity> {
        self.sessions.read().await.clone()
    }
}

impl QuestionSource for MemoryQuestionStore {
    fn question_by_id(
        &self,
        id: QuestionId,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let found = self.questions.get(&id).cloned();
        Box::pin(future::ready(Ok(found)))
    }

    fn random_questions(&self, count: usize) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let mut picked: Vec<QuestionEntity> = self.questions.values().cloned().collect();
        picked.shuffle(&mut rng());
        picked.truncate(count);
        Box::pin(future::ready(Ok(picked)))
    }

    fn quiz_by_id(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let found = self.quizzes.get(&id).cloned();
        Box::pin(future::ready(Ok(found)))
    }

    fn quiz_questions(
        &self,
        id: QuizId,
    ) -> BoxFuture<'static, StorageResult<Option<Vec<QuestionEntity>>>> {
        let found = self.quizzes.get(&id).map(|quiz| {
            quiz.question_ids
                .iter()
                .filter_map(|question_id| self.questions.get(question_id).cloned())
                .collect()
        });
        Box::pin(future::ready(Ok(found)))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

impl SessionSink for MemoryQuestionStore {
    fn save_session(&self, summary: SessionSummaryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let sessions = self.sessions.clone();
        Box::pin(async move {
            info!(
                session_id = %summary.id,
                winner = summary.winner_name.as_deref().unwrap_or("-"),
                "recorded finished session"
            );
            let mut sessions = sessions.write().await;
            sessions.push(summary);
            if sessions.len() > MAX_SAVED_SESSIONS {
                let overflow = sessions.len() - MAX_SAVED_SESSIONS;
                sessions.drain(..overflow);
            }
            Ok(())
        })
    }
}
