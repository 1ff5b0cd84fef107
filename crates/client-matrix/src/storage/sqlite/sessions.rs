use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::assessment::{AssessmentSession, ChatUserId, SessionStore};
use crate::repository::RepositoryError;

use super::{to_millis, SqliteStore};

impl SessionStore for SqliteStore {
    fn load_session(
        &self,
        chat_user: ChatUserId,
        now: DateTime<Utc>,
    ) -> Result<Option<AssessmentSession>, RepositoryError> {
        self.with_conn(|conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM assessment_sessions \
                     WHERE chat_user_id = ?1 AND expires_at_ms > ?2",
                    params![chat_user.0, to_millis(now)],
                    |row| row.get(0),
                )
                .optional()?;
            payload
                .map(|payload| {
                    serde_json::from_str(&payload)
                        .map_err(|err| RepositoryError::Corrupt(err.to_string()))
                })
                .transpose()
        })
    }

    fn save_session(
        &self,
        chat_user: ChatUserId,
        session: &AssessmentSession,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let payload =
            serde_json::to_string(session).map_err(|err| RepositoryError::Corrupt(err.to_string()))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO assessment_sessions (chat_user_id, payload, expires_at_ms) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT (chat_user_id) DO UPDATE SET \
                   payload = excluded.payload, \
                   expires_at_ms = excluded.expires_at_ms",
                params![chat_user.0, payload, to_millis(expires_at)],
            )?;
            Ok(())
        })
    }

    fn clear_session(&self, chat_user: ChatUserId) -> Result<(), RepositoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM assessment_sessions WHERE chat_user_id = ?1",
                params![chat_user.0],
            )?;
            Ok(())
        })
    }

    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM assessment_sessions WHERE expires_at_ms <= ?1",
                params![to_millis(now)],
            )?)
        })
    }
}
