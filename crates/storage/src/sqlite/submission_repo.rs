use quiz_core::model::{AnswerId, QuizId, Submission, SubmissionId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{id_i64, quiz_id_from_i64, ser, submission_id_from_i64, u32_from_i64},
};
use crate::repository::{StorageError, SubmissionRepository, SubmissionRow};

fn map_submission_row(row: &sqlx::sqlite::SqliteRow) -> Result<SubmissionRow, StorageError> {
    let id = submission_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let submission = Submission::from_persisted(
        quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        row.try_get("user_id").map_err(ser)?,
        u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        row.try_get("submitted_at").map_err(ser)?,
    )
    .map_err(ser)?;
    Ok(SubmissionRow::new(id, submission))
}

#[async_trait::async_trait]
impl SubmissionRepository for SqliteRepository {
    async fn append_submission(
        &self,
        submission: &Submission,
    ) -> Result<SubmissionId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO submissions (
                    quiz_id, user_id, correct_count, total_questions, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_i64("quiz_id", submission.quiz_id().value())?)
        .bind(submission.user_id())
        .bind(i64::from(submission.correct_count()))
        .bind(i64::from(submission.total_questions()))
        .bind(submission.submitted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        submission_id_from_i64(res.last_insert_rowid())
    }

    async fn increment_guess(&self, answer_id: AnswerId) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE answers SET guess_count = guess_count + 1 WHERE id = ?1")
            .bind(id_i64("answer_id", answer_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_submissions(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<SubmissionRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, quiz_id, user_id, correct_count, total_questions, submitted_at
                FROM submissions
                WHERE quiz_id = ?1
                ORDER BY
                    CAST(correct_count AS REAL) / total_questions DESC,
                    submitted_at ASC,
                    id ASC
                LIMIT ?2
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_submission_row(&row)?);
        }
        Ok(out)
    }
}
