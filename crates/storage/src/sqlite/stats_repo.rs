use quiz_core::model::{QuestionId, QuizId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{answer_id_from_i64, id_i64, question_id_from_i64, ser, u32_from_i64, u64_from_i64},
};
use crate::repository::{
    AnswerStatisticsRow, QuestionStatisticsRow, QuizStatisticsRow, StatisticsRepository,
    StorageError,
};

#[async_trait::async_trait]
impl StatisticsRepository for SqliteRepository {
    async fn quiz_statistics(&self, quiz_id: QuizId) -> Result<QuizStatisticsRow, StorageError> {
        let quiz_param = id_i64("quiz_id", quiz_id.value())?;

        let exists = sqlx::query("SELECT 1 FROM quizzes WHERE id = ?1")
            .bind(quiz_param)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let aggregates = sqlx::query(
            r"
                SELECT
                    COUNT(*) AS submission_count,
                    AVG(100.0 * correct_count / total_questions) AS average_percentage,
                    MAX(100.0 * correct_count / total_questions) AS highest_percentage,
                    MIN(100.0 * correct_count / total_questions) AS lowest_percentage
                FROM submissions
                WHERE quiz_id = ?1
            ",
        )
        .bind(quiz_param)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let question_count_row = sqlx::query("SELECT COUNT(*) AS n FROM questions WHERE quiz_id = ?1")
            .bind(quiz_param)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(QuizStatisticsRow {
            submission_count: u64_from_i64(
                "submission_count",
                aggregates
                    .try_get::<i64, _>("submission_count")
                    .map_err(ser)?,
            )?,
            average_percentage: aggregates.try_get("average_percentage").map_err(ser)?,
            highest_percentage: aggregates.try_get("highest_percentage").map_err(ser)?,
            lowest_percentage: aggregates.try_get("lowest_percentage").map_err(ser)?,
            question_count: u32_from_i64(
                "question_count",
                question_count_row.try_get::<i64, _>("n").map_err(ser)?,
            )?,
        })
    }

    async fn question_statistics(
        &self,
        quiz_id: QuizId,
    ) -> Result<Vec<QuestionStatisticsRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    q.id AS question_id,
                    q.text AS text,
                    q.correct_answer_id AS correct_answer_id,
                    COALESCE(SUM(a.guess_count), 0) AS total_guesses,
                    COALESCE(
                        MAX(CASE WHEN a.id = q.correct_answer_id THEN a.guess_count END),
                        0
                    ) AS correct_guesses
                FROM questions q
                LEFT JOIN answers a ON a.question_id = q.id
                WHERE q.quiz_id = ?1
                GROUP BY q.id
                ORDER BY q.position ASC, q.id ASC
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let correct_answer_id = row
                .try_get::<Option<i64>, _>("correct_answer_id")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing correct_answer_id".into()))?;
            out.push(QuestionStatisticsRow {
                question_id: question_id_from_i64(
                    row.try_get::<i64, _>("question_id").map_err(ser)?,
                )?,
                text: row.try_get("text").map_err(ser)?,
                total_guesses: u64_from_i64(
                    "total_guesses",
                    row.try_get::<i64, _>("total_guesses").map_err(ser)?,
                )?,
                correct_guesses: u64_from_i64(
                    "correct_guesses",
                    row.try_get::<i64, _>("correct_guesses").map_err(ser)?,
                )?,
                correct_answer_id: answer_id_from_i64(correct_answer_id)?,
            });
        }
        Ok(out)
    }

    async fn answer_statistics(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerStatisticsRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    a.id AS answer_id,
                    a.text AS text,
                    a.label AS label,
                    a.guess_count AS guess_count,
                    COALESCE(a.id = q.correct_answer_id, 0) AS is_correct
                FROM answers a
                JOIN questions q ON q.id = a.question_id
                WHERE a.question_id = ?1
                ORDER BY a.position ASC, a.id ASC
            ",
        )
        .bind(id_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(AnswerStatisticsRow {
                answer_id: answer_id_from_i64(row.try_get::<i64, _>("answer_id").map_err(ser)?)?,
                text: row.try_get("text").map_err(ser)?,
                label: row.try_get("label").map_err(ser)?,
                guesses: u64_from_i64(
                    "guess_count",
                    row.try_get::<i64, _>("guess_count").map_err(ser)?,
                )?,
                is_correct: row.try_get::<i64, _>("is_correct").map_err(ser)? != 0,
            });
        }
        Ok(out)
    }
}
