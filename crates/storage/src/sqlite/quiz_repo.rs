use quiz_core::model::{QuestionId, Quiz, QuizId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{answer_id_from_i64, id_i64, parse_kind, question_id_from_i64, quiz_id_from_i64,
        ser, u32_from_i64, u64_from_i64},
};
use crate::repository::{
    AnswerRow, NewQuizRecord, QuestionRow, QuizRepository, StorageError,
};

fn map_quiz_row(row: &sqlx::sqlite::SqliteRow) -> Result<Quiz, StorageError> {
    let id = quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let question_count = u32_from_i64(
        "question_count",
        row.try_get::<i64, _>("question_count").map_err(ser)?,
    )?;
    let created_at = row.try_get("created_at").map_err(ser)?;
    Quiz::from_persisted(id, title, question_count, created_at).map_err(ser)
}

fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionRow, StorageError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    let correct_answer_id = row
        .try_get::<Option<i64>, _>("correct_answer_id")
        .map_err(ser)?
        .ok_or_else(|| StorageError::Serialization("missing correct_answer_id".into()))?;

    Ok(QuestionRow {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        kind: parse_kind(&kind_str)?,
        position: u32_from_i64("position", row.try_get::<i64, _>("position").map_err(ser)?)?,
        correct_answer_id: answer_id_from_i64(correct_answer_id)?,
    })
}

fn map_answer_row(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerRow, StorageError> {
    Ok(AnswerRow {
        id: answer_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        text: row.try_get("text").map_err(ser)?,
        label: row.try_get("label").map_err(ser)?,
        position: u32_from_i64("position", row.try_get::<i64, _>("position").map_err(ser)?)?,
        guess_count: u64_from_i64(
            "guess_count",
            row.try_get::<i64, _>("guess_count").map_err(ser)?,
        )?,
    })
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let quiz_res = sqlx::query("INSERT INTO quizzes (title, created_at) VALUES (?1, ?2)")
            .bind(&quiz.title)
            .bind(quiz.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let quiz_rowid = quiz_res.last_insert_rowid();

        for (position, question) in quiz.questions.iter().enumerate() {
            let question_res = sqlx::query(
                r"
                    INSERT INTO questions (quiz_id, text, kind, position, correct_answer_id)
                    VALUES (?1, ?2, ?3, ?4, NULL)
                ",
            )
            .bind(quiz_rowid)
            .bind(&question.text)
            .bind(question.kind.as_str())
            .bind(i64::try_from(position).map_err(ser)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
            let question_rowid = question_res.last_insert_rowid();

            let mut correct_rowid: Option<i64> = None;
            for (answer_position, text) in question.answers.iter().enumerate() {
                let label = question.kind.labels().get(answer_position).ok_or_else(|| {
                    StorageError::Serialization(format!(
                        "answer position {answer_position} has no label for {}",
                        question.kind
                    ))
                })?;
                let answer_res = sqlx::query(
                    r"
                        INSERT INTO answers (question_id, text, label, position, guess_count)
                        VALUES (?1, ?2, ?3, ?4, 0)
                    ",
                )
                .bind(question_rowid)
                .bind(text)
                .bind(*label)
                .bind(i64::try_from(answer_position).map_err(ser)?)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;

                if answer_position == question.correct_index {
                    correct_rowid = Some(answer_res.last_insert_rowid());
                }
            }

            let correct_rowid = correct_rowid.ok_or_else(|| {
                StorageError::Serialization(format!(
                    "correct index {} out of range",
                    question.correct_index
                ))
            })?;
            sqlx::query("UPDATE questions SET correct_answer_id = ?1 WHERE id = ?2")
                .bind(correct_rowid)
                .bind(question_rowid)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        quiz_id_from_i64(quiz_rowid)
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    q.id AS id,
                    q.title AS title,
                    q.created_at AS created_at,
                    COUNT(questions.id) AS question_count
                FROM quizzes q
                LEFT JOIN questions ON questions.quiz_id = q.id
                GROUP BY q.id
                ORDER BY q.created_at DESC, q.id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_quiz_row(&row)?);
        }
        Ok(out)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    q.id AS id,
                    q.title AS title,
                    q.created_at AS created_at,
                    COUNT(questions.id) AS question_count
                FROM quizzes q
                LEFT JOIN questions ON questions.quiz_id = q.id
                WHERE q.id = ?1
                GROUP BY q.id
            ",
        )
        .bind(id_i64("quiz_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id_i64("quiz_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_questions(&self, quiz_id: QuizId) -> Result<Vec<QuestionRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, quiz_id, text, kind, position, correct_answer_id
                FROM questions
                WHERE quiz_id = ?1
                ORDER BY position ASC, id ASC
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn get_answers(&self, question_id: QuestionId) -> Result<Vec<AnswerRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, question_id, text, label, position, guess_count
                FROM answers
                WHERE question_id = ?1
                ORDER BY position ASC, id ASC
            ",
        )
        .bind(id_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_answer_row(&row)?);
        }
        Ok(out)
    }
}
