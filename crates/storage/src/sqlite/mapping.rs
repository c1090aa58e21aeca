use quiz_core::model::{AnswerId, QuestionId, QuestionKind, QuizId, SubmissionId};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn answer_id_from_i64(v: i64) -> Result<AnswerId, StorageError> {
    Ok(AnswerId::new(i64_to_u64("answer_id", v)?))
}

pub(crate) fn submission_id_from_i64(v: i64) -> Result<SubmissionId, StorageError> {
    Ok(SubmissionId::new(i64_to_u64("submission_id", v)?))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_kind(s: &str) -> Result<QuestionKind, StorageError> {
    s.parse::<QuestionKind>().map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(quiz_id_from_i64(-1).is_err());
        assert!(answer_id_from_i64(i64::MIN).is_err());
        assert_eq!(question_id_from_i64(7).unwrap(), QuestionId::new(7));
    }

    #[test]
    fn kind_parsing_maps_to_serialization_error() {
        assert!(matches!(
            parse_kind("essay"),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(
            parse_kind("true_false").unwrap(),
            QuestionKind::TrueFalse
        );
    }
}
