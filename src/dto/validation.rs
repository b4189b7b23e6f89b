//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::models::QuestionKind;

/// Characters room codes are drawn from: uppercase letters and digits with
/// the visually confusable `O`, `0`, `I`, `1` removed.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Validates that a room code is the right length and drawn from
/// [`ROOM_CODE_ALPHABET`].
///
/// # Examples
///
/// ```ignore
/// validate_room_code("ABC234") // Ok
/// validate_room_code("ABC0O4") // Err - confusable characters
/// validate_room_code("ABC23")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {ROOM_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.bytes().all(|c| ROOM_CODE_ALPHABET.contains(&c)) {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some(
            "Room code must contain only uppercase letters and digits, excluding O, 0, I and 1"
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates the shape of a question payload against its kind: choice kinds
/// need at least two options and an answer key drawn from them, text kinds
/// carry no options.
pub fn validate_question_payload(
    kind: QuestionKind,
    options: &[String],
    correct_answers: &[String],
) -> Result<(), ValidationError> {
    match kind {
        QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
            if options.len() < 2 {
                let mut err = ValidationError::new("too_few_options");
                err.message = Some("Choice questions need at least two options".into());
                return Err(err);
            }
            if options.iter().any(|option| option.trim().is_empty()) {
                let mut err = ValidationError::new("blank_option");
                err.message = Some("Options must not be blank".into());
                return Err(err);
            }
            if correct_answers.is_empty() {
                let mut err = ValidationError::new("missing_answer_key");
                err.message = Some("Choice questions need at least one correct answer".into());
                return Err(err);
            }
            if let Some(stray) = correct_answers
                .iter()
                .find(|answer| !options.contains(answer))
            {
                let mut err = ValidationError::new("answer_not_an_option");
                err.message =
                    Some(format!("Correct answer `{stray}` is not one of the options").into());
                return Err(err);
            }
        }
        QuestionKind::Text => {
            if !options.is_empty() {
                let mut err = ValidationError::new("options_on_text");
                err.message = Some("Text questions carry no options".into());
                return Err(err);
            }
            if correct_answers.is_empty() || correct_answers.iter().all(|a| a.trim().is_empty()) {
                let mut err = ValidationError::new("missing_answer_key");
                err.message = Some("Text questions need a non-blank correct answer".into());
                return Err(err);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("ABC234").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("234567").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("ABC23").is_err()); // too short
        assert!(validate_room_code("ABC2345").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("abc234").is_err()); // lowercase
        assert!(validate_room_code("ABC0O4").is_err()); // confusables
        assert!(validate_room_code("ABC 34").is_err()); // space
        assert!(validate_room_code("ABCI14").is_err()); // confusables
    }

    #[test]
    fn test_choice_question_shape() {
        assert!(
            validate_question_payload(
                QuestionKind::SingleChoice,
                &strings(&["A", "B"]),
                &strings(&["B"]),
            )
            .is_ok()
        );
        // one option only
        assert!(
            validate_question_payload(QuestionKind::SingleChoice, &strings(&["A"]), &strings(&["A"]))
                .is_err()
        );
        // no answer key
        assert!(
            validate_question_payload(QuestionKind::MultipleChoice, &strings(&["A", "B"]), &[])
                .is_err()
        );
        // answer key outside the options
        assert!(
            validate_question_payload(
                QuestionKind::MultipleChoice,
                &strings(&["A", "B"]),
                &strings(&["C"]),
            )
            .is_err()
        );
    }

    #[test]
    fn test_text_question_shape() {
        assert!(
            validate_question_payload(QuestionKind::Text, &[], &strings(&["Paris"])).is_ok()
        );
        assert!(
            validate_question_payload(QuestionKind::Text, &strings(&["A", "B"]), &strings(&["A"]))
                .is_err()
        );
        assert!(validate_question_payload(QuestionKind::Text, &[], &strings(&["  "])).is_err());
    }
}
