use crate::models::{BookingError, OverallResult};

/// Collapse per-template outcomes into one aggregate according to the
/// service's flag logic. The logic is stored as free text; any rule other
/// than the two known ones reads as indeterminate.
pub fn evaluate(results: &[String], flag_logic: &str) -> Result<OverallResult, BookingError> {
    if results.is_empty() {
        return Err(BookingError::ValidationError(
            "No test results found for this booking".to_string(),
        ));
    }

    let positive = results
        .iter()
        .filter(|r| r.eq_ignore_ascii_case("POSITIVE"))
        .count();

    let outcome = match flag_logic {
        "ALL_POSITIVE" => {
            if positive == results.len() {
                OverallResult::Positive
            } else {
                OverallResult::Negative
            }
        }
        "ANY_POSITIVE" => {
            if positive > 0 {
                OverallResult::Positive
            } else {
                OverallResult::Negative
            }
        }
        _ => OverallResult::Indeterminate,
    };

    Ok(outcome)
}
