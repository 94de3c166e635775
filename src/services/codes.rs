//! Sequential human-readable codes (`B001`, `M014`, ...)

use crate::error::{AppError, AppResult};

const SUFFIX_WIDTH: usize = 3;

/// Next code after `last`, the highest code of the collection in
/// lexicographic order.
///
/// The numeric suffix is read from the second character on, incremented and
/// zero-padded to three digits. An empty collection starts at `001`.
pub fn next_code(prefix: char, last: Option<&str>) -> AppResult<String> {
    let Some(last) = last else {
        return Ok(format!("{}{:0width$}", prefix, 1, width = SUFFIX_WIDTH));
    };

    let mut chars = last.chars();
    if chars.next().is_none() {
        return Err(AppError::Internal(
            "Last record does not have a code".to_string(),
        ));
    }
    let suffix: u32 = chars.as_str().parse().map_err(|_| {
        AppError::Internal(format!("Record code {} has no numeric suffix", last))
    })?;

    let next = suffix
        .checked_add(1)
        .ok_or_else(|| AppError::Internal(format!("Record code {} cannot be incremented", last)))?;

    Ok(format!("{}{:0width$}", prefix, next, width = SUFFIX_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_code() {
        assert_eq!(next_code('B', None).unwrap(), "B001");
        assert_eq!(next_code('M', None).unwrap(), "M001");
    }

    #[test]
    fn test_increment_and_pad() {
        assert_eq!(next_code('B', Some("B001")).unwrap(), "B002");
        assert_eq!(next_code('B', Some("B009")).unwrap(), "B010");
        assert_eq!(next_code('M', Some("M099")).unwrap(), "M100");
    }

    #[test]
    fn test_grows_past_width() {
        assert_eq!(next_code('B', Some("B999")).unwrap(), "B1000");
    }

    #[test]
    fn test_invalid_last_code() {
        assert!(next_code('B', Some("")).is_err());
        assert!(next_code('B', Some("Bxyz")).is_err());
    }

    #[test]
    fn test_suffix_overflow_is_an_error() {
        let err = next_code('B', Some("B4294967295")).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(next_code('B', Some("B4294967294")).unwrap(), "B4294967295");
    }
}
