//! Input validation for caller-supplied search parameters.

use crate::error::EcourtsError;
use ecourts_api::types::SearchQuery;

pub const MAX_CASE_NUMBER_LENGTH: usize = 10;
pub const MIN_YEAR: u16 = 1900;
pub const MAX_YEAR: u16 = 2100;

/// Validates a full search query before a session is opened for it.
pub fn validate_query(query: &SearchQuery) -> Result<(), EcourtsError> {
    validate_code("case type", &query.case_type)?;
    validate_case_number(&query.case_number)?;
    validate_year(&query.year)?;
    Ok(())
}

/// Case numbers are plain registration serials, digits only.
pub fn validate_case_number(case_number: &str) -> Result<(), EcourtsError> {
    if case_number.is_empty() || case_number.len() > MAX_CASE_NUMBER_LENGTH {
        return Err(EcourtsError::InvalidInput(format!(
            "case number must be 1 to {MAX_CASE_NUMBER_LENGTH} digits"
        )));
    }
    if !case_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EcourtsError::InvalidInput(
            "case number must contain digits only".to_string(),
        ));
    }
    Ok(())
}

/// Registration year, four digits within a sane range.
pub fn validate_year(year: &str) -> Result<(), EcourtsError> {
    let parsed: u16 = year
        .parse()
        .map_err(|_| EcourtsError::InvalidInput(format!("invalid year {year:?}")))?;
    if year.len() != 4 || !(MIN_YEAR..=MAX_YEAR).contains(&parsed) {
        return Err(EcourtsError::InvalidInput(format!(
            "year must be four digits between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }
    Ok(())
}

/// Portal codes (case types, states, districts, complexes) are short
/// alphanumeric tokens, with `@` allowed for complex triples.
pub fn validate_code(what: &str, code: &str) -> Result<(), EcourtsError> {
    if code.is_empty() || code.len() > 20 {
        return Err(EcourtsError::InvalidInput(format!(
            "{what} must be 1 to 20 characters"
        )));
    }
    if !code
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'@' || b == b'.')
    {
        return Err(EcourtsError::InvalidInput(format!(
            "{what} contains unexpected characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_queries() {
        let query = SearchQuery::new("134", "16516", "2022");
        assert!(validate_query(&query).is_ok());
        let query = SearchQuery::new("52", "100591", "2016");
        assert!(validate_query(&query).is_ok());
    }

    #[test]
    fn rejects_bad_case_numbers() {
        assert!(validate_case_number("").is_err());
        assert!(validate_case_number("16516/2022").is_err());
        assert!(validate_case_number("12345678901").is_err());
        assert!(validate_case_number("16516").is_ok());
    }

    #[test]
    fn rejects_bad_years() {
        assert!(validate_year("22").is_err());
        assert!(validate_year("20222").is_err());
        assert!(validate_year("year").is_err());
        assert!(validate_year("1850").is_err());
        assert!(validate_year("2022").is_ok());
    }

    #[test]
    fn codes_allow_complex_triples() {
        assert!(validate_code("complex", "1010@3@N").is_ok());
        assert!(validate_code("case type", "134").is_ok());
        assert!(validate_code("case type", "134; DROP TABLE").is_err());
        assert!(validate_code("case type", "").is_err());
    }
}
