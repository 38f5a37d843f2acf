//! Path and body validation helpers shared by handlers.

use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// Parse an extraction identifier taken from the request path.
///
/// ```rust,ignore
/// let id = parse_extraction_id("8d6f7b1e-2f4c-4a53-9b8e-0c1d2e3f4a5b")?;
/// ```
pub(crate) fn parse_extraction_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        Error::invalid_request("extraction id must be a valid UUID").with_details(json!({
            "field": "id",
            "value": raw,
            "code": "invalid_uuid",
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn accepts_hyphenated_uuids() {
        let id = parse_extraction_id(" 00000000-0000-0000-0000-000000000001 ").expect("uuid");
        assert_eq!(id, Uuid::from_u128(1));
    }

    #[rstest]
    #[case("")]
    #[case("42")]
    #[case("not-a-uuid")]
    fn rejects_other_identifiers(#[case] raw: &str) {
        let err = parse_extraction_id(raw).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.details().and_then(|d| d.get("code")), Some(&json!("invalid_uuid")));
    }
}
