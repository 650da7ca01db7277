//! JSON envelope handling
//!
//! The dashboard API wraps every payload in a single-key object named after
//! the entity: `{ "users": [...] }` for lists, `{ "user": {...} }` for a
//! single record. Failures are signalled by the status code alone; the body
//! then carries either `{ "error": "..." }` or plain text.

use serde_json::{Map, Value as Json};
use std::io::Write;

use crate::core::entities::EntityKind;
use crate::types::{Collection, DashboardError, Record, Value};

fn record_from_object(object: Map<String, Json>) -> Record {
    object
        .into_iter()
        .map(|(field, value)| (field, Value::from(value)))
        .collect()
}

fn into_object(json: Json, key: &str) -> Result<Map<String, Json>, DashboardError> {
    match json {
        Json::Object(object) => Ok(object),
        other => Err(DashboardError::ParseError {
            line: None,
            message: format!("expected an object under '{}', found {}", key, other),
        }),
    }
}

/// Parse a `{ "<entities>": [ ... ] }` list envelope
///
/// # Errors
///
/// * `ParseError` if the body is not JSON or an element is not an object
/// * `InvalidEnvelope` if the envelope key is missing or not an array
pub fn parse_list_envelope(kind: EntityKind, body: &str) -> Result<Collection, DashboardError> {
    let key = kind.envelope_key();
    let mut envelope: Map<String, Json> = serde_json::from_str(body)?;

    let Some(Json::Array(items)) = envelope.remove(key) else {
        return Err(DashboardError::InvalidEnvelope {
            expected: key.to_string(),
        });
    };

    let records = items
        .into_iter()
        .map(|item| into_object(item, key).map(record_from_object))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Collection::from_records(records))
}

/// Parse a `{ "<entity>": { ... } }` single-record envelope
pub fn parse_single_envelope(kind: EntityKind, body: &str) -> Result<Record, DashboardError> {
    let key = kind.singular_key();
    let mut envelope: Map<String, Json> = serde_json::from_str(body)?;

    let item = envelope
        .remove(key)
        .ok_or_else(|| DashboardError::InvalidEnvelope {
            expected: key.to_string(),
        })?;

    into_object(item, key).map(record_from_object)
}

/// Build the error for a non-2xx response
///
/// Uses the body's `error` field when it has one, the trimmed body text
/// otherwise, and a generic message for an empty body.
pub fn parse_error_body(status: u16, body: &str) -> DashboardError {
    let from_json = serde_json::from_str::<Json>(body).ok().and_then(|json| {
        json.get("error")
            .and_then(Json::as_str)
            .map(|message| message.to_string())
    });

    let message = from_json.unwrap_or_else(|| {
        let text = body.trim();
        if text.is_empty() {
            "Request failed".to_string()
        } else {
            text.to_string()
        }
    });

    DashboardError::Api { status, message }
}

/// Decode a list response; any non-2xx status is an error whatever the body
pub fn decode_list_response(
    kind: EntityKind,
    status: u16,
    body: &str,
) -> Result<Collection, DashboardError> {
    if (200..300).contains(&status) {
        parse_list_envelope(kind, body)
    } else {
        Err(parse_error_body(status, body))
    }
}

/// Write records as a pretty-printed list envelope
pub fn write_list_envelope(
    kind: EntityKind,
    records: &[Record],
    output: &mut dyn Write,
) -> Result<(), DashboardError> {
    let items: Vec<Json> = records
        .iter()
        .map(|record| {
            Json::Object(
                record
                    .fields()
                    .map(|(field, value)| (field.to_string(), Json::from(value)))
                    .collect(),
            )
        })
        .collect();

    let mut envelope = Map::new();
    envelope.insert(kind.envelope_key().to_string(), Json::Array(items));

    serde_json::to_writer_pretty(&mut *output, &Json::Object(envelope))?;
    writeln!(output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_list_envelope() {
        let body = r#"{"users": [
            {"id": 1, "name": "Ana", "capital": "€50.000", "active": true},
            {"id": 2, "name": "Bob", "capital": null}
        ]}"#;

        let collection = parse_list_envelope(EntityKind::Users, body).unwrap();
        assert_eq!(collection.len(), 2);

        let ana = &collection.records[0];
        assert_eq!(ana.get("id"), Some(&Value::Number(Decimal::ONE)));
        assert_eq!(ana.get("capital"), Some(&Value::from("€50.000")));
        assert_eq!(ana.get("active"), Some(&Value::Bool(true)));
        assert_eq!(collection.records[1].get("capital"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_empty_list() {
        let collection = parse_list_envelope(EntityKind::Kyc, r#"{"kyc": []}"#).unwrap();
        assert!(collection.is_empty());
    }

    #[rstest]
    #[case::wrong_key(r#"{"clients": []}"#)]
    #[case::not_an_array(r#"{"users": {"id": 1}}"#)]
    fn test_parse_list_envelope_shape_errors(#[case] body: &str) {
        assert_eq!(
            parse_list_envelope(EntityKind::Users, body),
            Err(DashboardError::InvalidEnvelope {
                expected: "users".to_string()
            })
        );
    }

    #[test]
    fn test_parse_list_envelope_rejects_non_object_items() {
        let result = parse_list_envelope(EntityKind::Users, r#"{"users": [1, 2]}"#);
        assert!(matches!(result, Err(DashboardError::ParseError { .. })));
    }

    #[test]
    fn test_parse_list_envelope_rejects_malformed_json() {
        let result = parse_list_envelope(EntityKind::Users, "{not json");
        assert!(matches!(result, Err(DashboardError::ParseError { .. })));
    }

    #[test]
    fn test_parse_single_envelope() {
        let record =
            parse_single_envelope(EntityKind::Contracts, r#"{"contract": {"id": 7, "signed": false}}"#)
                .unwrap();
        assert_eq!(record.id(), Some("7".to_string()));
        assert_eq!(record.get("signed"), Some(&Value::Bool(false)));
    }

    #[rstest]
    #[case::json_error(404, r#"{"error": "User not found"}"#, "User not found")]
    #[case::plain_text(502, "Bad Gateway\n", "Bad Gateway")]
    #[case::json_without_error(500, r#"{"detail": "boom"}"#, r#"{"detail": "boom"}"#)]
    #[case::empty(500, "", "Request failed")]
    fn test_parse_error_body(#[case] status: u16, #[case] body: &str, #[case] message: &str) {
        assert_eq!(
            parse_error_body(status, body),
            DashboardError::Api {
                status,
                message: message.to_string()
            }
        );
    }

    #[test]
    fn test_status_is_the_only_error_signal() {
        // A 500 with a well-formed envelope is still a failure
        let result = decode_list_response(EntityKind::Users, 500, r#"{"users": []}"#);
        assert!(matches!(result, Err(DashboardError::Api { status: 500, .. })));

        let ok = decode_list_response(EntityKind::Users, 200, r#"{"users": []}"#).unwrap();
        assert!(ok.is_empty());
    }

    #[test]
    fn test_write_list_envelope_reads_back() {
        let records = vec![Record::new()
            .with("id", 1)
            .with("name", "Ana")
            .with("rate", Decimal::new(900, 2))];
        let mut buffer: Vec<u8> = Vec::new();
        write_list_envelope(EntityKind::Products, &records, &mut buffer).unwrap();

        let body = String::from_utf8(buffer).unwrap();
        let collection = parse_list_envelope(EntityKind::Products, &body).unwrap();
        assert_eq!(collection.records[0].get("name"), Some(&Value::from("Ana")));
        assert_eq!(
            collection.records[0].get("rate"),
            Some(&Value::Number(Decimal::new(9, 0)))
        );
    }
}
