use serde::Deserialize;
use serde_json::Value;

use super::error::Error;
use crate::model::FieldMap;

/// Words the API uses when complaining about the credential pair.
const CREDENTIAL_WORDS: &[&str] = &["token", "tokenid", "serial", "inverter"];

/// Words indicating the complaint is an actual rejection.
const REJECTION_WORDS: &[&str] = &[
    "not match",
    "mismatch",
    "not belong",
    "not found",
    "invalid",
    "expired",
    "incorrect",
    "denied",
    "error",
];

const GENERIC_CONNECT_ERROR: &str = "could not connect to the SolaX Cloud API";

/// Wire shape of a `getRealtimeInfo.do` response.
#[derive(Debug, Deserialize)]
pub struct RealtimeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

/// Outcome of a single endpoint attempt.
#[derive(Debug)]
pub enum Outcome {
    Success(FieldMap),
    Auth(String),
    Transient(Error),
}

/// Classify a parsed response body.
///
/// A failed response whose `exception` message names the credential pair is an
/// auth rejection: retrying another endpoint cannot fix a wrong token/serial
/// combination. Any other failure is transient for this endpoint only.
pub fn classify(response: RealtimeResponse) -> Outcome {
    if !response.success {
        let message = response.exception.unwrap_or_default();
        if is_auth_rejection(&message) {
            return Outcome::Auth(message);
        }
        /* Collapse empty or missing server messages to a generic one instead
         * of surfacing meaningless text. */
        let message = if message.trim().is_empty() {
            GENERIC_CONNECT_ERROR.to_string()
        } else {
            message
        };
        return Outcome::Transient(Error::ApiError(message));
    }

    match response.result {
        Some(Value::Object(result)) => Outcome::Success(result),
        _ => Outcome::Transient(Error::InvalidResponse(
            "missing or non-object `result` field".to_string(),
        )),
    }
}

/// Best-effort heuristic: a credential-context word and a rejection word,
/// both case-insensitive substring matches. The exact wording varies across
/// API regions and firmware versions.
fn is_auth_rejection(message: &str) -> bool {
    let lowered = message.to_lowercase();
    CREDENTIAL_WORDS.iter().any(|word| lowered.contains(word))
        && REJECTION_WORDS.iter().any(|word| lowered.contains(word))
}

#[cfg(test)]
mod test {
    use super::{classify, is_auth_rejection, Outcome, RealtimeResponse};
    use crate::api::error::Error;
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    #[test]
    fn successful_response_yields_result_object() {
        let input = read_resource("getRealtimeInfo_success.json");
        let response: RealtimeResponse = serde_json::from_str(&input).unwrap();
        match classify(response) {
            Outcome::Success(result) => {
                assert_eq!(result["acpower"].as_f64(), Some(1409.0));
                assert_eq!(result["inverterStatus"].as_str(), Some("102"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn serial_mismatch_is_classified_as_auth() {
        let input = read_resource("getRealtimeInfo_auth.json");
        let response: RealtimeResponse = serde_json::from_str(&input).unwrap();
        match classify(response) {
            Outcome::Auth(message) => {
                assert_eq!(message, "Token does not belong to inverter serial")
            }
            other => panic!("expected auth, got {:?}", other),
        }
    }

    #[test]
    fn rate_limit_is_classified_as_transient() {
        let input = read_resource("getRealtimeInfo_rate_limited.json");
        let response: RealtimeResponse = serde_json::from_str(&input).unwrap();
        match classify(response) {
            Outcome::Transient(Error::ApiError(message)) => assert_eq!(message, "Rate limited"),
            other => panic!("expected transient, got {:?}", other),
        }
    }

    #[test]
    fn missing_result_is_classified_as_invalid_response() {
        let input = read_resource("getRealtimeInfo_missing_result.json");
        let response: RealtimeResponse = serde_json::from_str(&input).unwrap();
        match classify(response) {
            Outcome::Transient(Error::InvalidResponse(_)) => {}
            other => panic!("expected invalid response, got {:?}", other),
        }
    }

    #[test]
    fn non_object_result_is_classified_as_invalid_response() {
        let response: RealtimeResponse =
            serde_json::from_str(r#"{"success": true, "result": [1, 2]}"#).unwrap();
        match classify(response) {
            Outcome::Transient(Error::InvalidResponse(_)) => {}
            other => panic!("expected invalid response, got {:?}", other),
        }
    }

    #[test]
    fn failure_without_message_collapses_to_generic_error() {
        let response: RealtimeResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        match classify(response) {
            Outcome::Transient(Error::ApiError(message)) => {
                assert_eq!(message, "could not connect to the SolaX Cloud API")
            }
            other => panic!("expected transient, got {:?}", other),
        }
    }

    #[test]
    fn auth_heuristic_needs_both_word_classes() {
        assert!(is_auth_rejection("Token does not belong to inverter serial"));
        assert!(is_auth_rejection("The serial number does not belong to this token"));
        assert!(is_auth_rejection("TokenId is invalid"));
        assert!(is_auth_rejection("SERIAL NOT FOUND"));
        assert!(!is_auth_rejection("Rate limited"));
        assert!(!is_auth_rejection("Query success"));
        assert!(!is_auth_rejection("token"));
        assert!(!is_auth_rejection(""));
    }
}
