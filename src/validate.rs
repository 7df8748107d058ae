//! Structural message checks.
//!
//! These only look at shape. Whether a frame is *allowed* to send a message is
//! decided later by the hub (token) and the chrome (routing policy).

use crate::message::Envelope;
use serde_json::Value;

/// Shape predicates applied by the hub before it trusts a message.
pub trait Validator {
    /// Generic envelope check, applied to every inbound message.
    fn is_valid_envelope(&self, message: &Value) -> bool;

    /// Extra check for `PUBLISH` messages, applied after enrichment.
    fn is_valid_publish(&self, message: &Envelope) -> bool;
}

/// Default validator.
///
/// An envelope is a JSON object with a non-empty string `type`; `token`,
/// `target` and `source` must be strings and `viaHub` a boolean when present.
/// A publish additionally needs a non-empty string `target`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeValidator;

impl Validator for ShapeValidator {
    fn is_valid_envelope(&self, message: &Value) -> bool {
        let Some(map) = message.as_object() else {
            return false;
        };
        let has_type = matches!(map.get("type"), Some(Value::String(t)) if !t.is_empty());
        let strings_ok = ["token", "target", "source"]
            .iter()
            .all(|key| matches!(map.get(*key), None | Some(Value::String(_))));
        let via_hub_ok = matches!(map.get("viaHub"), None | Some(Value::Bool(_)));
        has_type && strings_ok && via_hub_ok
    }

    fn is_valid_publish(&self, message: &Envelope) -> bool {
        matches!(message.target(), Some(target) if !target.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_needs_string_type() {
        let v = ShapeValidator;
        assert!(v.is_valid_envelope(&json!({ "type": "CONNECT" })));
        assert!(!v.is_valid_envelope(&json!({ "type": "" })));
        assert!(!v.is_valid_envelope(&json!({ "type": 7 })));
        assert!(!v.is_valid_envelope(&json!({ "target": "A2" })));
        assert!(!v.is_valid_envelope(&json!("CONNECT")));
    }

    #[test]
    fn envelope_fields_must_have_the_right_json_type() {
        let v = ShapeValidator;
        assert!(!v.is_valid_envelope(&json!({ "type": "PUBLISH", "token": 1 })));
        assert!(!v.is_valid_envelope(&json!({ "type": "PUBLISH", "viaHub": "yes" })));
        assert!(v.is_valid_envelope(&json!({ "type": "PUBLISH", "payload": [1, 2] })));
    }

    #[test]
    fn publish_needs_target() {
        let v = ShapeValidator;
        let ok = Envelope::from_value(json!({ "type": "PUBLISH", "target": "A2" })).unwrap();
        let missing = Envelope::from_value(json!({ "type": "PUBLISH" })).unwrap();
        let empty = Envelope::from_value(json!({ "type": "PUBLISH", "target": "" })).unwrap();
        assert!(v.is_valid_publish(&ok));
        assert!(!v.is_valid_publish(&missing));
        assert!(!v.is_valid_publish(&empty));
    }
}
