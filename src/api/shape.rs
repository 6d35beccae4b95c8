//! Tolerant extraction of record lists from proxy responses
//!
//! The proxy has answered list endpoints in several shapes over time:
//!
//! ```text
//! {"success": true, "data": [...]}          success envelope
//! {"success": true, "data": {"chunk": [...]}}  envelope around a page
//! {"rooms": [...]} / {"joined_rooms": [...]}  keyed collection
//! [...]                                        bare list
//! ```
//!
//! Each shape is a [`ShapeMatcher`]; [`extract`] tries them in order and the
//! first match wins. Nothing here fails: an unrecognised body is an empty
//! list.

use serde_json::Value;

/// The kind of records a list endpoint returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Rooms,
    Messages,
    Members,
}

impl Collection {
    /// Keys the collection may be found under, in priority order
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Collection::Rooms => &["rooms", "joined_rooms"],
            Collection::Messages => &["chunk", "messages"],
            Collection::Members => &["members"],
        }
    }
}

/// Attempts one interpretation of a response body
pub type ShapeMatcher = fn(&Value, Collection) -> Option<Vec<Value>>;

/// Matchers in priority order
pub const MATCHERS: &[ShapeMatcher] = &[success_envelope, keyed_collection, bare_list];

/// Extract the records of `collection` from `body`
pub fn extract(body: &Value, collection: Collection) -> Vec<Value> {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(body, collection))
        .unwrap_or_default()
}

/// `{"success": true, "data": ...}`, unwrapping a page object inside `data`
pub fn success_envelope(body: &Value, collection: Collection) -> Option<Vec<Value>> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let data = body.get("data")?;
    match data {
        Value::Array(items) => Some(items.clone()),
        Value::Object(_) => keyed_collection(data, collection),
        _ => None,
    }
}

/// An object carrying the collection under one of its keys
pub fn keyed_collection(body: &Value, collection: Collection) -> Option<Vec<Value>> {
    let object = body.as_object()?;
    collection
        .keys()
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .cloned()
}

/// A list at the top level
pub fn bare_list(body: &Value, _collection: Collection) -> Option<Vec<Value>> {
    body.as_array().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rooms() -> Value {
        json!([
            {"room_id": "!abc:example.org", "name": "General"},
            {"room_id": "!def:example.org", "is_direct": true}
        ])
    }

    #[test]
    fn test_room_shapes_are_equivalent() {
        let expected = rooms().as_array().unwrap().clone();
        let shapes = [
            json!({"success": true, "data": rooms()}),
            json!({"rooms": rooms()}),
            json!({"joined_rooms": rooms()}),
            rooms(),
        ];
        for shape in &shapes {
            assert_eq!(extract(shape, Collection::Rooms), expected, "shape {}", shape);
        }
    }

    #[test]
    fn test_message_page_inside_envelope() {
        let body = json!({"success": true, "data": {"chunk": [{"sender": "@a:x"}], "end": "t1"}});
        assert_eq!(extract(&body, Collection::Messages), vec![json!({"sender": "@a:x"})]);
    }

    #[test]
    fn test_messages_under_messages_key() {
        let body = json!({"messages": [{"body": "hi"}]});
        assert_eq!(extract(&body, Collection::Messages).len(), 1);
    }

    #[test]
    fn test_failed_envelope_falls_through_to_keys() {
        let body = json!({"success": false, "members": ["@a:x"]});
        assert_eq!(extract(&body, Collection::Members), vec![json!("@a:x")]);
    }

    #[test]
    fn test_envelope_without_data_is_not_a_match() {
        let body = json!({"success": true});
        assert_eq!(success_envelope(&body, Collection::Rooms), None);
        assert!(extract(&body, Collection::Rooms).is_empty());
    }

    #[test]
    fn test_unknown_shapes_give_empty_list() {
        for body in [
            json!(null),
            json!("rooms"),
            json!(42),
            json!({"data": []}),
            json!({"rooms": {}}),
        ] {
            assert!(extract(&body, Collection::Rooms).is_empty(), "shape {}", body);
        }
    }

    #[test]
    fn test_key_of_other_collection_is_ignored() {
        let body = json!({"members": [{"user_id": "@a:x"}]});
        assert!(extract(&body, Collection::Rooms).is_empty());
    }
}
