use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

#[test]
fn test_turn_serializes_role_and_parts() {
    let turn = Turn::user("Hello there");

    assert_eq!(
        serde_json::to_value(&turn).unwrap(),
        json!({ "role": "user", "parts": [{ "text": "Hello there" }] })
    );
}

#[test]
fn test_turn_deserializes_model_role() {
    let turn: Turn =
        serde_json::from_value(json!({ "role": "model", "parts": [{ "text": "Hi" }] })).unwrap();

    assert_eq!(turn, Turn::model("Hi"));
    assert!(!turn.is_user());
}

#[test]
fn test_turn_text_joins_parts() {
    let turn = Turn {
        role: Role::Model,
        parts: vec!["foo".into(), "bar".into()],
    };

    assert_eq!(turn.text(), "foobar");
    assert_eq!(Turn::user("").text(), "");
}
