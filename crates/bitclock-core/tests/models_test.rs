//! Tests for the event model and its wire shape.

use chrono::Utc;
use serde_json::{json, Map};
use uuid::Uuid;

use bitclock_core::models::{
    Dimensions, Event, EventEnvelope, EventType, EventValue, Source, WaterfallElement,
};

fn sample_event(value: EventValue) -> Event {
    Event {
        event_type: EventType::Timing,
        value,
        dimensions: Dimensions::new().with("label", "x"),
        data: Map::new(),
        transaction_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    }
}

#[test]
fn test_event_wire_field_names() {
    let event = sample_event(EventValue::Number(42.0));
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "timing");
    assert_eq!(value["value"], 42.0);
    assert_eq!(value["dimensions"], json!({"label": "x"}));
    assert!(value["transactionId"].is_string());
    assert!(value["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn test_event_deserializes_from_wire() {
    let event = sample_event(EventValue::Number(3.0));
    let text = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&text).unwrap();
    assert_eq!(back, event);
}

#[test]
fn test_waterfall_element_shape() {
    let mut element =
        WaterfallElement::from_value(json!({"name": "img", "type": "resource", "url": "/a.png", "offset": 99}), 12.5)
            .unwrap();
    assert_eq!(element.offset, 12.5);
    assert_eq!(element.kind.as_deref(), Some("resource"));
    assert_eq!(element.fields.get("url"), Some(&json!("/a.png")));

    element.merge_fields(json!({"status": 200, "elapsed": 1}));
    element.elapsed = Some(30.0);

    let value = serde_json::to_value(&element).unwrap();
    assert_eq!(
        value,
        json!({"name": "img", "type": "resource", "offset": 12.5, "elapsed": 30.0, "url": "/a.png", "status": 200})
    );
}

#[test]
fn test_element_type_is_written_once() {
    let mut element = WaterfallElement::from_value(json!({"name": "img", "type": 5}), 0.0).unwrap();
    assert_eq!(element.kind, None);
    assert_eq!(element.fields.get("type"), Some(&json!(5)));

    element.merge_fields(json!({"type": "resource"}));
    assert_eq!(element.kind.as_deref(), Some("resource"));
    assert!(element.fields.get("type").is_none());
    let text = serde_json::to_string(&element).unwrap();
    assert_eq!(text.matches("\"type\"").count(), 1);

    element.merge_fields(json!({"type": ["a"]}));
    assert_eq!(element.kind, None);
    let text = serde_json::to_string(&element).unwrap();
    assert_eq!(text.matches("\"type\"").count(), 1);
    assert_eq!(serde_json::to_value(&element).unwrap()["type"], json!(["a"]));
}

#[test]
fn test_point_element_has_no_elapsed() {
    let element = WaterfallElement::from_value(json!({"name": "load"}), 0.0).unwrap();
    let value = serde_json::to_value(&element).unwrap();
    assert!(value.get("elapsed").is_none());
    assert!(value.get("type").is_none());
}

#[test]
fn test_waterfall_element_requires_name() {
    assert!(WaterfallElement::from_value(json!({"type": "x"}), 0.0).is_err());
    assert!(WaterfallElement::from_value(json!({"name": 1}), 0.0).is_err());
    assert!(WaterfallElement::from_value(json!("load"), 0.0).is_err());
}

#[test]
fn test_envelope_shape() {
    let envelope = EventEnvelope {
        version: "0.1.0".into(),
        env: Some("test".into()),
        user_agent: None,
        source: Source::Server,
        events: vec![sample_event(EventValue::Number(1.0))],
    };
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["source"], "server");
    assert_eq!(value["env"], "test");
    assert!(value.get("userAgent").is_none());
    assert_eq!(value["events"].as_array().unwrap().len(), 1);
}

#[test]
fn test_dimension_key_is_order_independent() {
    let a = Dimensions::new().with("a", 1).with("b", "x");
    let b = Dimensions::new().with("b", "x").with("a", 1);
    assert_eq!(a.key(), b.key());
    // A string "1" and a number 1 are different dimensions.
    let c = Dimensions::new().with("a", "1").with("b", "x");
    assert_ne!(a.key(), c.key());
}

#[test]
fn test_merge_right_wins() {
    let base = Dimensions::new().with("page", "home").with("env", "a");
    let call = Dimensions::new().with("env", "b");
    let merged = base.merged(&call);
    assert_eq!(merged.to_value(), json!({"page": "home", "env": "b"}));
}
