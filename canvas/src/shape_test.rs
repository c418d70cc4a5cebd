use serde_json::json;

use super::*;

fn rect(color: Option<&str>) -> Shape {
    Shape::Rect { x: 10.0, y: 10.0, width: 40.0, height: 20.0, color: color.map(str::to_owned) }
}

#[test]
fn rect_payload_matches_wire_shape() {
    let payload = encode_payload(&rect(Some(FOREGROUND_COLOR))).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&payload).expect("json");
    assert_eq!(
        value,
        json!({"shape": {"type": "rect", "x": 10.0, "y": 10.0, "width": 40.0, "height": 20.0, "color": FOREGROUND_COLOR}})
    );
}

#[test]
fn absent_color_is_omitted() {
    let payload = encode_payload(&rect(None)).expect("encode");
    assert!(!payload.contains("color"));
}

#[test]
fn circle_and_pencil_use_camel_case_fields() {
    let circle = Shape::Circle { center_x: 20.0, center_y: 10.0, radius: 20.0, color: None };
    let value = serde_json::to_value(&circle).expect("json");
    assert_eq!(value, json!({"type": "circle", "centerX": 20.0, "centerY": 10.0, "radius": 20.0}));

    let pencil = Shape::Pencil { start_x: 1.0, start_y: 2.0, end_x: 3.0, end_y: 4.0, color: None };
    let value = serde_json::to_value(&pencil).expect("json");
    assert_eq!(value, json!({"type": "pencil", "startX": 1.0, "startY": 2.0, "endX": 3.0, "endY": 4.0}));
}

#[test]
fn text_carries_font_size() {
    let text = Shape::Text { x: 5.0, y: 6.0, content: "hi".into(), color: None, font_size: Some(32.0) };
    let value = serde_json::to_value(&text).expect("json");
    assert_eq!(value, json!({"type": "text", "x": 5.0, "y": 6.0, "content": "hi", "fontSize": 32.0}));
}

#[test]
fn decodes_browser_payload_with_integer_coordinates() {
    let shape =
        decode_payload(r#"{"shape":{"type":"circle","centerX":20,"centerY":10,"radius":20,"color":"rgba(255, 255, 255)"}}"#)
            .expect("decode");
    assert_eq!(
        shape,
        Shape::Circle { center_x: 20.0, center_y: 10.0, radius: 20.0, color: Some(FOREGROUND_COLOR.into()) }
    );
}

#[test]
fn rejects_fields_from_another_variant() {
    let err = decode_payload(r#"{"shape":{"type":"rect","x":0,"y":0,"width":1,"height":1,"radius":3}}"#);
    assert!(err.is_err());
}

#[test]
fn rejects_unknown_type_missing_fields_and_non_envelopes() {
    assert!(decode_payload(r#"{"shape":{"type":"triangle","x":0}}"#).is_err());
    assert!(decode_payload(r#"{"shape":{"type":"pencil","startX":0,"startY":0}}"#).is_err());
    assert!(decode_payload(r#"{"type":"rect","x":0,"y":0,"width":1,"height":1}"#).is_err());
    assert!(decode_payload("hello").is_err());
}

#[test]
fn resolved_color_defaults_to_foreground_at_read_time() {
    assert_eq!(rect(None).resolved_color(), FOREGROUND_COLOR);
    assert_eq!(rect(Some("red")).resolved_color(), "red");
    assert!(rect(Some(BACKGROUND_COLOR)).is_background_colored());
    assert!(!rect(None).is_background_colored());
}

#[test]
fn font_size_defaults_for_text_only() {
    let text = Shape::Text { x: 0.0, y: 0.0, content: "a".into(), color: None, font_size: None };
    assert_eq!(text.font_size(), Some(DEFAULT_FONT_SIZE));
    assert_eq!(rect(None).font_size(), None);
}

#[test]
fn decode_inverts_encode_for_each_variant() {
    let shapes = [
        rect(Some(BACKGROUND_COLOR)),
        Shape::Circle { center_x: -1.5, center_y: 2.0, radius: -3.0, color: None },
        Shape::Pencil { start_x: 0.0, start_y: 0.0, end_x: 9.0, end_y: 9.0, color: Some("blue".into()) },
        Shape::Text { x: 1.0, y: 2.0, content: "note \"quoted\"".into(), color: None, font_size: None },
    ];
    for shape in shapes {
        assert_eq!(decode_payload(&encode_payload(&shape).expect("encode")).expect("decode"), shape);
    }
}

#[test]
fn non_finite_numbers_cannot_be_encoded() {
    let nan_rect = Shape::Rect { x: f64::NAN, y: 0.0, width: 1.0, height: 1.0, color: None };
    let huge_text =
        Shape::Text { x: 0.0, y: 0.0, content: "a".into(), color: None, font_size: Some(f64::INFINITY) };

    assert!(!nan_rect.is_finite());
    assert!(matches!(encode_payload(&nan_rect), Err(ShapeError::NonFinite)));
    assert!(matches!(encode_payload(&huge_text), Err(ShapeError::NonFinite)));
    assert!(rect(None).is_finite());
}
