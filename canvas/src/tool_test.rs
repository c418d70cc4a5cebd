#![allow(clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[test]
fn rect_drag_keeps_start_corner_and_signed_size() {
    let shape = build_drag_shape(Tool::Rect, pt(10.0, 10.0), pt(50.0, 30.0), None);
    assert_eq!(shape, Some(Shape::Rect { x: 10.0, y: 10.0, width: 40.0, height: 20.0, color: None }));

    let reversed = build_drag_shape(Tool::Rect, pt(50.0, 30.0), pt(10.0, 10.0), None);
    assert_eq!(reversed, Some(Shape::Rect { x: 50.0, y: 30.0, width: -40.0, height: -20.0, color: None }));
}

#[test]
fn circle_drag_uses_larger_extent() {
    let shape = build_drag_shape(Tool::Circle, pt(0.0, 0.0), pt(40.0, 20.0), None);
    assert_eq!(shape, Some(Shape::Circle { center_x: 20.0, center_y: 10.0, radius: 20.0, color: None }));
}

#[test]
fn circle_radius_is_never_negative() {
    let Some(Shape::Circle { radius, center_x, center_y, .. }) =
        build_drag_shape(Tool::Circle, pt(0.0, 0.0), pt(-10.0, -30.0), None)
    else {
        panic!("expected circle");
    };
    assert_eq!(radius, 15.0);
    assert_eq!((center_x, center_y), (-5.0, -15.0));
}

#[test]
fn pencil_is_one_segment() {
    let shape = build_drag_shape(Tool::Pencil, pt(1.0, 2.0), pt(3.0, 4.0), Some("red"));
    assert_eq!(
        shape,
        Some(Shape::Pencil { start_x: 1.0, start_y: 2.0, end_x: 3.0, end_y: 4.0, color: Some("red".into()) })
    );
}

#[test]
fn zero_movement_still_builds_a_shape() {
    let shape = build_drag_shape(Tool::Rect, pt(5.0, 5.0), pt(5.0, 5.0), None);
    assert_eq!(shape, Some(Shape::Rect { x: 5.0, y: 5.0, width: 0.0, height: 0.0, color: None }));
}

#[test]
fn eraser_ignores_user_color() {
    let block = build_drag_shape(Tool::Eraser(EraserMode::Block), pt(0.0, 0.0), pt(10.0, 10.0), Some("red"))
        .expect("block");
    assert!(matches!(block, Shape::Rect { .. }));
    assert!(block.is_background_colored());

    let stroke = build_drag_shape(Tool::Eraser(EraserMode::Stroke), pt(0.0, 0.0), pt(10.0, 10.0), Some("red"))
        .expect("stroke");
    assert!(matches!(stroke, Shape::Pencil { .. }));
    assert!(stroke.is_background_colored());
}

#[test]
fn text_tool_has_no_drag_shape() {
    assert_eq!(build_drag_shape(Tool::Text, pt(0.0, 0.0), pt(1.0, 1.0), None), None);
}

#[test]
fn text_shape_requires_visible_content() {
    assert_eq!(build_text_shape(pt(0.0, 0.0), "   ", None, None), None);
    assert_eq!(
        build_text_shape(pt(3.0, 4.0), " hi ", Some("blue"), Some(16.0)),
        Some(Shape::Text { x: 3.0, y: 4.0, content: " hi ".into(), color: Some("blue".into()), font_size: Some(16.0) })
    );
}

#[test]
fn non_finite_geometry_builds_nothing() {
    assert_eq!(build_drag_shape(Tool::Rect, pt(f64::NAN, 0.0), pt(1.0, 1.0), None), None);
    assert_eq!(build_drag_shape(Tool::Pencil, pt(0.0, 0.0), pt(f64::INFINITY, 1.0), None), None);
    assert_eq!(build_text_shape(pt(0.0, f64::NAN), "hi", None, None), None);
}
