#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

#[test]
fn default_is_identity() {
    let vp = Viewport::default();
    assert_eq!(vp.offset_x, 0.0);
    assert_eq!(vp.offset_y, 0.0);
    assert_eq!(vp.scale, 1.0);
    assert_eq!(vp.screen_to_world(Point::new(12.0, -7.0)), Point::new(12.0, -7.0));
}

#[test]
fn screen_to_world_applies_offset_then_scale() {
    let vp = Viewport { offset_x: 100.0, offset_y: 50.0, scale: 2.0 };
    assert!(point_approx_eq(vp.screen_to_world(Point::new(300.0, 250.0)), Point::new(100.0, 100.0)));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let vp = Viewport { offset_x: -37.5, offset_y: 12.25, scale: 0.75 };
    for (x, y) in [(0.0, 0.0), (10.0, -20.0), (-333.3, 47.1)] {
        let screen = Point::new(x, y);
        assert!(point_approx_eq(vp.world_to_screen(vp.screen_to_world(screen)), screen));
    }
}

#[test]
fn pan_adds_screen_delta() {
    let mut vp = Viewport::default();
    vp.pan_by(15.0, -5.0);
    vp.pan_by(5.0, 5.0);
    assert_eq!(vp.offset_x, 20.0);
    assert_eq!(vp.offset_y, 0.0);
    assert_eq!(vp.scale, 1.0);
}

#[test]
fn wheel_up_zooms_in_by_ten_percent() {
    let mut vp = Viewport::default();
    assert!(vp.zoom_at(Point::new(0.0, 0.0), -1.0));
    assert!(approx_eq(vp.scale, 1.1));
}

#[test]
fn wheel_down_zooms_out_by_ten_percent() {
    let mut vp = Viewport::default();
    assert!(vp.zoom_at(Point::new(0.0, 0.0), 120.0));
    assert!(approx_eq(vp.scale, 0.9));
}

#[test]
fn zero_delta_is_noop() {
    let mut vp = Viewport { offset_x: 3.0, offset_y: 4.0, scale: 2.0 };
    assert!(!vp.zoom_at(Point::new(50.0, 50.0), 0.0));
    assert_eq!(vp, Viewport { offset_x: 3.0, offset_y: 4.0, scale: 2.0 });
}

#[test]
fn zoom_keeps_world_point_under_cursor() {
    let mut vp = Viewport { offset_x: 40.0, offset_y: -25.0, scale: 1.3 };
    let cursor = Point::new(321.0, 187.0);
    let before = vp.screen_to_world(cursor);

    for dy in [-1.0, -1.0, 1.0, -3.0, 2.0] {
        vp.zoom_at(cursor, dy);
        assert!(point_approx_eq(vp.screen_to_world(cursor), before));
    }
}

#[test]
fn zoom_clamps_to_max_scale() {
    let mut vp = Viewport::default();
    for _ in 0..100 {
        vp.zoom_at(Point::new(10.0, 10.0), -1.0);
    }
    assert!(approx_eq(vp.scale, MAX_SCALE));
    assert!(!vp.zoom_at(Point::new(10.0, 10.0), -1.0));
}

#[test]
fn zoom_clamps_to_min_scale() {
    let mut vp = Viewport::default();
    for _ in 0..100 {
        vp.zoom_at(Point::new(10.0, 10.0), 1.0);
    }
    assert!(approx_eq(vp.scale, MIN_SCALE));
}

#[test]
fn screen_distance_scales_inversely() {
    let vp = Viewport { offset_x: 0.0, offset_y: 0.0, scale: 4.0 };
    assert!(approx_eq(vp.screen_dist_to_world(20.0), 5.0));
}
