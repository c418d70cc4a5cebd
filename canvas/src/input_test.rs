use super::*;

// =============================================================
// Tool
// =============================================================

#[test]
fn tool_default_is_circle() {
    assert_eq!(Tool::default(), Tool::Circle);
}

#[test]
fn tool_from_name_covers_every_tool() {
    assert_eq!(Tool::from_name("rect"), Some(Tool::Rect));
    assert_eq!(Tool::from_name("circle"), Some(Tool::Circle));
    assert_eq!(Tool::from_name("pencil"), Some(Tool::Pencil));
    assert_eq!(Tool::from_name("text"), Some(Tool::Text));
    assert_eq!(Tool::from_name("eraser"), Some(Tool::Eraser(EraserMode::Block)));
    assert_eq!(Tool::from_name("eraser-stroke"), Some(Tool::Eraser(EraserMode::Stroke)));
    assert_eq!(Tool::from_name("lasso"), None);
}

#[test]
fn only_text_is_not_a_drag_tool() {
    assert!(Tool::Rect.is_drag_tool());
    assert!(Tool::Eraser(EraserMode::Stroke).is_drag_tool());
    assert!(!Tool::Text.is_drag_tool());
}

// =============================================================
// Button
// =============================================================

#[test]
fn button_from_dom_codes() {
    assert_eq!(Button::from_dom(0), Some(Button::Primary));
    assert_eq!(Button::from_dom(1), Some(Button::Middle));
    assert_eq!(Button::from_dom(2), Some(Button::Secondary));
    assert_eq!(Button::from_dom(3), None);
}

#[test]
fn pan_buttons() {
    let none = Modifiers::default();
    let alt = Modifiers { alt: true, ..Default::default() };
    assert!(!Button::Primary.starts_pan(none));
    assert!(Button::Primary.starts_pan(alt));
    assert!(Button::Middle.starts_pan(none));
    assert!(Button::Secondary.starts_pan(none));
}

// =============================================================
// Key
// =============================================================

#[test]
fn single_characters_are_printable() {
    assert_eq!(Key("a".into()).printable(), Some('a'));
    assert_eq!(Key(" ".into()).printable(), Some(' '));
    assert_eq!(Key("é".into()).printable(), Some('é'));
}

#[test]
fn named_keys_are_not_printable() {
    for name in ["Enter", "Backspace", "Shift", "ArrowLeft", "", "\u{8}"] {
        assert_eq!(Key(name.into()).printable(), None, "{name:?}");
    }
}

// =============================================================
// State
// =============================================================

#[test]
fn defaults_are_idle_and_uncolored() {
    assert!(matches!(InputState::default(), InputState::Idle));
    let ui = UiState::default();
    assert_eq!(ui.tool, Tool::Circle);
    assert!(ui.color.is_none());
}
