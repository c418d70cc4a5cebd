use super::*;

fn ctx(token: Option<&str>) -> CliContext {
    CliContext { base_url: "http://127.0.0.1:3000".into(), token: token.map(str::to_owned) }
}

#[test]
fn ws_url_swaps_scheme_and_encodes_token() {
    assert_eq!(ws_url("http://127.0.0.1:3000", "abc").expect("url"), "ws://127.0.0.1:3000/api/ws?token=abc");
    assert_eq!(ws_url("https://sketch.example/", "a b&c").expect("url"), "wss://sketch.example/api/ws?token=a+b%26c");
}

#[test]
fn ws_url_keeps_base_path() {
    assert_eq!(ws_url("http://host/sketch/", "t").expect("url"), "ws://host/sketch/api/ws?token=t");
}

#[test]
fn ws_url_rejects_other_schemes() {
    assert!(matches!(ws_url("ftp://host", "t"), Err(CliError::InvalidBaseUrl(_))));
    assert!(matches!(ws_url("not a url", "t"), Err(CliError::InvalidBaseUrl(_))));
}

#[test]
fn token_is_required() {
    assert!(matches!(ctx(None).token(), Err(CliError::MissingToken)));
    assert!(matches!(ctx(Some("  ")).token(), Err(CliError::MissingToken)));
    assert_eq!(ctx(Some("tok")).token().expect("token"), "tok");
}

#[test]
fn shape_lines_accept_bare_and_enveloped_shapes() {
    let bare = parse_shape_line(r#"{"type":"circle","centerX":1,"centerY":2,"radius":3}"#).expect("bare");
    let wrapped = parse_shape_line(r#"{"shape":{"type":"circle","centerX":1,"centerY":2,"radius":3}}"#).expect("wrapped");

    let expected = Shape::Circle { center_x: 1.0, center_y: 2.0, radius: 3.0, color: None };
    assert_eq!(bare, Some(expected.clone()));
    assert_eq!(wrapped, Some(expected));
}

#[test]
fn blank_shape_lines_are_skipped() {
    assert!(parse_shape_line("   ").expect("blank").is_none());
}

#[test]
fn unknown_shape_is_an_error() {
    assert!(matches!(parse_shape_line(r#"{"type":"star"}"#), Err(CliError::InvalidJson(_))));
}

#[test]
fn room_must_be_positive() {
    assert_eq!(room_arg("7"), Ok(7));
    assert!(room_arg("0").is_err());
    assert!(room_arg("-2").is_err());
    assert!(Cli::try_parse_from(["sketch-cli", "history", "--room", "0"]).is_err());
    assert!(Cli::try_parse_from(["sketch-cli", "history", "--room", "3"]).is_ok());
}
