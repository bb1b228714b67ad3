use chargelog::error::ChargelogError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        ChargelogError::config("x"),
        ChargelogError::Config { .. }
    ));
    assert!(matches!(
        ChargelogError::database("x"),
        ChargelogError::Database { .. }
    ));
    assert!(matches!(ChargelogError::io("x"), ChargelogError::Io { .. }));
}

#[test]
fn error_constructors_group_2() {
    let ser = ChargelogError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, ChargelogError::Serialization { .. }));
    assert!(matches!(
        ChargelogError::session("x"),
        ChargelogError::Session { .. }
    ));
    assert!(matches!(
        ChargelogError::notification("x"),
        ChargelogError::Notification { .. }
    ));
    assert!(matches!(
        ChargelogError::validation("f", "m"),
        ChargelogError::Validation { .. }
    ));
    assert!(matches!(
        ChargelogError::generic("x"),
        ChargelogError::Generic { .. }
    ));
}

#[test]
fn display_messages() {
    let e = ChargelogError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));

    let e = ChargelogError::session("already charging");
    assert_eq!(format!("{}", e), "Session error: already charging");
}
