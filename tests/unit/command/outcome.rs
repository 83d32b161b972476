use super::*;

const ALL: [Outcome; 6] = [
    Outcome::NoError,
    Outcome::UnknownCommand,
    Outcome::InvalidArguments,
    Outcome::InvalidSize,
    Outcome::OutOfBounds,
    Outcome::GenericError,
];

#[test]
fn classification_is_fixed_per_kind() {
    let fatal: Vec<_> = ALL.iter().copied().filter(|o| o.is_fatal()).collect();
    assert_eq!(
        fatal,
        vec![
            Outcome::InvalidSize,
            Outcome::OutOfBounds,
            Outcome::GenericError
        ]
    );
    let recoverable: Vec<_> = ALL
        .iter()
        .copied()
        .filter(|o| o.is_recoverable_error())
        .collect();
    assert_eq!(
        recoverable,
        vec![Outcome::UnknownCommand, Outcome::InvalidArguments]
    );
    assert!(!Outcome::NoError.is_error());
    assert!(!Outcome::NoError.is_fatal());
}

#[test]
fn codes_round_trip_and_unknown_codes_are_fatal() {
    for o in ALL {
        assert_eq!(Outcome::from_code(o.code()), o);
    }
    assert_eq!(Outcome::from_code(77), Outcome::GenericError);
}

#[test]
fn serde_uses_snake_case_names() {
    let json = serde_json::to_string(&Outcome::UnknownCommand).unwrap();
    assert_eq!(json, "\"unknown_command\"");
    let back: Outcome = serde_json::from_str("\"out_of_bounds\"").unwrap();
    assert_eq!(back, Outcome::OutOfBounds);
}
