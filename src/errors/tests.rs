//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.hls".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: "identifier".to_string(),
            message: "expected `(` in prototype".to_string(),
        },
        pos,
    );

    assert_eq!(error.get_position().unwrap().0, 42);
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
    assert!(error.is_parse_error());
}

#[test]
fn test_unpositioned_error() {
    let error = Error::unpositioned(ErrorImpl::VariableNotDeclared {
        variable: "foo".to_string(),
    });

    assert!(error.get_position().is_none());
    assert_eq!(error.get_error_name(), "VariableNotDeclared");
    assert!(!error.is_parse_error());
    assert_eq!(error.to_string(), "variable \"foo\" not declared");
}

#[test]
fn test_positioned_display_includes_location() {
    let error = Error::new(
        ErrorImpl::NumberParseError {
            token: "1.2.3".to_string(),
        },
        Position(7, Rc::new("test.hls".to_string())),
    );

    assert_eq!(
        error.to_string(),
        "error parsing number: \"1.2.3\" at test.hls:7"
    );
}

#[test]
fn test_argument_count_tips() {
    let error = Error::unpositioned(ErrorImpl::MissingArguments {
        function: "foo".to_string(),
        expected: 2,
        received: 1,
    });

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert_eq!(tip, "`foo` expects 2 arguments, received 1"),
        ErrorTip::None => panic!("expected a suggestion"),
    }
}

#[test]
fn test_verification_error_has_no_tip() {
    let error = Error::unpositioned(ErrorImpl::InvalidFunction {
        function: "f".to_string(),
        reason: "block `entry` has no terminator".to_string(),
    });

    assert!(matches!(error.get_tip(), ErrorTip::None));
    assert_eq!(error.get_error_name(), "InvalidFunction");
}

#[test]
fn test_errors_compare_structurally() {
    let a = Error::unpositioned(ErrorImpl::UnknownOperator { operator: '/' });
    let b = Error::unpositioned(ErrorImpl::UnknownOperator { operator: '/' });
    let c = Error::unpositioned(ErrorImpl::UnknownOperator { operator: '%' });

    assert_eq!(a, b);
    assert_ne!(a, c);
}
