#![allow(missing_docs)]

use std::error::Error;

use facet::Facet;
use facet_defaults::{DefaultsErrorKind, apply_defaults};

// ============================================================================
// Unparsable literals
// ============================================================================

#[test]
fn bool_literals_are_strict() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "yes")]
        flag: bool,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::UnparsableLiteral(_)
    ));
    assert_eq!(err.field(), "flag");
    assert_eq!(err.literal(), Some("yes"));
}

#[test]
fn sign_on_unsigned_field() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "-1")]
        count: usize,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::UnparsableLiteral(_)
    ));
}

#[test]
fn char_needs_exactly_one_character() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "ab")]
        letter: char,
    }

    let mut sample = Sample::default();
    assert!(apply_defaults(&mut sample).is_err());
}

// ============================================================================
// Overflow
// ============================================================================

#[test]
fn integer_overflow_reports_the_width() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "256")]
        byte: u8,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(err.kind(), DefaultsErrorKind::Overflow { bits: 8 }));
    assert_eq!(
        err.to_string(),
        r#"field 'byte': value overflows the 8-bit target (literal "256")"#
    );
}

#[test]
fn signed_overflow() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "-0x8001")]
        value: i16,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(err.kind(), DefaultsErrorKind::Overflow { bits: 16 }));
}

#[test]
fn float_overflow() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "3.5e38")]
        value: f32,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(err.kind(), DefaultsErrorKind::Overflow { bits: 32 }));
}

// ============================================================================
// Shapes and annotations
// ============================================================================

#[test]
fn unsupported_shape_with_a_literal() {
    #[derive(Facet, Debug, Default, PartialEq)]
    #[repr(u8)]
    enum Mode {
        #[default]
        Fast,
        Slow,
    }

    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "Slow")]
        mode: Mode,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::UnsupportedTypeShape(_)
    ));
    assert_eq!(sample.mode, Mode::Fast);
}

#[test]
fn unsupported_shape_without_a_literal_is_ignored() {
    #[derive(Facet, Debug, Default, PartialEq)]
    #[repr(u8)]
    enum Mode {
        #[default]
        Fast,
        Slow,
    }

    #[derive(Facet, Debug, Default)]
    struct Sample {
        mode: Mode,
        #[facet(default_value = "4")]
        threads: u8,
    }

    let mut sample = Sample::default();
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.mode, Mode::Fast);
    assert_eq!(sample.threads, 4);
}

#[test]
fn duplicate_annotation() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "1")]
        #[facet(default_value = "2")]
        value: u8,
    }

    let mut sample = Sample::default();
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::MalformedAnnotation(_)
    ));
    assert_eq!(err.field(), "value");
}

#[test]
fn top_level_must_be_a_struct() {
    let mut value = 5u32;
    let err = apply_defaults(&mut value).unwrap_err();
    assert!(matches!(err.kind(), DefaultsErrorKind::NotARecord(_)));
    assert_eq!(err.field(), "");
}

// ============================================================================
// Error reporting
// ============================================================================

#[test]
fn nested_field_path() {
    #[derive(Facet, Debug, Default)]
    struct Inner {
        #[facet(default_value = "not-a-number")]
        port: u16,
    }

    #[derive(Facet, Debug, Default)]
    struct Middle {
        inner: Inner,
    }

    #[derive(Facet, Debug, Default)]
    struct Outer {
        middle: Option<Box<Middle>>,
    }

    let mut outer = Outer::default();
    let err = apply_defaults(&mut outer).unwrap_err();
    assert_eq!(err.field(), "middle.inner.port");
    assert_eq!(err.literal(), Some("not-a-number"));
    assert!(err.source().is_none());
    assert!(err.to_string().starts_with("field 'middle.inner.port': "));
}

#[test]
fn earlier_fields_are_not_rolled_back() {
    #[derive(Facet, Debug, Default)]
    struct Sample {
        #[facet(default_value = "1")]
        first: u8,
        #[facet(default_value = "oops")]
        second: u8,
        #[facet(default_value = "3")]
        third: u8,
    }

    let mut sample = Sample::default();
    assert!(apply_defaults(&mut sample).is_err());
    assert_eq!(sample.first, 1);
    assert_eq!(sample.second, 0);
    assert_eq!(sample.third, 0);
}
