#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap};

use facet::Facet;
use facet_defaults::{DefaultsErrorKind, apply_defaults};
use indoc::indoc;

// ============================================================================
// Fixed-size arrays
// ============================================================================

#[test]
fn full_array() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[1,2,3,4]")]
        values: [u32; 4],
    }

    let mut sample = Sample { values: [0; 4] };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, [1, 2, 3, 4]);
}

#[test]
fn short_literal_leaves_trailing_zeros() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"["a", "b"]"#)]
        names: [String; 3],
    }

    let mut sample = Sample {
        names: Default::default(),
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.names, ["a", "b", ""]);
}

#[test]
fn array_with_any_non_zero_element_is_kept() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[7, 7]")]
        values: [i8; 2],
    }

    let mut sample = Sample { values: [0, -1] };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, [0, -1]);
}

#[test]
fn signed_array_in_every_base() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[1, -0x2, 0o3, -0b100]")]
        values: [i64; 4],
    }

    let mut sample = Sample { values: [0; 4] };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, [1, -2, 3, -4]);
}

#[test]
fn vec_of_arrays() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[[1,2],[3,4]]")]
        pairs: Vec<[u8; 2]>,
    }

    let mut sample = Sample { pairs: Vec::new() };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.pairs, vec![[1, 2], [3, 4]]);
}

#[test]
fn array_of_vecs() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[[1], [2, 3]]")]
        rows: [Vec<u16>; 3],
    }

    let mut sample = Sample {
        rows: [Vec::new(), Vec::new(), Vec::new()],
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.rows, [vec![1], vec![2, 3], vec![]]);
}

#[test]
fn too_many_array_elements() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[1, 2, 3]")]
        values: [u8; 2],
    }

    let mut sample = Sample { values: [0; 2] };
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::TooManyElements {
            expected: 2,
            found: 3
        }
    ));
    assert_eq!(sample.values, [0, 0]);
}

// ============================================================================
// Dynamic sequences
// ============================================================================

#[test]
fn string_vec() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"["hello"]"#)]
        greetings: Vec<String>,
        plain: Vec<String>,
    }

    let mut sample = Sample {
        greetings: Vec::new(),
        plain: Vec::new(),
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.greetings, vec!["hello".to_string()]);
    assert!(sample.plain.is_empty());
}

#[test]
fn quoted_elements_keep_commas_and_escapes() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"["a,b", "say \"hi\"", plain]"#)]
        items: Vec<String>,
    }

    let mut sample = Sample { items: Vec::new() };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.items, ["a,b", "say \"hi\"", "plain"]);
}

#[test]
fn nested_sequences() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[[1, 2], [], [3]]")]
        groups: Vec<Vec<i32>>,
    }

    let mut sample = Sample { groups: Vec::new() };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.groups, vec![vec![1, 2], vec![], vec![3]]);
}

#[test]
fn sequence_of_numbers_in_every_base() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[012, 0o12, 0b1101, -0x1a, 7]")]
        values: Vec<i64>,
    }

    let mut sample = Sample { values: Vec::new() };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, [10, 10, 13, -26, 7]);
}

#[test]
fn empty_brackets_versus_no_default() {
    #[derive(Facet, Debug, PartialEq)]
    struct Sample {
        #[facet(default_value = "[]")]
        declared_empty: Option<Vec<u8>>,
        undeclared: Option<Vec<u8>>,
        #[facet(default_value = "[5]")]
        declared: Option<Vec<u8>>,
    }

    let mut sample = Sample {
        declared_empty: None,
        undeclared: None,
        declared: None,
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(
        sample,
        Sample {
            declared_empty: Some(Vec::new()),
            undeclared: None,
            declared: Some(vec![5]),
        }
    );
}

#[test]
fn optional_elements() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[1, 2]")]
        values: Vec<Option<u16>>,
    }

    let mut sample = Sample { values: Vec::new() };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, [Some(1), Some(2)]);
}

#[test]
fn bad_element_fails_the_whole_field() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "[1, two, 3]")]
        values: Vec<u8>,
    }

    let mut sample = Sample { values: Vec::new() };
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::UnparsableLiteral(_)
    ));
    assert!(sample.values.is_empty());
}

// ============================================================================
// Mappings
// ============================================================================

#[test]
fn string_to_int_map() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"{"key": 1234}"#)]
        counts: HashMap<String, i32>,
        plain: HashMap<String, i32>,
    }

    let mut sample = Sample {
        counts: HashMap::new(),
        plain: HashMap::new(),
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.counts.len(), 1);
    assert_eq!(sample.counts["key"], 1234);
    assert!(sample.plain.is_empty());
}

#[test]
fn btree_map_with_numeric_keys() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"{1: "one", 0x2: "two"}"#)]
        names: BTreeMap<u8, String>,
    }

    let mut sample = Sample {
        names: BTreeMap::new(),
    };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(
        sample.names,
        BTreeMap::from([(1, "one".to_string()), (2, "two".to_string())])
    );
}

#[test]
fn map_of_sequences_over_several_lines() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"{"alpha": [1, 2], "beta": [], "gamma: colon": [3]}"#)]
        groups: BTreeMap<String, Vec<u8>>,
    }

    let mut sample = Sample {
        groups: BTreeMap::new(),
    };
    apply_defaults(&mut sample).unwrap();

    let rendered = format!("{:#?}", sample.groups);
    assert_eq!(
        rendered,
        indoc! {r#"
            {
                "alpha": [
                    1,
                    2,
                ],
                "beta": [],
                "gamma: colon": [
                    3,
                ],
            }"#}
    );
}

#[test]
fn empty_braces_make_an_empty_map() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = "{}")]
        values: Option<HashMap<String, bool>>,
    }

    let mut sample = Sample { values: None };
    apply_defaults(&mut sample).unwrap();
    assert_eq!(sample.values, Some(HashMap::new()));
}

#[test]
fn malformed_mapping() {
    #[derive(Facet, Debug)]
    struct Sample {
        #[facet(default_value = r#"{"key" 1}"#)]
        values: HashMap<String, u8>,
    }

    let mut sample = Sample {
        values: HashMap::new(),
    };
    let err = apply_defaults(&mut sample).unwrap_err();
    assert!(matches!(
        err.kind(),
        DefaultsErrorKind::MalformedComposite(_)
    ));
    assert_eq!(err.field(), "values");
    assert_eq!(err.literal(), Some(r#"{"key" 1}"#));
}
