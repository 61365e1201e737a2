use vpack::{Builder, Error, Options, parse_json, parse_json_with_options, to_json_pretty};

fn round_trip(input: &str) -> String {
    parse_json(input).unwrap().to_json().unwrap()
}

#[test]
fn parse_builds_the_expected_bytes() {
    assert_eq!(parse_json("[1,2]").unwrap().as_bytes(), [0x02, 0x04, 0x31, 0x32]);
    assert_eq!(parse_json("null").unwrap().as_bytes(), [0x18]);
    assert_eq!(parse_json("[]").unwrap().as_bytes(), [0x01]);
    assert_eq!(parse_json("{}").unwrap().as_bytes(), [0x0a]);
    assert_eq!(
        parse_json("{\"a\":1}").unwrap().as_bytes(),
        [0x14, 0x06, 0x41, 0x61, 0x31, 0x01]
    );
}

#[test]
fn canonical_text_survives_a_round_trip() {
    let cases = [
        "null",
        "true",
        "false",
        "0",
        "-7",
        "42",
        "1.5",
        "-0.25",
        "\"hello\"",
        "\"a\\nb\"",
        "\"quote:\\\"\"",
        "[]",
        "{}",
        "[1,2,3]",
        "[[1],[2,[3]]]",
        "{\"a\":1,\"b\":[true,null],\"c\":\"x\"}",
        "{\"x\":{\"y\":{\"z\":[]}}}",
        "18446744073709551615",
        "-9223372036854775808",
        "[1.25,-0.5,\"mixed\",false]",
    ];
    for case in cases {
        assert_eq!(round_trip(case), case, "round trip of {case}");
    }
}

#[test]
fn non_canonical_numbers_normalize() {
    assert_eq!(round_trip("1e2"), "100");
    assert_eq!(round_trip("1.0e3"), "1000");
    assert_eq!(round_trip("2.5e-1"), "0.25");
    // too large for any integer type, parsed as a double
    assert_eq!(
        parse_json("123456789123456789123456789")
            .unwrap()
            .slice()
            .unwrap()
            .is_double(),
        true
    );
}

#[test]
fn integer_types_follow_the_value_range() {
    assert!(parse_json("1").unwrap().slice().unwrap().is_integer());
    let builder = parse_json("9223372036854775808").unwrap();
    assert_eq!(builder.slice().unwrap().head(), 0x2f);
    let builder = parse_json("-2").unwrap();
    assert_eq!(builder.slice().unwrap().get_int().unwrap(), -2);
}

#[test]
fn string_escapes() {
    let builder = parse_json("\"a\\u0041\\t\\\\\\/\"").unwrap();
    assert_eq!(builder.slice().unwrap().get_str().unwrap(), "aA\t\\/");

    // surrogate pair
    let builder = parse_json("\"\\ud83d\\ude00\"").unwrap();
    assert_eq!(builder.slice().unwrap().get_str().unwrap(), "😀");

    // the dumper re-escapes control characters
    assert_eq!(round_trip("\"\\u0001\""), "\"\\u0001\"");
}

#[test]
fn unicode_passes_through() {
    assert_eq!(round_trip("\"grüß göttin\""), "\"grüß göttin\"");
    assert_eq!(round_trip("\"日本語\""), "\"日本語\"");
}

#[test]
fn whitespace_is_ignored() {
    let spaced = " { \"a\" : [ 1 , 2 ] , \"b\" : null } ";
    assert_eq!(round_trip(spaced), "{\"a\":[1,2],\"b\":null}");
}

#[test]
fn options_flow_into_the_parser() {
    let options = Options {
        build_unindexed_arrays: true,
        build_unindexed_objects: true,
        ..Options::default()
    };
    let builder = parse_json_with_options("{\"a\":[1,2],\"b\":2}", options).unwrap();
    let slice = builder.slice().unwrap();
    assert_eq!(slice.head(), 0x14);
    assert_eq!(slice.get("a").unwrap().unwrap().head(), 0x13);
    assert_eq!(builder.to_json().unwrap(), "{\"a\":[1,2],\"b\":2}");
}

#[test]
fn duplicate_keys_fail_with_uniqueness_checking() {
    let options = Options {
        check_attribute_uniqueness: true,
        ..Options::default()
    };
    assert_eq!(
        parse_json_with_options("{\"a\":1,\"a\":2,\"b\":3}", options).unwrap_err(),
        Error::DuplicateAttributeName
    );
}

#[test]
fn pretty_printing() {
    let builder = parse_json("{\"a\":[1,2]}").unwrap();
    assert_eq!(
        builder.to_json_pretty().unwrap(),
        "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
    );
    assert_eq!(
        to_json_pretty(parse_json("[]").unwrap().slice().unwrap()).unwrap(),
        "[]"
    );
}

#[test]
fn dates_and_binary_have_no_json_form() {
    let mut builder = Builder::new();
    builder.add(vpack::Value::utc_date(0)).unwrap();
    assert_eq!(builder.to_json().unwrap_err(), Error::NoJsonEquivalent);

    let mut builder = Builder::new();
    builder.add(vpack::Value::binary(vec![1])).unwrap();
    assert_eq!(builder.to_json().unwrap_err(), Error::NoJsonEquivalent);
}

#[test]
fn parse_errors_carry_a_position() {
    for (input, expected_pos) in [
        ("", 0usize),
        ("tru", 0),
        ("nul", 0),
        ("[1,]", 3),
        ("[1 2]", 3),
        ("{\"a\"}", 4),
        ("{\"a\":}", 5),
        ("{a:1}", 1),
        ("\"unterminated", 13),
        ("01", 0),
        ("1.", 2),
        ("1e", 2),
        ("-", 1),
        ("\"\\q\"", 3),
        ("\"\\ud800x\"", 7),
    ] {
        match parse_json(input).unwrap_err() {
            Error::Parse { pos, .. } => {
                assert_eq!(pos, expected_pos, "position for {input:?}")
            }
            other => panic!("expected parse error for {input:?}, got {other:?}"),
        }
    }

    assert!(matches!(
        parse_json("1 2").unwrap_err(),
        Error::Parse { pos: 2, .. }
    ));
}
