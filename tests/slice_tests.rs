use vpack::{ArrayIterator, Builder, Error, SharedSlice, Slice, Value, ValueType};

fn build_scalar(value: Value) -> Builder {
    let mut builder = Builder::new();
    builder.add(value).unwrap();
    builder
}

#[test]
fn type_classification() {
    assert_eq!(Slice::none().value_type(), ValueType::None);
    assert!(build_scalar(Value::null()).slice().unwrap().is_null());
    assert!(build_scalar(Value::from(true)).slice().unwrap().is_bool());
    assert!(build_scalar(Value::from(1.5)).slice().unwrap().is_double());
    assert!(build_scalar(Value::from(-20i64)).slice().unwrap().is_integer());
    assert!(build_scalar(Value::from(20u64)).slice().unwrap().is_number());
    assert!(build_scalar(Value::from("s")).slice().unwrap().is_string());
    assert!(
        build_scalar(Value::binary(vec![1]))
            .slice()
            .unwrap()
            .is_binary()
    );
}

#[test]
fn scalar_accessors() {
    assert!(!build_scalar(Value::from(false)).slice().unwrap().get_bool().unwrap());
    assert_eq!(
        build_scalar(Value::from(1.5)).slice().unwrap().get_double().unwrap(),
        1.5
    );
    assert_eq!(
        build_scalar(Value::from(-12345i64)).slice().unwrap().get_int().unwrap(),
        -12345
    );
    assert_eq!(
        build_scalar(Value::from(7i64)).slice().unwrap().get_small_int().unwrap(),
        7
    );
    assert_eq!(
        build_scalar(Value::from(-4i64)).slice().unwrap().get_small_int().unwrap(),
        -4
    );
    assert_eq!(
        build_scalar(Value::from(u64::MAX)).slice().unwrap().get_uint().unwrap(),
        u64::MAX
    );
    assert_eq!(
        build_scalar(Value::utc_date(1_234_567)).slice().unwrap().get_utc_date().unwrap(),
        1_234_567
    );
    assert_eq!(
        build_scalar(Value::from("héllo")).slice().unwrap().get_str().unwrap(),
        "héllo"
    );
    assert_eq!(
        build_scalar(Value::binary(vec![1, 2])).slice().unwrap().get_binary().unwrap(),
        [1, 2]
    );
}

#[test]
fn integer_conversions() {
    // unsigned values read back as signed while they fit
    let builder = build_scalar(Value::from(300u64));
    assert_eq!(builder.slice().unwrap().get_int().unwrap(), 300);

    let builder = build_scalar(Value::from(u64::MAX));
    assert_eq!(
        builder.slice().unwrap().get_int().unwrap_err(),
        Error::NumberOutOfRange
    );

    let builder = build_scalar(Value::from(-1i64));
    assert_eq!(
        builder.slice().unwrap().get_uint().unwrap_err(),
        Error::NumberOutOfRange
    );

    // negative numbers keep their sign through every width
    for v in [-7i64, -300, -70_000, -5_000_000_000] {
        let builder = build_scalar(Value::from(v));
        assert_eq!(builder.slice().unwrap().get_int().unwrap(), v);
    }
}

#[test]
fn byte_sizes() {
    let cases: Vec<(Value, usize)> = vec![
        (Value::null(), 1),
        (Value::from(true), 1),
        (Value::from(1.5), 9),
        (Value::from(5i64), 1),
        (Value::from(1000i64), 3),
        (Value::from("abcd"), 5),
        (Value::binary(vec![0; 10]), 12),
        (Value::utc_date(0), 9),
    ];
    for (value, expected) in cases {
        let builder = build_scalar(value);
        assert_eq!(builder.slice().unwrap().byte_size().unwrap(), expected);
        assert_eq!(builder.as_bytes().len(), expected);
    }
}

#[test]
fn type_mismatches_are_reported() {
    let builder = build_scalar(Value::from(1i64));
    let slice = builder.slice().unwrap();
    assert!(matches!(
        slice.get_str().unwrap_err(),
        Error::UnexpectedType(_)
    ));
    assert!(matches!(
        slice.get_bool().unwrap_err(),
        Error::UnexpectedType(_)
    ));
    assert!(matches!(slice.at(0).unwrap_err(), Error::UnexpectedType(_)));
    assert!(matches!(
        slice.get("k").unwrap_err(),
        Error::UnexpectedType(_)
    ));
    assert!(matches!(
        slice.length().unwrap_err(),
        Error::UnexpectedType(_)
    ));
}

#[test]
fn unsealed_builder_has_no_slice() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    assert_eq!(builder.slice().unwrap_err(), Error::NotSealed);
    assert_eq!(builder.to_json().unwrap_err(), Error::NotSealed);
    builder.close().unwrap();
    assert!(builder.slice().is_ok());
}

#[test]
fn array_iterator_walks_every_encoding() {
    // unindexed, indexed and compact arrays iterate the same way
    let mut plain = Builder::new();
    plain.open_array().unwrap();
    for i in 0..5i64 {
        plain.add(i).unwrap();
    }
    plain.close().unwrap();

    let mut mixed = Builder::new();
    mixed.open_array().unwrap();
    mixed.add(0i64).unwrap();
    mixed.add("one").unwrap();
    mixed.add(2.5).unwrap();
    mixed.close().unwrap();

    let mut compact = Builder::new();
    compact.open_array_compact().unwrap();
    for i in 0..5i64 {
        compact.add(i).unwrap();
    }
    compact.close().unwrap();

    let collect = |builder: &Builder| -> Vec<u8> {
        ArrayIterator::new(builder.slice().unwrap())
            .unwrap()
            .map(|member| member.unwrap().head())
            .collect()
    };

    assert_eq!(collect(&plain), [0x30, 0x31, 0x32, 0x33, 0x34]);
    assert_eq!(collect(&compact), [0x30, 0x31, 0x32, 0x33, 0x34]);
    assert_eq!(collect(&mixed), [0x30, 0x43, 0x1b]);

    let iter = ArrayIterator::new(plain.slice().unwrap()).unwrap();
    assert_eq!(iter.len(), 5);
    assert_eq!(iter.size_hint(), (5, Some(5)));
}

#[test]
fn empty_containers_iterate_nothing() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.close().unwrap();
    assert_eq!(
        ArrayIterator::new(builder.slice().unwrap()).unwrap().count(),
        0
    );

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.close().unwrap();
    assert_eq!(
        vpack::ObjectIterator::new(builder.slice().unwrap())
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn shared_slice_owns_its_storage() {
    let shared = {
        let mut builder = Builder::new();
        builder.open_object().unwrap();
        builder.add_key_value("a", 1i64).unwrap();
        builder.add_key_value("b", 2i64).unwrap();
        builder.close().unwrap();
        SharedSlice::new(builder.into_bytes())
    };

    let slice = shared.slice();
    assert_eq!(slice.get("a").unwrap().unwrap().get_int().unwrap(), 1);

    let clone = shared.clone();
    assert_eq!(clone.slice().get("b").unwrap().unwrap().get_int().unwrap(), 2);
}

#[test]
fn reappending_a_slice_preserves_bytes() {
    let mut source = Builder::new();
    source.open_object().unwrap();
    source.add_key_value("nested", Value::array()).unwrap();
    source.add(1i64).unwrap();
    source.add("two").unwrap();
    source.close().unwrap();
    source.add_key_value("flag", true).unwrap();
    source.close().unwrap();

    let mut copy = Builder::new();
    copy.add_slice(source.slice().unwrap()).unwrap();
    assert_eq!(copy.as_bytes(), source.as_bytes());

    // and the copy navigates identically
    let slice = copy.slice().unwrap();
    let nested = slice.get("nested").unwrap().unwrap();
    assert_eq!(nested.at(1).unwrap().get_str().unwrap(), "two");
}

#[test]
fn builder_reuse_after_clear() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(1i64).unwrap();
    builder.close().unwrap();
    let first = builder.as_bytes().to_vec();

    builder.clear();
    assert!(builder.is_empty());
    builder.open_array().unwrap();
    builder.add(1i64).unwrap();
    builder.close().unwrap();
    assert_eq!(builder.as_bytes(), first.as_slice());
}

#[test]
fn compound_state_errors() {
    let mut builder = Builder::new();
    assert_eq!(builder.close().unwrap_err(), Error::NeedOpenCompound);
    assert_eq!(builder.remove_last().unwrap_err(), Error::NeedOpenCompound);

    let mut builder = Builder::new();
    builder.open_array().unwrap();
    assert_eq!(builder.remove_last().unwrap_err(), Error::NeedSubvalue);

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    let array = {
        let mut b = Builder::new();
        b.open_array().unwrap();
        b.close().unwrap();
        b
    };
    assert_eq!(
        builder
            .add_array_iterator(ArrayIterator::new(array.slice().unwrap()).unwrap())
            .unwrap_err(),
        Error::NeedOpenArray
    );
}
