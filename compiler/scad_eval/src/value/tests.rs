use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_number_formatting_matches_g() {
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(-2.5), "-2.5");
    assert_eq!(format_number(0.1), "0.1");
    assert_eq!(format_number(1.0 / 3.0), "0.333333");
    assert_eq!(format_number(123_456.7), "123457");
    assert_eq!(format_number(1_000_000.0), "1e+06");
    assert_eq!(format_number(0.0001), "0.0001");
    assert_eq!(format_number(0.000_01), "1e-05");
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(f64::INFINITY), "inf");
}

#[test]
fn test_display_nests_and_quotes() {
    let value = Value::vector([
        Value::Number(1.0),
        Value::string("a\"b"),
        Value::Undefined,
        Value::vector([Value::Bool(true)]),
    ]);
    assert_eq!(value.to_string(), r#"[1, "a\"b", undef, [true]]"#);
    assert_eq!(Value::string("x").to_display_string(), "x");
    assert_eq!(
        Value::Range(RangeValue::new(0.0, 1.0, 5.0)).to_string(),
        "[0 : 1 : 5]"
    );
}

#[test]
fn test_truthiness() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Number(0.0).is_truthy());
    assert!(Value::Number(-1.0).is_truthy());
    assert!(!Value::string("").is_truthy());
    assert!(Value::string("0").is_truthy());
    assert!(!Value::vector([]).is_truthy());
    assert!(Value::vector([Value::Undefined]).is_truthy());
}

#[test]
fn test_index_floors_and_bounds() {
    let v = Value::vector([10.0.into(), 20.0.into(), 30.0.into()]);
    assert_eq!(v.index(&Value::Number(1.9)), Value::Number(20.0));
    assert_eq!(v.index(&Value::Number(3.0)), Value::Undefined);
    assert_eq!(v.index(&Value::Number(-1.0)), Value::Undefined);
    assert_eq!(v.index(&Value::string("0")), Value::Undefined);
    assert_eq!(Value::string("abc").index(&Value::Number(2.0)), Value::string("c"));
    assert_eq!(Value::Number(1.0).index(&Value::Number(0.0)), Value::Undefined);
}

#[test]
fn test_members() {
    let v = Value::vector([1.0.into(), 2.0.into()]);
    assert_eq!(v.member("y"), Value::Number(2.0));
    assert_eq!(v.member("z"), Value::Undefined);
    assert_eq!(v.member("w"), Value::Undefined);
}

#[test]
fn test_range_values() {
    let collect = |r: RangeValue| r.iter().collect::<Vec<_>>();
    assert_eq!(collect(RangeValue::new(0.0, 1.0, 3.0)), vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(collect(RangeValue::new(0.0, 2.0, 5.0)), vec![0.0, 2.0, 4.0]);
    assert_eq!(collect(RangeValue::new(3.0, -1.0, 1.0)), vec![3.0, 2.0, 1.0]);
    assert!(collect(RangeValue::new(3.0, 1.0, 1.0)).is_empty());
    assert!(collect(RangeValue::new(0.0, 0.0, 1.0)).is_empty());
    assert_eq!(RangeValue::new(0.0, 0.1, 1.0).num_values(), 11);
    assert_eq!(RangeValue::new(0.0, 0.0, 1.0).num_values(), u64::from(u32::MAX));
    assert_eq!(RangeValue::new(2.0, 1.0, 2.0).num_values(), 1);
}

#[test]
fn test_range_indexing() {
    let r = Value::Range(RangeValue::new(1.0, 2.0, 9.0));
    assert_eq!(r.index(&Value::Number(0.0)), Value::Number(1.0));
    assert_eq!(r.index(&Value::Number(1.0)), Value::Number(2.0));
    assert_eq!(r.index(&Value::Number(2.0)), Value::Number(9.0));
    assert_eq!(r.index(&Value::Number(3.0)), Value::Undefined);
}
