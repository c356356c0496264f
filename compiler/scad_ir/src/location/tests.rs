use super::*;

#[test]
fn test_none_is_default() {
    assert_eq!(Location::default(), Location::NONE);
    assert!(Location::NONE.is_none());
    assert!(!Location::new(3, 1).is_none());
}

#[test]
fn test_display() {
    assert_eq!(Location::new(12, 4).to_string(), "line 12");
    assert_eq!(Location::NONE.to_string(), "<generated>");
    assert_eq!(format!("{:?}", Location::new(12, 4)), "12:4");
}

#[test]
fn test_ordering_is_line_major() {
    assert!(Location::new(1, 9) < Location::new(2, 1));
    assert!(Location::new(2, 1) < Location::new(2, 3));
}
