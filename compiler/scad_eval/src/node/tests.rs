use super::*;
use pretty_assertions::assert_eq;

fn sample() -> Node {
    Node::root().with_children(vec![Node::group("box")
        .with_attributes(vec![("n".to_string(), Value::Number(1.0))])
        .with_children(vec![
            Node::builtin("cube").with_tags(Tags::HIGHLIGHT),
            Node::builtin("sphere"),
        ])])
}

#[test]
fn test_count_and_lookup() {
    let tree = sample();
    assert_eq!(tree.count(), 4);
    assert_eq!(tree.children[0].attribute("n"), Some(&Value::Number(1.0)));
    assert_eq!(tree.children[0].attribute("m"), None);
    assert!(!tree.is_empty());
    assert!(tree.children[0].children[1].is_empty());
}

#[test]
fn test_display_dump() {
    let expected = "\
root() {
  box(n = 1) {
    #cube();
    sphere();
  }
}
";
    assert_eq!(sample().to_string(), expected);
}
