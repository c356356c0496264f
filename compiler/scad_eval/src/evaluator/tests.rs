#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use pretty_assertions::assert_eq;
use scad_diagnostic::ErrorCode;
use scad_ir::{Argument, BinaryOp, Expr, FunctionDef, InstantiationRequest, ModuleDef, Parameter, Scope, Tags};
use scad_units::testing::{LineParser, MemoryFileSystem};
use scad_units::{SearchPath, UnitCache};

use super::*;
use crate::{buffer_handler, silent_handler, NodeKind, SharedPrintHandler};

fn config() -> EvalConfig {
    EvalConfig::new().with_print_handler(silent_handler())
}

fn evaluator() -> Evaluator<'static> {
    Evaluator::builder(config()).build()
}

fn echoing() -> (Evaluator<'static>, SharedPrintHandler) {
    let handler = buffer_handler();
    let ev = Evaluator::builder(config())
        .print_handler(handler.clone())
        .build();
    (ev, handler)
}

/// Instantiate `scope` as the body of a top-level group and return the
/// group's children.
fn run(ev: &mut Evaluator<'_>, scope: Scope) -> Vec<Node> {
    let root = ev.root_frame();
    let tree = ev
        .instantiate(&root, &InstantiationRequest::new("group").with_body(scope))
        .unwrap();
    assert_eq!(tree.kind, NodeKind::Root);
    tree.children.into_iter().next().unwrap().children
}

fn call(name: &str) -> InstantiationRequest {
    InstantiationRequest::new(name)
}

fn echo(args: impl IntoIterator<Item = Expr>) -> InstantiationRequest {
    args.into_iter()
        .fold(call("echo"), InstantiationRequest::with_arg)
}

fn codes(ev: &Evaluator<'_>) -> Vec<ErrorCode> {
    ev.diagnostics().map(|d| d.code).collect()
}

fn n(x: f64) -> Value {
    Value::Number(x)
}

#[test]
fn test_top_level_builtin_dump() {
    let mut ev = evaluator();
    let root = ev.root_frame();
    let tree = ev
        .instantiate(&root, &call("cube").with_named_arg("size", Expr::number(2.0)))
        .unwrap();
    assert_eq!(tree.to_string(), "root() {\n  cube(size = 2);\n}\n");
}

#[test]
fn test_inner_assignment_shadows_outer() {
    let (mut ev, out) = echoing();
    let scope = Scope::new()
        .with_assignment("x", Expr::number(1.0))
        .with_module(ModuleDef::new(
            "m",
            vec![],
            Scope::new()
                .with_assignment("x", Expr::number(2.0))
                .with_child(echo([Expr::ident("x")])),
        ))
        .with_child(call("m"))
        .with_child(echo([Expr::ident("x")]));

    let nodes = run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: 2\nECHO: 1\n");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "m");
    assert!(nodes[0].is_empty());
}

#[test]
fn test_default_argument_binds() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_module(ModuleDef::new(
            "box",
            vec![Parameter::with_default("n", Expr::number(1.0))],
            Scope::new(),
        ))
        .with_child(call("box"));

    let nodes = run(&mut ev, scope);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind, NodeKind::Group);
    assert_eq!(nodes[0].attributes, vec![("n".to_string(), n(1.0))]);
    assert!(nodes[0].is_empty());
    assert!(codes(&ev).is_empty());
}

#[test]
fn test_default_argument_sees_defining_frame() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_assignment("k", Expr::number(5.0))
        .with_module(ModuleDef::new(
            "m",
            vec![Parameter::with_default("a", Expr::ident("k"))],
            Scope::new(),
        ))
        .with_module(ModuleDef::new(
            "wrap",
            vec![],
            Scope::new()
                .with_assignment("k", Expr::number(9.0))
                .with_child(call("m")),
        ))
        .with_child(call("wrap"));

    let nodes = run(&mut ev, scope);
    assert_eq!(nodes[0].children[0].attribute("a"), Some(&n(5.0)));
}

#[test]
fn test_arguments_positional_then_named() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_module(ModuleDef::new(
            "m",
            vec![Parameter::required("a"), Parameter::required("b")],
            Scope::new(),
        ))
        .with_child(
            call("m")
                .with_named_arg("a", Expr::number(1.0))
                .with_arg(Expr::number(2.0)),
        )
        .with_child(
            call("m")
                .with_arg(Expr::number(1.0))
                .with_arg(Expr::number(2.0))
                .with_arg(Expr::number(3.0))
                .with_named_arg("c", Expr::number(4.0)),
        );

    let nodes = run(&mut ev, scope);
    // The named `a` overrides the positional value that filled it.
    assert_eq!(nodes[0].attribute("a"), Some(&n(1.0)));
    assert_eq!(nodes[0].attribute("b"), Some(&Value::Undefined));
    assert_eq!(nodes[1].attribute("b"), Some(&n(2.0)));
    assert_eq!(codes(&ev), vec![ErrorCode::E6005, ErrorCode::E6006]);
    let messages: Vec<_> = ev.diagnostics().map(|d| d.message.clone()).collect();
    assert_eq!(
        messages,
        vec![
            "Too many unnamed arguments supplied to 'm'".to_string(),
            "Variable 'c' not specified as parameter of 'm'".to_string(),
        ]
    );
}

#[test]
fn test_special_variables_are_dynamic() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_module(ModuleDef::new("m", vec![], Scope::new().with_child(call("sphere"))))
        .with_child(call("m").with_named_arg("$fn", Expr::number(8.0)))
        .with_child(call("sphere"));

    let nodes = run(&mut ev, scope);
    let inner = &nodes[0].children[0];
    assert_eq!(inner.name, "sphere");
    assert_eq!(inner.kind, NodeKind::Builtin);
    assert_eq!(inner.attribute("$fn"), Some(&n(8.0)));
    assert_eq!(nodes[1].attribute("$fn"), Some(&n(0.0)));
    assert_eq!(nodes[1].attribute("$fa"), Some(&n(12.0)));
    // `$fn` passed to `m` is not a parameter of `m`.
    assert!(nodes[0].attributes.is_empty());
}

#[test]
fn test_special_assignment_reaches_callees() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_module(ModuleDef::new("m", vec![], Scope::new().with_child(call("circle"))))
        .with_module(ModuleDef::new(
            "outer",
            vec![],
            Scope::new()
                .with_assignment("$fs", Expr::number(0.5))
                .with_child(call("m")),
        ))
        .with_child(call("outer"));

    let nodes = run(&mut ev, scope);
    let circle = &nodes[0].children[0].children[0];
    assert_eq!(circle.attribute("$fs"), Some(&n(0.5)));
}

fn children_module(body: InstantiationRequest) -> Scope {
    Scope::new()
        .with_module(ModuleDef::new("m", vec![], Scope::new().with_child(body)))
        .with_child(
            call("m")
                .with_child(call("cube"))
                .with_child(call("sphere"))
                .with_child(call("cylinder")),
        )
}

fn names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|node| node.name.as_str()).collect()
}

#[test]
fn test_children_all() {
    let mut ev = evaluator();
    let nodes = run(&mut ev, children_module(call("children")));
    let selected = &nodes[0].children[0];
    assert_eq!(selected.name, "children");
    assert_eq!(names(&selected.children), vec!["cube", "sphere", "cylinder"]);
}

#[test]
fn test_children_by_index_and_vector() {
    let mut ev = evaluator();
    let nodes = run(&mut ev, children_module(call("children").with_arg(Expr::number(1.0))));
    assert_eq!(names(&nodes[0].children[0].children), vec!["sphere"]);

    let picks = Expr::vector(vec![Expr::number(2.0), Expr::number(0.0)]);
    let nodes = run(&mut ev, children_module(call("children").with_arg(picks)));
    assert_eq!(names(&nodes[0].children[0].children), vec!["cylinder", "cube"]);

    let range = Expr::range(Expr::number(1.0), None, Expr::number(2.0));
    let nodes = run(&mut ev, children_module(call("children").with_arg(range)));
    assert_eq!(names(&nodes[0].children[0].children), vec!["sphere", "cylinder"]);
    assert!(codes(&ev).is_empty());
}

#[test]
fn test_children_out_of_bounds_and_bad_type() {
    let mut ev = evaluator();
    let nodes = run(&mut ev, children_module(call("children").with_arg(Expr::number(5.0))));
    assert!(nodes[0].children[0].is_empty());
    let diag = ev.diagnostics().next().unwrap();
    assert_eq!(diag.code, ErrorCode::E6008);
    assert_eq!(diag.message, "Children index (5) out of bounds (3 children)");

    let mut ev = evaluator();
    let nodes = run(&mut ev, children_module(call("children").with_arg(Expr::string("x"))));
    assert!(nodes[0].is_empty());
    assert_eq!(codes(&ev), vec![ErrorCode::E6009]);
}

#[test]
fn test_children_outside_module_is_nothing() {
    let mut ev = evaluator();
    let nodes = run(&mut ev, Scope::new().with_child(call("children")));
    assert!(nodes.is_empty());
    assert!(codes(&ev).is_empty());
}

#[test]
fn test_children_count_is_lexical() {
    let (mut ev, out) = echoing();
    let scope = Scope::new()
        .with_module(ModuleDef::new(
            "m",
            vec![],
            Scope::new().with_child(echo([Expr::ident("$children")])),
        ))
        .with_child(call("m").with_child(call("cube")).with_child(call("cube")))
        .with_child(call("m"));
    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: 2\nECHO: 0\n");
}

#[test]
fn test_children_evaluate_in_caller_frame() {
    let (mut ev, out) = echoing();
    let scope = Scope::new()
        .with_assignment("x", Expr::string("caller"))
        .with_module(ModuleDef::new(
            "m",
            vec![],
            Scope::new()
                .with_assignment("x", Expr::string("module"))
                .with_child(call("children")),
        ))
        .with_child(call("m").with_child(echo([Expr::ident("x")])));
    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: \"caller\"\n");
}

#[test]
fn test_for_over_range() {
    let mut ev = evaluator();
    let offset = Expr::vector(vec![Expr::ident("i"), Expr::number(0.0), Expr::number(0.0)]);
    let scope = Scope::new().with_child(
        call("for")
            .with_named_arg("i", Expr::range(Expr::number(0.0), None, Expr::number(2.0)))
            .with_child(call("translate").with_arg(offset).with_child(call("cube"))),
    );

    let nodes = run(&mut ev, scope);
    let for_node = &nodes[0];
    assert_eq!(for_node.name, "for");
    let offsets: Vec<_> = for_node
        .children
        .iter()
        .map(|t| t.attribute("v").cloned())
        .collect();
    assert_eq!(
        offsets,
        vec![
            Some(Value::vector([n(0.0), n(0.0), n(0.0)])),
            Some(Value::vector([n(1.0), n(0.0), n(0.0)])),
            Some(Value::vector([n(2.0), n(0.0), n(0.0)])),
        ]
    );
    assert_eq!(names(&for_node.children[0].children), vec!["cube"]);
}

#[test]
fn test_for_nested_variables() {
    let (mut ev, out) = echoing();
    let scope = Scope::new().with_child(
        call("for")
            .with_named_arg("i", Expr::vector(vec![Expr::number(1.0), Expr::number(2.0)]))
            .with_named_arg("j", Expr::vector(vec![Expr::ident("i")]))
            .with_child(echo([Expr::ident("i"), Expr::ident("j")])),
    );
    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: 1, 1\nECHO: 2, 2\n");
}

#[test]
fn test_for_scalars_strings_and_undef() {
    let (mut ev, out) = echoing();
    let scope = Scope::new()
        .with_child(
            call("for")
                .with_named_arg("c", Expr::string("ab"))
                .with_child(echo([Expr::ident("c")])),
        )
        .with_child(
            call("for")
                .with_named_arg("x", Expr::number(7.0))
                .with_child(echo([Expr::ident("x")])),
        )
        .with_child(
            call("for")
                .with_named_arg("u", Expr::undef())
                .with_child(echo([Expr::ident("u")])),
        );
    let nodes = run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: \"a\"\nECHO: \"b\"\nECHO: 7\n");
    assert_eq!(nodes.len(), 3);
}

#[test]
fn test_for_rejects_huge_range() {
    let mut ev = evaluator();
    let scope = Scope::new().with_child(
        call("for")
            .with_named_arg("i", Expr::range(Expr::number(0.0), None, Expr::number(1e7)))
            .with_child(call("cube")),
    );
    let nodes = run(&mut ev, scope);
    assert!(nodes[0].is_empty());
    let diag = ev.diagnostics().next().unwrap();
    assert_eq!(
        diag.message,
        "Bad range parameter in for statement: too many elements (10000001)"
    );
}

#[test]
fn test_intersection_for_groups_iterations() {
    let mut ev = evaluator();
    let scope = Scope::new().with_child(
        call("intersection_for")
            .with_named_arg("i", Expr::vector(vec![Expr::number(1.0), Expr::number(2.0)]))
            .with_child(call("cube"))
            .with_child(call("sphere")),
    );
    let nodes = run(&mut ev, scope);
    let node = &nodes[0];
    assert_eq!(node.kind, NodeKind::Builtin);
    assert_eq!(node.name, "intersection_for");
    assert_eq!(names(&node.children), vec!["group", "group"]);
    assert_eq!(names(&node.children[1].children), vec!["cube", "sphere"]);
}

#[test]
fn test_if_else() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_child(InstantiationRequest::if_else(
            Expr::bool(true),
            Scope::new().with_child(call("cube")),
            Some(Scope::new().with_child(call("sphere"))),
        ))
        .with_child(InstantiationRequest::if_else(
            Expr::number(0.0),
            Scope::new().with_child(call("cube")),
            Some(Scope::new().with_child(call("sphere"))),
        ))
        .with_child(InstantiationRequest::if_else(
            Expr::bool(false),
            Scope::new().with_child(call("cube")),
            None,
        ));

    let nodes = run(&mut ev, scope);
    assert_eq!(names(&nodes), vec!["if", "if"]);
    assert_eq!(names(&nodes[0].children), vec!["cube"]);
    assert_eq!(names(&nodes[1].children), vec!["sphere"]);
}

#[test]
fn test_let_binds_sequentially() {
    let (mut ev, out) = echoing();
    let scope = Scope::new().with_child(
        call("let")
            .with_named_arg("a", Expr::number(2.0))
            .with_named_arg(
                "b",
                Expr::binary(BinaryOp::Mul, Expr::ident("a"), Expr::number(3.0)),
            )
            .with_child(echo([Expr::ident("b")])),
    );
    let nodes = run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: 6\n");
    assert_eq!(nodes[0].name, "let");
}

#[test]
fn test_echo_formats_arguments() {
    let (mut ev, out) = echoing();
    let scope = Scope::new().with_child(
        echo([Expr::string("s")]).with_named_arg(
            "v",
            Expr::vector(vec![Expr::number(1.0), Expr::number(0.5)]),
        ),
    );
    let nodes = run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: \"s\", v = [1, 0.5]\n");
    assert!(nodes.is_empty());

    out.clear();
    let nodes = run(&mut ev, Scope::new().with_child(call("echo").with_child(call("cube"))));
    assert_eq!(out.get_output(), "ECHO: \n");
    assert_eq!(names(&nodes), vec!["echo"]);
}

#[test]
fn test_assert() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_child(
            call("assert")
                .with_arg(Expr::bool(false))
                .with_arg(Expr::string("boom")),
        )
        .with_child(call("assert").with_named_arg("condition", Expr::number(0.0)))
        .with_child(call("assert").with_arg(Expr::bool(true)).with_child(call("cube")));

    let nodes = run(&mut ev, scope);
    assert_eq!(names(&nodes), vec!["assert"]);
    let messages: Vec<_> = ev.diagnostics().map(|d| d.message.clone()).collect();
    assert_eq!(
        messages,
        vec![
            "Assertion failed: boom".to_string(),
            "Assertion failed".to_string()
        ]
    );
    assert_eq!(codes(&ev), vec![ErrorCode::E6007, ErrorCode::E6007]);
}

#[test]
fn test_repeated_warning_reported_per_iteration() {
    let (mut ev, out) = echoing();
    let range = Expr::range(Expr::number(1.0), None, Expr::number(3.0));
    let scope = Scope::new().with_child(
        call("for")
            .with_named_arg("i", range)
            .with_child(echo([Expr::ident("missing")])),
    );

    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: undef\nECHO: undef\nECHO: undef\n");
    assert_eq!(codes(&ev), vec![ErrorCode::E6001; 3]);
}

#[test]
fn test_unknown_names_warn_and_continue() {
    let (mut ev, out) = echoing();
    let scope = Scope::new()
        .with_child(call("nope"))
        .with_child(echo([Expr::ident("missing")]))
        .with_child(echo([Expr::call("gone", Vec::<Argument>::new())]))
        .with_child(call("cube"));

    let nodes = run(&mut ev, scope);
    assert_eq!(names(&nodes), vec!["cube"]);
    assert_eq!(out.get_output(), "ECHO: undef\nECHO: undef\n");
    assert_eq!(codes(&ev), vec![ErrorCode::E6003, ErrorCode::E6001, ErrorCode::E6002]);
    let messages: Vec<_> = ev.diagnostics().map(|d| d.message.clone()).collect();
    assert_eq!(messages[0], "Ignoring unknown module 'nope'");
    assert_eq!(messages[1], "Ignoring unknown variable 'missing'");
    assert_eq!(messages[2], "Ignoring unknown function 'gone'");
}

#[test]
fn test_is_undef_does_not_warn() {
    let (mut ev, out) = echoing();
    let scope = Scope::new().with_child(echo([Expr::call(
        "is_undef",
        [Argument::positional(Expr::ident("missing"))],
    )]));
    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: true\n");
    assert!(codes(&ev).is_empty());
}

#[test]
fn test_hard_warnings_abort() {
    let mut ev = Evaluator::builder(config().with_hard_warnings(true)).build();
    let root = ev.root_frame();
    let request = call("group")
        .with_child(call("nope"))
        .with_child(call("cube"));

    let err = ev.instantiate(&root, &request).unwrap_err();
    assert_eq!(err.diagnostic().map(|d| d.code), Some(ErrorCode::E6003));
    assert_eq!(codes(&ev), vec![ErrorCode::E6003]);
}

#[test]
fn test_tags_carry_to_nodes() {
    let mut ev = evaluator();
    let scope = Scope::new().with_child(call("cube").with_tags(Tags::HIGHLIGHT));
    let nodes = run(&mut ev, scope);
    assert_eq!(nodes[0].tags, Tags::HIGHLIGHT);
}

fn runaway_module() -> ModuleDef {
    let next = Expr::binary(BinaryOp::Add, Expr::ident("n"), Expr::number(1.0));
    ModuleDef::new(
        "m",
        vec![Parameter::required("n")],
        Scope::new().with_child(call("m").with_arg(next)),
    )
}

fn bounded() -> Evaluator<'static> {
    Evaluator::builder(config().with_max_recursion_depth(Some(50))).build()
}

#[test]
fn test_module_recursion_reports_once() {
    let mut ev = bounded();
    let scope = Scope::new()
        .with_module(runaway_module())
        .with_child(call("m").with_arg(Expr::number(0.0)))
        .with_child(call("cube"));

    let nodes = run(&mut ev, scope);
    assert_eq!(names(&nodes), vec!["cube"]);
    let diags: Vec<_> = ev.diagnostics().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E6004);
    assert_eq!(diags[0].message, "Recursion detected calling module 'm'");
    assert_eq!(diags[0].notes, vec!["call chain: m (x51)".to_string()]);
    assert_eq!(ev.counters().max_call_depth, 50);
}

#[test]
fn test_mutual_recursion_reports_outermost() {
    let mut ev = bounded();
    let scope = Scope::new()
        .with_module(ModuleDef::new("a", vec![], Scope::new().with_child(call("b"))))
        .with_module(ModuleDef::new("b", vec![], Scope::new().with_child(call("a"))))
        .with_child(call("a"))
        .with_child(call("a"));

    let nodes = run(&mut ev, scope);
    assert!(nodes.is_empty());
    let diags: Vec<_> = ev.diagnostics().collect();
    // Two sibling calls, each aborted and reported on its own.
    assert_eq!(diags.len(), 2);
    let chain: Vec<&str> = (0..51).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
    for diag in diags {
        assert_eq!(diag.message, "Recursion detected calling module 'a'");
        assert_eq!(diag.notes, vec![format!("call chain: {}", chain.join(" -> "))]);
    }
}

#[test]
fn test_function_recursion() {
    let (mut ev, out) = echoing();
    let mut ev_bounded = Evaluator::builder(config().with_max_recursion_depth(Some(50)))
        .print_handler(out.clone())
        .build();
    let runaway = FunctionDef::new(
        "f",
        vec![Parameter::required("n")],
        Expr::call(
            "f",
            [Argument::positional(Expr::binary(
                BinaryOp::Add,
                Expr::ident("n"),
                Expr::number(1.0),
            ))],
        ),
    );
    let scope = Scope::new()
        .with_function(runaway)
        .with_child(echo([Expr::call("f", [Argument::positional(Expr::number(0.0))])]));
    run(&mut ev_bounded, scope);
    assert_eq!(out.get_output(), "ECHO: undef\n");
    let diags: Vec<_> = ev_bounded.diagnostics().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "Recursion detected calling function 'f'");

    // A recursion that terminates is unaffected.
    out.clear();
    let n_le_1 = Expr::binary(BinaryOp::LtEq, Expr::ident("n"), Expr::number(1.0));
    let recurse = Expr::binary(
        BinaryOp::Mul,
        Expr::ident("n"),
        Expr::call(
            "fact",
            [Argument::positional(Expr::binary(
                BinaryOp::Sub,
                Expr::ident("n"),
                Expr::number(1.0),
            ))],
        ),
    );
    let fact = FunctionDef::new(
        "fact",
        vec![Parameter::required("n")],
        Expr::ternary(n_le_1, Expr::number(1.0), recurse),
    );
    let scope = Scope::new()
        .with_function(fact)
        .with_child(echo([Expr::call("fact", [Argument::positional(Expr::number(5.0))])]));
    run(&mut ev, scope);
    assert_eq!(out.get_output(), "ECHO: 120\n");
    assert!(codes(&ev).is_empty());
}

#[test]
fn test_stack_guard_stops_unbounded_recursion() {
    let handle = std::thread::Builder::new()
        .stack_size(16 * 1024 * 1024)
        .spawn(|| {
            let mut ev = evaluator();
            let scope = Scope::new()
                .with_module(runaway_module())
                .with_child(call("m").with_arg(Expr::number(0.0)))
                .with_child(call("sphere"));
            let nodes = run(&mut ev, scope);
            let recursion: Vec<_> = ev
                .diagnostics()
                .filter(|d| d.code == ErrorCode::E6004)
                .map(|d| d.message.clone())
                .collect();
            (names(&nodes).join(","), recursion, ev.counters().max_call_depth)
        })
        .unwrap();
    let (nodes, recursion, depth) = handle.join().unwrap();
    assert_eq!(nodes, "sphere");
    assert_eq!(recursion, vec!["Recursion detected calling module 'm'".to_string()]);
    assert!(depth > 10);
}

#[test]
fn test_counters_track_work() {
    let mut ev = evaluator();
    let scope = Scope::new()
        .with_module(ModuleDef::new("m", vec![], Scope::new().with_child(call("cube"))))
        .with_child(call("m"))
        .with_child(call("m"));
    run(&mut ev, scope);
    let counters = ev.counters();
    // group + 2 × (m + cube)
    assert_eq!(counters.module_instantiations, 5);
    assert_eq!(counters.max_call_depth, 1);
    assert!(counters.frames_created >= 5);
}

#[test]
fn test_used_unit_modules_resolve() {
    let fs = MemoryFileSystem::new();
    fs.write("/p/lib.scad", "module thing { cube(); }\nsize = 3;");
    fs.write("/p/main.scad", "use <lib.scad>\nthing();\nnope();");
    let mut cache = UnitCache::new(fs.clone(), LineParser, SearchPath::default());
    let unit = cache
        .load_root(Path::new("/p/main.scad"))
        .unwrap()
        .unit
        .unwrap();

    let mut ev = Evaluator::builder(config()).units(&cache).build();
    let tree = ev.instantiate_unit(&unit).unwrap();
    assert_eq!(names(&tree.children), vec!["thing"]);
    assert_eq!(names(&tree.children[0].children), vec!["cube"]);

    let diag = ev.diagnostics().next().unwrap();
    assert_eq!(diag.code, ErrorCode::E6003);
    assert_eq!(diag.file.as_deref(), Some(Path::new("/p/main.scad")));
}

#[test]
fn test_units_using_each_other() {
    let fs = MemoryFileSystem::new();
    fs.write("/p/a.scad", "use <b.scad>\nmodule ma { cube(); }\nmb();");
    fs.write("/p/b.scad", "use <a.scad>\nmodule mb { ma(); }");
    let mut cache = UnitCache::new(fs.clone(), LineParser, SearchPath::default());
    let unit = cache
        .load_root(Path::new("/p/a.scad"))
        .unwrap()
        .unit
        .unwrap();
    assert!(cache.take_diagnostics().is_empty());

    let mut ev = Evaluator::builder(config()).units(&cache).build();
    let tree = ev.instantiate_unit(&unit).unwrap();
    assert_eq!(names(&tree.children), vec!["mb"]);
    assert_eq!(names(&tree.children[0].children), vec!["ma"]);
    assert_eq!(names(&tree.children[0].children[0].children), vec!["cube"]);
    assert_eq!(ev.diagnostics().count(), 0);

    // `a` is the root and also used by `b`: one frame serves both.
    let frame = ev.file_frame(&unit).unwrap();
    assert!(frame.ptr_eq(&ev.file_frame(&unit).unwrap()));
}

#[test]
fn test_used_unit_variables_stay_private() {
    let fs = MemoryFileSystem::new();
    fs.write("/p/lib.scad", "size = 3;");
    fs.write("/p/main.scad", "use <lib.scad>\ncopy = size;");
    let mut cache = UnitCache::new(fs.clone(), LineParser, SearchPath::default());
    let unit = cache
        .load_root(Path::new("/p/main.scad"))
        .unwrap()
        .unit
        .unwrap();

    let mut ev = Evaluator::builder(config()).units(&cache).build();
    let frame = ev.file_frame(&unit).unwrap();
    assert_eq!(frame.lookup_local("copy"), Some(Value::Undefined));
    assert_eq!(codes(&ev), vec![ErrorCode::E6001]);

    // Built once per session.
    let again = ev.file_frame(&unit).unwrap();
    assert!(again.ptr_eq(&frame));
}
