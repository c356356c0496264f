#![allow(clippy::unwrap_used)]

use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;
use scad_ir::Location;

#[test]
fn test_render_with_file_and_line() {
    let diag = Diagnostic::warning(ErrorCode::E6003)
        .with_message("Ignoring unknown module 'cub'")
        .with_file("/models/a.scad")
        .at(Location::new(3, 1));
    assert_eq!(
        render(&diag),
        "WARNING: Ignoring unknown module 'cub' in file /models/a.scad, line 3"
    );
}

#[test]
fn test_render_without_position() {
    let diag = Diagnostic::error(ErrorCode::E1003).with_message("Parse error");
    assert_eq!(render(&diag), "ERROR: Parse error");

    let diag = diag.at(Location::new(8, 2));
    assert_eq!(render(&diag), "ERROR: Parse error, line 8");

    let diag = Diagnostic::warning(ErrorCode::E1001)
        .with_message("Can't open library 'x.scad'")
        .with_file("/a.scad");
    assert_eq!(
        render(&diag),
        "WARNING: Can't open library 'x.scad' in file /a.scad"
    );
}

#[test]
fn test_render_notes() {
    let diag = Diagnostic::warning(ErrorCode::E6004)
        .with_message("Recursion detected calling module 'm'")
        .with_note("call chain: m -> m");
    assert_eq!(
        render(&diag),
        "WARNING: Recursion detected calling module 'm'\n    call chain: m -> m"
    );
    assert_eq!(diag.to_string(), render(&diag));
}

#[test]
fn test_text_emitter_writes_lines_and_summary() {
    let mut emitter = TextEmitter::new(Vec::new());
    emitter.emit_all(&[
        Diagnostic::warning(ErrorCode::E6001).with_message("a"),
        Diagnostic::warning(ErrorCode::E6001).with_message("b"),
    ]);
    emitter.emit_summary(0, 2);
    emitter.flush();
    let out = String::from_utf8(emitter.into_inner()).unwrap();
    assert_eq!(out, "WARNING: a\nWARNING: b\nWARNING: 0 errors, 2 warnings\n");
}

#[test]
fn test_empty_summary_is_silent() {
    let mut emitter = TextEmitter::new(Vec::new());
    emitter.emit_summary(0, 0);
    assert!(emitter.into_inner().is_empty());
}
