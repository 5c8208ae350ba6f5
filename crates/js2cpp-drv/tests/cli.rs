//! End-to-end CLI tests.
//!
//! These drive the `js2cpp` binary the way a user would: sources written
//! into a temp directory, exit codes and stderr checked, emitted `.cpp`
//! files inspected.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn js2cpp_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_js2cpp"))
}

fn write_source(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).expect("failed to write source fixture");
    path
}

fn read_output(source: &Path) -> String {
    let out = source.with_extension("cpp");
    fs::read_to_string(&out).expect("emitted .cpp missing")
}

#[test]
fn test_no_arguments_is_exit_2() {
    let mut cmd = Command::new(js2cpp_bin());
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("no source files"));
}

#[test]
fn test_unknown_option_is_exit_1() {
    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg("-O2");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("argument error"));

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg("/help").arg("a.js");
    cmd.assert().code(1);
}

#[test]
fn test_missing_source_is_exit_3() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("not_there.js");

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg(&missing);
    cmd.assert().code(3);
}

#[test]
fn test_successful_translation() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "hello.js", "var x = 1;\nalert(x);\n");

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg(&source);
    cmd.assert()
        .code(0)
        .stdout(predicate::str::contains("js2cpp v"))
        .stderr(predicate::str::contains("hello.js - 0 error(s)"));

    let out = read_output(&source);
    assert!(out.contains("int jsmain_(...)"));
    assert!(out.contains("value_ x;"));
    assert!(out.contains("(alert).toFunc()->call(global_,1,x);"));
}

#[test]
fn test_output_lands_beside_input() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "unit.js", "var a;\n");

    Command::new(js2cpp_bin()).arg(&source).assert().code(0);
    assert!(temp.path().join("unit.cpp").exists());
}

#[test]
fn test_compile_error_is_exit_21() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "broken.js", "var x = ;\n");

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg(&source);
    cmd.assert()
        .code(21)
        .stderr(predicate::str::contains("error 2001"))
        .stderr(predicate::str::contains("broken.js("));
}

#[test]
fn test_lexical_error_is_exit_21() {
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "lexbad.js", "var s = \"unterminated;\n");

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg(&source);
    cmd.assert()
        .code(21)
        .stderr(predicate::str::contains("error 1002"));
}

#[test]
fn test_multiple_sources_each_get_an_output() {
    let temp = TempDir::new().unwrap();
    let first = write_source(&temp, "one.js", "var a = 1;\n");
    let second = write_source(&temp, "two.js", "var b = 2;\n");

    let mut cmd = Command::new(js2cpp_bin());
    cmd.arg(&first).arg(&second);
    cmd.assert().code(0);

    assert!(temp.path().join("one.cpp").exists());
    assert!(temp.path().join("two.cpp").exists());
}

#[test]
fn test_closure_program_end_to_end() {
    let temp = TempDir::new().unwrap();
    let source = write_source(
        &temp,
        "closure.js",
        "function outer(){ var c=0; function inner(){ c = c+1; return c; } return inner(); }\nouter();\n",
    );

    Command::new(js2cpp_bin()).arg(&source).assert().code(0);

    let out = read_output(&source);
    assert!(out.contains("outer_locals_& locals_ = *(new outer_locals_);"));
    assert!(out.contains("class inner_foc_ : public func_ {"));
    assert!(out.contains("outer_locals_& nlng1_;"));
    assert!(out.contains("(outer).toFunc()->call(global_,0);"));
}

#[test]
fn test_factorial_program_end_to_end() {
    let temp = TempDir::new().unwrap();
    let source = write_source(
        &temp,
        "fact.js",
        "function f(n){ if (n<2) return 1; return n*f(n-1); }\nf(5);\n",
    );

    Command::new(js2cpp_bin()).arg(&source).assert().code(0);

    let out = read_output(&source);
    assert!(out.contains("class f_foc_ : public func_ {"));
    assert!(out.contains("class f_locals_ {"));
    assert!(out.contains("value_ n;"));
    assert!(out.contains("(f).toFunc()->call(global_,1,value_(5));"));
}

#[test]
fn test_asi_example_translates() {
    // statements separated only by line breaks are accepted
    let temp = TempDir::new().unwrap();
    let source = write_source(&temp, "asi.js", "var a = 1\nvar b = 2\na = a + b\n");

    Command::new(js2cpp_bin()).arg(&source).assert().code(0);
}
