//! End-to-end tests driving the compiled binary directly, grounded on the
//! black-box CLI test style used elsewhere in the retrieved example pack
//! (`assert_cmd`/`predicates`/`tempfile` over a fixture file on disk).
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn loxide() -> Command {
    Command::cargo_bin("loxide").expect("loxide binary should build")
}

fn script_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp script file");
    write!(file, "{source}").expect("failed to write temp script file");
    file
}

#[test]
fn prints_arithmetic_result() {
    let file = script_file("print 1 + 2;");

    loxide()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn block_scoped_variable_shadows_outer() {
    let file = script_file(
        r#"
        var a = "outer";
        {
            var a = "inner";
            print a;
        }
        print a;
        "#,
    );

    loxide()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("inner").and(predicate::str::contains("outer")));
}

#[test]
fn closure_captures_shared_variable() {
    let file = script_file(
        r#"
        fun makeCounter() {
            var i = 0;
            fun counter() {
                i = i + 1;
                return i;
            }
            return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        "#,
    );

    loxide()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1").and(predicate::str::contains("2")));
}

#[test]
fn class_init_method_and_this() {
    let file = script_file(
        r#"
        class Greeter {
            init(name) {
                this.name = name;
            }
            greet() {
                return "hi " + this.name;
            }
        }
        var g = Greeter("world");
        print g.greet();
        "#,
    );

    loxide()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("hi world"));
}

#[test]
fn uninitialized_variable_prints_nil() {
    let file = script_file("var x; print x;");

    loxide()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nil"));
}

#[test]
fn adding_number_and_string_is_a_runtime_error() {
    let file = script_file(r#"print 1 + "a";"#);

    loxide()
        .arg(file.path())
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains("Operands must be two numbers or two strings."));
}

#[test]
fn top_level_return_is_a_resolve_error() {
    let file = script_file("return 1;");

    loxide()
        .arg(file.path())
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains("can't return from top-level code."));
}

#[test]
fn self_referential_initializer_is_a_resolve_error() {
    let file = script_file("{ var a = a; }");

    loxide()
        .arg(file.path())
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains("can't read local variable in its own initializer."));
}

#[test]
fn too_many_arguments_is_a_usage_error() {
    let first = script_file("print 1;");
    let second = script_file("print 2;");

    loxide()
        .arg(first.path())
        .arg(second.path())
        .assert()
        .failure()
        .code(64)
        .stdout(predicate::str::contains("Usage: loxide [script]"));
}
