use std::cell::RefCell;
use std::rc::Rc;

use rox::error::RunError;
use rox::interpreter::Interpreter;

fn run(source: &str) -> Result<Vec<String>, RunError> {
    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&output);
    let mut interpreter =
        Interpreter::new().with_output(move |value| sink.borrow_mut().push(value.to_string()));

    interpreter.run(source)?;

    let lines = output.borrow().clone();
    Ok(lines)
}

fn printed(source: &str) -> Vec<String> {
    run(source).unwrap_or_else(|e| panic!("program failed: {}", e))
}

fn runtime_message(source: &str) -> String {
    match run(source) {
        Err(RunError::Runtime(e)) => e.to_string(),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn classes_and_instances_display() {
    assert_eq!(
        printed("class Bagel {} print Bagel; print Bagel();"),
        vec!["Bagel", "Bagel instance"]
    );
}

#[test]
fn fields_are_created_on_assignment() {
    let output = printed(
        r#"
        class Box {}
        var b = Box();
        b.content = "cake";
        print b.content;
        b.content = b.content + "!";
        print b.content;
        "#,
    );

    assert_eq!(output, vec!["cake", "cake!"]);
}

#[test]
fn methods_see_this() {
    let output = printed(
        r#"
        class Person {
          init(name) { this.name = name; }
          greet(other) { print "hi " + other + ", I am " + this.name; }
        }
        Person("ada").greet("bob");
        "#,
    );

    assert_eq!(output, vec!["hi bob, I am ada"]);
}

#[test]
fn bound_methods_remember_their_instance() {
    let output = printed(
        r#"
        class Counter {
          init() { this.n = 0; }
          bump() { this.n = this.n + 1; return this.n; }
        }
        var c = Counter();
        var bump = c.bump;
        bump();
        bump();
        print c.n;
        print bump;
        "#,
    );

    assert_eq!(output, vec!["2.0", "<fn bump>"]);
}

#[test]
fn fields_shadow_methods() {
    let output = printed(
        r#"
        class A { m() { return "method"; } }
        var a = A();
        print a.m();
        a.m = fun () { return "field"; };
        print a.m();
        "#,
    );

    assert_eq!(output, vec!["method", "field"]);
}

#[test]
fn initializer_returns_the_instance() {
    let output = printed(
        r#"
        class Point {
          init(x, y) {
            this.x = x;
            this.y = y;
            return;
          }
        }
        var p = Point(1, 2);
        print p.x + p.y;
        print p.init(5, 6);
        print p.x;
        "#,
    );

    assert_eq!(output, vec!["3.0", "Point instance", "5.0"]);
}

#[test]
fn class_arity_comes_from_init() {
    assert_eq!(
        runtime_message("class P { init(a) {} }\nP();"),
        "[line 2] Runtime error: Expected 1 arguments but got 0."
    );
    assert_eq!(
        runtime_message("class Q {}\nQ(1);"),
        "[line 2] Runtime error: Expected 0 arguments but got 1."
    );
}

#[test]
fn property_errors() {
    assert_eq!(
        runtime_message("class A {}\nA().missing;"),
        "[line 2] Runtime error: Undefined property 'missing'."
    );
    assert_eq!(
        runtime_message("var x = 1;\nx.y;"),
        "[line 2] Runtime error: Only instances have properties."
    );
    assert_eq!(
        runtime_message("\"s\".y = 1;"),
        "[line 1] Runtime error: Only instances have fields."
    );
}

#[test]
fn instances_compare_by_identity() {
    let output = printed(
        r#"
        class A {}
        var a = A();
        var b = a;
        print a == b;
        print a == A();
        print A == A;
        "#,
    );

    assert_eq!(output, vec!["true", "false", "true"]);
}

#[test]
fn methods_capture_the_class_scope() {
    let output = printed(
        r#"
        fun make(greeting) {
          class Greeter {
            say(name) { return greeting + ", " + name; }
          }
          return Greeter();
        }
        print make("hello").say("world");
        "#,
    );

    assert_eq!(output, vec!["hello, world"]);
}
