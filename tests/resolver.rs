use std::cell::RefCell;
use std::rc::Rc;

use rox::error::{LoxError, RunError};
use rox::interpreter::Interpreter;

fn capturing() -> (Interpreter, Rc<RefCell<Vec<String>>>) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&output);
    let interpreter =
        Interpreter::new().with_output(move |value| sink.borrow_mut().push(value.to_string()));

    (interpreter, output)
}

fn resolve_error(source: &str) -> LoxError {
    let (mut interpreter, output) = capturing();

    match interpreter.run(source) {
        Err(RunError::Resolve(e)) => {
            assert!(output.borrow().is_empty(), "nothing may run after a resolve error");
            e
        }
        other => panic!("expected a resolve error, got {:?}", other),
    }
}

#[test]
fn reading_a_local_in_its_own_initializer() {
    let err = resolve_error("print 1;\n{\n  var a = a;\n}");

    assert_eq!(err.line(), Some(3));
    assert_eq!(
        err.to_string(),
        "[line 3] Error: Can't read local variable in its own initializer."
    );
}

#[test]
fn global_self_reference_is_left_to_runtime() {
    let (mut interpreter, _) = capturing();

    assert!(matches!(
        interpreter.run("var a = a;"),
        Err(RunError::Runtime(LoxError::Runtime { .. }))
    ));
}

#[test]
fn return_at_top_level() {
    let err = resolve_error("return 1;");

    assert_eq!(err.to_string(), "[line 1] Error: Can't return from top-level code.");
}

#[test]
fn return_inside_functions_is_fine() {
    let (mut interpreter, output) = capturing();

    interpreter
        .run("fun f() { return 1; } var g = fun () { return 2; }; print f() + g();")
        .unwrap();

    assert_eq!(*output.borrow(), vec!["3.0"]);
}

#[test]
fn this_outside_a_class() {
    let err = resolve_error("fun f() { return this; }");

    assert_eq!(err.to_string(), "[line 1] Error: Can't use 'this' outside of a class.");
}

#[test]
fn closures_keep_their_static_binding() {
    let (mut interpreter, output) = capturing();

    interpreter
        .run(
            r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
            "#,
        )
        .unwrap();

    assert_eq!(*output.borrow(), vec!["global", "global"]);
}

#[test]
fn redeclaring_a_local_is_allowed() {
    let (mut interpreter, output) = capturing();

    interpreter.run("{ var a = 1; var a = 2; print a; }").unwrap();

    assert_eq!(*output.borrow(), vec!["2.0"]);
}

#[test]
fn resolve_errors_keep_the_exit_code_of_syntax_errors() {
    let (mut interpreter, _) = capturing();
    let err = interpreter.run("return;").unwrap_err();

    assert_eq!(err.exit_code(), 65);
    assert_eq!(err.errors().len(), 1);
}
