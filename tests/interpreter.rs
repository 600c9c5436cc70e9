use std::cell::RefCell;
use std::rc::Rc;

use rox::error::{LoxError, RunError};
use rox::interpreter::Interpreter;
use rox::token::Token;
use rox::token::TokenType;
use rox::value::Value;

fn capturing() -> (Interpreter, Rc<RefCell<Vec<String>>>) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&output);
    let interpreter =
        Interpreter::new().with_output(move |value| sink.borrow_mut().push(value.to_string()));

    (interpreter, output)
}

/// Run a program and return everything it printed.
fn printed(source: &str) -> Vec<String> {
    let (mut interpreter, output) = capturing();

    if let Err(e) = interpreter.run(source) {
        panic!("program failed: {}", e);
    }

    let lines = output.borrow().clone();
    lines
}

fn runtime_error(source: &str) -> LoxError {
    let (mut interpreter, _) = capturing();

    match interpreter.run(source) {
        Err(RunError::Runtime(e)) => e,
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

fn evaluate(source: &str) -> String {
    Interpreter::new()
        .run_expression(source)
        .unwrap_or_else(|e| panic!("failed to evaluate {:?}: {}", source, e))
        .to_string()
}

#[test]
fn arithmetic_and_concatenation() {
    assert_eq!(evaluate("5 + 6"), "11.0");
    assert_eq!(evaluate("\"Hello\" + \"World\""), "HelloWorld");
    assert_eq!(evaluate("5 + \"john\""), "5.0john");
    assert_eq!(evaluate("\"n: \" + nil"), "n: nil");
    assert_eq!(evaluate("10 / 4"), "2.5");
    assert_eq!(evaluate("-(3 - 5) * 2"), "4.0");
    assert_eq!(evaluate("1 / 0"), "Infinity");
    assert_eq!(evaluate("-1 / 0"), "-Infinity");
    assert_eq!(evaluate("0 / 0"), "NaN");
}

#[test]
fn comparison_and_equality() {
    assert_eq!(evaluate("1 < 2"), "true");
    assert_eq!(evaluate("2 <= 1"), "false");
    assert_eq!(evaluate("\"a\" == \"a\""), "true");
    assert_eq!(evaluate("1 == \"1\""), "false");
    assert_eq!(evaluate("nil == false"), "false");
    assert_eq!(evaluate("nil != nil"), "false");
}

#[test]
fn truthiness_and_logic() {
    assert_eq!(evaluate("!nil"), "true");
    assert_eq!(evaluate("!\"\""), "true");
    assert_eq!(evaluate("!0"), "true");
    assert_eq!(evaluate("!\"x\""), "false");
    assert_eq!(evaluate("1 and \"\""), "false");
    assert_eq!(evaluate("nil or 2"), "true");
    assert_eq!(evaluate("false and undefined"), "false");
    assert_eq!(evaluate("true or undefined"), "true");
}

#[test]
fn ternary_evaluates_one_branch() {
    assert_eq!(evaluate("true ? 1 : 2"), "1.0");
    assert_eq!(evaluate("false ? 1 : 2"), "2.0");
    assert_eq!(evaluate("true ? 1 : undefined"), "1.0");
    assert_eq!(evaluate("0 ? 1 : 2 ? 3 : 4"), "3.0");
}

#[test]
fn comma_yields_the_last_value() {
    assert_eq!(
        printed("var a = 0; var b = (a = 1, a + 1); print a; print b;"),
        vec!["1.0", "2.0"]
    );
}

#[test]
fn numbers_print_with_a_fraction() {
    assert_eq!(printed("print 3;"), vec!["3.0"]);
    assert_eq!(printed("print 15.28;"), vec!["15.28"]);
    assert_eq!(printed("print -0;"), vec!["-0.0"]);
    assert_eq!(printed("print 1000000000000000;"), vec!["1000000000000000.0"]);
}

#[test]
fn nested_block_shadowing() {
    let output = printed(
        r#"
        var a = "global a";
        var b = "global b";
        var c = "global c";
        {
          var a = "outer a";
          var b = "outer b";
          {
            var a = "inner a";
            print a;
            print b;
            print c;
          }
          print a;
          print b;
          print c;
        }
        print a;
        print b;
        print c;
        "#,
    );

    assert_eq!(
        output,
        vec![
            "inner a", "outer b", "global c", "outer a", "outer b", "global c", "global a",
            "global b", "global c",
        ]
    );
}

#[test]
fn control_flow() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        vec!["0.0", "1.0", "2.0"]
    );
    assert_eq!(
        printed("var i = 3; while (i > 0) { print i; i = i - 1; }"),
        vec!["3.0", "2.0", "1.0"]
    );
    assert_eq!(
        printed("if (nil) print \"then\"; else print \"else\";"),
        vec!["else"]
    );
}

#[test]
fn counter_closure() {
    let output = printed(
        r#"
        fun makeCounter() {
          var i = 0;
          fun count() {
            i = i + 1;
            print i;
          }
          return count;
        }
        var counter = makeCounter();
        counter();
        counter();
        "#,
    );

    assert_eq!(output, vec!["1.0", "2.0"]);
}

#[test]
fn recursion_and_early_return() {
    let output = printed(
        r#"
        fun fib(n) {
          if (n < 2) return n;
          return fib(n - 1) + fib(n - 2);
        }
        print fib(10);

        fun firstOver(limit) {
          for (var i = 0; ; i = i + 1) {
            if (i * i > limit) return i;
          }
        }
        print firstOver(50);
        "#,
    );

    assert_eq!(output, vec!["55.0", "8.0"]);
}

#[test]
fn anonymous_functions_are_values() {
    let output = printed(
        r#"
        fun apply(f, x) { return f(x); }
        print apply(fun (n) { return n * 2; }, 21);
        var noop = fun () {};
        print noop();
        print noop;
        "#,
    );

    assert_eq!(output, vec!["42.0", "nil", "<fn anonymous>"]);
}

#[test]
fn callables_display() {
    assert_eq!(printed("fun f() {} print f; print clock;"), vec!["<fn f>", "<native fn clock>"]);
}

#[test]
fn clock_returns_seconds() {
    let (mut interpreter, _) = capturing();
    let value = interpreter.run("clock();").unwrap();

    match value {
        Value::Number(seconds) => assert!(seconds > 1_600_000_000.0),
        other => panic!("clock returned {:?}", other),
    }
}

#[test]
fn arity_mismatch() {
    let err = runtime_error("fun f(a, b) {}\nf(1);");

    assert_eq!(err.to_string(), "[line 2] Runtime error: Expected 2 arguments but got 1.");
}

#[test]
fn calling_a_non_callable() {
    let err = runtime_error("\"not a function\"();");

    assert_eq!(err.to_string(), "[line 1] Runtime error: Can only call functions and classes.");
}

#[test]
fn operand_type_errors() {
    assert!(runtime_error("-\"x\";")
        .to_string()
        .contains("Operand must be a number."));
    assert!(runtime_error("1 < \"x\";")
        .to_string()
        .contains("Operands must be numbers."));
    assert!(runtime_error("true + nil;")
        .to_string()
        .contains("Operands must be two numbers or at least one string."));
    assert!(runtime_error("if (clock) print 1;")
        .to_string()
        .contains("Cannot evaluate truthiness"));
}

#[test]
fn undefined_variables() {
    assert_eq!(
        runtime_error("print missing;").to_string(),
        "[line 1] Runtime error: Undefined variable 'missing'."
    );
    assert!(matches!(
        runtime_error("missing = 1;"),
        LoxError::Runtime { line: 1, .. }
    ));
}

#[test]
fn runtime_errors_keep_earlier_effects() {
    let (mut interpreter, output) = capturing();

    let err = interpreter
        .run("var a = 1; print a; a = 2; nil(); print \"unreached\";")
        .unwrap_err();

    assert_eq!(err.exit_code(), 70);
    assert_eq!(*output.borrow(), vec!["1.0"]);

    let a = interpreter
        .globals()
        .borrow()
        .get(&Token::simple(TokenType::IDENTIFIER, "a", 1))
        .unwrap();
    assert_eq!(a, Value::Number(2.0));
}

#[test]
fn syntax_errors_prevent_execution() {
    let (mut interpreter, output) = capturing();

    match interpreter.run("print 1;\nvar = 2;\nprint (3;") {
        Err(RunError::Syntax(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected syntax errors, got {:?}", other),
    }
    assert!(output.borrow().is_empty());

    match interpreter.run("print 1; @") {
        Err(RunError::Syntax(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], LoxError::Lex { .. }));
        }
        other => panic!("expected a scan error, got {:?}", other),
    }
    assert!(output.borrow().is_empty());
}

#[test]
fn run_returns_the_last_statement_value() {
    let (mut interpreter, _) = capturing();

    assert_eq!(interpreter.run("var x = 2; x * 21;").unwrap(), Value::Number(42.0));
    assert_eq!(interpreter.run("print 1;").unwrap(), Value::Nil);
}

#[test]
fn state_persists_across_runs() {
    let (mut interpreter, output) = capturing();

    interpreter.run("var total = 0; fun add(n) { total = total + n; }").unwrap();
    interpreter.run("add(2);").unwrap();
    interpreter.run("{ var local = 3; add(local); }").unwrap();
    interpreter.run("print total;").unwrap();

    assert_eq!(*output.borrow(), vec!["5.0"]);
}

#[test]
fn single_statement_entry_point() {
    let (mut interpreter, output) = capturing();

    interpreter.run_statement("var greeting = \"hi\";").unwrap();
    interpreter.run_statement("{ var x = \"!\"; print greeting + x; }").unwrap();
    assert_eq!(interpreter.run_statement("greeting;").unwrap(), Value::from("hi"));
    assert_eq!(interpreter.run_expression("greeting + greeting").unwrap(), Value::from("hihi"));

    assert_eq!(*output.borrow(), vec!["hi!"]);

    assert!(matches!(
        interpreter.run_statement("print 1; print 2;"),
        Err(LoxError::Parse { .. })
    ));
}

#[test]
fn declarations_from_single_statements_work_in_later_runs() {
    let (mut interpreter, output) = capturing();

    interpreter.run_statement("fun f(x) { return x + 1; }").unwrap();
    interpreter
        .run_statement("class A { get() { return this; } }")
        .unwrap();

    interpreter.run("print f(1);").unwrap();
    interpreter.run("print A().get();").unwrap();
    interpreter.run("var g = fun (y) { return f(y) * 2; }; print g(2);").unwrap();
    assert_eq!(interpreter.run_expression("g(3)").unwrap(), Value::Number(8.0));

    assert_eq!(*output.borrow(), vec!["2.0", "A instance", "6.0"]);
}
