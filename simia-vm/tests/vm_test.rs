// simia-vm - VM integration tests
// Copyright (c) 2025 The Simia Authors. MIT licensed.

mod common;
use common::*;

use simia_core::builtins::BUILTINS;
use simia_vm::{GLOBALS_SIZE, SymbolTable};

fn assert_runs(source: &str, expected: Value) {
    match run_vm(source) {
        Ok(value) => assert_eq!(value, expected, "running {:?}", source),
        Err(err) => panic!("vm error for {:?}: {}", source, err),
    }
}

fn assert_vm_err(source: &str, expected: &str) {
    match run_vm(source) {
        Ok(value) => panic!("expected error for {:?}, got {:?}", source, value),
        Err(err) => assert_eq!(err, expected, "running {:?}", source),
    }
}

#[test]
fn test_integer_arithmetic() {
    let cases = [
        ("1", 1),
        ("2", 2),
        ("1 + 2", 3),
        ("1 - 2", -1),
        ("1 * 2", 2),
        ("4 / 2", 2),
        ("7 / 2", 3),
        ("50 / 2 * 2 + 10 - 5", 55),
        ("5 * (2 + 10)", 60),
        ("-5", -5),
        ("-10", -10),
        ("-50 + 100 + -50", 0),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_boolean_expressions() {
    let cases = [
        ("true", true),
        ("false", false),
        ("1 < 2", true),
        ("1 > 2", false),
        ("1 < 1", false),
        ("1 > 1", false),
        ("1 == 1", true),
        ("1 != 1", false),
        ("1 == 2", false),
        ("1 != 2", true),
        ("true == true", true),
        ("false == false", true),
        ("true == false", false),
        ("true != false", true),
        ("(1 < 2) == true", true),
        ("(1 > 2) == true", false),
        ("!true", false),
        ("!false", true),
        ("!5", false),
        ("!!true", true),
        ("!!5", true),
        ("!(if (false) { 5; })", true),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Bool(expected));
    }
}

#[test]
fn test_conditionals() {
    let cases = [
        ("if (true) { 10 }", Value::Int(10)),
        ("if (true) { 10 } else { 20 }", Value::Int(10)),
        ("if (false) { 10 } else { 20 }", Value::Int(20)),
        // Only nil and false are falsy.
        ("if (1) { 10 }", Value::Int(10)),
        ("if (0) { 10 } else { 20 }", Value::Int(10)),
        ("if (1 < 2) { 10 }", Value::Int(10)),
        ("if (1 > 2) { 10 } else { 20 }", Value::Int(20)),
        ("if (1 > 2) { 10 }", Value::Nil),
        ("if (false) { 10 }", Value::Nil),
        ("if ((if (false) { 10 })) { 10 } else { 20 }", Value::Int(20)),
    ];
    for (input, expected) in cases {
        assert_runs(input, expected);
    }
}

#[test]
fn test_global_let_statements() {
    let cases = [
        ("let one = 1; one", 1),
        ("let one = 1; let two = 2; one + two", 3),
        ("let one = 1; let two = one + one; one + two", 3),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_string_expressions() {
    assert_runs(r#""simia""#, Value::string("simia"));
    assert_runs(r#""si" + "mia""#, Value::string("simia"));
    assert_runs(r#""si" + "mia" + "!""#, Value::string("simia!"));
}

#[test]
fn test_array_literals() {
    assert_runs("[]", Value::array([]));
    assert_runs(
        "[1, 2, 3]",
        Value::array([Value::Int(1), Value::Int(2), Value::Int(3)]),
    );
    assert_runs(
        "[1 + 2, 3 * 4, 5 + 6]",
        Value::array([Value::Int(3), Value::Int(12), Value::Int(11)]),
    );
}

#[test]
fn test_hash_literals() {
    assert_eq!(run_vm("{}").unwrap().inspect(), "{}");

    let result = run_vm(r#"{"one": 1, "two": 1 + 1, "thr" + "ee": 6 / 2}"#).unwrap();
    assert_eq!(result.inspect(), "{one: 1, three: 3, two: 2}");
}

#[test]
fn test_index_expressions() {
    let cases = [
        ("[1, 2, 3][1]", Value::Int(2)),
        ("[1, 2, 3][0 + 2]", Value::Int(3)),
        ("[[1, 1, 1]][0][0]", Value::Int(1)),
        ("[][0]", Value::Nil),
        ("[1, 2, 3][99]", Value::Nil),
        ("[1][-1]", Value::Nil),
        (r#"{"one": 1, "two": 2}["one"]"#, Value::Int(1)),
        (r#"{"one": 1}["two"]"#, Value::Nil),
        (r#"{}["foo"]"#, Value::Nil),
    ];
    for (input, expected) in cases {
        assert_runs(input, expected);
    }
}

#[test]
fn test_calling_functions_without_arguments() {
    let cases = [
        ("let fivePlusTen = fn() { 5 + 10; }; fivePlusTen();", 15),
        ("let one = fn() { 1; }; let two = fn() { 2; }; one() + two()", 3),
        ("let a = fn() { 1 }; let b = fn() { a() + 1 }; let c = fn() { b() + 1 }; c();", 3),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_functions_with_return_statements() {
    assert_runs("let earlyExit = fn() { return 99; 100; }; earlyExit();", Value::Int(99));
    assert_runs("let earlyExit = fn() { return 99; return 100; }; earlyExit();", Value::Int(99));
}

#[test]
fn test_functions_without_return_value() {
    assert_runs("let noReturn = fn() { }; noReturn();", Value::Nil);
    assert_runs(
        "let noReturn = fn() { }; let noReturnTwo = fn() { noReturn(); }; noReturn(); noReturnTwo();",
        Value::Nil,
    );
}

#[test]
fn test_first_class_functions() {
    assert_runs(
        "let returnsOne = fn() { 1; }; let returnsOneReturner = fn() { returnsOne; }; returnsOneReturner()();",
        Value::Int(1),
    );
}

#[test]
fn test_calling_functions_with_bindings() {
    let cases = [
        ("let one = fn() { let one = 1; one }; one();", 1),
        ("let oneAndTwo = fn() { let one = 1; let two = 2; one + two; }; oneAndTwo();", 3),
        (
            "let oneAndTwo = fn() { let one = 1; let two = 2; one + two; };
             let threeAndFour = fn() { let three = 3; let four = 4; three + four; };
             oneAndTwo() + threeAndFour();",
            10,
        ),
        (
            "let firstFoobar = fn() { let foobar = 50; foobar; };
             let secondFoobar = fn() { let foobar = 100; foobar; };
             firstFoobar() + secondFoobar();",
            150,
        ),
        (
            "let globalSeed = 50;
             let minusOne = fn() { let num = 1; globalSeed - num; };
             let minusTwo = fn() { let num = 2; globalSeed - num; };
             minusOne() + minusTwo();",
            97,
        ),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_calling_functions_with_arguments() {
    let cases = [
        ("let identity = fn(a) { a; }; identity(4);", 4),
        ("let sum = fn(a, b) { a + b; }; sum(1, 2);", 3),
        ("let sum = fn(a, b) { let c = a + b; c; }; sum(1, 2);", 3),
        ("let sum = fn(a, b) { let c = a + b; c; }; sum(1, 2) + sum(3, 4);", 10),
        (
            "let sum = fn(a, b) { let c = a + b; c; }; let outer = fn() { sum(1, 2) + sum(3, 4); }; outer();",
            10,
        ),
        (
            "let globalNum = 10;
             let sum = fn(a, b) { let c = a + b; c + globalNum; };
             let outer = fn() { sum(1, 2) + sum(3, 4) + globalNum; };
             outer() + globalNum;",
            50,
        ),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_calling_with_wrong_arity() {
    assert_vm_err(
        "fn() { 1; }(1);",
        "wrong number of arguments: want=0, got=1",
    );
    assert_vm_err(
        "fn(a) { a; }();",
        "wrong number of arguments: want=1, got=0",
    );
    assert_vm_err(
        "fn(a, b) { a + b; }(1);",
        "wrong number of arguments: want=2, got=1",
    );
}

#[test]
fn test_closures() {
    let cases = [
        ("let newClosure = fn(a) { fn() { a; }; }; let closure = newClosure(99); closure();", 99),
        (
            "let newAdder = fn(a, b) { fn(c) { a + b + c }; }; let adder = newAdder(1, 2); adder(8);",
            11,
        ),
        (
            "let newAdder = fn(a, b) { let c = a + b; fn(d) { c + d }; }; let adder = newAdder(1, 2); adder(8);",
            11,
        ),
        (
            "let newAdderOuter = fn(a, b) { let c = a + b; fn(d) { let e = d + c; fn(f) { e + f; }; }; };
             let newAdderInner = newAdderOuter(1, 2);
             let adder = newAdderInner(3);
             adder(8);",
            14,
        ),
        (
            "let a = 1; let newAdderOuter = fn(b) { fn(c) { fn(d) { a + b + c + d }; }; };
             let newAdderInner = newAdderOuter(2);
             let adder = newAdderInner(3);
             adder(8);",
            14,
        ),
        (
            "let newClosure = fn(a, b) { let one = fn() { a; }; let two = fn() { b; }; fn() { one() + two(); }; };
             let closure = newClosure(9, 90);
             closure();",
            99,
        ),
    ];
    for (input, expected) in cases {
        assert_runs(input, Value::Int(expected));
    }
}

#[test]
fn test_recursive_functions() {
    assert_runs(
        "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } }; countDown(1);",
        Value::Int(0),
    );
    assert_runs(
        "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
         let wrapper = fn() { countDown(1); };
         wrapper();",
        Value::Int(0),
    );
    assert_runs(
        "let wrapper = fn() {
             let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } };
             countDown(1);
         };
         wrapper();",
        Value::Int(0),
    );
}

#[test]
fn test_recursive_fibonacci() {
    assert_runs(
        "let fib = fn(n) { if (n < 2) { n } else { fib(n-1) + fib(n-2) } }; fib(10);",
        Value::Int(55),
    );
}

#[test]
fn test_let_shadows_function_self_reference() {
    // A regular let inside the body wins over the function-name entry.
    assert_runs("let foo = fn() { let foo = 1; foo }; foo();", Value::Int(1));
}

#[test]
fn test_builtin_functions() {
    assert_runs(r#"len("")"#, Value::Int(0));
    assert_runs(r#"len("four")"#, Value::Int(4));
    assert_runs("len([1, 2, 3])", Value::Int(3));
    assert_runs("len(append([1, 2], 3))", Value::Int(3));
    assert_runs("let a = [1, 2]; append(a, 3); len(a);", Value::Int(2));
    assert_runs("log(1)", Value::Nil);

    assert_vm_err("len(1)", "argument to `len` not supported, got INTEGER");
    assert_vm_err(r#"len("one", "two")"#, "wrong number of arguments. got=2, want=1");
    assert_vm_err("append(1, 2)", "argument to `append` must be ARRAY, got INTEGER");
}

#[test]
fn test_while_style_for_loops() {
    assert_runs("let x = 0; for (x < 5) { x = x + 1 }; x;", Value::Int(5));
    assert_runs("let x = 0; for (x < 3) { x = x + 1 }", Value::Nil);
    assert_runs(
        "let i = 0; let total = 0; for (i < 4) { total = total + i; i = i + 1 }; total;",
        Value::Int(6),
    );
}

#[test]
fn test_for_loops_inside_functions() {
    assert_runs(
        "let sumTo = fn(n) { let i = 0; let total = 0; for (i < n) { total = total + i; i = i + 1 }; total };
         sumTo(10);",
        Value::Int(45),
    );
}

#[test]
fn test_assignment() {
    assert_runs("let a = 1; a = a + 1; a;", Value::Int(2));
    // Assignments are expressions with value nil.
    assert_runs("let a = 1; a = 2;", Value::Nil);
    assert_runs(
        "let count = fn() { let n = 0; n = n + 1; n }; count();",
        Value::Int(1),
    );
}

#[test]
fn test_pipeline() {
    assert_runs("let add = fn(a, b) { a + b }; 3 |> add(7);", Value::Int(10));
    assert_runs("3 |> fn(a,b){a+b}(7);", Value::Int(10));
    assert_runs(
        "let inc = fn(x) { x + 1 }; let double = fn(x) { x * 2 }; 5 |> inc() |> double();",
        Value::Int(12),
    );
}

#[test]
fn test_runtime_errors() {
    assert_vm_err("5 + true;", "type mismatch: INTEGER + BOOLEAN");
    assert_vm_err("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN");
    assert_vm_err("-true", "unknown operator: -BOOLEAN");
    assert_vm_err("true + false;", "unknown operator: BOOLEAN + BOOLEAN");
    assert_vm_err(r#""a" - "b""#, "unknown operator: STRING - STRING");
    assert_vm_err("true > false", "unknown operator: BOOLEAN > BOOLEAN");
    assert_vm_err("1 == true", "type mismatch: INTEGER == BOOLEAN");
    assert_vm_err("5[0]", "index operator not supported: INTEGER");
    assert_vm_err(r#"{5: "five"}"#, "key is not string: INTEGER");
    assert_vm_err(r#"{"a": 1}[true]"#, "key is not string: BOOLEAN");
    assert_vm_err("1 / 0", "division by zero");
    assert_vm_err("let x = 5; x(1);", "calling non-function");
}

#[test]
fn test_unbounded_recursion_overflows() {
    assert_vm_err("let f = fn() { f(); }; f();", "stack overflow");
}

#[test]
fn test_top_level_return() {
    assert_runs("return 5;", Value::Int(5));
    assert_runs("return 2 * 5; 9;", Value::Int(10));
}

#[test]
fn test_repl_state_persists_across_lines() {
    // The REPL threads the symbol table, constants and globals through
    // consecutive compiler/VM instances.
    let mut symbols = SymbolTable::new();
    for (index, builtin) in BUILTINS.iter().enumerate() {
        symbols.define_builtin(index, builtin.name);
    }
    let mut constants: Vec<Value> = Vec::new();
    let mut globals = vec![Value::Nil; GLOBALS_SIZE];

    // `None` skips the output check (a bare let surfaces the bound value,
    // which for functions renders an unstable closure address).
    let lines: [(&str, Option<&str>); 4] = [
        ("let a = 10;", Some("10")),
        ("let double = fn(x) { x * 2 };", None),
        ("double(a) + 1", Some("21")),
        ("a = a + 1; a", Some("11")),
    ];

    for (line, expected) in lines {
        let mut compiler = Compiler::with_state(symbols, constants);
        compiler.compile(&parse(line)).expect("compile error");
        let bytecode = compiler.bytecode();
        (symbols, constants) = compiler.into_state();

        let mut vm = Vm::with_global_store(bytecode, globals);
        vm.run().expect("vm error");
        if let Some(expected) = expected {
            assert_eq!(vm.last_popped().inspect(), expected, "line {:?}", line);
        }
        globals = vm.into_globals();
    }
}
