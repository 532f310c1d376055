// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn run(source: &str) -> (InterpretResult, String) {
    let mut vm = Vm::new();
    let mut out = Vec::new();
    let result = vm.interpret(source, &mut out);
    (result, String::from_utf8(out).expect("vm output is always valid UTF-8"))
}

#[test]
fn prints_arithmetic_result() {
    let (result, out) = run("print 1 + 2 * 3;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "7\n");
}

#[test]
fn string_concatenation() {
    let (result, out) = run(r#"print "foo" + "bar";"#);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "foobar\n");
}

#[test]
fn globals_and_assignment() {
    let (result, out) = run("var a = 1; a = a + 1; print a;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "2\n");
}

#[test]
fn undefined_global_is_a_runtime_error() {
    let (result, _out) = run("print nope;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn assigning_to_an_undefined_global_is_a_runtime_error() {
    let (result, _out) = run("nope = 1;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn if_else_branches() {
    let (result, out) = run("if (1 < 2) print \"yes\"; else print \"no\";");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "yes\n");
}

#[test]
fn while_loop() {
    let (result, out) = run("var i = 0; while (i < 3) { print i; i = i + 1; }");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop() {
    let (result, out) = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn function_call_and_return() {
    let (result, out) = run("fun add(a, b) { return a + b; } print add(1, 2);");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "3\n");
}

#[test]
fn calling_with_wrong_arity_is_a_runtime_error() {
    let (result, _out) = run("fun add(a, b) { return a + b; } add(1);");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn closures_capture_enclosing_locals() {
    let source = "
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        print counter();
    ";
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn classes_fields_and_methods() {
    let source = "
        class Counter {
            init() {
                this.count = 0;
            }
            increment() {
                this.count = this.count + 1;
                return this.count;
            }
        }
        var c = Counter();
        print c.increment();
        print c.increment();
    ";
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "1\n2\n");
}

#[test]
fn bound_methods_keep_their_receiver() {
    let source = "
        class Greeter {
            init(name) {
                this.name = name;
            }
            greet() {
                return this.name;
            }
        }
        var method = Greeter(\"Ada\").greet;
        print method();
    ";
    let (result, out) = run(source);
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "Ada\n");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    let (result, _out) = run("var x = 1; x();");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn accessing_a_property_on_a_non_instance_is_a_runtime_error() {
    let (result, _out) = run("var x = 1; print x.foo;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn undefined_property_is_a_runtime_error() {
    let (result, _out) = run("class Foo {} var f = Foo(); print f.bar;");
    assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn compile_error_does_not_run_the_vm() {
    let (result, out) = run("1 +;");
    assert_eq!(result, InterpretResult::CompileError);
    assert!(out.is_empty());
}

#[test]
fn runtime_error_resets_the_stack() {
    let mut vm = Vm::new();
    let mut out = Vec::new();
    assert_eq!(vm.interpret("1 + \"a\";", &mut out), InterpretResult::RuntimeError);
    assert_eq!(vm.interpret("print 42;", &mut out), InterpretResult::Ok);
    assert_eq!(String::from_utf8(out).unwrap(), "42\n");
}

#[test]
fn gc_stress_does_not_change_program_output() {
    unsafe {
        std::env::set_var("LOXVM_GC_STRESS", "1");
    }
    let source = "
        class Node {
            init(value) {
                this.value = value;
            }
        }
        fun build(n) {
            var node = Node(n);
            var s = \"x\";
            for (var i = 0; i < 50; i = i + 1) s = s + \"x\";
            return node.value;
        }
        print build(7);
    ";
    let (result, out) = run(source);
    unsafe {
        std::env::remove_var("LOXVM_GC_STRESS");
    }
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "7\n");
}

#[test]
fn logical_and_or_short_circuit() {
    let (result, out) = run("print false and (1/0); print true or (1/0);");
    assert_eq!(result, InterpretResult::Ok);
    assert_eq!(out, "false\ntrue\n");
}
