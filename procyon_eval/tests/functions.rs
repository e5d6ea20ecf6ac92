mod common;

use common::*;
use procyon_eval::{Error, Value};

fn tail(source: &str, n: usize) -> Vec<Value> {
    let values = ev(source).unwrap();
    values[values.len() - n..].to_vec()
}

#[test]
fn calls_and_returns() {
    let prog = "func sqr(x) { return x*x; } sqr(-1); sqr(0); sqr(2); sqr(-4); sqr(10);";
    assert_eq!(tail(prog, 5), ints(&[1, 0, 4, 16, 100]));
    let prog = "func sqr(x) { return x*x } sqr(-1); sqr(0); sqr(2); sqr(-4); sqr(10)";
    assert_eq!(tail(prog, 5), ints(&[1, 0, 4, 16, 100]));
}

#[test]
fn argument_counts() {
    assert_eq!(last("func zero() { return 0; } zero();"), Value::Int(0));
    assert_eq!(last("func one(x) { return x; } one(1);"), Value::Int(1));
    assert_eq!(last("func two(x,y) { return x + y; } two(1,2);"), Value::Int(3));
    for prog in [
        "func one(x) { return x; } one();",
        "func one(x) { return x; } one(1,2);",
        "func one(x) { return x; } one(1,2,3);",
    ] {
        assert!(matches!(ev(prog), Err(Error::Type { .. })), "{prog}");
    }
}

#[test]
fn arity_is_checked_before_arguments() {
    let (mut interpreter, output) = interpreter();
    let result = interpreter.evaluate(
        "$n = 0; func one(x) { return x; } one($n = 5, print(\"side effect\"));",
        false,
    );
    assert!(matches!(result, Err(Error::Type { .. })));
    assert_eq!(interpreter.evaluate("$n", false).unwrap(), ints(&[0]));
    assert_eq!(output.contents(), "");
}

#[test]
fn void_return() {
    let prog = "
        x = 10;
        func noret(x) { x = x^2; return; }
        y = noret(x);
        x;
        y;
    ";
    assert_eq!(tail(prog, 3), vec![Value::None, Value::Int(10), Value::None]);
    assert_eq!(last("func f() { 1 + 1; } f();"), Value::None);
}

#[test]
fn calling_a_non_function() {
    assert!(matches!(ev("num = 10; num(123)"), Err(Error::Type { .. })));
}

#[test]
fn redefinition_overwrites() {
    assert_eq!(
        last("func f() { return 1; } func f() { return 2; } f();"),
        Value::Int(2)
    );
}

#[test]
fn functions_are_values() {
    assert_eq!(
        tail("func f(a, b) { return a - b; } g = f; g == f; g(5, 3);", 2),
        ints(&[1, 2])
    );
    assert_eq!(last("func f() { } !f"), Value::Int(0));
    assert!(matches!(ev("func f() { } f < f"), Err(Error::Type { .. })));

    let (result, printed) = ev_output("func add(a, b) { return a + b; } print(add);");
    result.unwrap();
    assert_eq!(printed, "func add(a, b)\n");
}

#[test]
fn nested_functions() {
    let prog = "
        func pow_3_2(x) {
            func pow_3(x) { return x^3; }
            func pow_1_2(x) { return x^(1/2); }
            return pow_1_2(pow_3(x));
        }
        abs(pow_3_2(1) - 1) < 1e-9;
        abs(pow_3_2(100) - 1000) < 1e-9;
        abs(pow_3_2(10000) - 1000000) < 1e-6;
    ";
    assert_eq!(tail(prog, 3), ints(&[1, 1, 1]));

    let prog = "
        func pow_3_2(x) {
            func pow_3(x) { return x^3; }
            return pow_3(x);
        }
        pow_3(10);
    ";
    assert!(matches!(ev(prog), Err(Error::Name { .. })));
}

#[test]
fn function_writes_stay_local() {
    let prog = "v = 10; func f() { v = 15; return v; } f(); v;";
    assert_eq!(tail(prog, 2), ints(&[15, 10]));
    let prog = "v = 10; func f() { a = 5; return a; } f(); v;";
    assert_eq!(tail(prog, 2), ints(&[5, 10]));
    let prog = "
        v = 10;
        func f(x) {
            b = 0;
            if x > 5 {
                v = 5;
                b = 1;
            } else {
                v = 7;
                b = 2;
            }
            return b;
        }
        f(6);
        v;
    ";
    assert_eq!(tail(prog, 2), ints(&[1, 10]));
}

#[test]
fn parameters_shadow_globals() {
    let prog = "
        x = 5;
        func test(x) {
            return x;
        }
        x;
        test(12);
        x;
    ";
    assert_eq!(tail(prog, 3), ints(&[5, 12, 5]));
}

#[test]
fn functions_read_globals() {
    assert_eq!(last("v = 3; func f() { return v * 2; } f();"), Value::Int(6));
}

#[test]
fn callers_locals_are_invisible() {
    let prog = "
        func inner() { return secret; }
        func outer() { secret = 1; return inner(); }
        outer();
    ";
    assert!(matches!(ev(prog), Err(Error::Name { .. })));
}

#[test]
fn global_sigil_reaches_root() {
    let prog = "
        func f() { $g = 1; h(); }
        func h() { $g += 41; }
        f();
        $g;
    ";
    assert_eq!(last(prog), Value::Int(42));

    let prog = "func f() { func $helper() { return 7; } } f(); $helper();";
    assert_eq!(last(prog), Value::Int(7));

    // `$v` and `v` are distinct names
    assert!(matches!(ev("v = 1; $v"), Err(Error::Name { .. })));
}

#[test]
fn blocks_share_the_enclosing_frame() {
    assert_eq!(last("if (5 > 4) { xyz = 10; } xyz;"), Value::Int(10));
    let prog = "
        func test(x, y) {
            if (x > y) {
                z = x*y;
            }
            else {
                z = x+y;
            }
            return z;
        }
        test(12, 4);
    ";
    assert_eq!(last(prog), Value::Int(48));
    let prog = "
        func sqr(x) { return x*x; }
        if sqr(10) == 100 {
            func p(x) { return x; }
        }
        p(50);
    ";
    assert_eq!(last(prog), Value::Int(50));
}

#[test]
fn if_statements() {
    assert_eq!(last("x = 0; y = 12; if y > 5 { x = 2; } x;"), Value::Int(2));
    assert_eq!(
        last("x = 0; y = 5; if y^2 - 5 > 22 { x = 2; } else { x = 1; } x;"),
        Value::Int(1)
    );
    let prog = "
        y = 0;
        if x = 2^3 > 7 {
            y = y + 1;
            if x {
                y = y + 1;
            }
            else {
                y = 100;
            }
        }
        else {
            y = 200;
        }
        y;
    ";
    assert_eq!(last(prog), Value::Int(2));
}

#[test]
fn else_if_chains() {
    let prog = "
        func sign(x) {
            if x < 0 {
                return -1;
            } else if x == 0 {
                return 0;
            } else {
                return 1;
            }
        }
        sign(-5); sign(0); sign(3);
    ";
    assert_eq!(tail(prog, 3), ints(&[-1, 0, 1]));
    let prog = "
        func grade(n) {
            if n >= 90 { return \"A\"; }
            else if n >= 80 { return \"B\"; }
            else if n >= 70 { return \"C\"; }
            return \"F\";
        }
        grade(95); grade(85); grade(75); grade(10);
    ";
    assert_eq!(
        tail(prog, 4),
        ["A", "B", "C", "F"].map(|s| Value::Str(s.to_string())).to_vec()
    );
}

#[test]
fn while_loops() {
    let prog = "
        i = 0;
        total = 0;
        while 1 {
            i += 1;
            if i > 9 { break; }
            if i % 2 == 0 { continue; }
            total += i;
        }
        total;
    ";
    assert_eq!(last(prog), Value::Int(25));

    let prog = "
        count = 0;
        i = 0;
        while i < 3 {
            j = 0;
            while 1 {
                j += 1;
                if j == 4 { break; }
                count += 1;
            }
            i += 1;
        }
        count;
    ";
    assert_eq!(last(prog), Value::Int(9));

    assert_eq!(ev("while 0 { 1; }").unwrap(), vec![Value::None]);
}

#[test]
fn return_from_inside_loop() {
    let prog = "
        func first_multiple(n, of) {
            while 1 {
                if n % of == 0 { return n; }
                n += 1;
            }
        }
        first_multiple(10, 7);
    ";
    assert_eq!(last(prog), Value::Int(14));
}

#[test]
fn compound_assignment() {
    assert_ints(
        "x = 10; x += 5; x -= 3; x *= 2; x //= 5; x ^= 2; x %= 7; x",
        &[10, 15, 12, 24, 4, 16, 2, 2],
    );
    assert_eq!(last("x = 1; x /= 4"), Value::Float(0.25));
}
