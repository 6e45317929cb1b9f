extern crate rubytree;
use pretty_assertions::assert_eq;
use rubytree::node::Node;
use rubytree::test::*;
use rubytree::util::Loc;
use rubytree::*;

#[test]
fn puts_end_to_end() {
    // (call puts "foo") with a native `puts` bound in the top-level scope.
    let (mut eval, output) = buffered_evaluator();
    let puts = eval.get_ident_id("puts");
    let main = eval.main_object.clone();
    let method = eval.new_method_object(main.clone(), puts).unwrap();
    eval.top_scope.set(puts, method);

    let node = Node::new_send(
        None,
        puts,
        vec![Node::new_string("foo", Loc(5, 9))],
        Loc(0, 9),
    );
    assert_eq!("(call puts \"foo\")", node.dump(&eval.ident_table));
    let scope = eval.top_scope.clone();
    let res = eval.eval_node(&node, &scope, &main).unwrap();
    assert_eq!(Value::Nil, res);
    assert_eq!("foo\n", output.contents());
}

#[test]
fn puts_from_source() {
    let (mut eval, output) = buffered_evaluator();
    assert_eq!(Value::Nil, eval.run("puts 'foo'").unwrap());
    assert_eq!("foo\n", output.contents());
}

#[test]
fn unresolved_class() {
    let provider = ClassProvider::new();
    let err = provider.class_with_name("Frobnicate").unwrap_err();
    assert_eq!(Some(RuntimeErrKind::UnresolvedClass), err.runtime_kind());
    assert_error("Frobnicate.new", RuntimeErrKind::UnresolvedClass);
}

#[test]
fn missing_method() {
    assert_error("Object.new.wiggle", RuntimeErrKind::NoMethod);
    assert_error("class Foo; end; Foo.new.wiggle(1, 2)", RuntimeErrKind::NoMethod);
    assert_error("wiggle", RuntimeErrKind::Name);
    assert_error("wiggle()", RuntimeErrKind::NoMethod);

    let mut eval = Evaluator::new();
    let err = eval.run("Object.new.wiggle").unwrap_err();
    assert_eq!(
        "undefined method 'wiggle' for an instance of Object (NoMethodError)",
        eval.error_message(&err)
    );
}

#[test]
fn string_constructor_isolation() {
    let mut eval = Evaluator::new();
    let string = eval.provider.class_with_name("String").unwrap();
    let s1 = eval.provider.new_instance(string, &[]).unwrap();
    let s2 = eval.provider.new_instance(string, &[]).unwrap();
    assert!(!s1.identical(&s2));

    let append = eval.get_ident_id("<<");
    let x = eval.new_string("x");
    eval.send(s1.clone(), append, &[x]).unwrap();
    assert_eq!(Some("x".to_string()), s1.as_string());
    assert_eq!(Some("".to_string()), s2.as_string());
}

#[test]
fn string_concatenation() {
    let mut eval = Evaluator::new();
    let foo = eval.new_string("foo");
    let bar = eval.new_string("bar");
    let plus = eval.get_ident_id("+");
    let res = eval.send(foo.clone(), plus, &[bar.clone()]).unwrap();
    assert_eq!(Some("foobar".to_string()), res.as_string());
    assert_eq!(Some("foo".to_string()), foo.as_string());
    assert_eq!(Some("bar".to_string()), bar.as_string());

    let err = eval.send(foo, plus, &[Value::Integer(1)]).unwrap_err();
    assert_eq!(Some(RuntimeErrKind::Type), err.runtime_kind());
}

#[test]
fn override_and_fallback() {
    let mut eval = Evaluator::new();
    eval.run(
        r#"
        class A
          def m; "A"; end
        end
        class B < A
          def m; "B"; end
        end
        "#,
    )
    .unwrap();
    let b = eval.run("B.new.m").unwrap();
    assert_eq!(Some("B".to_string()), b.as_string());
    let a = eval.run("A.new.m").unwrap();
    assert_eq!(Some("A".to_string()), a.as_string());

    let class_b = eval.provider.class_with_name("B").unwrap();
    let m = eval.get_ident_id("m");
    assert!(eval.provider.get_mut(class_b).remove_instance_method(m).is_some());
    let b = eval.run("B.new.m").unwrap();
    assert_eq!(Some("A".to_string()), b.as_string());
}

#[test]
fn native_method_registration() {
    let mut eval = Evaluator::new();
    let integer = eval.classes.integer;
    eval.add_builtin_method(integer, "double", Arity::exact(0), |_, self_val, _| {
        match self_val {
            Value::Integer(i) => Ok(Value::Integer(i * 2)),
            _ => Ok(Value::Nil),
        }
    });
    assert_eq!(Value::Integer(42), eval.run("21.double").unwrap());
    let err = eval.run("21.double(1)").unwrap_err();
    assert_eq!(Some(RuntimeErrKind::Argument), err.runtime_kind());
}

#[test]
fn stack_overflow_is_an_error() {
    let mut eval = Evaluator::new();
    let err = eval.run("def f; f; end; f").unwrap_err();
    assert_eq!(Some(RuntimeErrKind::StackOverflow), err.runtime_kind());
    // The evaluator stays usable afterwards.
    assert_eq!(Value::Integer(2), eval.run("1 + 1").unwrap());
}

#[test]
fn deep_recursion_below_the_limit() {
    let program = r#"
        def depth(n)
          if n == 0
            0
          else
            depth(n - 1) + 1
          end
        end
        depth(150)
    "#;
    let mut eval = Evaluator::new();
    assert_eq!(Value::Integer(150), eval.run(program).unwrap());
    let err = eval.run("depth(1000)").unwrap_err();
    assert_eq!(Some(RuntimeErrKind::StackOverflow), err.runtime_kind());
}

#[test]
fn deeply_nested_expression() {
    let depth = 1000;
    let program = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let mut eval = Evaluator::new();
    assert_eq!(Value::Integer(1), eval.run(&program).unwrap());
}

#[test]
fn independent_evaluators() {
    let mut eval1 = Evaluator::new();
    let mut eval2 = Evaluator::new();
    eval1.run("class Foo; def hi; 1; end; end").unwrap();
    assert_eq!(Value::Integer(1), eval1.run("Foo.new.hi").unwrap());
    let err = eval2.run("Foo.new").unwrap_err();
    assert_eq!(Some(RuntimeErrKind::UnresolvedClass), err.runtime_kind());
}
