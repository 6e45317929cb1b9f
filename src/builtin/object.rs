use crate::builtin::{expect_class, expect_name};
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::util::IdentId;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let object = eval.classes.object;
    eval.add_builtin_method(object, "class", Arity::exact(0), class);
    eval.add_builtin_method(object, "inspect", Arity::exact(0), inspect);
    eval.add_builtin_method(object, "to_s", Arity::exact(0), to_s);
    eval.add_builtin_method(object, "nil?", Arity::exact(0), nil_);
    eval.add_builtin_method(object, "is_a?", Arity::exact(1), is_a);
    eval.add_builtin_method(object, "kind_of?", Arity::exact(1), is_a);
    eval.add_builtin_method(object, "instance_of?", Arity::exact(1), instance_of);
    eval.add_builtin_method(object, "respond_to?", Arity::exact(1), respond_to);
    eval.add_builtin_method(object, "object_id", Arity::exact(0), object_id);
    eval.add_builtin_method(object, "send", Arity::at_least(1), send);
    eval.add_builtin_method(object, "method", Arity::exact(1), method);
    eval.add_builtin_method(object, "instance_variable_get", Arity::exact(1), instance_variable_get);
    eval.add_builtin_method(object, "instance_variable_set", Arity::exact(2), instance_variable_set);
    eval.add_builtin_method(object, "instance_variables", Arity::exact(0), instance_variables);

    // Kernel functions
    eval.add_builtin_method(object, "puts", Arity::at_least(0), puts);
    eval.add_builtin_method(object, "print", Arity::at_least(0), print);
    eval.add_builtin_method(object, "p", Arity::at_least(0), p);
    eval.add_builtin_method(object, "raise", Arity::range(0, 2), raise);
    eval.add_builtin_method(object, "assert", Arity::exact(2), assert);
}

fn class(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Class(eval.class_of(&self_val)?))
}

fn to_s(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = eval.default_to_s(&self_val);
    Ok(eval.new_string(s))
}

/// `#<Foo @a=1, @b="x">`, instance variables in name order.
fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let obj = match &self_val {
        Value::Object(obj) if !self_val.identical(&eval.main_object) => obj.clone(),
        _ => return to_s(eval, self_val, &[]),
    };
    let mut ivars: Vec<(String, Value)> = obj
        .borrow()
        .ivars
        .iter()
        .map(|(id, val)| (eval.get_ident_name(*id).to_string(), val.clone()))
        .collect();
    ivars.sort_by(|a, b| a.0.cmp(&b.0));
    let class_name = eval.provider.class_name_of(&self_val);
    let mut s = format!("#<{}", class_name);
    for (i, (name, val)) in ivars.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        let val = eval.val_inspect(val)?;
        s += &format!(" {}={}", name, val);
    }
    s.push('>');
    Ok(eval.new_string(s))
}

fn nil_(_: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}

fn is_a(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = expect_class(eval, &args[0])?;
    Ok(Value::Bool(eval.is_a(&self_val, class)?))
}

fn instance_of(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = expect_class(eval, &args[0])?;
    Ok(Value::Bool(eval.class_of(&self_val)? == class))
}

fn respond_to(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let id = expect_name(eval, &args[0])?;
    Ok(Value::Bool(eval.find_method(&self_val, id)?.is_some()))
}

fn object_id(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Integer(self_val.object_id() as i64))
}

fn send(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let id = expect_name(eval, &args[0])?;
    eval.send(self_val, id, &args[1..])
}

fn method(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let id = expect_name(eval, &args[0])?;
    eval.new_method_object(self_val, id)
}

fn ivar_name(eval: &mut Evaluator, val: &Value) -> Result<IdentId, RubyError> {
    let id = expect_name(eval, val)?;
    if eval.get_ident_name(id).starts_with('@') {
        Ok(id)
    } else {
        Err(RubyError::name(format!(
            "'{}' is not allowed as an instance variable name",
            eval.get_ident_name(id)
        )))
    }
}

fn instance_variable_get(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let id = ivar_name(eval, &args[0])?;
    match &self_val {
        Value::Object(obj) => Ok(obj.borrow().ivars.get(&id).cloned().unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}

fn instance_variable_set(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let id = ivar_name(eval, &args[0])?;
    match &self_val {
        Value::Object(obj) => {
            obj.borrow_mut().ivars.insert(id, args[1].clone());
            Ok(args[1].clone())
        }
        _ => Err(RubyError::runtime(format!(
            "can't modify instance variable of {}",
            eval.describe(&self_val)
        ))),
    }
}

fn instance_variables(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let mut names: Vec<IdentId> = match &self_val {
        Value::Object(obj) => obj.borrow().ivars.keys().cloned().collect(),
        _ => vec![],
    };
    names.sort_by(|a, b| eval.get_ident_name(*a).cmp(eval.get_ident_name(*b)));
    let symbols = names.into_iter().map(Value::Symbol).collect();
    Ok(eval.new_array(symbols))
}

// Kernel functions

fn puts(eval: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    if args.is_empty() {
        eval.write_output(b"\n")?;
    }
    let mut visiting = vec![];
    for arg in args {
        puts_value(eval, arg, &mut visiting)?;
    }
    Ok(Value::Nil)
}

/// Arrays are printed one element per line. An array nested in itself
/// prints as `[...]`.
fn puts_value(eval: &mut Evaluator, val: &Value, visiting: &mut Vec<Value>) -> Result<(), RubyError> {
    if let Value::Array(array) = val {
        if visiting.iter().any(|outer| outer.identical(val)) {
            return eval.write_output(b"[...]\n");
        }
        let elements = array.borrow().elements.clone();
        if elements.is_empty() {
            return eval.write_output(b"\n");
        }
        visiting.push(val.clone());
        let res = elements
            .iter()
            .try_for_each(|elem| puts_value(eval, elem, visiting));
        visiting.pop();
        return res;
    }
    let mut s = eval.val_to_s(val)?;
    if !s.ends_with('\n') {
        s.push('\n');
    }
    eval.write_output(s.as_bytes())
}

fn print(eval: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    for arg in args {
        let s = eval.val_to_s(arg)?;
        eval.write_output(s.as_bytes())?;
    }
    Ok(Value::Nil)
}

fn p(eval: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    for arg in args {
        let s = eval.val_inspect(arg)? + "\n";
        eval.write_output(s.as_bytes())?;
    }
    Ok(match args.len() {
        0 => Value::Nil,
        1 => args[0].clone(),
        _ => eval.new_array(args.to_vec()),
    })
}

/// `raise`, `raise "msg"`, `raise Class`, `raise Class, "msg"`, `raise exception`.
fn raise(eval: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    let exception = match args {
        [] => eval.new_exception("RuntimeError", "unhandled exception")?,
        [Value::String(msg)] => {
            let msg = msg.borrow().string.clone();
            eval.new_exception("RuntimeError", msg)?
        }
        [Value::Class(class)] => eval.send(Value::Class(*class), IdentId::NEW, &[])?,
        [Value::Class(class), msg] => eval.send(Value::Class(*class), IdentId::NEW, &[msg.clone()])?,
        [obj] => obj.clone(),
        _ => return Err(RubyError::typeerr("exception class/object expected")),
    };
    if !eval.is_a(&exception, eval.classes.exception)? {
        return Err(RubyError::typeerr("exception class/object expected"));
    }
    Err(RubyError::raise(exception))
}

fn assert(eval: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    let res = eval.send(args[0].clone(), IdentId::_EQ, &args[1..])?;
    if res.to_bool() {
        Ok(Value::Nil)
    } else {
        Err(RubyError::runtime(format!(
            "assertion failed: expected {} but got {}",
            eval.val_inspect(&args[0])?,
            eval.val_inspect(&args[1])?
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;

    #[test]
    fn object_reflection() {
        let program = r#"
            class Foo
              def initialize
                @b = 2
                @a = "x"
              end
            end
            f = Foo.new
            assert(Foo, f.class)
            assert(true, f.is_a?(Object))
            assert(true, f.kind_of?(Foo))
            assert(false, f.instance_of?(Object))
            assert(true, f.respond_to?(:inspect))
            assert(false, f.respond_to?("wiggle"))
            assert([:@a, :@b], f.instance_variables)
            assert(2, f.instance_variable_get(:@b))
            f.instance_variable_set(:@c, 3)
            assert(3, f.instance_variable_get(:@c))
            assert('#<Foo @a="x", @b=2, @c=3>', f.inspect)
            assert(f.object_id, f.object_id)
            assert(false, f.nil?)
            assert(true, nil.nil?)
        "#;
        assert_script(program);
    }

    #[test]
    fn object_send() {
        let program = r#"
            assert(7, 3.send(:+, 4))
            assert("ab", "a".send("+", "b"))
            m = 5.method(:-)
            assert(3, m.call(2))
        "#;
        assert_script(program);
    }

    #[test]
    fn kernel_output() {
        assert_output("puts 'foo'", "foo\n");
        assert_output("puts 1, 2.5, nil, [3, [4]]", "1\n2.5\n\n3\n4\n");
        assert_output("print 'a', 1, :b", "a1b");
        assert_output("p 'a', :b, nil", "\"a\"\n:b\nnil\n");
        assert_output("puts", "\n");
        eval_script("p 5", crate::value::Value::Integer(5));
    }

    #[test]
    fn puts_recursive_array() {
        assert_output("a = [1]; a << a; puts a", "1\n[...]\n");
        assert_output("b = [2]; a = [1, b]; b << a; puts a", "1\n2\n[...]\n");
        assert_output("b = [2]; puts [b, b]", "2\n2\n");
    }

    #[test]
    fn kernel_raise() {
        assert_raise("raise", "RuntimeError");
        assert_raise("raise 'boom'", "RuntimeError");
        assert_raise("raise ArgumentError", "ArgumentError");
        assert_raise("raise TypeError, 'bad'", "TypeError");
        assert_error("raise 3", RuntimeErrKind::Type);
        assert_error("assert(1, 2)", RuntimeErrKind::Runtime);
        assert_error("1.instance_variable_get(:a)", RuntimeErrKind::Name);
    }
}
