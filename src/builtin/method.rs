use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::{MethodObjRef, Value};

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.method;
    eval.add_builtin_method(class, "call", Arity::at_least(0), call);
    eval.add_builtin_method(class, "arity", Arity::exact(0), arity);
    eval.add_builtin_method(class, "name", Arity::exact(0), name);
    eval.add_builtin_method(class, "owner", Arity::exact(0), owner);
    eval.add_builtin_method(class, "receiver", Arity::exact(0), receiver);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
}

fn method_obj(self_val: &Value) -> Result<MethodObjRef, RubyError> {
    self_val
        .as_method()
        .cloned()
        .ok_or_else(|| RubyError::internal("receiver is not a Method"))
}

fn call(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let method = method_obj(&self_val)?;
    eval.call_method_obj(&method, args)
}

fn arity(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let method = method_obj(&self_val)?;
    let arity = method.borrow().method.arity();
    Ok(Value::Integer(arity.to_i()))
}

fn name(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Symbol(method_obj(&self_val)?.borrow().name))
}

fn owner(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Class(method_obj(&self_val)?.borrow().owner))
}

fn receiver(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(method_obj(&self_val)?.borrow().receiver.clone())
}

/// `#<Method: Foo#bar>`
fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let method = method_obj(&self_val)?;
    let (owner, name) = {
        let info = method.borrow();
        (info.owner, info.name)
    };
    let s = format!(
        "#<Method: {}#{}>",
        eval.provider.name(owner),
        eval.get_ident_name(name)
    );
    Ok(eval.new_string(s))
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;

    #[test]
    fn method_object() {
        let program = r##"
            class Foo
              def bar(a, b = 2)
                a + b
              end
              def baz(x)
                x
              end
            end
            foo = Foo.new
            m = foo.method(:bar)
            assert(3, m.call(1))
            assert(11, m.call(1, 10))
            assert(-2, m.arity)
            assert(1, foo.method(:baz).arity)
            assert(:bar, m.name)
            assert(Foo, m.owner)
            assert(true, m.receiver.equal?(foo))
            assert("#<Method: Foo#bar>", m.inspect)
            assert(Object, foo.method(:inspect).owner)
            assert(Method, m.class)
        "##;
        assert_script(program);
        assert_error("1.method(:wiggle)", RuntimeErrKind::Name);
        assert_error("2.method(:+).call", RuntimeErrKind::Argument);
    }
}
