use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::util::IdentId;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.exception;
    eval.add_builtin_method(class, "initialize", Arity::range(0, 1), initialize);
    eval.add_builtin_method(class, "message", Arity::exact(0), message);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), message);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
}

fn initialize(_: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    if let (Value::Object(obj), Some(msg)) = (&self_val, args.get(0)) {
        if !msg.is_nil() {
            obj.borrow_mut().ivars.insert(IdentId::MESSAGE, msg.clone());
        }
    }
    Ok(Value::Nil)
}

fn message(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let msg = eval.exception_message(&self_val);
    Ok(eval.new_string(msg))
}

/// `#<ArgumentError: bad value>`, or the bare class name without a message.
fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let class_name = eval.provider.class_name_of(&self_val);
    let msg = eval.exception_message(&self_val);
    let s = if msg.is_empty() || msg == class_name {
        class_name
    } else {
        format!("#<{}: {}>", class_name, msg)
    };
    Ok(eval.new_string(s))
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[test]
    fn exception_object() {
        let program = r##"
            e = ArgumentError.new("bad value")
            assert("bad value", e.message)
            assert("bad value", e.to_s)
            assert("#<ArgumentError: bad value>", e.inspect)
            assert("RuntimeError", RuntimeError.new.message)
            assert("RuntimeError", RuntimeError.new.inspect)
            assert(true, e.is_a?(StandardError))
            assert(true, NoMethodError.new.is_a?(NameError))
            assert(Exception, StandardError.superclass)
        "##;
        assert_script(program);
    }

    #[test]
    fn custom_exception() {
        let program = r#"
            class MyError < StandardError
              def initialize(code)
                super_msg = "code " + code.to_s
                @code = code
                @message = super_msg
              end
              def code
                @code
              end
            end
            result = begin
              raise MyError.new(42)
            rescue MyError => e
              [e.code, e.message]
            end
            assert([42, "code 42"], result)
        "#;
        assert_script(program);
        assert_raise("class MyError < StandardError; end; raise MyError, 'x'", "MyError");
    }
}
