use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::util::IdentId;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.basic_object;
    eval.add_builtin_method(class, "==", Arity::exact(1), eq);
    eval.add_builtin_method(class, "!=", Arity::exact(1), ne);
    eval.add_builtin_method(class, "!", Arity::exact(0), not);
    eval.add_builtin_method(class, "equal?", Arity::exact(1), eq);
    eval.add_builtin_method(class, "initialize", Arity::exact(0), initialize);
}

fn eq(_: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(self_val.identical(&args[0])))
}

/// `!=` negates `==` through dispatch, so redefining `==` is enough.
fn ne(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let res = eval.send(self_val, IdentId::_EQ, args)?;
    Ok(Value::Bool(!res.to_bool()))
}

fn not(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(!self_val.to_bool()))
}

fn initialize(_: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[test]
    fn basic_object() {
        let program = r#"
            class Foo
              def initialize(x)
                @x = x
              end
              def x
                @x
              end
              def ==(other)
                x == other.x
              end
            end
            a = Foo.new(1)
            b = Foo.new(1)
            assert(true, a == b)
            assert(false, a != b)
            assert(false, a.equal?(b))
            assert(true, a.equal?(a))
            assert(false, !a)
            assert(true, !nil)
        "#;
        assert_script(program);
    }
}
