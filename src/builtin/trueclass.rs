use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.true_class;
    eval.add_builtin_method(class, "&", Arity::exact(1), and);
    eval.add_builtin_method(class, "|", Arity::exact(1), or);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), tos);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), tos);
}

fn and(_: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(args[0].to_bool()))
}

fn or(_: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(true))
}

fn tos(eval: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(eval.new_string("true"))
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[test]
    fn trueclass() {
        let program = r#"
            assert(true, true & 1)
            assert(false, true & nil)
            assert(true, true | false)
            assert("true", true.to_s)
            assert(TrueClass, true.class)
            assert(false, true.nil?)
        "#;
        assert_script(program);
    }
}
