use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.nil;
    eval.add_builtin_method(class, "&", Arity::exact(1), and);
    eval.add_builtin_method(class, "|", Arity::exact(1), or);
    eval.add_builtin_method(class, "nil?", Arity::exact(0), nil_);
    eval.add_builtin_method(class, "to_a", Arity::exact(0), toa);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), tos);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
}

// Instance methods

fn and(_: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(false))
}

fn or(_: &mut Evaluator, _: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Bool(args[0].to_bool()))
}

fn nil_(_: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(true))
}

fn toa(eval: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(eval.new_array(vec![]))
}

fn tos(eval: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(eval.new_string(""))
}

fn inspect(eval: &mut Evaluator, _: Value, _: &[Value]) -> EvalResult {
    Ok(eval.new_string("nil"))
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[test]
    fn nilclass() {
        let program = r#"
            assert(false, nil & true)
            assert(true, nil | 3)
            assert(false, nil | nil)
            assert(true, nil.nil?)
            assert([], nil.to_a)
            assert("", nil.to_s)
            assert("nil", nil.inspect)
            assert(NilClass, nil.class)
        "#;
        assert_script(program);
        assert_output("puts nil", "\n");
    }
}
