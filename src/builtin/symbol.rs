use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::util::IdentId;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.symbol;
    eval.add_builtin_method(class, "to_s", Arity::exact(0), tos);
    eval.add_builtin_method(class, "to_sym", Arity::exact(0), to_sym);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
}

fn receiver(self_val: &Value) -> Result<IdentId, RubyError> {
    self_val
        .as_symbol()
        .ok_or_else(|| RubyError::internal("receiver is not a Symbol"))
}

fn tos(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let id = receiver(&self_val)?;
    let name = eval.get_ident_name(id).to_string();
    Ok(eval.new_string(name))
}

fn to_sym(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(self_val)
}

fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let id = receiver(&self_val)?;
    let name = format!(":{}", eval.get_ident_name(id));
    Ok(eval.new_string(name))
}

#[cfg(test)]
mod tests {
    use crate::test::*;

    #[test]
    fn symbol() {
        let program = r#"
            assert("foo", :foo.to_s)
            assert(":foo", :foo.inspect)
            assert(:foo, :foo.to_sym)
            assert(true, :foo == :foo)
            assert(false, :foo == :bar)
            assert(true, :foo.equal?("foo".to_sym))
            assert(Symbol, :a.class)
        "#;
        assert_script(program);
        assert_output("p :sym", ":sym\n");
    }
}
