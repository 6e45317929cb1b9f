use crate::builtin::{add_numeric_comparisons, compare_numeric};
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::Value;
use divrem::{DivFloor, RemFloor};
use std::convert::TryFrom;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.integer;
    eval.add_builtin_method(class, "+", Arity::exact(1), add);
    eval.add_builtin_method(class, "-", Arity::exact(1), sub);
    eval.add_builtin_method(class, "*", Arity::exact(1), mul);
    eval.add_builtin_method(class, "/", Arity::exact(1), div);
    eval.add_builtin_method(class, "%", Arity::exact(1), rem);
    eval.add_builtin_method(class, "**", Arity::exact(1), pow);
    eval.add_builtin_method(class, "-@", Arity::exact(0), neg);
    add_numeric_comparisons(eval, class);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), tos);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), tos);
    eval.add_builtin_method(class, "to_i", Arity::exact(0), toi);
    eval.add_builtin_method(class, "to_f", Arity::exact(0), tof);
    eval.add_builtin_method(class, "abs", Arity::exact(0), abs);
    eval.add_builtin_method(class, "succ", Arity::exact(0), succ);
    eval.add_builtin_method(class, "zero?", Arity::exact(0), zero);
    eval.add_builtin_method(class, "even?", Arity::exact(0), even);
    eval.add_builtin_method(class, "odd?", Arity::exact(0), odd);
}

fn overflow() -> RubyError {
    RubyError::range("integer overflow")
}

fn receiver(self_val: &Value) -> Result<i64, RubyError> {
    self_val
        .as_integer()
        .ok_or_else(|| RubyError::internal("receiver is not an Integer"))
}

fn coerce_err(eval: &Evaluator, val: &Value) -> RubyError {
    RubyError::typeerr(format!(
        "{} can't be coerced into Integer",
        eval.provider.class_name_of(val)
    ))
}

/// Apply an arithmetic operator. Integer operands use `int_op` (checked),
/// a Float operand turns the operation into a Float one.
fn arith(
    eval: &mut Evaluator,
    self_val: Value,
    rhs: &Value,
    int_op: fn(i64, i64) -> Result<i64, RubyError>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    let lhs = receiver(&self_val)?;
    match rhs {
        Value::Integer(rhs) => Ok(Value::Integer(int_op(lhs, *rhs)?)),
        Value::Float(rhs) => Ok(Value::Float(float_op(lhs as f64, *rhs))),
        _ => Err(coerce_err(eval, rhs)),
    }
}

fn add(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    arith(
        eval,
        self_val,
        &args[0],
        |lhs, rhs| lhs.checked_add(rhs).ok_or_else(overflow),
        |lhs, rhs| lhs + rhs,
    )
}

fn sub(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    arith(
        eval,
        self_val,
        &args[0],
        |lhs, rhs| lhs.checked_sub(rhs).ok_or_else(overflow),
        |lhs, rhs| lhs - rhs,
    )
}

fn mul(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    arith(
        eval,
        self_val,
        &args[0],
        |lhs, rhs| lhs.checked_mul(rhs).ok_or_else(overflow),
        |lhs, rhs| lhs * rhs,
    )
}

/// Floored division: `-7 / 2 == -4`.
fn div(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    arith(
        eval,
        self_val,
        &args[0],
        |lhs, rhs| {
            if rhs == 0 {
                Err(RubyError::zero_div())
            } else if lhs == i64::MIN && rhs == -1 {
                Err(overflow())
            } else {
                Ok(DivFloor::div_floor(lhs, rhs))
            }
        },
        |lhs, rhs| lhs / rhs,
    )
}

/// Floored modulo: the result has the sign of the divisor.
fn rem(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    arith(
        eval,
        self_val,
        &args[0],
        |lhs, rhs| {
            if rhs == 0 {
                Err(RubyError::zero_div())
            } else if rhs == -1 {
                Ok(0)
            } else {
                Ok(RemFloor::rem_floor(lhs, rhs))
            }
        },
        super::float::float_rem,
    )
}

/// A negative exponent yields a Float.
fn pow(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let lhs = receiver(&self_val)?;
    match &args[0] {
        Value::Integer(rhs) if *rhs < 0 => Ok(Value::Float((lhs as f64).powf(*rhs as f64))),
        Value::Integer(rhs) => {
            let exp = u32::try_from(*rhs).map_err(|_| overflow())?;
            Ok(Value::Integer(lhs.checked_pow(exp).ok_or_else(overflow)?))
        }
        Value::Float(rhs) => Ok(Value::Float((lhs as f64).powf(*rhs))),
        rhs => Err(coerce_err(eval, rhs)),
    }
}

fn neg(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(Value::Integer(num.checked_neg().ok_or_else(overflow)?))
}

fn tos(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(eval.new_string(num.to_string()))
}

fn toi(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(self_val)
}

fn tof(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(Value::Float(num as f64))
}

fn abs(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(Value::Integer(num.checked_abs().ok_or_else(overflow)?))
}

fn succ(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(Value::Integer(num.checked_add(1).ok_or_else(overflow)?))
}

fn zero(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(
        compare_numeric(&self_val, &Value::Integer(0)) == Some(std::cmp::Ordering::Equal),
    ))
}

fn even(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(receiver(&self_val)? % 2 == 0))
}

fn odd(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(receiver(&self_val)? % 2 != 0))
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;
    use crate::value::Value;

    #[test]
    fn integer_arithmetic() {
        let program = r#"
            assert(7, 3 + 4)
            assert(-1, 3 - 4)
            assert(12, 3 * 4)
            assert(3, 7 / 2)
            assert(-4, -7 / 2)
            assert(1, 7 % 3)
            assert(2, -7 % 3)
            assert(-2, 7 % -3)
            assert(1024, 2 ** 10)
            assert(0.5, 2 ** -1)
            assert(3.5, 3 + 0.5)
            assert(1.5, 3 / 2.0)
            assert(-4, -(2 ** 2))
            assert(-5, -5.abs * -1)
            a = 5
            assert(-5, -a)
        "#;
        assert_script(program);
        eval_script("1_000 * 3", Value::Integer(3000));
    }

    #[test]
    fn integer_comparison() {
        let program = r#"
            assert(true, 1 < 2)
            assert(true, 2 <= 2)
            assert(false, 1 > 2)
            assert(true, 3 >= 2.5)
            assert(true, 1 == 1.0)
            assert(false, 1 == "1")
            assert(-1, 1 <=> 2)
            assert(0, 2 <=> 2)
            assert(nil, 1 <=> "a")
            assert(true, 0.zero?)
            assert(true, 4.even?)
            assert(true, 3.odd?)
            assert(4, 3.succ)
            assert("42", 42.to_s)
            assert(2.0, 2.to_f)
            assert(Integer, 5.class)
        "#;
        assert_script(program);
    }

    #[test]
    fn integer_errors() {
        assert_error("1 / 0", RuntimeErrKind::ZeroDivision);
        assert_error("1 % 0", RuntimeErrKind::ZeroDivision);
        assert_error("9223372036854775807 + 1", RuntimeErrKind::Range);
        assert_error("1 + 'a'", RuntimeErrKind::Type);
        assert_error("1 < 'a'", RuntimeErrKind::Argument);
        assert_error("1.wiggle", RuntimeErrKind::NoMethod);
        assert_error("1.+(1, 2)", RuntimeErrKind::Argument);
    }
}
