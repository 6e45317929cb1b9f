use crate::builtin::add_numeric_comparisons;
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.float;
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
    eval.add_builtin_method(class, "floor", Arity::exact(0), floor);
    eval.add_builtin_method(class, "ceil", Arity::exact(0), ceil);
    eval.add_builtin_method(class, "round", Arity::exact(0), round);
    eval.add_builtin_method(class, "abs", Arity::exact(0), abs);
    eval.add_builtin_method(class, "nan?", Arity::exact(0), nan);
}

/// Floored modulo on floats, with the sign of the divisor.
pub fn float_rem(lhs: f64, rhs: f64) -> f64 {
    let rem = lhs % rhs;
    if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
        rem + rhs
    } else {
        rem
    }
}

/// Render a float the way Ruby does: always with a fractional part, and in
/// exponent form for very large or very small magnitudes.
pub fn float_to_s(num: f64) -> String {
    if num.is_nan() {
        return "NaN".to_string();
    }
    if num.is_infinite() {
        return if num > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let abs = num.abs();
    if abs != 0.0 && (abs >= 1e16 || abs < 1e-4) {
        let s = format!("{:e}", num);
        let (mantissa, exp) = match s.find('e') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => return s,
        };
        let mantissa = if mantissa.contains('.') {
            mantissa.to_string()
        } else {
            format!("{}.0", mantissa)
        };
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exp),
        };
        return format!("{}e{}{:0>2}", mantissa, sign, digits);
    }
    if num.fract() == 0.0 {
        format!("{:.1}", num)
    } else {
        format!("{}", num)
    }
}

fn receiver(self_val: &Value) -> Result<f64, RubyError> {
    self_val
        .as_float()
        .ok_or_else(|| RubyError::internal("receiver is not a Float"))
}

fn operand(eval: &Evaluator, val: &Value) -> Result<f64, RubyError> {
    match val {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        _ => Err(RubyError::typeerr(format!(
            "{} can't be coerced into Float",
            eval.provider.class_name_of(val)
        ))),
    }
}

fn add(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)? + operand(eval, &args[0])?))
}

fn sub(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)? - operand(eval, &args[0])?))
}

fn mul(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)? * operand(eval, &args[0])?))
}

fn div(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)? / operand(eval, &args[0])?))
}

fn rem(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(float_rem(receiver(&self_val)?, operand(eval, &args[0])?)))
}

fn pow(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)?.powf(operand(eval, &args[0])?)))
}

fn neg(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Float(-receiver(&self_val)?))
}

fn tos(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let num = receiver(&self_val)?;
    Ok(eval.new_string(float_to_s(num)))
}

/// Convert an already rounded float into an Integer.
fn to_integer(num: f64) -> EvalResult {
    if num.is_nan() || num.is_infinite() {
        return Err(RubyError::range(float_to_s(num)));
    }
    if num < i64::MIN as f64 || num >= i64::MAX as f64 {
        return Err(RubyError::range(format!(
            "float {} out of range of integer",
            float_to_s(num)
        )));
    }
    Ok(Value::Integer(num as i64))
}

fn toi(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    to_integer(receiver(&self_val)?.trunc())
}

fn tof(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(self_val)
}

fn floor(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    to_integer(receiver(&self_val)?.floor())
}

fn ceil(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    to_integer(receiver(&self_val)?.ceil())
}

/// Rounds half away from zero.
fn round(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    to_integer(receiver(&self_val)?.round())
}

fn abs(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Float(receiver(&self_val)?.abs()))
}

fn nan(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(receiver(&self_val)?.is_nan()))
}
