use crate::builtin::{expect_integer, expect_string};
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::value::{StringRef, Value};

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.string;
    eval.add_builtin_method(class, "+", Arity::exact(1), add);
    eval.add_builtin_method(class, "<<", Arity::exact(1), append);
    eval.add_builtin_method(class, "*", Arity::exact(1), mul);
    eval.add_builtin_method(class, "==", Arity::exact(1), eq);
    eval.add_builtin_method(class, "size", Arity::exact(0), size);
    eval.add_builtin_method(class, "length", Arity::exact(0), size);
    eval.add_builtin_method(class, "empty?", Arity::exact(0), empty);
    eval.add_builtin_method(class, "include?", Arity::exact(1), include);
    eval.add_builtin_method(class, "start_with?", Arity::exact(1), start_with);
    eval.add_builtin_method(class, "upcase", Arity::exact(0), upcase);
    eval.add_builtin_method(class, "downcase", Arity::exact(0), downcase);
    eval.add_builtin_method(class, "reverse", Arity::exact(0), reverse);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), tos);
    eval.add_builtin_method(class, "to_sym", Arity::exact(0), to_sym);
    eval.add_builtin_method(class, "to_i", Arity::exact(0), toi);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
}

fn rstring(self_val: &Value) -> Result<StringRef, RubyError> {
    self_val
        .as_rstring()
        .cloned()
        .ok_or_else(|| RubyError::internal("receiver is not a String"))
}

fn self_string(self_val: &Value) -> Result<String, RubyError> {
    Ok(rstring(self_val)?.borrow().string.clone())
}

/// Concatenation returns a new String; neither operand is modified.
fn add(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let rhs = expect_string(eval, &args[0])?;
    let lhs = self_string(&self_val)?;
    Ok(eval.new_string(lhs + &rhs))
}

/// Appends in place and returns the receiver.
fn append(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let rhs = expect_string(eval, &args[0])?;
    rstring(&self_val)?.borrow_mut().string.push_str(&rhs);
    Ok(self_val)
}

fn mul(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let count = expect_integer(eval, &args[0])?;
    if count < 0 {
        return Err(RubyError::argument("negative argument"));
    }
    let s = self_string(&self_val)?;
    let mut res = String::new();
    s.len()
        .checked_mul(count as usize)
        .and_then(|size| res.try_reserve_exact(size).ok())
        .ok_or_else(|| RubyError::argument("argument too big"))?;
    for _ in 0..count {
        res.push_str(&s);
    }
    Ok(eval.new_string(res))
}

fn eq(_: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let lhs = self_string(&self_val)?;
    Ok(Value::Bool(args[0].as_string().map_or(false, |rhs| lhs == rhs)))
}

fn size(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Integer(self_string(&self_val)?.chars().count() as i64))
}

fn empty(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(self_string(&self_val)?.is_empty()))
}

fn include(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let pat = expect_string(eval, &args[0])?;
    Ok(Value::Bool(self_string(&self_val)?.contains(pat.as_str())))
}

fn start_with(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let pat = expect_string(eval, &args[0])?;
    Ok(Value::Bool(self_string(&self_val)?.starts_with(pat.as_str())))
}

fn upcase(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = self_string(&self_val)?.to_uppercase();
    Ok(eval.new_string(s))
}

fn downcase(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = self_string(&self_val)?.to_lowercase();
    Ok(eval.new_string(s))
}

fn reverse(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s: String = self_string(&self_val)?.chars().rev().collect();
    Ok(eval.new_string(s))
}

fn tos(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(self_val)
}

fn to_sym(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = self_string(&self_val)?;
    Ok(eval.new_symbol(&s))
}

/// Leading integer of the string, 0 if there is none.
fn toi(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = self_string(&self_val)?;
    let s = s.trim_start();
    let (sign, digits) = match s.chars().next() {
        Some('-') => (-1, &s[1..]),
        Some('+') => (1, &s[1..]),
        _ => (1, s),
    };
    let mut num: i64 = 0;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let digit = match ch.to_digit(10) {
            Some(d) => d as i64,
            None => break,
        };
        num = num
            .checked_mul(10)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| RubyError::range("integer overflow"))?;
    }
    Ok(Value::Integer(sign * num))
}

fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let s = self_string(&self_val)?;
    Ok(eval.new_string(inspect_str(&s)))
}

pub fn inspect_str(s: &str) -> String {
    let mut res = String::with_capacity(s.len() + 2);
    res.push('"');
    for ch in s.chars() {
        match ch {
            '"' => res.push_str("\\\""),
            '\\' => res.push_str("\\\\"),
            '\n' => res.push_str("\\n"),
            '\t' => res.push_str("\\t"),
            '\r' => res.push_str("\\r"),
            '\u{1b}' => res.push_str("\\e"),
            '\0' => res.push_str("\\0"),
            ch if ch.is_control() => res += &format!("\\x{:02X}", ch as u32),
            ch => res.push(ch),
        }
    }
    res.push('"');
    res
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;

    #[test]
    fn string_concat() {
        let program = r#"
            a = "foo"
            b = "bar"
            c = a + b
            assert("foobar", c)
            assert("foo", a)
            assert("bar", b)
            d = a
            d << "!"
            assert("foo!", a)
            assert("ababab", "ab" * 3)
        "#;
        assert_script(program);
    }

    #[test]
    fn string_constructor_isolation() {
        let program = r#"
            a = String.new
            b = String.new
            a << "x"
            assert("x", a)
            assert("", b)
            assert("init", String.new("init"))
            class MyString < String
              def shout
                upcase + "!"
              end
            end
            s = MyString.new("hey")
            assert(MyString, s.class)
            assert("HEY!", s.shout)
            assert(String, (s + "x").class)
        "#;
        assert_script(program);
    }

    #[test]
    fn string_methods() {
        let program = r#"
            assert(5, "hello".size)
            assert(3, "héé".length)
            assert(true, "".empty?)
            assert(true, "hello".include?("ell"))
            assert(false, "hello".start_with?("ell"))
            assert("HELLO", "hello".upcase)
            assert("hello", "HeLLo".downcase)
            assert("olleh", "hello".reverse)
            assert(:foo, "foo".to_sym)
            assert(12, "12abc".to_i)
            assert(-3, " -3".to_i)
            assert(0, "abc".to_i)
            assert('"a\\nb"', "a\nb".inspect)
            assert(true, "a" == "a")
            assert(false, "a" == :a)
            assert(true, "a" != "b")
        "#;
        assert_script(program);
    }

    #[test]
    fn string_type_mismatch() {
        assert_error("'foo' + 1", RuntimeErrKind::Type);
        assert_error("'foo' << nil", RuntimeErrKind::Type);
        assert_error("'foo' * -1", RuntimeErrKind::Argument);
        assert_error("'ab' * 4611686018427387904", RuntimeErrKind::Argument);
        assert_error("String.new(1)", RuntimeErrKind::Type);
    }
}
