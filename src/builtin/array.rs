use crate::builtin::{expect_integer, expect_string};
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::Arity;
use crate::util::IdentId;
use crate::value::{ArrayRef, Value};

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.array;
    eval.add_builtin_method(class, "[]", Arity::exact(1), get_elem);
    eval.add_builtin_method(class, "[]=", Arity::exact(2), set_elem);
    eval.add_builtin_method(class, "push", Arity::at_least(0), push);
    eval.add_builtin_method(class, "<<", Arity::exact(1), push);
    eval.add_builtin_method(class, "pop", Arity::exact(0), pop);
    eval.add_builtin_method(class, "first", Arity::exact(0), first);
    eval.add_builtin_method(class, "last", Arity::exact(0), last);
    eval.add_builtin_method(class, "size", Arity::exact(0), size);
    eval.add_builtin_method(class, "length", Arity::exact(0), size);
    eval.add_builtin_method(class, "empty?", Arity::exact(0), empty);
    eval.add_builtin_method(class, "include?", Arity::exact(1), include);
    eval.add_builtin_method(class, "+", Arity::exact(1), add);
    eval.add_builtin_method(class, "==", Arity::exact(1), eq);
    eval.add_builtin_method(class, "join", Arity::range(0, 1), join);
    eval.add_builtin_method(class, "reverse", Arity::exact(0), reverse);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), inspect);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), inspect);
}

fn receiver(self_val: &Value) -> Result<ArrayRef, RubyError> {
    self_val
        .as_array()
        .cloned()
        .ok_or_else(|| RubyError::internal("receiver is not an Array"))
}

/// Snapshot of the elements. Taken before calling back into the evaluator,
/// since user code may mutate the array meanwhile.
fn elements(self_val: &Value) -> Result<Vec<Value>, RubyError> {
    Ok(receiver(self_val)?.borrow().elements.clone())
}

fn get_elem(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let index = expect_integer(eval, &args[0])?;
    let array = receiver(&self_val)?;
    let array = array.borrow();
    let len = array.elements.len() as i64;
    let index = if index < 0 { index + len } else { index };
    if index < 0 || index >= len {
        return Ok(Value::Nil);
    }
    Ok(array.elements[index as usize].clone())
}

/// Assigning past the end pads the gap with nil.
fn set_elem(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let index = expect_integer(eval, &args[0])?;
    let array = receiver(&self_val)?;
    let mut array = array.borrow_mut();
    let len = array.elements.len() as i64;
    let pos = if index < 0 { index + len } else { index };
    if pos < 0 {
        return Err(RubyError::index(format!(
            "index {} too small for array; minimum: -{}",
            index, len
        )));
    }
    let pos = pos as usize;
    if pos >= array.elements.len() {
        let grow = pos + 1 - array.elements.len();
        array
            .elements
            .try_reserve_exact(grow)
            .map_err(|_| RubyError::index(format!("index {} too big", index)))?;
        array.elements.resize(pos + 1, Value::Nil);
    }
    array.elements[pos] = args[1].clone();
    Ok(args[1].clone())
}

fn push(_: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    receiver(&self_val)?
        .borrow_mut()
        .elements
        .extend_from_slice(args);
    Ok(self_val)
}

fn pop(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(receiver(&self_val)?
        .borrow_mut()
        .elements
        .pop()
        .unwrap_or(Value::Nil))
}

fn first(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(receiver(&self_val)?
        .borrow()
        .elements
        .first()
        .cloned()
        .unwrap_or(Value::Nil))
}

fn last(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(receiver(&self_val)?
        .borrow()
        .elements
        .last()
        .cloned()
        .unwrap_or(Value::Nil))
}

fn size(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Integer(receiver(&self_val)?.borrow().elements.len() as i64))
}

fn empty(_: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    Ok(Value::Bool(receiver(&self_val)?.borrow().elements.is_empty()))
}

fn include(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    for elem in elements(&self_val)? {
        if eval.send(elem, IdentId::_EQ, &args[..1])?.to_bool() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn add(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let rhs = match args[0].as_array() {
        Some(rhs) => rhs.borrow().elements.clone(),
        None => {
            return Err(RubyError::typeerr(format!(
                "no implicit conversion of {} into Array",
                eval.provider.class_name_of(&args[0])
            )))
        }
    };
    let mut lhs = elements(&self_val)?;
    lhs.extend(rhs);
    Ok(eval.new_array(lhs))
}

/// Element-wise `==`, dispatched so that user-defined equality applies.
fn eq(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let rhs = match args[0].as_array() {
        Some(rhs) => rhs.borrow().elements.clone(),
        None => return Ok(Value::Bool(false)),
    };
    let lhs = elements(&self_val)?;
    if lhs.len() != rhs.len() {
        return Ok(Value::Bool(false));
    }
    for (l, r) in lhs.into_iter().zip(rhs) {
        if !eval.send(l, IdentId::_EQ, &[r])?.to_bool() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn join(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let sep = match args.get(0) {
        Some(sep) => expect_string(eval, sep)?,
        None => String::new(),
    };
    let mut parts = vec![];
    for elem in elements(&self_val)? {
        parts.push(eval.val_to_s(&elem)?);
    }
    Ok(eval.new_string(parts.join(&sep)))
}

fn reverse(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let mut elements = elements(&self_val)?;
    elements.reverse();
    Ok(eval.new_array(elements))
}

fn inspect(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let mut parts = vec![];
    for elem in elements(&self_val)? {
        if elem.identical(&self_val) {
            parts.push("[...]".to_string());
        } else {
            parts.push(eval.val_inspect(&elem)?);
        }
    }
    Ok(eval.new_string(format!("[{}]", parts.join(", "))))
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;

    #[test]
    fn array_index() {
        let program = r#"
            a = [1, 2, 3]
            assert(1, a[0])
            assert(3, a[-1])
            assert(nil, a[3])
            assert(nil, a[-4])
            a[1] = 20
            assert([1, 20, 3], a)
            a[5] = 6
            assert([1, 20, 3, nil, nil, 6], a)
            a[-1] = 0
            assert(0, a.last)
        "#;
        assert_script(program);
        assert_error("a = [1]; a[-3] = 0", RuntimeErrKind::Index);
        assert_error("a = []; a[4611686018427387904] = 1", RuntimeErrKind::Index);
        let program = r#"
            a = [1]
            begin
              a[9223372036854775807] = 2
            ensure
              assert([1], a)
            end
        "#;
        assert_error(program, RuntimeErrKind::Index);
        assert_error("[1][:a]", RuntimeErrKind::Type);
    }

    #[test]
    fn array_methods() {
        let program = r#"
            a = []
            assert(true, a.empty?)
            a.push(1, 2)
            a << 3
            assert(3, a.size)
            assert(3, a.pop)
            assert([1, 2], a)
            assert(1, a.first)
            assert(2, a.last)
            assert(nil, [].first)
            assert(true, a.include?(2))
            assert(false, a.include?("2"))
            assert([1, 2, 3], a + [3])
            assert([1, 2], a)
            assert("1-2", a.join("-"))
            assert("12", a.join)
            assert([2, 1], a.reverse)
            assert(false, [1, 2] == [1, 2, 3])
            assert(false, [1] == 1)
            assert('[1, "a", :b, nil, [2.5]]', [1, "a", :b, nil, [2.5]].inspect)
            assert(Array, a.class)
        "#;
        assert_script(program);
        assert_error("[1] + 1", RuntimeErrKind::Type);
    }

    #[test]
    fn array_uses_element_equality() {
        let program = r#"
            class Money
              attr_reader :amount
              def initialize(amount)
                @amount = amount
              end
              def ==(other)
                amount == other.amount
              end
            end
            assert(true, [Money.new(1)] == [Money.new(1)])
            assert(true, [Money.new(2)].include?(Money.new(2)))
        "#;
        assert_script(program);
    }

    #[test]
    fn array_constructor() {
        let program = r#"
            assert([], Array.new)
            assert([nil, nil], Array.new(2))
            assert([0, 0, 0], Array.new(3, 0))
            class Stack < Array
              def peek
                last
              end
            end
            s = Stack.new
            s.push(1)
            s.push(2)
            assert(2, s.peek)
            assert(Stack, s.class)
        "#;
        assert_script(program);
        assert_error("Array.new(-1)", RuntimeErrKind::Argument);
        assert_error("Array.new(4611686018427387904)", RuntimeErrKind::Argument);
        assert_error("Array.new(9223372036854775807, 0)", RuntimeErrKind::Argument);
    }
}
