mod array;
mod basicobject;
mod class;
mod exception;
mod falseclass;
mod float;
mod integer;
mod method;
mod nilclass;
mod object;
mod string;
mod symbol;
mod trueclass;

use crate::class::*;
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::{Arity, MethodInfo};
use crate::util::IdentId;
use crate::value::Value;

/// Handles of the classes every runtime starts with.
#[derive(Debug, Clone)]
pub struct BuiltinClasses {
    pub basic_object: ClassRef,
    pub object: ClassRef,
    pub class: ClassRef,
    pub nil: ClassRef,
    pub true_class: ClassRef,
    pub false_class: ClassRef,
    pub integer: ClassRef,
    pub float: ClassRef,
    pub string: ClassRef,
    pub symbol: ClassRef,
    pub array: ClassRef,
    pub method: ClassRef,
    pub exception: ClassRef,
    pub standard_error: ClassRef,
}

impl BuiltinClasses {
    /// Register the built-in classes in their fixed order. Methods are added
    /// later by `init`, once an `Evaluator` exists.
    pub fn bootstrap(provider: &mut ClassProvider) -> Self {
        let basic_object = provider.register_class(
            "BasicObject",
            ClassInfo::new("BasicObject", None).with_kind(ObjKind::Object),
        );
        let object = provider.register_class("Object", ClassInfo::new("Object", Some(basic_object)));
        let mut primitive = |name: &str, kind: ObjKind| {
            provider.register_class(name, ClassInfo::new(name, Some(object)).with_kind(kind))
        };
        let class = primitive("Class", ObjKind::None);
        let nil = primitive("NilClass", ObjKind::None);
        let true_class = primitive("TrueClass", ObjKind::None);
        let false_class = primitive("FalseClass", ObjKind::None);
        let integer = primitive("Integer", ObjKind::None);
        let float = primitive("Float", ObjKind::None);
        let string = primitive("String", ObjKind::String);
        let symbol = primitive("Symbol", ObjKind::None);
        let array = primitive("Array", ObjKind::Array);
        let method = primitive("Method", ObjKind::None);

        let exception = provider.register_class("Exception", ClassInfo::new("Exception", Some(object)));
        let standard_error = provider.register_class(
            "StandardError",
            ClassInfo::new("StandardError", Some(exception)),
        );
        let mut error_class = |name: &str, superclass: ClassRef| {
            provider.register_class(name, ClassInfo::new(name, Some(superclass)))
        };
        error_class("RuntimeError", standard_error);
        error_class("ArgumentError", standard_error);
        error_class("TypeError", standard_error);
        let name_error = error_class("NameError", standard_error);
        error_class("NoMethodError", name_error);
        error_class("ZeroDivisionError", standard_error);
        error_class("RangeError", standard_error);
        error_class("IndexError", standard_error);

        BuiltinClasses {
            basic_object,
            object,
            class,
            nil,
            true_class,
            false_class,
            integer,
            float,
            string,
            symbol,
            array,
            method,
            exception,
            standard_error,
        }
    }
}

/// Install the native methods of every built-in class.
pub fn init(eval: &mut Evaluator) {
    basicobject::init(eval);
    object::init(eval);
    class::init(eval);
    nilclass::init(eval);
    trueclass::init(eval);
    falseclass::init(eval);
    integer::init(eval);
    float::init(eval);
    string::init(eval);
    symbol::init(eval);
    array::init(eval);
    method::init(eval);
    exception::init(eval);
}

impl Evaluator {
    pub fn add_builtin_method(
        &mut self,
        class: ClassRef,
        name: &str,
        arity: Arity,
        func: impl Fn(&mut Evaluator, Value, &[Value]) -> EvalResult + 'static,
    ) {
        let id = self.get_ident_id(name);
        let method = MethodInfo::builtin(id, arity, func);
        self.provider.get_mut(class).add_instance_method(method);
    }

    pub fn add_builtin_class_method(
        &mut self,
        class: ClassRef,
        name: &str,
        arity: Arity,
        func: impl Fn(&mut Evaluator, Value, &[Value]) -> EvalResult + 'static,
    ) {
        let id = self.get_ident_id(name);
        let method = MethodInfo::builtin(id, arity, func);
        self.provider.get_mut(class).add_class_method(method);
    }
}

// Argument conversion helpers shared by the built-in classes.

pub fn expect_integer(eval: &Evaluator, val: &Value) -> Result<i64, RubyError> {
    match val {
        Value::Integer(i) => Ok(*i),
        _ => Err(RubyError::typeerr(format!(
            "no implicit conversion of {} into Integer",
            eval.provider.class_name_of(val)
        ))),
    }
}

pub fn expect_string(eval: &Evaluator, val: &Value) -> Result<String, RubyError> {
    match val.as_string() {
        Some(s) => Ok(s),
        None => Err(RubyError::typeerr(format!(
            "no implicit conversion of {} into String",
            eval.provider.class_name_of(val)
        ))),
    }
}

pub fn expect_class(eval: &Evaluator, val: &Value) -> Result<ClassRef, RubyError> {
    match val {
        Value::Class(class) => Ok(*class),
        _ => Err(RubyError::typeerr(format!(
            "class or module required ({} given)",
            eval.provider.class_name_of(val)
        ))),
    }
}

/// A method or variable name given as a Symbol or a String.
pub fn expect_name(eval: &mut Evaluator, val: &Value) -> Result<IdentId, RubyError> {
    match val {
        Value::Symbol(id) => Ok(*id),
        Value::String(s) => {
            let name = s.borrow().string.clone();
            Ok(eval.get_ident_id(&name))
        }
        _ => {
            let inspect = eval.val_inspect(val)?;
            Err(RubyError::typeerr(format!(
                "{} is not a symbol nor a string",
                inspect
            )))
        }
    }
}

/// Compare two numeric values. `None` when either is not numeric.
pub fn compare_numeric(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    let (lhs, rhs) = match (lhs, rhs) {
        (Value::Integer(lhs), Value::Integer(rhs)) => return Some(lhs.cmp(rhs)),
        (Value::Integer(lhs), Value::Float(rhs)) => (*lhs as f64, *rhs),
        (Value::Float(lhs), Value::Integer(rhs)) => (*lhs, *rhs as f64),
        (Value::Float(lhs), Value::Float(rhs)) => (*lhs, *rhs),
        _ => return None,
    };
    lhs.partial_cmp(&rhs)
}

/// Install `== < <= > >= <=>` on a numeric class.
fn add_numeric_comparisons(eval: &mut Evaluator, class: ClassRef) {
    use std::cmp::Ordering;
    eval.add_builtin_method(class, "==", Arity::exact(1), |_, self_val, args| {
        Ok(Value::Bool(
            compare_numeric(&self_val, &args[0]) == Some(Ordering::Equal),
        ))
    });
    eval.add_builtin_method(class, "<=>", Arity::exact(1), |_, self_val, args| {
        Ok(match compare_numeric(&self_val, &args[0]) {
            Some(ord) => Value::Integer(ord as i64),
            None => Value::Nil,
        })
    });
    let ops: [(&str, fn(Ordering) -> bool); 4] = [
        ("<", |ord| ord == Ordering::Less),
        ("<=", |ord| ord != Ordering::Greater),
        (">", |ord| ord == Ordering::Greater),
        (">=", |ord| ord != Ordering::Less),
    ];
    for (name, test) in ops.iter().cloned() {
        eval.add_builtin_method(class, name, Arity::exact(1), move |eval, self_val, args| {
            match compare_numeric(&self_val, &args[0]) {
                Some(ord) => Ok(Value::Bool(test(ord))),
                None if self_val.as_float().map_or(false, f64::is_nan)
                    || args[0].as_float().map_or(false, f64::is_nan) =>
                {
                    Ok(Value::Bool(false))
                }
                None => Err(RubyError::argument(format!(
                    "comparison of {} with {} failed",
                    eval.provider.class_name_of(&self_val),
                    eval.val_inspect(&args[0])?
                ))),
            }
        });
    }
}
