use crate::builtin::{expect_class, expect_name};
use crate::class::{ClassRef, ObjKind};
use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::method::{Arity, MethodInfo};
use crate::util::IdentId;
use crate::value::Value;

pub fn init(eval: &mut Evaluator) {
    let class = eval.classes.class;
    eval.add_builtin_method(class, "new", Arity::at_least(0), new);
    eval.add_builtin_method(class, "name", Arity::exact(0), name);
    eval.add_builtin_method(class, "to_s", Arity::exact(0), name);
    eval.add_builtin_method(class, "inspect", Arity::exact(0), name);
    eval.add_builtin_method(class, "superclass", Arity::exact(0), superclass);
    eval.add_builtin_method(class, "ancestors", Arity::exact(0), ancestors);
    eval.add_builtin_method(class, "instance_methods", Arity::range(0, 1), instance_methods);
    eval.add_builtin_method(class, "method_defined?", Arity::exact(1), method_defined);
    eval.add_builtin_method(class, "remove_method", Arity::at_least(0), remove_method);
    eval.add_builtin_method(class, "===", Arity::exact(1), teq);
    eval.add_builtin_method(class, "attr_reader", Arity::at_least(0), attr_reader);
    eval.add_builtin_method(class, "attr_writer", Arity::at_least(0), attr_writer);
    eval.add_builtin_method(class, "attr_accessor", Arity::at_least(0), attr_accessor);
}

fn self_class(eval: &Evaluator, self_val: &Value) -> Result<ClassRef, RubyError> {
    expect_class(eval, self_val)
}

/// Allocate an instance, then run `initialize` on plain objects.
fn new(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    match eval.provider.kind(class) {
        ObjKind::Object => {
            let obj = eval.provider.new_instance(class, &[])?;
            eval.send(obj.clone(), IdentId::INITIALIZE, args)?;
            Ok(obj)
        }
        _ => eval.provider.new_instance(class, args),
    }
}

fn name(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    let name = eval.provider.name(class).to_string();
    Ok(eval.new_string(name))
}

fn superclass(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    Ok(match eval.provider.get(class).superclass {
        Some(superclass) => Value::Class(superclass),
        None => Value::Nil,
    })
}

fn ancestors(eval: &mut Evaluator, self_val: Value, _: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    let ancestors = eval.provider.ancestors(class).map(Value::Class).collect();
    Ok(eval.new_array(ancestors))
}

/// Names of the public instance methods; `instance_methods(false)` lists
/// only those defined directly in the class.
fn instance_methods(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    let inherit = args.get(0).map_or(true, Value::to_bool);
    let mut names: Vec<IdentId> = vec![];
    let classes: Vec<ClassRef> = if inherit {
        eval.provider.ancestors(class).collect()
    } else {
        vec![class]
    };
    for class in classes {
        for id in eval.provider.get(class).instance_method_names() {
            if !names.contains(&id) {
                names.push(id);
            }
        }
    }
    let symbols = names.into_iter().map(Value::Symbol).collect();
    Ok(eval.new_array(symbols))
}

fn method_defined(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    let id = expect_name(eval, &args[0])?;
    Ok(Value::Bool(eval.provider.search_method(class, id).is_some()))
}

fn remove_method(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    for arg in args {
        let id = expect_name(eval, arg)?;
        if eval.provider.get_mut(class).remove_instance_method(id).is_none() {
            return Err(RubyError::name(format!(
                "method '{}' not defined in {}",
                eval.get_ident_name(id),
                eval.provider.name(class)
            )));
        }
    }
    Ok(self_val)
}

fn teq(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    Ok(Value::Bool(eval.is_a(&args[0], class)?))
}

fn attr_reader(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    define_attrs(eval, self_val, args, true, false)
}

fn attr_writer(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    define_attrs(eval, self_val, args, false, true)
}

fn attr_accessor(eval: &mut Evaluator, self_val: Value, args: &[Value]) -> EvalResult {
    define_attrs(eval, self_val, args, true, true)
}

/// Define a native reader and/or writer of `@name` for each name in `args`.
fn define_attrs(
    eval: &mut Evaluator,
    self_val: Value,
    args: &[Value],
    reader: bool,
    writer: bool,
) -> EvalResult {
    let class = self_class(eval, &self_val)?;
    let mut defined = vec![];
    for arg in args {
        let id = expect_name(eval, arg)?;
        let name = eval.get_ident_name(id).to_string();
        let ivar = eval.get_ident_id(&format!("@{}", name));
        if reader {
            let method = MethodInfo::builtin(id, Arity::exact(0), move |_, self_val, _| match &self_val {
                Value::Object(obj) => Ok(obj.borrow().ivars.get(&ivar).cloned().unwrap_or(Value::Nil)),
                _ => Ok(Value::Nil),
            });
            eval.provider.get_mut(class).add_instance_method(method);
            defined.push(Value::Symbol(id));
        }
        if writer {
            let setter = eval.get_ident_id(&format!("{}=", name));
            let method = MethodInfo::builtin(setter, Arity::exact(1), move |eval, self_val, args| {
                match &self_val {
                    Value::Object(obj) => {
                        obj.borrow_mut().ivars.insert(ivar, args[0].clone());
                        Ok(args[0].clone())
                    }
                    _ => Err(RubyError::runtime(format!(
                        "can't modify instance variable of {}",
                        eval.describe(&self_val)
                    ))),
                }
            });
            eval.provider.get_mut(class).add_instance_method(method);
            defined.push(Value::Symbol(setter));
        }
    }
    Ok(eval.new_array(defined))
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeErrKind;
    use crate::test::*;

    #[test]
    fn class_reflection() {
        let program = r#"
            class Foo
            end
            class Bar < Foo
              def hello; end
            end
            assert("Bar", Bar.name)
            assert("Bar", Bar.to_s)
            assert(Foo, Bar.superclass)
            assert(nil, BasicObject.superclass)
            assert([Bar, Foo, Object, BasicObject], Bar.ancestors)
            assert([:hello], Bar.instance_methods(false))
            assert(true, Bar.method_defined?(:hello))
            assert(true, Bar.method_defined?(:inspect))
            assert(true, Foo === Bar.new)
            assert(false, Bar === Foo.new)
            assert(Class, Foo.class)
        "#;
        assert_script(program);
    }

    #[test]
    fn override_and_remove_method() {
        let program = r#"
            class A
              def m; "A"; end
            end
            class B < A
              def m; "B"; end
            end
            assert("B", B.new.m)
            assert("A", A.new.m)
            class B
              remove_method :m
            end
            assert("A", B.new.m)
        "#;
        assert_script(program);
        assert_error("class Foo; end; Foo.remove_method(:x)", RuntimeErrKind::Name);
    }

    #[test]
    fn attr_accessors() {
        let program = r#"
            class Point
              attr_accessor :x
              attr_reader :y
              attr_writer :z
              def initialize(x, y)
                @x = x
                @y = y
              end
              def z_value
                @z
              end
            end
            pt = Point.new(1, 2)
            assert(1, pt.x)
            assert(2, pt.y)
            pt.x = 10
            pt.z = 5
            assert(10, pt.x)
            assert(5, pt.z_value)
            assert(false, pt.respond_to?(:y=))
        "#;
        assert_script(program);
    }

    #[test]
    fn constructor_arity() {
        assert_error("class Foo; end; Foo.new(1)", RuntimeErrKind::Argument);
        assert_error(
            "class Foo; def initialize(a); end; end; Foo.new",
            RuntimeErrKind::Argument,
        );
        assert_error("Integer.new", RuntimeErrKind::Type);
        assert_error("class Foo < 3; end", RuntimeErrKind::Type);
        assert_error("class Foo; end; class Foo < String; end", RuntimeErrKind::Type);
    }

    #[test]
    fn class_methods_are_inherited() {
        let program = r#"
            class Shape
              def self.create(n)
                new.tap_size(n)
              end
              def tap_size(n)
                @n = n
                self
              end
              def n; @n; end
            end
            class Square < Shape
            end
            assert(4, Square.create(4).n)
            assert(Square, Square.create(1).class)
        "#;
        assert_script(program);
    }
}
