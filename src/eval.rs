use crate::builtin::{self, BuiltinClasses};
use crate::class::*;
use crate::error::*;
use crate::lexer::Lexer;
use crate::method::*;
use crate::node::*;
use crate::parser::Parser;
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;
use crate::util::*;
use crate::value::*;
use fxhash::FxHashMap;
use std::io::Write;
use tracing::{debug, trace};

pub type EvalResult = Result<Value, RubyError>;

pub type ValueTable = FxHashMap<IdentId, Value>;

/// Nesting limit of method invocations.
pub const MAX_CALL_DEPTH: usize = 200;

/// A tree-walking interpreter with its own, independent class registry.
pub struct Evaluator {
    // Global info
    pub source_info: SourceInfo,
    pub ident_table: IdentifierTable,
    pub provider: ClassProvider,
    pub classes: BuiltinClasses,
    pub const_table: ValueTable,
    // State
    pub main_object: Value,
    pub top_scope: Scope,
    output: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::with_output(Box::new(std::io::stdout()))
    }

    /// Create an evaluator whose `puts`/`print`/`p` write to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let mut provider = ClassProvider::new();
        let classes = BuiltinClasses::bootstrap(&mut provider);
        let main_object = Value::Object(Ref::new(ObjectInfo::new(classes.object)));
        let mut eval = Evaluator {
            source_info: SourceInfo::default(),
            ident_table: IdentifierTable::new(),
            provider,
            classes,
            const_table: FxHashMap::default(),
            main_object,
            top_scope: Scope::new_top(),
            output,
            call_depth: 0,
        };
        builtin::init(&mut eval);
        debug!("bootstrap finished");
        eval
    }

    pub fn get_ident_id(&mut self, name: &str) -> IdentId {
        self.ident_table.get_ident_id(name)
    }

    pub fn get_ident_name(&self, id: IdentId) -> &str {
        self.ident_table.get_name(id)
    }

    /// Parse `code`. Local variables already bound at top level are known
    /// to the parser, so that a REPL line can refer to earlier ones.
    pub fn parse(&mut self, code: &str) -> Result<Node, RubyError> {
        self.parse_with_path(code, "")
    }

    pub fn parse_with_path(&mut self, code: &str, path: &str) -> Result<Node, RubyError> {
        let result = match Lexer::new(code).tokenize(path) {
            Ok(result) => result,
            Err(err) => {
                self.source_info = SourceInfo::new(path, code.chars().collect());
                return Err(err);
            }
        };
        let locals = self.top_scope.local_names();
        let mut parser = Parser::new(result, &mut self.ident_table).with_locals(locals);
        let node = parser.parse();
        self.source_info = parser.source_info;
        node
    }

    /// Parse and evaluate `code` at top level.
    pub fn run(&mut self, code: &str) -> EvalResult {
        self.run_with_path(code, "")
    }

    pub fn run_with_path(&mut self, code: &str, path: &str) -> EvalResult {
        let node = self.parse_with_path(code, path)?;
        self.eval_program(&node)
    }

    /// Evaluate a whole program in the top-level scope with `main` as self.
    /// A top-level `return` ends the program with its value.
    pub fn eval_program(&mut self, node: &Node) -> EvalResult {
        let scope = self.top_scope.clone();
        let self_val = self.main_object.clone();
        self.call_depth = 0;
        match self.eval_node(node, &scope, &self_val) {
            Ok(val) => Ok(val),
            Err(err) => match err.kind {
                RubyErrorKind::MethodReturn(val) => Ok(val),
                _ => Err(err.conv_localjump_err()),
            },
        }
    }

    pub fn write_output(&mut self, bytes: &[u8]) -> Result<(), RubyError> {
        self.output
            .write_all(bytes)
            .and_then(|_| self.output.flush())
            .map_err(|err| RubyError::internal(format!("failed to write output: {}", err)))
    }
}

impl Evaluator {
    /// Evaluate AST.
    pub fn eval_node(&mut self, node: &Node, scope: &Scope, self_val: &Value) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_node_inner(node, scope, self_val))
    }

    fn eval_node_inner(&mut self, node: &Node, scope: &Scope, self_val: &Value) -> EvalResult {
        match &node.kind {
            NodeKind::SelfValue => Ok(self_val.clone()),
            NodeKind::Nil => Ok(Value::Nil),
            NodeKind::Integer(num) => Ok(Value::Integer(*num)),
            NodeKind::Float(num) => Ok(Value::Float(*num)),
            NodeKind::Bool(b) => Ok(Value::Bool(*b)),
            NodeKind::String(s) => Ok(self.new_string(s.as_str())),
            NodeKind::Symbol(id) => Ok(Value::Symbol(*id)),
            NodeKind::Array(nodes) => {
                let elements = self.eval_args(nodes, scope, self_val)?;
                Ok(self.new_array(elements))
            }
            NodeKind::Ident(id) => {
                if let Some(val) = scope.get(*id) {
                    return Ok(val);
                }
                if self.find_method(self_val, *id)?.is_some() {
                    return self
                        .send(self_val.clone(), *id, &[])
                        .map_err(|err| err.with_loc(node.loc()));
                }
                let msg = format!(
                    "undefined local variable or method '{}' for {}",
                    self.get_ident_name(*id),
                    self.describe(self_val)
                );
                Err(RubyError::name(msg).with_loc(node.loc()))
            }
            NodeKind::InstanceVar(id) => match self_val {
                Value::Object(obj) => Ok(obj.borrow().ivars.get(id).cloned().unwrap_or(Value::Nil)),
                _ => Ok(Value::Nil),
            },
            NodeKind::Const(id) => self.get_const(*id).map_err(|err| err.with_loc(node.loc())),
            NodeKind::Assign(lhs, rhs) => {
                let rhs = self.eval_node(rhs, scope, self_val)?;
                self.eval_assign(lhs, rhs, scope, self_val)
            }
            NodeKind::And(lhs, rhs) => {
                let lhs = self.eval_node(lhs, scope, self_val)?;
                if lhs.to_bool() {
                    self.eval_node(rhs, scope, self_val)
                } else {
                    Ok(lhs)
                }
            }
            NodeKind::Or(lhs, rhs) => {
                let lhs = self.eval_node(lhs, scope, self_val)?;
                if lhs.to_bool() {
                    Ok(lhs)
                } else {
                    self.eval_node(rhs, scope, self_val)
                }
            }
            NodeKind::Not(node) => {
                let val = self.eval_node(node, scope, self_val)?;
                Ok(Value::Bool(!val.to_bool()))
            }
            NodeKind::CompStmt(nodes) => {
                let mut val = Value::Nil;
                for node in nodes {
                    val = self.eval_node(node, scope, self_val)?;
                }
                Ok(val)
            }
            NodeKind::If { cond, then_, else_ } => {
                let cond = self.eval_node(cond, scope, self_val)?;
                if cond.to_bool() {
                    self.eval_node(then_, scope, self_val)
                } else {
                    self.eval_node(else_, scope, self_val)
                }
            }
            NodeKind::While { cond, body } => {
                loop {
                    let cond = self.eval_node(cond, scope, self_val)?;
                    if !cond.to_bool() {
                        break;
                    }
                    match self.eval_node(body, scope, self_val) {
                        Ok(_) => {}
                        Err(err) => match err.kind {
                            RubyErrorKind::Break(val) => return Ok(val),
                            RubyErrorKind::Next(_) => {}
                            _ => return Err(err),
                        },
                    }
                }
                Ok(Value::Nil)
            }
            NodeKind::Begin {
                body,
                rescue,
                else_,
                ensure,
            } => self.eval_begin(body, rescue, else_, ensure, scope, self_val),
            NodeKind::Break(val) => {
                let val = self.eval_node(val, scope, self_val)?;
                Err(RubyError::break_loop(val).with_loc(node.loc()))
            }
            NodeKind::Next(val) => {
                let val = self.eval_node(val, scope, self_val)?;
                Err(RubyError::next_loop(val).with_loc(node.loc()))
            }
            NodeKind::Return(val) => {
                let val = self.eval_node(val, scope, self_val)?;
                Err(RubyError::method_return(val).with_loc(node.loc()))
            }
            NodeKind::MethodDef { name, params, body } => {
                let class = match self_val {
                    Value::Class(class) => *class,
                    _ => self.class_of(self_val)?,
                };
                let method = MethodInfo::ruby_func(*name, params.clone(), body.clone(), scope.clone());
                debug!(
                    method = self.get_ident_name(*name),
                    class = self.provider.name(class),
                    "method defined"
                );
                self.provider.get_mut(class).add_instance_method(method);
                Ok(Value::Symbol(*name))
            }
            NodeKind::SingletonMethodDef {
                singleton,
                name,
                params,
                body,
            } => {
                let singleton = self.eval_node(singleton, scope, self_val)?;
                let class = match singleton {
                    Value::Class(class) => class,
                    _ => {
                        return Err(RubyError::typeerr(format!(
                            "can't define singleton method for {}",
                            self.describe(&singleton)
                        ))
                        .with_loc(node.loc()))
                    }
                };
                let method = MethodInfo::ruby_func(*name, params.clone(), body.clone(), scope.clone());
                debug!(
                    method = self.get_ident_name(*name),
                    class = self.provider.name(class),
                    "class method defined"
                );
                self.provider.get_mut(class).add_class_method(method);
                Ok(Value::Symbol(*name))
            }
            NodeKind::ClassDef {
                name,
                superclass,
                body,
            } => {
                let superclass = match superclass {
                    Some(node) => match self.eval_node(node, scope, self_val)? {
                        Value::Class(class) => Some(class),
                        val => {
                            return Err(RubyError::typeerr(format!(
                                "superclass must be a Class ({} given)",
                                self.provider.class_name_of(&val)
                            ))
                            .with_loc(node.loc()))
                        }
                    },
                    None => None,
                };
                let class = self
                    .define_class(*name, superclass)
                    .map_err(|err| err.with_loc(node.loc()))?;
                let class_val = Value::Class(class);
                self.eval_node(body, &scope.child(), &class_val)
            }
            NodeKind::Send {
                receiver,
                method,
                args,
            } => {
                let receiver = match receiver {
                    Some(receiver) => Some(self.eval_node(receiver, scope, self_val)?),
                    None => None,
                };
                let args = self.eval_args(args, scope, self_val)?;
                let res = match receiver {
                    Some(receiver) => self.send(receiver, *method, &args),
                    None => match scope.get(*method) {
                        Some(Value::Method(method_obj)) => self.call_method_obj(&method_obj, &args),
                        _ => self.send(self_val.clone(), *method, &args),
                    },
                };
                res.map_err(|err| err.with_loc(node.loc()))
            }
        }
    }

    fn eval_args(&mut self, args: &[Node], scope: &Scope, self_val: &Value) -> Result<Vec<Value>, RubyError> {
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            vals.push(self.eval_node(arg, scope, self_val)?);
        }
        Ok(vals)
    }

    fn eval_assign(&mut self, lhs: &Node, rhs: Value, scope: &Scope, self_val: &Value) -> EvalResult {
        match &lhs.kind {
            NodeKind::Ident(id) => scope.set(*id, rhs.clone()),
            NodeKind::InstanceVar(id) => match self_val {
                Value::Object(obj) => {
                    obj.borrow_mut().ivars.insert(*id, rhs.clone());
                }
                _ => {
                    return Err(RubyError::runtime(format!(
                        "can't modify instance variable of {}",
                        self.describe(self_val)
                    ))
                    .with_loc(lhs.loc()))
                }
            },
            NodeKind::Const(id) => {
                self.const_table.insert(*id, rhs.clone());
            }
            NodeKind::Send {
                receiver: Some(receiver),
                method,
                args,
            } => {
                let receiver = self.eval_node(receiver, scope, self_val)?;
                let mut args = self.eval_args(args, scope, self_val)?;
                args.push(rhs.clone());
                let setter = if *method == IdentId::_INDEX {
                    IdentId::_INDEX_ASSIGN
                } else {
                    let name = format!("{}=", self.get_ident_name(*method));
                    self.get_ident_id(&name)
                };
                self.send(receiver, setter, &args)
                    .map_err(|err| err.with_loc(lhs.loc()))?;
            }
            _ => {
                return Err(RubyError::internal("unsupported assignment target").with_loc(lhs.loc()))
            }
        };
        Ok(rhs)
    }

    fn eval_begin(
        &mut self,
        body: &Node,
        rescue: &[RescueEntry],
        else_: &Node,
        ensure: &Node,
        scope: &Scope,
        self_val: &Value,
    ) -> EvalResult {
        let result = match self.eval_node(body, scope, self_val) {
            Ok(val) => {
                if else_.is_nop() {
                    Ok(val)
                } else {
                    self.eval_node(else_, scope, self_val)
                }
            }
            Err(err) => {
                let exception = match &err.kind {
                    RubyErrorKind::Raise(exception) => Some(exception.clone()),
                    _ => None,
                };
                match exception {
                    Some(exception) => match self.find_rescue(rescue, &exception, scope, self_val) {
                        Ok(Some(entry)) => {
                            if let Some(param) = entry.param {
                                scope.set(param, exception);
                            }
                            self.eval_node(&entry.body, scope, self_val)
                        }
                        Ok(None) => Err(err),
                        Err(rescue_err) => Err(rescue_err),
                    },
                    None => Err(err),
                }
            }
        };
        if !ensure.is_nop() {
            self.eval_node(ensure, scope, self_val)?;
        }
        result
    }

    /// First rescue clause whose class list matches `exception`.
    fn find_rescue<'b>(
        &mut self,
        rescue: &'b [RescueEntry],
        exception: &Value,
        scope: &Scope,
        self_val: &Value,
    ) -> Result<Option<&'b RescueEntry>, RubyError> {
        let exception_class = self.class_of(exception)?;
        for entry in rescue {
            let classes = if entry.exception_list.is_empty() {
                vec![self.classes.standard_error]
            } else {
                let mut classes = vec![];
                for node in &entry.exception_list {
                    match self.eval_node(node, scope, self_val)? {
                        Value::Class(class) => classes.push(class),
                        _ => {
                            return Err(RubyError::typeerr(
                                "class or module required for rescue clause",
                            )
                            .with_loc(node.loc()))
                        }
                    }
                }
                classes
            };
            if classes
                .iter()
                .any(|class| self.provider.is_subclass_of(exception_class, *class))
            {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Reopen the class bound to `name`, or create it under `superclass`
    /// (default `Object`).
    fn define_class(&mut self, name: IdentId, superclass: Option<ClassRef>) -> Result<ClassRef, RubyError> {
        let name = self.get_ident_name(name).to_string();
        match self.provider.find_class(&name) {
            Some(class) => {
                if let Some(superclass) = superclass {
                    if self.provider.get(class).superclass != Some(superclass) {
                        return Err(RubyError::typeerr(format!(
                            "superclass mismatch for class {}",
                            name
                        )));
                    }
                }
                debug!(class = name.as_str(), "class reopened");
                Ok(class)
            }
            None => {
                let superclass = superclass.unwrap_or(self.classes.object);
                let info = ClassInfo::new(name.as_str(), Some(superclass));
                let class = self.provider.register_class(&name, info);
                debug!(
                    class = name.as_str(),
                    superclass = self.provider.name(superclass),
                    "class defined"
                );
                Ok(class)
            }
        }
    }

    pub fn get_const(&self, id: IdentId) -> EvalResult {
        if let Some(val) = self.const_table.get(&id) {
            return Ok(val.clone());
        }
        let class = self.provider.class_with_name(self.get_ident_name(id))?;
        Ok(Value::Class(class))
    }
}

// Method dispatch
impl Evaluator {
    /// The class dispatch starts from. Primitives resolve to their
    /// well-known class by name.
    pub fn class_of(&self, val: &Value) -> Result<ClassRef, RubyError> {
        let name = match val {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Symbol(_) => "Symbol",
            Value::Class(_) => "Class",
            Value::String(s) => return Ok(s.borrow().class),
            Value::Array(a) => return Ok(a.borrow().class),
            Value::Object(o) => return Ok(o.borrow().class),
            Value::Method(m) => return Ok(m.borrow().class),
        };
        self.provider.class_with_name(name)
    }

    /// Resolve `id` for `receiver`. A class receiver searches its class-level
    /// methods up the superclass chain, then the instance methods of `Class`.
    pub fn find_method(&self, receiver: &Value, id: IdentId) -> Result<Option<MethodRef>, RubyError> {
        Ok(self.find_method_with_owner(receiver, id)?.map(|(method, _)| method))
    }

    pub fn find_method_with_owner(
        &self,
        receiver: &Value,
        id: IdentId,
    ) -> Result<Option<(MethodRef, ClassRef)>, RubyError> {
        let found = match receiver {
            Value::Class(class) => match self.provider.search_class_method(*class, id) {
                Some(found) => Some(found),
                None => {
                    let class_class = self.class_of(receiver)?;
                    self.provider.search_method(class_class, id)
                }
            },
            _ => {
                let class = self.class_of(receiver)?;
                self.provider.search_method(class, id)
            }
        };
        if let Some((method, owner)) = &found {
            trace!(
                method = self.get_ident_name(id),
                owner = self.provider.name(*owner),
                builtin = method.is_builtin(),
                "method resolved"
            );
        }
        Ok(found)
    }

    /// Full dispatch: resolve and invoke, falling back to `method_missing`.
    pub fn send(&mut self, receiver: Value, id: IdentId, args: &[Value]) -> EvalResult {
        match self.find_method(&receiver, id)? {
            Some(method) => self.invoke_method(&method, receiver, args),
            None => self.send_method_missing(receiver, id, args),
        }
    }

    fn send_method_missing(&mut self, receiver: Value, id: IdentId, args: &[Value]) -> EvalResult {
        match self.find_method(&receiver, IdentId::METHOD_MISSING)? {
            Some(method) => {
                let mut mm_args = vec![Value::Symbol(id)];
                mm_args.extend_from_slice(args);
                self.invoke_method(&method, receiver, &mm_args)
            }
            None => Err(RubyError::nomethod(format!(
                "undefined method '{}' for {}",
                self.get_ident_name(id),
                self.describe(&receiver)
            ))),
        }
    }

    /// Invoke a resolved method on `receiver`.
    pub fn invoke_method(&mut self, method: &MethodRef, receiver: Value, args: &[Value]) -> EvalResult {
        method.arity().check(args.len())?;
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RubyError::new_runtime_err(
                RuntimeErrKind::StackOverflow,
                "stack level too deep",
            ));
        }
        self.call_depth += 1;
        let res = ensure_sufficient_stack(|| match &**method {
            MethodInfo::BuiltinFunc { func, .. } => func(self, receiver, args),
            MethodInfo::RubyFunc {
                params,
                body,
                scope,
                ..
            } => self.invoke_ruby_func(params, body, scope, receiver, args),
        });
        self.call_depth -= 1;
        res
    }

    fn invoke_ruby_func(
        &mut self,
        params: &[Param],
        body: &Node,
        scope: &Scope,
        receiver: Value,
        args: &[Value],
    ) -> EvalResult {
        let scope = scope.child();
        for (i, param) in params.iter().enumerate() {
            let val = match (args.get(i), &param.default) {
                (Some(arg), _) => arg.clone(),
                (None, Some(default)) => self.eval_node(default, &scope, &receiver)?,
                (None, None) => Value::Nil,
            };
            scope.set(param.name, val);
        }
        match self.eval_node(body, &scope, &receiver) {
            Ok(val) => Ok(val),
            Err(err) => match err.kind {
                RubyErrorKind::MethodReturn(val) => Ok(val),
                RubyErrorKind::Break(_) | RubyErrorKind::Next(_) => Err(err.conv_localjump_err()),
                _ => Err(err),
            },
        }
    }

    pub fn call_method_obj(&mut self, method_obj: &MethodObjRef, args: &[Value]) -> EvalResult {
        let (method, receiver) = {
            let info = method_obj.borrow();
            (info.method.clone(), info.receiver.clone())
        };
        self.invoke_method(&method, receiver, args)
    }

    /// Wrap the method `id` of `receiver` into a callable `Method` value.
    pub fn new_method_object(&mut self, receiver: Value, id: IdentId) -> EvalResult {
        match self.find_method_with_owner(&receiver, id)? {
            Some((method, owner)) => Ok(Value::Method(Ref::new(MethodObjInfo {
                class: self.classes.method,
                name: id,
                receiver,
                method,
                owner,
            }))),
            None => Err(RubyError::name(format!(
                "undefined method '{}' for {}",
                self.get_ident_name(id),
                self.describe(&receiver)
            ))),
        }
    }
}

// Value construction and conversion
impl Evaluator {
    pub fn new_string(&self, s: impl Into<String>) -> Value {
        Value::String(Ref::new(RString::new(self.classes.string, s)))
    }

    pub fn new_array(&self, elements: Vec<Value>) -> Value {
        Value::Array(Ref::new(ArrayInfo::new(self.classes.array, elements)))
    }

    pub fn new_symbol(&mut self, name: &str) -> Value {
        Value::Symbol(self.get_ident_id(name))
    }

    /// Instantiate the exception class `class_name` with `message`.
    pub fn new_exception(&mut self, class_name: &str, message: impl Into<String>) -> EvalResult {
        let class = self.provider.class_with_name(class_name)?;
        let message = self.new_string(message);
        self.send(Value::Class(class), IdentId::NEW, &[message])
    }

    pub fn is_a(&self, val: &Value, class: ClassRef) -> Result<bool, RubyError> {
        let own = self.class_of(val)?;
        Ok(self.provider.is_subclass_of(own, class))
    }

    /// Receiver description used in error messages.
    pub fn describe(&self, val: &Value) -> String {
        match val {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Class(class) => format!("class {}", self.provider.name(*class)),
            _ if val.identical(&self.main_object) => "main:Object".to_string(),
            _ => format!("an instance of {}", self.provider.class_name_of(val)),
        }
    }

    /// `to_s` of `val` through dispatch, so that user overrides are honored.
    pub fn val_to_s(&mut self, val: &Value) -> Result<String, RubyError> {
        if let Value::String(s) = val {
            return Ok(s.borrow().string.clone());
        }
        let res = self.send(val.clone(), IdentId::TO_S, &[])?;
        match res.as_string() {
            Some(s) => Ok(s),
            None => Ok(self.default_to_s(val)),
        }
    }

    pub fn val_inspect(&mut self, val: &Value) -> Result<String, RubyError> {
        let res = self.send(val.clone(), IdentId::INSPECT, &[])?;
        match res.as_string() {
            Some(s) => Ok(s),
            None => Ok(self.default_to_s(val)),
        }
    }

    pub fn default_to_s(&self, val: &Value) -> String {
        if val.identical(&self.main_object) {
            return "main".to_string();
        }
        format!("#<{}>", self.provider.class_name_of(val))
    }

    /// `message` of an exception object: its `@message`, or the class name.
    pub fn exception_message(&self, exception: &Value) -> String {
        if let Value::Object(obj) = exception {
            if let Some(Value::String(msg)) = obj.borrow().ivars.get(&IdentId::MESSAGE) {
                return msg.borrow().string.clone();
            }
        }
        self.provider.class_name_of(exception)
    }

    /// User-facing rendering of an error which reached the top level.
    pub fn error_message(&self, err: &RubyError) -> String {
        match &err.kind {
            RubyErrorKind::Raise(exception) => format!(
                "{} ({})",
                self.exception_message(exception),
                self.provider.class_name_of(exception)
            ),
            _ => err.to_string(),
        }
    }

    pub fn show_error(&self, err: &RubyError) {
        if let Some(loc) = err.loc {
            self.source_info.show_loc(&loc);
        }
        eprintln!("{}", self.error_message(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_primitive_classes() {
        let eval = Evaluator::new();
        let integer = eval.class_of(&Value::Integer(1)).unwrap();
        assert_eq!("Integer", eval.provider.name(integer));
        let nil = eval.class_of(&Value::Nil).unwrap();
        assert_eq!("NilClass", eval.provider.name(nil));
    }

    #[test]
    fn independent_runtimes() {
        let mut eval1 = Evaluator::new();
        let mut eval2 = Evaluator::new();
        eval1.run("class Integer; def wiggle; 1; end; end").unwrap();
        assert_eq!(Value::Integer(1), eval1.run("3.wiggle").unwrap());
        let err = eval2.run("3.wiggle").unwrap_err();
        assert_eq!(Some(RuntimeErrKind::NoMethod), err.runtime_kind());
    }

    #[test]
    fn top_level_return() {
        let mut eval = Evaluator::new();
        assert_eq!(Value::Integer(7), eval.run("return 7; 8").unwrap());
        let err = eval.run("break").unwrap_err();
        assert_eq!(Some(RuntimeErrKind::LocalJump), err.runtime_kind());
    }

    #[test]
    fn locals_survive_between_runs() {
        let mut eval = Evaluator::new();
        eval.run("x = 10").unwrap();
        assert_eq!(Value::Integer(9), eval.run("x -1").unwrap());
    }

    #[test]
    fn error_location() {
        let mut eval = Evaluator::new();
        let err = eval.run("a = 1\nnil.wiggle").unwrap_err();
        assert_eq!(Some(RuntimeErrKind::NoMethod), err.runtime_kind());
        let loc = err.loc.unwrap();
        assert_eq!(2, eval.source_info.line_no(loc.0));
    }
}
