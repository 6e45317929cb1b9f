use crate::error::RubyError;
use crate::method::MethodRef;
use crate::util::*;
use crate::value::*;
use fxhash::FxHashMap;

/// Handle to a class registered in a `ClassProvider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassRef(usize);

impl std::hash::Hash for ClassRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl ClassRef {
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        ClassRef(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

pub type MethodTable = FxHashMap<IdentId, MethodRef>;

/// The primitive payload instances of a class carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Object,
    String,
    Array,
    /// Instances cannot be created with `new`.
    None,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    name: String,
    pub superclass: Option<ClassRef>,
    /// `None` inherits the superclass's kind.
    pub kind: Option<ObjKind>,
    instance_methods: MethodTable,
    class_methods: MethodTable,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, superclass: Option<ClassRef>) -> Self {
        ClassInfo {
            name: name.into(),
            superclass,
            kind: None,
            instance_methods: FxHashMap::default(),
            class_methods: FxHashMap::default(),
        }
    }

    pub fn with_kind(mut self, kind: ObjKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an instance method under its own name. The last definition wins.
    pub fn add_instance_method(&mut self, method: MethodRef) -> Option<MethodRef> {
        self.instance_methods.insert(method.name(), method)
    }

    pub fn add_class_method(&mut self, method: MethodRef) -> Option<MethodRef> {
        self.class_methods.insert(method.name(), method)
    }

    pub fn remove_instance_method(&mut self, id: IdentId) -> Option<MethodRef> {
        self.instance_methods.remove(&id)
    }

    pub fn get_instance_method(&self, id: IdentId) -> Option<&MethodRef> {
        self.instance_methods.get(&id)
    }

    pub fn get_class_method(&self, id: IdentId) -> Option<&MethodRef> {
        self.class_methods.get(&id)
    }

    pub fn instance_method_names(&self) -> Vec<IdentId> {
        let mut names: Vec<IdentId> = self.instance_methods.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Arena of every class of one runtime, plus the name bindings.
///
/// Classes are never freed, so a `ClassRef` stays valid even after its name
/// is rebound to another class.
#[derive(Debug, Clone, Default)]
pub struct ClassProvider {
    classes: Vec<ClassInfo>,
    names: FxHashMap<String, ClassRef>,
}

impl ClassProvider {
    pub fn new() -> Self {
        ClassProvider::default()
    }

    /// Register `info` and bind `name` to it, replacing any previous binding.
    pub fn register_class(&mut self, name: &str, info: ClassInfo) -> ClassRef {
        let class = ClassRef(self.classes.len());
        self.classes.push(info);
        self.names.insert(name.to_string(), class);
        class
    }

    pub fn find_class(&self, name: &str) -> Option<ClassRef> {
        self.names.get(name).cloned()
    }

    pub fn class_with_name(&self, name: &str) -> Result<ClassRef, RubyError> {
        self.find_class(name)
            .ok_or_else(|| RubyError::unresolved_class(name))
    }

    pub fn get(&self, class: ClassRef) -> &ClassInfo {
        self.classes
            .get(class.0)
            .unwrap_or_else(|| panic!("ClassProvider#get(): ClassRef is not valid."))
    }

    pub fn get_mut(&mut self, class: ClassRef) -> &mut ClassInfo {
        self.classes
            .get_mut(class.0)
            .unwrap_or_else(|| panic!("ClassProvider#get_mut(): ClassRef is not valid."))
    }

    pub fn name(&self, class: ClassRef) -> &str {
        self.get(class).name()
    }

    /// `class` itself, then its superclasses, nearest first.
    pub fn ancestors(&self, class: ClassRef) -> Ancestors<'_> {
        Ancestors {
            provider: self,
            next: Some(class),
        }
    }

    pub fn is_subclass_of(&self, class: ClassRef, ancestor: ClassRef) -> bool {
        self.ancestors(class).any(|c| c == ancestor)
    }

    /// Nearest instance method named `id` in the ancestry of `class`, with the
    /// class that owns it.
    pub fn search_method(&self, class: ClassRef, id: IdentId) -> Option<(MethodRef, ClassRef)> {
        self.ancestors(class).find_map(|c| {
            self.get(c)
                .get_instance_method(id)
                .map(|method| (method.clone(), c))
        })
    }

    /// Nearest class-level method named `id`, walking the superclass chain.
    pub fn search_class_method(
        &self,
        class: ClassRef,
        id: IdentId,
    ) -> Option<(MethodRef, ClassRef)> {
        self.ancestors(class).find_map(|c| {
            self.get(c)
                .get_class_method(id)
                .map(|method| (method.clone(), c))
        })
    }

    pub fn kind(&self, class: ClassRef) -> ObjKind {
        self.ancestors(class)
            .find_map(|c| self.get(c).kind)
            .unwrap_or(ObjKind::None)
    }

    /// Name of the class of `val`, for error messages.
    pub fn class_name_of(&self, val: &Value) -> String {
        let class = match val {
            Value::Nil => return "NilClass".to_string(),
            Value::Bool(true) => return "TrueClass".to_string(),
            Value::Bool(false) => return "FalseClass".to_string(),
            Value::Integer(_) => return "Integer".to_string(),
            Value::Float(_) => return "Float".to_string(),
            Value::Symbol(_) => return "Symbol".to_string(),
            Value::Class(_) => return "Class".to_string(),
            Value::String(s) => s.borrow().class,
            Value::Array(a) => a.borrow().class,
            Value::Object(o) => o.borrow().class,
            Value::Method(m) => m.borrow().class,
        };
        self.name(class).to_string()
    }

    /// Allocate an instance of `class`. The payload is chosen by the nearest
    /// ancestor's `ObjKind`; the instance's class is exactly `class`.
    pub fn new_instance(&self, class: ClassRef, args: &[Value]) -> Result<Value, RubyError> {
        match self.kind(class) {
            ObjKind::Object => Ok(Value::Object(Ref::new(ObjectInfo::new(class)))),
            ObjKind::String => {
                let string = match args {
                    [] => String::new(),
                    [Value::String(s)] => s.borrow().string.clone(),
                    [arg] => {
                        return Err(RubyError::typeerr(format!(
                            "no implicit conversion of {} into String",
                            self.class_name_of(arg)
                        )))
                    }
                    _ => return Err(RubyError::wrong_args(args.len(), "0..1")),
                };
                Ok(Value::String(Ref::new(RString::new(class, string))))
            }
            ObjKind::Array => {
                let (size, default) = match args {
                    [] => (0, Value::Nil),
                    [size] => (self.array_size(size)?, Value::Nil),
                    [size, default] => (self.array_size(size)?, default.clone()),
                    _ => return Err(RubyError::wrong_args(args.len(), "0..2")),
                };
                let mut elements = Vec::new();
                elements
                    .try_reserve_exact(size)
                    .map_err(|_| RubyError::argument("argument too big"))?;
                elements.resize(size, default);
                Ok(Value::Array(Ref::new(ArrayInfo::new(class, elements))))
            }
            ObjKind::None => Err(RubyError::typeerr(format!(
                "allocator undefined for {}",
                self.name(class)
            ))),
        }
    }

    fn array_size(&self, size: &Value) -> Result<usize, RubyError> {
        match size {
            Value::Integer(i) if *i < 0 => Err(RubyError::argument("negative array size")),
            Value::Integer(i) => Ok(*i as usize),
            _ => Err(RubyError::typeerr(format!(
                "no implicit conversion of {} into Integer",
                self.class_name_of(size)
            ))),
        }
    }
}

pub struct Ancestors<'a> {
    provider: &'a ClassProvider,
    next: Option<ClassRef>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = ClassRef;

    fn next(&mut self) -> Option<ClassRef> {
        let class = self.next?;
        self.next = self.provider.get(class).superclass;
        Some(class)
    }
}
