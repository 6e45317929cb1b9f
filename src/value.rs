use crate::class::ClassRef;
use crate::method::MethodRef;
use crate::util::*;
use fxhash::FxHashMap;

pub type StringRef = Ref<RString>;
pub type ArrayRef = Ref<ArrayInfo>;
pub type ObjectRef = Ref<ObjectInfo>;
pub type MethodObjRef = Ref<MethodObjInfo>;

/// A runtime value.
///
/// Primitive values are copied, heap values (`String`, `Array`, `Object`,
/// `Method`) are shared handles: cloning the `Value` aliases the payload.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(StringRef),
    Symbol(IdentId),
    Array(ArrayRef),
    Class(ClassRef),
    Object(ObjectRef),
    Method(MethodObjRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RString {
    pub class: ClassRef,
    pub string: String,
}

impl RString {
    pub fn new(class: ClassRef, string: impl Into<String>) -> Self {
        RString {
            class,
            string: string.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayInfo {
    pub class: ClassRef,
    pub elements: Vec<Value>,
}

impl ArrayInfo {
    pub fn new(class: ClassRef, elements: Vec<Value>) -> Self {
        ArrayInfo { class, elements }
    }
}

/// A plain object: its class and its instance variables.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub class: ClassRef,
    pub ivars: FxHashMap<IdentId, Value>,
}

impl ObjectInfo {
    pub fn new(class: ClassRef) -> Self {
        ObjectInfo {
            class,
            ivars: FxHashMap::default(),
        }
    }
}

/// A method bound to its receiver (`obj.method(:foo)`, or a native function
/// placed in a scope).
#[derive(Debug, Clone)]
pub struct MethodObjInfo {
    pub class: ClassRef,
    pub name: IdentId,
    pub receiver: Value,
    pub method: MethodRef,
    pub owner: ClassRef,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Integer(lhs), Value::Integer(rhs)) => lhs == rhs,
            (Value::Float(lhs), Value::Float(rhs)) => lhs == rhs,
            (Value::String(lhs), Value::String(rhs)) => {
                lhs == rhs || lhs.borrow().string == rhs.borrow().string
            }
            (Value::Symbol(lhs), Value::Symbol(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => {
                lhs == rhs || lhs.borrow().elements == rhs.borrow().elements
            }
            (Value::Class(lhs), Value::Class(rhs)) => lhs == rhs,
            (Value::Object(lhs), Value::Object(rhs)) => lhs == rhs,
            (Value::Method(lhs), Value::Method(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn to_bool(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_rstring(&self) -> Option<&StringRef> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Copy of the string contents.
    pub fn as_string(&self) -> Option<String> {
        self.as_rstring().map(|s| s.borrow().string.clone())
    }

    pub fn as_symbol(&self) -> Option<IdentId> {
        match self {
            Value::Symbol(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<ClassRef> {
        match self {
            Value::Class(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodObjRef> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Identity comparison (`equal?`). Heap values are identical only when
    /// they share the payload.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(lhs), Value::String(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => lhs == rhs,
            (Value::Float(lhs), Value::Float(rhs)) => lhs.to_bits() == rhs.to_bits(),
            _ => self == other,
        }
    }

    pub fn object_id(&self) -> u64 {
        match self {
            Value::Nil => 8,
            Value::Bool(false) => 0,
            Value::Bool(true) => 20,
            Value::Integer(i) => (*i as u64).wrapping_mul(2).wrapping_add(1),
            Value::Float(f) => f.to_bits() | 2,
            Value::Symbol(id) => (usize::from(*id) as u64) * 256 + 12,
            Value::Class(class) => (class.index() as u64) * 256 + 16,
            Value::String(r) => r.id(),
            Value::Array(r) => r.id(),
            Value::Object(r) => r.id(),
            Value::Method(r) => r.id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Nil.to_bool());
        assert!(!Value::Bool(false).to_bool());
        assert!(Value::Integer(0).to_bool());
        assert!(Value::Bool(true).to_bool());
    }

    #[test]
    fn equality_and_identity() {
        let class = ClassRef::from_index(0);
        let s1 = Value::String(Ref::new(RString::new(class, "abc")));
        let s2 = Value::String(Ref::new(RString::new(class, "abc")));
        assert_eq!(s1, s2);
        assert!(!s1.identical(&s2));
        assert!(s1.identical(&s1.clone()));
        assert_eq!(Value::Integer(3), Value::Integer(3));
        assert_ne!(Value::Integer(3), Value::Float(3.0));
        let o1 = Value::Object(Ref::new(ObjectInfo::new(class)));
        let o2 = Value::Object(Ref::new(ObjectInfo::new(class)));
        assert_ne!(o1, o2);
        assert_eq!(o1, o1.clone());
    }
}
