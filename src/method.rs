use crate::error::RubyError;
use crate::eval::{EvalResult, Evaluator};
use crate::node::{Node, Param};
use crate::scope::Scope;
use crate::util::IdentId;
use crate::value::Value;
use std::rc::Rc;

pub type BuiltinFunc = dyn Fn(&mut Evaluator, Value, &[Value]) -> EvalResult;

pub type MethodRef = Rc<MethodInfo>;

/// A method body: either a native function or a user-defined AST.
///
/// Methods belong to a class, not to an instance; the receiver is passed
/// explicitly at each invocation.
#[derive(Clone)]
pub enum MethodInfo {
    BuiltinFunc {
        name: IdentId,
        arity: Arity,
        func: Rc<BuiltinFunc>,
    },
    RubyFunc {
        name: IdentId,
        params: Rc<Vec<Param>>,
        body: Rc<Node>,
        /// Scope the method was defined in. Invocations run in a child of it.
        scope: Scope,
    },
}

impl std::fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodInfo::BuiltinFunc { name, arity, .. } => {
                write!(f, "BuiltinFunc {:?} arity:{}", name, arity)
            }
            MethodInfo::RubyFunc { name, params, .. } => {
                write!(f, "RubyFunc {:?} params:{}", name, params.len())
            }
        }
    }
}

impl MethodInfo {
    pub fn builtin(
        name: IdentId,
        arity: Arity,
        func: impl Fn(&mut Evaluator, Value, &[Value]) -> EvalResult + 'static,
    ) -> MethodRef {
        Rc::new(MethodInfo::BuiltinFunc {
            name,
            arity,
            func: Rc::new(func),
        })
    }

    pub fn ruby_func(name: IdentId, params: Rc<Vec<Param>>, body: Rc<Node>, scope: Scope) -> MethodRef {
        Rc::new(MethodInfo::RubyFunc {
            name,
            params,
            body,
            scope,
        })
    }

    pub fn name(&self) -> IdentId {
        match self {
            MethodInfo::BuiltinFunc { name, .. } | MethodInfo::RubyFunc { name, .. } => *name,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            MethodInfo::BuiltinFunc { arity, .. } => *arity,
            MethodInfo::RubyFunc { params, .. } => {
                let required = params.iter().filter(|p| p.default.is_none()).count();
                Arity::range(required, params.len())
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, MethodInfo::BuiltinFunc { .. })
    }
}

/// Accepted argument counts of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` accepts any number of trailing arguments.
    pub max: Option<usize>,
}

impl Arity {
    pub fn exact(n: usize) -> Self {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub fn at_least(min: usize) -> Self {
        Arity { min, max: None }
    }

    pub fn check(&self, given: usize) -> Result<(), RubyError> {
        let too_many = match self.max {
            Some(max) => given > max,
            None => false,
        };
        if given < self.min || too_many {
            Err(RubyError::wrong_args(given, self))
        } else {
            Ok(())
        }
    }

    /// Value of `Method#arity`: the count for a fixed arity, otherwise
    /// `-(required + 1)`.
    pub fn to_i(&self) -> i64 {
        match self.max {
            Some(max) if max == self.min => self.min as i64,
            _ => -(self.min as i64) - 1,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}+", self.min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeErrKind;

    #[test]
    fn arity_check() {
        assert!(Arity::exact(1).check(1).is_ok());
        let err = Arity::exact(1).check(2).unwrap_err();
        assert_eq!(Some(RuntimeErrKind::Argument), err.runtime_kind());
        assert_eq!(
            "wrong number of arguments (given 2, expected 1) (ArgumentError)",
            err.to_string()
        );
        assert!(Arity::range(1, 2).check(0).is_err());
        assert!(Arity::at_least(1).check(10).is_ok());
        assert_eq!("0..2", Arity::range(0, 2).to_string());
        assert_eq!(-2, Arity::range(1, 2).to_i());
        assert_eq!(2, Arity::exact(2).to_i());
    }
}
