pub mod builtin;
pub mod class;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod loader;
pub mod method;
pub mod node;
pub mod parser;
pub mod scope;
pub mod stack;
pub mod test;
pub mod token;
pub mod util;
pub mod value;

pub use crate::class::{ClassInfo, ClassProvider, ClassRef, ObjKind};
pub use crate::error::{RubyError, RubyErrorKind, RuntimeErrKind};
pub use crate::eval::{EvalResult, Evaluator};
pub use crate::method::{Arity, MethodInfo, MethodRef};
pub use crate::scope::Scope;
pub use crate::util::{IdentId, Ref};
pub use crate::value::Value;
