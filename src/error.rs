use crate::util::Loc;
use crate::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct RubyError {
    pub kind: RubyErrorKind,
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RubyErrorKind {
    ParseErr(ParseErrKind),
    RuntimeErr {
        kind: RuntimeErrKind,
        message: String,
    },
    /// An exception object raised by evaluated code.
    Raise(Value),
    MethodReturn(Value),
    Break(Value),
    Next(Value),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrKind {
    #[error("unexpected end-of-input")]
    UnexpectedEOF,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("{0}")]
    SyntaxError(String),
}

/// Host-detected failures. Each kind displays as the name of the Ruby
/// exception class it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeErrKind {
    #[error("NameError")]
    UnresolvedClass,
    #[error("NoMethodError")]
    NoMethod,
    #[error("ArgumentError")]
    Argument,
    #[error("TypeError")]
    Type,
    #[error("NameError")]
    Name,
    #[error("ZeroDivisionError")]
    ZeroDivision,
    #[error("RangeError")]
    Range,
    #[error("IndexError")]
    Index,
    #[error("LocalJumpError")]
    LocalJump,
    #[error("SystemStackError")]
    StackOverflow,
    #[error("RuntimeError")]
    Runtime,
    #[error("InternalError")]
    Internal,
}

impl RubyError {
    pub fn new(kind: RubyErrorKind) -> Self {
        RubyError { kind, loc: None }
    }

    /// Attach `loc` unless a more precise location was already recorded.
    pub fn with_loc(mut self, loc: Loc) -> Self {
        if self.loc.is_none() {
            self.loc = Some(loc);
        }
        self
    }

    pub fn new_parse_err(kind: ParseErrKind, loc: Loc) -> Self {
        RubyError::new(RubyErrorKind::ParseErr(kind)).with_loc(loc)
    }

    pub fn new_runtime_err(kind: RuntimeErrKind, message: impl Into<String>) -> Self {
        RubyError::new(RubyErrorKind::RuntimeErr {
            kind,
            message: message.into(),
        })
    }

    pub fn unresolved_class(name: &str) -> Self {
        RubyError::new_runtime_err(
            RuntimeErrKind::UnresolvedClass,
            format!("uninitialized constant {}", name),
        )
    }

    pub fn nomethod(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::NoMethod, msg)
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Argument, msg)
    }

    pub fn wrong_args(given: usize, expected: impl std::fmt::Display) -> Self {
        RubyError::argument(format!(
            "wrong number of arguments (given {}, expected {})",
            given, expected
        ))
    }

    pub fn typeerr(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Type, msg)
    }

    pub fn name(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Name, msg)
    }

    pub fn zero_div() -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::ZeroDivision, "divided by 0")
    }

    pub fn range(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Range, msg)
    }

    pub fn index(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Index, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Runtime, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RubyError::new_runtime_err(RuntimeErrKind::Internal, msg)
    }

    pub fn raise(exception: Value) -> Self {
        RubyError::new(RubyErrorKind::Raise(exception))
    }

    pub fn method_return(val: Value) -> Self {
        RubyError::new(RubyErrorKind::MethodReturn(val))
    }

    pub fn break_loop(val: Value) -> Self {
        RubyError::new(RubyErrorKind::Break(val))
    }

    pub fn next_loop(val: Value) -> Self {
        RubyError::new(RubyErrorKind::Next(val))
    }

    /// Convert a control signal that escaped its construct into a LocalJumpError.
    pub fn conv_localjump_err(self) -> Self {
        let what = match &self.kind {
            RubyErrorKind::Break(_) => "break from proc-closure",
            RubyErrorKind::Next(_) => "next used outside of a loop",
            RubyErrorKind::MethodReturn(_) => "unexpected return",
            _ => return self,
        };
        let loc = self.loc;
        let mut err = RubyError::new_runtime_err(RuntimeErrKind::LocalJump, what);
        err.loc = loc;
        err
    }
}

impl RubyError {
    pub fn runtime_kind(&self) -> Option<RuntimeErrKind> {
        match &self.kind {
            RubyErrorKind::RuntimeErr { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_parse_err(&self) -> bool {
        matches!(self.kind, RubyErrorKind::ParseErr(_))
    }

    pub fn is_unexpected_eof(&self) -> bool {
        self.kind == RubyErrorKind::ParseErr(ParseErrKind::UnexpectedEOF)
    }

    /// True for exceptions raised by the program itself, as opposed to
    /// failures detected by the runtime.
    pub fn is_user_raised(&self) -> bool {
        matches!(self.kind, RubyErrorKind::Raise(_))
    }

    pub fn is_method_return(&self) -> bool {
        matches!(self.kind, RubyErrorKind::MethodReturn(_))
    }
}

impl std::fmt::Display for RubyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            RubyErrorKind::ParseErr(kind) => write!(f, "SyntaxError: {}", kind),
            RubyErrorKind::RuntimeErr { kind, message } => write!(f, "{} ({})", message, kind),
            RubyErrorKind::Raise(exception) => write!(f, "unhandled exception {:?}", exception),
            RubyErrorKind::MethodReturn(_) | RubyErrorKind::Break(_) | RubyErrorKind::Next(_) => {
                write!(f, "LocalJumpError")
            }
        }
    }
}

impl std::error::Error for RubyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        let err = RubyError::nomethod("undefined method 'wiggle' for an instance of Object");
        assert_eq!(Some(RuntimeErrKind::NoMethod), err.runtime_kind());
        assert_eq!(
            "undefined method 'wiggle' for an instance of Object (NoMethodError)",
            err.to_string()
        );
        assert_eq!("NameError", RuntimeErrKind::UnresolvedClass.to_string());
    }

    #[test]
    fn loc_is_kept() {
        let err = RubyError::typeerr("x").with_loc(Loc(3, 4)).with_loc(Loc(0, 9));
        assert_eq!(Some(Loc(3, 4)), err.loc);
        let err = RubyError::break_loop(Value::Nil).conv_localjump_err();
        assert_eq!(Some(RuntimeErrKind::LocalJump), err.runtime_kind());
    }
}
