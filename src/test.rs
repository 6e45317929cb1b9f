use crate::error::{RubyErrorKind, RuntimeErrKind};
use crate::eval::Evaluator;
use crate::util::Ref;
use crate::value::Value;
use std::io::Write;

/// In-memory sink for program output. Clones share the same buffer, so a
/// clone can be handed to an `Evaluator` and read back afterwards.
#[derive(Clone)]
pub struct OutputBuffer(Ref<Vec<u8>>);

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer(Ref::new(vec![]))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Evaluator whose output goes to a fresh `OutputBuffer`.
pub fn buffered_evaluator() -> (Evaluator, OutputBuffer) {
    let output = OutputBuffer::new();
    let eval = Evaluator::with_output(Box::new(output.clone()));
    (eval, output)
}

pub fn eval_script(script: impl Into<String>, expected: Value) {
    let script: String = script.into();
    let (mut eval, _) = buffered_evaluator();
    match eval.run(&script) {
        Ok(res) => {
            if res != expected {
                panic!("Expected:{:?} Got:{:?}", expected, res);
            }
        }
        Err(err) => {
            eval.show_error(&err);
            panic!("Got error: {}", eval.error_message(&err));
        }
    }
}

/// Run a script which checks itself with `assert`.
pub fn assert_script(script: impl Into<String>) {
    let script: String = script.into();
    let (mut eval, _) = buffered_evaluator();
    if let Err(err) = eval.run(&script) {
        eval.show_error(&err);
        panic!("Got error: {}", eval.error_message(&err));
    }
}

/// The script must fail with a host error of `kind`.
pub fn assert_error(script: impl Into<String>, kind: RuntimeErrKind) {
    let script: String = script.into();
    let (mut eval, _) = buffered_evaluator();
    match eval.run(&script) {
        Ok(res) => panic!("Expected {:?} error, but Ok({:?})", kind, res),
        Err(err) => {
            if err.runtime_kind() != Some(kind) {
                panic!(
                    "Expected {:?} error, but got {}",
                    kind,
                    eval.error_message(&err)
                );
            }
        }
    }
}

/// The script must end with an unrescued exception of class `class_name`.
pub fn assert_raise(script: impl Into<String>, class_name: &str) {
    let script: String = script.into();
    let (mut eval, _) = buffered_evaluator();
    match eval.run(&script) {
        Ok(res) => panic!("Expected {} to be raised, but Ok({:?})", class_name, res),
        Err(err) => match &err.kind {
            RubyErrorKind::Raise(exception) => {
                let actual = eval.provider.class_name_of(exception);
                if actual != class_name {
                    panic!("Expected {} to be raised, but got {}", class_name, actual);
                }
            }
            _ => panic!(
                "Expected {} to be raised, but got {}",
                class_name,
                eval.error_message(&err)
            ),
        },
    }
}

/// The script must succeed and write exactly `expected`.
pub fn assert_output(script: impl Into<String>, expected: &str) {
    let script: String = script.into();
    let (mut eval, output) = buffered_evaluator();
    if let Err(err) = eval.run(&script) {
        eval.show_error(&err);
        panic!("Got error: {}", eval.error_message(&err));
    }
    let actual = output.contents();
    if actual != expected {
        panic!("Expected output:{:?} Got:{:?}", expected, actual);
    }
}
