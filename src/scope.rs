use crate::util::{IdentId, Ref};
use crate::value::Value;
use fxhash::FxHashMap;

/// A lexical scope: local variable bindings plus an optional enclosing scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope(Ref<ScopeInfo>);

#[derive(Debug)]
pub struct ScopeInfo {
    vars: FxHashMap<IdentId, Value>,
    parent: Option<Scope>,
}

impl Scope {
    pub fn new_top() -> Self {
        Scope(Ref::new(ScopeInfo {
            vars: FxHashMap::default(),
            parent: None,
        }))
    }

    pub fn child(&self) -> Self {
        Scope(Ref::new(ScopeInfo {
            vars: FxHashMap::default(),
            parent: Some(self.clone()),
        }))
    }

    /// Look `id` up, innermost scope first.
    pub fn get(&self, id: IdentId) -> Option<Value> {
        let mut scope = self.clone();
        loop {
            let parent = {
                let info = scope.0.borrow();
                if let Some(val) = info.vars.get(&id) {
                    return Some(val.clone());
                }
                info.parent.clone()
            };
            match parent {
                Some(parent) => scope = parent,
                None => return None,
            }
        }
    }

    /// Bind `id` in this scope, shadowing any outer binding.
    pub fn set(&self, id: IdentId, val: Value) {
        self.0.borrow_mut().vars.insert(id, val);
    }

    /// Names bound directly in this scope.
    pub fn local_names(&self) -> Vec<IdentId> {
        self.0.borrow().vars.keys().cloned().collect()
    }
}
