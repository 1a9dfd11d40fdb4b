//! The environment chain. A `ScopeHandle` is a strong `Rc` so a closure can
//! keep its defining scope alive after the block that created it returns —
//! scopes form a DAG, not a tree with a single owner.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::object::Value;

pub type ScopeHandle = Rc<RefCell<ScopeData>>;

pub struct ScopeData {
    vars: HashMap<String, Value>,
    parent: Option<ScopeHandle>,
}

pub fn new_scope(parent: Option<ScopeHandle>) -> ScopeHandle {
    Rc::new(RefCell::new(ScopeData { vars: HashMap::new(), parent }))
}

/// Insert or overwrite `name` in `scope`'s own bindings.
pub fn define(scope: &ScopeHandle, name: &str, value: Value) {
    scope.borrow_mut().vars.insert(name.to_owned(), value);
}

/// Walk `hops` parents then read. The checker guarantees the binding
/// exists at that depth.
pub fn get_resolved(scope: &ScopeHandle, name: &str, hops: usize) -> Value {
    let target = ancestor(scope, hops);
    target
        .borrow()
        .vars
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("checker guaranteed '{name}' exists {hops} hops up"))
}

pub fn set_resolved(scope: &ScopeHandle, name: &str, hops: usize, value: Value) {
    let target = ancestor(scope, hops);
    target.borrow_mut().vars.insert(name.to_owned(), value);
}

fn ancestor(scope: &ScopeHandle, hops: usize) -> ScopeHandle {
    let mut current = Rc::clone(scope);
    for _ in 0..hops {
        let parent = current
            .borrow()
            .parent
            .clone()
            .unwrap_or_else(|| panic!("checker guaranteed a scope {hops} hops up"));
        current = parent;
    }
    current
}

/// Search only the global scope — the root of the chain.
pub fn get_unresolved(scope: &ScopeHandle, name: &str) -> Option<Value> {
    globals_of(scope).borrow().vars.get(name).cloned()
}

/// Returns `false` if `name` is absent from the global scope.
pub fn set_unresolved(scope: &ScopeHandle, name: &str, value: Value) -> bool {
    let globals = globals_of(scope);
    let mut data = globals.borrow_mut();
    if data.vars.contains_key(name) {
        data.vars.insert(name.to_owned(), value);
        true
    } else {
        false
    }
}

fn globals_of(scope: &ScopeHandle) -> ScopeHandle {
    let mut current = Rc::clone(scope);
    loop {
        let parent = current.borrow().parent.clone();
        match parent {
            Some(p) => current = p,
            None => return current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_resolve_in_same_scope() {
        let global = new_scope(None);
        define(&global, "x", Value::Number(1.0));
        assert!(matches!(get_resolved(&global, "x", 0), Value::Number(n) if n == 1.0));
    }

    #[test]
    fn resolved_lookup_walks_parents() {
        let global = new_scope(None);
        define(&global, "x", Value::Number(1.0));
        let child = new_scope(Some(Rc::clone(&global)));
        let grandchild = new_scope(Some(child));
        assert!(matches!(get_resolved(&grandchild, "x", 2), Value::Number(n) if n == 1.0));
    }

    #[test]
    fn unresolved_lookup_only_sees_globals() {
        let global = new_scope(None);
        define(&global, "x", Value::Number(1.0));
        let child = new_scope(Some(Rc::clone(&global)));
        define(&child, "y", Value::Number(2.0));
        assert!(get_unresolved(&child, "x").is_some());
        assert!(get_unresolved(&child, "y").is_none());
    }

    #[test]
    fn set_unresolved_fails_when_global_absent() {
        let global = new_scope(None);
        assert!(!set_unresolved(&global, "missing", Value::Nil));
    }
}
