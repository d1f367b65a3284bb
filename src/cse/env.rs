//! Lexical environments: a parent-linked tree of name→value tables.
//!
//! Environments are created empty (the control builder allocates
//! placeholders; the machine allocates one per closure application) and
//! filled by Rule 2/3 bindings. The parent link is fixed at creation and
//! never rewritten, so the tree stays acyclic and lookup terminates.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::builtins::Builtin;
use super::value::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

pub struct Environment {
    parent: Option<EnvRef>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// The primitive environment, pre-binding the built-in functions.
    pub fn primitive() -> EnvRef {
        let mut bindings = HashMap::new();
        for builtin in Builtin::ALL {
            bindings.insert(builtin.name().to_string(), Value::Builtin(*builtin));
        }
        Rc::new(RefCell::new(Environment {
            parent: None,
            bindings,
        }))
    }

    /// A fresh, empty environment whose parent is `parent`.
    pub fn child_of(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            parent: Some(Rc::clone(parent)),
            bindings: HashMap::new(),
        }))
    }

    /// Bind a name locally. Duplicates within one scope overwrite silently.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Resolve a name here or in an ancestor scope.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.bindings
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.borrow().lookup(name)))
    }
}

// Bindings can hold closures over ancestor environments, so the derived
// Debug would re-print whole ancestor scopes. Names are enough.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
