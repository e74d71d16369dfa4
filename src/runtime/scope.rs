use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A lexical scope: variables and functions defined locally, plus an
/// optional parent. Functions are keyed by `(name, arity)` so same-named
/// functions of different arity coexist.
pub struct Scope<V, F> {
    variables: HashMap<String, V>,
    functions: HashMap<(String, usize), F>,
    parent: Option<ScopeHandle<V, F>>,
}

/// Shared handle to a scope. Chains form a tree; lookups climb toward the
/// root while definitions always write locally, so shadowing in child
/// scopes is permitted.
pub struct ScopeHandle<V, F>(Rc<RefCell<Scope<V, F>>>);

impl<V, F> Clone for ScopeHandle<V, F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V, F> ScopeHandle<V, F> {
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    fn with_parent(parent: Option<Self>) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            variables: HashMap::new(),
            functions: HashMap::new(),
            parent,
        })))
    }

    pub fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.clone()
    }

    pub fn define_variable(&self, name: impl Into<String>, variable: V) {
        self.0.borrow_mut().variables.insert(name.into(), variable);
    }

    pub fn define_function(&self, name: impl Into<String>, arity: usize, function: F) {
        self.0
            .borrow_mut()
            .functions
            .insert((name.into(), arity), function);
    }

    pub fn lookup_variable(&self, name: &str) -> Option<V>
    where
        V: Clone,
    {
        let scope = self.0.borrow();
        if let Some(variable) = scope.variables.get(name) {
            return Some(variable.clone());
        }
        let parent = scope.parent.clone()?;
        drop(scope);
        parent.lookup_variable(name)
    }

    pub fn lookup_function(&self, name: &str, arity: usize) -> Option<F>
    where
        F: Clone,
    {
        let scope = self.0.borrow();
        if let Some(function) = scope.functions.get(&(name.to_string(), arity)) {
            return Some(function.clone());
        }
        let parent = scope.parent.clone()?;
        drop(scope);
        parent.lookup_function(name, arity)
    }

    /// Mutates a variable in place in the scope that owns it, climbing the
    /// chain like `lookup_variable`. Returns `None` if the name is unbound.
    pub fn with_variable_mut<R>(&self, name: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut scope = self.0.borrow_mut();
        if let Some(variable) = scope.variables.get_mut(name) {
            return Some(f(variable));
        }
        let parent = scope.parent.clone()?;
        drop(scope);
        parent.with_variable_mut(name, f)
    }
}
