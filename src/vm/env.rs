//! Runtime environments for variable scopes.

use indexmap::IndexMap;

use super::value::Value;

/// Index of an environment in the [`Environments`] arena.
pub type EnvId = usize;

/// The global environment, which has no parent and is never popped.
pub const GLOBAL: EnvId = 0;

#[derive(Debug)]
struct Environment {
    bindings: IndexMap<String, Value>,
    parent: Option<EnvId>,
}

impl Environment {
    fn new(parent: Option<EnvId>) -> Self {
        Self {
            bindings: IndexMap::new(),
            parent,
        }
    }
}

/// Chain of environments stored in an arena.
///
/// Scopes are entered and left in strict LIFO order, so the current
/// environment is always the last one in the arena.
#[derive(Debug)]
pub struct Environments {
    envs: Vec<Environment>,
    max_bindings: usize,
}

impl Environments {
    pub fn new(max_bindings: usize) -> Self {
        Self {
            envs: vec![Environment::new(None)],
            max_bindings,
        }
    }

    pub fn current(&self) -> EnvId {
        self.envs.len() - 1
    }

    /// Number of environments in the chain, the global one included.
    pub fn depth(&self) -> usize {
        self.envs.len()
    }

    /// Enter a new child of the current environment.
    pub fn push(&mut self) -> EnvId {
        let parent = self.current();
        self.envs.push(Environment::new(Some(parent)));
        self.current()
    }

    /// Leave the current environment, releasing its bindings.
    /// Returns the restored parent, or `None` at the global environment.
    pub fn pop(&mut self) -> Option<EnvId> {
        let parent = self.envs.last()?.parent?;
        self.envs.pop();
        Some(parent)
    }

    /// Bind a name in the current environment only.
    /// Returns false if the name is new and the environment is full.
    pub fn define(&mut self, name: &str, value: Value) -> bool {
        let max = self.max_bindings;
        let env = self.current_mut();
        if let Some(slot) = env.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        if env.bindings.len() >= max {
            return false;
        }
        env.bindings.insert(name.to_string(), value);
        true
    }

    /// Get a variable's value, searching up the scope chain.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut id = Some(self.current());
        while let Some(current) = id {
            let env = &self.envs[current];
            if let Some(value) = env.bindings.get(name) {
                return Some(value);
            }
            id = env.parent;
        }
        None
    }

    fn current_mut(&mut self) -> &mut Environment {
        let id = self.current();
        &mut self.envs[id]
    }
}
