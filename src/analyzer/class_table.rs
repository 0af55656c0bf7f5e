use std::collections::HashMap;

use super::{ScopeId, Symbol, SymbolTable};

/// One registered class. `parent` names another entry of the same
/// [`ClassTable`]; `None` means the class derives from the implicit root.
/// The object size is not stored here: it is final once
/// [`OffsetTable::layout_class`](super::OffsetTable::layout_class) has run
/// and is read back with `OffsetTable::class_layout(name)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassNode {
    pub name: String,
    pub parent: Option<String>,
    /// Index of the class definition in `Program::classes`.
    pub def: usize,
    /// Scope holding the class's own fields and methods.
    pub scope: ScopeId,
}

#[derive(Clone, Debug, Default)]
pub struct ClassTable {
    classes: HashMap<String, ClassNode>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class. The caller has already checked that `parent` is
    /// registered and that `name` is not.
    pub fn insert(&mut self, name: &str, parent: Option<&str>, def: usize, scope: ScopeId) {
        let node = ClassNode {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            def,
            scope,
        };
        self.classes.insert(name.to_string(), node);
    }

    pub fn lookup(&self, name: &str) -> Option<&ClassNode> {
        self.classes.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&ClassNode> {
        let parent = self.lookup(name)?.parent.as_deref()?;
        self.lookup(parent)
    }

    /// Iterates over `name` and then each of its ancestors up to the root.
    pub fn ancestors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassNode> + 'a {
        let mut next = self.lookup(name);
        std::iter::from_fn(move || {
            let node = next?;
            next = node.parent.as_deref().and_then(|p| self.lookup(p));
            Some(node)
        })
    }

    /// Resolves `member` starting at class `start`: the nearest class in the
    /// inheritance chain declaring it wins. Returns that class and the
    /// member's symbol.
    pub fn resolve_member<'a>(
        &'a self,
        symbol_table: &'a SymbolTable,
        start: &str,
        member: &str,
    ) -> Option<(&'a ClassNode, &'a Symbol)> {
        self.ancestors(start).find_map(|class| {
            symbol_table
                .lookup_in_scope(class.scope, member)
                .map(|symbol| (class, symbol))
        })
    }

    /// True when `derived` is `base` or inherits from it, directly or not.
    pub fn is_subclass(&self, derived: &str, base: &str) -> bool {
        self.ancestors(derived).any(|class| class.name == base)
    }
}
