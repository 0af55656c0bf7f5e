use std::collections::HashMap;
use std::fmt::Write;

use super::Ty;

/// Handle to one scope inside a [`SymbolTable`]. Scopes live for as long as
/// the table does, so a handle stays valid after the scope is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub ty: Ty,
}

impl Symbol {
    pub fn new(ty: Ty) -> Self {
        Self { ty }
    }
}

#[derive(Clone, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    table: HashMap<String, Symbol>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            children: vec![],
            table: HashMap::new(),
        }
    }
}

/// A tree of nested lexical scopes. `insert` only looks at the current scope,
/// `lookup` walks from the current scope up to the root.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
            current: ScopeId(0),
        }
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn get_current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn open_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(self.current)));
        self.scope_mut(self.current).children.push(id);
        self.current = id;
        id
    }

    pub fn close_scope(&mut self) {
        self.current = self
            .scope(self.current)
            .parent
            .expect("cannot close the root scope");
    }

    pub fn insert(&mut self, name: &str, symbol: Symbol) -> bool {
        Self::insert_into(self.scope_mut(self.current), name, symbol)
    }

    /// Inserts into the parent of the current scope, checking for duplicates
    /// in that scope only.
    pub fn insert_in_parent_scope(&mut self, name: &str, symbol: Symbol) -> bool {
        let parent = self
            .scope(self.current)
            .parent
            .expect("the root scope has no parent");
        Self::insert_into(self.scope_mut(parent), name, symbol)
    }

    fn insert_into(scope: &mut Scope, name: &str, symbol: Symbol) -> bool {
        if scope.table.contains_key(name) {
            return false;
        }
        scope.table.insert(name.to_string(), symbol);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut id = Some(self.current);
        while let Some(scope_id) = id {
            let scope = self.scope(scope_id);
            if let Some(symbol) = scope.table.get(name) {
                return Some(symbol);
            }
            id = scope.parent;
        }
        None
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Looks `name` up among the entries of `scope` itself, without walking
    /// to its parents.
    pub fn lookup_in_scope(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scope(scope).table.get(name)
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_scope(&mut out, ScopeId(0), 0);
        out
    }

    fn dump_scope(&self, out: &mut String, id: ScopeId, depth: usize) {
        let scope = self.scope(id);
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{}scope {}:", indent, id.0);

        let mut names: Vec<_> = scope.table.iter().collect();
        names.sort_by_key(|(name, _)| name.as_str());
        for (name, symbol) in names {
            let _ = writeln!(out, "{}  {}: {}", indent, name, symbol.ty);
        }
        for &child in &scope.children {
            self.dump_scope(out, child, depth + 1);
        }
    }
}
