//! Lexical scopes and the declarations they bind.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_edit::Span;

use super::declaration::DeclKind;

/// Handle to a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

/// Handle to a declaration in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u32);

/// A single declared name.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: SmolStr,
    pub kind: DeclKind,
    /// The scope the declaration is written in; its initializer is resolved
    /// from here even when the name is hoisted further out.
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug)]
struct ScopeData {
    parent: Option<ScopeId>,
    is_function: bool,
    bindings: FxHashMap<SmolStr, DeclId>,
}

/// Arena of scopes and declarations for one module.
///
/// Scopes point at their parent; lookups walk outwards so the innermost
/// declaration of a name wins.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
    declarations: Vec<Declaration>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// The module scope.
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeData {
                parent: None,
                is_function: true,
                bindings: FxHashMap::default(),
            }],
            declarations: Vec::new(),
        }
    }

    pub(crate) fn push_scope(&mut self, parent: ScopeId, is_function: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            parent: Some(parent),
            is_function,
            bindings: FxHashMap::default(),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0 as usize)?.parent
    }

    /// Returns the nearest enclosing function (or module) scope.
    pub fn function_scope(&self, mut scope: ScopeId) -> ScopeId {
        while let Some(data) = self.scopes.get(scope.0 as usize) {
            match data.parent {
                Some(parent) if !data.is_function => scope = parent,
                _ => break,
            }
        }
        scope
    }

    /// Declares `name` in `scope`.
    ///
    /// A name declared twice in the same scope keeps its first declaration.
    pub(crate) fn declare(
        &mut self,
        scope: ScopeId,
        name: SmolStr,
        kind: DeclKind,
        span: Span,
    ) -> DeclId {
        self.declare_from(scope, scope, name, kind, span)
    }

    /// Declares `name` in `scope` with an initializer written in `origin`,
    /// e.g. a `var` hoisted out of a block.
    pub(crate) fn declare_from(
        &mut self,
        scope: ScopeId,
        origin: ScopeId,
        name: SmolStr,
        kind: DeclKind,
        span: Span,
    ) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);
        let Some(data) = self.scopes.get_mut(scope.0 as usize) else {
            return id;
        };
        if let Some(existing) = data.bindings.get(&name) {
            return *existing;
        }
        data.bindings.insert(name.clone(), id);
        self.declarations.push(Declaration {
            name,
            kind,
            scope: origin,
            span,
        });
        id
    }

    /// Finds the declaration `name` refers to when used inside `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scopes.get(id.0 as usize)?;
            if let Some(decl) = data.bindings.get(name) {
                return Some(*decl);
            }
            current = data.parent;
        }
        None
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.0 as usize)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
