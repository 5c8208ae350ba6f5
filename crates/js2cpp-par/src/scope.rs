//! Lexical scopes, built during parsing.
//!
//! The scope forest is an arena: every scope is a node in an
//! `IndexVec<ScopeId, Scope>` carrying a parent id, so AST nodes and
//! functions store a plain `ScopeId` and lookups walk ids. Binding tables
//! are insertion-ordered maps, which makes the order of emitted global
//! declarations the order of declaration in the source.
//!
//! A name mentioned but not declared in a scope gets a `Reference` binding.
//! When the scope is sealed, every binding still a bare reference is
//! re-exported to the parent, so outer scopes see the demand; these are the
//! non-local non-global (NLNG) references that drive closure construction.

use std::ops::Index;

use js2cpp_util::{define_idx, FxIndexMap, IndexVec, Symbol};

use crate::ast::FuncId;

define_idx!(ScopeId);

/// How a name is bound within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Used in this scope but not (yet) declared here.
    Reference,
    /// Declared by `var` or as a formal parameter.
    Variable,
    /// Declared by the `extern var` pseudo-keyword.
    Extern,
    /// Declared by a named `function` definition.
    Function(FuncId),
}

impl Binding {
    /// True for anything other than a bare reference.
    pub fn is_declaration(self) -> bool {
        !matches!(self, Binding::Reference)
    }

    pub fn is_reference(self) -> bool {
        matches!(self, Binding::Reference)
    }

    pub fn is_extern(self) -> bool {
        matches!(self, Binding::Extern)
    }

    pub fn is_variable(self) -> bool {
        matches!(self, Binding::Variable)
    }

    pub fn is_function(self) -> bool {
        matches!(self, Binding::Function(_))
    }
}

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    /// Name of this scope, for errors and logging.
    pub name: Symbol,
    /// Containing scope; `None` only for the global scope.
    pub parent: Option<ScopeId>,
    /// Nesting depth (0 = global).
    pub depth: u32,
    /// The function that introduced this scope, once known.
    pub owner: Option<FuncId>,
    /// Identifiers bound in this scope, in declaration order.
    pub bindings: FxIndexMap<Symbol, Binding>,
    /// Anonymous (expression-form) functions declared in this scope.
    pub lit_funcs: Vec<FuncId>,
}

/// The scope forest plus a cursor for the scope under construction.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create the tree with the global scope in place.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            name: Symbol::intern("global_object"),
            parent: None,
            depth: 0,
            owner: None,
            bindings: FxIndexMap::default(),
            lit_funcs: Vec::new(),
        });

        Self {
            scopes,
            current: root,
        }
    }

    /// The global scope.
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// The scope currently under construction.
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Enter a new scope nested in the current one.
    pub fn enter_scope(&mut self, name: Symbol) -> ScopeId {
        let depth = self.scopes[self.current].depth + 1;
        let new_scope = self.scopes.push(Scope {
            name,
            parent: Some(self.current),
            depth,
            owner: None,
            bindings: FxIndexMap::default(),
            lit_funcs: Vec::new(),
        });
        self.current = new_scope;
        new_scope
    }

    /// Seal the current scope and pop back to its parent.
    ///
    /// Every binding that is still a bare `Reference` is re-exported to the
    /// parent so the demand travels outward.
    pub fn exit_scope(&mut self) {
        let Some(parent) = self.scopes[self.current].parent else {
            return;
        };

        let exported: Vec<Symbol> = self.scopes[self.current]
            .bindings
            .iter()
            .filter(|(_, b)| b.is_reference())
            .map(|(name, _)| *name)
            .collect();
        for name in exported {
            self.reference_in(parent, name);
        }

        self.current = parent;
    }

    /// Record the function a scope belongs to.
    pub fn set_owner(&mut self, scope: ScopeId, func: FuncId) {
        self.scopes[scope].owner = Some(func);
    }

    /// Bind `name` as an external declaration in the current scope.
    pub fn declare_external(&mut self, name: Symbol) {
        self.scopes[self.current].bindings.insert(name, Binding::Extern);
    }

    /// Bind `name` as a variable in the current scope.
    ///
    /// Upgrades a bare reference; a repeated `var` declaration of the same
    /// name is idempotent.
    pub fn declare_variable(&mut self, name: Symbol) {
        let bindings = &mut self.scopes[self.current].bindings;
        match bindings.get_mut(&name) {
            Some(binding) if binding.is_declaration() => {}
            Some(binding) => *binding = Binding::Variable,
            None => {
                bindings.insert(name, Binding::Variable);
            }
        }
    }

    /// Bind `name` to a function definition in the current scope.
    pub fn declare_function(&mut self, name: Symbol, func: FuncId) {
        self.scopes[self.current]
            .bindings
            .insert(name, Binding::Function(func));
    }

    /// Add a function expression to the current scope's literal set.
    pub fn declare_literal_function(&mut self, func: FuncId) {
        self.scopes[self.current].lit_funcs.push(func);
    }

    /// Note a use of `name` in the current scope.
    ///
    /// Only the first mention matters; a declaration already present wins.
    pub fn reference(&mut self, name: Symbol) {
        self.reference_in(self.current, name);
    }

    fn reference_in(&mut self, scope: ScopeId, name: Symbol) {
        let bindings = &mut self.scopes[scope].bindings;
        if !bindings.contains_key(&name) {
            bindings.insert(name, Binding::Reference);
        }
    }

    /// Look up the declaration of a name along the scope chain from `from`
    /// outward. Bare references do not count as declarations.
    pub fn find_declaration(&self, from: ScopeId, name: Symbol) -> Option<(ScopeId, Binding)> {
        let mut id = from;
        loop {
            let scope = &self.scopes[id];
            if let Some(binding) = scope.bindings.get(&name) {
                if binding.is_declaration() {
                    return Some((id, *binding));
                }
            }
            id = scope.parent?;
        }
    }

    /// The ancestor of `from` (or `from` itself) at nesting depth `depth`.
    pub fn at_depth(&self, from: ScopeId, depth: u32) -> ScopeId {
        let mut id = from;
        loop {
            let scope = &self.scopes[id];
            if scope.depth == depth {
                return id;
            }
            debug_assert!(scope.depth > depth, "at_depth below requested scope");
            id = scope.parent.expect("scope chain ended above requested depth");
        }
    }

    /// Number of scopes in the forest.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Index<ScopeId> for ScopeTree {
    type Output = Scope;

    fn index(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
