//! js2cpp-util - Core Utilities and Foundation Types
//!
//! This crate provides the shared infrastructure of the js2cpp translator:
//!
//! - **String interning** ([`Symbol`]): every identifier, keyword, and
//!   literal lexeme in the compiler is a 4-byte handle into a global string
//!   table. Equality of symbols is equality of names, so name comparisons in
//!   scope tables and the code generator are O(1) integer compares.
//! - **Source coordinates** ([`Coord`]): the (source, line, column) triple
//!   attached to tokens and carried into diagnostics.
//! - **Diagnostics** ([`Handler`], [`Diagnostic`], [`DiagnosticCode`]): an
//!   interior-mutability collector shared by reference between the lexer,
//!   parser, code generator, and driver. Diagnostics accumulate; the driver
//!   inspects the error count and sets the process exit code.
//! - **Typed indices** ([`IndexVec`], [`Idx`], [`define_idx!`]): arenas
//!   indexed by newtype ids, used for the scope tree and the function table.

pub mod coord;
pub mod diagnostic;
pub mod index_vec;
pub mod symbol;

pub use coord::Coord;
pub use diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
pub use index_vec::{Idx, IndexVec};
pub use symbol::{InternerStats, Symbol, KEYWORD_COUNT, KEYWORD_NAMES};

// Re-export commonly used types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;

/// An insertion-ordered map with the fast rustc hasher.
///
/// Scope binding tables use this so that iteration order (and therefore the
/// order of emitted global declarations) is the order of declaration in the
/// source, deterministically.
pub type FxIndexMap<K, V> =
    indexmap::IndexMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;
