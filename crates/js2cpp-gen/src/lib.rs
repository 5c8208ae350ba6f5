//! js2cpp-gen - Code Generator
//!
//! Walks the parsed program and emits one self-contained C++ translation
//! unit against the dynamically typed runtime: a declaration region for the
//! globals, a closure class and a locals record per function, the function
//! bodies, and a `jsmain_` entry point that runs the top-level statements.
//!
//! The heart of the translation is closure conversion. A function at
//! lexical depth `d` is compiled into a class extending the runtime's
//! abstract callable, carrying one reference per strict ancestor activation
//! (`nlng1_ .. nlng(d-1)_`); identifiers resolve through the scope chain
//! into `locals_.x`, `nlngK_.x`, or a bare global. Expressions are emitted
//! by a pair of mutually recursive emitters, one for reference (l-value)
//! positions and one for value positions.

pub mod cpp;


pub use cpp::CodeGenerator;
