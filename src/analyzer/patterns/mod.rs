//! Pure predicates over resolved types and AST shapes that recognize the
//! class idioms of the source language.

pub mod atom_ui;
pub mod closure_class;
pub mod derive;
pub mod metatable;
pub mod name_hints;
