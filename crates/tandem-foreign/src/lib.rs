//! Foreign declaration model for the Tandem importer.
//!
//! This crate holds the output of the foreign frontend (a C / Objective-C
//! parser and semantic analyzer) in the shape the importer consumes:
//! declarations with stable identity, their types and attributes, their
//! enclosing context, the modules that own them, and preprocessor macros.
//!
//! The frontend itself is not part of Tandem. [`ForeignContext`] exposes a
//! small builder API so that embedders (and tests) can describe headers
//! directly.

pub mod attrs;
pub mod context;
pub mod decl;
pub mod ty;

pub use attrs::{EnumExtensibility, FactoryAsInit, ForeignAttrs};
pub use context::{ForeignContext, ForeignModule, MacroInfo, MacroToken};
pub use decl::{
    ForeignDecl, ForeignDeclId, ForeignDeclKind, ForeignModuleId, ForeignParam, MacroId, Selector,
};
pub use ty::{BuiltinType, CallingConv, ForeignType, FunctionProto, Nullability};
