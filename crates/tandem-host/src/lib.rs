//! Host declaration model for the Tandem importer.
//!
//! The host compiler owns the declarations the importer produces. This crate
//! models the parts of the host AST the importer touches: declarations and
//! their owners, types, full names with argument labels, protocol
//! conformances, and lookup of named standard-library types.

pub mod context;
pub mod decl;
pub mod name;
pub mod ty;

pub use context::{ConformanceId, ConformanceState, HostContext, HostModule, HostModuleId, ProtocolConformance};
pub use decl::{
    ConstantValue, ErrorConventionKind, ForeignErrorConvention, HostDecl, HostDeclId, HostDeclKind, HostParam,
    InitKind,
};
pub use name::DeclName;
pub use ty::{FunctionConvention, HostType, OptionalKind};
