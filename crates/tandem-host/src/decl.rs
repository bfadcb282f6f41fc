//! Host declarations.

use tandem_foreign::ForeignDeclId;

use crate::context::HostModuleId;
use crate::name::DeclName;
use crate::ty::{HostType, OptionalKind};

/// Identity of a host declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostDeclId(pub u32);

/// The kind of an initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitKind {
    Designated,
    Convenience,
    /// A factory class method surfaced as a convenience initializer.
    ConvenienceFactory,
    Factory,
}

/// How a throwing host function signals failure through its foreign
/// counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorConventionKind {
    /// A `false`/zero result means failure.
    ZeroResult,
    /// A `nil` result means failure.
    NilResult,
    /// Failure is signalled only by a non-nil error out-value.
    NonNilError,
}

/// The error convention recorded on an imported throwing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignErrorConvention {
    pub kind: ErrorConventionKind,
    pub is_owned: bool,
    pub param_index: usize,
    pub replaced_with_void: bool,
}

/// The value of an imported named constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

/// A function or initializer parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct HostParam {
    /// Argument label; empty for `_`.
    pub label: String,
    pub name: String,
    pub ty: HostType,
}

/// Kind-specific payload of a host declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum HostDeclKind {
    /// Reserved identity of a declaration whose import is still running.
    Placeholder,
    /// Reserved identity whose import failed.
    Invalid,
    Struct { fields: Vec<HostDeclId>, raw_type: Option<HostType> },
    Class { superclass: Option<HostDeclId>, members: Vec<HostDeclId> },
    Protocol { members: Vec<HostDeclId> },
    Extension { extended: HostDeclId, members: Vec<HostDeclId> },
    /// A closed set of cases.
    Enum { raw_type: HostType, cases: Vec<HostDeclId> },
    EnumCase { raw_value: i64 },
    /// A second name for an existing case with the same value.
    CaseAlias { original: HostDeclId },
    /// A flag set wrapping a raw integer.
    OptionSet { raw_type: HostType, members: Vec<HostDeclId> },
    Constant { ty: HostType, value: ConstantValue },
    TypeAlias { underlying: HostType },
    Var { ty: HostType, is_let: bool },
    Property { ty: HostType, is_readonly: bool },
    Func {
        params: Vec<HostParam>,
        result: HostType,
        error: Option<ForeignErrorConvention>,
        is_instance: bool,
    },
    Constructor {
        params: Vec<HostParam>,
        init_kind: InitKind,
        is_required: bool,
        failability: OptionalKind,
        error: Option<ForeignErrorConvention>,
    },
    Subscript { getter: HostDeclId, setter: Option<HostDeclId>, index: HostType, element: HostType },
}

impl HostDeclKind {
    /// The member list of a container declaration.
    pub fn members(&self) -> &[HostDeclId] {
        match self {
            HostDeclKind::Struct { fields, .. } => fields,
            HostDeclKind::Class { members, .. }
            | HostDeclKind::Protocol { members }
            | HostDeclKind::Extension { members, .. }
            | HostDeclKind::OptionSet { members, .. } => members,
            HostDeclKind::Enum { cases, .. } => cases,
            _ => &[],
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Vec<HostDeclId>> {
        match self {
            HostDeclKind::Struct { fields, .. } => Some(fields),
            HostDeclKind::Class { members, .. }
            | HostDeclKind::Protocol { members }
            | HostDeclKind::Extension { members, .. }
            | HostDeclKind::OptionSet { members, .. } => Some(members),
            HostDeclKind::Enum { cases, .. } => Some(cases),
            _ => None,
        }
    }

    /// `true` for declarations that introduce a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            HostDeclKind::Struct { .. }
                | HostDeclKind::Class { .. }
                | HostDeclKind::Protocol { .. }
                | HostDeclKind::Enum { .. }
                | HostDeclKind::OptionSet { .. }
                | HostDeclKind::TypeAlias { .. }
        )
    }
}

/// A declaration owned by a host module.
#[derive(Debug, Clone, PartialEq)]
pub struct HostDecl {
    pub name: DeclName,
    pub kind: HostDeclKind,
    pub module: HostModuleId,
    /// Enclosing type or extension, `None` at module scope.
    pub parent: Option<HostDeclId>,
    /// The foreign declaration this was imported from. Diagnostic use only.
    pub origin: Option<ForeignDeclId>,
    pub unavailable: Option<String>,
    pub is_static: bool,
}
