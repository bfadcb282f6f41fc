//! Foreign declarations and their stable identities.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::attrs::ForeignAttrs;
use crate::ty::ForeignType;

/// Stable identity of a foreign declaration.
///
/// Two ids compare equal exactly when they name the same declaration node;
/// redeclarations have distinct ids that share a canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignDeclId(pub u32);

/// Identity of a foreign module (a header set compiled together).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignModuleId(pub u32);

/// Identity of a preprocessor macro definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroId(pub u32);

/// An Objective-C selector: colon-separated pieces, one per parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pieces: SmallVec<[String; 4]>,
    num_args: usize,
}

impl Selector {
    /// Parses `"insertObject:atIndex:"` or a nullary `"count"`.
    pub fn parse(text: &str) -> Self {
        if !text.contains(':') {
            return Self { pieces: smallvec![text.to_string()], num_args: 0 };
        }
        let trimmed = text.strip_suffix(':').unwrap_or(text);
        let pieces: SmallVec<[String; 4]> = trimmed.split(':').map(str::to_string).collect();
        let num_args = pieces.len();
        Self { pieces, num_args }
    }

    pub fn pieces(&self) -> &[String] {
        &self.pieces
    }

    pub fn first_piece(&self) -> &str {
        self.pieces.first().map(String::as_str).unwrap_or("")
    }

    pub fn num_args(&self) -> usize {
        self.num_args
    }

    pub fn is_nullary(&self) -> bool {
        self.num_args == 0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_args == 0 {
            return write!(f, "{}", self.first_piece());
        }
        for piece in &self.pieces {
            write!(f, "{}:", piece)?;
        }
        Ok(())
    }
}

/// A parameter of a function or method.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignParam {
    pub name: String,
    pub ty: ForeignType,
    /// `CF_RETURNS_RETAINED` / `NS_RELEASES_ARGUMENT` style ownership on an
    /// out-parameter: `Some(true)` retained, `Some(false)` not retained.
    pub retained: Option<bool>,
}

impl ForeignParam {
    pub fn new(name: &str, ty: ForeignType) -> Self {
        Self { name: name.to_string(), ty, retained: None }
    }
}

/// The kind-specific payload of a foreign declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignDeclKind {
    Record { fields: Vec<ForeignDeclId>, is_union: bool, is_complete: bool },
    Field { ty: ForeignType, bit_width: Option<u32> },
    Enum { integer_type: ForeignType, constants: Vec<ForeignDeclId> },
    /// The owning enum is the constant's `context`.
    EnumConstant { value: i64 },
    Typedef { underlying: ForeignType },
    Function { params: Vec<ForeignParam>, result: ForeignType, is_variadic: bool },
    Variable { ty: ForeignType, is_const: bool },
    ObjCInterface {
        superclass: Option<ForeignDeclId>,
        protocols: Vec<ForeignDeclId>,
        members: Vec<ForeignDeclId>,
        is_complete: bool,
    },
    ObjCProtocol { protocols: Vec<ForeignDeclId>, members: Vec<ForeignDeclId> },
    ObjCCategory { class: ForeignDeclId, protocols: Vec<ForeignDeclId>, members: Vec<ForeignDeclId> },
    ObjCMethod {
        selector: Selector,
        params: Vec<ForeignParam>,
        result: ForeignType,
        is_instance: bool,
        is_variadic: bool,
    },
    ObjCProperty { ty: ForeignType, is_readonly: bool, is_class: bool },
}

/// One foreign declaration node.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignDecl {
    pub name: String,
    pub kind: ForeignDeclKind,
    /// Enclosing declaration; `None` at module scope.
    pub context: Option<ForeignDeclId>,
    pub module: ForeignModuleId,
    pub attrs: ForeignAttrs,
    /// The first declaration of this entity.
    pub canonical: ForeignDeclId,
}

impl ForeignDecl {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// Member list of a container declaration.
    pub fn members(&self) -> &[ForeignDeclId] {
        match &self.kind {
            ForeignDeclKind::Record { fields, .. } => fields,
            ForeignDeclKind::Enum { constants, .. } => constants,
            ForeignDeclKind::ObjCInterface { members, .. }
            | ForeignDeclKind::ObjCProtocol { members, .. }
            | ForeignDeclKind::ObjCCategory { members, .. } => members,
            _ => &[],
        }
    }

    /// Protocols adopted by an Objective-C container.
    pub fn adopted_protocols(&self) -> &[ForeignDeclId] {
        match &self.kind {
            ForeignDeclKind::ObjCInterface { protocols, .. }
            | ForeignDeclKind::ObjCProtocol { protocols, .. }
            | ForeignDeclKind::ObjCCategory { protocols, .. } => protocols,
            _ => &[],
        }
    }

    pub fn selector(&self) -> Option<&Selector> {
        match &self.kind {
            ForeignDeclKind::ObjCMethod { selector, .. } => Some(selector),
            _ => None,
        }
    }

    pub fn is_objc_container(&self) -> bool {
        matches!(
            self.kind,
            ForeignDeclKind::ObjCInterface { .. }
                | ForeignDeclKind::ObjCProtocol { .. }
                | ForeignDeclKind::ObjCCategory { .. }
        )
    }
}
