//! Host types.

use crate::decl::HostDeclId;

/// How a nullable foreign value surfaces in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalKind {
    /// Never null.
    None,
    /// A checked optional (`T?`).
    Optional,
    /// An implicitly unwrapped optional (`T!`).
    ImplicitlyUnwrapped,
}

/// Calling convention of a host function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionConvention {
    Native,
    /// `@convention(c)`
    C,
    /// `@convention(block)`
    Block,
}

/// A host type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    /// A standard-library type looked up by name, possibly specialized.
    Named { module: String, name: String, args: Vec<HostType> },
    /// A type declared by an imported declaration.
    Nominal(HostDeclId),
    /// A reference through a type alias, keeping the alias visible.
    Alias { decl: HostDeclId, underlying: Box<HostType> },
    /// `T?` or `T!`; never constructed with [`OptionalKind::None`].
    Optional { kind: OptionalKind, wrapped: Box<HostType> },
    /// A tuple; the empty tuple is `Void`.
    Tuple(Vec<HostType>),
    Function { params: Vec<HostType>, result: Box<HostType>, convention: FunctionConvention },
    /// `protocol<P, Q>`; empty means `AnyObject`-constrained existential.
    ProtocolComposition(Vec<HostDeclId>),
    /// The dynamic `Self` type of an initializer-like result.
    DynamicSelf,
}

impl HostType {
    pub fn void() -> Self {
        HostType::Tuple(Vec::new())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, HostType::Tuple(elements) if elements.is_empty())
    }

    /// Wraps the type per `kind`; [`OptionalKind::None`] returns it unchanged.
    pub fn wrap_optional(self, kind: OptionalKind) -> Self {
        match kind {
            OptionalKind::None => self,
            _ => HostType::Optional { kind, wrapped: Box::new(self) },
        }
    }

    /// Strips one level of optionality.
    pub fn unwrap_optional(&self) -> (&HostType, OptionalKind) {
        match self {
            HostType::Optional { kind, wrapped } => (wrapped, *kind),
            other => (other, OptionalKind::None),
        }
    }

    /// Name of a standard-library type, if this is one.
    pub fn stdlib_name(&self) -> Option<&str> {
        match self {
            HostType::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}
