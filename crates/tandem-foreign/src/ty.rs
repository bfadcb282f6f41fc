//! Foreign (C / Objective-C) types.

use serde::{Deserialize, Serialize};

use crate::decl::ForeignDeclId;

/// Nullability annotation on a pointer-like type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nullability {
    /// `_Nonnull`
    NonNull,
    /// `_Nullable`
    Nullable,
    /// `_Null_unspecified`
    Unspecified,
}

/// Builtin scalar types of the foreign language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Void,
    /// `_Bool` / `bool`
    Bool,
    /// Plain `char` (signed on every target Tandem models).
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int128,
    UInt128,
    Half,
    Float,
    Double,
    LongDouble,
    /// `id`
    ObjCId,
    /// `Class`
    ObjCClass,
    /// `SEL`
    ObjCSel,
}

impl BuiltinType {
    /// Returns `true` for the integer types, including `char` and `bool`.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BuiltinType::Bool
                | BuiltinType::Char
                | BuiltinType::SChar
                | BuiltinType::UChar
                | BuiltinType::Short
                | BuiltinType::UShort
                | BuiltinType::Int
                | BuiltinType::UInt
                | BuiltinType::Long
                | BuiltinType::ULong
                | BuiltinType::LongLong
                | BuiltinType::ULongLong
                | BuiltinType::Int128
                | BuiltinType::UInt128
        )
    }

    /// Returns `true` for the unsigned integer types.
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BuiltinType::Bool
                | BuiltinType::UChar
                | BuiltinType::UShort
                | BuiltinType::UInt
                | BuiltinType::ULong
                | BuiltinType::ULongLong
                | BuiltinType::UInt128
        )
    }
}

/// Calling conventions a foreign function type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallingConv {
    C,
    StdCall,
    FastCall,
    VectorCall,
    Pascal,
}

/// A C function prototype, used for function pointers and blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProto {
    pub params: Vec<ForeignType>,
    pub result: ForeignType,
    pub is_variadic: bool,
    pub calling_conv: CallingConv,
}

impl FunctionProto {
    pub fn new(params: Vec<ForeignType>, result: ForeignType) -> Self {
        Self { params, result, is_variadic: false, calling_conv: CallingConv::C }
    }
}

/// A foreign type as produced by the frontend.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignType {
    Builtin(BuiltinType),
    /// `T *`; `is_const` qualifies the pointee.
    Pointer { pointee: Box<ForeignType>, is_const: bool },
    /// `R (^)(P...)`
    BlockPointer(Box<FunctionProto>),
    /// `NSFoo<P, Q> *`, or `id<P>` when `class` is `None`.
    ObjCObjectPointer { class: Option<ForeignDeclId>, protocols: Vec<ForeignDeclId> },
    /// `instancetype`
    InstanceType,
    Record(ForeignDeclId),
    Enum(ForeignDeclId),
    Typedef(ForeignDeclId),
    /// A bare function type; only meaningful behind a pointer.
    Function(Box<FunctionProto>),
    ConstantArray { element: Box<ForeignType>, size: usize },
    IncompleteArray { element: Box<ForeignType> },
    /// A type carrying a nullability annotation.
    Attributed { inner: Box<ForeignType>, nullability: Nullability },
    /// `__attribute__((ext_vector_type(n)))` and friends.
    Vector { element: Box<ForeignType>, lanes: u32 },
    /// `_Complex T`
    Complex(Box<ForeignType>),
    /// A type that depends on a template parameter.
    Dependent,
}

impl ForeignType {
    pub fn void() -> Self {
        ForeignType::Builtin(BuiltinType::Void)
    }

    pub fn int() -> Self {
        ForeignType::Builtin(BuiltinType::Int)
    }

    /// `id`
    pub fn id() -> Self {
        ForeignType::Builtin(BuiltinType::ObjCId)
    }

    pub fn pointer_to(pointee: ForeignType) -> Self {
        ForeignType::Pointer { pointee: Box::new(pointee), is_const: false }
    }

    pub fn const_pointer_to(pointee: ForeignType) -> Self {
        ForeignType::Pointer { pointee: Box::new(pointee), is_const: true }
    }

    /// `Class *` for the given interface.
    pub fn object_pointer(class: ForeignDeclId) -> Self {
        ForeignType::ObjCObjectPointer { class: Some(class), protocols: Vec::new() }
    }

    pub fn with_nullability(self, nullability: Nullability) -> Self {
        ForeignType::Attributed { inner: Box::new(self), nullability }
    }

    pub fn nonnull(self) -> Self {
        self.with_nullability(Nullability::NonNull)
    }

    pub fn nullable(self) -> Self {
        self.with_nullability(Nullability::Nullable)
    }

    /// Strips nullability sugar, returning the underlying type and the
    /// outermost annotation found.
    pub fn strip_nullability(&self) -> (&ForeignType, Option<Nullability>) {
        let mut current = self;
        let mut found = None;
        while let ForeignType::Attributed { inner, nullability } = current {
            found.get_or_insert(*nullability);
            current = inner;
        }
        (current, found)
    }

    /// Returns `true` for block pointers, looking through nullability.
    pub fn is_block_pointer(&self) -> bool {
        matches!(self.strip_nullability().0, ForeignType::BlockPointer(_))
    }
}
