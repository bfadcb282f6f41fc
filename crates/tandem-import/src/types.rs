//! Translating foreign types into host types.

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use tandem_foreign::{BuiltinType, CallingConv, ForeignDeclId, ForeignDeclKind, ForeignType, FunctionProto, Nullability};
use tandem_host::{DeclName, FunctionConvention, HostDeclKind, HostType, OptionalKind};

use crate::enum_kind::EnumKind;
use crate::error::{ImportError, ImportResult};
use crate::session::ImportSession;

/// The position a type is imported for. Each position carries its own
/// bridging, `Unmanaged` and nullability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportTypeKind {
    /// No particular position.
    Abstract,
    /// The underlying type of a typedef.
    Typedef,
    /// A value that may not be bridged.
    Value,
    /// A value that may be bridged.
    BridgedValue,
    /// A global variable.
    Variable,
    /// A global variable from a CF-audited region.
    AuditedVariable,
    RecordField,
    /// A function or method result.
    Result,
    /// A result from a CF-audited function.
    AuditedResult,
    Parameter,
    /// A CF out-parameter whose value comes back retained.
    CfRetainedOutParameter,
    /// A CF out-parameter whose value comes back unretained.
    CfUnretainedOutParameter,
    /// The target of a pointer.
    Pointee,
    Property,
    PropertyAccessor,
    /// The underlying integer type of an enum.
    Enum,
}

impl ImportTypeKind {
    /// Whether bridgeable Objective-C types become their host value types.
    pub fn allows_bridging(self) -> bool {
        !matches!(
            self,
            ImportTypeKind::Abstract
                | ImportTypeKind::Typedef
                | ImportTypeKind::Value
                | ImportTypeKind::Variable
                | ImportTypeKind::RecordField
                | ImportTypeKind::Pointee
                | ImportTypeKind::Enum
        )
    }

    /// Whether CF references are wrapped in `Unmanaged<T>`.
    pub fn wraps_unmanaged(self) -> bool {
        matches!(
            self,
            ImportTypeKind::Value
                | ImportTypeKind::BridgedValue
                | ImportTypeKind::Variable
                | ImportTypeKind::RecordField
                | ImportTypeKind::Result
                | ImportTypeKind::Pointee
                | ImportTypeKind::Property
                | ImportTypeKind::PropertyAccessor
        )
    }

    /// Whether `void` is acceptable.
    pub fn allows_void(self) -> bool {
        matches!(self, ImportTypeKind::Abstract | ImportTypeKind::Result | ImportTypeKind::AuditedResult)
    }

    fn is_parameter(self) -> bool {
        matches!(
            self,
            ImportTypeKind::Parameter | ImportTypeKind::CfRetainedOutParameter | ImportTypeKind::CfUnretainedOutParameter
        )
    }
}

/// Primitive categories that mapped typedefs resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedCTypeKind {
    UnsignedInt,
    SignedInt,
    UnsignedWord,
    SignedWord,
    FloatIeee32,
    FloatIeee64,
    FloatX87,
    VaList,
    ObjCBool,
    ObjCSel,
    ObjCId,
    ObjCClass,
    CGFloat,
    Block,
}

/// Whether a mapped typedef also gets a host-visible alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedTypeNameKind {
    /// Uses resolve to the mapped type; no alias is emitted.
    DoNothing,
    /// An alias is emitted once per module; uses resolve to the mapped type.
    DefineOnly,
    /// An alias is emitted once per module and uses refer to it.
    DefineAndUse,
}

/// One row of the mapped typedef table.
#[derive(Debug, Clone, Copy)]
struct MappedType {
    kind: MappedCTypeKind,
    /// Bit width for the fixed-width integer kinds.
    bits: u32,
    name_kind: MappedTypeNameKind,
}

lazy_static! {
    static ref MAPPED_TYPEDEFS: FxHashMap<&'static str, MappedType> = {
        use MappedCTypeKind::*;
        use MappedTypeNameKind::*;
        let rows: &[(&str, MappedCTypeKind, u32, MappedTypeNameKind)] = &[
            ("int8_t", SignedInt, 8, DefineOnly),
            ("int16_t", SignedInt, 16, DefineOnly),
            ("int32_t", SignedInt, 32, DefineOnly),
            ("int64_t", SignedInt, 64, DefineOnly),
            ("uint8_t", UnsignedInt, 8, DefineOnly),
            ("uint16_t", UnsignedInt, 16, DefineOnly),
            ("uint32_t", UnsignedInt, 32, DefineOnly),
            ("uint64_t", UnsignedInt, 64, DefineOnly),
            ("intptr_t", SignedWord, 0, DefineOnly),
            ("uintptr_t", UnsignedWord, 0, DefineOnly),
            ("size_t", SignedWord, 0, DefineOnly),
            ("ssize_t", SignedWord, 0, DefineOnly),
            ("NSInteger", SignedWord, 0, DefineOnly),
            ("NSUInteger", UnsignedWord, 0, DefineOnly),
            ("CFIndex", SignedWord, 0, DefineAndUse),
            ("Float32", FloatIeee32, 0, DefineAndUse),
            ("Float64", FloatIeee64, 0, DefineAndUse),
            ("Float80", FloatX87, 0, DefineAndUse),
            ("va_list", VaList, 0, DoNothing),
            ("__builtin_va_list", VaList, 0, DoNothing),
            ("BOOL", ObjCBool, 0, DoNothing),
            ("SEL", ObjCSel, 0, DoNothing),
            ("id", ObjCId, 0, DoNothing),
            ("Class", ObjCClass, 0, DoNothing),
            ("CGFloat", CGFloat, 0, DoNothing),
            ("dispatch_block_t", Block, 0, DefineAndUse),
        ];
        rows.iter().map(|(name, kind, bits, name_kind)| (*name, MappedType { kind: *kind, bits: *bits, name_kind: *name_kind })).collect()
    };

    /// Objective-C classes that bridge to host value types, and whether the
    /// bridge needs full bridging permission.
    static ref BRIDGED_CLASSES: FxHashMap<&'static str, bool> =
        [("NSString", false), ("NSArray", true), ("NSDictionary", true), ("NSSet", true)].into_iter().collect();
}

/// The full set of knobs for one type import.
#[derive(Debug, Clone, Copy)]
struct TypeRequest {
    kind: ImportTypeKind,
    allow_wide_unsigned_as_signed: bool,
    can_fully_bridge: bool,
    default_optionality: OptionalKind,
    /// Cleared for the pointee of a CF out-parameter.
    allow_unmanaged: bool,
}

impl TypeRequest {
    fn nested(self, kind: ImportTypeKind) -> Self {
        Self { kind, can_fully_bridge: false, default_optionality: OptionalKind::ImplicitlyUnwrapped, ..self }
    }
}

/// The largest number of leaf elements a fixed-size array may import as.
/// Arrays are spelled as homogeneous tuples, so anything wider is rejected
/// rather than materialized.
pub const MAX_TUPLE_ELEMENTS: usize = 4096;

/// Leaf elements of `ty` once nested tuples are flattened.
fn tuple_width(ty: &HostType) -> usize {
    match ty {
        HostType::Tuple(elements) if !elements.is_empty() => {
            elements.iter().map(tuple_width).fold(0, usize::saturating_add)
        }
        HostType::Alias { underlying, .. } => tuple_width(underlying),
        _ => 1,
    }
}

impl<'f> ImportSession<'f> {
    /// Imports `ty` as used in position `kind`.
    ///
    /// `default_optionality` applies to pointer-like types that carry no
    /// nullability annotation at all. Failure means the type has no host
    /// spelling; callers skip the declaration that needed it.
    pub fn import_type(
        &mut self,
        ty: &ForeignType,
        kind: ImportTypeKind,
        allow_wide_unsigned_as_signed: bool,
        can_fully_bridge: bool,
        default_optionality: OptionalKind,
    ) -> ImportResult<HostType> {
        let request = TypeRequest {
            kind,
            allow_wide_unsigned_as_signed,
            can_fully_bridge,
            default_optionality,
            allow_unmanaged: true,
        };
        self.import_type_with(ty, request)
    }

    fn import_type_with(&mut self, ty: &ForeignType, request: TypeRequest) -> ImportResult<HostType> {
        let (stripped, nullability) = ty.strip_nullability();
        let optionality = self.optionality(nullability, request);
        match stripped {
            ForeignType::Attributed { .. } => Err(ImportError::unsupported("nested nullability")),
            ForeignType::Builtin(builtin) => self.import_builtin(*builtin, optionality, request),
            ForeignType::Typedef(typedef) => self.import_typedef_type(*typedef, optionality, request),
            ForeignType::Record(record) => {
                let host = self.import_tag(*record)?;
                Ok(HostType::Nominal(host))
            }
            ForeignType::Enum(decl) => self.import_enum_type(*decl, request),
            ForeignType::Pointer { pointee, is_const } => {
                let pointer = self.import_pointer(pointee, *is_const, request)?;
                Ok(pointer.wrap_optional(optionality))
            }
            ForeignType::BlockPointer(proto) => {
                let function = self.import_function_type(proto, FunctionConvention::Block, request)?;
                Ok(function.wrap_optional(optionality))
            }
            ForeignType::ObjCObjectPointer { class, protocols } => {
                let object = self.import_object_pointer(*class, protocols, request)?;
                Ok(object.wrap_optional(optionality))
            }
            ForeignType::InstanceType => Ok(HostType::DynamicSelf.wrap_optional(optionality)),
            ForeignType::ConstantArray { element, size } => {
                if *size > MAX_TUPLE_ELEMENTS {
                    return Err(ImportError::unsupported(format!("array of {} elements", size)));
                }
                let element = self.import_type_with(element, request)?;
                let flattened = tuple_width(&element).saturating_mul(*size);
                if flattened > MAX_TUPLE_ELEMENTS {
                    return Err(ImportError::unsupported(format!("nested array of {} elements", flattened)));
                }
                Ok(HostType::Tuple(vec![element; *size]))
            }
            ForeignType::IncompleteArray { element } if request.kind.is_parameter() => {
                let element = self.import_type_with(element, request.nested(ImportTypeKind::Pointee))?;
                Ok(self.std_type("UnsafeMutablePointer", vec![element])?.wrap_optional(optionality))
            }
            ForeignType::IncompleteArray { .. } => Err(ImportError::unsupported("array without a size")),
            ForeignType::Function(_) => Err(ImportError::unsupported("function type outside a pointer")),
            ForeignType::Vector { lanes, .. } => Err(ImportError::unsupported(format!("{}-lane vector", lanes))),
            ForeignType::Complex(_) => Err(ImportError::unsupported("_Complex")),
            ForeignType::Dependent => Err(ImportError::unsupported("dependent type")),
        }
    }

    /// Nullability to optionality. An explicit unspecified annotation means
    /// implicitly unwrapped; no annotation means the caller's default. The
    /// pointee policy turns both into a checked optional.
    fn optionality(&self, nullability: Option<Nullability>, request: TypeRequest) -> OptionalKind {
        match nullability {
            Some(Nullability::NonNull) => OptionalKind::None,
            Some(Nullability::Nullable) => OptionalKind::Optional,
            _ if request.kind == ImportTypeKind::Pointee => OptionalKind::Optional,
            Some(Nullability::Unspecified) => OptionalKind::ImplicitlyUnwrapped,
            None => request.default_optionality,
        }
    }

    pub(crate) fn std_type(&self, name: &str, args: Vec<HostType>) -> ImportResult<HostType> {
        self.host.named_type(name, args).ok_or_else(|| ImportError::missing_standard_type(name))
    }

    fn integer_type(&self, signed: bool, bits: u32) -> ImportResult<HostType> {
        let name = match (signed, bits) {
            (true, 8) => "Int8",
            (true, 16) => "Int16",
            (true, 32) => "Int32",
            (true, 64) => "Int64",
            (false, 8) => "UInt8",
            (false, 16) => "UInt16",
            (false, 32) => "UInt32",
            (false, 64) => "UInt64",
            _ => return Err(ImportError::unsupported(format!("{}-bit integer", bits))),
        };
        self.std_type(name, Vec::new())
    }

    fn word_type(&self, signed: bool) -> ImportResult<HostType> {
        self.std_type(if signed { "Int" } else { "UInt" }, Vec::new())
    }

    fn import_builtin(&mut self, builtin: BuiltinType, optionality: OptionalKind, request: TypeRequest) -> ImportResult<HostType> {
        let target = &self.options.target;
        let wide_unsigned = |bits: u32| -> ImportResult<HostType> {
            if bits == target.pointer_bits {
                self.word_type(request.allow_wide_unsigned_as_signed)
            } else {
                self.integer_type(false, bits)
            }
        };
        match builtin {
            BuiltinType::Void if request.kind.allows_void() => Ok(HostType::void()),
            BuiltinType::Void => Err(ImportError::unsupported("void in a value position")),
            BuiltinType::Bool => self.std_type("Bool", Vec::new()),
            BuiltinType::Char | BuiltinType::SChar => self.integer_type(true, 8),
            BuiltinType::UChar => self.integer_type(false, 8),
            BuiltinType::Short => self.integer_type(true, 16),
            BuiltinType::UShort => self.integer_type(false, 16),
            BuiltinType::Int => self.integer_type(true, target.int_bits),
            BuiltinType::UInt => self.integer_type(false, target.int_bits),
            BuiltinType::Long if target.long_bits == target.pointer_bits => self.word_type(true),
            BuiltinType::Long => self.integer_type(true, target.long_bits),
            BuiltinType::ULong => wide_unsigned(target.long_bits),
            BuiltinType::LongLong => self.integer_type(true, 64),
            BuiltinType::ULongLong => self.integer_type(false, 64),
            BuiltinType::Int128 | BuiltinType::UInt128 => Err(ImportError::unsupported("128-bit integer")),
            BuiltinType::Half => Err(ImportError::unsupported("half-precision float")),
            BuiltinType::Float => self.std_type("Float", Vec::new()),
            BuiltinType::Double => self.std_type("Double", Vec::new()),
            BuiltinType::LongDouble if target.has_x87_float80 => self.std_type("Float80", Vec::new()),
            BuiltinType::LongDouble => Err(ImportError::unsupported("long double")),
            BuiltinType::ObjCId => Ok(self.std_type("AnyObject", Vec::new())?.wrap_optional(optionality)),
            BuiltinType::ObjCClass => Ok(self.std_type("AnyClass", Vec::new())?.wrap_optional(optionality)),
            BuiltinType::ObjCSel => Ok(self.std_type("Selector", Vec::new())?.wrap_optional(optionality)),
        }
    }

    /// The host type of a mapped primitive category.
    fn mapped_type(&self, mapped: MappedType, optionality: OptionalKind, request: TypeRequest) -> ImportResult<HostType> {
        match mapped.kind {
            MappedCTypeKind::SignedInt => self.integer_type(true, mapped.bits),
            MappedCTypeKind::UnsignedInt => self.integer_type(false, mapped.bits),
            MappedCTypeKind::SignedWord => self.word_type(true),
            MappedCTypeKind::UnsignedWord => self.word_type(request.allow_wide_unsigned_as_signed),
            MappedCTypeKind::FloatIeee32 => self.std_type("Float", Vec::new()),
            MappedCTypeKind::FloatIeee64 => self.std_type("Double", Vec::new()),
            MappedCTypeKind::FloatX87 if self.options.target.has_x87_float80 => self.std_type("Float80", Vec::new()),
            MappedCTypeKind::FloatX87 => Err(ImportError::unsupported("x87 extended float")),
            MappedCTypeKind::VaList => self.std_type("CVaListPointer", Vec::new()),
            MappedCTypeKind::ObjCBool if request.kind.allows_bridging() => self.std_type("Bool", Vec::new()),
            MappedCTypeKind::ObjCBool => self.std_type("ObjCBool", Vec::new()),
            MappedCTypeKind::ObjCSel => Ok(self.std_type("Selector", Vec::new())?.wrap_optional(optionality)),
            MappedCTypeKind::ObjCId => Ok(self.std_type("AnyObject", Vec::new())?.wrap_optional(optionality)),
            MappedCTypeKind::ObjCClass => Ok(self.std_type("AnyClass", Vec::new())?.wrap_optional(optionality)),
            MappedCTypeKind::CGFloat => self.std_type("CGFloat", Vec::new()),
            MappedCTypeKind::Block => {
                let function = HostType::Function {
                    params: Vec::new(),
                    result: Box::new(HostType::void()),
                    convention: FunctionConvention::Block,
                };
                Ok(function.wrap_optional(optionality))
            }
        }
    }

    /// Resolves a typedef registered in the mapped table, recording how it
    /// was handled. Returns `None` for ordinary typedefs.
    pub(crate) fn special_typedef(&mut self, typedef: ForeignDeclId) -> Option<(MappedTypeNameKind, MappedTypeRef)> {
        let canonical = self.foreign.canonical(typedef);
        let mapped = *MAPPED_TYPEDEFS.get(self.foreign.name_of(canonical))?;
        self.special_typedefs.insert(canonical, mapped.name_kind);
        Some((mapped.name_kind, MappedTypeRef(mapped)))
    }

    /// Emits the alias for a mapped typedef, at most once per module.
    pub(crate) fn ensure_special_alias(&mut self, typedef: ForeignDeclId, target: HostType) -> tandem_host::HostDeclId {
        let foreign = self.foreign;
        let foreign_decl = foreign.decl(typedef);
        let module = self.host_module(foreign_decl.module);
        let key = (module, foreign_decl.name.clone());
        if let Some(alias) = self.special_aliases.get(&key) {
            return *alias;
        }
        let alias = self.host.create_decl(
            module,
            None,
            DeclName::simple(foreign_decl.name.clone()),
            HostDeclKind::TypeAlias { underlying: target },
            Some(typedef),
        );
        log::trace!("emitted alias `{}` for a mapped typedef", foreign_decl.name);
        self.special_aliases.insert(key, alias);
        alias
    }

    pub(crate) fn mapped_host_type(&self, mapped: MappedTypeRef, request_kind: ImportTypeKind) -> ImportResult<HostType> {
        let request = TypeRequest {
            kind: request_kind,
            allow_wide_unsigned_as_signed: false,
            can_fully_bridge: false,
            default_optionality: OptionalKind::None,
            allow_unmanaged: false,
        };
        self.mapped_type(mapped.0, OptionalKind::None, request)
    }

    fn import_typedef_type(&mut self, typedef: ForeignDeclId, optionality: OptionalKind, request: TypeRequest) -> ImportResult<HostType> {
        if let Some((name_kind, mapped)) = self.special_typedef(typedef) {
            let target = self.mapped_type(mapped.0, optionality, request)?;
            return match name_kind {
                MappedTypeNameKind::DoNothing => Ok(target),
                MappedTypeNameKind::DefineOnly => {
                    let canonical = self.mapped_host_type(mapped, ImportTypeKind::Typedef)?;
                    self.ensure_special_alias(typedef, canonical);
                    Ok(target)
                }
                MappedTypeNameKind::DefineAndUse => {
                    let canonical = self.mapped_host_type(mapped, ImportTypeKind::Typedef)?;
                    let alias = self.ensure_special_alias(typedef, canonical.clone());
                    Ok(HostType::Alias { decl: alias, underlying: Box::new(canonical) })
                }
            };
        }

        if self.cf_class_name(typedef).is_some() {
            let class = self.import_decl(typedef).ok_or_else(|| ImportError::IncompleteType {
                name: self.foreign.name_of(typedef).to_string(),
            })?;
            let mut host = HostType::Nominal(class);
            if request.allow_unmanaged && request.kind.wraps_unmanaged() {
                host = self.std_type("Unmanaged", vec![host])?;
            }
            return Ok(host.wrap_optional(optionality));
        }

        let foreign = self.foreign;
        let ForeignDeclKind::Typedef { underlying } = &foreign.decl(typedef).kind else {
            return Err(ImportError::unsupported("typedef reference to a non-typedef"));
        };
        if self.superfluous_typedef_target(typedef).is_some() {
            return self.import_type_with(underlying, request);
        }

        let alias = self.import_decl(typedef).ok_or_else(|| ImportError::unsupported(format!(
            "typedef `{}` could not be imported",
            self.foreign.name_of(typedef)
        )))?;
        let aliased = match &self.host.decl(alias).kind {
            HostDeclKind::TypeAlias { underlying } => underlying.clone(),
            // The typedef is still being built further up the stack; import its
            // underlying type the way the builder does so the result does not
            // depend on which declaration was imported first.
            HostDeclKind::Placeholder => {
                self.import_type(underlying, ImportTypeKind::Typedef, false, false, OptionalKind::None)?
            }
            _ => return Ok(HostType::Nominal(alias)),
        };
        let host = HostType::Alias { decl: alias, underlying: Box::new(aliased) };
        if self.is_pointer_like(underlying) {
            Ok(host.wrap_optional(optionality))
        } else {
            Ok(host)
        }
    }

    /// Whether values of the type may be null.
    pub(crate) fn is_pointer_like(&self, ty: &ForeignType) -> bool {
        match ty.strip_nullability().0 {
            ForeignType::Pointer { .. }
            | ForeignType::BlockPointer(_)
            | ForeignType::ObjCObjectPointer { .. }
            | ForeignType::InstanceType
            | ForeignType::Builtin(BuiltinType::ObjCId | BuiltinType::ObjCClass | BuiltinType::ObjCSel) => true,
            ForeignType::Typedef(typedef) => match &self.foreign.decl(*typedef).kind {
                ForeignDeclKind::Typedef { underlying } => self.is_pointer_like(underlying),
                _ => false,
            },
            _ => false,
        }
    }

    /// Imports a record or class that a type mentions by value.
    fn import_tag(&mut self, tag: ForeignDeclId) -> ImportResult<tandem_host::HostDeclId> {
        if self.foreign.definition_of(tag).is_none() && !self.options.import_forward_declarations {
            return Err(ImportError::IncompleteType { name: self.foreign.name_of(tag).to_string() });
        }
        self.import_decl(tag).ok_or_else(|| {
            ImportError::unsupported(format!("`{}` could not be imported", self.foreign.name_of(tag)))
        })
    }

    fn import_enum_type(&mut self, decl: ForeignDeclId, request: TypeRequest) -> ImportResult<HostType> {
        if self.enum_kind(decl) == EnumKind::Constants {
            let foreign = self.foreign;
            let ForeignDeclKind::Enum { integer_type, .. } = &foreign.decl(decl).kind else {
                return Err(ImportError::unsupported("enum reference to a non-enum"));
            };
            return self.import_type_with(integer_type, request.nested(ImportTypeKind::Enum));
        }
        let host = self.import_tag(decl)?;
        Ok(HostType::Nominal(host))
    }

    /// The type of a pointer, before optionality.
    fn import_pointer(&mut self, pointee: &ForeignType, is_const: bool, request: TypeRequest) -> ImportResult<HostType> {
        let pointer_name = if is_const { "UnsafePointer" } else { "UnsafeMutablePointer" };
        let (stripped, _) = pointee.strip_nullability();
        match stripped {
            ForeignType::Builtin(BuiltinType::Void) => self.std_type(pointer_name, vec![HostType::void()]),
            ForeignType::Function(proto) => self.import_function_type(proto, FunctionConvention::C, request),
            ForeignType::Record(record) if self.foreign.definition_of(*record).is_none() => {
                self.std_type("OpaquePointer", Vec::new())
            }
            ForeignType::ObjCObjectPointer { .. } | ForeignType::Builtin(BuiltinType::ObjCId)
                if request.kind.is_parameter() =>
            {
                let mut nested = request.nested(ImportTypeKind::Pointee);
                nested.allow_unmanaged = request.kind == ImportTypeKind::Parameter;
                let object = self.import_type_with(pointee, nested)?;
                self.std_type("AutoreleasingUnsafeMutablePointer", vec![object])
            }
            _ => {
                let mut nested = request.nested(ImportTypeKind::Pointee);
                nested.allow_unmanaged = request.kind == ImportTypeKind::Parameter || !request.kind.is_parameter();
                let target = self.import_type_with(pointee, nested)?;
                self.std_type(pointer_name, vec![target])
            }
        }
    }

    fn import_function_type(
        &mut self,
        proto: &FunctionProto,
        convention: FunctionConvention,
        request: TypeRequest,
    ) -> ImportResult<HostType> {
        if convention == FunctionConvention::C && proto.calling_conv != CallingConv::C {
            return Err(ImportError::UnsupportedCallingConvention {
                convention: format!("{:?}", proto.calling_conv),
            });
        }
        if proto.is_variadic {
            return Err(ImportError::unsupported("variadic function type"));
        }
        let (param_kind, result_kind) = match convention {
            FunctionConvention::Block => (ImportTypeKind::Parameter, ImportTypeKind::Result),
            _ => (ImportTypeKind::Value, ImportTypeKind::Abstract),
        };
        let params = proto
            .params
            .iter()
            .map(|param| self.import_type_with(param, request.nested(param_kind)))
            .collect::<ImportResult<Vec<_>>>()?;
        let result = self.import_type_with(&proto.result, request.nested(result_kind))?;
        Ok(HostType::Function { params, result: Box::new(result), convention })
    }

    fn import_object_pointer(
        &mut self,
        class: Option<ForeignDeclId>,
        protocols: &[ForeignDeclId],
        request: TypeRequest,
    ) -> ImportResult<HostType> {
        let Some(class) = class else {
            let mut imported = Vec::with_capacity(protocols.len());
            for protocol in protocols {
                let host = self.import_decl(*protocol).ok_or_else(|| {
                    ImportError::unsupported(format!("protocol `{}` could not be imported", self.foreign.name_of(*protocol)))
                })?;
                imported.push(host);
            }
            return match imported.as_slice() {
                [] => self.std_type("AnyObject", Vec::new()),
                [single] => Ok(HostType::Nominal(*single)),
                _ => Ok(HostType::ProtocolComposition(imported)),
            };
        };

        let class_name = self.foreign.name_of(class);
        if let Some(needs_full_bridging) = BRIDGED_CLASSES.get(class_name) {
            if request.kind.allows_bridging() && (!needs_full_bridging || request.can_fully_bridge) {
                return self.bridged_type(class_name);
            }
        }
        let host = self.import_tag(class)?;
        Ok(HostType::Nominal(host))
    }

    fn bridged_type(&self, class_name: &str) -> ImportResult<HostType> {
        let any_object = || self.std_type("AnyObject", Vec::new());
        let ns_object = || self.std_type("NSObject", Vec::new());
        match class_name {
            "NSString" => self.std_type("String", Vec::new()),
            "NSArray" => self.std_type("Array", vec![any_object()?]),
            "NSDictionary" => self.std_type("Dictionary", vec![ns_object()?, any_object()?]),
            "NSSet" => self.std_type("Set", vec![ns_object()?]),
            other => Err(ImportError::unsupported(format!("no bridge for `{}`", other))),
        }
    }
}

/// An entry of the mapped typedef table, opaque outside this module.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MappedTypeRef(MappedType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_by_position() {
        assert!(ImportTypeKind::Parameter.allows_bridging());
        assert!(!ImportTypeKind::RecordField.allows_bridging());
        assert!(!ImportTypeKind::Parameter.wraps_unmanaged());
        assert!(!ImportTypeKind::AuditedResult.wraps_unmanaged());
        assert!(ImportTypeKind::Result.wraps_unmanaged());
        assert!(!ImportTypeKind::Parameter.allows_void());
    }

    #[test]
    fn tuple_width_flattens_nesting() {
        let int = HostType::Named { module: "Swift".to_string(), name: "Int32".to_string(), args: Vec::new() };
        assert_eq!(tuple_width(&int), 1);
        assert_eq!(tuple_width(&HostType::void()), 1);
        let row = HostType::Tuple(vec![int; 4]);
        assert_eq!(tuple_width(&row), 4);
        assert_eq!(tuple_width(&HostType::Tuple(vec![row; 3])), 12);
    }
}
