//! Importing the names of foreign declarations.

use bitflags::bitflags;
use tandem_foreign::{BuiltinType, ForeignDeclId, ForeignDeclKind, ForeignModuleId, ForeignParam, ForeignType, Selector};
use tandem_host::{DeclName, ErrorConventionKind, InitKind};

use crate::enum_kind::EnumKind;
use crate::initializer::{resolve_initializer_kind, should_import_as_initializer, subscript_role};
use crate::session::ImportSession;
use crate::words::{
    camel_case_words, has_word_suffix, is_identifier, lowercase_first_word, omit_leading_result_words,
    omit_trailing_type_words,
};

/// Suffix given to a protocol whose name collides with a class.
pub const PROTOCOL_SUFFIX: &str = "Protocol";
/// Suffix of CF reference typedefs (`CFStringRef`).
pub const CF_TYPE_SUFFIX: &str = "Ref";

const ERROR_NAME_SUFFIXES: &[&str] = &["AndReturnError", "WithError"];

bitflags! {
    /// Flags adjusting a single name import.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImportNameOptions: u8 {
        /// Import factory class methods under their own names instead of as
        /// initializers.
        const SUPPRESS_FACTORY_METHOD_AS_INIT = 0b0000_0001;
    }
}

/// How a throwing host function maps onto a trailing error out-parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportedErrorInfo {
    pub kind: ErrorConventionKind,
    /// The error out-value is returned retained.
    pub is_owned: bool,
    /// Index of the error parameter among the foreign parameters.
    pub param_index: usize,
    /// The error parameter keeps its slot in the host name, typed `Void`,
    /// because its label could not be dropped.
    pub replace_param_with_void: bool,
}

/// The host name of a foreign declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImportedName {
    pub name: DeclName,
    /// A second name the declaration is also reachable by (`CFStringRef`
    /// next to `CFString`).
    pub alias: Option<DeclName>,
    pub has_custom_name: bool,
    pub dropped_variadic: bool,
    pub is_subscript_accessor: bool,
    /// Set when the declaration imports as an initializer.
    pub init_kind: Option<InitKind>,
    pub error_info: Option<ImportedErrorInfo>,
}

impl ImportedName {
    pub fn new(name: DeclName) -> Self {
        Self { name, ..Self::default() }
    }

    /// `false` when nothing could be named.
    pub fn is_some(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Where an imported declaration lives in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveContext {
    /// Module scope.
    Module(ForeignModuleId),
    /// Inside the host declaration imported for the given foreign
    /// declaration.
    Decl(ForeignDeclId),
}

impl<'f> ImportSession<'f> {
    /// Computes the host name of `decl`.
    ///
    /// Within one generation, repeated calls return identical results.
    pub fn import_full_name(&mut self, decl: ForeignDeclId, options: ImportNameOptions) -> ImportedName {
        self.import_full_name_in_context(decl, options).0
    }

    /// Computes the host name of `decl` and the context it is imported into.
    pub fn import_full_name_in_context(
        &mut self,
        decl: ForeignDeclId,
        options: ImportNameOptions,
    ) -> (ImportedName, EffectiveContext) {
        let foreign = self.foreign;
        let foreign_decl = foreign.decl(decl);
        let context = self.effective_context(decl);

        if let Some(custom) = &foreign_decl.attrs.custom_name {
            match DeclName::parse(custom) {
                Some(name) => return (self.custom_imported_name(decl, name), context),
                None => log::debug!("ignoring malformed custom name `{}` on `{}`", custom, foreign_decl.name),
            }
        }

        let imported = match &foreign_decl.kind {
            ForeignDeclKind::ObjCMethod { .. } => self.import_method_name(decl, options),
            ForeignDeclKind::EnumConstant { .. } => ImportedName::new(self.import_enum_constant_name(decl)),
            ForeignDeclKind::Typedef { .. } => match self.cf_class_name(decl) {
                Some(class_name) => ImportedName {
                    name: DeclName::simple(class_name),
                    alias: Some(DeclName::simple(foreign_decl.name.clone())),
                    ..ImportedName::default()
                },
                None => ImportedName::new(DeclName::simple(foreign_decl.name.clone())),
            },
            ForeignDeclKind::ObjCProtocol { .. } => {
                if self.class_name_visible(&foreign_decl.name) {
                    ImportedName::new(DeclName::simple(format!("{}{}", foreign_decl.name, PROTOCOL_SUFFIX)))
                } else {
                    ImportedName::new(DeclName::simple(foreign_decl.name.clone()))
                }
            }
            ForeignDeclKind::Record { .. } | ForeignDeclKind::Enum { .. } if foreign_decl.is_anonymous() => {
                match self.typedef_for_anonymous_tag(decl) {
                    Some(typedef) => ImportedName::new(DeclName::simple(foreign.name_of(typedef))),
                    None => ImportedName::default(),
                }
            }
            ForeignDeclKind::Function { params, .. } => {
                ImportedName::new(DeclName::compound(foreign_decl.name.clone(), vec![String::new(); params.len()]))
            }
            _ => ImportedName::new(DeclName::simple(foreign_decl.name.clone())),
        };
        (imported, context)
    }

    fn effective_context(&self, decl: ForeignDeclId) -> EffectiveContext {
        let foreign_decl = self.foreign.decl(decl);
        match (&foreign_decl.kind, foreign_decl.context) {
            (ForeignDeclKind::EnumConstant { .. }, Some(owner)) => match self.enum_kind(owner) {
                EnumKind::Enum | EnumKind::Options => EffectiveContext::Decl(owner),
                EnumKind::Unknown | EnumKind::Constants => EffectiveContext::Module(foreign_decl.module),
            },
            (_, Some(parent)) => EffectiveContext::Decl(parent),
            (_, None) => EffectiveContext::Module(foreign_decl.module),
        }
    }

    /// A user-supplied rename. Only the error convention is still derived,
    /// since it follows from the parameter types.
    fn custom_imported_name(&mut self, decl: ForeignDeclId, name: DeclName) -> ImportedName {
        let foreign = self.foreign;
        let mut imported = ImportedName { name, has_custom_name: true, ..ImportedName::default() };
        if let ForeignDeclKind::ObjCMethod { params, is_instance, .. } = &foreign.decl(decl).kind {
            if imported.name.base() == "init" {
                imported.init_kind = Some(resolve_initializer_kind(foreign, decl, !is_instance).kind);
            }
            if let Some(mut info) = self.detect_error_info(decl) {
                let arity = imported.name.arguments().map_or(0, <[String]>::len);
                info.replace_param_with_void = arity == params.len();
                imported.error_info = Some(info);
            }
        }
        imported
    }

    fn import_enum_constant_name(&mut self, decl: ForeignDeclId) -> DeclName {
        let foreign = self.foreign;
        let foreign_decl = foreign.decl(decl);
        let full = DeclName::simple(foreign_decl.name.clone());
        let Some(owner) = foreign_decl.context else {
            return full;
        };
        if !matches!(self.enum_kind(owner), EnumKind::Enum | EnumKind::Options) {
            return full;
        }
        let prefix = self.enum_constant_name_prefix(owner);
        if prefix.is_empty() {
            return full;
        }
        match foreign_decl.name.strip_prefix(prefix.as_str()) {
            Some(rest) if is_identifier(rest) && !rest.starts_with(|c: char| c.is_ascii_digit()) => {
                DeclName::simple(rest)
            }
            _ => full,
        }
    }

    fn import_method_name(&mut self, decl: ForeignDeclId, options: ImportNameOptions) -> ImportedName {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCMethod { selector, params, result, is_instance, is_variadic } = &foreign.decl(decl).kind
        else {
            return ImportedName::default();
        };

        if subscript_role(selector).is_some() {
            return ImportedName {
                name: DeclName::simple("subscript"),
                is_subscript_accessor: true,
                ..ImportedName::default()
            };
        }

        let initializer = should_import_as_initializer(foreign, decl, options);
        if *is_variadic && initializer.is_none() {
            log::debug!("variadic method `{}` has no host name", selector);
            return ImportedName::default();
        }

        let words = camel_case_words(selector.first_piece());
        let (mut base, first_label) = match initializer {
            Some(matched) => {
                let rest: String = words[matched.prefix_length.min(words.len())..].concat();
                ("init".to_string(), lowercase_first_word(&rest))
            }
            None => (selector.first_piece().to_string(), String::new()),
        };

        // One (parameter index, label) slot per foreign parameter.
        let mut slots: Vec<(usize, String)> = (0..params.len())
            .map(|index| match index {
                0 => (0, first_label.clone()),
                _ => (index, selector.pieces().get(index).cloned().unwrap_or_default()),
            })
            .collect();

        let mut error_info = self.detect_error_info(decl);
        if let Some(info) = &mut error_info {
            let index = info.param_index;
            let reduced_base = match (index, initializer) {
                (0, None) => strip_error_suffix(&base),
                (0, Some(_)) => None,
                _ => Some(base.clone()),
            };
            let erased = match reduced_base {
                Some(reduced) => {
                    let first_piece = if index == 0 { reduced.as_str() } else { selector.first_piece() };
                    let candidate = reduced_selector(selector, index, first_piece);
                    if self.sibling_has_selector(decl, *is_instance, &candidate) {
                        log::trace!("keeping error parameter of `{}`: `{}` exists", selector, candidate);
                        false
                    } else {
                        if index == 0 {
                            base = reduced;
                        }
                        true
                    }
                }
                None => false,
            };
            if erased {
                slots.retain(|(param, _)| *param != index);
            }
            info.replace_param_with_void = !erased;
        }

        if self.options.omit_needless_words {
            if initializer.is_none() {
                if let Some(result_name) = self.type_name_for_omission(result) {
                    if let Some(shortened) = omit_leading_result_words(&base, &result_name) {
                        base = shortened;
                    }
                }
                let names_first_param = slots.first().map_or(false, |(param, _)| *param == 0);
                if names_first_param {
                    if let Some(type_name) = self.type_name_for_omission(&params[0].ty) {
                        if let Some(shortened) = omit_trailing_type_words(&base, &type_name) {
                            base = shortened;
                        }
                    }
                }
            }
            for (param, label) in slots.iter_mut() {
                if label.is_empty() {
                    continue;
                }
                if let Some(type_name) = self.type_name_for_omission(&params[*param].ty) {
                    if let Some(shortened) = omit_trailing_type_words(label, &type_name) {
                        *label = shortened;
                    }
                }
            }
        }

        let init_kind = initializer.map(|_| resolve_initializer_kind(foreign, decl, !is_instance).kind);
        ImportedName {
            name: DeclName::compound(base, slots.into_iter().map(|(_, label)| label).collect()),
            alias: None,
            has_custom_name: false,
            dropped_variadic: *is_variadic && initializer.is_some(),
            is_subscript_accessor: false,
            init_kind,
            error_info,
        }
    }

    /// Recognizes a trailing `NSError **` parameter (trailing blocks may
    /// follow it) and derives the convention from the result type.
    pub(crate) fn detect_error_info(&self, decl: ForeignDeclId) -> Option<ImportedErrorInfo> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCMethod { params, result, .. } = &foreign.decl(decl).kind else {
            return None;
        };
        let index = self.error_parameter_index(params)?;
        let kind = match result.strip_nullability().0 {
            ForeignType::Builtin(BuiltinType::Bool) => ErrorConventionKind::ZeroResult,
            ForeignType::Typedef(typedef) if foreign.name_of(*typedef) == "BOOL" => ErrorConventionKind::ZeroResult,
            ForeignType::ObjCObjectPointer { .. }
            | ForeignType::InstanceType
            | ForeignType::Builtin(BuiltinType::ObjCId) => ErrorConventionKind::NilResult,
            ForeignType::Builtin(BuiltinType::Void) => ErrorConventionKind::NonNilError,
            _ => return None,
        };
        Some(ImportedErrorInfo {
            kind,
            is_owned: params[index].retained.unwrap_or(false),
            param_index: index,
            replace_param_with_void: true,
        })
    }

    fn error_parameter_index(&self, params: &[ForeignParam]) -> Option<usize> {
        let (index, param) = params.iter().enumerate().rev().find(|(_, param)| !param.ty.is_block_pointer())?;
        self.is_error_out_pointer(&param.ty).then_some(index)
    }

    fn is_error_out_pointer(&self, ty: &ForeignType) -> bool {
        let ForeignType::Pointer { pointee, .. } = ty.strip_nullability().0 else {
            return false;
        };
        match pointee.strip_nullability().0 {
            ForeignType::ObjCObjectPointer { class: Some(class), .. } => self.foreign.name_of(*class) == "NSError",
            ForeignType::Typedef(typedef) => self.foreign.name_of(*typedef) == "CFErrorRef",
            _ => false,
        }
    }

    fn sibling_has_selector(&self, decl: ForeignDeclId, is_instance: bool, selector: &str) -> bool {
        let foreign = self.foreign;
        let Some(container) = foreign.decl(decl).context else {
            return false;
        };
        foreign.decl(container).members().iter().any(|member| {
            *member != decl
                && matches!(
                    &foreign.decl(*member).kind,
                    ForeignDeclKind::ObjCMethod { selector: sibling, is_instance: sibling_instance, .. }
                        if *sibling_instance == is_instance && sibling.to_string() == selector
                )
        })
    }

    /// The name used when matching words against a type: the typedef, tag
    /// or class name.
    pub(crate) fn type_name_for_omission(&self, ty: &ForeignType) -> Option<String> {
        let foreign = self.foreign;
        match ty.strip_nullability().0 {
            ForeignType::Typedef(id) | ForeignType::Record(id) | ForeignType::Enum(id) => {
                Some(foreign.name_of(*id).to_string()).filter(|name| !name.is_empty())
            }
            ForeignType::ObjCObjectPointer { class: Some(class), .. } => Some(foreign.name_of(*class).to_string()),
            ForeignType::ObjCObjectPointer { class: None, protocols } if protocols.len() == 1 => {
                Some(foreign.name_of(protocols[0]).to_string())
            }
            ForeignType::Builtin(BuiltinType::ObjCId) => Some("Object".to_string()),
            ForeignType::Builtin(BuiltinType::ObjCClass) => Some("Class".to_string()),
            ForeignType::Builtin(BuiltinType::ObjCSel) => Some("Selector".to_string()),
            ForeignType::Builtin(BuiltinType::Bool) => Some("Bool".to_string()),
            ForeignType::BlockPointer(_) => Some("Block".to_string()),
            _ => None,
        }
    }

    /// `true` when a class named `name` is visible.
    fn class_name_visible(&self, name: &str) -> bool {
        let foreign = self.foreign;
        self.lookup_value(name)
            .iter()
            .any(|decl| matches!(foreign.decl(*decl).kind, ForeignDeclKind::ObjCInterface { .. }))
    }

    /// For a CF reference typedef `FooRef`, the class name `Foo`.
    ///
    /// A typedef qualifies when it carries the CF-type attribute, or when it
    /// names a pointer to a record called `__Foo` or marked as a CF type.
    pub(crate) fn cf_class_name(&self, typedef: ForeignDeclId) -> Option<String> {
        let foreign = self.foreign;
        let decl = foreign.decl(typedef);
        let ForeignDeclKind::Typedef { underlying } = &decl.kind else {
            return None;
        };
        let stem = decl.name.strip_suffix(CF_TYPE_SUFFIX).filter(|stem| !stem.is_empty())?;
        if decl.attrs.cf_type {
            return Some(stem.to_string());
        }
        let ForeignType::Pointer { pointee, .. } = underlying.strip_nullability().0 else {
            return None;
        };
        let ForeignType::Record(record) = pointee.strip_nullability().0 else {
            return None;
        };
        let record = foreign.decl(*record);
        let is_cf_record = record.attrs.cf_type || record.name.strip_prefix("__") == Some(stem);
        is_cf_record.then(|| stem.to_string())
    }

    /// The typedef that gives an anonymous tag its name, as in
    /// `typedef struct { ... } Point;`.
    pub(crate) fn typedef_for_anonymous_tag(&self, tag: ForeignDeclId) -> Option<ForeignDeclId> {
        let foreign = self.foreign;
        let canonical = foreign.canonical(tag);
        foreign.module(foreign.decl(tag).module).decls.iter().copied().find(|decl| {
            match &foreign.decl(*decl).kind {
                ForeignDeclKind::Typedef { underlying } => match underlying.strip_nullability().0 {
                    ForeignType::Record(id) | ForeignType::Enum(id) => foreign.canonical(*id) == canonical,
                    _ => false,
                },
                _ => false,
            }
        })
    }

    /// For a typedef that only restates a tag (`typedef struct Foo Foo;` or
    /// a typedef naming an anonymous tag), the tag it names.
    pub(crate) fn superfluous_typedef_target(&self, typedef: ForeignDeclId) -> Option<ForeignDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(typedef);
        let ForeignDeclKind::Typedef { underlying } = &decl.kind else {
            return None;
        };
        match underlying.strip_nullability().0 {
            ForeignType::Record(tag) | ForeignType::Enum(tag) => {
                let tag_decl = foreign.decl(*tag);
                (tag_decl.is_anonymous() || tag_decl.name == decl.name).then_some(*tag)
            }
            _ => None,
        }
    }
}

fn strip_error_suffix(base: &str) -> Option<String> {
    ERROR_NAME_SUFFIXES
        .iter()
        .find(|suffix| base.len() > suffix.len() && has_word_suffix(base, suffix))
        .map(|suffix| base[..base.len() - suffix.len()].to_string())
}

/// The selector a method would have without its error parameter.
fn reduced_selector(selector: &Selector, error_index: usize, first_piece: &str) -> String {
    let pieces = selector.pieces();
    if error_index == 0 {
        if pieces.len() <= 1 {
            return first_piece.to_string();
        }
        let mut text = first_piece.to_string();
        for piece in &pieces[1..] {
            text.push(':');
            text.push_str(piece);
        }
        text.push(':');
        return text;
    }
    pieces
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != error_index)
        .map(|(_, piece)| format!("{}:", piece))
        .collect()
}
