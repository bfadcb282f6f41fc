//! Building host declarations for foreign declarations.
//!
//! Every builder here runs inside [`ImportSession::import_decl`], which owns
//! caching and cycle handling. Type-like declarations reserve their host
//! identity up front so that members and self-referential types can name
//! them before they are finished.

use tandem_foreign::{ForeignDeclId, ForeignDeclKind, ForeignParam, ForeignType, Nullability};
use tandem_host::{
    ConstantValue, DeclName, ErrorConventionKind, ForeignErrorConvention, HostDeclId, HostDeclKind, HostModuleId,
    HostParam, HostType, InitKind, OptionalKind,
};

use crate::enum_kind::EnumKind;
use crate::error::{ImportError, ImportResult};
use crate::initializer::{resolve_initializer_kind, subscript_role};
use crate::name::{ImportNameOptions, ImportedErrorInfo, ImportedName};
use crate::session::ImportSession;
use crate::types::{ImportTypeKind, MappedTypeNameKind};

impl<'f> ImportSession<'f> {
    /// Builds the host declaration for a canonical foreign declaration.
    pub(crate) fn build_decl(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(canonical);
        log::trace!("importing `{}`", decl.name);

        let id = match &decl.kind {
            ForeignDeclKind::Record { .. } => self.build_record(canonical)?,
            ForeignDeclKind::Field { .. } => self.built_with_container(canonical)?,
            ForeignDeclKind::Enum { .. } => self.build_enum(canonical)?,
            ForeignDeclKind::EnumConstant { .. } => self.built_with_container(canonical)?,
            ForeignDeclKind::Typedef { .. } => self.build_typedef(canonical)?,
            ForeignDeclKind::Function { .. } => self.build_function(canonical)?,
            ForeignDeclKind::Variable { .. } => self.build_variable(canonical)?,
            ForeignDeclKind::ObjCInterface { .. } => self.build_class(canonical)?,
            ForeignDeclKind::ObjCProtocol { .. } => self.build_protocol(canonical)?,
            ForeignDeclKind::ObjCCategory { .. } => self.build_category(canonical)?,
            ForeignDeclKind::ObjCMethod { .. } => {
                let parent = self.member_parent(canonical)?;
                self.build_method(canonical, parent, false)?
            }
            ForeignDeclKind::ObjCProperty { .. } => {
                let parent = self.member_parent(canonical)?;
                self.build_property(canonical, parent, false)?
            }
        };

        if let Some(message) = &decl.attrs.unavailable {
            self.host.decl_mut(id).unavailable = Some(message.clone());
        }
        if self.host.decl(id).parent.is_none() {
            self.defer_external_registration(id);
        }
        Ok(id)
    }

    /// Imports a protocol member into the class `target`. Returns `None`
    /// when the class already declares a member with the same name.
    pub(crate) fn mirror_member(
        &mut self,
        member: ForeignDeclId,
        force_class_method: bool,
        target: HostDeclId,
    ) -> Option<HostDeclId> {
        let foreign = self.foreign;
        let imported = self.import_full_name(member, ImportNameOptions::empty());
        if !imported.is_some() || self.host.find_member(target, &imported.name).is_some() {
            return None;
        }
        if force_class_method && imported.init_kind.is_some() {
            return None;
        }
        let result = match &foreign.decl(member).kind {
            ForeignDeclKind::ObjCMethod { .. } => self.build_method(member, target, force_class_method),
            ForeignDeclKind::ObjCProperty { .. } => self.build_property(member, target, force_class_method),
            _ => return None,
        };
        match result {
            Ok(id) => Some(id),
            Err(err) => {
                log::debug!("not mirroring `{}`: {}", foreign.name_of(member), err);
                None
            }
        }
    }

    // --- Shared helpers ---

    fn imported_name(&mut self, decl: ForeignDeclId) -> ImportResult<ImportedName> {
        let imported = self.import_full_name(decl, ImportNameOptions::empty());
        if imported.is_some() {
            Ok(imported)
        } else {
            Err(ImportError::UnnamedDeclaration)
        }
    }

    fn module_of(&mut self, decl: ForeignDeclId) -> HostModuleId {
        let module = self.foreign.decl(decl).module;
        self.host_module(module)
    }

    /// The host container of a member declaration.
    fn member_parent(&mut self, member: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let missing = || ImportError::MissingContext { name: foreign.name_of(member).to_string() };
        let container = foreign.decl(member).context.ok_or_else(missing)?;
        self.import_decl(container).ok_or_else(missing)
    }

    /// Fields and enum constants are built together with their container;
    /// importing one imports the container and reads the result back.
    fn built_with_container(&mut self, member: ForeignDeclId) -> ImportResult<HostDeclId> {
        // An anonymous enum records its constants before failing, so a
        // recorded member takes precedence over the container's error.
        let parent = self.member_parent(member);
        if let Some(built) = self.imported_decls.get(&member).copied().flatten() {
            return Ok(built);
        }
        let parent = parent?;
        Err(ImportError::MemberNotImported {
            name: self.foreign.name_of(member).to_string(),
            container: self.host.decl(parent).name.to_string(),
        })
    }

    /// Creates a member of `parent` and appends it to the parent's list.
    fn create_member(
        &mut self,
        parent: HostDeclId,
        name: DeclName,
        kind: HostDeclKind,
        origin: ForeignDeclId,
    ) -> HostDeclId {
        let module = self.host.decl(parent).module;
        let id = self.host.create_decl(module, Some(parent), name, kind, Some(origin));
        self.host.add_member(parent, id);
        id
    }

    // --- Records ---

    fn build_record(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let record_name = foreign.name_of(canonical);
        let Some(definition) = foreign.definition_of(canonical) else {
            return Err(ImportError::IncompleteType { name: record_name.to_string() });
        };
        let name = self.imported_name(canonical)?.name;
        let module = self.module_of(canonical);
        let id = self.reserve_placeholder(canonical, module, None, name);
        self.host.decl_mut(id).kind = HostDeclKind::Struct { fields: Vec::new(), raw_type: None };

        let mut built = Vec::new();
        for field in foreign.decl(definition).members() {
            let field_decl = foreign.decl(*field);
            let ForeignDeclKind::Field { ty, bit_width } = &field_decl.kind else {
                continue;
            };
            if bit_width.is_some() {
                return Err(ImportError::BitField { record: record_name.to_string(), field: field_decl.name.clone() });
            }
            let ty = self.import_type(ty, ImportTypeKind::RecordField, false, false, OptionalKind::ImplicitlyUnwrapped)?;
            let host_field = self.create_member(
                id,
                DeclName::simple(field_decl.name.clone()),
                HostDeclKind::Var { ty, is_let: false },
                *field,
            );
            built.push((*field, host_field));
        }
        for (field, host_field) in built {
            self.record_import(field, Some(host_field));
        }
        Ok(id)
    }

    // --- Enums ---

    fn build_enum(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(canonical);
        let ForeignDeclKind::Enum { integer_type, constants } = &decl.kind else {
            return Err(ImportError::unsupported("enum builder on a non-enum"));
        };
        let kind = self.enum_kind(canonical);
        let raw_type = self.import_type(integer_type, ImportTypeKind::Enum, false, false, OptionalKind::None)?;
        let unsigned = is_unsigned_integer(self, integer_type);
        let module = self.module_of(canonical);
        log::debug!("enum `{}` imports as {:?}", decl.name, kind);

        match kind {
            EnumKind::Enum => {
                let name = self.imported_name(canonical)?.name;
                let id = self.host.create_decl(
                    module,
                    None,
                    name,
                    HostDeclKind::Enum { raw_type, cases: Vec::new() },
                    Some(canonical),
                );
                let mut built = Vec::new();
                for constant in constants {
                    let value = constant_value(self, *constant);
                    let case_name = self.import_full_name(*constant, ImportNameOptions::empty()).name;
                    let case = match self.enum_constant_values.get(&(canonical, value)).copied() {
                        Some(original) => {
                            let alias = self.create_member(
                                id,
                                case_name,
                                HostDeclKind::CaseAlias { original },
                                *constant,
                            );
                            self.host.decl_mut(alias).is_static = true;
                            alias
                        }
                        None => {
                            let case = self.create_member(id, case_name, HostDeclKind::EnumCase { raw_value: value }, *constant);
                            self.enum_constant_values.insert((canonical, value), case);
                            case
                        }
                    };
                    built.push((*constant, Some(case)));
                }
                self.record_constants(built);
                Ok(id)
            }
            EnumKind::Options => {
                let name = self.imported_name(canonical)?.name;
                let id = self.host.create_decl(
                    module,
                    None,
                    name,
                    HostDeclKind::OptionSet { raw_type, members: Vec::new() },
                    Some(canonical),
                );
                let mut built = Vec::new();
                for constant in constants {
                    let value = constant_value(self, *constant);
                    if value == 0 {
                        // The empty set is spelled `[]`.
                        built.push((*constant, None));
                        continue;
                    }
                    let member_name = self.import_full_name(*constant, ImportNameOptions::empty()).name;
                    let member = self.create_member(
                        id,
                        member_name,
                        HostDeclKind::Constant { ty: HostType::Nominal(id), value: integer_constant(value, unsigned) },
                        *constant,
                    );
                    self.host.decl_mut(member).is_static = true;
                    self.enum_constant_values.entry((canonical, value)).or_insert(member);
                    built.push((*constant, Some(member)));
                }
                self.record_constants(built);
                Ok(id)
            }
            EnumKind::Unknown => {
                let name = self.imported_name(canonical)?.name;
                let id = self.host.create_decl(
                    module,
                    None,
                    name,
                    HostDeclKind::Struct { fields: Vec::new(), raw_type: Some(raw_type) },
                    Some(canonical),
                );
                self.build_module_constants(module, canonical, constants, HostType::Nominal(id), unsigned);
                Ok(id)
            }
            EnumKind::Constants => {
                self.build_module_constants(module, canonical, constants, raw_type.clone(), unsigned);
                if decl.is_anonymous() {
                    return Err(ImportError::UnnamedDeclaration);
                }
                let name = self.imported_name(canonical)?.name;
                Ok(self.host.create_decl(
                    module,
                    None,
                    name,
                    HostDeclKind::TypeAlias { underlying: raw_type },
                    Some(canonical),
                ))
            }
        }
    }

    /// Enum constants that live at module scope, typed `ty`.
    fn build_module_constants(
        &mut self,
        module: HostModuleId,
        owner: ForeignDeclId,
        constants: &[ForeignDeclId],
        ty: HostType,
        unsigned: bool,
    ) {
        let mut built = Vec::new();
        for constant in constants {
            let value = constant_value(self, *constant);
            let name = self.import_full_name(*constant, ImportNameOptions::empty()).name;
            let id = self.host.create_decl(
                module,
                None,
                name,
                HostDeclKind::Constant { ty: ty.clone(), value: integer_constant(value, unsigned) },
                Some(*constant),
            );
            self.enum_constant_values.entry((owner, value)).or_insert(id);
            self.defer_external_registration(id);
            built.push((*constant, Some(id)));
        }
        self.record_constants(built);
    }

    fn record_constants(&mut self, built: Vec<(ForeignDeclId, Option<HostDeclId>)>) {
        for (constant, host) in built {
            self.record_import(constant, host);
        }
    }

    // --- Typedefs ---

    fn build_typedef(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(canonical);

        if let Some(tag) = self.superfluous_typedef_target(canonical) {
            return self
                .import_decl(tag)
                .ok_or_else(|| ImportError::IncompleteType { name: foreign.name_of(tag).to_string() });
        }

        if let Some((name_kind, mapped)) = self.special_typedef(canonical) {
            if name_kind == MappedTypeNameKind::DoNothing {
                return Err(ImportError::NotStandalone { name: decl.name.clone() });
            }
            let target = self.mapped_host_type(mapped, ImportTypeKind::Typedef)?;
            return Ok(self.ensure_special_alias(canonical, target));
        }

        let imported = self.imported_name(canonical)?;
        let module = self.module_of(canonical);

        if let Some(alias_name) = imported.alias {
            let class = self.reserve_placeholder(canonical, module, None, imported.name);
            self.host.decl_mut(class).kind = HostDeclKind::Class { superclass: None, members: Vec::new() };
            let alias = self.host.create_decl(
                module,
                None,
                alias_name,
                HostDeclKind::TypeAlias { underlying: HostType::Nominal(class) },
                Some(canonical),
            );
            self.alternates.insert(class, alias);
            self.defer_external_registration(alias);
            return Ok(class);
        }

        let ForeignDeclKind::Typedef { underlying } = &decl.kind else {
            return Err(ImportError::unsupported("typedef builder on a non-typedef"));
        };
        let id = self.reserve_placeholder(canonical, module, None, imported.name);
        let underlying = self.import_type(underlying, ImportTypeKind::Typedef, false, false, OptionalKind::None)?;
        self.host.decl_mut(id).kind = HostDeclKind::TypeAlias { underlying };
        Ok(id)
    }

    // --- Functions and variables ---

    fn build_function(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(canonical);
        let ForeignDeclKind::Function { params, result, is_variadic } = &decl.kind else {
            return Err(ImportError::unsupported("function builder on a non-function"));
        };
        if *is_variadic {
            return Err(ImportError::VariadicFunction { name: decl.name.clone() });
        }
        let imported = self.imported_name(canonical)?;
        let labels = imported.name.arguments().unwrap_or(&[]).to_vec();
        let params = self.import_params(params, &labels, None)?;
        let result_kind = if decl.attrs.cf_audited { ImportTypeKind::AuditedResult } else { ImportTypeKind::Result };
        let result = self.import_result_type(canonical, result, result_kind)?;
        let module = self.module_of(canonical);
        Ok(self.host.create_decl(
            module,
            None,
            imported.name,
            HostDeclKind::Func { params, result, error: None, is_instance: false },
            Some(canonical),
        ))
    }

    fn build_variable(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(canonical);
        let ForeignDeclKind::Variable { ty, is_const } = &decl.kind else {
            return Err(ImportError::unsupported("variable builder on a non-variable"));
        };
        let kind = if decl.attrs.cf_audited { ImportTypeKind::AuditedVariable } else { ImportTypeKind::Variable };
        let ty = self.import_type(ty, kind, false, false, OptionalKind::ImplicitlyUnwrapped)?;
        let name = self.imported_name(canonical)?.name;
        let module = self.module_of(canonical);
        Ok(self.host.create_decl(module, None, name, HostDeclKind::Var { ty, is_let: *is_const }, Some(canonical)))
    }

    /// Parameters in host order. The error parameter is dropped, or typed
    /// `Void` when it keeps its slot in the name.
    fn import_params(
        &mut self,
        params: &[ForeignParam],
        labels: &[String],
        error: Option<ImportedErrorInfo>,
    ) -> ImportResult<Vec<HostParam>> {
        let mut imported = Vec::with_capacity(params.len());
        let mut next_label = labels.iter();
        for (index, param) in params.iter().enumerate() {
            let is_error = error.map_or(false, |info| info.param_index == index);
            if is_error && !error.map_or(false, |info| info.replace_param_with_void) {
                continue;
            }
            let label = next_label.next().cloned().unwrap_or_default();
            let ty = if is_error {
                HostType::void()
            } else {
                let kind = match param.retained {
                    Some(true) => ImportTypeKind::CfRetainedOutParameter,
                    Some(false) => ImportTypeKind::CfUnretainedOutParameter,
                    None => ImportTypeKind::Parameter,
                };
                self.import_type(&param.ty, kind, false, true, OptionalKind::ImplicitlyUnwrapped)?
            };
            imported.push(HostParam { label, name: param.name.clone(), ty });
        }
        Ok(imported)
    }

    /// Imports a result type, applying out-of-line nullability when the
    /// type itself carries none.
    fn import_result_type(
        &mut self,
        decl: ForeignDeclId,
        result: &ForeignType,
        kind: ImportTypeKind,
    ) -> ImportResult<HostType> {
        let annotated = self.annotated(decl, result);
        self.import_type(&annotated, kind, false, true, OptionalKind::ImplicitlyUnwrapped)
    }

    fn annotated(&self, decl: ForeignDeclId, ty: &ForeignType) -> ForeignType {
        match self.foreign.decl(decl).attrs.nullability {
            Some(nullability) if ty.strip_nullability().1.is_none() => ty.clone().with_nullability(nullability),
            _ => ty.clone(),
        }
    }

    // --- Objective-C containers ---

    fn build_class(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let definition = match foreign.definition_of(canonical) {
            Some(definition) => definition,
            None if self.options.import_forward_declarations => canonical,
            None => return Err(ImportError::IncompleteType { name: foreign.name_of(canonical).to_string() }),
        };
        let ForeignDeclKind::ObjCInterface { superclass, protocols, members, .. } = &foreign.decl(definition).kind else {
            return Err(ImportError::unsupported("class builder on a non-class"));
        };
        let name = self.imported_name(canonical)?.name;
        let module = self.module_of(canonical);
        let id = self.reserve_placeholder(canonical, module, None, name);

        let superclass = superclass.and_then(|superclass| self.import_decl(superclass));
        self.host.decl_mut(id).kind = HostDeclKind::Class { superclass, members: Vec::new() };

        for member in members {
            self.import_decl(*member);
        }
        let conformances = self.adopt_protocols(id, id, protocols, superclass.is_none());
        self.defer_conformances(conformances);
        Ok(id)
    }

    fn build_protocol(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCProtocol { protocols, members } = &foreign.decl(canonical).kind else {
            return Err(ImportError::unsupported("protocol builder on a non-protocol"));
        };
        let name = self.imported_name(canonical)?.name;
        let module = self.module_of(canonical);
        let id = self.reserve_placeholder(canonical, module, None, name);
        self.host.decl_mut(id).kind = HostDeclKind::Protocol { members: Vec::new() };

        for inherited in protocols {
            self.import_decl(*inherited);
        }
        for member in members {
            self.import_decl(*member);
        }
        Ok(id)
    }

    fn build_category(&mut self, canonical: ForeignDeclId) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCCategory { class, protocols, members } = &foreign.decl(canonical).kind else {
            return Err(ImportError::unsupported("category builder on a non-category"));
        };
        let extended = self
            .import_decl(*class)
            .ok_or_else(|| ImportError::MissingContext { name: foreign.name_of(*class).to_string() })?;
        let name = self.host.decl(extended).name.clone();
        let module = self.module_of(canonical);
        let id = self.reserve_placeholder(canonical, module, None, name);
        self.host.decl_mut(id).kind = HostDeclKind::Extension { extended, members: Vec::new() };

        for member in members {
            self.import_decl(*member);
        }
        let conformances = self.adopt_protocols(extended, id, protocols, false);
        self.defer_conformances(conformances);
        Ok(id)
    }

    /// Declares `conforming`'s conformances and mirrors the protocols'
    /// members into `target`. Root classes also receive instance
    /// requirements as class members.
    fn adopt_protocols(
        &mut self,
        conforming: HostDeclId,
        target: HostDeclId,
        protocols: &[ForeignDeclId],
        is_root_class: bool,
    ) -> Vec<tandem_host::ConformanceId> {
        let mut conformances = Vec::new();
        let mut pending: Vec<ForeignDeclId> = protocols.to_vec();
        let mut seen = Vec::new();
        while let Some(protocol) = pending.pop() {
            let protocol = self.foreign.canonical(protocol);
            if seen.contains(&protocol) {
                continue;
            }
            seen.push(protocol);
            let Some(host_protocol) = self.import_decl(protocol) else {
                continue;
            };
            if !self.host.conformances_of(conforming).any(|existing| existing.protocol == host_protocol) {
                conformances.push(self.host.add_conformance(conforming, host_protocol));
            }
            let foreign = self.foreign;
            let protocol_decl = foreign.decl(protocol);
            for member in protocol_decl.members() {
                self.import_mirrored_decl(*member, false, target);
                let is_instance_method =
                    matches!(foreign.decl(*member).kind, ForeignDeclKind::ObjCMethod { is_instance: true, .. });
                if is_root_class && is_instance_method {
                    self.import_mirrored_decl(*member, true, target);
                }
            }
            pending.extend(protocol_decl.adopted_protocols().iter().copied());
        }
        conformances
    }

    // --- Objective-C members ---

    fn build_method(&mut self, method: ForeignDeclId, parent: HostDeclId, force_class_method: bool) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let decl = foreign.decl(method);
        let ForeignDeclKind::ObjCMethod { selector, params, result, is_instance, .. } = &decl.kind else {
            return Err(ImportError::unsupported("method builder on a non-method"));
        };
        let is_instance = *is_instance && !force_class_method;
        let imported = self.imported_name(method)?;

        if imported.is_subscript_accessor {
            let accessor_name = DeclName::compound(selector.first_piece(), vec![String::new(); params.len()]);
            let param_list = self.import_params(params, &vec![String::new(); params.len()], None)?;
            let result_ty = self.import_result_type(method, result, ImportTypeKind::Result)?;
            let accessor = self.create_member(
                parent,
                accessor_name,
                HostDeclKind::Func { params: param_list, result: result_ty, error: None, is_instance },
                method,
            );
            self.pair_subscript(method, accessor, parent)?;
            return Ok(accessor);
        }

        if let Some(init_kind) = imported.init_kind {
            return self.build_constructor(method, parent, imported, init_kind, is_instance);
        }

        let labels = imported.name.arguments().unwrap_or(&[]).to_vec();
        let param_list = self.import_params(params, &labels, imported.error_info)?;
        let result_ty = self.import_result_type(method, result, ImportTypeKind::Result)?;
        let (result_ty, error) = apply_error_convention(result_ty, imported.error_info);
        let func = self.create_member(
            parent,
            imported.name,
            HostDeclKind::Func { params: param_list, result: result_ty, error, is_instance },
            method,
        );
        self.host.decl_mut(func).is_static = !is_instance;
        Ok(func)
    }

    fn build_constructor(
        &mut self,
        method: ForeignDeclId,
        parent: HostDeclId,
        imported: ImportedName,
        init_kind: InitKind,
        is_instance: bool,
    ) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCMethod { params, result, .. } = &foreign.decl(method).kind else {
            return Err(ImportError::unsupported("constructor builder on a non-method"));
        };
        let resolved = resolve_initializer_kind(foreign, method, !is_instance);
        let labels = imported.name.arguments().unwrap_or(&[]).to_vec();
        let param_list = self.import_params(params, &labels, imported.error_info)?;

        let annotated = self.annotated(method, result);
        let mut failability = match annotated.strip_nullability().1 {
            Some(Nullability::NonNull) => OptionalKind::None,
            Some(Nullability::Nullable) => OptionalKind::Optional,
            _ => OptionalKind::ImplicitlyUnwrapped,
        };
        let error = imported.error_info.map(error_convention);
        if error.map_or(false, |convention| convention.kind == ErrorConventionKind::NilResult) {
            failability = OptionalKind::None;
        }
        let constructor = self.create_member(
            parent,
            imported.name,
            HostDeclKind::Constructor {
                params: param_list,
                init_kind,
                is_required: resolved.is_required,
                failability,
                error,
            },
            method,
        );
        self.constructors.insert((foreign.canonical(method), parent), constructor);

        if !is_instance {
            self.build_factory_alternate(method, parent, constructor)?;
        }
        Ok(constructor)
    }

    /// Keeps a factory method reachable under its own name, marked
    /// unavailable in favor of the initializer.
    fn build_factory_alternate(&mut self, method: ForeignDeclId, parent: HostDeclId, constructor: HostDeclId) -> ImportResult<()> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCMethod { params, result, .. } = &foreign.decl(method).kind else {
            return Ok(());
        };
        let imported = self.import_full_name(method, ImportNameOptions::SUPPRESS_FACTORY_METHOD_AS_INIT);
        if !imported.is_some() {
            return Ok(());
        }
        let labels = imported.name.arguments().unwrap_or(&[]).to_vec();
        let param_list = self.import_params(params, &labels, imported.error_info)?;
        let result_ty = self.import_result_type(method, result, ImportTypeKind::Result)?;
        let (result_ty, error) = apply_error_convention(result_ty, imported.error_info);
        let message = format!("use the initializer `{}`", self.host.decl(constructor).name);
        let alternate = self.create_member(
            parent,
            imported.name,
            HostDeclKind::Func { params: param_list, result: result_ty, error, is_instance: false },
            method,
        );
        let alternate_decl = self.host.decl_mut(alternate);
        alternate_decl.is_static = true;
        alternate_decl.unavailable = Some(message);
        self.alternates.insert(constructor, alternate);
        Ok(())
    }

    /// Builds the subscript for a getter accessor, pairing it with the
    /// setter declared in the same container. Setters do not build
    /// subscripts themselves.
    fn pair_subscript(&mut self, method: ForeignDeclId, accessor: HostDeclId, parent: HostDeclId) -> ImportResult<()> {
        let foreign = self.foreign;
        let decl = foreign.decl(method);
        let Some(role) = decl.selector().and_then(subscript_role) else {
            return Ok(());
        };
        if !role.is_getter() {
            return Ok(());
        }
        let ForeignDeclKind::ObjCMethod { params, result, .. } = &decl.kind else {
            return Ok(());
        };
        let [index_param] = params.as_slice() else {
            return Err(ImportError::unsupported("subscript getter without a single index"));
        };

        let setter = decl.context.and_then(|container| {
            foreign.decl(container).members().iter().copied().find(|member| {
                foreign.decl(*member).selector().map_or(false, |selector| selector.to_string() == role.counterpart_selector())
            })
        });
        let setter = setter.and_then(|setter| self.import_decl(setter));

        let index = self.import_type(&index_param.ty, ImportTypeKind::Parameter, false, true, OptionalKind::ImplicitlyUnwrapped)?;
        let element = self.import_result_type(method, result, ImportTypeKind::Result)?;
        let subscript = self.create_member(
            parent,
            DeclName::simple("subscript"),
            HostDeclKind::Subscript { getter: accessor, setter, index, element },
            method,
        );
        self.subscripts.insert((accessor, setter), subscript);
        Ok(())
    }

    fn build_property(&mut self, property: ForeignDeclId, parent: HostDeclId, force_class_method: bool) -> ImportResult<HostDeclId> {
        let foreign = self.foreign;
        let ForeignDeclKind::ObjCProperty { ty, is_readonly, is_class } = &foreign.decl(property).kind else {
            return Err(ImportError::unsupported("property builder on a non-property"));
        };
        let annotated = self.annotated(property, ty);
        let ty = self.import_type(&annotated, ImportTypeKind::Property, false, true, OptionalKind::ImplicitlyUnwrapped)?;
        let name = self.imported_name(property)?.name;
        let id = self.create_member(parent, name, HostDeclKind::Property { ty, is_readonly: *is_readonly }, property);
        self.host.decl_mut(id).is_static = *is_class || force_class_method;
        Ok(id)
    }
}

fn error_convention(info: ImportedErrorInfo) -> ForeignErrorConvention {
    ForeignErrorConvention {
        kind: info.kind,
        is_owned: info.is_owned,
        param_index: info.param_index,
        replaced_with_void: info.replace_param_with_void,
    }
}

/// The host result of a throwing function: a `BOOL` result becomes `Void`
/// and a nil-on-failure result becomes non-optional.
fn apply_error_convention(result: HostType, info: Option<ImportedErrorInfo>) -> (HostType, Option<ForeignErrorConvention>) {
    let Some(info) = info else {
        return (result, None);
    };
    let result = match info.kind {
        ErrorConventionKind::ZeroResult => HostType::void(),
        ErrorConventionKind::NilResult => result.unwrap_optional().0.clone(),
        ErrorConventionKind::NonNilError => result,
    };
    (result, Some(error_convention(info)))
}

fn constant_value(session: &ImportSession<'_>, constant: ForeignDeclId) -> i64 {
    match session.foreign.decl(constant).kind {
        ForeignDeclKind::EnumConstant { value } => value,
        _ => 0,
    }
}

fn integer_constant(value: i64, unsigned: bool) -> ConstantValue {
    if unsigned {
        ConstantValue::UInt(value as u64)
    } else {
        ConstantValue::Int(value)
    }
}

fn is_unsigned_integer(session: &ImportSession<'_>, ty: &ForeignType) -> bool {
    match ty.strip_nullability().0 {
        ForeignType::Builtin(builtin) => builtin.is_unsigned(),
        ForeignType::Typedef(typedef) => match &session.foreign.decl(*typedef).kind {
            ForeignDeclKind::Typedef { underlying } => is_unsigned_integer(session, underlying),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use tandem_foreign::{BuiltinType, ForeignContext, ForeignType};

    use super::*;
    use crate::config::ImporterOptions;

    #[test]
    fn members_report_why_they_are_missing() {
        let mut foreign = ForeignContext::new();
        let module = foreign.add_module("Hardware");
        let flags = foreign.add_record(module, "Flags");
        let ready = foreign.add_bit_field(flags, "ready", ForeignType::Builtin(BuiltinType::UInt), 1);
        let style = foreign.add_enum(
            module,
            "Style",
            ForeignType::Builtin(BuiltinType::UInt),
            &[("StyleNone", 0), ("StyleBold", 1), ("StyleItalic", 2)],
        );
        foreign.attrs_mut(style).enum_macro = Some("NS_OPTIONS".to_string());
        let limits = foreign.add_enum(module, "", ForeignType::int(), &[("kMaxItems", 10)]);
        let style_none = foreign.decl(style).members()[0];
        let style_bold = foreign.decl(style).members()[1];
        let max_items = foreign.decl(limits).members()[0];
        let mut session = ImportSession::new(&foreign, ImporterOptions::default());

        // The record itself fails, so its field has no context to import into.
        assert!(matches!(
            session.built_with_container(ready),
            Err(ImportError::MissingContext { name }) if name == "ready"
        ));

        // The option set imports but drops its empty value.
        assert!(matches!(
            session.built_with_container(style_none),
            Err(ImportError::MemberNotImported { name, container }) if name == "StyleNone" && container == "Style"
        ));
        assert!(session.built_with_container(style_bold).is_ok());

        // The anonymous enum fails after recording its constant.
        assert!(session.built_with_container(max_items).is_ok());
    }
}
