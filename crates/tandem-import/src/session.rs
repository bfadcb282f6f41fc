//! The import session: identity map, generations and deferred work.

use std::rc::Rc;

use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexSet;
use tandem_foreign::{ForeignContext, ForeignDeclId, ForeignDeclKind, ForeignModuleId, MacroId};
use tandem_host::{ConformanceId, ConformanceState, DeclName, HostContext, HostDeclId, HostDeclKind, HostModuleId};

use crate::config::ImporterOptions;
use crate::enum_kind::{classify_enum, compute_enum_constant_name_prefix, EnumKind};
use crate::lookup_table::LookupTable;
use crate::types::MappedTypeNameKind;

/// A generation-stamped snapshot of every declaration visible through the
/// session's modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleDecls {
    generation: u64,
    decls: Rc<[HostDeclId]>,
}

impl VisibleDecls {
    /// The generation the snapshot was computed in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn decls(&self) -> &[HostDeclId] {
        &self.decls
    }

    pub fn contains(&self, decl: HostDeclId) -> bool {
        self.decls.contains(&decl)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// Extensions of one class, stamped with the generation they were
/// computed in.
#[derive(Debug, Clone)]
struct CachedExtensions {
    generation: u64,
    extensions: Rc<[HostDeclId]>,
}

/// One import session: owns every cache that maps foreign declarations to
/// host declarations, together with the host declarations themselves.
///
/// The session is single-threaded and recursively re-entrant. Importing a
/// declaration may import the declarations its type mentions, which may in
/// turn ask for the first one again; such cycles are broken by handing out a
/// placeholder identity that the outer import back-patches.
pub struct ImportSession<'f> {
    pub(crate) foreign: &'f ForeignContext,
    pub(crate) host: HostContext,
    pub(crate) options: ImporterOptions,
    generation: u64,

    /// Canonical foreign declaration to its host declaration; `None` records
    /// a failed import. Never purged.
    pub(crate) imported_decls: FxHashMap<ForeignDeclId, Option<HostDeclId>>,
    /// Imports currently on the stack, with their placeholder if one was
    /// reserved.
    in_progress: FxHashMap<ForeignDeclId, Option<HostDeclId>>,
    mirrored_decls: FxHashMap<(ForeignDeclId, bool, HostDeclId), Option<HostDeclId>>,
    pub(crate) special_typedefs: FxHashMap<ForeignDeclId, MappedTypeNameKind>,
    /// Aliases emitted for mapped typedefs, at most one per module and name.
    pub(crate) special_aliases: FxHashMap<(HostModuleId, String), HostDeclId>,
    enum_prefixes: FxHashMap<ForeignDeclId, String>,
    /// (enum, value) to the first case or constant with that value.
    pub(crate) enum_constant_values: FxHashMap<(ForeignDeclId, i64), HostDeclId>,
    /// (initializer method, host container) to the constructor built for it.
    pub(crate) constructors: FxHashMap<(ForeignDeclId, HostDeclId), HostDeclId>,
    /// (getter, setter) to the subscript pairing them.
    pub(crate) subscripts: FxHashMap<(HostDeclId, Option<HostDeclId>), HostDeclId>,
    pub(crate) alternates: FxHashMap<HostDeclId, HostDeclId>,
    pub(crate) imported_macros: FxHashMap<MacroId, Option<HostDeclId>>,
    pub(crate) macros_in_progress: FxHashSet<MacroId>,

    module_wrappers: FxHashMap<ForeignModuleId, HostModuleId>,
    pub(crate) visible_modules: Vec<ForeignModuleId>,
    pub(crate) lookup_tables: Vec<LookupTable>,

    visible: Option<VisibleDecls>,
    class_extensions: FxHashMap<ForeignDeclId, CachedExtensions>,

    importing_depth: u32,
    finishing: bool,
    next_ticket: u64,
    delayed_conformances: FxHashMap<u64, Vec<ConformanceId>>,
    pending_tickets: Vec<u64>,
    pending_external: Vec<HostDeclId>,
    registered_external: FxHashSet<HostDeclId>,
}

impl<'f> ImportSession<'f> {
    pub fn new(foreign: &'f ForeignContext, options: ImporterOptions) -> Self {
        Self::with_host(foreign, HostContext::new(), options)
    }

    /// Creates a session that adds its declarations to an existing host
    /// context.
    pub fn with_host(foreign: &'f ForeignContext, host: HostContext, options: ImporterOptions) -> Self {
        Self {
            foreign,
            host,
            options,
            generation: 1,
            imported_decls: FxHashMap::default(),
            in_progress: FxHashMap::default(),
            mirrored_decls: FxHashMap::default(),
            special_typedefs: FxHashMap::default(),
            special_aliases: FxHashMap::default(),
            enum_prefixes: FxHashMap::default(),
            enum_constant_values: FxHashMap::default(),
            constructors: FxHashMap::default(),
            subscripts: FxHashMap::default(),
            alternates: FxHashMap::default(),
            imported_macros: FxHashMap::default(),
            macros_in_progress: FxHashSet::default(),
            module_wrappers: FxHashMap::default(),
            visible_modules: Vec::new(),
            lookup_tables: Vec::new(),
            visible: None,
            class_extensions: FxHashMap::default(),
            importing_depth: 0,
            finishing: false,
            next_ticket: 1,
            delayed_conformances: FxHashMap::default(),
            pending_tickets: Vec::new(),
            pending_external: Vec::new(),
            registered_external: FxHashSet::default(),
        }
    }

    pub fn foreign(&self) -> &'f ForeignContext {
        self.foreign
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    pub fn into_host(self) -> HostContext {
        self.host
    }

    pub fn options(&self) -> &ImporterOptions {
        &self.options
    }

    // --- Modules and generations ---

    /// The current generation. Starts at 1 and grows with every module that
    /// becomes visible.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation. Derived lists (the visible-declaration
    /// snapshot and class extension lists) are recomputed on next use; the
    /// identity map is untouched.
    pub fn bump_generation(&mut self) {
        self.generation += 1;
        self.host.bump_generation();
        log::trace!("import generation is now {}", self.generation);
    }

    /// Makes a foreign module visible: wraps it in a host module, indexes
    /// its names and starts a new generation.
    pub fn add_module(&mut self, module: ForeignModuleId) -> HostModuleId {
        let host_module = self.host_module(module);
        if self.visible_modules.contains(&module) {
            return host_module;
        }
        self.visible_modules.push(module);
        if self.options.use_lookup_tables {
            self.build_lookup_table(module);
        }
        self.bump_generation();
        log::info!(
            "module `{}` is visible (generation {})",
            self.foreign.module(module).name,
            self.generation
        );
        host_module
    }

    /// The host module wrapping `module`, created on first use.
    pub(crate) fn host_module(&mut self, module: ForeignModuleId) -> HostModuleId {
        if let Some(id) = self.module_wrappers.get(&module) {
            return *id;
        }
        let id = self.host.add_module(&self.foreign.module(module).name);
        self.module_wrappers.insert(module, id);
        id
    }

    /// All foreign declarations visible under the imported base name `name`.
    /// Only membership is meaningful.
    pub fn lookup_value(&self, name: &str) -> IndexSet<ForeignDeclId> {
        if self.options.use_lookup_tables {
            return self
                .lookup_tables
                .iter()
                .filter_map(|table| table.lookup(name))
                .flat_map(|entries| entries.iter().copied())
                .collect();
        }
        let foreign = self.foreign;
        self.visible_modules
            .iter()
            .flat_map(|module| foreign.module(*module).decls.iter().copied())
            .filter(|decl| foreign.name_of(*decl) == name)
            .collect()
    }

    pub fn lookup_macro(&self, name: &str) -> Option<MacroId> {
        if self.options.use_lookup_tables {
            return self.lookup_tables.iter().find_map(|table| table.lookup_macro(name));
        }
        let foreign = self.foreign;
        self.visible_modules
            .iter()
            .flat_map(|module| foreign.module(*module).macros.iter().copied())
            .find(|id| foreign.macro_info(*id).name == name)
    }

    /// Every declaration visible through the session's modules.
    ///
    /// The snapshot is recomputed when the generation has moved on since it
    /// was taken, so a returned snapshot is never stale for its generation.
    pub fn visible_decls(&mut self) -> VisibleDecls {
        if let Some(visible) = &self.visible {
            if visible.generation == self.generation {
                return visible.clone();
            }
        }
        let foreign = self.foreign;
        let mut seen = FxHashSet::default();
        let mut decls = Vec::new();
        for module in self.visible_modules.clone() {
            for decl in &foreign.module(module).decls {
                if let Some(id) = self.import_decl(*decl) {
                    if seen.insert(id) {
                        decls.push(id);
                    }
                }
            }
            for id in &foreign.module(module).macros {
                if let Some(constant) = self.import_macro(*id) {
                    if seen.insert(constant) {
                        decls.push(constant);
                    }
                }
            }
        }
        log::trace!("recomputed {} visible declarations in generation {}", decls.len(), self.generation);
        let snapshot = VisibleDecls { generation: self.generation, decls: decls.into() };
        self.visible = Some(snapshot.clone());
        snapshot
    }

    /// The extensions imported for `class`'s categories, recomputed when the
    /// cached list belongs to an older generation.
    pub fn class_extensions(&mut self, class: ForeignDeclId) -> Rc<[HostDeclId]> {
        let canonical = self.foreign.canonical(class);
        if let Some(cached) = self.class_extensions.get(&canonical) {
            if cached.generation == self.generation {
                return cached.extensions.clone();
            }
        }
        let foreign = self.foreign;
        let categories: Vec<ForeignDeclId> = if self.options.use_lookup_tables {
            self.lookup_tables.iter().flat_map(|table| table.categories_of(canonical).iter().copied()).collect()
        } else {
            self.visible_modules
                .iter()
                .flat_map(|module| foreign.module(*module).decls.iter().copied())
                .filter(|decl| match foreign.decl(*decl).kind {
                    ForeignDeclKind::ObjCCategory { class, .. } => foreign.canonical(class) == canonical,
                    _ => false,
                })
                .collect()
        };
        let extensions: Rc<[HostDeclId]> =
            categories.into_iter().filter_map(|category| self.import_decl(category)).collect();
        self.class_extensions
            .insert(canonical, CachedExtensions { generation: self.generation, extensions: extensions.clone() });
        extensions
    }

    // --- Declaration identity ---

    /// The cached import of `decl`, without computing anything.
    pub fn import_decl_cached(&self, decl: ForeignDeclId) -> Option<HostDeclId> {
        let canonical = self.foreign.canonical(decl);
        self.imported_decls.get(&canonical).copied().flatten()
    }

    /// Imports `decl`, looking through superfluous typedefs to the tag they
    /// name.
    pub fn import_decl(&mut self, decl: ForeignDeclId) -> Option<HostDeclId> {
        self.import_decl_and_cache_impl(decl, true)
    }

    /// Imports `decl`, returning `None` for a superfluous typedef.
    pub fn import_decl_real(&mut self, decl: ForeignDeclId) -> Option<HostDeclId> {
        self.import_decl_and_cache_impl(decl, false)
    }

    fn import_decl_and_cache_impl(&mut self, decl: ForeignDeclId, transparent_typedefs: bool) -> Option<HostDeclId> {
        let canonical = self.foreign.canonical(decl);
        if !transparent_typedefs && self.superfluous_typedef_target(canonical).is_some() {
            return None;
        }
        if let Some(cached) = self.imported_decls.get(&canonical) {
            return *cached;
        }
        if let Some(placeholder) = self.in_progress.get(&canonical) {
            log::trace!("cyclic import of `{}`", self.foreign.name_of(canonical));
            return *placeholder;
        }

        self.with_importing_entity(|session| {
            session.in_progress.insert(canonical, None);
            let result = session.build_decl(canonical);
            let placeholder = session.in_progress.remove(&canonical).flatten();
            let imported = match result {
                Ok(id) => Some(id),
                Err(err) => {
                    log::debug!("skipping `{}`: {}", session.foreign.name_of(canonical), err);
                    if let Some(placeholder) = placeholder {
                        session.host.decl_mut(placeholder).kind = HostDeclKind::Invalid;
                    }
                    None
                }
            };
            session.imported_decls.insert(canonical, imported);
            imported
        })
    }

    /// Creates the placeholder a nested request for `canonical` will receive
    /// while its import is still running.
    pub(crate) fn reserve_placeholder(
        &mut self,
        canonical: ForeignDeclId,
        module: HostModuleId,
        parent: Option<HostDeclId>,
        name: DeclName,
    ) -> HostDeclId {
        let id = self.host.create_decl(module, parent, name, HostDeclKind::Placeholder, Some(canonical));
        self.in_progress.insert(canonical, Some(id));
        id
    }

    /// Records the import of a declaration built as part of its container.
    pub(crate) fn record_import(&mut self, decl: ForeignDeclId, host: Option<HostDeclId>) {
        let canonical = self.foreign.canonical(decl);
        self.imported_decls.insert(canonical, host);
    }

    /// Imports a protocol member as a member of the class `target`.
    ///
    /// Cached per (member, force-class-method flag, target).
    pub fn import_mirrored_decl(
        &mut self,
        decl: ForeignDeclId,
        force_class_method: bool,
        target: HostDeclId,
    ) -> Option<HostDeclId> {
        let key = (self.foreign.canonical(decl), force_class_method, target);
        if let Some(cached) = self.mirrored_decls.get(&key) {
            return *cached;
        }
        let mirrored = self.with_importing_entity(|session| session.mirror_member(key.0, force_class_method, target));
        self.mirrored_decls.insert(key, mirrored);
        mirrored
    }

    pub fn alternate_decl(&self, decl: HostDeclId) -> Option<HostDeclId> {
        self.alternates.get(&decl).copied()
    }

    /// The subscript pairing `getter` with `setter`, if one was built.
    pub fn subscript_for(&self, getter: HostDeclId, setter: Option<HostDeclId>) -> Option<HostDeclId> {
        self.subscripts.get(&(getter, setter)).copied()
    }

    /// The constructor imported for `method` inside `container`.
    pub fn constructor_for(&self, method: ForeignDeclId, container: HostDeclId) -> Option<HostDeclId> {
        self.constructors.get(&(self.foreign.canonical(method), container)).copied()
    }

    /// How a mapped typedef was handled, once it has been seen.
    pub fn special_typedef_kind(&self, typedef: ForeignDeclId) -> Option<MappedTypeNameKind> {
        self.special_typedefs.get(&self.foreign.canonical(typedef)).copied()
    }

    // --- Enums ---

    pub fn enum_kind(&self, decl: ForeignDeclId) -> EnumKind {
        classify_enum(self.foreign, decl, &self.options)
    }

    /// The prefix shared by the enum's constants, memoized per enum.
    pub fn enum_constant_name_prefix(&mut self, decl: ForeignDeclId) -> String {
        let canonical = self.foreign.canonical(decl);
        if let Some(prefix) = self.enum_prefixes.get(&canonical) {
            return prefix.clone();
        }
        let prefix = compute_enum_constant_name_prefix(self.foreign, canonical);
        self.enum_prefixes.insert(canonical, prefix.clone());
        prefix
    }

    // --- Reentrancy and deferred work ---

    /// Runs `f` as one importing entity. Deferred work queued while any
    /// entity is active runs when the outermost one finishes.
    pub(crate) fn with_importing_entity<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.importing_depth += 1;
        let result = f(self);
        self.importing_depth -= 1;
        if self.importing_depth == 0 {
            self.finish_pending_actions();
        }
        result
    }

    /// Current nesting depth of import requests.
    pub fn importing_depth(&self) -> u32 {
        self.importing_depth
    }

    /// Sets aside conformances whose witnesses are checked later. The ticket
    /// can be redeemed with [`ImportSession::take_delayed_conformance`].
    pub fn allocate_delayed_conformance(&mut self, conformances: Vec<ConformanceId>) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.delayed_conformances.insert(ticket, conformances);
        ticket
    }

    pub fn take_delayed_conformance(&mut self, ticket: u64) -> Option<Vec<ConformanceId>> {
        self.delayed_conformances.remove(&ticket)
    }

    /// Queues conformances to be completed when the import stack unwinds.
    pub(crate) fn defer_conformances(&mut self, conformances: Vec<ConformanceId>) {
        if conformances.is_empty() {
            return;
        }
        let ticket = self.allocate_delayed_conformance(conformances);
        self.pending_tickets.push(ticket);
    }

    /// Queues a finished declaration to be handed to the host.
    pub(crate) fn defer_external_registration(&mut self, decl: HostDeclId) {
        self.pending_external.push(decl);
    }

    fn finish_pending_actions(&mut self) {
        if self.finishing {
            return;
        }
        self.finishing = true;
        loop {
            if !self.pending_tickets.is_empty() {
                for ticket in std::mem::take(&mut self.pending_tickets) {
                    for conformance in self.take_delayed_conformance(ticket).unwrap_or_default() {
                        self.complete_conformance(conformance);
                    }
                }
                continue;
            }
            if !self.pending_external.is_empty() {
                for decl in std::mem::take(&mut self.pending_external) {
                    let live = !matches!(self.host.decl(decl).kind, HostDeclKind::Invalid | HostDeclKind::Placeholder);
                    if live && self.registered_external.insert(decl) {
                        self.host.register_external_decl(decl);
                    }
                }
                continue;
            }
            break;
        }
        self.finishing = false;
    }

    /// Checks every requirement of the protocol against the conforming
    /// type's members, its extensions and its superclasses.
    fn complete_conformance(&mut self, id: ConformanceId) {
        let conformance = self.host.conformance(id).clone();
        if conformance.state == ConformanceState::Complete {
            return;
        }
        let requirements: Vec<DeclName> = self
            .host
            .decl(conformance.protocol)
            .kind
            .members()
            .iter()
            .map(|member| self.host.decl(*member))
            .filter(|member| !matches!(member.kind, HostDeclKind::Invalid | HostDeclKind::Placeholder))
            .map(|member| member.name.clone())
            .collect();

        let mut missing = Vec::new();
        for requirement in requirements {
            if !self.has_witness(conformance.conforming, &requirement) {
                missing.push(requirement);
            }
        }
        if !missing.is_empty() {
            log::debug!(
                "conformance of `{}` to `{}` lacks {} witness(es)",
                self.host.decl(conformance.conforming).name,
                self.host.decl(conformance.protocol).name,
                missing.len()
            );
        }
        let entry = self.host.conformance_mut(id);
        entry.missing_witnesses = missing;
        entry.state = ConformanceState::Complete;
    }

    fn has_witness(&mut self, conforming: HostDeclId, requirement: &DeclName) -> bool {
        let mut current = Some(conforming);
        while let Some(ty) = current {
            if self.host.find_member(ty, requirement).is_some() {
                return true;
            }
            if let Some(origin) = self.host.decl(ty).origin {
                let extensions = self.class_extensions(origin);
                if extensions.iter().any(|extension| self.host.find_member(*extension, requirement).is_some()) {
                    return true;
                }
            }
            current = match self.host.decl(ty).kind {
                HostDeclKind::Class { superclass, .. } => superclass,
                _ => None,
            };
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_host::HostType;

    #[test]
    fn deferred_conformances_wait_for_the_outermost_import() {
        let foreign = ForeignContext::new();
        let mut session = ImportSession::new(&foreign, ImporterOptions::default());
        let module = session.host.add_module("Widgets");
        let protocol = session.host.create_decl(
            module,
            None,
            DeclName::simple("Named"),
            HostDeclKind::Protocol { members: Vec::new() },
            None,
        );
        let requirement = session.host.create_decl(
            module,
            Some(protocol),
            DeclName::simple("name"),
            HostDeclKind::Property { ty: HostType::void(), is_readonly: true },
            None,
        );
        session.host.add_member(protocol, requirement);
        let class = session.host.create_decl(
            module,
            None,
            DeclName::simple("Widget"),
            HostDeclKind::Class { superclass: None, members: Vec::new() },
            None,
        );
        let conformance = session.host.add_conformance(class, protocol);

        session.with_importing_entity(|session| {
            session.with_importing_entity(|session| {
                assert_eq!(session.importing_depth(), 2);
                session.defer_conformances(vec![conformance]);
            });
            // Leaving a nested import must not run deferred work.
            assert_eq!(session.importing_depth(), 1);
            assert_eq!(session.host.conformance(conformance).state, ConformanceState::Incomplete);
            assert!(session.host.conformance(conformance).missing_witnesses.is_empty());
        });

        assert_eq!(session.importing_depth(), 0);
        let finished = session.host.conformance(conformance);
        assert_eq!(finished.state, ConformanceState::Complete);
        assert_eq!(finished.missing_witnesses, vec![DeclName::simple("name")]);
        assert!(session.take_delayed_conformance(1).is_none());
    }
}
