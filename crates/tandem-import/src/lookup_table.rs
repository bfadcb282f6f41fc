//! Per-module name index.

use fxhash::FxHashMap;
use indexmap::IndexSet;
use tandem_foreign::{ForeignDeclId, ForeignDeclKind, ForeignModuleId, MacroId};

use crate::name::ImportNameOptions;
use crate::session::ImportSession;

/// Append-only index from imported base names to the foreign declarations
/// that carry them, built once when a module becomes visible.
#[derive(Debug, Clone)]
pub struct LookupTable {
    module: ForeignModuleId,
    entries: FxHashMap<String, IndexSet<ForeignDeclId>>,
    macros: FxHashMap<String, MacroId>,
    /// Categories keyed by the canonical class they extend.
    categories: FxHashMap<ForeignDeclId, Vec<ForeignDeclId>>,
}

impl LookupTable {
    pub fn new(module: ForeignModuleId) -> Self {
        Self { module, entries: FxHashMap::default(), macros: FxHashMap::default(), categories: FxHashMap::default() }
    }

    pub fn module(&self) -> ForeignModuleId {
        self.module
    }

    pub fn add_entry(&mut self, name: &str, decl: ForeignDeclId) {
        if name.is_empty() {
            return;
        }
        self.entries.entry(name.to_string()).or_default().insert(decl);
    }

    pub fn lookup(&self, name: &str) -> Option<&IndexSet<ForeignDeclId>> {
        self.entries.get(name)
    }

    pub fn add_macro(&mut self, name: &str, id: MacroId) {
        self.macros.insert(name.to_string(), id);
    }

    pub fn lookup_macro(&self, name: &str) -> Option<MacroId> {
        self.macros.get(name).copied()
    }

    pub fn macros(&self) -> impl Iterator<Item = MacroId> + '_ {
        self.macros.values().copied()
    }

    pub fn add_category(&mut self, class: ForeignDeclId, category: ForeignDeclId) {
        let categories = self.categories.entry(class).or_default();
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    pub fn categories_of(&self, class: ForeignDeclId) -> &[ForeignDeclId] {
        self.categories.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct names in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.macros.is_empty()
    }
}

impl<'f> ImportSession<'f> {
    /// Indexes every name `module` contributes. The table is installed
    /// before indexing starts so that naming decisions which depend on
    /// visibility (a protocol sharing its name with a class) see the
    /// module's classes; protocols are indexed last for the same reason.
    pub(crate) fn build_lookup_table(&mut self, module: ForeignModuleId) {
        let foreign = self.foreign;
        self.lookup_tables.push(LookupTable::new(module));
        let table = self.lookup_tables.len() - 1;

        let (protocols, others): (Vec<ForeignDeclId>, Vec<ForeignDeclId>) = foreign
            .module(module)
            .decls
            .iter()
            .copied()
            .partition(|decl| matches!(foreign.decl(*decl).kind, ForeignDeclKind::ObjCProtocol { .. }));
        for decl in others.into_iter().chain(protocols) {
            self.index_decl(table, decl);
            match &foreign.decl(decl).kind {
                ForeignDeclKind::ObjCCategory { class, .. } => {
                    self.lookup_tables[table].add_category(foreign.canonical(*class), decl);
                }
                ForeignDeclKind::Record { .. } => {}
                _ => {
                    for member in foreign.decl(decl).members() {
                        self.index_decl(table, *member);
                    }
                }
            }
        }

        for id in &foreign.module(module).macros {
            self.lookup_tables[table].add_macro(&foreign.macro_info(*id).name, *id);
        }
        log::debug!(
            "indexed {} names in module `{}`",
            self.lookup_tables[table].len(),
            foreign.module(module).name
        );
    }

    /// Adds `decl` under its imported name, its alias and its foreign
    /// spelling.
    fn index_decl(&mut self, table: usize, decl: ForeignDeclId) {
        let foreign = self.foreign;
        let imported = self.import_full_name(decl, ImportNameOptions::empty());
        let table = &mut self.lookup_tables[table];
        table.add_entry(imported.name.base(), decl);
        if let Some(alias) = &imported.alias {
            table.add_entry(alias.base(), decl);
        }
        table.add_entry(foreign.name_of(decl), decl);
    }
}
