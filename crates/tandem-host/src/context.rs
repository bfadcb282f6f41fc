//! The host declaration store.

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use tandem_foreign::ForeignDeclId;

use crate::decl::{HostDecl, HostDeclId, HostDeclKind};
use crate::name::DeclName;
use crate::ty::{FunctionConvention, HostType, OptionalKind};

/// Identity of a host module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostModuleId(pub u32);

/// A host module wrapping one foreign module.
#[derive(Debug, Clone, PartialEq)]
pub struct HostModule {
    pub name: String,
    /// Top-level declarations in creation order.
    pub decls: Vec<HostDeclId>,
}

/// Identity of a protocol conformance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConformanceId(pub u32);

/// Whether a conformance's witnesses have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceState {
    Incomplete,
    Complete,
}

/// A declared conformance of a type to a protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConformance {
    pub conforming: HostDeclId,
    pub protocol: HostDeclId,
    pub state: ConformanceState,
    /// Requirements that had no witness when the conformance was completed.
    pub missing_witnesses: Vec<DeclName>,
}

lazy_static! {
    /// Standard-library types known to every host context: name, defining
    /// module, number of generic parameters.
    static ref STANDARD_TYPES: Vec<(&'static str, &'static str, usize)> = vec![
        ("Bool", "Swift", 0),
        ("Int", "Swift", 0),
        ("UInt", "Swift", 0),
        ("Int8", "Swift", 0),
        ("Int16", "Swift", 0),
        ("Int32", "Swift", 0),
        ("Int64", "Swift", 0),
        ("UInt8", "Swift", 0),
        ("UInt16", "Swift", 0),
        ("UInt32", "Swift", 0),
        ("UInt64", "Swift", 0),
        ("CChar", "Swift", 0),
        ("Float", "Swift", 0),
        ("Double", "Swift", 0),
        ("Float80", "Swift", 0),
        ("String", "Swift", 0),
        ("Array", "Swift", 1),
        ("Dictionary", "Swift", 2),
        ("Set", "Swift", 1),
        ("AnyObject", "Swift", 0),
        ("AnyClass", "Swift", 0),
        ("UnsafePointer", "Swift", 1),
        ("UnsafeMutablePointer", "Swift", 1),
        ("AutoreleasingUnsafeMutablePointer", "Swift", 1),
        ("OpaquePointer", "Swift", 0),
        ("CVaListPointer", "Swift", 0),
        ("Unmanaged", "Swift", 1),
        ("ObjCBool", "ObjectiveC", 0),
        ("Selector", "ObjectiveC", 0),
        ("NSObject", "ObjectiveC", 0),
        ("CGFloat", "CoreGraphics", 0),
    ];
}

/// Owner of every host declaration produced during a session.
#[derive(Debug)]
pub struct HostContext {
    decls: Vec<HostDecl>,
    modules: Vec<HostModule>,
    conformances: Vec<ProtocolConformance>,
    external_decls: Vec<HostDeclId>,
    standard_types: FxHashMap<String, (String, usize)>,
    generation: u64,
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HostContext {
    /// Creates a context with the standard library types registered.
    pub fn new() -> Self {
        let standard_types = STANDARD_TYPES
            .iter()
            .map(|(name, module, arity)| (name.to_string(), (module.to_string(), *arity)))
            .collect();
        Self {
            decls: Vec::new(),
            modules: Vec::new(),
            conformances: Vec::new(),
            external_decls: Vec::new(),
            standard_types,
            generation: 0,
        }
    }

    // --- Standard library ---

    /// Looks up a named standard-library type, specialized with `args`.
    ///
    /// Returns `None` when the type is unknown or `args` has the wrong arity.
    pub fn named_type(&self, name: &str, args: Vec<HostType>) -> Option<HostType> {
        let (module, arity) = self.standard_types.get(name)?;
        if *arity != args.len() {
            log::debug!("standard type `{}` expects {} arguments, got {}", name, arity, args.len());
            return None;
        }
        Some(HostType::Named { module: module.clone(), name: name.to_string(), args })
    }

    /// Removes a standard type, e.g. to model a target without `Float80`.
    pub fn remove_standard_type(&mut self, name: &str) {
        self.standard_types.remove(name);
    }

    // --- Modules and declarations ---

    pub fn add_module(&mut self, name: &str) -> HostModuleId {
        let id = HostModuleId(self.modules.len() as u32);
        self.modules.push(HostModule { name: name.to_string(), decls: Vec::new() });
        id
    }

    pub fn module(&self, id: HostModuleId) -> &HostModule {
        &self.modules[id.0 as usize]
    }

    /// Creates a declaration. Declarations without a parent are recorded as
    /// top-level declarations of `module`; member lists are maintained by
    /// the caller.
    pub fn create_decl(
        &mut self,
        module: HostModuleId,
        parent: Option<HostDeclId>,
        name: DeclName,
        kind: HostDeclKind,
        origin: Option<ForeignDeclId>,
    ) -> HostDeclId {
        let id = HostDeclId(self.decls.len() as u32);
        self.decls.push(HostDecl { name, kind, module, parent, origin, unavailable: None, is_static: false });
        if parent.is_none() {
            self.modules[module.0 as usize].decls.push(id);
        }
        id
    }

    pub fn decl(&self, id: HostDeclId) -> &HostDecl {
        &self.decls[id.0 as usize]
    }

    pub fn decl_mut(&mut self, id: HostDeclId) -> &mut HostDecl {
        &mut self.decls[id.0 as usize]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    /// Appends `child` to the member list of `parent`.
    pub fn add_member(&mut self, parent: HostDeclId, child: HostDeclId) {
        if let Some(members) = self.decl_mut(parent).kind.members_mut() {
            if !members.contains(&child) {
                members.push(child);
            }
        }
    }

    /// Finds a member of `container` by full name.
    pub fn find_member(&self, container: HostDeclId, name: &DeclName) -> Option<HostDeclId> {
        self.decl(container).kind.members().iter().copied().find(|member| &self.decl(*member).name == name)
    }

    // --- Conformances ---

    pub fn add_conformance(&mut self, conforming: HostDeclId, protocol: HostDeclId) -> ConformanceId {
        let id = ConformanceId(self.conformances.len() as u32);
        self.conformances.push(ProtocolConformance {
            conforming,
            protocol,
            state: ConformanceState::Incomplete,
            missing_witnesses: Vec::new(),
        });
        id
    }

    pub fn conformance(&self, id: ConformanceId) -> &ProtocolConformance {
        &self.conformances[id.0 as usize]
    }

    pub fn conformance_mut(&mut self, id: ConformanceId) -> &mut ProtocolConformance {
        &mut self.conformances[id.0 as usize]
    }

    pub fn conformances_of(&self, conforming: HostDeclId) -> impl Iterator<Item = &ProtocolConformance> + '_ {
        self.conformances.iter().filter(move |conformance| conformance.conforming == conforming)
    }

    // --- External declarations and generations ---

    /// Hands a finished imported declaration to the host.
    pub fn register_external_decl(&mut self, decl: HostDeclId) {
        self.external_decls.push(decl);
    }

    pub fn external_decls(&self) -> &[HostDeclId] {
        &self.external_decls
    }

    /// Invalidates host-side lookup caches when new modules become visible.
    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // --- Printing ---

    /// Renders a type the way the host would spell it.
    pub fn display_type(&self, ty: &HostType) -> String {
        match ty {
            HostType::Named { name, args, .. } => match (name.as_str(), args.as_slice()) {
                ("Array", [element]) => format!("[{}]", self.display_type(element)),
                ("Dictionary", [key, value]) => {
                    format!("[{}: {}]", self.display_type(key), self.display_type(value))
                }
                (_, []) => name.clone(),
                _ => {
                    let args: Vec<String> = args.iter().map(|arg| self.display_type(arg)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            },
            HostType::Nominal(decl) | HostType::Alias { decl, .. } => self.decl(*decl).name.base().to_string(),
            HostType::Optional { kind, wrapped } => {
                let inner = self.display_type(wrapped);
                let inner = if matches!(**wrapped, HostType::Function { .. }) { format!("({})", inner) } else { inner };
                match kind {
                    OptionalKind::ImplicitlyUnwrapped => format!("{}!", inner),
                    _ => format!("{}?", inner),
                }
            }
            HostType::Tuple(elements) if elements.is_empty() => "Void".to_string(),
            HostType::Tuple(elements) => {
                let elements: Vec<String> = elements.iter().map(|element| self.display_type(element)).collect();
                format!("({})", elements.join(", "))
            }
            HostType::Function { params, result, convention } => {
                let params: Vec<String> = params.iter().map(|param| self.display_type(param)).collect();
                let prefix = match convention {
                    FunctionConvention::Native => "",
                    FunctionConvention::C => "@convention(c) ",
                    FunctionConvention::Block => "@convention(block) ",
                };
                format!("{}({}) -> {}", prefix, params.join(", "), self.display_type(result))
            }
            HostType::ProtocolComposition(protocols) if protocols.is_empty() => "AnyObject".to_string(),
            HostType::ProtocolComposition(protocols) => {
                let names: Vec<&str> = protocols.iter().map(|proto| self.decl(*proto).name.base()).collect();
                format!("protocol<{}>", names.join(", "))
            }
            HostType::DynamicSelf => "Self".to_string(),
        }
    }
}
