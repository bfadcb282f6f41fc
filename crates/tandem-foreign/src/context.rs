//! The foreign declaration store and its builder API.

use fxhash::FxHashMap;

use crate::attrs::ForeignAttrs;
use crate::decl::{
    ForeignDecl, ForeignDeclId, ForeignDeclKind, ForeignModuleId, ForeignParam, MacroId, Selector,
};
use crate::ty::ForeignType;

/// One token of a macro body.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroToken {
    /// Integer literal spelling, including any suffix (`42`, `0x10u`, `7LL`).
    IntLiteral(String),
    /// Floating literal spelling (`1.5`, `2.0f`).
    FloatLiteral(String),
    StringLiteral(String),
    Identifier(String),
    Punct(char),
}

/// A preprocessor macro definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroInfo {
    pub name: String,
    pub module: ForeignModuleId,
    pub is_function_like: bool,
    pub tokens: Vec<MacroToken>,
}

/// A foreign module: the declarations and macros one header set exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignModule {
    pub name: String,
    /// Top-level declarations in declaration order.
    pub decls: Vec<ForeignDeclId>,
    pub macros: Vec<MacroId>,
}

/// Owner of every foreign declaration, module and macro.
///
/// Identities handed out by this context stay valid for its whole lifetime;
/// nothing is ever removed.
#[derive(Debug, Default)]
pub struct ForeignContext {
    decls: Vec<ForeignDecl>,
    modules: Vec<ForeignModule>,
    macros: Vec<MacroInfo>,
    redecls: FxHashMap<ForeignDeclId, Vec<ForeignDeclId>>,
}

impl ForeignContext {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    pub fn decl(&self, id: ForeignDeclId) -> &ForeignDecl {
        &self.decls[id.0 as usize]
    }

    pub fn canonical(&self, id: ForeignDeclId) -> ForeignDeclId {
        self.decl(id).canonical
    }

    /// Returns the redeclaration of a record or interface that carries its
    /// definition, or `None` if no definition has been seen.
    pub fn definition_of(&self, id: ForeignDeclId) -> Option<ForeignDeclId> {
        let canonical = self.canonical(id);
        let candidates = self.redecls.get(&canonical).map(Vec::as_slice).unwrap_or(&[]);
        std::iter::once(&canonical)
            .chain(candidates.iter())
            .copied()
            .find(|candidate| match &self.decl(*candidate).kind {
                ForeignDeclKind::Record { is_complete, .. }
                | ForeignDeclKind::ObjCInterface { is_complete, .. } => *is_complete,
                _ => true,
            })
    }

    pub fn module(&self, id: ForeignModuleId) -> &ForeignModule {
        &self.modules[id.0 as usize]
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ForeignModuleId> + '_ {
        (0..self.modules.len()).map(|index| ForeignModuleId(index as u32))
    }

    pub fn module_named(&self, name: &str) -> Option<ForeignModuleId> {
        self.modules
            .iter()
            .position(|module| module.name == name)
            .map(|index| ForeignModuleId(index as u32))
    }

    pub fn macro_info(&self, id: MacroId) -> &MacroInfo {
        &self.macros[id.0 as usize]
    }

    /// Name of a declaration's canonical form.
    pub fn name_of(&self, id: ForeignDeclId) -> &str {
        &self.decl(id).name
    }

    /// Walks up the context chain to the nearest Objective-C container.
    pub fn enclosing_container(&self, id: ForeignDeclId) -> Option<ForeignDeclId> {
        let mut current = self.decl(id).context;
        while let Some(ctx) = current {
            if self.decl(ctx).is_objc_container() {
                return Some(ctx);
            }
            current = self.decl(ctx).context;
        }
        None
    }

    /// The interface a container augments: the interface itself, or the
    /// class a category extends.
    pub fn container_class(&self, container: ForeignDeclId) -> Option<ForeignDeclId> {
        match &self.decl(container).kind {
            ForeignDeclKind::ObjCInterface { .. } => Some(container),
            ForeignDeclKind::ObjCCategory { class, .. } => Some(*class),
            _ => None,
        }
    }

    // --- Builder ---

    pub fn add_module(&mut self, name: &str) -> ForeignModuleId {
        let id = ForeignModuleId(self.modules.len() as u32);
        self.modules.push(ForeignModule { name: name.to_string(), decls: Vec::new(), macros: Vec::new() });
        id
    }

    /// Adds a declaration. Declarations without a context become top-level
    /// declarations of `module`; the others are appended to their context's
    /// member list.
    pub fn add_decl(
        &mut self,
        module: ForeignModuleId,
        context: Option<ForeignDeclId>,
        name: &str,
        kind: ForeignDeclKind,
    ) -> ForeignDeclId {
        let id = ForeignDeclId(self.decls.len() as u32);
        self.decls.push(ForeignDecl {
            name: name.to_string(),
            kind,
            context,
            module,
            attrs: ForeignAttrs::default(),
            canonical: id,
        });
        match context {
            Some(parent) => self.push_member(parent, id),
            None => self.modules[module.0 as usize].decls.push(id),
        }
        id
    }

    /// Adds a redeclaration of `of`, e.g. the definition following a forward
    /// declaration.
    pub fn redeclare(&mut self, of: ForeignDeclId, kind: ForeignDeclKind) -> ForeignDeclId {
        let original = self.decl(of).clone();
        let canonical = original.canonical;
        let id = ForeignDeclId(self.decls.len() as u32);
        self.decls.push(ForeignDecl { kind, ..original });
        self.redecls.entry(canonical).or_default().push(id);
        id
    }

    pub fn attrs_mut(&mut self, id: ForeignDeclId) -> &mut ForeignAttrs {
        &mut self.decls[id.0 as usize].attrs
    }

    fn push_member(&mut self, parent: ForeignDeclId, child: ForeignDeclId) {
        match &mut self.decls[parent.0 as usize].kind {
            ForeignDeclKind::Record { fields, .. } => fields.push(child),
            ForeignDeclKind::Enum { constants, .. } => constants.push(child),
            ForeignDeclKind::ObjCInterface { members, .. }
            | ForeignDeclKind::ObjCProtocol { members, .. }
            | ForeignDeclKind::ObjCCategory { members, .. } => members.push(child),
            _ => {}
        }
    }

    pub fn add_record(&mut self, module: ForeignModuleId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::Record { fields: Vec::new(), is_union: false, is_complete: true };
        self.add_decl(module, None, name, kind)
    }

    pub fn add_union(&mut self, module: ForeignModuleId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::Record { fields: Vec::new(), is_union: true, is_complete: true };
        self.add_decl(module, None, name, kind)
    }

    /// `struct name;` with no definition.
    pub fn add_forward_record(&mut self, module: ForeignModuleId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::Record { fields: Vec::new(), is_union: false, is_complete: false };
        self.add_decl(module, None, name, kind)
    }

    pub fn add_field(&mut self, record: ForeignDeclId, name: &str, ty: ForeignType) -> ForeignDeclId {
        let module = self.decl(record).module;
        self.add_decl(module, Some(record), name, ForeignDeclKind::Field { ty, bit_width: None })
    }

    pub fn add_bit_field(&mut self, record: ForeignDeclId, name: &str, ty: ForeignType, width: u32) -> ForeignDeclId {
        let module = self.decl(record).module;
        self.add_decl(module, Some(record), name, ForeignDeclKind::Field { ty, bit_width: Some(width) })
    }

    /// Adds an enum together with its constants.
    pub fn add_enum(
        &mut self,
        module: ForeignModuleId,
        name: &str,
        integer_type: ForeignType,
        constants: &[(&str, i64)],
    ) -> ForeignDeclId {
        let kind = ForeignDeclKind::Enum { integer_type, constants: Vec::new() };
        let id = self.add_decl(module, None, name, kind);
        for (constant, value) in constants {
            self.add_decl(module, Some(id), constant, ForeignDeclKind::EnumConstant { value: *value });
        }
        id
    }

    pub fn add_typedef(&mut self, module: ForeignModuleId, name: &str, underlying: ForeignType) -> ForeignDeclId {
        self.add_decl(module, None, name, ForeignDeclKind::Typedef { underlying })
    }

    pub fn add_function(
        &mut self,
        module: ForeignModuleId,
        name: &str,
        params: Vec<ForeignParam>,
        result: ForeignType,
    ) -> ForeignDeclId {
        let kind = ForeignDeclKind::Function { params, result, is_variadic: false };
        self.add_decl(module, None, name, kind)
    }

    pub fn add_variable(&mut self, module: ForeignModuleId, name: &str, ty: ForeignType, is_const: bool) -> ForeignDeclId {
        self.add_decl(module, None, name, ForeignDeclKind::Variable { ty, is_const })
    }

    pub fn add_class(&mut self, module: ForeignModuleId, name: &str, superclass: Option<ForeignDeclId>) -> ForeignDeclId {
        let kind = ForeignDeclKind::ObjCInterface {
            superclass,
            protocols: Vec::new(),
            members: Vec::new(),
            is_complete: true,
        };
        self.add_decl(module, None, name, kind)
    }

    /// `@class name;`
    pub fn add_forward_class(&mut self, module: ForeignModuleId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::ObjCInterface {
            superclass: None,
            protocols: Vec::new(),
            members: Vec::new(),
            is_complete: false,
        };
        self.add_decl(module, None, name, kind)
    }

    pub fn add_protocol(&mut self, module: ForeignModuleId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::ObjCProtocol { protocols: Vec::new(), members: Vec::new() };
        self.add_decl(module, None, name, kind)
    }

    pub fn add_category(&mut self, module: ForeignModuleId, class: ForeignDeclId, name: &str) -> ForeignDeclId {
        let kind = ForeignDeclKind::ObjCCategory { class, protocols: Vec::new(), members: Vec::new() };
        self.add_decl(module, None, name, kind)
    }

    /// Records that `container` adopts `protocol`.
    pub fn adopt_protocol(&mut self, container: ForeignDeclId, protocol: ForeignDeclId) {
        match &mut self.decls[container.0 as usize].kind {
            ForeignDeclKind::ObjCInterface { protocols, .. }
            | ForeignDeclKind::ObjCProtocol { protocols, .. }
            | ForeignDeclKind::ObjCCategory { protocols, .. } => protocols.push(protocol),
            _ => {}
        }
    }

    /// Adds a method to an Objective-C container. `selector` uses the usual
    /// spelling (`"insertObject:atIndex:"`).
    pub fn add_method(
        &mut self,
        container: ForeignDeclId,
        selector: &str,
        params: Vec<ForeignParam>,
        result: ForeignType,
        is_instance: bool,
    ) -> ForeignDeclId {
        let module = self.decl(container).module;
        let selector = Selector::parse(selector);
        let name = selector.to_string();
        let kind = ForeignDeclKind::ObjCMethod { selector, params, result, is_instance, is_variadic: false };
        self.add_decl(module, Some(container), &name, kind)
    }

    pub fn add_property(&mut self, container: ForeignDeclId, name: &str, ty: ForeignType, is_readonly: bool) -> ForeignDeclId {
        let module = self.decl(container).module;
        let kind = ForeignDeclKind::ObjCProperty { ty, is_readonly, is_class: false };
        self.add_decl(module, Some(container), name, kind)
    }

    /// Marks a function or method as variadic.
    pub fn set_variadic(&mut self, id: ForeignDeclId) {
        match &mut self.decls[id.0 as usize].kind {
            ForeignDeclKind::Function { is_variadic, .. } | ForeignDeclKind::ObjCMethod { is_variadic, .. } => {
                *is_variadic = true
            }
            _ => {}
        }
    }

    pub fn add_macro(&mut self, module: ForeignModuleId, name: &str, tokens: Vec<MacroToken>) -> MacroId {
        self.push_macro(MacroInfo { name: name.to_string(), module, is_function_like: false, tokens })
    }

    pub fn add_function_macro(&mut self, module: ForeignModuleId, name: &str, tokens: Vec<MacroToken>) -> MacroId {
        self.push_macro(MacroInfo { name: name.to_string(), module, is_function_like: true, tokens })
    }

    fn push_macro(&mut self, info: MacroInfo) -> MacroId {
        let id = MacroId(self.macros.len() as u32);
        self.modules[info.module.0 as usize].macros.push(id);
        self.macros.push(info);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::BuiltinType;

    #[test]
    fn definition_follows_forward_declaration() {
        let mut ctx = ForeignContext::new();
        let module = ctx.add_module("Shapes");
        let forward = ctx.add_forward_record(module, "Point");
        assert_eq!(ctx.definition_of(forward), None);

        let definition = ctx.redeclare(
            forward,
            ForeignDeclKind::Record { fields: Vec::new(), is_union: false, is_complete: true },
        );
        assert_eq!(ctx.canonical(definition), forward);
        assert_eq!(ctx.definition_of(forward), Some(definition));
        // Redeclarations are not new top-level entries.
        assert_eq!(ctx.module(module).decls, vec![forward]);
    }

    #[test]
    fn enum_constants_are_members_of_their_enum() {
        let mut ctx = ForeignContext::new();
        let module = ctx.add_module("Colors");
        let color = ctx.add_enum(module, "Color", ForeignType::Builtin(BuiltinType::Int), &[("kRed", 0), ("kGreen", 1)]);
        let members = ctx.decl(color).members().to_vec();
        assert_eq!(members.len(), 2);
        assert_eq!(ctx.decl(members[1]).name, "kGreen");
        assert_eq!(ctx.decl(members[1]).context, Some(color));
    }
}
