//! Importing object-like macros as named constants.

use tandem_foreign::{ForeignDeclKind, MacroId, MacroToken};
use tandem_host::{ConstantValue, DeclName, HostDeclId, HostDeclKind, HostType, OptionalKind};

use crate::session::ImportSession;
use crate::types::ImportTypeKind;

/// Integer literal suffix, lowercased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntSuffix {
    None,
    U,
    L,
    UL,
    LL,
    ULL,
}

/// A parsed integer literal: its magnitude and suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IntLiteral {
    magnitude: u64,
    suffix: IntSuffix,
}

fn parse_int_literal(text: &str) -> Option<IntLiteral> {
    let lower = text.to_ascii_lowercase();
    let digits = lower.trim_end_matches(|c| c == 'u' || c == 'l');
    let suffix = match &lower[digits.len()..] {
        "" => IntSuffix::None,
        "u" => IntSuffix::U,
        "l" => IntSuffix::L,
        "ul" | "lu" => IntSuffix::UL,
        "ll" => IntSuffix::LL,
        "ull" | "llu" => IntSuffix::ULL,
        _ => return None,
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(binary) = digits.strip_prefix("0b") {
        u64::from_str_radix(binary, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(IntLiteral { magnitude, suffix })
}

/// The value a macro body evaluates to, with its host type name.
#[derive(Debug, Clone, PartialEq)]
struct MacroValue {
    ty: HostType,
    value: ConstantValue,
}

impl<'f> ImportSession<'f> {
    /// Imports an object-like macro whose body is a single literal, a
    /// reference to another such macro or a reference to an enum constant,
    /// optionally parenthesized or negated.
    ///
    /// The result is cached per macro, failures included.
    pub fn import_macro(&mut self, id: MacroId) -> Option<HostDeclId> {
        if let Some(cached) = self.imported_macros.get(&id) {
            return *cached;
        }
        if !self.macros_in_progress.insert(id) {
            log::trace!("macro `{}` refers to itself", self.foreign.macro_info(id).name);
            return None;
        }
        let imported = self.with_importing_entity(|session| session.build_macro(id));
        self.macros_in_progress.remove(&id);
        self.imported_macros.insert(id, imported);
        imported
    }

    fn build_macro(&mut self, id: MacroId) -> Option<HostDeclId> {
        let foreign = self.foreign;
        let info = foreign.macro_info(id);
        if info.is_function_like || info.name.starts_with("__") {
            return None;
        }

        let mut tokens = info.tokens.as_slice();
        while let [MacroToken::Punct('('), inner @ .., MacroToken::Punct(')')] = tokens {
            tokens = inner;
        }
        let (negate, tokens) = match tokens {
            [MacroToken::Punct('-'), rest @ ..] => (true, rest),
            _ => (false, tokens),
        };
        let [token] = tokens else {
            log::debug!("macro `{}` is not a single constant", info.name);
            return None;
        };

        let evaluated = match token {
            MacroToken::IntLiteral(text) => self.int_macro_value(text, negate),
            MacroToken::FloatLiteral(text) => self.float_macro_value(text, negate),
            MacroToken::StringLiteral(text) if !negate => self.std_macro_value("String", ConstantValue::String(text.clone())),
            MacroToken::Identifier(name) => self.referenced_macro_value(name, negate),
            _ => None,
        };
        let Some(MacroValue { ty, value }) = evaluated else {
            log::debug!("macro `{}` has no constant value", info.name);
            return None;
        };

        let module = self.host_module(info.module);
        let constant = self.host.create_decl(
            module,
            None,
            DeclName::simple(info.name.clone()),
            HostDeclKind::Constant { ty, value },
            None,
        );
        self.defer_external_registration(constant);
        Some(constant)
    }

    fn std_macro_value(&self, type_name: &str, value: ConstantValue) -> Option<MacroValue> {
        let ty = self.std_type(type_name, Vec::new()).ok()?;
        Some(MacroValue { ty, value })
    }

    fn int_macro_value(&self, text: &str, negate: bool) -> Option<MacroValue> {
        let literal = parse_int_literal(text)?;
        let unsigned = matches!(literal.suffix, IntSuffix::U | IntSuffix::UL | IntSuffix::ULL);
        if unsigned {
            if negate {
                return None;
            }
            let type_name = match literal.suffix {
                IntSuffix::U if literal.magnitude <= u64::from(u32::MAX) => "UInt32",
                IntSuffix::UL => "UInt",
                _ => "UInt64",
            };
            return self.std_macro_value(type_name, ConstantValue::UInt(literal.magnitude));
        }

        let signed = i64::try_from(literal.magnitude).ok()?;
        let value = if negate { -signed } else { signed };
        let type_name = match literal.suffix {
            IntSuffix::L => "Int",
            IntSuffix::LL => "Int64",
            _ if i32::try_from(value).is_ok() => "Int32",
            _ => "Int64",
        };
        self.std_macro_value(type_name, ConstantValue::Int(value))
    }

    fn float_macro_value(&self, text: &str, negate: bool) -> Option<MacroValue> {
        let (digits, type_name) = match text.strip_suffix(['f', 'F']) {
            Some(digits) => (digits, "Float"),
            None => (text.trim_end_matches(['l', 'L']), "Double"),
        };
        let parsed: f64 = digits.parse().ok()?;
        self.std_macro_value(type_name, ConstantValue::Float(if negate { -parsed } else { parsed }))
    }

    /// A macro naming another macro or an enum constant.
    fn referenced_macro_value(&mut self, name: &str, negate: bool) -> Option<MacroValue> {
        if let Some(other) = self.lookup_macro(name) {
            let constant = self.import_macro(other)?;
            let HostDeclKind::Constant { ty, value } = &self.host.decl(constant).kind else {
                return None;
            };
            return negate_value(value.clone(), negate).map(|value| MacroValue { ty: ty.clone(), value });
        }

        let foreign = self.foreign;
        let constant = self
            .lookup_value(name)
            .into_iter()
            .find(|decl| matches!(foreign.decl(*decl).kind, ForeignDeclKind::EnumConstant { .. }))?;
        let ForeignDeclKind::EnumConstant { value } = foreign.decl(constant).kind else {
            return None;
        };
        let owner = foreign.decl(constant).context?;
        let ForeignDeclKind::Enum { integer_type, .. } = &foreign.decl(owner).kind else {
            return None;
        };
        self.import_decl(constant)?;
        let ty = self.import_type(integer_type, ImportTypeKind::Enum, false, false, OptionalKind::None).ok()?;
        let value = negate_value(ConstantValue::Int(value), negate)?;
        Some(MacroValue { ty, value })
    }
}

fn negate_value(value: ConstantValue, negate: bool) -> Option<ConstantValue> {
    if !negate {
        return Some(value);
    }
    match value {
        ConstantValue::Int(value) => value.checked_neg().map(ConstantValue::Int),
        ConstantValue::Float(value) => Some(ConstantValue::Float(-value)),
        ConstantValue::UInt(_) | ConstantValue::String(_) => None,
    }
}
