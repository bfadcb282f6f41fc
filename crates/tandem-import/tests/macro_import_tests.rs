use tandem_foreign::{ForeignContext, ForeignModuleId, ForeignType, MacroId, MacroToken};
use tandem_host::{ConstantValue, HostDeclKind};
use tandem_import::{ImportSession, ImporterOptions};

fn int(text: &str) -> MacroToken {
    MacroToken::IntLiteral(text.to_string())
}

fn ident(text: &str) -> MacroToken {
    MacroToken::Identifier(text.to_string())
}

/// The host type and value of an imported macro.
fn constant(session: &mut ImportSession<'_>, id: MacroId) -> Option<(String, ConstantValue)> {
    let imported = session.import_macro(id)?;
    let host = session.host();
    match &host.decl(imported).kind {
        HostDeclKind::Constant { ty, value } => Some((host.display_type(ty), value.clone())),
        other => panic!("macro imported as {:?}", other),
    }
}

fn module_with(foreign: &mut ForeignContext) -> ForeignModuleId {
    let module = foreign.add_module("Config");
    let color = foreign.add_enum(module, "Color", ForeignType::int(), &[("kRed", 0), ("kGreen", 1)]);
    foreign.attrs_mut(color).enum_macro = Some("NS_ENUM".to_string());
    module
}

#[test]
fn test_literal_macros() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut foreign = ForeignContext::new();
    let module = module_with(&mut foreign);
    let answer = foreign.add_macro(module, "ANSWER", vec![int("42")]);
    let negative = foreign.add_macro(
        module,
        "NEGATIVE",
        vec![MacroToken::Punct('('), MacroToken::Punct('-'), int("1"), MacroToken::Punct(')')],
    );
    let unsigned_long = foreign.add_macro(module, "BUFFER_SIZE", vec![int("10UL")]);
    let wide = foreign.add_macro(module, "WIDE", vec![int("0xFFFFFFFFFF")]);
    let name = foreign.add_macro(module, "NAME", vec![MacroToken::StringLiteral("tandem".to_string())]);
    let ratio = foreign.add_macro(module, "RATIO", vec![MacroToken::FloatLiteral("0.5f".to_string())]);
    let scale = foreign.add_macro(module, "SCALE", vec![MacroToken::FloatLiteral("2.5".to_string())]);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    session.add_module(module);

    assert_eq!(constant(&mut session, answer), Some(("Int32".to_string(), ConstantValue::Int(42))));
    assert_eq!(constant(&mut session, negative), Some(("Int32".to_string(), ConstantValue::Int(-1))));
    assert_eq!(constant(&mut session, unsigned_long), Some(("UInt".to_string(), ConstantValue::UInt(10))));
    assert_eq!(constant(&mut session, wide), Some(("Int64".to_string(), ConstantValue::Int(0xFF_FFFF_FFFF))));
    assert_eq!(
        constant(&mut session, name),
        Some(("String".to_string(), ConstantValue::String("tandem".to_string())))
    );
    assert_eq!(constant(&mut session, ratio), Some(("Float".to_string(), ConstantValue::Float(0.5))));
    assert_eq!(constant(&mut session, scale), Some(("Double".to_string(), ConstantValue::Float(2.5))));

    // Imported macros are module-level declarations handed to the host.
    let host_answer = session.import_macro(answer).expect("cached");
    assert_eq!(session.host().decl(host_answer).parent, None);
    assert!(session.host().external_decls().contains(&host_answer));
}

#[test]
fn test_macros_naming_other_constants() {
    let mut foreign = ForeignContext::new();
    let module = module_with(&mut foreign);
    foreign.add_macro(module, "ANSWER", vec![int("42")]);
    let alias = foreign.add_macro(module, "ALIAS", vec![ident("ANSWER")]);
    let negated = foreign.add_macro(module, "NEGATED", vec![MacroToken::Punct('-'), ident("ANSWER")]);
    let green = foreign.add_macro(module, "DEFAULT_COLOR", vec![ident("kGreen")]);
    let recursive = foreign.add_macro(module, "RECURSIVE", vec![ident("RECURSIVE")]);
    let unknown = foreign.add_macro(module, "UNKNOWN", vec![ident("nowhere")]);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    session.add_module(module);

    assert_eq!(constant(&mut session, alias), Some(("Int32".to_string(), ConstantValue::Int(42))));
    assert_eq!(constant(&mut session, negated), Some(("Int32".to_string(), ConstantValue::Int(-42))));
    assert_eq!(constant(&mut session, green), Some(("Int32".to_string(), ConstantValue::Int(1))));
    assert_eq!(constant(&mut session, recursive), None);
    assert_eq!(constant(&mut session, unknown), None);
}

#[test]
fn test_macros_without_a_constant_value() {
    let mut foreign = ForeignContext::new();
    let module = module_with(&mut foreign);
    let function_like = foreign.add_function_macro(module, "MAX", vec![ident("a")]);
    let reserved = foreign.add_macro(module, "__TANDEM_INTERNAL", vec![int("1")]);
    let expression = foreign.add_macro(module, "SUM", vec![int("1"), MacroToken::Punct('+'), int("2")]);
    let negative_unsigned = foreign.add_macro(module, "BAD_MASK", vec![MacroToken::Punct('-'), int("1u")]);
    let negative_string =
        foreign.add_macro(module, "BAD_NAME", vec![MacroToken::Punct('-'), MacroToken::StringLiteral("x".to_string())]);
    let empty = foreign.add_macro(module, "EMPTY", Vec::new());
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    session.add_module(module);

    for id in [function_like, reserved, expression, negative_unsigned, negative_string, empty] {
        assert_eq!(session.import_macro(id), None, "`{}` should not import", foreign.macro_info(id).name);
    }
}
