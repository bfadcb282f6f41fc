use expect_test::expect;
use tandem_foreign::{BuiltinType, ForeignContext, ForeignParam, ForeignType, Nullability};
use tandem_host::{
    ConformanceState, ConstantValue, DeclName, ErrorConventionKind, ForeignErrorConvention, HostDeclId, HostDeclKind,
    HostType, InitKind, OptionalKind,
};
use tandem_import::{ImportSession, ImporterOptions};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn member(session: &ImportSession<'_>, container: HostDeclId, name: &str) -> HostDeclId {
    let name = DeclName::parse(name).expect("well-formed name");
    session
        .host()
        .find_member(container, &name)
        .unwrap_or_else(|| panic!("`{}` has no member `{}`", session.host().decl(container).name, name))
}

fn member_names(session: &ImportSession<'_>, container: HostDeclId) -> Vec<String> {
    let host = session.host();
    host.decl(container).kind.members().iter().map(|member| host.decl(*member).name.to_string()).collect()
}

fn type_of(session: &ImportSession<'_>, decl: HostDeclId) -> String {
    let host = session.host();
    match &host.decl(decl).kind {
        HostDeclKind::Var { ty, .. } | HostDeclKind::Property { ty, .. } | HostDeclKind::Constant { ty, .. } => {
            host.display_type(ty)
        }
        HostDeclKind::Func { params, result, .. } => {
            let params: Vec<String> = params.iter().map(|param| host.display_type(&param.ty)).collect();
            format!("({}) -> {}", params.join(", "), host.display_type(result))
        }
        other => panic!("no type on {:?}", other),
    }
}

#[test]
fn test_self_referential_record() {
    init_logging();
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Lists");
    let node = foreign.add_record(module, "Node");
    let value = foreign.add_field(node, "value", ForeignType::int());
    foreign.add_field(node, "next", ForeignType::pointer_to(ForeignType::Record(node)));
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let host_node = session.import_decl(node).expect("record imports");
    assert!(matches!(session.host().decl(host_node).kind, HostDeclKind::Struct { raw_type: None, .. }));
    assert_eq!(member_names(&session, host_node), ["value", "next"]);
    expect!["UnsafeMutablePointer<Node>!"].assert_eq(&type_of(&session, member(&session, host_node, "next")));

    // Fields were imported with their record.
    let host_value = session.import_decl(value).expect("field imports");
    assert_eq!(session.host().decl(host_value).parent, Some(host_node));
    expect!["Int32"].assert_eq(&type_of(&session, host_value));
}

#[test]
fn test_mutually_referential_records() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Graph");
    let vertex = foreign.add_record(module, "Vertex");
    let edge = foreign.add_record(module, "Edge");
    foreign.add_field(vertex, "first", ForeignType::pointer_to(ForeignType::Record(edge)));
    foreign.add_field(edge, "target", ForeignType::pointer_to(ForeignType::Record(vertex)));
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let host_vertex = session.import_decl(vertex).expect("vertex imports");
    let host_edge = session.import_decl_cached(edge).expect("edge imported along the way");
    assert_eq!(session.import_decl(edge), Some(host_edge));

    // Each field names the other record's final declaration.
    let target = member(&session, host_edge, "target");
    let HostDeclKind::Var { ty, .. } = &session.host().decl(target).kind else {
        panic!("field is not a variable");
    };
    let (pointer, _) = ty.unwrap_optional();
    assert!(matches!(pointer, HostType::Named { args, .. } if args == &[HostType::Nominal(host_vertex)]));
    expect!["UnsafeMutablePointer<Edge>!"].assert_eq(&type_of(&session, member(&session, host_vertex, "first")));
    assert!(matches!(session.host().decl(host_vertex).kind, HostDeclKind::Struct { .. }));
    assert_eq!(session.importing_depth(), 0);
}

/// A record whose field goes through a pointer typedef naming the record.
fn linked_list() -> (ForeignContext, tandem_foreign::ForeignDeclId, tandem_foreign::ForeignDeclId) {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Lists");
    let node = foreign.add_record(module, "Node");
    let node_ptr = foreign.add_typedef(module, "NodePtr", ForeignType::pointer_to(ForeignType::Record(node)));
    foreign.add_field(node, "next", ForeignType::Typedef(node_ptr));
    (foreign, node, node_ptr)
}

fn alias_underlying(session: &ImportSession<'_>, alias: HostDeclId) -> String {
    let HostDeclKind::TypeAlias { underlying } = &session.host().decl(alias).kind else {
        panic!("expected a type alias");
    };
    session.host().display_type(underlying)
}

#[test]
fn test_typedef_cycle_is_order_independent() {
    init_logging();
    let (foreign, node, node_ptr) = linked_list();

    let mut record_first = ImportSession::new(&foreign, ImporterOptions::default());
    let host_node = record_first.import_decl(node).expect("record imports");
    let host_alias = record_first.import_decl(node_ptr).expect("typedef imports");
    expect!["NodePtr!"].assert_eq(&type_of(&record_first, member(&record_first, host_node, "next")));
    expect!["UnsafeMutablePointer<Node>"].assert_eq(&alias_underlying(&record_first, host_alias));

    let mut typedef_first = ImportSession::new(&foreign, ImporterOptions::default());
    let host_alias = typedef_first.import_decl(node_ptr).expect("typedef imports");
    let host_node = typedef_first.import_decl(node).expect("record imports");
    let next = member(&typedef_first, host_node, "next");
    expect!["NodePtr!"].assert_eq(&type_of(&typedef_first, next));
    expect!["UnsafeMutablePointer<Node>"].assert_eq(&alias_underlying(&typedef_first, host_alias));

    // The field keeps the alias and sees the same underlying type the alias
    // ended up with, even though the alias was unfinished at the time.
    let HostDeclKind::Var { ty, .. } = &typedef_first.host().decl(next).kind else {
        panic!("field is not a variable");
    };
    let (HostType::Alias { decl, underlying }, OptionalKind::ImplicitlyUnwrapped) = ty.unwrap_optional() else {
        panic!("field should be an implicitly unwrapped alias, got {:?}", ty);
    };
    assert_eq!(*decl, host_alias);
    let HostDeclKind::TypeAlias { underlying: finished } = &typedef_first.host().decl(host_alias).kind else {
        panic!("expected a type alias");
    };
    assert_eq!(**underlying, *finished);
}

#[test]
fn test_records_that_cannot_import() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Hardware");
    let flags = foreign.add_record(module, "Flags");
    let ready = foreign.add_bit_field(flags, "ready", ForeignType::Builtin(BuiltinType::UInt), 1);
    let opaque = foreign.add_forward_record(module, "Opaque");
    let value = foreign.add_union(module, "Value");
    foreign.add_field(value, "integer", ForeignType::int());
    foreign.add_field(value, "real", ForeignType::Builtin(BuiltinType::Double));
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    // Failures are cached like successes.
    assert_eq!(session.import_decl(flags), None);
    assert_eq!(session.import_decl(flags), None);
    assert_eq!(session.import_decl(ready), None);
    assert_eq!(session.import_decl(opaque), None);

    let host_value = session.import_decl(value).expect("unions import as structs");
    assert_eq!(member_names(&session, host_value), ["integer", "real"]);
}

#[test]
fn test_enum_kinds() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Styles");
    let color = foreign.add_enum(
        module,
        "Color",
        ForeignType::int(),
        &[("kRed", 0), ("kGreen", 1), ("kBlue", 2), ("kDefault", 0)],
    );
    foreign.attrs_mut(color).enum_macro = Some("NS_ENUM".to_string());
    let style = foreign.add_enum(
        module,
        "Style",
        ForeignType::Builtin(BuiltinType::UInt),
        &[("StyleNone", 0), ("StyleBold", 1), ("StyleItalic", 2)],
    );
    foreign.attrs_mut(style).enum_macro = Some("NS_OPTIONS".to_string());
    let mode = foreign.add_enum(module, "Mode", ForeignType::int(), &[("ModeA", 0), ("ModeB", 1), ("ModeC", 2)]);
    let limits = foreign.add_enum(module, "", ForeignType::int(), &[("kMaxItems", 10)]);
    let style_none = foreign.decl(style).members()[0];
    let mode_b = foreign.decl(mode).members()[1];
    let max_items = foreign.decl(limits).members()[0];
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    // A closed enum; the repeated value becomes an alias of the first case.
    let host_color = session.import_decl(color).expect("enum");
    assert_eq!(member_names(&session, host_color), ["Red", "Green", "Blue", "Default"]);
    let red = member(&session, host_color, "Red");
    let default = member(&session, host_color, "Default");
    assert_eq!(session.host().decl(default).kind, HostDeclKind::CaseAlias { original: red });
    assert!(session.host().decl(default).is_static);

    // A flag set; the empty value is not a member.
    let host_style = session.import_decl(style).expect("option set");
    let HostDeclKind::OptionSet { raw_type, .. } = &session.host().decl(host_style).kind else {
        panic!("expected an option set");
    };
    expect!["UInt32"].assert_eq(&session.host().display_type(raw_type));
    assert_eq!(member_names(&session, host_style), ["Bold", "Italic"]);
    let bold = member(&session, host_style, "Bold");
    assert_eq!(
        session.host().decl(bold).kind,
        HostDeclKind::Constant { ty: HostType::Nominal(host_style), value: ConstantValue::UInt(1) }
    );
    assert_eq!(session.import_decl(style_none), None);

    // An unclassified enum is a raw-value struct with module constants.
    let host_mode = session.import_decl(mode).expect("wrapper struct");
    assert!(matches!(session.host().decl(host_mode).kind, HostDeclKind::Struct { raw_type: Some(_), .. }));
    let host_mode_b = session.import_decl(mode_b).expect("module constant");
    assert_eq!(session.host().decl(host_mode_b).name.to_string(), "ModeB");
    assert_eq!(session.host().decl(host_mode_b).parent, None);
    expect!["Mode"].assert_eq(&type_of(&session, host_mode_b));

    // An anonymous enum leaves only its constants behind.
    assert_eq!(session.import_decl(limits), None);
    let host_max = session.import_decl(max_items).expect("constant");
    assert_eq!(
        session.host().decl(host_max).kind,
        HostDeclKind::Constant { ty: session.host().named_type("Int32", Vec::new()).unwrap(), value: ConstantValue::Int(10) }
    );
    assert!(session.host().external_decls().contains(&host_max));
}

#[test]
fn test_functions_and_variables() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Math");
    let area = foreign.add_function(
        module,
        "area",
        vec![ForeignParam::new("radius", ForeignType::Builtin(BuiltinType::Double))],
        ForeignType::Builtin(BuiltinType::Double),
    );
    let printf = foreign.add_function(
        module,
        "printf",
        vec![ForeignParam::new("format", ForeignType::const_pointer_to(ForeignType::Builtin(BuiltinType::Char)))],
        ForeignType::int(),
    );
    foreign.set_variadic(printf);
    let legacy = foreign.add_function(module, "legacy_area", Vec::new(), ForeignType::void());
    foreign.attrs_mut(legacy).unavailable = Some("use area instead".to_string());
    let version = foreign.add_variable(module, "kVersion", ForeignType::Builtin(BuiltinType::Double), true);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let host_area = session.import_decl(area).expect("function");
    assert_eq!(session.host().decl(host_area).name.to_string(), "area(_:)");
    expect!["(Double) -> Double"].assert_eq(&type_of(&session, host_area));

    assert_eq!(session.import_decl(printf), None);

    let host_legacy = session.import_decl(legacy).expect("unavailable functions still import");
    assert_eq!(session.host().decl(host_legacy).unavailable.as_deref(), Some("use area instead"));

    let host_version = session.import_decl(version).expect("variable");
    assert!(matches!(session.host().decl(host_version).kind, HostDeclKind::Var { is_let: true, .. }));
    expect!["Double"].assert_eq(&type_of(&session, host_version));
}

#[test]
fn test_protocol_members_are_mirrored() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Kit");
    let string = foreign.add_class(module, "NSString", None);
    let named = foreign.add_protocol(module, "Named");
    foreign.add_property(named, "name", ForeignType::object_pointer(string), true);
    let describable = foreign.add_protocol(module, "Describable");
    foreign.adopt_protocol(describable, named);
    foreign.add_method(describable, "describe", Vec::new(), ForeignType::void(), true);
    let widget = foreign.add_class(module, "Widget", None);
    foreign.adopt_protocol(widget, describable);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let host_widget = session.import_decl(widget).expect("class");
    assert_eq!(member_names(&session, host_widget), ["describe()", "name"]);
    expect!["String!"].assert_eq(&type_of(&session, member(&session, host_widget, "name")));

    // Both the adopted protocol and the one it inherits are declared, and
    // every conformance was completed once the import finished.
    let conformances: Vec<_> = session.host().conformances_of(host_widget).cloned().collect();
    assert_eq!(conformances.len(), 2);
    for conformance in &conformances {
        assert_eq!(conformance.state, ConformanceState::Complete);
        assert!(conformance.missing_witnesses.is_empty());
    }
}

#[test]
fn test_categories_extend_their_class() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Kit");
    let widget = foreign.add_class(module, "Widget", None);
    let resettable = foreign.add_protocol(module, "Resettable");
    foreign.add_method(resettable, "reset", Vec::new(), ForeignType::void(), true);
    let extras = foreign.add_category(module, widget, "Extras");
    foreign.add_method(extras, "refresh", Vec::new(), ForeignType::void(), true);
    foreign.adopt_protocol(extras, resettable);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    session.add_module(module);

    let extension = session.import_decl(extras).expect("extension");
    let host_widget = session.import_decl(widget).expect("class");
    assert!(matches!(
        &session.host().decl(extension).kind,
        HostDeclKind::Extension { extended, .. } if *extended == host_widget
    ));
    assert_eq!(session.host().decl(extension).name.to_string(), "Widget");
    assert_eq!(member_names(&session, extension), ["refresh()", "reset()"]);

    // The conformance belongs to the class; its witness is in the extension.
    let conformance = session.host().conformances_of(host_widget).next().cloned().expect("conformance");
    assert_eq!(conformance.state, ConformanceState::Complete);
    assert!(conformance.missing_witnesses.is_empty());
    assert_eq!(&*session.class_extensions(widget), &[extension]);
}

#[test]
fn test_subscripts_pair_their_accessors() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Collections");
    let cache = foreign.add_class(module, "Cache", None);
    let getter = foreign.add_method(
        cache,
        "objectForKeyedSubscript:",
        vec![ForeignParam::new("key", ForeignType::id())],
        ForeignType::id(),
        true,
    );
    let setter = foreign.add_method(
        cache,
        "setObject:forKeyedSubscript:",
        vec![ForeignParam::new("object", ForeignType::id()), ForeignParam::new("key", ForeignType::id())],
        ForeignType::void(),
        true,
    );
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let host_cache = session.import_decl(cache).expect("class");
    let host_getter = session.import_decl(getter).expect("getter");
    let host_setter = session.import_decl(setter).expect("setter");
    assert_eq!(session.host().decl(host_getter).name.to_string(), "objectForKeyedSubscript(_:)");
    assert_eq!(session.host().decl(host_setter).name.to_string(), "setObject(_:_:)");

    let subscript = session.subscript_for(host_getter, Some(host_setter)).expect("subscript");
    assert_eq!(session.host().decl(subscript).parent, Some(host_cache));
    let HostDeclKind::Subscript { index, element, .. } = &session.host().decl(subscript).kind else {
        panic!("expected a subscript");
    };
    expect!["AnyObject!"].assert_eq(&session.host().display_type(index));
    expect!["AnyObject!"].assert_eq(&session.host().display_type(element));
}

#[test]
fn test_initializers() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("People");
    let string = foreign.add_class(module, "NSString", None);
    let person = foreign.add_class(module, "Person", None);
    foreign.add_method(
        person,
        "initWithName:",
        vec![ForeignParam::new("name", ForeignType::object_pointer(string))],
        ForeignType::InstanceType,
        true,
    );
    foreign.add_method(
        person,
        "initWithCoder:",
        vec![ForeignParam::new("coder", ForeignType::id())],
        ForeignType::InstanceType.nullable(),
        true,
    );
    let factory = foreign.add_method(
        person,
        "personWithAge:",
        vec![ForeignParam::new("age", ForeignType::int())],
        ForeignType::InstanceType,
        false,
    );
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    let host_person = session.import_decl(person).expect("class");

    let by_name = member(&session, host_person, "init(name:)");
    assert!(matches!(
        session.host().decl(by_name).kind,
        HostDeclKind::Constructor { init_kind: InitKind::Designated, failability: OptionalKind::ImplicitlyUnwrapped, .. }
    ));
    let by_coder = member(&session, host_person, "init(coder:)");
    assert!(matches!(
        session.host().decl(by_coder).kind,
        HostDeclKind::Constructor { failability: OptionalKind::Optional, .. }
    ));

    // The factory method becomes an initializer and stays reachable under
    // its own name, marked unavailable.
    let by_age = session.constructor_for(factory, host_person).expect("factory initializer");
    assert_eq!(session.host().decl(by_age).name.to_string(), "init(age:)");
    assert!(matches!(
        session.host().decl(by_age).kind,
        HostDeclKind::Constructor { init_kind: InitKind::ConvenienceFactory, .. }
    ));
    let alternate = session.alternate_decl(by_age).expect("factory method");
    let alternate_decl = session.host().decl(alternate);
    assert_eq!(alternate_decl.name.to_string(), "personWithAge(_:)");
    assert!(alternate_decl.is_static);
    assert_eq!(alternate_decl.unavailable.as_deref(), Some("use the initializer `init(age:)`"));
    expect!["(Int32) -> Self!"].assert_eq(&type_of(&session, alternate));
}

#[test]
fn test_throwing_methods() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Documents");
    let error = foreign.add_class(module, "NSError", None);
    let url = foreign.add_class(module, "NSURL", None);
    let data = foreign.add_class(module, "NSData", None);
    let document = foreign.add_class(module, "Document", None);
    let error_param = ForeignParam::new("error", ForeignType::pointer_to(ForeignType::object_pointer(error)));
    foreign.add_method(
        document,
        "writeToURL:error:",
        vec![ForeignParam::new("url", ForeignType::object_pointer(url)), error_param.clone()],
        ForeignType::Builtin(BuiltinType::Bool),
        true,
    );
    foreign.add_method(document, "save:", vec![error_param.clone()], ForeignType::Builtin(BuiltinType::Bool), true);
    foreign.add_method(document, "contentsAndReturnError:", vec![error_param], ForeignType::object_pointer(data), true);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    let host_document = session.import_decl(document).expect("class");

    let write = member(&session, host_document, "writeToURL(_:)");
    expect!["(NSURL!) -> Void"].assert_eq(&type_of(&session, write));
    let HostDeclKind::Func { error, .. } = &session.host().decl(write).kind else {
        panic!("expected a method");
    };
    assert_eq!(
        *error,
        Some(ForeignErrorConvention {
            kind: ErrorConventionKind::ZeroResult,
            is_owned: false,
            param_index: 1,
            replaced_with_void: false,
        })
    );

    // The error slot that could not be dropped is typed `Void`.
    let save = member(&session, host_document, "save(_:)");
    expect!["(Void) -> Void"].assert_eq(&type_of(&session, save));

    // A nil-on-failure result is no longer optional.
    let contents = member(&session, host_document, "contents()");
    expect!["() -> NSData"].assert_eq(&type_of(&session, contents));
}

#[test]
fn test_out_of_line_nullability() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Kit");
    let string = foreign.add_class(module, "NSString", None);
    let label = foreign.add_class(module, "Label", None);
    let title = foreign.add_property(label, "title", ForeignType::object_pointer(string), false);
    foreign.attrs_mut(title).nullability = Some(Nullability::NonNull);
    foreign.add_property(label, "subtitle", ForeignType::object_pointer(string), false);
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());
    let host_label = session.import_decl(label).expect("class");

    expect!["String"].assert_eq(&type_of(&session, member(&session, host_label, "title")));
    expect!["String!"].assert_eq(&type_of(&session, member(&session, host_label, "subtitle")));
}

#[test]
fn test_forward_declared_classes() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Kit");
    let later = foreign.add_forward_class(module, "Later");

    let mut strict = ImportSession::new(&foreign, ImporterOptions::default());
    assert_eq!(strict.import_decl(later), None);

    let mut options = ImporterOptions::default();
    options.import_forward_declarations = true;
    let mut lenient = ImportSession::new(&foreign, options);
    let host_later = lenient.import_decl(later).expect("empty class");
    assert!(matches!(lenient.host().decl(host_later).kind, HostDeclKind::Class { superclass: None, .. }));
}
