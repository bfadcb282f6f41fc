use expect_test::expect;
use tandem_foreign::{BuiltinType, CallingConv, ForeignContext, ForeignModuleId, ForeignType, FunctionProto};
use tandem_host::OptionalKind;
use tandem_import::{
    ImportError, ImportSession, ImportTypeKind, ImporterOptions, MappedTypeNameKind, MAX_TUPLE_ELEMENTS,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Imports `ty` with the usual parameter settings and renders it.
fn render(session: &mut ImportSession<'_>, ty: &ForeignType, kind: ImportTypeKind) -> String {
    let imported = session
        .import_type(ty, kind, false, true, OptionalKind::ImplicitlyUnwrapped)
        .expect("type should import");
    session.host().display_type(&imported)
}

fn foundation() -> (ForeignContext, ForeignModuleId) {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Foundation");
    foreign.add_class(module, "NSString", None);
    foreign.add_class(module, "NSArray", None);
    foreign.add_class(module, "NSError", None);
    foreign.add_protocol(module, "NSCopying");
    foreign.add_typedef(module, "BOOL", ForeignType::Builtin(BuiltinType::SChar));
    foreign.add_typedef(module, "NSInteger", ForeignType::Builtin(BuiltinType::Long));
    foreign.add_typedef(module, "NSUInteger", ForeignType::Builtin(BuiltinType::ULong));
    (foreign, module)
}

fn find(foreign: &ForeignContext, module: ForeignModuleId, name: &str) -> tandem_foreign::ForeignDeclId {
    foreign
        .module(module)
        .decls
        .iter()
        .copied()
        .find(|decl| foreign.name_of(*decl) == name)
        .expect("declaration exists")
}

#[test]
fn test_integer_types_follow_the_target() {
    init_logging();
    let (foreign, _) = foundation();
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    expect!["Int32"].assert_eq(&render(&mut session, &ForeignType::int(), ImportTypeKind::Value));
    expect!["Int"].assert_eq(&render(&mut session, &ForeignType::Builtin(BuiltinType::Long), ImportTypeKind::Value));
    expect!["UInt8"].assert_eq(&render(&mut session, &ForeignType::Builtin(BuiltinType::UChar), ImportTypeKind::Value));
    expect!["Float80"].assert_eq(&render(&mut session, &ForeignType::Builtin(BuiltinType::LongDouble), ImportTypeKind::Value));

    // On an LLP64 target `long` is narrower than a pointer.
    let mut options = ImporterOptions::default();
    options.target.long_bits = 32;
    options.target.has_x87_float80 = false;
    let mut narrow = ImportSession::new(&foreign, options);
    expect!["Int32"].assert_eq(&render(&mut narrow, &ForeignType::Builtin(BuiltinType::Long), ImportTypeKind::Value));
    let long_double = narrow.import_type(
        &ForeignType::Builtin(BuiltinType::LongDouble),
        ImportTypeKind::Value,
        false,
        false,
        OptionalKind::None,
    );
    assert!(matches!(long_double, Err(ImportError::UnsupportedType { .. })));
}

#[test]
fn test_pointer_types() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("Pointers");
    let opaque = foreign.add_forward_record(module, "Opaque");
    foreign.add_class(module, "NSError", None);
    let error_class = find(&foreign, module, "NSError");
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let c_string = ForeignType::const_pointer_to(ForeignType::Builtin(BuiltinType::Char));
    expect!["UnsafePointer<Int8>!"].assert_eq(&render(&mut session, &c_string, ImportTypeKind::Parameter));

    let raw = ForeignType::pointer_to(ForeignType::void()).nullable();
    expect!["UnsafeMutablePointer<Void>?"].assert_eq(&render(&mut session, &raw, ImportTypeKind::Value));

    let handle = ForeignType::pointer_to(ForeignType::Record(opaque)).nonnull();
    expect!["OpaquePointer"].assert_eq(&render(&mut session, &handle, ImportTypeKind::Value));

    // `NSError **` in parameter position is an autoreleasing out-pointer.
    let out_error = ForeignType::pointer_to(ForeignType::object_pointer(error_class));
    expect!["AutoreleasingUnsafeMutablePointer<NSError?>!"]
        .assert_eq(&render(&mut session, &out_error, ImportTypeKind::Parameter));
}

#[test]
fn test_function_pointers_and_blocks() {
    let (foreign, module) = foundation();
    let ns_integer = find(&foreign, module, "NSInteger");
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let callback = ForeignType::pointer_to(ForeignType::Function(Box::new(FunctionProto::new(
        vec![ForeignType::int()],
        ForeignType::void(),
    ))))
    .nonnull();
    expect!["@convention(c) (Int32) -> Void"].assert_eq(&render(&mut session, &callback, ImportTypeKind::Parameter));

    let block = ForeignType::BlockPointer(Box::new(FunctionProto::new(
        vec![ForeignType::Typedef(ns_integer)],
        ForeignType::void(),
    )))
    .nullable();
    expect!["(@convention(block) (Int) -> Void)?"].assert_eq(&render(&mut session, &block, ImportTypeKind::Parameter));

    let mut stdcall = FunctionProto::new(Vec::new(), ForeignType::void());
    stdcall.calling_conv = CallingConv::StdCall;
    let result = session.import_type(
        &ForeignType::pointer_to(ForeignType::Function(Box::new(stdcall))),
        ImportTypeKind::Value,
        false,
        false,
        OptionalKind::None,
    );
    assert!(matches!(result, Err(ImportError::UnsupportedCallingConvention { .. })));
}

#[test]
fn test_bridging_depends_on_position() {
    let (foreign, module) = foundation();
    let string = find(&foreign, module, "NSString");
    let array = find(&foreign, module, "NSArray");
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let ns_string = ForeignType::object_pointer(string);
    expect!["String!"].assert_eq(&render(&mut session, &ns_string, ImportTypeKind::Parameter));
    expect!["NSString!"].assert_eq(&render(&mut session, &ns_string, ImportTypeKind::RecordField));

    let ns_array = ForeignType::object_pointer(array).nonnull();
    expect!["[AnyObject]"].assert_eq(&render(&mut session, &ns_array, ImportTypeKind::Parameter));
    let partial = session
        .import_type(&ns_array, ImportTypeKind::Parameter, false, false, OptionalKind::ImplicitlyUnwrapped)
        .unwrap();
    expect!["NSArray"].assert_eq(&session.host().display_type(&partial));
}

#[test]
fn test_mapped_typedefs() {
    let (foreign, module) = foundation();
    let boolean = find(&foreign, module, "BOOL");
    let unsigned = find(&foreign, module, "NSUInteger");
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    expect!["Bool"].assert_eq(&render(&mut session, &ForeignType::Typedef(boolean), ImportTypeKind::Parameter));
    expect!["ObjCBool"].assert_eq(&render(&mut session, &ForeignType::Typedef(boolean), ImportTypeKind::RecordField));
    assert_eq!(session.special_typedef_kind(boolean), Some(MappedTypeNameKind::DoNothing));

    expect!["UInt"].assert_eq(&render(&mut session, &ForeignType::Typedef(unsigned), ImportTypeKind::Value));
    let signed = session
        .import_type(&ForeignType::Typedef(unsigned), ImportTypeKind::Value, true, false, OptionalKind::None)
        .unwrap();
    expect!["Int"].assert_eq(&session.host().display_type(&signed));

    // `BOOL` has no standalone declaration; `NSUInteger` gets one alias.
    assert_eq!(session.import_decl(boolean), None);
    let alias = session.import_decl(unsigned).expect("alias is emitted");
    assert_eq!(session.import_decl(unsigned), Some(alias));
    assert_eq!(session.host().decl(alias).name.to_string(), "NSUInteger");
}

#[test]
fn test_typedefs_and_cf_references() {
    let mut foreign = ForeignContext::new();
    let module = foreign.add_module("CoreFoundation");
    let score = foreign.add_typedef(module, "Score", ForeignType::int());
    let cf_string = foreign.add_forward_record(module, "__CFString");
    let string_ref = foreign.add_typedef(module, "CFStringRef", ForeignType::pointer_to(ForeignType::Record(cf_string)));
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    expect!["Score"].assert_eq(&render(&mut session, &ForeignType::Typedef(score), ImportTypeKind::Value));

    let reference = ForeignType::Typedef(string_ref);
    expect!["Unmanaged<CFString>!"].assert_eq(&render(&mut session, &reference, ImportTypeKind::Result));
    expect!["CFString!"].assert_eq(&render(&mut session, &reference, ImportTypeKind::AuditedResult));

    let class = session.import_decl(string_ref).expect("CF class");
    let alias = session.alternate_decl(class).expect("Ref alias");
    assert_eq!(session.host().decl(alias).name.to_string(), "CFStringRef");
}

#[test]
fn test_objc_object_types() {
    let (foreign, module) = foundation();
    let copying = find(&foreign, module, "NSCopying");
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let any_copying = ForeignType::ObjCObjectPointer { class: None, protocols: vec![copying] }.nullable();
    expect!["NSCopying?"].assert_eq(&render(&mut session, &any_copying, ImportTypeKind::Value));
    expect!["Self"].assert_eq(&render(&mut session, &ForeignType::InstanceType.nonnull(), ImportTypeKind::Result));
    expect!["AnyObject!"].assert_eq(&render(&mut session, &ForeignType::id(), ImportTypeKind::Parameter));
}

#[test]
fn test_unsupported_types() {
    let (foreign, _) = foundation();
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let array = ForeignType::ConstantArray { element: Box::new(ForeignType::int()), size: 3 };
    expect!["(Int32, Int32, Int32)"].assert_eq(&render(&mut session, &array, ImportTypeKind::RecordField));

    let unsupported = [
        ForeignType::ConstantArray { element: Box::new(ForeignType::int()), size: MAX_TUPLE_ELEMENTS + 1 },
        ForeignType::Vector { element: Box::new(ForeignType::Builtin(BuiltinType::Float)), lanes: 4 },
        ForeignType::Complex(Box::new(ForeignType::Builtin(BuiltinType::Double))),
        ForeignType::Builtin(BuiltinType::Int128),
        ForeignType::Dependent,
        ForeignType::IncompleteArray { element: Box::new(ForeignType::int()) },
    ];
    for ty in &unsupported {
        let result = session.import_type(ty, ImportTypeKind::Value, false, false, OptionalKind::None);
        assert!(matches!(result, Err(ImportError::UnsupportedType { .. })), "{:?} should not import", ty);
    }

    let void_param = session.import_type(&ForeignType::void(), ImportTypeKind::Parameter, false, false, OptionalKind::None);
    assert!(void_param.is_err());
    let void_result = session.import_type(&ForeignType::void(), ImportTypeKind::Result, false, false, OptionalKind::None);
    assert!(void_result.map_or(false, |ty| ty.is_void()));
}

#[test]
fn test_wide_arrays_are_rejected() {
    init_logging();
    let (mut foreign, module) = foundation();
    let huge = ForeignType::ConstantArray { element: Box::new(ForeignType::Builtin(BuiltinType::Char)), size: 1 << 26 };
    let grid = ForeignType::ConstantArray {
        element: Box::new(ForeignType::ConstantArray { element: Box::new(ForeignType::int()), size: 1024 }),
        size: 1024,
    };
    let buffer = foreign.add_record(module, "Buffer");
    foreign.add_field(buffer, "bytes", huge.clone());
    let matrix = foreign.add_record(module, "Matrix");
    foreign.add_field(matrix, "rows", grid.clone());
    let mut session = ImportSession::new(&foreign, ImporterOptions::default());

    let at_limit = ForeignType::ConstantArray { element: Box::new(ForeignType::int()), size: MAX_TUPLE_ELEMENTS };
    let imported = session
        .import_type(&at_limit, ImportTypeKind::RecordField, false, false, OptionalKind::None)
        .expect("an array at the limit imports");
    assert!(matches!(imported, tandem_host::HostType::Tuple(elements) if elements.len() == MAX_TUPLE_ELEMENTS));

    // Both the outer size and the flattened size of nested arrays count.
    for ty in [&huge, &grid] {
        let result = session.import_type(ty, ImportTypeKind::RecordField, false, false, OptionalKind::None);
        assert!(matches!(result, Err(ImportError::UnsupportedType { .. })));
    }
    assert_eq!(session.import_decl(buffer), None);
    assert_eq!(session.import_decl(matrix), None);
}
