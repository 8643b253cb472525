use vellum_codegen::{GenerateError, Options, SymbolFormat, Target, generate, generate_python, generate_rust, render_symbols};
use vellum_ir::{Function, Items, Mutability, Primitive, Type};

const KV: &str = include_str!("../../vellum_ir/tests/fixtures/kv.json");

fn kv() -> Items {
    serde_json::from_str(KV).expect("fixture parses")
}

fn options() -> Options {
    Options::new("kv")
        .targets(Target::ALL)
        .link_name("kv")
        .symbol_prefix("kv_")
}

#[test]
fn every_target_produces_its_files() {
    let files = generate(&kv(), &options()).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["kv.rs", "kv.h", "kv_export.h", "kv.py"]);
}

#[test]
fn rust_bindings() {
    let files = generate(&kv(), &Options::new("kv").symbol_prefix("kv_").link_name("kv")).unwrap();
    let rs = &files[0].contents;

    assert!(rs.starts_with("// @generated by vellum"));
    assert!(rs.contains("pub struct KvStore"));
    assert!(rs.contains("pub key : * const :: core :: ffi :: c_char"));
    assert!(rs.contains(r#"# [link_name = "kv_for_each"]"#));
    assert!(rs.contains(r#"link (name = "kv" , kind = "dylib")"#));

    // Wrapper layer.
    assert!(rs.contains("pub unsafe fn create () -> :: vellum_abi :: OwnedPtr < KvStore >"));
    assert!(rs.contains(
        "visit : :: vellum_abi :: Closure < fn (* const :: core :: ffi :: c_char , * const :: core :: ffi :: c_char) >"
    ));
    assert!(rs.contains("visit . into_raw ()"));

    // Implement facility.
    for name in ["create", "set", "get", "delete", "entries", "for_each"] {
        assert!(rs.contains(&format!("__VELLUM_EXPECTED_SIGNATURE_{name}")), "{name}");
        assert!(rs.contains(&format!(r#"# [unsafe (export_name = "kv_{name}")]"#)), "{name}");
    }
}

#[test]
fn c_header() {
    let files = generate(&kv(), &options()).unwrap();
    let h = &files[1].contents;

    assert!(h.contains("#ifndef KV_ABI"));
    assert!(h.contains("struct KvStore;\nstruct KvEntry;"));
    assert!(h.contains("typedef struct kv_owned_ptr_KvStore {\n    struct KvStore *data;\n    void (*deleter)(struct KvStore *);\n} kv_owned_ptr_KvStore;"));
    assert!(h.contains("typedef struct kv_owned_slice_KvEntry {"));
    assert!(h.contains("struct KvEntry {\n    const char *key;\n    const char *value;\n};"));
    assert!(h.contains("KV_ABI kv_owned_slice_KvEntry kv_entries(const struct KvStore *store);"));
    assert!(h.contains(
        "KV_ABI void kv_for_each(const struct KvStore *store, kv_closure_void_args_const_char_ptr_const_char_ptr visit);"
    ));
    assert!(h.contains("/*!\n * Returns null if `key` is absent.\n */\nKV_ABI const char *kv_get("));

    let export = &files[2].contents;
    assert!(export.contains("bool kv_export_delete(struct KvStore *store, const char *key);"));
}

#[test]
fn python_module() {
    let py = generate_python(&kv(), &options()).unwrap();

    assert!(py.contains("class KvStore(ct.Structure):\n    \"\"\"An ordered string map.\n\n    Opaque type; only used behind pointers.\n    \"\"\"\n"));
    assert!(py.contains("KvEntry._fields_ = [\n    (\"key\", ct.c_char_p),\n    (\"value\", ct.c_char_p),\n]\n"));
    assert!(py.contains("    _declare(lib, \"kv_create\", [], OwnedPtr(KvStore))\n"));
    assert!(py.contains("    _declare(lib, \"kv_entries\", [ct.POINTER(KvStore)], OwnedSlice(KvEntry))\n"));
    assert!(py.contains(
        "    _declare(lib, \"kv_for_each\", [ct.POINTER(KvStore), Closure(None, ct.c_char_p, ct.c_char_p)], None)\n"
    ));
    assert!(py.contains("      Returns null if `key` is absent.\n"));
}

#[test]
fn colliding_c_typedefs_are_rejected() {
    let mut items = kv();
    items.structs.push(vellum_ir::Struct::new("u8_ptr").field("x", Type::primitive(Primitive::U8)));
    let bytes = Type::slice(Mutability::Const, Type::pointer(Mutability::Mut, Primitive::U8.into()));
    let named = Type::slice(Mutability::Const, Type::named("u8_ptr"));
    items.functions.push(Function::new("a").arg("x", bytes));
    items.functions.push(Function::new("b").arg("y", named));

    let err = generate(&items, &options()).unwrap_err();
    assert!(matches!(err, GenerateError::TypedefCollision { .. }), "{err}");
    assert!(generate_rust(&items, &options()).is_ok());
}

#[test]
fn symbol_listing() {
    let script = render_symbols(&kv(), &options(), SymbolFormat::GnuVersionScript);
    assert!(script.starts_with("{\n  global:\n    kv_create;\n"));
    assert!(script.ends_with("    kv_for_each;\n  local: *;\n};\n"));
    assert_eq!(render_symbols(&kv(), &options(), SymbolFormat::List).lines().count(), 6);
}

#[test]
fn invalid_descriptions_generate_nothing() {
    let mut items = kv();
    items.functions[1].args[0].ty = Type::pointer(Mutability::Mut, Type::named("Missing"));

    let err = generate(&items, &options()).unwrap_err();
    assert!(matches!(err, GenerateError::Invalid(_)));
    assert_eq!(
        err.to_string(),
        "invalid interface description: unknown type `Missing` in argument `store` of `set`"
    );
}

#[test]
fn closures_beyond_the_runtime_arity_are_rejected() {
    let mut items = kv();
    let args = vec![Type::primitive(Primitive::U8); vellum_ir::MAX_CLOSURE_ARGS + 1];
    items.functions.push(Function::new("wide").arg("cb", Type::closure(args, None)));

    let err = generate_rust(&items, &options()).unwrap_err();
    assert!(matches!(err, GenerateError::Invalid(_)), "{err}");
}
