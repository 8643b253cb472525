use vellum_ir::{ItemKind, Items, Mutability, Type, ValidationError};

const KV: &str = include_str!("fixtures/kv.json");

fn kv() -> Items {
    serde_json::from_str(KV).expect("fixture parses")
}

#[test]
fn kv_description_is_valid() {
    let items = kv();
    assert_eq!(items.validate(), Ok(()));

    assert_eq!(items.kind_of("KvStore"), Some(ItemKind::AbstractStruct));
    assert_eq!(items.kind_of("KvEntry"), Some(ItemKind::Struct));
    assert_eq!(items.kind_of("entries"), Some(ItemKind::Function));
    assert_eq!(items.kind_of("nothing"), None);

    let entries = items.find_function("entries").unwrap();
    assert_eq!(
        entries.returns,
        Some(Type::owned(Type::slice(Mutability::Mut, Type::named("KvEntry"))))
    );
    assert_eq!(items.find_struct("KvEntry").unwrap().docs.len(), 1);
}

#[test]
fn json_round_trip_is_lossless() {
    let items = kv();
    let text = serde_json::to_string_pretty(&items).unwrap();
    let back: Items = serde_json::from_str(&text).unwrap();
    assert_eq!(items, back);
}

#[test]
fn taking_a_store_by_value_is_rejected() {
    let mut items = kv();
    items.functions[1].args[0].ty = Type::named("KvStore");

    let errors = items.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors.as_slice()[0],
        ValidationError::Unsized { name, .. } if name == "KvStore"
    ));
    assert_eq!(
        errors.to_string(),
        "invalid interface description: abstract struct `KvStore` is used by value in argument `store` of `set`"
    );
}
