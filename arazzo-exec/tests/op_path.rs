use arazzo_exec::openapi::{
    find_operation_by_id, find_operation_by_path, parse_operation_path_ref, OpenApiDoc,
    OperationLookupError,
};
use serde_json::json;

fn docs() -> Vec<OpenApiDoc> {
    vec![
        OpenApiDoc {
            name: "petStore".into(),
            location: "https://pets.example/openapi.json".into(),
            raw: json!({
                "servers": [{"url": "/v2"}],
                "paths": {
                    "/pet/findByStatus": {"get": {"operationId": "findPetsByStatus"}},
                    "/pet/{petId}": {"get": {"operationId": "getPet"}}
                }
            }),
        },
        OpenApiDoc {
            name: "store".into(),
            location: "https://store.example/openapi.json".into(),
            raw: json!({
                "paths": {"/order": {"post": {"operationId": "placeOrder"}, "get": {"operationId": "getPet"}}}
            }),
        },
    ]
}

#[test]
fn parse_operation_path_ref_valid() {
    let result = parse_operation_path_ref(
        "{$sourceDescriptions.petStoreDescription.url}#/paths/~1pet~1findByStatus/get",
    )
    .unwrap();

    assert_eq!(result.source_name.as_deref(), Some("petStoreDescription"));
    assert_eq!(result.method, "get");
    assert_eq!(result.path, "/pet/findByStatus");
}

#[test]
fn parse_operation_path_ref_bare_fragment() {
    let result = parse_operation_path_ref("#/paths/~1order/POST").unwrap();
    assert_eq!(result.source_name, None);
    assert_eq!(result.path, "/order");
    assert_eq!(result.method, "post");
}

#[test]
fn parse_operation_path_ref_missing_hash() {
    let err = parse_operation_path_ref("{$sourceDescriptions.petStoreDescription.url}").unwrap_err();
    assert!(matches!(err, OperationLookupError::InvalidOperationPath { .. }));
}

#[test]
fn parse_operation_path_ref_missing_source_template() {
    assert!(parse_operation_path_ref("https://example.com#/paths/~1pet/get").is_err());
}

#[test]
fn parse_operation_path_ref_invalid_pointer() {
    assert!(
        parse_operation_path_ref("{$sourceDescriptions.petStoreDescription.url}#/invalid/path")
            .is_err()
    );
}

#[test]
fn parse_operation_path_ref_complex_path() {
    let result = parse_operation_path_ref(
        "{$sourceDescriptions.api.url}#/paths/~1users~1{userId}~1orders/get",
    )
    .unwrap();

    assert_eq!(result.path, "/users/{userId}/orders");
}

#[test]
fn finds_operation_by_path() {
    let op = find_operation_by_path(
        &docs(),
        "{$sourceDescriptions.petStore.url}#/paths/~1pet~1{petId}/get",
    )
    .unwrap();
    assert_eq!(op.source_name, "petStore");
    assert_eq!(op.path, "/pet/{petId}");
    assert_eq!(op.base_url.as_deref(), Some("/v2"));

    let op = find_operation_by_path(&docs(), "#/paths/~1order/post").unwrap();
    assert_eq!(op.source_name, "store");

    assert!(matches!(
        find_operation_by_path(&docs(), "{$sourceDescriptions.petStore.url}#/paths/~1order/post"),
        Err(OperationLookupError::PathNotFound { .. })
    ));
}

#[test]
fn finds_operation_by_id() {
    let op = find_operation_by_id(&docs(), "placeOrder").unwrap();
    assert_eq!((op.source_name.as_str(), op.method.as_str()), ("store", "POST"));

    // Plain ids resolve to the first registered source that declares them.
    assert_eq!(find_operation_by_id(&docs(), "getPet").unwrap().source_name, "petStore");
    let op = find_operation_by_id(&docs(), "$sourceDescriptions.store.getPet").unwrap();
    assert_eq!(op.path, "/order");

    assert!(matches!(
        find_operation_by_id(&docs(), "missing"),
        Err(OperationLookupError::OperationNotFound(_))
    ));
    assert!(matches!(
        find_operation_by_id(&docs(), "$sourceDescriptions.nope.getPet"),
        Err(OperationLookupError::UnknownSource(_))
    ));
    assert!(matches!(find_operation_by_id(&[], "x"), Err(OperationLookupError::NoSources)));
}
