use arazzo_core::{parse_str, DiagnosticKind, DocumentFormat, ParseOptions, ParseOutcome};

fn minimal_valid_yaml() -> &'static str {
    r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
    type: openapi
workflows:
  - workflowId: loginUser
    steps:
      - stepId: loginStep
        operationId: loginUser
"#
}

fn parse_yaml(input: &str) -> ParseOutcome {
    parse_str(input, DocumentFormat::Yaml, None, &ParseOptions::default()).unwrap()
}

fn messages(out: &ParseOutcome) -> Vec<String> {
    out.diagnostics.iter().map(|d| d.to_string()).collect()
}

fn has_invalid(out: &ParseOutcome, path_suffix: &str, needle: &str) -> bool {
    out.diagnostics.iter().any(|d| {
        d.path().ends_with(path_suffix)
            && matches!(&d.kind, DiagnosticKind::Invalid(reason) if reason.contains(needle))
    })
}

#[test]
fn parse_yaml_and_validate_ok() {
    let out = parse_yaml(minimal_valid_yaml());
    assert!(out.valid, "{:?}", messages(&out));
    let doc = out.document.unwrap();
    assert_eq!(doc.workflows[0].steps[0].step_id, "loginStep");
}

#[test]
fn parse_json_and_validate_ok() {
    let json = r#"
{
  "arazzo": "1.0.1",
  "info": { "title": "Example", "version": "0.0.1" },
  "sourceDescriptions": [
    { "name": "petStoreDescription", "url": "https://example.com/openapi.yaml", "type": "openapi" }
  ],
  "workflows": [
    {
      "workflowId": "loginUser",
      "steps": [
        { "stepId": "loginStep", "operationId": "loginUser" }
      ]
    }
  ]
}
"#;
    let out = parse_str(json, DocumentFormat::Auto, None, &ParseOptions::default()).unwrap();
    assert!(out.valid);
}

#[test]
fn unparseable_text_is_an_error() {
    let err = parse_str("not: [valid", DocumentFormat::Auto, None, &ParseOptions::default())
        .unwrap_err();
    assert!(format!("{err}").contains("YAML"));
}

#[test]
fn unquoted_yaml_versions_are_accepted() {
    let doc = minimal_valid_yaml().replace("version: 0.0.1", "version: 2");
    let out = parse_yaml(&doc);
    assert!(out.valid, "{:?}", messages(&out));
    assert_eq!(out.document.unwrap().info.version, "2");
}

#[test]
fn invalid_spec_version_is_rejected() {
    let bad = minimal_valid_yaml().replace("arazzo: 1.0.1", "arazzo: 2.0.0");
    let out = parse_yaml(&bad);
    assert!(!out.valid);
    assert!(has_invalid(&out, "$.arazzo", "1.0.x"));
}

#[test]
fn missing_required_keys_are_reported_together() {
    let out = parse_yaml(
        r#"
arazzo: 1.0.1
info:
  version: 0.0.1
workflows:
  - steps:
      - operationId: op1
"#,
    );
    assert!(!out.valid);
    let msgs = messages(&out);
    for expected in [
        "attribute $.info.title is missing",
        "attribute $.sourceDescriptions is missing",
        "attribute $.workflows[0].workflowId is missing",
        "attribute $.workflows[0].steps[0].stepId is missing",
    ] {
        assert!(msgs.iter().any(|m| m == expected), "{expected} not in {msgs:?}");
    }
}

#[test]
fn wrong_node_kind_invalidates_only_required_keys() {
    let optional = minimal_valid_yaml().replace("title: Example", "title: Example\n  summary: [1]");
    let out = parse_yaml(&optional);
    assert!(out.valid);
    assert_eq!(
        messages(&out),
        vec!["attribute $.info.summary is not of type `string`"]
    );

    let optional = format!("{}components: oops\n", minimal_valid_yaml()).replace(
        "        operationId: loginUser",
        "        operationId: loginUser\n        requestBody: 5",
    );
    let out = parse_yaml(&optional);
    assert!(out.valid, "{:?}", messages(&out));
    assert_eq!(
        messages(&out),
        vec![
            "attribute $.workflows[0].steps[0].requestBody is not of type `object`",
            "attribute $.components is not of type `object`",
        ]
    );
    let doc = out.document.unwrap();
    assert!(doc.components.is_none());
    assert!(doc.workflows[0].steps[0].request_body.is_none());

    let required = minimal_valid_yaml().replace("title: Example", "title: {a: 1}");
    let out = parse_yaml(&required);
    assert!(!out.valid);
    assert!(messages(&out).contains(&"attribute $.info.title is not of type `string`".to_string()));
}

#[test]
fn unknown_keys_are_extra_but_not_fatal() {
    let doc = minimal_valid_yaml().replace(
        "        operationId: loginUser",
        "        operationId: loginUser\n        colour: blue\n        x-owner: team-a",
    );
    let out = parse_yaml(&doc);
    assert!(out.valid);
    assert_eq!(
        messages(&out),
        vec!["attribute $.workflows[0].steps[0].colour is unexpected"]
    );
    let doc = out.document.unwrap();
    assert!(doc.workflows[0].steps[0].extensions.contains_key("x-owner"));
}

#[test]
fn duplicate_workflow_ids_are_repeated() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
  - workflowId: w1
    steps:
      - stepId: s2
        operationId: op2
"#;
    let out = parse_yaml(bad);
    assert!(!out.valid);
    assert!(messages(&out).contains(&"attribute $.workflows[1].workflowId is repeated".to_string()));
}

#[test]
fn step_must_target_exactly_one_of_operation_or_workflow() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        workflowId: otherWorkflow
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".steps[0]", "exactly one of"));
}

#[test]
fn goto_success_action_requires_step_or_workflow_id() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        onSuccess:
          - name: next
            type: goto
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".onSuccess[0]", "type=goto"));
}

#[test]
fn goto_naming_both_a_step_and_a_workflow_is_rejected() {
    let both = minimal_valid_yaml().replace(
        "        operationId: loginUser",
        "        operationId: loginUser\n        onFailure:\n          - name: back\n            type: goto\n            stepId: loginStep\n            workflowId: loginUser",
    );
    let out = parse_yaml(&both);
    assert!(!out.valid);
    assert!(has_invalid(&out, ".onFailure[0]", "exactly one of workflowId or stepId"));

    let step_only = both.replace("            workflowId: loginUser\n", "");
    assert!(parse_yaml(&step_only).valid);
}

#[test]
fn jsonpath_criterion_requires_context() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        successCriteria:
          - condition: $[?count(@.pets) > 0]
            type: jsonpath
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".successCriteria[0].context", "must be provided"));
}

#[test]
fn xpath_dialect_version_is_checked() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        successCriteria:
          - context: $response.body
            condition: /pets
            type:
              type: xpath
              version: xpath-99
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".successCriteria[0].type.version", "unsupported xpath"));
}

#[test]
fn components_keys_must_match_regex() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
components:
  parameters:
    "bad key!":
      name: q
      in: query
      value: 1
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, "$.components.parameters.bad key!", "map key must match"));
}

#[test]
fn dangling_reusable_reference_is_a_warning() {
    let doc = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        parameters:
          - reference: $components.parameters.page
"#;
    let out = parse_yaml(doc);
    assert!(out.valid);
    let d = out.diagnostics.iter().next().unwrap();
    assert!(matches!(d.kind, DiagnosticKind::Warning(_)));
    assert_eq!(d.to_string(), "$.workflows[0].steps[0].parameters[0].reference");
}

#[test]
fn reusable_reference_into_wrong_pool_is_invalid() {
    let doc = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        onFailure:
          - reference: $components.successActions.done
"#;
    let out = parse_yaml(doc);
    assert!(has_invalid(&out, ".onFailure[0].reference", "components.failureActions"));
}

#[test]
fn invalid_runtime_expression_in_step_outputs_is_rejected() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        outputs:
          x: $inputs..bad
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".steps[0].outputs.x", "invalid runtime expression"));
}

#[test]
fn invalid_template_expression_in_operation_path_is_rejected() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationPath: '{$sourceDescriptions..url}#/paths/~1pets/get'
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".steps[0].operationPath", "invalid template expression"));
}

#[test]
fn invalid_embedded_expression_in_request_body_payload_is_rejected() {
    let bad = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
        requestBody:
          contentType: application/json
          payload: '{\"petId\": \"{$inputs..pet_id}\"}'
"#;
    let out = parse_yaml(bad);
    assert!(has_invalid(&out, ".steps[0].requestBody.payload", "invalid expression inside value"));
}
