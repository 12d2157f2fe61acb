use assert_cmd::Command;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    std::io::Write::write_all(&mut f, contents.as_bytes()).expect("write");
    f
}

fn arazzo() -> Command {
    Command::cargo_bin("arazzo").expect("binary")
}

fn stderr_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

const VALID: &str = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: petStoreDescription
    url: https://example.com/openapi.yaml
workflows:
  - workflowId: w1
    summary: Fetch a pet
    steps:
      - stepId: s1
        operationId: op1
  - workflowId: w2
    dependsOn: [w1]
    steps:
      - stepId: s1
        operationId: op2
"#;

#[test]
fn validate_command_returns_0_for_valid_doc() {
    let f = write_temp(VALID);

    let out = arazzo()
        .args(["validate", f.path().to_string_lossy().as_ref()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("ok: valid Arazzo document"));
}

#[test]
fn validate_command_returns_2_for_invalid_doc() {
    let doc = r#"
arazzo: 2.0.0
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
"#;
    let f = write_temp(doc);

    let stderr = stderr_of(
        arazzo()
            .args(["validate", f.path().to_string_lossy().as_ref()])
            .assert()
            .code(2),
    );
    assert!(stderr.contains("$.arazzo"), "{stderr}");
}

#[test]
fn validate_json_lists_every_error() {
    let doc = r#"{
  "arazzo": "1.0.1",
  "info": {"title": "Example"},
  "sourceDescriptions": [],
  "workflows": [{"workflowId": "w1", "steps": []}]
}"#;
    let f = write_temp(doc);

    let out = arazzo()
        .args(["validate", f.path().to_string_lossy().as_ref(), "--format", "json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let result: serde_json::Value = serde_json::from_slice(&out).expect("json output");
    assert_eq!(result["valid"], false);
    let errors = result["errors"].as_array().expect("errors");
    let paths: Vec<&str> = errors.iter().filter_map(|e| e["path"].as_str()).collect();
    assert!(paths.contains(&"$.info.version"), "{paths:?}");
    assert!(paths.contains(&"$.sourceDescriptions"), "{paths:?}");
    assert!(paths.contains(&"$.workflows[0].steps"), "{paths:?}");
}

#[test]
fn unparseable_input_is_a_validation_failure() {
    let f = write_temp("{ not json");

    arazzo()
        .args(["validate", f.path().to_string_lossy().as_ref()])
        .assert()
        .code(2);
}

#[test]
fn missing_file_is_a_runtime_error() {
    arazzo()
        .args(["validate", "/definitely/not/here.yaml"])
        .assert()
        .code(4);
}

#[test]
fn workflows_command_lists_ids() {
    let f = write_temp(VALID);

    let out = arazzo()
        .args(["workflows", f.path().to_string_lossy().as_ref(), "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let result: serde_json::Value = serde_json::from_slice(&out).expect("json output");
    let ids: Vec<&str> = result["workflows"]
        .as_array()
        .expect("workflows")
        .iter()
        .filter_map(|w| w["workflow_id"].as_str())
        .collect();
    assert_eq!(ids, ["w1", "w2"]);
    assert_eq!(result["workflows"][1]["depends_on"][0], "w1");
}

#[test]
fn execute_refuses_an_invalid_document() {
    let doc = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: api
    url: ./openapi.yaml
workflows:
  - workflowId: w1
    steps: []
"#;
    let f = write_temp(doc);

    arazzo()
        .args(["execute", f.path().to_string_lossy().as_ref()])
        .assert()
        .code(2);
}

#[test]
fn execute_reports_unknown_workflow() {
    let f = write_temp(VALID);

    let stderr = stderr_of(
        arazzo()
            .args(["execute", f.path().to_string_lossy().as_ref(), "--workflow", "nope"])
            .assert()
            .code(2),
    );
    assert!(stderr.contains("nope"), "{stderr}");
}

#[test]
fn execute_fails_at_runtime_when_a_source_is_missing() {
    let doc = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: api
    url: ./does-not-exist.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: op1
"#;
    let f = write_temp(doc);

    arazzo()
        .args(["execute", f.path().to_string_lossy().as_ref()])
        .assert()
        .code(4);
}

#[test]
fn execute_fails_the_run_when_the_operation_is_unknown() {
    let openapi = r#"
openapi: 3.0.0
info:
  title: Store API
  version: 1.0.0
servers:
  - url: http://127.0.0.1:9
paths:
  /orders:
    post:
      operationId: createOrder
"#;
    let openapi_file = write_temp(openapi);
    let doc = r#"
arazzo: 1.0.1
info:
  title: Example
  version: 0.0.1
sourceDescriptions:
  - name: storeApi
    url: https://store.example/openapi.yaml
workflows:
  - workflowId: w1
    steps:
      - stepId: s1
        operationId: deleteOrder
"#;
    let f = write_temp(doc);

    let stderr = stderr_of(
        arazzo()
            .args([
                "execute",
                f.path().to_string_lossy().as_ref(),
                "--openapi",
                &format!("storeApi={}", openapi_file.path().display()),
            ])
            .assert()
            .code(3),
    );
    assert!(stderr.contains("deleteOrder"), "{stderr}");
}
