use anyhow::Result;
use insta_cmd::assert_cmd_snapshot;
use pretty_assertions::assert_eq;

use crate::CliTest;

const USERS: &str = r#"// api:meta
// Title: Users
// Version: 2.1.0
package users

// api:model
type User struct {
	Name    string  `json:"name" binding:"required"`
	Address Address `json:"address"`
}

// api:model
type Address struct {
	City string `json:"city"`
}

// api:model
type Unused struct {
	Note string `json:"note"`
}

// api:route GET /users/{id} getUser
// Responses:
//   200: User
func GetUser() {
}

// api:route GET /admin/users listUsers
// spec: admin
// Responses:
//   200: []User
func ListUsers() {
}
"#;

fn users_project() -> Result<CliTest> {
    CliTest::with_file("users/users.go", USERS)
}

#[test]
fn test_generate_writes_default_document() -> Result<()> {
    let test = CliTest::with_file(
        "api/ping.go",
        "package api\n\n// api:route GET /ping ping\nfunc Ping() {\n}\n",
    )?;

    assert_cmd_snapshot!(test.generate_command().arg("--no-cache"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    ✓ Generated 1 document from 1 source file
      --> ./docs/openapi.json (1 operation, 0 schemas)

    ----- stderr -----
    ");

    let document = test.read_json("docs/openapi.json")?;
    assert_eq!(document["openapi"], "3.0.3");
    assert_eq!(document["paths"]["/ping"]["get"]["operationId"], "ping");
    assert_eq!(
        document["paths"]["/ping"]["get"]["responses"]["200"]["description"],
        "OK"
    );

    Ok(())
}

#[test]
fn test_generate_partitions_documents() -> Result<()> {
    let test = users_project()?;

    let output = test.generate_command().output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let default = test.read_json("docs/openapi.json")?;
    let admin = test.read_json("docs/openapi.admin.json")?;

    assert_eq!(default["info"]["title"], "Users");
    assert_eq!(default["info"]["version"], "2.1.0");
    assert!(default["paths"]["/users/{id}"].is_object());
    assert!(default["paths"]["/admin/users"].is_null());
    assert!(admin["paths"]["/admin/users"].is_object());
    assert!(admin["paths"]["/users/{id}"].is_null());

    let schemas: Vec<&String> = default["components"]["schemas"]
        .as_object()
        .map(|schemas| schemas.keys().collect())
        .unwrap_or_default();
    assert_eq!(schemas, vec!["Address", "User"]);
    assert_eq!(
        default["components"]["schemas"]["User"]["required"],
        serde_json::json!(["name"])
    );

    Ok(())
}

#[test]
fn test_generate_is_idempotent() -> Result<()> {
    let test = users_project()?;

    test.generate_command().output()?;
    let first = test.read_file("docs/openapi.json")?;
    let first_admin = test.read_file("docs/openapi.admin.json")?;

    let output = test.generate_command().output()?;
    assert!(output.status.success());
    assert_eq!(test.read_file("docs/openapi.json")?, first);
    assert_eq!(test.read_file("docs/openapi.admin.json")?, first_admin);

    Ok(())
}

#[test]
fn test_generate_document_filter() -> Result<()> {
    let test = users_project()?;

    let output = test.generate_command().args(["--doc", "admin"]).output()?;
    assert!(output.status.success());
    assert!(test.root().join("docs/openapi.admin.json").exists());
    assert!(!test.root().join("docs/openapi.json").exists());

    Ok(())
}

#[test]
fn test_generate_no_clean_keeps_all_schemas() -> Result<()> {
    let test = users_project()?;

    let output = test
        .generate_command()
        .args(["--no-clean", "--no-cache"])
        .output()?;
    assert!(output.status.success());

    let default = test.read_json("docs/openapi.json")?;
    assert!(default["components"]["schemas"]["Unused"].is_object());

    Ok(())
}

#[test]
fn test_generate_output_override() -> Result<()> {
    let test = users_project()?;

    let output = test
        .generate_command()
        .args(["-o", "out", "--no-cache"])
        .output()?;
    assert!(output.status.success());
    assert!(test.root().join("out/openapi.json").exists());
    assert!(!test.root().join("docs").exists());

    Ok(())
}

#[test]
fn test_generate_without_operations_fails() -> Result<()> {
    let test = CliTest::with_file("api/util.go", "package api\n\nfunc helper() {\n}\n")?;

    assert_cmd_snapshot!(test.generate_command().arg("--no-cache"), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    warning: No operations found in 1 source file

    ----- stderr -----
    ");

    Ok(())
}

#[test]
fn test_generate_strict_fails_on_diagnostics() -> Result<()> {
    let test = CliTest::with_file(
        "api/ping.go",
        "package api\n\n// api:route GET /ping ping\n// Responses:\n//   200: Missing\nfunc Ping() {\n}\n",
    )?;

    let relaxed = test.generate_command().arg("--no-cache").output()?;
    assert_eq!(relaxed.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&relaxed.stderr).contains("reported (use -v for details)"));

    let strict = test
        .generate_command()
        .args(["--strict", "--no-cache", "-v"])
        .output()?;
    assert_eq!(strict.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("Missing"));

    Ok(())
}

#[test]
fn test_generate_invalid_config_is_error() -> Result<()> {
    let test = users_project()?;
    test.write_file(".apiscriberc.json", "{ not json")?;

    let output = test.generate_command().output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));

    Ok(())
}
