use std::fs;
use std::path::Path;
use std::process::Command;

const AST: &str = r#"{
  "name": "calc",
  "includes": [ { "name": "shared" } ],
  "structs": [
    {
      "name": "Work",
      "fields": [ { "id": 1, "name": "num1", "type": { "kind": "i32" } } ]
    }
  ],
  "services": [
    {
      "name": "Calculator",
      "functions": [ { "name": "ping", "return_type": { "kind": "void" } } ]
    }
  ]
}"#;

fn thrift_js() -> Command {
    Command::new(env!("CARGO_BIN_EXE_thrift-js"))
}

fn write_ast(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("calc.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn writes_every_generated_file() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), AST);
    let out = dir.path().join("gen");

    let status = thrift_js()
        .arg("--ast")
        .arg(&ast)
        .arg("--out")
        .arg(&out)
        .args(["--node", "--ts", "--package-output-dir", "lib/gen/"])
        .status()
        .unwrap();
    assert!(status.success());

    for name in ["calc_types.js", "Calculator.js", "calc_types.d.ts", "Calculator.d.ts"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    let episode = fs::read_to_string(out.join("thrift.js.episode")).unwrap();
    assert_eq!(episode, "calc_types:lib/gen/calc_types\nCalculator:lib/gen/Calculator\n");
}

#[test]
fn imports_resolve_includes_through_episodes() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), AST);
    let package = dir.path().join("shared");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("thrift.js.episode"), "shared_types:gen/shared_types\n").unwrap();
    let out = dir.path().join("gen");

    let status = thrift_js()
        .arg("--ast")
        .arg(&ast)
        .arg("--out")
        .arg(&out)
        .arg("--node")
        .arg("--imports")
        .arg(&package)
        .status()
        .unwrap();
    assert!(status.success());

    let types = fs::read_to_string(out.join("calc_types.js")).unwrap();
    assert!(types.contains("var shared_ttypes = require('shared/gen/shared_types');\n"));
}

#[test]
fn invalid_switches_fail_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), AST);
    let out = dir.path().join("gen");

    let output = thrift_js()
        .arg("--ast")
        .arg(&ast)
        .arg("--out")
        .arg(&out)
        .arg("--with-ns")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("with_ns] is only valid when using node.js"));
    assert!(!out.exists());
}

#[test]
fn malformed_type_graphs_are_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let ast = write_ast(dir.path(), "{ \"name\": ");

    let output = thrift_js().arg("--ast").arg(&ast).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("failed to parse type graph").count(), 1);
    assert!(!stderr.contains("Caused by"));
}
