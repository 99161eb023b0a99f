use predicates::prelude::*;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct SampleFile {
    _dir: TempDir,
    path: PathBuf,
}

fn write_sample(name: &str, contents: &[u8]) -> Result<SampleFile, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(SampleFile { _dir: dir, path })
}

fn xwrap() -> Result<assert_cmd::Command, Box<dyn Error>> {
    Ok(assert_cmd::Command::cargo_bin("xwrap")?)
}

#[test]
fn read_nested_sequence_prints_json() -> Result<(), Box<dyn Error>> {
    let sample = write_sample(
        "groups.xml",
        b"<ArrayOfArrayOfint><ArrayOfint><int>1</int><int>2</int></ArrayOfint><ArrayOfint/></ArrayOfArrayOfint>",
    )?;
    let output = xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<Sequence<int>>",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output)?;
    assert_eq!(json, serde_json::json!([[1, 2], []]));
    Ok(())
}

#[test]
fn read_empty_file_prints_default() -> Result<(), Box<dyn Error>> {
    let sample = write_sample("empty.xml", b"")?;
    xwrap()?
        .args(["read", sample.path.to_str().unwrap(), "--type", "int"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<int>",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));
    Ok(())
}

#[test]
fn read_from_stdin() -> Result<(), Box<dyn Error>> {
    xwrap()?
        .args(["read", "-", "--type", "Queryable<string>"])
        .write_stdin("<ArrayOfstring><string>a</string><string>b</string></ArrayOfstring>")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["a","b"]"#));
    Ok(())
}

#[test]
fn read_reports_metrics_on_stderr() -> Result<(), Box<dyn Error>> {
    let sample = write_sample("ints.xml", b"<ArrayOfint><int>4</int></ArrayOfint>")?;
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<int>",
            "--metrics",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[4]"))
        .stderr(predicate::str::contains("Wrapped:     true"));
    Ok(())
}

#[test]
fn depth_flag_overrides_default_quota() -> Result<(), Box<dyn Error>> {
    let sample = write_sample(
        "deep.xml",
        b"<ArrayOfArrayOfint><ArrayOfint><int>1</int></ArrayOfint></ArrayOfArrayOfint>",
    )?;
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<Sequence<int>>",
            "--max-depth",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quota exceeded"));
    Ok(())
}

#[test]
fn config_file_sets_quotas() -> Result<(), Box<dyn Error>> {
    let config = write_sample("xwrap.toml", b"[quotas]\nmax_array_length = 1\n")?;
    let sample = write_sample("ints.xml", b"<ArrayOfint><int>1</int><int>2</int></ArrayOfint>")?;
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<int>",
            "--config",
            config.path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max array length"));
    Ok(())
}

#[test]
fn malformed_document_fails() -> Result<(), Box<dyn Error>> {
    let sample = write_sample("broken.xml", b"<ArrayOfint><int>1</ArrayOfint>")?;
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "Sequence<int>",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed document"));
    Ok(())
}

#[test]
fn unsupported_content_type_fails() -> Result<(), Box<dyn Error>> {
    let sample = write_sample("ints.xml", b"<int>1</int>")?;
    xwrap()?
        .args([
            "read",
            sample.path.to_str().unwrap(),
            "--type",
            "int",
            "--content-type",
            "application/json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported media type"));
    Ok(())
}

#[test]
fn resolve_prints_surrogate_type() -> Result<(), Box<dyn Error>> {
    let output = xwrap()?
        .args(["resolve", "--type", "Sequence<Sequence<int>>"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output)?;
    assert_eq!(
        json["effective"],
        "DelegatingSequence<DelegatingSequence<int, int>, Sequence<int>>"
    );
    assert_eq!(json["element_name"], "ArrayOfArrayOfint");
    assert_eq!(json["wrapped"], true);
    assert_eq!(json["readable"], true);
    Ok(())
}

#[test]
fn resolve_leaves_plain_types_alone() -> Result<(), Box<dyn Error>> {
    let output = xwrap()?
        .args(["resolve", "--type", "List<int>"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output)?;
    assert_eq!(json["effective"], "List<int>");
    assert_eq!(json["wrapped"], false);
    Ok(())
}

#[test]
fn negotiate_accepts_and_declines() -> Result<(), Box<dyn Error>> {
    xwrap()?
        .args(["negotiate", "text/xml; charset=utf-8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted: text/xml"));
    xwrap()?
        .args(["negotiate", "application/json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not accepted"));
    Ok(())
}

#[test]
fn invalid_type_expression_fails() -> Result<(), Box<dyn Error>> {
    xwrap()?
        .args(["resolve", "--type", "Sequence<int"])
        .assert()
        .failure();
    Ok(())
}
