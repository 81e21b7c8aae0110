//! Tests for the `prg-parser` binary.

use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use prg_parser::{EntityKind, Row};

fn sample() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("prg")
        .join("sample.xml")
}

fn prg_parser() -> Command {
    Command::new(env!("CARGO_BIN_EXE_prg-parser"))
}

#[test]
fn test_convert_writes_json_lines_to_stdout() {
    let output = prg_parser()
        .arg("convert")
        .arg(sample())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<Row> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].kind, EntityKind::AddressPoint);
    assert_eq!(rows[3].values.len(), 28);
}

#[test]
fn test_convert_to_file_with_kind_and_exclude() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("streets.jsonl");

    prg_parser()
        .arg("convert")
        .arg(sample())
        .args(["--basic", "--kind", "ul", "--exclude", "geometry", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Saved to:"))
        .stderr(predicate::str::contains("Entities: PRG_UlicaNazwa"));

    let written = std::fs::read_to_string(&out).unwrap();
    let rows: Vec<Row> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EntityKind::Street);
    // lokalnyId, nazwaGlownaCzesc, idTERYT, ulica
    assert_eq!(rows[0].values.len(), 4);
    assert_eq!(rows[0].values[1].as_deref(), Some("Krupówki"));
}

#[test]
fn test_convert_missing_file_fails() {
    prg_parser()
        .args(["convert", "/nonexistent/PRG_PunktyAdresowe.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_convert_rejects_schema_without_fields() {
    prg_parser()
        .arg("convert")
        .arg(sample())
        .arg("--basic")
        .args(["-x", "lokalnyId", "-x", "nazwa", "-x", "idTERYT"])
        .args(["-x", "poziom", "-x", "jednostkaPodzialuTeryt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("without any fields"));
}

#[test]
fn test_fields_lists_basic_columns() {
    prg_parser()
        .args(["fields", "--basic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRG_PunktAdresowy (12 columns)"))
        .stdout(predicate::str::contains("komponent").not());
}

#[test]
fn test_namespaces_prints_sniffed_uris() {
    prg_parser()
        .arg("namespaces")
        .arg(sample())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "urn:gugik:specyfikacje:gmlas:panstwowyRejestrGranicAdresy:1.0",
        ))
        .stdout(predicate::str::contains("{http://www.w3.org/1999/xlink}href"));
}
