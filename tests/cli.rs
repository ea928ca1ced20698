use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_font() -> NamedTempFile {
    let font = r#"{
  "familyName": "Blocks",
  "resolution": 1000,
  "glyphs": {
    "Y": { "ha": 700, "o": "m 0 0 l 0 700 l 600 700 l 600 0 z" },
    "2": { "ha": 700, "o": "m 0 0 l 0 700 l 600 700 l 600 0 z m 200 200 l 400 200 l 400 500 l 200 500 z" }
  }
}
"#;
    let mut tmp = NamedTempFile::new().expect("temp font");
    tmp.write_all(font.as_bytes()).expect("write font");
    tmp
}

#[test]
fn cli_replays_keys_and_prints_final_state() {
    let font = write_font();
    let mut cmd = Command::cargo_bin("glowcube").expect("binary exists");
    cmd.arg("--font")
        .arg(font.path())
        .arg("--summary-only")
        .arg("--keys")
        .arg("wwa");
    cmd.assert()
        .success()
        .stdout(contains("Final state:"))
        .stdout(contains("Scene: light source + 2 text object(s)"))
        .stdout(contains(" - light pos=(0.00, 0.20, 0.00)"))
        .stdout(contains(" - point light pos=(0.00, 0.20, 0.00) distance=100"))
        .stdout(contains(" - camera pos=(-0.10, 0.00, 10.00) fov=75"))
        .stdout(contains(" - Y pos=(-3.00, 0.00, 0.00) material=non-metallic"))
        .stdout(contains(" - 2 pos=(3.00, 0.00, 0.00) material=metallic"));
}

#[test]
fn cli_without_a_font_shows_only_the_light() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("glowcube").expect("binary exists");
    cmd.arg("--font")
        .arg(dir.path().join("missing.typeface.json"))
        .arg("--summary-only")
        .arg("--keys")
        .arg("sd");
    cmd.assert()
        .success()
        .stdout(contains("Scene: light source + 0 text object(s)"))
        .stdout(contains(" - light pos=(0.00, -0.10, 0.00)"))
        .stdout(contains(" - camera pos=(0.10, 0.00, 10.00) fov=75"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("glowcube").expect("binary exists");
    cmd.arg("--frobnicate");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --frobnicate"));
}

#[test]
fn cli_reports_out_of_range_timeouts() {
    let mut cmd = Command::cargo_bin("glowcube").expect("binary exists");
    cmd.args(["--summary-only", "--font-timeout", "1e300"]);
    cmd.assert()
        .failure()
        .stderr(contains("--font-timeout out of range"));
}
