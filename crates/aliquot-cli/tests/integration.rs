//! Integration tests for aliquot-cli.
//!
//! Each test writes a protocol into a temp directory and runs the built
//! `aliquot` binary against it.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const ASSAY: &str = r#"
name = "assay"

[[components]]
name = "a"
concentration = "1 uM"
plate = "P1"
well = "A1"

[[components]]
name = "b"
concentration = "4 uM"
plate = "P1"
well = "A2"

[[mixes]]
name = "assay"
fixed_total_volume = "10 uL"

[[mixes.actions]]
type = "echo_target_concentration"
components = ["a", "b"]
target_concentration = "10 nM"
"#;

const BROKEN: &str = r#"
[[mixes]]
name = "m"

[[mixes.actions]]
type = "fixed_volume"
components = ["ghost"]
fixed_volume = "1 uL"
"#;

const OVERFULL: &str = r#"
[[components]]
name = "a"
concentration = "100 nM"

[[components]]
name = "b"
concentration = "100 nM"

[[mixes]]
name = "overfull"
fixed_total_volume = "12 uL"

[[mixes.actions]]
type = "fixed_volume"
components = ["a"]
fixed_volume = "5 uL"

[[mixes.actions]]
type = "fixed_volume"
components = ["b"]
fixed_volume = "10 uL"
"#;

const OVERDRAWN: &str = r#"
[[components]]
name = "a"
concentration = "100 nM"
plate = "src"
well = "A1"

[[mixes]]
name = "m"
fixed_total_volume = "1 uL"

[[mixes.actions]]
type = "echo_fixed_volume"
components = ["a"]
fixed_volume = "2 uL"
"#;

/// Helper to get the path to the `aliquot` binary built by cargo.
fn aliquot_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aliquot"))
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        // Echo transfers in ASSAY are 25 nL and 100 nL.
        std::fs::write(dir.path().join("settings.toml"), "min_volume = \"10 nL\"\n").unwrap();
        Self { dir }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn settings(&self) -> PathBuf {
        self.dir.path().join("settings.toml")
    }

    /// Run `aliquot <command> <protocol> --settings <file> <extra...>`.
    fn run(&self, command: &str, protocol: &Path, extra: &[&str]) -> Output {
        aliquot_bin()
            .arg(command)
            .arg(protocol)
            .arg("--settings")
            .arg(self.settings())
            .args(extra)
            .output()
            .expect("failed to run aliquot")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// aliquot actions
// ---------------------------------------------------------------------------

#[test]
fn cli_actions_lists_every_type() {
    let output = aliquot_bin().arg("actions").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Available Actions"));
    for id in [
        "fixed_volume",
        "equal_concentration",
        "fixed_concentration",
        "fill_to_volume",
        "echo_fixed_volume",
        "echo_equal_target_concentration",
        "echo_target_concentration",
        "echo_fill_to_volume",
    ] {
        assert!(text.contains(id), "listing should contain '{id}'");
    }
}

#[test]
fn cli_actions_detail_and_unknown() {
    let output = aliquot_bin().args(["actions", "echo-fixed-volume"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("droplet_volume"));

    let output = aliquot_bin().args(["actions", "shake"]).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown action type"));
}

// ---------------------------------------------------------------------------
// aliquot check
// ---------------------------------------------------------------------------

#[test]
fn cli_check_valid_protocol() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);

    let output = ws.run("check", &protocol, &["--strict"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Mix: assay"), "{text}");
    assert!(text.contains("1 mix(es) checked, 0 finding(s)"), "{text}");
}

#[test]
fn cli_check_json_report() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);

    let output = ws.run("check", &protocol, &["--json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report[0]["mix"], "assay");
    assert_eq!(report[0]["findings"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cli_check_reports_structural_problems() {
    let ws = Workspace::new();
    let protocol = ws.write("broken.toml", BROKEN);

    let output = ws.run("check", &protocol, &[]);
    assert!(!output.status.success());
    let text = stderr(&output);
    assert!(text.contains("unknown component 'ghost'"), "{text}");
}

#[test]
fn cli_check_missing_protocol() {
    let ws = Workspace::new();
    let output = ws.run("check", &ws.dir.path().join("absent.toml"), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));
}

// ---------------------------------------------------------------------------
// aliquot transfers / split / volumes / plates
// ---------------------------------------------------------------------------

#[test]
fn cli_transfers_writes_csv() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);
    let csv_path = ws.dir.path().join("picklist.csv");

    let output = ws.run("transfers", &protocol, &["-o", csv_path.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Sample Name,Source Concentration"));
    assert!(lines[1].starts_with("a,1000,10,nM,100,P1,A1"), "{}", lines[1]);
    assert!(lines[2].starts_with("b,4000,10,nM,25,P1,A2"), "{}", lines[2]);
}

#[test]
fn cli_split_prints_aliquot_instruction() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);

    let output = ws.run("split", &protocol, &["-n", "10", "--excess", "0"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("into 10 different test tubes"));
}

#[test]
fn cli_volumes_and_plates() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);

    let output = ws.run("volumes", &protocol, &["--mix", "assay"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Volumes for assay"));

    let output = ws.run("plates", &protocol, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("assay: plate P1"));
}

#[test]
fn cli_show_flags_invalid_mix_before_recipe() {
    let ws = Workspace::new();
    let protocol = ws.write("overfull.toml", OVERFULL);

    let output = ws.run("show", &protocol, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    let banner = text.find("mix 'overfull' is not valid").expect("missing banner");
    let recipe = text.find("Component").expect("missing recipe table");
    assert!(banner < recipe, "{text}");
    assert!(text.contains("[negative_buffer_volume]"), "{text}");

    let output = ws.run("show", &protocol, &["--strict"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed validation"));
    assert!(!stdout(&output).contains("Component"));
}

#[test]
fn cli_plates_and_split_flag_invalid_mix() {
    let ws = Workspace::new();
    let protocol = ws.write("overfull.toml", OVERFULL);

    let output = ws.run("plates", &protocol, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("!! mix 'overfull' is not valid"));

    let output = ws.run("split", &protocol, &["-n", "2"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("!! mix 'overfull' is not valid"));
}

#[test]
fn cli_transfers_warns_on_invalid_mix() {
    let ws = Workspace::new();
    let protocol = ws.write("overdrawn.toml", OVERDRAWN);

    let output = ws.run("transfers", &protocol, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("a,100,200,nM,2000,src,A1"));
    let warnings = stderr(&output);
    assert!(warnings.contains("mix 'm' is not valid"), "{warnings}");
    assert!(warnings.contains("[exceeds_total_volume]"), "{warnings}");

    let output = ws.run("transfers", &protocol, &["--strict"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn cli_unknown_mix_fails() {
    let ws = Workspace::new();
    let protocol = ws.write("assay.toml", ASSAY);

    let output = ws.run("show", &protocol, &["--mix", "nope"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Mix 'nope' not found"));
}
