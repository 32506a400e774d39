//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;

use aliquot_config::{Protocol, Settings, find_protocol};
use aliquot_core::{Mix, MixLine, ValidationFinding};
use aliquot_io::read_reference_csv;
use clap::Args;

/// Arguments every protocol-driven command takes.
#[derive(Args)]
pub struct ProtocolArgs {
    /// Protocol name (from the user protocols directory) or path to a TOML file
    #[arg(value_name = "PROTOCOL")]
    pub protocol: String,

    /// Only this mix (default: every mix in the protocol)
    #[arg(short, long)]
    pub mix: Option<String>,

    /// Settings file (default: the user settings.toml, if present)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Reference table CSV (Name, Plate, Well, Concentration (nM), Sequence)
    #[arg(long, value_name = "CSV")]
    pub reference: Option<PathBuf>,
}

impl ProtocolArgs {
    /// Load settings from `--settings` or the user config directory.
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        Ok(match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::load_or_default()?,
        })
    }

    /// Load and build the protocol, returning the selected mixes.
    pub fn load_mixes(&self, settings: &Settings) -> anyhow::Result<Vec<Mix>> {
        let protocol = load_protocol(&self.protocol)?;
        let mut mixes = protocol.build(settings)?;

        if let Some(path) = &self.reference {
            let reference = read_reference_csv(path)?;
            for mix in &mut mixes {
                mix.update_reference(&reference)?;
            }
        }

        match &self.mix {
            Some(name) => {
                let mix = mixes
                    .into_iter()
                    .find(|m| m.name() == name)
                    .ok_or_else(|| anyhow::anyhow!("Mix '{name}' not found in protocol"))?;
                Ok(vec![mix])
            }
            None => Ok(mixes),
        }
    }

    /// The single mix named by `--mix`, or the protocol's only/last mix.
    pub fn load_one(&self, settings: &Settings) -> anyhow::Result<Mix> {
        self.load_mixes(settings)?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Protocol '{}' defines no mixes", self.protocol))
    }
}

/// Load a protocol by name or path.
pub fn load_protocol(name: &str) -> anyhow::Result<Protocol> {
    match find_protocol(name) {
        Some(path) => Ok(Protocol::load(&path)?),
        None => anyhow::bail!(
            "Protocol '{}' not found. Pass a path or place it in {}",
            name,
            aliquot_config::user_protocols_dir().display()
        ),
    }
}

/// Validate a mix about to be rendered. With `strict`, any finding is an
/// error instead.
pub fn render_findings(mix: &Mix, strict: bool) -> anyhow::Result<Vec<ValidationFinding>> {
    if strict {
        mix.ensure_valid()?;
        return Ok(Vec::new());
    }
    Ok(mix.validate()?)
}

/// Banner printed ahead of a plan that failed validation. Empty when there
/// are no findings.
pub fn findings_banner(mix: &Mix, findings: &[ValidationFinding]) -> Vec<String> {
    if findings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "!! mix '{}' is not valid ({} problem(s)); do not prepare it as shown",
        mix.name(),
        findings.len()
    )];
    lines.extend(findings.iter().map(|f| format!("!!   [{}] {f}", f.code())));
    lines
}

/// Print the findings banner to stdout, followed by a blank line.
pub fn print_banner(mix: &Mix, findings: &[ValidationFinding]) {
    let banner = findings_banner(mix, findings);
    if banner.is_empty() {
        return;
    }
    for line in banner {
        println!("{line}");
    }
    println!();
}

/// Print the recipe table of a mix.
pub fn print_recipe(mix: &Mix) -> anyhow::Result<()> {
    println!("{}", mix.infoline()?);
    println!();
    println!(
        "  {:30}  {:>12}  {:>12}  {:>3}  {:>12}  {:>12}  {}",
        "Component", "Src []", "Dest []", "#", "Ea Tx Vol", "Tot Tx Vol", "Location"
    );
    println!(
        "  {:30}  {:>12}  {:>12}  {:>3}  {:>12}  {:>12}  {}",
        "---------", "------", "-------", "-", "---------", "----------", "--------"
    );
    for line in mix.mixlines()? {
        print_line(&line);
    }
    if let Some(instruction) = mix.aliquot_instruction() {
        println!();
        println!("{instruction}");
    }
    Ok(())
}

fn print_line(line: &MixLine) {
    let conc = |c: Option<aliquot_core::Concentration>| {
        c.map(|c| format!("{c:.2}")).unwrap_or_default()
    };
    let mut location = line.plate.clone();
    let wells: Vec<String> = line.wells.iter().flatten().map(ToString::to_string).collect();
    if !wells.is_empty() {
        location = format!("{location}: {}", wells.join(", "));
    }
    if let Some(note) = &line.note {
        location = format!("{location} ({note})");
    }
    println!(
        "  {:30}  {:>12}  {:>12}  {:>3}  {:>12}  {:>12}  {}",
        line.display_name(),
        conc(line.source_concentration),
        conc(line.dest_concentration),
        line.count(),
        format!("{:.2}", line.each_volume),
        format!("{:.2}", line.total_volume()),
        location
    );
}
