//! Protocol checking command.

use aliquot_config::ConfigError;
use clap::Args;

use super::common::ProtocolArgs;

/// Build a protocol and report validation findings.
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,

    /// Exit with an error when any finding is reported
    #[arg(long)]
    strict: bool,

    /// Print findings as JSON
    #[arg(long)]
    json: bool,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    let mixes = match args.protocol.load_mixes(&settings) {
        Ok(mixes) => mixes,
        Err(err) => {
            if let Some(ConfigError::Invalid(issues)) = err.downcast_ref::<ConfigError>() {
                eprintln!("Protocol has {} problem(s):", issues.len());
                for issue in issues {
                    eprintln!("  - {issue}");
                }
                anyhow::bail!("protocol '{}' is not valid", args.protocol.protocol);
            }
            return Err(err);
        }
    };

    let mut total = 0;
    let mut report = Vec::new();
    for mix in &mixes {
        let findings = mix.validate()?;
        total += findings.len();

        if args.json {
            report.push(serde_json::json!({
                "mix": mix.name(),
                "total_volume": mix.total_volume()?.to_string(),
                "findings": findings
                    .iter()
                    .map(|f| serde_json::json!({ "code": f.code(), "message": f.to_string() }))
                    .collect::<Vec<_>>(),
            }));
            continue;
        }

        println!("{}", mix.infoline()?);
        if findings.is_empty() {
            println!("  ok");
        }
        for finding in &findings {
            println!("  [{}] {finding}", finding.code());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("{} mix(es) checked, {total} finding(s)", mixes.len());
    }

    if args.strict && total > 0 {
        anyhow::bail!("{total} validation finding(s)");
    }
    Ok(())
}
