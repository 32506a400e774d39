//! Transfer-list export command.

use std::path::PathBuf;

use aliquot_io::{transfer_list, write_transfer_csv, write_transfers};
use clap::Args;

use super::common::{ProtocolArgs, findings_banner, render_findings};

/// Export acoustic transfer lists as CSV.
#[derive(Args)]
pub struct TransfersArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,

    /// Output CSV file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Fail instead of exporting a mix with validation findings
    #[arg(long)]
    strict: bool,
}

/// Run the transfers command.
pub fn run(args: TransfersArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    let mut rows = Vec::new();
    for mix in args.protocol.load_mixes(&settings)? {
        // stdout may carry the CSV itself
        let findings = render_findings(&mix, args.strict)?;
        for line in findings_banner(&mix, &findings) {
            eprintln!("{line}");
        }
        rows.extend(transfer_list(&mix)?);
    }

    match args.output {
        Some(path) => {
            write_transfer_csv(&path, &rows)?;
            eprintln!("Wrote {} transfer(s) to {}", rows.len(), path.display());
        }
        None => write_transfers(std::io::stdout().lock(), &rows)?,
    }
    Ok(())
}
