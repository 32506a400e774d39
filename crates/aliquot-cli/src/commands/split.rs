//! Split-mix command.

use std::str::FromStr;

use aliquot_core::split_mix;
use clap::Args;
use rust_decimal::Decimal;

use super::common::{ProtocolArgs, print_banner, print_recipe, render_findings};

/// Scale a mix so it can be aliquoted into several tubes.
#[derive(Args)]
pub struct SplitArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,

    /// Number of tubes to aliquot into
    #[arg(short = 'n', long)]
    tubes: u32,

    /// Extra fraction made on top of n tubes (0.05 = 5%)
    #[arg(long, default_value = "0.05", value_parser = parse_fraction)]
    excess: Decimal,

    /// Fail instead of printing a scaled mix with validation findings
    #[arg(long)]
    strict: bool,
}

fn parse_fraction(s: &str) -> Result<Decimal, String> {
    Decimal::from_str(s.trim()).map_err(|e| format!("Invalid fraction '{s}': {e}"))
}

/// Run the split command.
pub fn run(args: SplitArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    let template = args.protocol.load_one(&settings)?;
    let large = split_mix(&template, args.tubes, args.excess)?;
    let findings = render_findings(&large, args.strict)?;
    print_banner(&large, &findings);
    print_recipe(&large)
}
