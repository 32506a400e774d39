//! Plate map command.

use aliquot_core::{PlateMap, PlateType};
use clap::Args;

use super::common::{ProtocolArgs, print_banner, render_findings};

/// Print plate maps of the plated components of a mix.
#[derive(Args)]
pub struct PlatesArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,

    /// Plate size (96 or 384; default from settings)
    #[arg(long)]
    plate_type: Option<u32>,

    /// One map per recipe line instead of per plate and volume
    #[arg(long)]
    separate: bool,

    /// Fail instead of printing a mix with validation findings
    #[arg(long)]
    strict: bool,
}

/// Run the plates command.
pub fn run(args: PlatesArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    let plate_type = match args.plate_type {
        Some(wells) => PlateType::from_well_count(wells)
            .ok_or_else(|| anyhow::anyhow!("Unsupported plate size {wells}; expected 96 or 384"))?,
        None => settings.plate_type()?,
    };

    for mix in args.protocol.load_mixes(&settings)? {
        let findings = render_findings(&mix, args.strict)?;
        print_banner(&mix, &findings);
        let maps = mix.plate_maps(plate_type, !args.separate)?;
        if maps.is_empty() {
            println!("{}: no plated components", mix.name());
            continue;
        }
        for map in &maps {
            print_map(mix.name(), map);
        }
    }
    Ok(())
}

fn print_map(mix: &str, map: &PlateMap) {
    println!(
        "{mix}: plate {}, {:.2} each, {} well(s)",
        map.plate_name(),
        map.volume_each(),
        map.len()
    );

    let width = map.iter().map(|(_, name)| name.len()).max().unwrap_or(1).min(12);
    let cols = map.plate_type().cols();
    print!("    ");
    for col in 1..=cols {
        print!(" {col:>width$}");
    }
    println!();
    for (row, cells) in map.grid().iter().enumerate() {
        print!("  {} ", (b'A' + row as u8) as char);
        for cell in cells {
            let name = cell.unwrap_or(".");
            let name: String = name.chars().take(width).collect();
            print!(" {name:>width$}");
        }
        println!();
    }
    println!();
}
