//! Volume ledger command.

use clap::Args;

use super::common::ProtocolArgs;

/// Show volumes consumed and made across nested mixes.
#[derive(Args)]
pub struct VolumesArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,
}

/// Run the volumes command.
pub fn run(args: VolumesArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    let mix = args.protocol.load_one(&settings)?;
    let ledger = mix.volume_ledger()?;

    println!("Volumes for {}", mix.name());
    println!();
    println!("  {:30}  {:>12}  {:>12}", "Name", "Consumed", "Made");
    println!("  {:30}  {:>12}  {:>12}", "----", "--------", "----");
    for (name, consumed) in ledger.consumed_volumes() {
        let made = ledger.made(name);
        let made = if made.is_zero() {
            String::new()
        } else {
            format!("{made:.2}")
        };
        println!("  {:30}  {:>12}  {:>12}", name, format!("{consumed:.2}"), made);
    }

    let shortfalls = ledger.shortfalls();
    if !shortfalls.is_empty() {
        println!();
        for (name, missing) in shortfalls {
            println!("  {name} is short by {missing:.2}");
        }
    }
    Ok(())
}
