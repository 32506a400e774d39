//! Recipe display command.

use clap::Args;

use super::common::{ProtocolArgs, print_banner, print_recipe, render_findings};

/// Print mix recipes.
#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    protocol: ProtocolArgs,

    /// Also list components held in tubes, grouped by volume
    #[arg(long)]
    tubes: bool,

    /// Fail instead of printing a mix with validation findings
    #[arg(long)]
    strict: bool,
}

/// Run the show command.
pub fn run(args: ShowArgs) -> anyhow::Result<()> {
    let settings = args.protocol.load_settings()?;
    for (i, mix) in args.protocol.load_mixes(&settings)?.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let findings = render_findings(mix, args.strict)?;
        print_banner(mix, &findings);
        print_recipe(mix)?;

        if args.tubes {
            let groups = mix.tube_volumes()?;
            if !groups.is_empty() {
                println!();
                println!("Tubes:");
                for (volume, names) in groups {
                    println!("  {:.2} each: {}", volume, names.join(", "));
                }
            }
        }
    }
    Ok(())
}
