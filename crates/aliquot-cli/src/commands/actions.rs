//! Action listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings

use aliquot_core::ActionKind;
use clap::Args;

/// List available action types.
#[derive(Args)]
pub struct ActionsArgs {
    /// Show details for a specific action type
    #[arg(value_name = "ACTION")]
    action: Option<String>,
}

/// Run the actions command.
pub fn run(args: ActionsArgs) -> anyhow::Result<()> {
    if let Some(id) = &args.action {
        let kind =
            ActionKind::from_id(id).ok_or_else(|| anyhow::anyhow!("Unknown action type: {id}"))?;

        println!("{}", kind.id());
        println!("{}", "=".repeat(kind.id().len()));
        println!();
        println!("{} - {}", kind.name(), kind.description());
        println!();
        println!("Acoustic:                 {}", yes_no(kind.is_acoustic()));
        println!("Needs fixed total volume: {}", yes_no(kind.requires_fixed_total_volume()));
        println!();
        println!("Parameters: {}", kind.parameters().join(", "));
        println!();
        println!("Example:");
        println!();
        println!("  [[mixes.actions]]");
        println!("  type = \"{}\"", kind.id());
        println!("  components = [\"a\", \"b\"]");
        if let Some(param) = kind.parameters().first() {
            println!("  {param} = \"...\"");
        }
        return Ok(());
    }

    println!("Available Actions");
    println!("=================");
    println!();
    println!("  {:32}  {:8}  {}", "Type", "Acoustic", "Description");
    println!("  {:32}  {:8}  {}", "----", "--------", "-----------");
    for kind in ActionKind::ALL {
        println!(
            "  {:32}  {:8}  {}",
            kind.id(),
            yes_no(kind.is_acoustic()),
            kind.description()
        );
    }
    println!();
    println!("Use 'aliquot actions <type>' for parameter details.");
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
