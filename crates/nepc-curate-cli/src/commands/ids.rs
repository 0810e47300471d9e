//! Ids command - inspect or reset the persistent ID counters.

use colored::Colorize;
use nepc_curate::{DataPaths, IdAllocator};

use super::confirm;
use crate::cli::IdsAction;

pub fn run(
    paths: &DataPaths,
    action: IdsAction,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let allocator = IdAllocator::new(&paths.id_file);

    let ids = match action {
        IdsAction::Show => allocator.load()?,
        IdsAction::Reset => allocator.reset(confirm)?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        println!("{} {}", "ID state file:".cyan().bold(), allocator.path().display());
        println!("  next cs_id:     {}", ids.next_cs_id.to_string().white().bold());
        println!("  next csdata_id: {}", ids.next_csdata_id.to_string().white().bold());
    }
    Ok(())
}
