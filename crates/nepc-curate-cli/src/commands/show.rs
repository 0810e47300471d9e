//! Show command - print a stored cross section.

use colored::Colorize;
use nepc_curate::{CrossSectionStore, DataPaths, DirectoryStore};

pub fn run(
    paths: &DataPaths,
    cs_id: i64,
    show_data: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = DirectoryStore::open(&paths.output_dir)?;
    let stored = store.fetch(cs_id)?;
    let cs = &stored.cross_section;

    if json_output {
        let value = serde_json::json!({
            "cs_id": stored.cs_id,
            "first_csdata_id": stored.first_csdata_id,
            "path": stored.path,
            "cross_section": cs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Cross section".cyan().bold(),
        stored.cs_id.to_string().white().bold(),
        stored.path.display().to_string().dimmed()
    );
    println!();

    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".dimmed().to_string());
    println!("  specie:      {}", cs.specie);
    println!("  process:     {}", cs.process.green());
    println!("  units:       e x {}, sigma x {}", cs.units_e, cs.units_sigma);
    println!("  ref:         {}", optional(cs.reference.clone()));
    println!(
        "  lhs:         {} {}",
        optional(cs.lhs_a.clone()),
        cs.lhs_b.clone().unwrap_or_default()
    );
    println!(
        "  rhs:         {} {}",
        optional(cs.rhs_a.clone()),
        cs.rhs_b.clone().unwrap_or_default()
    );
    println!(
        "  v / j:       {} -> {}, {} -> {}",
        optional(cs.lhs_v.map(|v| v.to_string())),
        optional(cs.rhs_v.map(|v| v.to_string())),
        optional(cs.lhs_j.map(|j| j.to_string())),
        optional(cs.rhs_j.map(|j| j.to_string()))
    );
    println!("  threshold:   {}", optional(cs.threshold.map(|t| t.to_string())));
    println!("  background:  {}", optional(cs.background.clone()));
    match cs.uncertainty().effective() {
        Some((lower, upper)) => println!("  uncertainty: -{}% / +{}%", lower, upper),
        None => println!("  uncertainty: {}", "none".dimmed()),
    }
    if !cs.models.is_empty() {
        println!("  models:      {}", cs.models.join(", ").yellow());
    }
    println!("  points:      {}", cs.data.len());

    if show_data {
        println!();
        let first = stored.first_csdata_id.unwrap_or_default();
        for (offset, (energy, sigma)) in cs.data.iter().enumerate() {
            println!("  {:>8}  {:>12e}  {:>12e}", first + offset as i64, energy, sigma);
        }
    }
    Ok(())
}
