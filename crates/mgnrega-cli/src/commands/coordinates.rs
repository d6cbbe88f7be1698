//! Coordinates command implementation

use crate::cli::CoordinatesArgs;
use crate::output::OutputWriter;
use crate::output_types::CoordinatesOutput;
use crate::storage::Storage;
use anyhow::{bail, Context, Result};
use mgnrega_core::models::Coordinates;
use std::collections::HashMap;
use std::fs;

pub async fn execute(args: CoordinatesArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let report = match (&args.file, &args.code, args.lat, args.lng) {
        (Some(path), _, _, _) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let by_name: HashMap<String, Coordinates> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            import_by_name(storage, by_name).await?
        }
        (None, Some(code), Some(lat), Some(lng)) => {
            let updated = storage
                .districts
                .set_coordinates(code, Coordinates { lat, lng })
                .await?;
            CoordinatesOutput {
                updated: usize::from(updated),
                unmatched: if updated { Vec::new() } else { vec![code.clone()] },
            }
        }
        _ => bail!("Pass either --file, or --code with --lat and --lng"),
    };

    if output.is_json() {
        return output.result(report);
    }

    output.success(format!("Updated coordinates for {} district(s)", report.updated));
    if !report.unmatched.is_empty() {
        output.warning(format!("No district matched: {}", report.unmatched.join(", ")));
    }
    Ok(())
}

/// Match stored districts by upper-cased name
async fn import_by_name(
    storage: &Storage,
    by_name: HashMap<String, Coordinates>,
) -> Result<CoordinatesOutput> {
    let by_name: HashMap<String, Coordinates> = by_name
        .into_iter()
        .map(|(name, coords)| (name.trim().to_uppercase(), coords))
        .collect();

    let districts = storage.districts.list_districts(None).await?;
    let mut updated = 0;
    let mut matched = std::collections::HashSet::new();

    for district in &districts {
        let key = district.district_name.trim().to_uppercase();
        if let Some(coords) = by_name.get(&key) {
            if storage
                .districts
                .set_coordinates(&district.district_code, *coords)
                .await?
            {
                updated += 1;
                matched.insert(key);
            }
        }
    }

    let mut unmatched: Vec<String> = by_name
        .into_keys()
        .filter(|name| !matched.contains(name))
        .collect();
    unmatched.sort();

    tracing::info!(updated, unmatched = unmatched.len(), "Imported district coordinates");
    Ok(CoordinatesOutput { updated, unmatched })
}
