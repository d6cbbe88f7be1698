//! Nearest command implementation

use crate::cli::NearestArgs;
use crate::output::OutputWriter;
use crate::storage::Storage;
use anyhow::{bail, Result};
use mgnrega_core::geo::nearest_district;
use mgnrega_core::models::Coordinates;

pub async fn execute(args: NearestArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let districts = storage.districts.list_districts(None).await?;
    let origin = Coordinates {
        lat: args.lat,
        lng: args.lng,
    };

    let Some(nearest) = nearest_district(&districts, origin) else {
        bail!("No districts found. Run 'mgnrega etl' to populate district data first.");
    };

    if output.is_json() {
        return output.result(nearest);
    }

    output.kv(
        "District",
        format!(
            "{} ({}), {}",
            nearest.district.district_name,
            nearest.district.district_code,
            nearest.district.state_name
        ),
    );
    match nearest.distance_km {
        Some(km) => output.kv("Distance", format!("{:.2} km", km)),
        None => output.kv("Distance", "unknown"),
    }
    if let Some(note) = &nearest.note {
        output.warning(note);
    }

    Ok(())
}
