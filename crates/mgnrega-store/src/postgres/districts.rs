use async_trait::async_trait;
use mgnrega_core::error::Result;
use mgnrega_core::models::{Coordinates, District};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::{db_error, PostgresStore};
use crate::ports::DistrictStore;

fn district_from_row(row: &PgRow) -> Result<District> {
    let get = db_error("Failed to decode district row");
    let lat: Option<f64> = row.try_get("lat").map_err(&get)?;
    let lng: Option<f64> = row.try_get("lng").map_err(&get)?;

    Ok(District {
        district_code: row.try_get("district_code").map_err(&get)?,
        district_name: row.try_get("district_name").map_err(&get)?,
        state_code: row.try_get("state_code").map_err(&get)?,
        state_name: row.try_get("state_name").map_err(&get)?,
        coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng }),
    })
}

#[async_trait]
impl DistrictStore for PostgresStore {
    async fn upsert_district(&self, district: &District) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO districts (district_code, district_name, state_code, state_name, lat, lng)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (district_code) DO UPDATE
            SET district_name = EXCLUDED.district_name,
                state_code = EXCLUDED.state_code,
                state_name = EXCLUDED.state_name,
                lat = COALESCE(EXCLUDED.lat, districts.lat),
                lng = COALESCE(EXCLUDED.lng, districts.lng),
                updated_at = NOW()
            "#,
        )
        .bind(&district.district_code)
        .bind(&district.district_name)
        .bind(&district.state_code)
        .bind(&district.state_name)
        .bind(district.coordinates.map(|c| c.lat))
        .bind(district.coordinates.map(|c| c.lng))
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to upsert district"))?;
        Ok(())
    }

    async fn get_district(&self, district_code: &str) -> Result<Option<District>> {
        let row = sqlx::query(
            r#"
            SELECT district_code, district_name, state_code, state_name, lat, lng
            FROM districts
            WHERE district_code = $1
            "#,
        )
        .bind(district_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to get district"))?;

        row.as_ref().map(district_from_row).transpose()
    }

    async fn list_districts(&self, state_code: Option<&str>) -> Result<Vec<District>> {
        let rows = sqlx::query(
            r#"
            SELECT district_code, district_name, state_code, state_name, lat, lng
            FROM districts
            WHERE $1::TEXT IS NULL OR state_code = $1
            ORDER BY district_name, district_code
            "#,
        )
        .bind(state_code)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list districts"))?;

        rows.iter().map(district_from_row).collect()
    }

    async fn set_coordinates(
        &self,
        district_code: &str,
        coordinates: Coordinates,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE districts SET lat = $2, lng = $3, updated_at = NOW() WHERE district_code = $1",
        )
        .bind(district_code)
        .bind(coordinates.lat)
        .bind(coordinates.lng)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to set district coordinates"))?;
        Ok(result.rows_affected() > 0)
    }
}
