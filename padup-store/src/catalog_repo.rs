use async_trait::async_trait;
use padup_catalog::club::{Club, OpeningHours};
use padup_catalog::court::Court;
use padup_catalog::repository::{ClubRepository, CourtRepository};
use serde_json::Value;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ClubRow {
    id: Uuid,
    name: String,
    city: String,
    address: String,
    email: Option<String>,
    phone: Option<String>,
    description: Option<String>,
    opening_hours: Value,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct CourtRow {
    id: Uuid,
    club_id: Uuid,
    name: String,
    surface: String,
    indoor: bool,
    base_price_cents: i32,
    is_active: bool,
}

impl ClubRow {
    fn into_club(self) -> Result<Club, Box<dyn std::error::Error + Send + Sync>> {
        let opening_hours: OpeningHours = serde_json::from_value(self.opening_hours)?;
        Ok(Club {
            id: self.id,
            name: self.name,
            city: self.city,
            address: self.address,
            email: self.email,
            phone: self.phone,
            description: self.description,
            opening_hours,
            is_active: self.is_active,
        })
    }
}

impl CourtRow {
    fn into_court(self) -> Result<Court, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Court {
            id: self.id,
            club_id: self.club_id,
            name: self.name,
            surface: padup_catalog::court::Surface::from_str(&self.surface)?,
            indoor: self.indoor,
            base_price_cents: self.base_price_cents,
            is_active: self.is_active,
        })
    }
}

#[async_trait]
impl ClubRepository for StoreCatalogRepository {
    async fn list_clubs(&self) -> Result<Vec<Club>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ClubRow>(
            "SELECT id, name, city, address, email, phone, description, opening_hours, is_active \
             FROM clubs WHERE is_active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_club()).collect()
    }

    async fn get_club(
        &self,
        id: Uuid,
    ) -> Result<Option<Club>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ClubRow>(
            "SELECT id, name, city, address, email, phone, description, opening_hours, is_active \
             FROM clubs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_club()).transpose()
    }

    async fn update_opening_hours(
        &self,
        club_id: Uuid,
        hours: &OpeningHours,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE clubs SET opening_hours = $1, updated_at = NOW() WHERE id = $2")
            .bind(serde_json::to_value(hours)?)
            .bind(club_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CourtRepository for StoreCatalogRepository {
    async fn create_court(
        &self,
        court: &Court,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "INSERT INTO courts (id, club_id, name, surface, indoor, base_price_cents, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(court.id)
        .bind(court.club_id)
        .bind(&court.name)
        .bind(court.surface.as_str())
        .bind(court.indoor)
        .bind(court.base_price_cents)
        .bind(court.is_active)
        .execute(&self.pool)
        .await?;

        Ok(court.id)
    }

    async fn get_court(
        &self,
        id: Uuid,
    ) -> Result<Option<Court>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, CourtRow>(
            "SELECT id, club_id, name, surface, indoor, base_price_cents, is_active \
             FROM courts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_court()).transpose()
    }

    async fn list_courts(
        &self,
        club_id: Uuid,
    ) -> Result<Vec<Court>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, CourtRow>(
            "SELECT id, club_id, name, surface, indoor, base_price_cents, is_active \
             FROM courts WHERE club_id = $1 AND is_active = TRUE ORDER BY name",
        )
        .bind(club_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_court()).collect()
    }

    async fn update_court(
        &self,
        id: Uuid,
        court: &Court,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            "UPDATE courts SET name = $1, surface = $2, indoor = $3, base_price_cents = $4, \
             is_active = $5, updated_at = NOW() WHERE id = $6",
        )
        .bind(&court.name)
        .bind(court.surface.as_str())
        .bind(court.indoor)
        .bind(court.base_price_cents)
        .bind(court.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn deactivate_court(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query("UPDATE courts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
