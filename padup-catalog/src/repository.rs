use crate::club::{Club, OpeningHours};
use crate::court::Court;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for club data access
#[async_trait]
pub trait ClubRepository: Send + Sync {
    async fn list_clubs(&self) -> Result<Vec<Club>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_club(
        &self,
        id: Uuid,
    ) -> Result<Option<Club>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_opening_hours(
        &self,
        club_id: Uuid,
        hours: &OpeningHours,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for court data access
#[async_trait]
pub trait CourtRepository: Send + Sync {
    async fn create_court(
        &self,
        court: &Court,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_court(
        &self,
        id: Uuid,
    ) -> Result<Option<Court>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_courts(
        &self,
        club_id: Uuid,
    ) -> Result<Vec<Court>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_court(
        &self,
        id: Uuid,
        court: &Court,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn deactivate_court(
        &self,
        id: Uuid,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
