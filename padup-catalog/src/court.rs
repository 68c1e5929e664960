use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Playing surface of a padel court
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Surface {
    ArtificialGrass,
    Concrete,
    Carpet,
}

/// A bookable court belonging to a club
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub surface: Surface,
    pub indoor: bool,
    /// Hourly base rate, in cents.
    pub base_price_cents: i32,
    pub is_active: bool,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::ArtificialGrass => "ARTIFICIAL_GRASS",
            Surface::Concrete => "CONCRETE",
            Surface::Carpet => "CARPET",
        }
    }
}

impl std::str::FromStr for Surface {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARTIFICIAL_GRASS" => Ok(Surface::ArtificialGrass),
            "CONCRETE" => Ok(Surface::Concrete),
            "CARPET" => Ok(Surface::Carpet),
            other => Err(CatalogError::UnknownSurface(other.to_string())),
        }
    }
}

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown court surface: {0}")]
    UnknownSurface(String),
    #[error("Club not found: {0}")]
    ClubNotFound(Uuid),

    #[error("Court not found: {0}")]
    CourtNotFound(Uuid),

    #[error("Club is closed on the requested day")]
    ClosedThatDay,
}
