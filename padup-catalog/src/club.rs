use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A padel club: the account that owns courts and receives bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub address: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub opening_hours: OpeningHours,
    pub is_active: bool,
}

/// Open/close times for one day. Times are UTC, same reference frame as
/// slot keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

/// Weekly schedule; a `None` day is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub monday: Option<DayHours>,
    pub tuesday: Option<DayHours>,
    pub wednesday: Option<DayHours>,
    pub thursday: Option<DayHours>,
    pub friday: Option<DayHours>,
    pub saturday: Option<DayHours>,
    pub sunday: Option<DayHours>,
}

impl OpeningHours {
    /// Same hours every day of the week.
    pub fn all_week(opens_at: NaiveTime, closes_at: NaiveTime) -> Self {
        let day = Some(DayHours { opens_at, closes_at });
        Self {
            monday: day,
            tuesday: day,
            wednesday: day,
            thursday: day,
            friday: day,
            saturday: day,
            sunday: day,
        }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<DayHours> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}
