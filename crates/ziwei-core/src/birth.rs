//! Birth input supplied by the user form.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZiweiError};
use crate::time_branch::time_branch_index;

/// Earliest solar year the form accepts.
pub const EARLIEST_YEAR: i32 = 1900;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Localized token passed to the ephemeris.
    pub fn ephemeris_token(self) -> &'static str {
        match self {
            Gender::Male => "男",
            Gender::Female => "女",
        }
    }
}

impl FromStr for Gender {
    type Err = ZiweiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "男" => Ok(Gender::Male),
            "female" | "f" | "女" => Ok(Gender::Female),
            other => Err(ZiweiError::input(format!("unknown gender '{other}'"))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Gender plus solar birth date and local civil time.
///
/// Values built through [`BirthInput::parse`] or [`BirthInput::new`] always
/// satisfy `1900-01-01 <= solar_date <= today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthInput {
    pub solar_date: NaiveDate,
    pub time: NaiveTime,
    pub gender: Gender,
}

impl BirthInput {
    /// Validates the date range against the local calendar.
    pub fn new(solar_date: NaiveDate, time: NaiveTime, gender: Gender) -> Result<Self> {
        Self::new_as_of(solar_date, time, gender, Local::now().date_naive())
    }

    /// Same as [`BirthInput::new`] with an explicit "today".
    pub fn new_as_of(
        solar_date: NaiveDate,
        time: NaiveTime,
        gender: Gender,
        today: NaiveDate,
    ) -> Result<Self> {
        let earliest = NaiveDate::from_ymd_opt(EARLIEST_YEAR, 1, 1)
            .ok_or_else(|| ZiweiError::input("invalid earliest date"))?;
        if solar_date < earliest {
            return Err(ZiweiError::input(format!(
                "solar date {solar_date} is before {earliest}"
            )));
        }
        if solar_date > today {
            return Err(ZiweiError::input(format!(
                "solar date {solar_date} is in the future"
            )));
        }
        Ok(Self {
            solar_date,
            time: truncate_to_minute(time),
            gender,
        })
    }

    /// Parses `YYYY-MM-DD`, `HH:MM` and a gender token.
    pub fn parse(date: &str, time: &str, gender: &str) -> Result<Self> {
        let solar_date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|e| ZiweiError::input(format!("malformed date '{date}': {e}")))?;
        let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
            .map_err(|e| ZiweiError::input(format!("malformed time '{time}': {e}")))?;
        Self::new(solar_date, time, gender.parse()?)
    }

    /// The form's initial state: current local date and time, male.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            solar_date: now.date_naive(),
            time: truncate_to_minute(now.time()),
            gender: Gender::Male,
        }
    }

    /// Resets date and time to now, keeping the gender.
    pub fn set_to_now(&mut self) {
        let now = Self::now();
        self.solar_date = now.solar_date;
        self.time = now.time;
    }

    /// Year shortcut: replaces the year and keeps month and day.
    pub fn with_year(&self, year: i32) -> Result<Self> {
        let date = self.solar_date.with_year(year).ok_or_else(|| {
            ZiweiError::input(format!(
                "{year}-{:02}-{:02} is not a valid date",
                self.solar_date.month(),
                self.solar_date.day()
            ))
        })?;
        Self::new(date, self.time, self.gender)
    }

    pub fn date_string(&self) -> String {
        self.solar_date.format(DATE_FORMAT).to_string()
    }

    pub fn time_string(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }

    pub fn time_branch_index(&self) -> u8 {
        time_branch_index(self.time.hour())
    }
}

impl Default for BirthInput {
    fn default() -> Self {
        Self::now()
    }
}

/// Years offered by the year shortcut, newest first.
pub fn selectable_years(current_year: i32) -> Vec<i32> {
    (EARLIEST_YEAR..=current_year).rev().collect()
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
