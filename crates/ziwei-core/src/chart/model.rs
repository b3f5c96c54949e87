//! Narrow domain view of an ephemeris chart.
//!
//! Only the attributes the serializer and the views consume are modelled;
//! ephemeris-specific shapes are mapped into these types by adapters.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZiweiError};
use crate::time_branch::EARTHLY_BRANCHES;

/// Number of palaces in every chart.
pub const PALACE_COUNT: usize = 12;

/// One of the four transformations (四化).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutagen {
    #[serde(rename = "禄")]
    Lu,
    #[serde(rename = "权")]
    Quan,
    #[serde(rename = "科")]
    Ke,
    #[serde(rename = "忌")]
    Ji,
}

impl Mutagen {
    pub const ALL: [Mutagen; 4] = [Mutagen::Lu, Mutagen::Quan, Mutagen::Ke, Mutagen::Ji];

    pub fn as_str(self) -> &'static str {
        match self {
            Mutagen::Lu => "禄",
            Mutagen::Quan => "权",
            Mutagen::Ke => "科",
            Mutagen::Ji => "忌",
        }
    }
}

impl FromStr for Mutagen {
    type Err = ZiweiError;

    fn from_str(s: &str) -> Result<Self> {
        Mutagen::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ZiweiError::ephemeris(format!("unknown mutagen '{s}'")))
    }
}

impl fmt::Display for Mutagen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A star placed in a palace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    pub name: String,
    /// Brightness label such as 庙 or 陷; may be empty.
    #[serde(default)]
    pub brightness: String,
    /// Birth-year transformation.
    #[serde(default)]
    pub mutagen: Option<Mutagen>,
    /// Outward self-transformation (离心自化).
    #[serde(default)]
    pub self_mutagen: Option<Mutagen>,
    /// Inward transformation from the opposite palace (向心自化).
    #[serde(default)]
    pub xiang_xin_mutagen: Option<Mutagen>,
}

impl Star {
    pub fn new(name: impl Into<String>, brightness: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brightness: brightness.into(),
            ..Self::default()
        }
    }

    pub fn with_mutagen(mut self, mutagen: Mutagen) -> Self {
        self.mutagen = Some(mutagen);
        self
    }

    pub fn with_self_mutagen(mut self, mutagen: Mutagen) -> Self {
        self.self_mutagen = Some(mutagen);
        self
    }

    pub fn with_xiang_xin_mutagen(mut self, mutagen: Mutagen) -> Self {
        self.xiang_xin_mutagen = Some(mutagen);
        self
    }

    pub fn brightness_tone(&self) -> BrightnessTone {
        BrightnessTone::of(&self.brightness)
    }
}

/// Coarse grouping of brightness labels used for colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessTone {
    /// 庙 / 旺
    Strong,
    /// 平 / 得
    Neutral,
    /// Everything else, including an empty label.
    Weak,
}

impl BrightnessTone {
    pub fn of(brightness: &str) -> Self {
        match brightness {
            "庙" | "旺" => BrightnessTone::Strong,
            "平" | "得" => BrightnessTone::Neutral,
            _ => BrightnessTone::Weak,
        }
    }
}

/// The five phases used to colour stems and branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiveElement {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

/// Five-element of a heavenly stem or earthly branch character.
pub fn five_element_of(ch: char) -> Option<FiveElement> {
    match ch {
        '甲' | '乙' | '寅' | '卯' => Some(FiveElement::Wood),
        '丙' | '丁' | '巳' | '午' => Some(FiveElement::Fire),
        '戊' | '己' | '辰' | '戌' | '丑' | '未' => Some(FiveElement::Earth),
        '庚' | '辛' | '申' | '酉' => Some(FiveElement::Metal),
        '壬' | '癸' | '子' | '亥' => Some(FiveElement::Water),
        _ => None,
    }
}

/// Inclusive nominal-age span of a decadal limit (大限).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadalRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palace {
    pub name: String,
    pub heavenly_stem: String,
    pub earthly_branch: String,
    pub major_stars: Vec<Star>,
    pub minor_stars: Vec<Star>,
    pub adjective_stars: Vec<Star>,
    pub suiqian12: String,
    pub jiangqian12: String,
    pub changsheng12: String,
    pub boshi12: String,
    pub decadal: DecadalRange,
    /// Small-limit (小限) nominal ages.
    pub ages: Vec<u32>,
    pub is_body_palace: bool,
}

/// A computed twelve-palace chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub gender: String,
    pub solar_date: String,
    pub lunar_date: String,
    /// Four pillars separated by spaces, e.g. `庚午 壬午 丙子 甲午`.
    pub chinese_date: String,
    pub five_elements_class: String,
    pub soul: String,
    pub body: String,
    pub palaces: Vec<Palace>,
}

impl Chart {
    /// The unique body palace, if the chart carries one.
    pub fn body_palace(&self) -> Option<&Palace> {
        self.palaces.iter().find(|p| p.is_body_palace)
    }

    /// Year, month, day and hour pillars.
    pub fn pillars(&self) -> Result<[&str; 4]> {
        let tokens: Vec<&str> = self.chinese_date.split_whitespace().collect();
        let pillars: [&str; 4] = tokens.as_slice().try_into().map_err(|_| {
            ZiweiError::ephemeris(format!(
                "expected four pillars, got '{}'",
                self.chinese_date
            ))
        })?;
        if let Some(bad) = pillars.iter().find(|p| p.chars().count() != 2) {
            return Err(ZiweiError::ephemeris(format!("malformed pillar '{bad}'")));
        }
        Ok(pillars)
    }

    /// Checks the structural invariants every chart must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.palaces.len() != PALACE_COUNT {
            return Err(ZiweiError::ephemeris(format!(
                "expected {PALACE_COUNT} palaces, got {}",
                self.palaces.len()
            )));
        }

        let branches: HashSet<&str> = self
            .palaces
            .iter()
            .map(|p| p.earthly_branch.as_str())
            .collect();
        if branches.len() != PALACE_COUNT || !branches.iter().all(|b| EARTHLY_BRANCHES.contains(b)) {
            return Err(ZiweiError::ephemeris(
                "palaces must cover each earthly branch exactly once",
            ));
        }

        let body_palaces = self.palaces.iter().filter(|p| p.is_body_palace).count();
        if body_palaces != 1 {
            return Err(ZiweiError::ephemeris(format!(
                "expected exactly one body palace, got {body_palaces}"
            )));
        }

        if let Some(p) = self
            .palaces
            .iter()
            .find(|p| p.decadal.start > p.decadal.end)
        {
            return Err(ZiweiError::ephemeris(format!(
                "decadal range of {} is inverted: {}~{}",
                p.name, p.decadal.start, p.decadal.end
            )));
        }

        self.pillars()?;
        Ok(())
    }
}
