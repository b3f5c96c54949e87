//! iztro-style astrolabe JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ziwei_core::chart::{Chart, DecadalRange, Mutagen, Palace, Star};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstrolabeDto {
    pub gender: String,
    pub solar_date: String,
    /// A plain string in most engine builds, an object in some.
    #[serde(default)]
    pub lunar_date: Value,
    #[serde(default)]
    pub chinese_date: String,
    #[serde(default)]
    pub five_elements_class: String,
    #[serde(default)]
    pub soul: String,
    #[serde(default)]
    pub body: String,
    pub palaces: Vec<PalaceDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PalaceDto {
    pub name: String,
    pub heavenly_stem: String,
    pub earthly_branch: String,
    #[serde(default)]
    pub is_body_palace: bool,
    #[serde(default)]
    pub major_stars: Vec<StarDto>,
    #[serde(default)]
    pub minor_stars: Vec<StarDto>,
    #[serde(default)]
    pub adjective_stars: Vec<StarDto>,
    #[serde(default)]
    pub suiqian12: Option<String>,
    #[serde(default)]
    pub jiangqian12: Option<String>,
    #[serde(default)]
    pub changsheng12: Option<String>,
    #[serde(default)]
    pub boshi12: Option<String>,
    pub decadal: DecadalDto,
    #[serde(default)]
    pub ages: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecadalDto {
    pub range: [u32; 2],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarDto {
    pub name: String,
    #[serde(default)]
    pub brightness: Option<String>,
    #[serde(default)]
    pub mutagen: Option<String>,
    #[serde(default)]
    pub self_mutagen: Option<String>,
    #[serde(default)]
    pub xiang_xin_mutagen: Option<String>,
}

impl From<AstrolabeDto> for Chart {
    fn from(dto: AstrolabeDto) -> Self {
        let lunar_date = match dto.lunar_date {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Chart {
            gender: dto.gender,
            solar_date: dto.solar_date,
            lunar_date,
            chinese_date: dto.chinese_date,
            five_elements_class: dto.five_elements_class,
            soul: dto.soul,
            body: dto.body,
            palaces: dto.palaces.into_iter().map(Palace::from).collect(),
        }
    }
}

impl From<PalaceDto> for Palace {
    fn from(dto: PalaceDto) -> Self {
        let stars = |list: Vec<StarDto>| list.into_iter().map(Star::from).collect();
        Palace {
            name: dto.name,
            heavenly_stem: dto.heavenly_stem,
            earthly_branch: dto.earthly_branch,
            major_stars: stars(dto.major_stars),
            minor_stars: stars(dto.minor_stars),
            adjective_stars: stars(dto.adjective_stars),
            suiqian12: dto.suiqian12.unwrap_or_default(),
            jiangqian12: dto.jiangqian12.unwrap_or_default(),
            changsheng12: dto.changsheng12.unwrap_or_default(),
            boshi12: dto.boshi12.unwrap_or_default(),
            decadal: DecadalRange {
                start: dto.decadal.range[0],
                end: dto.decadal.range[1],
            },
            ages: dto.ages,
            is_body_palace: dto.is_body_palace,
        }
    }
}

impl From<StarDto> for Star {
    fn from(dto: StarDto) -> Self {
        let StarDto {
            name,
            brightness,
            mutagen,
            self_mutagen,
            xiang_xin_mutagen,
        } = dto;
        Star {
            brightness: brightness.unwrap_or_default(),
            mutagen: parse_mutagen(&name, mutagen),
            self_mutagen: parse_mutagen(&name, self_mutagen),
            xiang_xin_mutagen: parse_mutagen(&name, xiang_xin_mutagen),
            name,
        }
    }
}

/// Empty strings mean "none"; unknown labels are dropped with a warning.
fn parse_mutagen(star: &str, value: Option<String>) -> Option<Mutagen> {
    let value = value.filter(|v| !v.is_empty())?;
    match value.parse() {
        Ok(m) => Some(m),
        Err(_) => {
            tracing::warn!(star, mutagen = %value, "Ignoring unknown mutagen");
            None
        }
    }
}
