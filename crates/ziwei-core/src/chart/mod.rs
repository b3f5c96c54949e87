//! Chart domain module.
//!
//! - `model`: chart, palace and star types plus structural validation
//! - `ephemeris`: the `Ephemeris` collaborator trait and `compute_chart`

mod ephemeris;
mod model;

pub use ephemeris::{DEFAULT_LOCALE, Ephemeris, EphemerisRequest, compute_chart};
pub use model::{
    BrightnessTone, Chart, DecadalRange, FiveElement, Mutagen, PALACE_COUNT, Palace, Star,
    five_element_of,
};

#[cfg(test)]
pub(crate) fn sample_chart() -> Chart {
    fn palace(name: &str, stem: &str, branch: &str, start: u32, first_age: u32) -> Palace {
        Palace {
            name: name.to_string(),
            heavenly_stem: stem.to_string(),
            earthly_branch: branch.to_string(),
            suiqian12: "岁建".to_string(),
            jiangqian12: "将星".to_string(),
            changsheng12: "长生".to_string(),
            boshi12: "博士".to_string(),
            decadal: DecadalRange {
                start,
                end: start + 9,
            },
            ages: (0..4).map(|i| first_age + i * 12).collect(),
            ..Palace::default()
        }
    }

    let mut palaces = vec![
        palace("财帛", "戊", "寅", 84, 9),
        palace("子女", "己", "卯", 74, 8),
        palace("夫妻", "庚", "辰", 64, 7),
        palace("兄弟", "辛", "巳", 54, 6),
        palace("命宫", "壬", "午", 4, 5),
        palace("父母", "癸", "未", 14, 4),
        palace("福德", "甲", "申", 24, 3),
        palace("田宅", "乙", "酉", 34, 2),
        palace("官禄", "丙", "戌", 44, 1),
        palace("仆役", "丁", "亥", 94, 12),
        palace("迁移", "戊", "子", 104, 11),
        palace("疾厄", "己", "丑", 114, 10),
    ];

    palaces[4].major_stars = vec![Star::new("紫微", "庙").with_mutagen(Mutagen::Quan)];
    palaces[4].minor_stars = vec![Star::new("左辅", "").with_self_mutagen(Mutagen::Ke)];
    palaces[4].adjective_stars = vec![Star::new("天刑", ""), Star::new("红鸾", "")];
    palaces[8].major_stars = vec![
        Star::new("太阳", "旺").with_xiang_xin_mutagen(Mutagen::Lu),
        Star::new("巨门", "陷"),
    ];
    palaces[8].is_body_palace = true;

    Chart {
        gender: "男".to_string(),
        solar_date: "1990-6-15".to_string(),
        lunar_date: "一九九〇年五月廿三".to_string(),
        chinese_date: "庚午 壬午 丙子 甲午".to_string(),
        five_elements_class: "水二局".to_string(),
        soul: "破军".to_string(),
        body: "天梁".to_string(),
        palaces,
    }
}
