//! Canonical "文墨天机" tree document.
//!
//! The LLM prompts are written against this exact layout, so the output must
//! stay byte-stable. Two quirks are intentional and must not be "fixed":
//! the birth-info rows are indented space-then-pipe while the header rows are
//! pipe-then-space, and the small-limit ages are printed for both 小限 and 流年.

use crate::birth::BirthInput;
use crate::chart::{Chart, Palace, Star};

const TITLE: &str = "文墨天机紫微斗数命盘";
const API_VERSION: &str = "1.1.1";
const APP_VERSION: &str = "2.5.3";
const STAR_CODE: &str = "C5VUC";
const EMPTY_LIST: &str = "无";

/// Renders `chart` as the canonical tree text.
///
/// Reads nothing but its arguments; equal inputs give byte-identical output.
pub fn render_tree(chart: &Chart, input: &BirthInput) -> String {
    let mut out = String::with_capacity(4096);

    line(&mut out, TITLE);
    line(&mut out, "│");
    line(&mut out, format!("├API 版本 : {API_VERSION}"));
    line(&mut out, format!("├App版本 : {APP_VERSION}"));
    line(&mut out, format!("├安星码 : {STAR_CODE}"));
    line(&mut out, "├符号定义");
    line(&mut out, "│ ├(↓:离心自化)");
    line(&mut out, "│ ├(↑:向心自化，从对宫化入)");
    line(&mut out, "│ ├(┏ : 生日前小限)");
    line(&mut out, "│ └( ┓: 生日后小限)");
    line(&mut out, "│");

    let body_branch = chart
        .body_palace()
        .map(|p| p.earthly_branch.as_str())
        .unwrap_or("");

    line(&mut out, "├命主出生信息");
    line(&mut out, "│ │");
    line(&mut out, format!(" │ ├性别 : {}", chart.gender));
    line(&mut out, format!(" │ ├公历出生日期 : {}", chart.solar_date));
    line(&mut out, format!(" │ ├农历出生日期 : {}", chart.lunar_date));
    line(&mut out, format!(" │ ├出生时间(时:分) : {}", input.time_string()));
    line(&mut out, format!(" │ ├五行局数 : {}", chart.five_elements_class));
    line(
        &mut out,
        format!(
            " │ └身主:{}; 命主:{}; 子年斗君:巳; 身宫:{}",
            chart.body, chart.soul, body_branch
        ),
    );
    line(&mut out, "│");

    line(&mut out, "├命盘十二宫");
    line(&mut out, "│ │");
    for palace in &chart.palaces {
        render_palace(&mut out, palace);
    }

    line(&mut out, "├大限流年信息");
    out.push_str("└[备注: 无]");
    out
}

fn render_palace(out: &mut String, palace: &Palace) {
    let ages = join_ages(&palace.ages);

    line(
        out,
        format!(
            " ├{}宫[{}{}]",
            palace.name, palace.heavenly_stem, palace.earthly_branch
        ),
    );
    line(out, format!(" │ ├主星 : {}", star_list(&palace.major_stars, render_star)));
    line(out, format!(" │ ├辅星 : {}", star_list(&palace.minor_stars, render_star)));
    line(
        out,
        format!(" │ ├小星 : {}", star_list(&palace.adjective_stars, |s| s.name.clone())),
    );
    line(out, " │ ├神煞");
    line(out, format!(" │ │ ├岁前星 : {}", palace.suiqian12));
    line(out, format!(" │ │ ├将前星 : {}", palace.jiangqian12));
    line(out, format!(" │ │ ├十二长生 : {}", palace.changsheng12));
    line(out, format!(" │ │ └太岁煞禄 : {}", palace.boshi12));
    line(
        out,
        format!(
            " │ ├大限 : {}~{}虚岁",
            palace.decadal.start, palace.decadal.end
        ),
    );
    line(out, format!(" │ ├小限 : {ages}虚岁"));
    line(out, format!(" │ ├流年 : {ages}虚岁"));
    line(out, " │ └限流叠宫 : 无");
    line(out, " │");
}

/// `{name}[{brightness}]{suffix}` for major and minor stars.
pub fn render_star(star: &Star) -> String {
    format!("{}[{}]{}", star.name, star.brightness, star_suffix(star))
}

/// Transformation marker; the birth-year mutagen wins over self, which wins
/// over xiangXin.
pub fn star_suffix(star: &Star) -> String {
    if let Some(m) = star.mutagen {
        format!("[生年{m}]")
    } else if let Some(m) = star.self_mutagen {
        format!("(↓:{m})")
    } else if let Some(m) = star.xiang_xin_mutagen {
        format!("(↑:{m})")
    } else {
        String::new()
    }
}

fn star_list(stars: &[Star], render: impl Fn(&Star) -> String) -> String {
    if stars.is_empty() {
        return EMPTY_LIST.to_string();
    }
    stars.iter().map(render).collect::<Vec<_>>().join(", ")
}

fn join_ages(ages: &[u32]) -> String {
    ages.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}
