//! Terminal rendering of the twelve palaces.

use anyhow::Result;
use chrono::Datelike;
use colored::{ColoredString, Colorize};
use ziwei_application::ChartView;
use ziwei_core::chart::{BrightnessTone, FiveElement, Mutagen, Palace, Star, five_element_of};

use super::context::AppContext;
use crate::BirthArgs;

/// Number of small-limit ages shown per palace.
const AGES_SHOWN: usize = 6;

pub async fn run(context: &AppContext, birth: &BirthArgs) -> Result<()> {
    let input = birth.to_input()?;
    let view = context.chart_view(&input).await?;
    print!("{}", render_chart(&view));
    Ok(())
}

pub fn render_chart(view: &ChartView) -> String {
    let chart = &view.chart;
    let mut out = String::new();

    push_line(&mut out, "文墨天机紫微斗数命盘".bold().to_string());
    push_line(
        &mut out,
        format!(
            "{} {}  {} {}  {} {}",
            "性别".bright_black(),
            chart.gender,
            "五行局".bright_black(),
            chart.five_elements_class,
            "命主/身主".bright_black(),
            format!("{}/{}", chart.soul, chart.body),
        ),
    );
    push_line(
        &mut out,
        format!(
            "{} {} {}  {} {}",
            "公历".bright_black(),
            chart.solar_date,
            view.input.time_string(),
            "农历".bright_black(),
            chart.lunar_date,
        ),
    );

    let pillars = match chart.pillars() {
        Ok(pillars) => pillars
            .iter()
            .map(|pillar| color_ganzhi(pillar))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => chart.chinese_date.clone(),
    };
    push_line(&mut out, format!("{} {}", "四柱".bright_black(), pillars));

    for palace in &chart.palaces {
        out.push('\n');
        render_palace(&mut out, palace);
    }

    out.push('\n');
    push_line(&mut out, "大运走势".bold().to_string());
    for step in decadal_timeline(view) {
        push_line(
            &mut out,
            format!(
                "  {} {}岁 {}",
                color_ganzhi(&step.ganzhi),
                step.start_age,
                step.start_year.to_string().bright_black()
            ),
        );
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
struct DecadalStep {
    ganzhi: String,
    start_age: u32,
    start_year: i32,
}

/// Decadal limits in age order, with the calendar year each one begins.
fn decadal_timeline(view: &ChartView) -> Vec<DecadalStep> {
    let birth_year = view.input.solar_date.year();
    let mut palaces: Vec<&Palace> = view.chart.palaces.iter().collect();
    palaces.sort_by_key(|p| p.decadal.start);
    palaces
        .into_iter()
        .map(|p| DecadalStep {
            ganzhi: format!("{}{}", p.heavenly_stem, p.earthly_branch),
            start_age: p.decadal.start,
            // Nominal age 1 is the birth year.
            start_year: birth_year + p.decadal.start as i32 - 1,
        })
        .collect()
}

fn render_palace(out: &mut String, palace: &Palace) {
    let mut header = format!(
        "{} {}",
        palace.name.yellow().bold(),
        color_ganzhi(&format!("{}{}", palace.heavenly_stem, palace.earthly_branch)),
    );
    if palace.is_body_palace {
        header.push_str(&format!(" {}", "[身]".magenta()));
    }
    header.push_str(&format!(
        "  {} {} - {}",
        "大限".bright_black(),
        palace.decadal.start,
        palace.decadal.end
    ));
    push_line(out, header);

    let mut stars: Vec<String> = palace.major_stars.iter().map(major_star).collect();
    stars.extend(palace.minor_stars.iter().map(minor_star));
    if !stars.is_empty() {
        push_line(out, format!("  {}", stars.join(" ")));
    }

    if !palace.adjective_stars.is_empty() {
        let names: Vec<&str> = palace.adjective_stars.iter().map(|s| s.name.as_str()).collect();
        push_line(out, format!("  {}", names.join(" ").bright_black()));
    }

    push_line(
        out,
        format!(
            "  {}",
            format!(
                "{} {} {} {}",
                palace.changsheng12, palace.boshi12, palace.jiangqian12, palace.suiqian12
            )
            .bright_black()
        ),
    );

    let ages: Vec<String> = palace
        .ages
        .iter()
        .take(AGES_SHOWN)
        .map(u32::to_string)
        .collect();
    push_line(out, format!("  {} {}", "小限".bright_black(), ages.join(" ")));
}

fn major_star(star: &Star) -> String {
    let label = format!("{}{}", star.name, star.brightness);
    let name = match star.brightness_tone() {
        BrightnessTone::Strong => label.red().bold(),
        BrightnessTone::Neutral => label.bold(),
        BrightnessTone::Weak => label.blue().bold(),
    };
    format!("{name}{}", mutagen_marks(star))
}

fn minor_star(star: &Star) -> String {
    let label = format!("{}{}", star.name, star.brightness);
    format!("{}{}", label.bright_black(), mutagen_marks(star))
}

/// Birth-year badge, then the self (↓) and facing (↑) transformations.
fn mutagen_marks(star: &Star) -> String {
    let mut marks = String::new();
    if let Some(m) = star.mutagen {
        marks.push_str(&mutagen_badge(m).to_string());
    }
    if let Some(m) = star.self_mutagen {
        marks.push_str(&format!("↓{m}").red().to_string());
    }
    if let Some(m) = star.xiang_xin_mutagen {
        marks.push_str(&format!("↑{m}").green().to_string());
    }
    marks
}

fn mutagen_badge(mutagen: Mutagen) -> ColoredString {
    let badge = format!("[{mutagen}]");
    match mutagen {
        Mutagen::Lu => badge.green(),
        Mutagen::Quan => badge.red(),
        Mutagen::Ke => badge.purple(),
        Mutagen::Ji => badge.blue(),
    }
}

/// Colours each stem/branch character by its five-element.
fn color_ganzhi(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let s = ch.to_string();
            match five_element_of(ch) {
                Some(FiveElement::Wood) => s.green().to_string(),
                Some(FiveElement::Fire) => s.red().to_string(),
                Some(FiveElement::Earth) => s.yellow().to_string(),
                Some(FiveElement::Metal) => s.white().to_string(),
                Some(FiveElement::Water) => s.cyan().to_string(),
                None => s,
            }
        })
        .collect()
}

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ziwei_application::ChartService;
    use ziwei_core::BirthInput;
    use ziwei_infrastructure::FileEphemeris;

    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../ziwei-infrastructure/tests/fixtures/astrolabe.json")
    }

    async fn fixture_view() -> ChartView {
        let service = ChartService::new(Box::new(FileEphemeris::new(fixture())));
        let input = BirthInput::parse("1990-06-15", "12:30", "male").unwrap();
        service.build(&input).await.unwrap()
    }

    #[tokio::test]
    async fn test_render_chart_plain() {
        colored::control::set_override(false);
        let view = fixture_view().await;
        let rendered = render_chart(&view);

        assert!(rendered.starts_with("文墨天机紫微斗数命盘\n"));
        assert!(rendered.contains(&format!("四柱 {}", view.chart.chinese_date)));
        assert_eq!(rendered.matches("大限 ").count(), 12);
        assert_eq!(rendered.matches("[身]").count(), 1);

        let body = view.chart.body_palace().unwrap();
        assert!(rendered.contains(&format!(
            "{} {}{} [身]",
            body.name, body.heavenly_stem, body.earthly_branch
        )));
    }

    #[tokio::test]
    async fn test_render_palace_limits_ages() {
        colored::control::set_override(false);
        let view = fixture_view().await;
        let palace = &view.chart.palaces[0];

        let mut out = String::new();
        render_palace(&mut out, palace);

        let expected: Vec<String> = palace.ages.iter().take(6).map(|a| a.to_string()).collect();
        assert!(out.contains(&format!("小限 {}\n", expected.join(" "))));
        assert!(out.contains(&format!(
            "大限 {} - {}",
            palace.decadal.start, palace.decadal.end
        )));
    }

    #[tokio::test]
    async fn test_decadal_timeline_sorted() {
        let view = fixture_view().await;
        let timeline = decadal_timeline(&view);

        assert_eq!(timeline.len(), 12);
        assert!(timeline.windows(2).all(|w| w[0].start_age < w[1].start_age));
        let first = &timeline[0];
        assert_eq!(first.start_year, 1990 + first.start_age as i32 - 1);
    }

    #[test]
    fn test_mutagen_marks_order() {
        colored::control::set_override(false);
        let star = Star::new("紫微", "庙")
            .with_mutagen(Mutagen::Quan)
            .with_self_mutagen(Mutagen::Ke)
            .with_xiang_xin_mutagen(Mutagen::Lu);
        assert_eq!(major_star(&star), "紫微庙[权]↓科↑禄");
        assert_eq!(minor_star(&Star::new("左辅", "")), "左辅");
    }

    #[test]
    fn test_color_ganzhi_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(color_ganzhi("庚午"), "庚午");
    }
}
