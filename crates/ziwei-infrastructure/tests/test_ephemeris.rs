use std::path::PathBuf;

use ziwei_core::chart::{Mutagen, compute_chart};
use ziwei_core::{BirthInput, render_tree};
use ziwei_infrastructure::{CommandEphemeris, FileEphemeris};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/astrolabe.json")
}

fn input() -> BirthInput {
    BirthInput::parse("1990-06-15", "12:20", "male").unwrap()
}

#[tokio::test]
async fn test_file_ephemeris_maps_full_chart() {
    let ephemeris = FileEphemeris::new(fixture());
    let chart = compute_chart(&ephemeris, &input()).await.expect("chart");

    assert_eq!(chart.palaces.len(), 12);
    assert_eq!(chart.pillars().unwrap(), ["庚午", "壬午", "丙子", "甲午"]);
    assert_eq!(chart.body_palace().unwrap().name, "官禄");

    let ming = &chart.palaces[4];
    assert_eq!(ming.name, "命宫");
    assert_eq!(ming.major_stars[0].mutagen, Some(Mutagen::Ke));
    assert_eq!(ming.major_stars[0].self_mutagen, Some(Mutagen::Ji));
    assert_eq!(ming.decadal.start, 4);
    assert_eq!(ming.decadal.end, 13);
    assert_eq!(ming.ages.len(), 10);
}

#[tokio::test]
async fn test_fixture_renders_canonical_lines() {
    let ephemeris = FileEphemeris::new(fixture());
    let chart = compute_chart(&ephemeris, &input()).await.unwrap();
    let text = render_tree(&chart, &input());

    assert!(text.contains(" │ └身主:天梁; 命主:破军; 子年斗君:巳; 身宫:戌\n"));
    assert!(text.contains(" │ ├出生时间(时:分) : 12:20\n"));
    assert!(text.contains(" ├命宫宫[壬午]\n │ ├主星 : 紫微[庙][生年科]\n"));
    assert!(text.contains(" ├夫妻宫[庚辰]\n │ ├主星 : 天同[平](↑:禄)\n"));
    assert!(text.contains(" ├子女宫[己卯]\n │ ├主星 : 无\n │ ├辅星 : 无\n │ ├小星 : 天刑\n"));
    assert!(text.contains(" │ ├主星 : 廉贞[庙], 天府[庙]\n"));
    assert!(text.contains(" │ ├小限 : 5,17,29,41,53,65,77,89,101,113虚岁\n"));
    assert_eq!(text, render_tree(&chart, &input()));
}

#[tokio::test]
async fn test_missing_file_is_ephemeris_unavailable() {
    let ephemeris = FileEphemeris::new(PathBuf::from("/nonexistent/chart.json"));
    let err = compute_chart(&ephemeris, &input()).await.unwrap_err();
    assert!(err.is_ephemeris_unavailable());
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_ephemeris_reads_stdout() {
    let script = format!("cat > /dev/null; cat '{}'", fixture().display());
    let ephemeris = CommandEphemeris::new("sh", vec!["-c".into(), script]);
    let chart = compute_chart(&ephemeris, &input()).await.expect("chart");
    assert_eq!(chart.five_elements_class, "水二局");
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_ephemeris_failure_carries_stderr() {
    let ephemeris = CommandEphemeris::new(
        "sh",
        vec!["-c".into(), "cat > /dev/null; echo boom >&2; exit 3".into()],
    );
    let err = compute_chart(&ephemeris, &input()).await.unwrap_err();
    assert!(err.is_ephemeris_unavailable());
    assert!(err.to_string().contains("boom"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_ephemeris_receives_request_json() {
    // Echo the request back inside an otherwise empty chart so the test can
    // inspect what was sent; the chart itself fails validation.
    let script = r#"req=$(cat); printf '{"gender":"男","solarDate":"x","lunarDate":%s,"palaces":[]}' "$req""#;
    let ephemeris = CommandEphemeris::new("sh", vec!["-c".into(), script.into()]);
    let request = ziwei_core::chart::EphemerisRequest::from_input(&input());
    let chart = ziwei_core::Ephemeris::compute_by_gregorian(&ephemeris, &request)
        .await
        .unwrap();

    let echoed: serde_json::Value = serde_json::from_str(&chart.lunar_date).unwrap();
    assert_eq!(echoed["solarDate"], "1990-06-15");
    assert_eq!(echoed["timeIndex"], 6);
    assert_eq!(echoed["gender"], "男");
    assert_eq!(echoed["fixTrueSolarTime"], true);
    assert_eq!(echoed["locale"], "zh-CN");
}

#[cfg(unix)]
#[tokio::test]
async fn test_configured_command_sends_request_unchanged() {
    let script = r#"req=$(cat); printf '{"gender":"男","solarDate":"x","lunarDate":%s,"palaces":[]}' "$req""#;
    let settings: ziwei_core::config::EphemerisSettings = toml::from_str(&format!(
        "command = \"sh\"\nargs = [\"-c\", {script:?}]\nfix_true_solar_time = false\nlocale = \"en-US\"\n"
    ))
    .unwrap();
    let ephemeris = CommandEphemeris::from_settings(&settings);

    let request = ziwei_core::chart::EphemerisRequest::from_input(&input());
    let chart = ziwei_core::Ephemeris::compute_by_gregorian(&ephemeris, &request)
        .await
        .unwrap();

    let echoed: ziwei_core::chart::EphemerisRequest =
        serde_json::from_str(&chart.lunar_date).unwrap();
    assert_eq!(echoed, request);
    assert!(echoed.fix_true_solar_time);
    assert_eq!(echoed.locale, "zh-CN");
}
