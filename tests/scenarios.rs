//! End-to-end matching scenarios through `LicenseEngine::match_location`.

mod common;

use std::fs;

use common::{filler, in_memory, APACHE_NOTICE, GPL_CHOICE, MIT_REFERENCE, MIT_TEXT};
use licscan::{EngineConfig, LicenseEngine, MatchOptions, MatcherStrategy};
use tempfile::TempDir;

fn engine() -> LicenseEngine {
    LicenseEngine::init(&EngineConfig::default(), &in_memory(), None).expect("engine init")
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn non_license_file_has_no_matches() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "main.c",
        "int main(void) {\n    return printf(\"hello world\\n\");\n}\n",
    );
    let report = engine()
        .match_location(&path, &MatchOptions::default().with_min_score(1.0))
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.no_text, None);
}

#[test]
fn embedded_mit_text_is_found_on_its_lines() {
    let dir = TempDir::new().unwrap();
    let content = format!("{}{}\n{}", filler(9), MIT_TEXT, filler(4));
    let path = write(&dir, "LICENSE.txt", &content);

    let report = engine().match_location(&path, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.rule_identifier, "mit.LICENSE");
    assert_eq!(m.matcher, MatcherStrategy::Exact);
    assert_eq!((m.coverage, m.score), (100.0, 100.0));
    assert_eq!((m.start_line, m.end_line), (10, 25));
}

#[test]
fn lightly_edited_mit_is_an_approximate_match() {
    let dir = TempDir::new().unwrap();
    let edited = MIT_TEXT
        .replace("merge", "combine")
        .replace("furnished", "provided");
    let path = write(&dir, "COPYING", &format!("{}{edited}", filler(4)));

    let report = engine().match_location(&path, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.matcher, MatcherStrategy::Approximate);
    assert!(m.coverage < 100.0);
    assert!((80.0..=99.0).contains(&m.score), "score {}", m.score);
    assert_eq!((m.start_line, m.end_line), (5, 20));
}

#[test]
fn match_licenses_carry_resolved_urls() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "LICENSE", MIT_TEXT);

    let report = engine().match_location(&path, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    let mit = &report.matches[0].licenses[0];
    assert_eq!(mit.key, "mit");
    assert_eq!(
        mit.reference_url,
        "https://enterprise.dejacode.com/urn/urn:dje:license:mit"
    );
    assert_eq!(mit.text_url, "http://opensource.org/licenses/mit-license.php");
    assert_eq!(mit.spdx_url, "https://spdx.org/licenses/MIT");

    let json = serde_json::to_value(mit).unwrap();
    for field in [
        "key",
        "short_name",
        "category",
        "owner",
        "homepage_url",
        "reference_url",
        "text_url",
        "spdx_license_key",
        "spdx_url",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
}

#[test]
fn reference_rule_scores_its_relevance() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "README.md", &format!("# Project\n\n{MIT_REFERENCE}\n"));
    let engine = engine();

    let report = engine.match_location(&path, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].score, 20.0);
    assert_eq!(report.matches[0].start_line, 3);

    let strict = engine
        .match_location(&path, &MatchOptions::default().with_min_score(90.0))
        .unwrap();
    assert!(strict.is_empty());
}

#[test]
fn license_choice_yields_one_result_per_license() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "hello.c", &format!("/*\n{GPL_CHOICE}\n*/\n"));

    let results = engine()
        .license_results(&path, &MatchOptions::default().with_diagnostics(true))
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].key, "gpl-2.0");
    assert_eq!(results[1].key, "gpl-3.0");
    for r in &results {
        assert!(r.matched_rule.license_choice);
        assert_eq!(r.matched_rule.identifier, "gpl-2.0_or_gpl-3.0.RULE");
        assert_eq!((r.start_line, r.end_line), (2, 5));
        let diag = r.matched_rule.diagnostics.as_ref().expect("diagnostics");
        assert_eq!(diag.rule_relevance, 100);
    }
    assert_eq!(results[0].spdx_url, "https://spdx.org/licenses/GPL-2.0");
    assert_eq!(
        results[1].reference_url,
        "https://enterprise.dejacode.com/urn/urn:dje:license:gpl-3.0"
    );
    assert_eq!(results[0].owner, "Free Software Foundation (FSF)");
}

#[test]
fn several_notices_come_back_in_line_order() {
    let dir = TempDir::new().unwrap();
    let content = format!("{APACHE_NOTICE}\n\n{GPL_CHOICE}\n\n{MIT_TEXT}\n");
    let path = write(&dir, "NOTICE", &content);

    let report = engine()
        .match_location(&path, &MatchOptions::default().with_text(true))
        .unwrap();
    let ids: Vec<&str> = report
        .matches
        .iter()
        .map(|m| m.rule_identifier.as_str())
        .collect();
    assert_eq!(
        ids,
        ["apache-2.0_notice.RULE", "gpl-2.0_or_gpl-3.0.RULE", "mit.LICENSE"]
    );
    assert!(report
        .matches
        .windows(2)
        .all(|w| w[0].end_line < w[1].start_line));
    assert_eq!(
        report.matches[0].matched_text.as_deref(),
        Some(APACHE_NOTICE.trim_end_matches('.'))
    );
}

#[test]
fn reference_url_template_is_configurable() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "NOTICE", APACHE_NOTICE);
    let cfg = EngineConfig::default().with_reference_url_template("https://licenses.example/{}.html");
    let engine = LicenseEngine::init(&cfg, &in_memory(), None).unwrap();

    let results = engine.license_results(&path, &MatchOptions::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].reference_url, "https://licenses.example/apache-2.0.html");
    assert_eq!(results[0].text_url, "");
}
