use super::*;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use canonical::NoTextReason;
use corpus::{CorpusData, LicenseRecord, RuleRecord};
use index::IndexConfig;

use crate::metrics::{set_match_metrics, MatchMetrics};
use crate::types::MatchBudget;

const MIT_TEXT: &str = "Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.";

const MIT_TOKENS: usize = 163;

const GPL_CHOICE: &str = "This program is free software; you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 2 of the License, or
(at your option) version 3.";

const APACHE_NOTICE: &str = "Licensed under the Apache License, Version 2.0 (the \"License\");
you may not use this file except in compliance with the License.";

const MIT_REFERENCE: &str = "This project is distributed under the terms of the MIT license.";

fn corpus_data() -> CorpusData {
    CorpusData {
        licenses: vec![
            LicenseRecord::new("mit")
                .with_short_name("MIT License")
                .with_category("Permissive")
                .with_owner("MIT")
                .with_spdx_license_key("MIT")
                .with_text_url("http://opensource.org/licenses/mit-license.php")
                .with_text(MIT_TEXT),
            LicenseRecord::new("gpl-2.0")
                .with_short_name("GPL 2.0")
                .with_category("Copyleft")
                .with_spdx_license_key("GPL-2.0"),
            LicenseRecord::new("gpl-3.0")
                .with_short_name("GPL 3.0")
                .with_category("Copyleft")
                .with_spdx_license_key("GPL-3.0"),
            LicenseRecord::new("apache-2.0")
                .with_short_name("Apache 2.0")
                .with_category("Permissive")
                .with_spdx_license_key("Apache-2.0"),
        ],
        rules: vec![
            RuleRecord::new("gpl-2.0_or_gpl-3.0.RULE", GPL_CHOICE, ["gpl-2.0", "gpl-3.0"])
                .with_license_choice(true),
            RuleRecord::new("apache-2.0_notice.RULE", APACHE_NOTICE, ["apache-2.0"]),
            RuleRecord::new("mit_reference.RULE", MIT_REFERENCE, ["mit"]).with_relevance(20),
        ],
    }
}

fn matcher_for(data: CorpusData, config: MatcherConfig) -> Matcher {
    let normalize_cfg = NormalizeConfig::default();
    let corpus = Corpus::build(data, &normalize_cfg).expect("corpus builds");
    let index = LicenseIndex::build(corpus.rules(), &IndexConfig::default()).expect("index builds");
    Matcher::new(Arc::new(corpus), Arc::new(index), normalize_cfg, config).expect("matcher")
}

fn matcher() -> Matcher {
    matcher_for(corpus_data(), MatcherConfig::default())
}

fn filler(lines: usize) -> String {
    (1..=lines)
        .map(|i| format!("quokka narwhal {i} axolotl\n"))
        .collect()
}

#[test]
fn unrelated_text_has_no_matches() {
    let report = matcher()
        .match_text(
            "The quick brown fox jumps over the lazy dog.",
            &MatchOptions::default().with_min_score(1.0),
        )
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.truncated, None);
    assert_eq!(report.no_text, None);
}

#[test]
fn verbatim_license_text_is_an_exact_match_with_lines() {
    let doc = format!("{}{}\n{}", filler(9), MIT_TEXT, filler(3));
    let report = matcher().match_text(&doc, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.rule_identifier, "mit.LICENSE");
    assert_eq!(m.license_keys().collect::<Vec<_>>(), ["mit"]);
    assert_eq!(m.coverage, 100.0);
    assert_eq!(m.score, 100.0);
    assert_eq!(m.matcher, MatcherStrategy::Exact);
    assert_eq!(m.rule_length, MIT_TOKENS);
    assert_eq!(m.matched_length, MIT_TOKENS);
    assert_eq!((m.start_line, m.end_line), (10, 25));
}

#[test]
fn two_altered_words_give_one_approximate_match() {
    let altered = MIT_TEXT
        .replace("merge", "combine")
        .replace("furnished", "provided");
    let report = matcher()
        .match_text(&altered, &MatchOptions::default().with_diagnostics(true))
        .unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.rule_identifier, "mit.LICENSE");
    assert_eq!(m.matcher, MatcherStrategy::Approximate);
    assert_eq!(m.matched_length, MIT_TOKENS - 2);
    assert!(m.coverage < 100.0);
    assert!((80.0..=99.0).contains(&m.score), "score {}", m.score);
    assert_eq!((m.start_line, m.end_line), (1, 16));

    let diag = m.diagnostics.as_ref().expect("diagnostics requested");
    assert_eq!(diag.matcher, MatcherStrategy::Approximate);
    assert_eq!(diag.rule_length, MIT_TOKENS);
    assert_eq!(diag.matched_length, MIT_TOKENS - 2);
    assert_eq!(diag.match_coverage, m.coverage);
    assert_eq!(diag.rule_relevance, 100);
}

#[test]
fn low_relevance_rule_scores_its_relevance() {
    let m = matcher();
    let report = m.match_text(MIT_REFERENCE, &MatchOptions::default()).unwrap();
    assert_eq!(report.matches.len(), 1);
    let hit = &report.matches[0];
    assert_eq!(hit.rule_identifier, "mit_reference.RULE");
    assert_eq!(hit.coverage, 100.0);
    assert_eq!(hit.score, 20.0);

    let strict = m
        .match_text(MIT_REFERENCE, &MatchOptions::default().with_min_score(90.0))
        .unwrap();
    assert!(strict.is_empty());
}

#[test]
fn license_choice_is_propagated_in_rule_order() {
    let report = matcher()
        .match_text(GPL_CHOICE, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert!(m.license_choice);
    assert_eq!(m.license_keys().collect::<Vec<_>>(), ["gpl-2.0", "gpl-3.0"]);
    assert_eq!(m.licenses[0].short_name, "GPL 2.0");
    assert_eq!(m.licenses[1].spdx_license_key.as_deref(), Some("GPL-3.0"));
}

#[test]
fn identical_rules_tie_break_on_identifier() {
    let mut data = corpus_data();
    data.rules.push(RuleRecord::new("zz_apache.RULE", APACHE_NOTICE, ["apache-2.0"]));
    data.rules.push(RuleRecord::new("aa_apache.RULE", APACHE_NOTICE, ["apache-2.0"]));
    let report = matcher_for(data, MatcherConfig::default())
        .match_text(APACHE_NOTICE, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].rule_identifier, "aa_apache.RULE");
}

#[test]
fn raising_the_threshold_only_removes_matches() {
    let doc = format!(
        "{MIT_REFERENCE}\n\n{}\n\n{APACHE_NOTICE}\n\n{}",
        GPL_CHOICE,
        MIT_TEXT.replace("merge", "combine")
    );
    let m = matcher();
    let mut previous: Option<Vec<LicenseMatch>> = None;
    for threshold in [0.0, 10.0, 20.0, 50.0, 99.0, 100.0] {
        let report = m
            .match_text(&doc, &MatchOptions::default().with_min_score(threshold))
            .unwrap();
        assert!(report.matches.iter().all(|x| x.score >= threshold));
        if let Some(prev) = &previous {
            for x in &report.matches {
                assert!(prev.contains(x), "{} appeared at {threshold}", x.rule_identifier);
            }
        }
        previous = Some(report.matches);
    }
    let all = m.match_text(&doc, &MatchOptions::default()).unwrap();
    let ids: Vec<&str> = all.matches.iter().map(|x| x.rule_identifier.as_str()).collect();
    assert_eq!(
        ids,
        [
            "mit_reference.RULE",
            "gpl-2.0_or_gpl-3.0.RULE",
            "apache-2.0_notice.RULE",
            "mit.LICENSE"
        ]
    );
}

#[test]
fn repeated_text_yields_one_match_per_occurrence() {
    let doc = format!("{APACHE_NOTICE}\n{}{APACHE_NOTICE}\n", filler(2));
    let report = matcher().match_text(&doc, &MatchOptions::default()).unwrap();
    let lines: Vec<(u32, u32)> = report
        .matches
        .iter()
        .map(|m| (m.start_line, m.end_line))
        .collect();
    assert_eq!(lines, [(1, 2), (5, 6)]);
    assert!(report
        .matches
        .iter()
        .all(|m| m.rule_identifier == "apache-2.0_notice.RULE"));
}

#[test]
fn partial_text_reports_partial_coverage() {
    let first_half: String = MIT_TEXT.lines().take(8).collect::<Vec<_>>().join("\n");
    let report = matcher()
        .match_text(&first_half, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.matcher, MatcherStrategy::Approximate);
    assert!(m.coverage > 30.0 && m.coverage < 60.0, "coverage {}", m.coverage);
    assert_eq!(m.score, m.coverage);
}

#[test]
fn short_rules_match_verbatim_only() {
    let mut data = corpus_data();
    data.rules.push(RuleRecord::new("mit_short.RULE", "MIT license", ["mit"]).with_relevance(50));
    let m = matcher_for(data, MatcherConfig::default());

    let report = m
        .match_text("package metadata: MIT License\n", &MatchOptions::default())
        .unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].rule_identifier, "mit_short.RULE");
    assert_eq!(report.matches[0].matcher, MatcherStrategy::Exact);
    assert_eq!(report.matches[0].score, 50.0);

    let report = m
        .match_text("MIT style license", &MatchOptions::default())
        .unwrap();
    assert!(report.is_empty());
}

#[test]
fn matched_text_is_the_verbatim_region() {
    let doc = format!("header line\n  {APACHE_NOTICE}  \ntrailer\n");
    let report = matcher()
        .match_text(&doc, &MatchOptions::default().with_text(true))
        .unwrap();
    assert_eq!(report.matches[0].matched_text.as_deref(), Some(APACHE_NOTICE.trim_end_matches('.')));

    let without = matcher().match_text(&doc, &MatchOptions::default()).unwrap();
    assert_eq!(without.matches[0].matched_text, None);
    assert_eq!(without.matches[0].diagnostics, None);
}

#[test]
fn alignment_budget_truncates_instead_of_failing() {
    let config = MatcherConfig::default().with_budget(MatchBudget::default().with_max_alignments(1));
    let doc = format!("{APACHE_NOTICE}\n\n{GPL_CHOICE}\n");
    let report = matcher_for(corpus_data(), config)
        .match_text(&doc, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.truncated, Some(Truncation::AlignmentLimit));
    assert_eq!(report.matches.len(), 1);
}

#[test]
fn zero_time_budget_truncates() {
    let config = MatcherConfig::default()
        .with_budget(MatchBudget::unlimited().with_max_elapsed(Some(Duration::ZERO)));
    let report = matcher_for(corpus_data(), config)
        .match_text(APACHE_NOTICE, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.truncated, Some(Truncation::TimeLimit));
    assert!(report.is_empty());
}

#[test]
fn seed_hit_cap_truncates_and_keeps_early_matches() {
    let config = MatcherConfig::default().with_budget(MatchBudget::default().with_max_seed_hits(10));
    let doc = format!("{MIT_TEXT}

{APACHE_NOTICE}
");
    let report = matcher_for(corpus_data(), config)
        .match_text(&doc, &MatchOptions::default())
        .unwrap();
    assert_eq!(report.truncated, Some(Truncation::SeedLimit));
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].rule_identifier, "mit.LICENSE");
    assert_eq!(report.matches[0].coverage, 100.0);
}

#[test]
fn zero_seed_hit_cap_is_invalid() {
    let config = MatcherConfig::default().with_budget(MatchBudget::default().with_max_seed_hits(0));
    assert!(matches!(config.validate(), Err(MatchError::InvalidConfig(_))));
}

#[test]
fn empty_and_binary_inputs_report_no_text() {
    let m = matcher();
    let report = m.match_text("  -- ;; --\n", &MatchOptions::default()).unwrap();
    assert!(report.is_empty());
    assert_eq!(report.no_text, Some(NoTextReason::Empty));

    let report = m.match_bytes(&[0u8, 1, 2, 3, 0, 0], &MatchOptions::default()).unwrap();
    assert_eq!(report.no_text, Some(NoTextReason::Binary));

    let report = m
        .match_bytes(APACHE_NOTICE.as_bytes(), &MatchOptions::default())
        .unwrap();
    assert_eq!(report.matches.len(), 1);
}

#[test]
fn out_of_range_min_score_is_rejected() {
    let err = matcher()
        .match_text(APACHE_NOTICE, &MatchOptions::default().with_min_score(101.0))
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidOptions(_)));
}

#[test]
fn repeated_queries_are_identical() {
    let m = matcher();
    let doc = format!("{GPL_CHOICE}\n{MIT_TEXT}");
    let opts = MatchOptions::default().with_text(true).with_diagnostics(true);
    let first = m.match_text(&doc, &opts).unwrap();
    for _ in 0..3 {
        assert_eq!(m.match_text(&doc, &opts).unwrap(), first);
    }
}

#[test]
fn index_from_another_corpus_is_rejected() {
    let cfg = NormalizeConfig::default();
    let corpus = Corpus::build(corpus_data(), &cfg).unwrap();
    let mut other = corpus_data();
    other.rules.pop();
    let other = Corpus::build(other, &cfg).unwrap();
    let index = LicenseIndex::build(other.rules(), &IndexConfig::default()).unwrap();
    let err = Matcher::new(
        Arc::new(corpus),
        Arc::new(index),
        cfg,
        MatcherConfig::default(),
    )
    .err()
    .expect("mismatch detected");
    assert!(matches!(err, MatchError::IndexMismatch(_)));
}

#[derive(Default)]
struct CountingMetrics {
    calls: AtomicUsize,
    matches: AtomicUsize,
}

impl MatchMetrics for CountingMetrics {
    fn record_match(&self, _latency: Duration, _candidates: usize, matches: usize, _truncated: bool) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.matches.fetch_add(matches, AtomicOrdering::SeqCst);
    }
}

#[test]
fn metrics_recorder_sees_queries() {
    let metrics = Arc::new(CountingMetrics::default());
    let recorder: Arc<dyn MatchMetrics> = metrics.clone();
    set_match_metrics(Some(recorder));
    matcher()
        .match_text(APACHE_NOTICE, &MatchOptions::default())
        .unwrap();
    set_match_metrics(None);
    assert!(metrics.calls.load(AtomicOrdering::SeqCst) >= 1);
    assert!(metrics.matches.load(AtomicOrdering::SeqCst) >= 1);
}
