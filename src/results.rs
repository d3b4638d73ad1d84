//! Per-license result records, one for every license a match names.

use matcher::{LicenseMatch, MatchDiagnostics};
use serde::{Deserialize, Serialize};

/// The rule behind a [`LicenseResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub identifier: String,
    pub license_choice: bool,
    /// Every license key the rule names, in rule order.
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<MatchDiagnostics>,
}

/// A match seen from one of its licenses.
///
/// Missing optional metadata is reported as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseResult {
    pub key: String,
    pub score: f32,
    pub short_name: String,
    pub category: String,
    pub owner: String,
    pub homepage_url: String,
    pub text_url: String,
    pub reference_url: String,
    pub spdx_license_key: String,
    pub spdx_url: String,
    pub start_line: u32,
    pub end_line: u32,
    pub matched_rule: MatchedRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
}

/// Flatten matches into license results, keeping match order and the order
/// of licenses within each match.
///
/// A license whose `reference_url` is still empty gets it from
/// `reference_url_template`.
pub fn flatten_matches(matches: &[LicenseMatch], reference_url_template: &str) -> Vec<LicenseResult> {
    let mut out = Vec::new();
    for m in matches {
        let matched_rule = MatchedRule {
            identifier: m.rule_identifier.clone(),
            license_choice: m.license_choice,
            licenses: m.license_keys().map(str::to_string).collect(),
            diagnostics: m.diagnostics.clone(),
        };
        for license in &m.licenses {
            let reference_url = if license.reference_url.is_empty() {
                reference_url_template.replace("{}", &license.key)
            } else {
                license.reference_url.clone()
            };
            out.push(LicenseResult {
                key: license.key.clone(),
                score: m.score,
                short_name: license.short_name.clone(),
                category: license.category.clone(),
                owner: license.owner.clone(),
                homepage_url: license.homepage_url.clone().unwrap_or_default(),
                text_url: license.text_url.clone(),
                reference_url,
                spdx_license_key: license.spdx_license_key.clone().unwrap_or_default(),
                spdx_url: license.spdx_url.clone(),
                start_line: m.start_line,
                end_line: m.end_line,
                matched_rule: matched_rule.clone(),
                matched_text: m.matched_text.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcher::{spdx_url, LicenseRef, MatcherStrategy};

    fn license(key: &str, spdx: Option<&str>) -> LicenseRef {
        let text_url = format!("https://example.org/{key}.txt");
        LicenseRef {
            key: key.into(),
            short_name: key.to_uppercase(),
            name: String::new(),
            category: "Copyleft".into(),
            owner: "Free Software Foundation (FSF)".into(),
            homepage_url: None,
            text_urls: vec![text_url.clone()],
            text_url,
            reference_url: String::new(),
            spdx_license_key: spdx.map(str::to_string),
            spdx_url: spdx_url(spdx.unwrap_or_default()),
        }
    }

    fn choice_match() -> LicenseMatch {
        LicenseMatch {
            rule_identifier: "gpl-2.0-plus_or_lgpl.RULE".into(),
            licenses: vec![
                license("gpl-2.0-plus", Some("GPL-2.0+")),
                license("lgpl-2.1", None),
            ],
            license_choice: true,
            score: 87.5,
            coverage: 87.5,
            matched_length: 35,
            rule_length: 40,
            start_line: 3,
            end_line: 7,
            matcher: MatcherStrategy::Approximate,
            matched_text: None,
            diagnostics: None,
        }
    }

    #[test]
    fn one_result_per_license_in_rule_order() {
        let results = flatten_matches(&[choice_match()], "https://db.example/{}");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "gpl-2.0-plus");
        assert_eq!(results[1].key, "lgpl-2.1");
        for r in &results {
            assert_eq!(r.score, 87.5);
            assert_eq!((r.start_line, r.end_line), (3, 7));
            assert!(r.matched_rule.license_choice);
            assert_eq!(r.matched_rule.licenses, ["gpl-2.0-plus", "lgpl-2.1"]);
        }
        assert_eq!(results[0].reference_url, "https://db.example/gpl-2.0-plus");
        assert_eq!(results[0].text_url, "https://example.org/gpl-2.0-plus.txt");
        assert_eq!(results[0].homepage_url, "");
    }

    #[test]
    fn spdx_url_drops_trailing_plus() {
        let results = flatten_matches(&[choice_match()], "{}");
        assert_eq!(results[0].spdx_license_key, "GPL-2.0+");
        assert_eq!(results[0].spdx_url, "https://spdx.org/licenses/GPL-2.0");
        assert_eq!(results[1].spdx_license_key, "");
        assert_eq!(results[1].spdx_url, "");
    }

    #[test]
    fn resolved_reference_url_is_kept() {
        let mut m = choice_match();
        m.licenses[0].resolve_reference_url("https://engine.example/{}");
        let results = flatten_matches(&[m], "https://fallback.example/{}");
        assert_eq!(results[0].reference_url, "https://engine.example/gpl-2.0-plus");
        assert_eq!(results[1].reference_url, "https://fallback.example/lgpl-2.1");
    }

    #[test]
    fn optional_fields_are_skipped_in_json() {
        let results = flatten_matches(&[choice_match()], "{}");
        let json = serde_json::to_value(&results[0]).unwrap();
        assert!(json.get("matched_text").is_none());
        assert!(json["matched_rule"].get("diagnostics").is_none());
        assert_eq!(json["matched_rule"]["identifier"], "gpl-2.0-plus_or_lgpl.RULE");
    }
}
