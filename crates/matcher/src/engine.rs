use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use canonical::{decode_bytes, normalize, CanonicalError, NormalizeConfig, NormalizedText};
use corpus::{Corpus, Rule, RuleId};
use hashbrown::HashMap;
use index::LicenseIndex;
use tracing::{debug, info, Level};

use crate::metrics::metrics_recorder;
use crate::types::{
    LicenseMatch, LicenseRef, MatchBudget, MatchDiagnostics, MatchError, MatchOptions,
    MatchReport, MatcherConfig, MatcherStrategy, Truncation,
};

mod align;
#[cfg(test)]
mod tests;

use align::{align, exact_at, Alignment};

/// Matches documents against every rule of one corpus.
///
/// Holds shared, read-only handles only; any number of threads may call
/// [`Matcher::match_text`] concurrently.
pub struct Matcher {
    corpus: Arc<Corpus>,
    index: Arc<LicenseIndex>,
    normalize_cfg: NormalizeConfig,
    config: MatcherConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hit {
    qpos: u32,
    rpos: u32,
}

/// Seed hits grouped by rule, bounded by the query budget.
struct SeedHits {
    by_rule: HashMap<RuleId, Vec<Hit>>,
    total: usize,
    max_hits: usize,
    time_limit: Option<Duration>,
    started: Instant,
    truncated: Option<Truncation>,
}

impl SeedHits {
    fn new(budget: &MatchBudget, started: Instant) -> Self {
        Self {
            by_rule: HashMap::new(),
            total: 0,
            max_hits: budget.max_seed_hits,
            time_limit: budget.max_elapsed(),
            started,
            truncated: None,
        }
    }

    /// Record one hit; `false` once the budget is spent.
    fn push(&mut self, rule: RuleId, qpos: usize, rpos: u32) -> bool {
        if self.total >= self.max_hits {
            self.truncated = Some(Truncation::SeedLimit);
            return false;
        }
        if self.total % CLOCK_CHECK_INTERVAL == 0
            && self
                .time_limit
                .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            self.truncated = Some(Truncation::TimeLimit);
            return false;
        }
        self.by_rule.entry(rule).or_default().push(Hit {
            qpos: qpos as u32,
            rpos,
        });
        self.total += 1;
        true
    }
}

/// Seed hits collected between wall-clock checks.
const CLOCK_CHECK_INTERVAL: usize = 4096;

/// A rule with at least one seed hit.
#[derive(Debug)]
struct Candidate {
    rule: RuleId,
    hits: Vec<Hit>,
}

#[derive(Debug)]
struct Aligned {
    rule: RuleId,
    alignment: Alignment,
}

#[derive(Debug)]
struct Scored<'a> {
    rule: &'a Rule,
    query: Range<usize>,
    matched: usize,
    coverage: f32,
    score: f32,
    strategy: MatcherStrategy,
}

impl Matcher {
    /// Construct a matcher over a corpus and the index built from its rules.
    pub fn new(
        corpus: Arc<Corpus>,
        index: Arc<LicenseIndex>,
        normalize_cfg: NormalizeConfig,
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        normalize_cfg.validate()?;
        if index.rule_count() != corpus.rules().len() {
            return Err(MatchError::IndexMismatch(format!(
                "index has {} rules, corpus has {}",
                index.rule_count(),
                corpus.rules().len()
            )));
        }
        if let Some(rule) = corpus
            .rules()
            .iter()
            .find(|r| index.rule_tokens(r.id()).map(<[u32]>::len) != Some(r.len()))
        {
            return Err(MatchError::IndexMismatch(format!(
                "rule `{}` has a different length in the index",
                rule.identifier()
            )));
        }
        Ok(Self {
            corpus,
            index,
            normalize_cfg,
            config,
        })
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn index(&self) -> &Arc<LicenseIndex> {
        &self.index
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Decode raw bytes and match them. Binary or empty content yields an
    /// empty report with `no_text` set.
    pub fn match_bytes(&self, bytes: &[u8], opts: &MatchOptions) -> Result<MatchReport, MatchError> {
        opts.validate()?;
        match decode_bytes(bytes) {
            Ok(text) => self.match_text(&text, opts),
            Err(CanonicalError::NoTextContent(reason)) => {
                debug!(%reason, "no_text_content");
                Ok(MatchReport::no_text(reason))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run the full pipeline over one text:
    /// tokenize → seed → align → score → filter → resolve overlaps → emit.
    pub fn match_text(&self, text: &str, opts: &MatchOptions) -> Result<MatchReport, MatchError> {
        opts.validate()?;
        let started = Instant::now();
        let span = tracing::span!(Level::DEBUG, "matcher.match", bytes = text.len());
        let _guard = span.enter();

        let doc = match normalize(text, &self.normalize_cfg) {
            Ok(doc) => doc,
            Err(CanonicalError::NoTextContent(reason)) => {
                debug!(%reason, "no_text_content");
                self.record(started, 0, 0, false);
                return Ok(MatchReport::no_text(reason));
            }
            Err(e) => return Err(e.into()),
        };
        let query = self.index.tokenize_query(&doc);

        let (candidates, seed_truncated) = self.seed(&query, started);
        let (aligned, align_truncated) = self.align_candidates(&query, &candidates, started);
        let truncated = seed_truncated.or(align_truncated);
        let scored: Vec<Scored<'_>> = aligned
            .iter()
            .filter_map(|a| self.score(a))
            .filter(|s| s.score >= opts.min_score)
            .collect();
        let kept = resolve_overlaps(scored);
        let matches = self.emit(kept, &doc, text, opts);

        if let Some(reason) = truncated {
            debug!(?reason, aligned = aligned.len(), "match_truncated");
        }
        info!(
            tokens = query.len(),
            candidates = candidates.len(),
            matches = matches.len(),
            truncated = truncated.is_some(),
            "match_complete"
        );
        self.record(started, candidates.len(), matches.len(), truncated.is_some());

        Ok(MatchReport {
            matches,
            truncated,
            no_text: None,
        })
    }

    fn record(&self, started: Instant, candidates: usize, matches: usize, truncated: bool) {
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(started.elapsed(), candidates, matches, truncated);
        }
    }

    /// Collect seed hits per rule, ordered by hit count (desc) then rule id.
    ///
    /// Stops early once `max_seed_hits` hits are held or the time limit
    /// passes; the hits gathered so far still become candidates.
    fn seed(&self, query: &[u32], started: Instant) -> (Vec<Candidate>, Option<Truncation>) {
        let mut hits = SeedHits::new(&self.config.budget, started);

        'windows: for (qpos, fp) in self.index.query_windows(query).into_iter().enumerate() {
            for posting in self.index.seed(fp) {
                if !hits.push(posting.rule, qpos, posting.pos) {
                    break 'windows;
                }
            }
        }
        if hits.truncated.is_none() {
            'short: for len in self.index.short_lengths() {
                if len > query.len() {
                    break;
                }
                for (qpos, fp) in self
                    .index
                    .query_windows_of_len(query, len)
                    .into_iter()
                    .enumerate()
                {
                    for &rule in self.index.seed_short(len, fp) {
                        if !hits.push(rule, qpos, 0) {
                            break 'short;
                        }
                    }
                }
            }
        }
        let SeedHits {
            by_rule,
            total,
            truncated,
            ..
        } = hits;
        if let Some(reason) = truncated {
            debug!(?reason, hits = total, "seed_truncated");
        }

        let mut candidates: Vec<Candidate> = by_rule
            .into_iter()
            .map(|(rule, hits)| Candidate { rule, hits })
            .collect();
        candidates.sort_by(|a, b| {
            b.hits
                .len()
                .cmp(&a.hits.len())
                .then_with(|| a.rule.cmp(&b.rule))
        });
        debug!(candidates = candidates.len(), "seed_complete");
        (candidates, truncated)
    }

    /// Extend seeds into alignments until the candidates or the budget run out.
    fn align_candidates(
        &self,
        query: &[u32],
        candidates: &[Candidate],
        started: Instant,
    ) -> (Vec<Aligned>, Option<Truncation>) {
        let k = self.index.config().k;
        let budget = &self.config.budget;
        let time_limit = budget.max_elapsed();
        let mut attempts = 0usize;
        let mut out = Vec::new();

        for candidate in candidates {
            let Some(rule) = self.index.rule_tokens(candidate.rule) else {
                continue;
            };
            let max_edits = self.config.max_edits(rule.len());
            let mut spans: Vec<Range<usize>> = Vec::new();
            for hit in order_hits(&candidate.hits) {
                let qpos = hit.qpos as usize;
                if spans.iter().any(|s| s.contains(&qpos)) {
                    continue;
                }
                if attempts >= budget.max_alignments {
                    return (out, Some(Truncation::AlignmentLimit));
                }
                if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                    return (out, Some(Truncation::TimeLimit));
                }
                attempts += 1;

                let alignment = if rule.len() < k {
                    exact_at(query, rule, qpos)
                } else {
                    align(
                        query,
                        rule,
                        qpos,
                        hit.rpos as usize,
                        k,
                        max_edits,
                        self.config.sync_tokens,
                    )
                };
                if let Some(alignment) = alignment {
                    spans.push(alignment.query.clone());
                    out.push(Aligned {
                        rule: candidate.rule,
                        alignment,
                    });
                }
            }
        }
        (out, None)
    }

    fn score(&self, aligned: &Aligned) -> Option<Scored<'_>> {
        let rule = self.corpus.rules().get(aligned.rule)?;
        let a = &aligned.alignment;
        let rule_len = rule.len();
        if rule_len == 0 {
            return None;
        }
        if a.matched < rule_len && a.matched < self.config.min_matched_tokens {
            return None;
        }
        let coverage = round2((a.matched as f64 * 100.0 / rule_len as f64).min(100.0));
        let score = round2(coverage * f64::from(rule.relevance()) / 100.0).clamp(0.0, 100.0);
        let strategy = if a.matched == rule_len && a.edits == 0 {
            MatcherStrategy::Exact
        } else {
            MatcherStrategy::Approximate
        };
        Some(Scored {
            rule,
            query: a.query.clone(),
            matched: a.matched,
            coverage: coverage as f32,
            score: score as f32,
            strategy,
        })
    }

    fn emit(
        &self,
        kept: Vec<Scored<'_>>,
        doc: &NormalizedText,
        text: &str,
        opts: &MatchOptions,
    ) -> Vec<LicenseMatch> {
        let mut located: Vec<(usize, LicenseMatch)> = Vec::with_capacity(kept.len());
        for s in kept {
            let Some((start_line, end_line)) = doc.line_span(s.query.clone()) else {
                continue;
            };
            let licenses = s
                .rule
                .licenses()
                .iter()
                .filter_map(|key| self.corpus.licenses().get(key).ok())
                .map(LicenseRef::from)
                .collect();
            let matched_text = if opts.include_text {
                doc.source_text(text, s.query.clone()).map(str::to_owned)
            } else {
                None
            };
            let diagnostics = opts.diagnostics.then(|| MatchDiagnostics {
                matcher: s.strategy,
                rule_length: s.rule.len(),
                matched_length: s.matched,
                match_coverage: s.coverage,
                rule_relevance: s.rule.relevance(),
            });
            located.push((
                s.query.start,
                LicenseMatch {
                    rule_identifier: s.rule.identifier().to_string(),
                    licenses,
                    license_choice: s.rule.license_choice(),
                    score: s.score,
                    coverage: s.coverage,
                    matched_length: s.matched,
                    rule_length: s.rule.len(),
                    start_line,
                    end_line,
                    matcher: s.strategy,
                    matched_text,
                    diagnostics,
                },
            ));
        }
        located.sort_by(|(qa, a), (qb, b)| {
            a.start_line
                .cmp(&b.start_line)
                .then_with(|| b.score.total_cmp(&a.score))
                .then_with(|| a.rule_identifier.cmp(&b.rule_identifier))
                .then_with(|| qa.cmp(qb))
        });
        located.into_iter().map(|(_, m)| m).collect()
    }
}

/// Hits of one rule, best diagonal first.
///
/// A diagonal is `qpos - rpos`; hits on the most populated diagonal are the
/// most likely start of a long alignment. Ties go to the earlier query position.
fn order_hits(hits: &[Hit]) -> Vec<Hit> {
    let diagonal = |h: &Hit| i64::from(h.qpos) - i64::from(h.rpos);
    let mut support: HashMap<i64, usize> = HashMap::new();
    for hit in hits {
        *support.entry(diagonal(hit)).or_default() += 1;
    }
    let mut ordered = hits.to_vec();
    ordered.sort_by(|a, b| {
        let sa = support.get(&diagonal(a)).copied().unwrap_or(0);
        let sb = support.get(&diagonal(b)).copied().unwrap_or(0);
        sb.cmp(&sa)
            .then_with(|| a.qpos.cmp(&b.qpos))
            .then_with(|| a.rpos.cmp(&b.rpos))
    });
    ordered
}

/// Greedy selection over score, coverage, rule length, identifier and query
/// position. A match is kept unless its query span overlaps a kept one.
fn resolve_overlaps(mut scored: Vec<Scored<'_>>) -> Vec<Scored<'_>> {
    scored.sort_by(compare_scored);
    let mut kept: Vec<Scored<'_>> = Vec::with_capacity(scored.len());
    for s in scored {
        let overlaps = kept
            .iter()
            .any(|k| s.query.start < k.query.end && k.query.start < s.query.end);
        if !overlaps {
            kept.push(s);
        }
    }
    kept
}

fn compare_scored(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.coverage.total_cmp(&a.coverage))
        .then_with(|| b.rule.len().cmp(&a.rule.len()))
        .then_with(|| a.rule.identifier().cmp(b.rule.identifier()))
        .then_with(|| a.query.start.cmp(&b.query.start))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
