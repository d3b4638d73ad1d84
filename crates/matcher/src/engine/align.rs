//! Bounded-edit extension of a seed hit in both directions.
//!
//! A seed is a window of `k` tokens where query and rule agree. From there
//! the alignment walks outwards one token at a time. On a mismatch it looks
//! for the cheapest gap `(dq, dr)` (skip `dq` query tokens and `dr` rule
//! tokens, cost `max(dq, dr)`) after which `sync` tokens agree again, as
//! long as the total cost stays within the edit budget.

use std::ops::Range;

/// Token ids read forwards or backwards.
#[derive(Clone, Copy)]
struct View<'a> {
    ids: &'a [u32],
    reversed: bool,
}

impl<'a> View<'a> {
    fn forward(ids: &'a [u32]) -> Self {
        Self {
            ids,
            reversed: false,
        }
    }

    fn backward(ids: &'a [u32]) -> Self {
        Self {
            ids,
            reversed: true,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    fn get(&self, i: usize) -> u32 {
        if self.reversed {
            self.ids[self.ids.len() - 1 - i]
        } else {
            self.ids[i]
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Extension {
    matched: usize,
    /// Consumed up to and including the last matched token.
    query_len: usize,
    rule_len: usize,
    edits: usize,
}

/// A seed extended into a query span and a rule span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Alignment {
    pub query: Range<usize>,
    pub rule: Range<usize>,
    pub matched: usize,
    pub edits: usize,
}

/// Align `rule` against `query` starting from a `k`-token seed at
/// `(qpos, rpos)`. Returns `None` when the seed windows do not actually
/// agree (a fingerprint collision).
pub(crate) fn align(
    query: &[u32],
    rule: &[u32],
    qpos: usize,
    rpos: usize,
    k: usize,
    max_edits: usize,
    sync: usize,
) -> Option<Alignment> {
    if qpos + k > query.len() || rpos + k > rule.len() {
        return None;
    }
    if query[qpos..qpos + k] != rule[rpos..rpos + k] {
        return None;
    }
    let fwd = extend(
        View::forward(&query[qpos + k..]),
        View::forward(&rule[rpos + k..]),
        max_edits,
        sync,
    );
    let back = extend(
        View::backward(&query[..qpos]),
        View::backward(&rule[..rpos]),
        max_edits.saturating_sub(fwd.edits),
        sync,
    );
    Some(Alignment {
        query: qpos - back.query_len..qpos + k + fwd.query_len,
        rule: rpos - back.rule_len..rpos + k + fwd.rule_len,
        matched: k + fwd.matched + back.matched,
        edits: fwd.edits + back.edits,
    })
}

/// Verbatim occurrence of a whole rule at `qpos`.
pub(crate) fn exact_at(query: &[u32], rule: &[u32], qpos: usize) -> Option<Alignment> {
    let end = qpos.checked_add(rule.len())?;
    if rule.is_empty() || end > query.len() || query[qpos..end] != *rule {
        return None;
    }
    Some(Alignment {
        query: qpos..end,
        rule: 0..rule.len(),
        matched: rule.len(),
        edits: 0,
    })
}

fn extend(query: View<'_>, rule: View<'_>, budget: usize, sync: usize) -> Extension {
    let mut ext = Extension::default();
    let (mut qi, mut ri) = (0usize, 0usize);
    let mut edits = 0usize;
    while qi < query.len() && ri < rule.len() {
        if query.get(qi) == rule.get(ri) {
            qi += 1;
            ri += 1;
            ext.matched += 1;
            ext.query_len = qi;
            ext.rule_len = ri;
            ext.edits = edits;
            continue;
        }
        match resync(query, rule, qi, ri, budget - edits, sync) {
            Some((dq, dr)) => {
                edits += dq.max(dr);
                qi += dq;
                ri += dr;
            }
            None => break,
        }
    }
    ext
}

/// Cheapest gap after which alignment can resume. Substitutions are tried
/// before indels of the same cost.
fn resync(
    query: View<'_>,
    rule: View<'_>,
    qi: usize,
    ri: usize,
    remaining: usize,
    sync: usize,
) -> Option<(usize, usize)> {
    for cost in 1..=remaining {
        if qi + cost >= query.len() && ri + cost >= rule.len() {
            break;
        }
        if agrees(query, rule, qi + cost, ri + cost, sync) {
            return Some((cost, cost));
        }
        for other in (0..cost).rev() {
            if agrees(query, rule, qi + cost, ri + other, sync) {
                return Some((cost, other));
            }
            if agrees(query, rule, qi + other, ri + cost, sync) {
                return Some((other, cost));
            }
        }
    }
    None
}

/// Whether `sync` tokens agree from `(qa, ra)`. Near the end of the rule
/// the remaining rule tokens are enough.
fn agrees(query: View<'_>, rule: View<'_>, qa: usize, ra: usize, sync: usize) -> bool {
    if qa >= query.len() || ra >= rule.len() {
        return false;
    }
    let n = sync.min(rule.len() - ra);
    if qa + n > query.len() {
        return false;
    }
    (0..n).all(|i| query.get(qa + i) == rule.get(ra + i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(range: Range<u32>) -> Vec<u32> {
        range.collect()
    }

    #[test]
    fn verbatim_rule_aligns_fully() {
        let rule = seq(1..21);
        let mut query = vec![900, 901];
        query.extend(&rule);
        query.push(902);
        let a = align(&query, &rule, 2, 0, 4, 2, 2).unwrap();
        assert_eq!(a.query, 2..22);
        assert_eq!(a.rule, 0..20);
        assert_eq!(a.matched, 20);
        assert_eq!(a.edits, 0);
    }

    #[test]
    fn seed_in_the_middle_extends_backwards() {
        let rule = seq(1..21);
        let a = align(&rule, &rule, 8, 8, 4, 2, 2).unwrap();
        assert_eq!(a.query, 0..20);
        assert_eq!(a.matched, 20);
    }

    #[test]
    fn substitution_costs_one_edit() {
        let rule = seq(1..11);
        let mut query = rule.clone();
        query[5] = 99;
        let a = align(&query, &rule, 0, 0, 4, 1, 2).unwrap();
        assert_eq!(a.query, 0..10);
        assert_eq!(a.rule, 0..10);
        assert_eq!(a.matched, 9);
        assert_eq!(a.edits, 1);
    }

    #[test]
    fn missing_query_token_is_a_rule_skip() {
        let rule = seq(1..11);
        let query: Vec<u32> = rule.iter().copied().filter(|&t| t != 6).collect();
        let a = align(&query, &rule, 0, 0, 4, 1, 2).unwrap();
        assert_eq!(a.query, 0..9);
        assert_eq!(a.rule, 0..10);
        assert_eq!(a.matched, 9);
        assert_eq!(a.edits, 1);
    }

    #[test]
    fn extra_query_tokens_are_skipped() {
        let rule = seq(1..11);
        let mut query = rule.clone();
        query.insert(6, 77);
        query.insert(6, 78);
        let a = align(&query, &rule, 0, 0, 4, 2, 2).unwrap();
        assert_eq!(a.query, 0..12);
        assert_eq!(a.matched, 10);
        assert_eq!(a.edits, 2);
    }

    #[test]
    fn exhausted_budget_stops_at_last_matched_token() {
        let rule = seq(1..21);
        let mut query = rule.clone();
        query[6] = 99;
        query[14] = 98;
        let a = align(&query, &rule, 0, 0, 4, 1, 2).unwrap();
        assert_eq!(a.query, 0..14);
        assert_eq!(a.matched, 13);
        assert_eq!(a.edits, 1);
    }

    #[test]
    fn trailing_noise_is_not_counted_as_edits() {
        let rule = seq(1..9);
        let mut query = seq(1..7);
        query.extend([50, 51, 52]);
        let a = align(&query, &rule, 0, 0, 4, 3, 2).unwrap();
        assert_eq!(a.query, 0..6);
        assert_eq!(a.matched, 6);
        assert_eq!(a.edits, 0);
    }

    #[test]
    fn collision_seed_is_rejected() {
        let rule = seq(1..9);
        let query = seq(100..108);
        assert!(align(&query, &rule, 0, 0, 4, 1, 2).is_none());
        assert!(align(&query, &rule, 6, 0, 4, 1, 2).is_none());
    }

    #[test]
    fn exact_occurrence() {
        let query = vec![5, 1, 2, 6];
        assert_eq!(
            exact_at(&query, &[1, 2], 1).map(|a| a.query),
            Some(1..3)
        );
        assert!(exact_at(&query, &[1, 2], 2).is_none());
        assert!(exact_at(&query, &[1, 2], 3).is_none());
    }
}
