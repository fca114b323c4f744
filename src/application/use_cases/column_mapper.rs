// ============================================================
// COLUMN MAPPER
// ============================================================
// Score header strings against per-field synonym tables and assign
// at most one column per target field.

use strsim::jaro_winkler;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::domain::boq::{ColumnMapping, TargetField};
use crate::domain::mapping_config::MappingConfig;

/// Normalize a header or synonym for matching: trim, strip quotes, fold
/// diacritics, lowercase, collapse separator runs to single spaces.
pub fn normalize_header(s: &str) -> String {
    let folded: String = s
        .trim()
        .trim_matches('"')
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(folded.len());
    for ch in folded.to_lowercase().chars() {
        let is_separator = ch.is_whitespace() || matches!(ch, '-' | '_' | '/' | '.' | ':' | '(' | ')');
        if is_separator {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out.trim_end().to_string()
}

/// Similarity of one normalized header against one normalized synonym.
///
/// Tiers: exact match 1.0, synonym present as a whole token 0.9, synonym
/// substring 0.8, otherwise Jaro-Winkler. Only an exact match can reach
/// 1.0, which keeps the exact-synonym confidence property intact.
fn synonym_score(header: &str, synonym: &str) -> f64 {
    if header.is_empty() || synonym.is_empty() {
        return 0.0;
    }
    if header == synonym {
        return 1.0;
    }
    if header.split(' ').any(|token| token == synonym) {
        return 0.9;
    }
    if synonym.chars().count() >= 3 && header.contains(synonym) {
        return 0.8;
    }
    jaro_winkler(header, synonym)
}

pub struct ColumnMapper {
    config: MappingConfig,
}

impl ColumnMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    /// Produce one `ColumnMapping` per target field, in field order.
    ///
    /// Assignment is greedy: required fields first, then optional, each
    /// group drained in descending best-remaining-confidence order so a
    /// strong match is never stolen by a weaker field. Column indices in
    /// the result are pairwise distinct.
    pub fn map_columns(&self, headers: &[String]) -> Vec<ColumnMapping> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

        // Score matrix: per field, per column, max over the field's synonyms.
        let mut scores: Vec<(TargetField, Vec<f64>)> = Vec::with_capacity(TargetField::ALL.len());
        for field in TargetField::ALL {
            let synonyms: Vec<String> = self
                .config
                .synonyms_for(field)
                .iter()
                .map(|s| normalize_header(s))
                .collect();
            let per_column: Vec<f64> = normalized
                .iter()
                .map(|header| {
                    synonyms
                        .iter()
                        .map(|syn| synonym_score(header, syn))
                        .fold(0.0, f64::max)
                })
                .collect();
            scores.push((field, per_column));
        }

        let mut claimed = vec![false; headers.len()];
        let mut assigned: Vec<(TargetField, Option<(usize, f64)>)> = Vec::new();

        for required_pass in [true, false] {
            let mut remaining: Vec<usize> = scores
                .iter()
                .enumerate()
                .filter(|(_, (field, _))| field.is_required() == required_pass)
                .map(|(i, _)| i)
                .collect();

            while !remaining.is_empty() {
                // Pick the remaining field with the strongest unclaimed column.
                let mut pick = 0usize;
                let mut pick_best: Option<(usize, f64)> = None;
                for (slot, &score_idx) in remaining.iter().enumerate() {
                    let best = best_unclaimed(&scores[score_idx].1, &claimed);
                    let better = match (best, pick_best) {
                        (Some((_, s)), Some((_, ps))) => s > ps,
                        (Some(_), None) => true,
                        _ => false,
                    };
                    if slot == 0 || better {
                        pick = slot;
                        pick_best = best;
                    }
                }

                let score_idx = remaining.remove(pick);
                let field = scores[score_idx].0;
                match pick_best {
                    Some((col, score)) if score >= self.config.min_column_confidence => {
                        claimed[col] = true;
                        assigned.push((field, Some((col, score))));
                    }
                    _ => assigned.push((field, None)),
                }
            }
        }

        // Emit in stable field order regardless of assignment order;
        // `scores` was built in TargetField::ALL order.
        scores
            .iter()
            .map(|(field, per_column)| {
                let choice = assigned
                    .iter()
                    .find(|(f, _)| f == field)
                    .and_then(|(_, c)| *c);
                self.build_mapping(*field, choice, per_column, headers)
            })
            .collect()
    }

    fn build_mapping(
        &self,
        field: TargetField,
        choice: Option<(usize, f64)>,
        per_column: &[f64],
        headers: &[String],
    ) -> ColumnMapping {
        let chosen_col = choice.map(|(col, _)| col);

        // Runner-up headers by descending confidence, skipping the chosen
        // column, blank headers and zero scores.
        let mut ranked: Vec<(usize, f64)> = per_column
            .iter()
            .copied()
            .enumerate()
            .filter(|(col, score)| {
                Some(*col) != chosen_col && *score > 0.0 && !headers[*col].trim().is_empty()
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let alternative_headers: Vec<String> = ranked
            .into_iter()
            .take(self.config.max_alternatives)
            .map(|(col, _)| headers[col].clone())
            .collect();

        match choice {
            Some((col, score)) => ColumnMapping {
                target_field: field,
                detected_header: headers[col].clone(),
                column_index: col as i32,
                confidence: score,
                alternative_headers,
            },
            None => ColumnMapping {
                alternative_headers,
                ..ColumnMapping::unmapped(field)
            },
        }
    }
}

fn best_unclaimed(per_column: &[f64], claimed: &[bool]) -> Option<(usize, f64)> {
    per_column
        .iter()
        .copied()
        .enumerate()
        .filter(|(col, _)| !claimed[*col])
        .max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                // Ties break to the earlier column.
                .then(b.0.cmp(&a.0))
        })
}
