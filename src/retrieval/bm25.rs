//! BM25 lexical scoring over an in-memory corpus

use crate::config::Bm25Params;
use crate::retrieval::tokenize;
use ahash::{AHashMap, AHashSet};

/// Score every document against the query with BM25
///
/// Returns one score per document, in input order. An empty corpus yields an
/// empty vector; a query with no surviving terms scores every document 0.
///
/// `idf(term) = ln((N - df + 0.5) / (df + 0.5) + 1)` keeps scores
/// non-negative even for terms present in every document. Parameters outside
/// their valid ranges can make the term weight divide by zero; such a score
/// is reported as 0.
pub fn compute_bm25_scores<S: AsRef<str>>(
    query: &str,
    documents: &[S],
    params: Bm25Params,
) -> Vec<f32> {
    if documents.is_empty() {
        return Vec::new();
    }

    let query_terms = tokenize(query);
    if query_terms.is_empty() {
        return vec![0.0; documents.len()];
    }

    let docs: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

    let mut doc_freq: AHashMap<&str, usize> = AHashMap::new();
    let mut total_len = 0usize;
    for tokens in &docs {
        total_len += tokens.len();
        let unique: AHashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let n = docs.len() as f64;
    let avg_doc_len = total_len as f64 / n;
    let k1 = f64::from(params.k1);
    let b = f64::from(params.b);

    docs.iter()
        .map(|tokens| {
            if tokens.is_empty() || avg_doc_len == 0.0 {
                return 0.0;
            }

            let mut term_freq: AHashMap<&str, usize> = AHashMap::new();
            for term in tokens {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
            }

            let doc_len = tokens.len() as f64;
            let norm = k1 * (1.0 - b + b * (doc_len / avg_doc_len));

            let score: f64 = query_terms
                .iter()
                .filter_map(|term| {
                    let tf = *term_freq.get(term.as_str())? as f64;
                    let df = doc_freq.get(term.as_str()).copied().unwrap_or(0) as f64;
                    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                    Some(idf * (tf * (k1 + 1.0)) / (tf + norm))
                })
                .sum();

            let score = score as f32;
            if score.is_finite() {
                score
            } else {
                0.0
            }
        })
        .collect()
}
