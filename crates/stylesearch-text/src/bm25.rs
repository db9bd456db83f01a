//! BM25 scoring over an immutable inverted index.
//!
//! The index is built once per snapshot and never mutated; scoring walks
//! the postings of the query terms and produces a raw score for every
//! document in the corpus.

use std::collections::HashMap;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercase, strip non-alphanumerics, drop single-char tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

pub struct Bm25Index {
    // term -> (doc index, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
}

impl Bm25Index {
    pub fn build(documents: &[String]) -> Self {
        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(documents.len());
        for (doc_idx, doc) in documents.iter().enumerate() {
            let tokens = tokenize(doc);
            doc_lens.push(tokens.len() as u32);
            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for (term, tf) in freqs {
                postings.entry(term).or_default().push((doc_idx, tf));
            }
        }
        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<u32>() as f32 / doc_lens.len() as f32
        };
        Self { postings, doc_lens, avg_doc_len }
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n_docs = self.doc_lens.len() as f32;
        let n_term = self.postings.get(term).map_or(0, Vec::len) as f32;
        ((n_docs - n_term + 0.5) / (n_term + 0.5) + 1.0).ln()
    }

    /// Raw BM25 score of every document against the query tokens.
    /// Documents matching no term score 0.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lens.len()];
        if self.avg_doc_len == 0.0 {
            return scores;
        }
        for term in query_tokens {
            let Some(posting) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);
            for &(doc_idx, tf) in posting {
                let tf = tf as f32;
                let len_norm = 1.0 - B + B * self.doc_lens[doc_idx] as f32 / self.avg_doc_len;
                scores[doc_idx] += idf * (tf * (K1 + 1.0)) / (tf + K1 * len_norm);
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn tokenize_folds_and_filters() {
        assert_eq!(tokenize("Nike Air-Max 90!"), vec!["nike", "air", "max", "90"]);
        assert_eq!(tokenize("a b cd"), vec!["cd"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn rare_terms_outscore_common_ones() {
        let index = Bm25Index::build(&docs(&[
            "nike running shoes",
            "adidas running shoes",
            "puma running shoes",
        ]));
        let scores = index.scores(&tokenize("nike shoes"));
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn unmatched_documents_score_zero() {
        let index = Bm25Index::build(&docs(&["leather handbag", "silk scarf"]));
        let scores = index.scores(&tokenize("sneakers"));
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn length_normalization_favors_shorter_documents() {
        let index = Bm25Index::build(&docs(&[
            "sneakers",
            "sneakers with a very long rambling description about nothing in particular",
        ]));
        let scores = index.scores(&tokenize("sneakers"));
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn empty_corpus_scores_nothing() {
        let index = Bm25Index::build(&[]);
        assert!(index.is_empty());
        assert!(index.scores(&tokenize("anything")).is_empty());
    }
}
