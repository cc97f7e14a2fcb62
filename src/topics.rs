//! Keyword and topic extraction: TF-IDF term ranking and LDA topic modelling.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::nlp::NlpProcessor;

/// A term and its aggregate TF-IDF weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub term: String,
    pub score: f64,
}

/// Top terms of the corpus by summed TF-IDF weight
///
/// Each message is one document. Term frequencies are raw counts, idf is
/// smoothed (`ln((1 + n) / (1 + df)) + 1`) and each document vector is
/// l2-normalized before the per-term sums are taken.
#[must_use]
pub fn perform_tfidf_analysis(documents: &[&str], nlp: &NlpProcessor, top_n: usize) -> Vec<TermScore> {
    let tokenized: Vec<Vec<String>> = documents
        .iter()
        .map(|doc| nlp.content_words(doc))
        .filter(|tokens| !tokens.is_empty())
        .collect();
    if tokenized.is_empty() {
        return Vec::new();
    }

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    let mut term_counts: Vec<HashMap<&str, usize>> = Vec::with_capacity(tokenized.len());
    for tokens in &tokenized {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }
        for term in counts.keys() {
            *document_frequency.entry(*term).or_insert(0) += 1;
        }
        term_counts.push(counts);
    }

    let n = tokenized.len() as f64;
    let idf: HashMap<&str, f64> = document_frequency
        .iter()
        .map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
        .collect();

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for counts in &term_counts {
        let weights: Vec<(&str, f64)> = counts
            .iter()
            .map(|(term, tf)| (*term, *tf as f64 * idf[term]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        for (term, weight) in weights {
            *totals.entry(term).or_insert(0.0) += weight / norm;
        }
    }

    let mut scores: Vec<TermScore> = totals
        .into_iter()
        .map(|(term, score)| TermScore {
            term: term.to_string(),
            score,
        })
        .collect();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.term.cmp(&b.term)));
    scores.truncate(top_n);
    scores
}

/// Settings of the Gibbs sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdaParams {
    pub topics: usize,
    pub words_per_topic: usize,
    pub iterations: usize,
    pub seed: u64,
    /// Document-topic prior
    pub alpha: f64,
    /// Topic-word prior
    pub beta: f64,
}

impl Default for LdaParams {
    fn default() -> Self {
        Self {
            topics: 5,
            words_per_topic: 5,
            iterations: 200,
            seed: 42,
            alpha: 0.1,
            beta: 0.01,
        }
    }
}

/// One inferred topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// 1-based topic number
    pub index: usize,
    /// Most probable terms, strongest first
    pub terms: Vec<String>,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic {}: {}", self.index, self.terms.join(", "))
    }
}

/// Stemmed vocabulary that remembers the most common spelling of each stem
#[derive(Debug, Default)]
struct Vocabulary {
    ids: HashMap<String, usize>,
    surfaces: Vec<HashMap<String, usize>>,
}

impl Vocabulary {
    fn intern(&mut self, stem: String, surface: &str) -> usize {
        let next = self.ids.len();
        let id = *self.ids.entry(stem).or_insert(next);
        if id == self.surfaces.len() {
            self.surfaces.push(HashMap::new());
        }
        *self.surfaces[id].entry(surface.to_string()).or_insert(0) += 1;
        id
    }

    fn len(&self) -> usize {
        self.surfaces.len()
    }

    fn display(&self, id: usize) -> String {
        self.surfaces[id]
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(surface, _)| surface.clone())
            .unwrap_or_default()
    }
}

/// Latent Dirichlet allocation over the documents, by collapsed Gibbs sampling
///
/// The sampler is seeded, so the same corpus and parameters always produce
/// the same topics. Returns no topic when the corpus has no content words.
#[must_use]
pub fn perform_lda_analysis(documents: &[&str], nlp: &NlpProcessor, params: &LdaParams) -> Vec<Topic> {
    let k = params.topics;
    let mut vocabulary = Vocabulary::default();
    let corpus: Vec<Vec<usize>> = documents
        .iter()
        .map(|doc| {
            nlp.content_words(doc)
                .iter()
                .map(|word| vocabulary.intern(nlp.stem(word), word))
                .collect::<Vec<_>>()
        })
        .filter(|doc| !doc.is_empty())
        .collect();

    let v = vocabulary.len();
    if corpus.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut doc_topic = vec![vec![0usize; k]; corpus.len()];
    let mut topic_word = vec![vec![0usize; v]; k];
    let mut topic_total = vec![0usize; k];
    let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(corpus.len());

    for (d, doc) in corpus.iter().enumerate() {
        let mut z = Vec::with_capacity(doc.len());
        for &w in doc {
            let topic = rng.gen_range(0..k);
            doc_topic[d][topic] += 1;
            topic_word[topic][w] += 1;
            topic_total[topic] += 1;
            z.push(topic);
        }
        assignments.push(z);
    }

    let v_beta = v as f64 * params.beta;
    let mut weights = vec![0.0_f64; k];
    for _ in 0..params.iterations {
        for (d, doc) in corpus.iter().enumerate() {
            for (i, &w) in doc.iter().enumerate() {
                let old = assignments[d][i];
                doc_topic[d][old] -= 1;
                topic_word[old][w] -= 1;
                topic_total[old] -= 1;

                let mut total = 0.0;
                for (t, weight) in weights.iter_mut().enumerate() {
                    *weight = (doc_topic[d][t] as f64 + params.alpha)
                        * (topic_word[t][w] as f64 + params.beta)
                        / (topic_total[t] as f64 + v_beta);
                    total += *weight;
                }

                let mut target = rng.gen::<f64>() * total;
                let mut new = k - 1;
                for (t, weight) in weights.iter().enumerate() {
                    if target < *weight {
                        new = t;
                        break;
                    }
                    target -= weight;
                }

                assignments[d][i] = new;
                doc_topic[d][new] += 1;
                topic_word[new][w] += 1;
                topic_total[new] += 1;
            }
        }
    }

    debug!(documents = corpus.len(), vocabulary = v, topics = k, "LDA sampling finished");

    topic_word
        .iter()
        .enumerate()
        .map(|(t, counts)| {
            let mut ranked: Vec<(usize, usize)> = counts
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, c)| *c > 0)
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            Topic {
                index: t + 1,
                terms: ranked
                    .into_iter()
                    .take(params.words_per_topic)
                    .map(|(w, _)| vocabulary.display(w))
                    .collect(),
            }
        })
        .collect()
}
