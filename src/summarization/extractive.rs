//! In-process extractive summarization.
//!
//! LexRank builds a sentence graph from TF-IDF cosine similarity, keeps edges above
//! [`SIMILARITY_THRESHOLD`], and ranks sentences with damped power iteration. The top sentences
//! are returned in document order, one per line. The `lead` algorithm takes the first sentences
//! verbatim and serves as a cheap fallback.

use super::{SummarizationClient, SummarizationClientError, SummarizationRequest};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Minimum cosine similarity for two sentences to share an edge.
pub const SIMILARITY_THRESHOLD: f64 = 0.1;
const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-6;
const TERMINATORS: [char; 3] = ['.', '!', '?'];
const WIDE_TERMINATORS: [char; 3] = ['。', '！', '？'];
const CLOSERS: [char; 5] = ['"', '\'', ')', ']', '”'];

/// Sentence selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractiveAlgorithm {
    /// Graph centrality ranking.
    LexRank,
    /// Leading sentences.
    Lead,
}

impl ExtractiveAlgorithm {
    fn label(self) -> &'static str {
        match self {
            Self::LexRank => "lexrank",
            Self::Lead => "lead",
        }
    }
}

/// Summarizer that never leaves the process.
#[derive(Debug, Clone, Copy)]
pub struct ExtractiveSummarizer {
    algorithm: ExtractiveAlgorithm,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(ExtractiveAlgorithm::LexRank)
    }
}

impl ExtractiveSummarizer {
    /// Create a summarizer using `algorithm`.
    pub fn new(algorithm: ExtractiveAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Pick the algorithm from the configured model name (`lead`, anything else is LexRank).
    pub fn from_model(model: Option<&str>) -> Self {
        match model.map(|name| name.trim().to_lowercase()).as_deref() {
            Some("lead") => Self::new(ExtractiveAlgorithm::Lead),
            _ => Self::default(),
        }
    }

    /// Select `count` sentences from `text` and join them with newlines.
    pub fn summarize(&self, text: &str, count: usize) -> String {
        let sentences = split_sentences(text);
        let selected = match self.algorithm {
            ExtractiveAlgorithm::LexRank => lexrank(&sentences, count),
            ExtractiveAlgorithm::Lead => (0..count.min(sentences.len())).collect(),
        };
        selected
            .into_iter()
            .map(|index| sentences[index].as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl SummarizationClient for ExtractiveSummarizer {
    fn provider(&self) -> &'static str {
        "extractive"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate_summary(
        &self,
        request: &SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let summary = self.summarize(&request.text, request.sentences.max(1));
        if summary.is_empty() {
            return Err(SummarizationClientError::GenerationFailed(
                "no sentences found to rank".into(),
            ));
        }
        Ok(summary)
    }

    async fn list_models(&self) -> Result<Vec<String>, SummarizationClientError> {
        let mut models = vec![self.algorithm.label().to_string()];
        for algorithm in [ExtractiveAlgorithm::LexRank, ExtractiveAlgorithm::Lead] {
            if algorithm != self.algorithm {
                models.push(algorithm.label().to_string());
            }
        }
        Ok(models)
    }
}

/// Split text into trimmed sentences. Blank lines always end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for paragraph in text.split("\n\n") {
        let flattened = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut current = String::new();
        let mut chars = flattened.chars().peekable();

        while let Some(ch) = chars.next() {
            current.push(ch);
            let wide = WIDE_TERMINATORS.contains(&ch);
            if !wide && !TERMINATORS.contains(&ch) {
                continue;
            }
            while let Some(&next) = chars.peek() {
                if !CLOSERS.contains(&next) {
                    break;
                }
                current.push(next);
                chars.next();
            }
            if wide || chars.peek().is_none_or(|next| next.is_whitespace()) {
                flush(&mut sentences, &mut current);
            }
        }
        flush(&mut sentences, &mut current);
    }
    sentences
}

fn flush(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

fn words(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

/// Rank sentences and return the indices of the `count` most central ones in document order.
pub fn lexrank(sentences: &[String], count: usize) -> Vec<usize> {
    let total = sentences.len();
    if count >= total {
        return (0..total).collect();
    }
    if count == 0 {
        return Vec::new();
    }

    let vectors = tf_idf_vectors(sentences);
    let matrix = transition_matrix(&vectors);
    let scores = stationary_distribution(&matrix);

    let mut ranked: Vec<usize> = (0..total).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut selected = ranked[..count].to_vec();
    selected.sort_unstable();
    selected
}

fn tf_idf_vectors(sentences: &[String]) -> Vec<HashMap<String, f64>> {
    let frequencies: Vec<HashMap<String, f64>> = sentences
        .iter()
        .map(|sentence| {
            let mut counts: HashMap<String, f64> = HashMap::new();
            for word in words(sentence) {
                *counts.entry(word).or_default() += 1.0;
            }
            let max = counts.values().copied().fold(0.0, f64::max);
            if max > 0.0 {
                counts.values_mut().for_each(|count| *count /= max);
            }
            counts
        })
        .collect();

    let mut document_frequency: HashMap<&str, f64> = HashMap::new();
    for terms in &frequencies {
        let unique: HashSet<&str> = terms.keys().map(String::as_str).collect();
        for term in unique {
            *document_frequency.entry(term).or_default() += 1.0;
        }
    }

    let total = sentences.len() as f64;
    let idf: HashMap<String, f64> = document_frequency
        .into_iter()
        .map(|(term, df)| (term.to_string(), ((1.0 + total) / (1.0 + df)).ln() + 1.0))
        .collect();

    frequencies
        .into_iter()
        .map(|terms| {
            terms
                .into_iter()
                .map(|(term, tf)| {
                    let weight = tf * idf.get(&term).copied().unwrap_or(1.0);
                    (term, weight)
                })
                .collect()
        })
        .collect()
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, weight)| large.get(term).map(|other| weight * other))
        .sum();
    let norm = |vector: &HashMap<String, f64>| vector.values().map(|w| w * w).sum::<f64>().sqrt();
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

fn transition_matrix(vectors: &[HashMap<String, f64>]) -> Vec<Vec<f64>> {
    let total = vectors.len();
    let mut matrix = vec![vec![0.0; total]; total];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            if cosine(&vectors[i], &vectors[j]) > SIMILARITY_THRESHOLD {
                *cell = 1.0;
            }
        }
        let degree: f64 = row.iter().sum();
        if degree == 0.0 {
            row.iter_mut().for_each(|cell| *cell = 1.0 / total as f64);
        } else {
            row.iter_mut().for_each(|cell| *cell /= degree);
        }
    }
    matrix
}

fn stationary_distribution(matrix: &[Vec<f64>]) -> Vec<f64> {
    let total = matrix.len();
    let teleport = (1.0 - DAMPING) / total as f64;
    let mut scores = vec![1.0 / total as f64; total];

    for _ in 0..MAX_ITERATIONS {
        let next: Vec<f64> = (0..total)
            .map(|j| {
                let incoming: f64 = (0..total).map(|i| matrix[i][j] * scores[i]).sum();
                teleport + DAMPING * incoming
            })
            .collect();
        let delta: f64 = next
            .iter()
            .zip(&scores)
            .map(|(new, old)| (new - old).abs())
            .sum();
        scores = next;
        if delta < TOLERANCE {
            break;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(sentences: &[&str]) -> Vec<String> {
        sentences.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn splits_on_terminators_and_blank_lines() {
        let text = "First line wraps\nonto the next. Second? Third!\n\nHeading without stop\n\nv1.2 is out.";
        assert_eq!(
            split_sentences(text),
            vec![
                "First line wraps onto the next.",
                "Second?",
                "Third!",
                "Heading without stop",
                "v1.2 is out.",
            ]
        );
    }

    #[test]
    fn splits_full_width_terminators() {
        assert_eq!(split_sentences("今日は晴れ。明日は雨。"), vec!["今日は晴れ。", "明日は雨。"]);
    }

    #[test]
    fn most_connected_sentence_ranks_first() {
        let sentences = owned(&[
            "Solar panels convert sunlight.",
            "Tax rules changed yesterday.",
            "Solar panels and wind turbines supply clean energy.",
            "Wind turbines spin offshore.",
            "Clean energy demand grows.",
        ]);
        assert_eq!(lexrank(&sentences, 1), vec![2]);

        let pair = lexrank(&sentences, 2);
        assert_eq!(pair.len(), 2);
        assert!(pair.contains(&2));
        assert!(pair.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn short_documents_are_returned_whole() {
        let summarizer = ExtractiveSummarizer::default();
        assert_eq!(summarizer.summarize("One. Two.", 5), "One.\nTwo.");
    }

    #[test]
    fn lead_takes_first_sentences() {
        let summarizer = ExtractiveSummarizer::from_model(Some("Lead"));
        assert_eq!(summarizer.summarize("A one. B two. C three.", 2), "A one.\nB two.");
    }

    #[tokio::test]
    async fn blank_text_fails_generation() {
        let request = SummarizationRequest {
            text: "   ".into(),
            max_lines: 3,
            sentences: 5,
        };
        let error = ExtractiveSummarizer::default()
            .generate_summary(&request)
            .await
            .expect_err("nothing to rank");
        assert!(matches!(error, SummarizationClientError::GenerationFailed(_)));
    }

    #[test]
    fn runs_in_process() {
        assert!(ExtractiveSummarizer::default().is_local());
    }

    #[tokio::test]
    async fn lists_active_algorithm_first() {
        let models = ExtractiveSummarizer::from_model(Some("lead"))
            .list_models()
            .await
            .expect("models");
        assert_eq!(models, vec!["lead", "lexrank"]);
    }
}
