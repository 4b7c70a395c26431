//! TF-IDF bag-of-n-grams feature extraction.
//!
//! The vectorizer learns its vocabulary from training texts exactly once.
//! Every later `transform` maps text into that fixed column space; terms
//! outside the vocabulary get zero weight and never extend it.
use std::collections::HashMap;
use std::sync::OnceLock;

use ndarray::Array2;
use rayon::prelude::*;
use regex::Regex;

use crate::config::FeatureConfig;
use crate::error::{Error, Result};

const COMPONENT: &str = "TF-IDF vectorizer";

/// English stop words removed before n-grams are formed.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "be", "became", "because", "become", "becomes", "been", "before",
    "beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "done", "down", "due",
    "during", "each", "either", "else", "elsewhere", "enough", "etc", "even", "ever", "every",
    "everyone", "everything", "everywhere", "except", "few", "for", "former", "formerly", "from",
    "further", "had", "has", "have", "having", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hers", "herself", "him", "himself", "his", "how", "however", "i", "ie",
    "if", "in", "indeed", "into", "is", "it", "its", "itself", "just", "latter", "least", "less",
    "ltd", "many", "may", "me", "meanwhile", "might", "mine", "more", "moreover", "most",
    "mostly", "much", "must", "my", "myself", "namely", "neither", "never", "nevertheless",
    "next", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps", "please", "rather",
    "same", "seem", "seemed", "seeming", "seems", "several", "she", "should", "since", "so",
    "some", "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "this", "those", "though", "through", "throughout", "thru", "thus", "to", "together", "too",
    "toward", "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "we",
    "well", "were", "what", "whatever", "when", "whence", "whenever", "where", "whereafter",
    "whereas", "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while",
    "whither", "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two or more word characters.
    PATTERN.get_or_init(|| Regex::new(r"(?u)\b\w\w+\b").unwrap())
}

/// Fitted vocabulary: lexicographically ordered terms plus their IDF weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
    n_documents: usize,
}

impl Vocabulary {
    fn new(terms: Vec<String>, idf: Vec<f64>, n_documents: usize) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Self {
            terms,
            idf,
            index,
            n_documents,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Number of training documents the vocabulary was learned from.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

/// TF-IDF vectorizer over word n-grams.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: FeatureConfig,
    vocabulary: Option<Vocabulary>,
}

impl TfidfVectorizer {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            vocabulary: None,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary
            .as_ref()
            .ok_or_else(|| Error::not_fitted(COMPONENT))
    }

    /// Lowercase, tokenize, drop stop words and expand into n-grams.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = token_pattern()
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !(self.config.remove_stop_words && is_stop_word(token)))
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    /// Learn the vocabulary from training texts. May be called once.
    ///
    /// Keeps the `max_features` terms with the highest document frequency;
    /// ties go to the higher total count, then to the lexicographically
    /// smaller term.
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<&Vocabulary> {
        if self.vocabulary.is_some() {
            return Err(Error::already_fitted(COMPONENT));
        }
        if texts.is_empty() {
            return Err(Error::InsufficientData(
                "cannot fit a vocabulary on zero documents".to_string(),
            ));
        }

        // term -> (document frequency, total count)
        let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
        for text in texts {
            let mut seen: HashMap<String, usize> = HashMap::new();
            for gram in self.analyze(text.as_ref()) {
                *seen.entry(gram).or_insert(0) += 1;
            }
            for (gram, count) in seen {
                let entry = stats.entry(gram).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += count;
            }
        }

        if stats.is_empty() {
            return Err(Error::InsufficientData(
                "training texts produced an empty vocabulary".to_string(),
            ));
        }

        let mut ranked: Vec<(String, usize, usize)> = stats
            .into_iter()
            .map(|(term, (df, total))| (term, df, total))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_documents = texts.len();
        let n = n_documents as f64;
        let idf = ranked
            .iter()
            .map(|(_, df, _)| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let terms = ranked.into_iter().map(|(term, _, _)| term).collect();

        let vocabulary = Vocabulary::new(terms, idf, n_documents);
        log::debug!(
            "Fitted vocabulary with {} terms from {} documents",
            vocabulary.len(),
            n_documents
        );
        Ok(self.vocabulary.insert(vocabulary))
    }

    /// Map texts into the fitted feature space, one L2-normalized row per text.
    pub fn transform<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Array2<f64>> {
        let vocabulary = self.vocabulary()?;

        let rows: Vec<Vec<(usize, f64)>> = texts
            .par_iter()
            .map(|text| self.weigh(text.as_ref(), vocabulary))
            .collect();

        let mut matrix = Array2::<f64>::zeros((texts.len(), vocabulary.len()));
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col, weight) in row {
                matrix[[row_idx, col]] = weight;
            }
        }
        Ok(matrix)
    }

    pub fn fit_transform<S: AsRef<str> + Sync>(&mut self, texts: &[S]) -> Result<Array2<f64>> {
        self.fit(texts)?;
        self.transform(texts)
    }

    fn weigh(&self, text: &str, vocabulary: &Vocabulary) -> Vec<(usize, f64)> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in self.analyze(text) {
            if let Some(col) = vocabulary.column_of(&gram) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| (col, tf * vocabulary.idf[col]))
            .collect();
        weights.sort_unstable_by_key(|(col, _)| *col);

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in weights.iter_mut() {
                *w /= norm;
            }
        }
        weights
    }
}

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}
