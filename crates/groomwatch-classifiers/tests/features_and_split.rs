//! Integration tests for the stratified split, the TF-IDF extractor and the
//! keyword detector.

use groomwatch_classifiers::config::FeatureConfig;
use groomwatch_classifiers::features::TfidfVectorizer;
use groomwatch_classifiers::keyword::KeywordDetector;
use groomwatch_classifiers::split::stratified_split;
use groomwatch_classifiers::Error;

const TRAIN: &[&str] = &[
    "keep this between us, our little secret",
    "want to play the new map after school",
    "you are mature for your age, don't tell anyone",
    "science project due friday, need a partner",
    "send me a photo of your new outfit",
    "the match went to overtime, what a game",
];

// ---------------------------------------------------------------------------
// Stratified split
// ---------------------------------------------------------------------------

#[test]
fn split_keeps_class_proportions_within_one_sample() {
    let mut labels = vec![0u8; 137];
    labels.extend(vec![1u8; 41]);
    let fraction = 0.25;

    let split = stratified_split(&labels, fraction, 42).unwrap();

    for class in [0u8, 1u8] {
        let total = labels.iter().filter(|&&l| l == class).count() as f64;
        let in_test = split.test.iter().filter(|&&i| labels[i] == class).count() as f64;
        assert!((in_test - total * fraction).abs() <= 1.0);
    }
    assert_eq!(split.len(), labels.len());
}

#[test]
fn split_indices_are_disjoint_and_sorted() {
    let labels: Vec<u8> = (0..60).map(|i| u8::from(i % 3 == 0)).collect();
    let split = stratified_split(&labels, 0.2, 3).unwrap();
    assert!(split.train.windows(2).all(|w| w[0] < w[1]));
    assert!(split.test.windows(2).all(|w| w[0] < w[1]));
    assert!(split.test.iter().all(|i| !split.train.contains(i)));
}

// ---------------------------------------------------------------------------
// TF-IDF extractor
// ---------------------------------------------------------------------------

#[test]
fn fresh_extractors_produce_identical_features() {
    let mut a = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    let mut b = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    let xa = a.fit_transform(TRAIN).unwrap();
    let xb = b.fit_transform(TRAIN).unwrap();
    assert_eq!(a.vocabulary().unwrap(), b.vocabulary().unwrap());
    assert_eq!(xa, xb);
}

#[test]
fn transform_leaves_vocabulary_untouched() {
    let mut vectorizer = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    vectorizer.fit(TRAIN).unwrap();
    let before = vectorizer.vocabulary().unwrap().clone();

    let unseen = ["completely unseen words appear here", "zebra quantum lighthouse"];
    let x = vectorizer.transform(&unseen).unwrap();

    assert_eq!(vectorizer.vocabulary().unwrap(), &before);
    assert_eq!(x.ncols(), before.len());
    assert!(x.row(1).iter().all(|&v| v == 0.0));
}

#[test]
fn rows_are_unit_length() {
    let mut vectorizer = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    let x = vectorizer.fit_transform(TRAIN).unwrap();
    for row in x.rows() {
        let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }
}

#[test]
fn vocabulary_respects_max_features() {
    let config = FeatureConfig {
        max_features: 5,
        ..FeatureConfig::default()
    };
    let mut vectorizer = TfidfVectorizer::new(config).unwrap();
    let vocabulary = vectorizer.fit(TRAIN).unwrap();
    assert_eq!(vocabulary.len(), 5);
    let terms = vocabulary.terms().to_vec();
    let mut sorted = terms.clone();
    sorted.sort();
    assert_eq!(terms, sorted);
}

#[test]
fn transform_before_fit_is_not_fitted() {
    let vectorizer = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    assert!(matches!(
        vectorizer.transform(TRAIN),
        Err(Error::NotFitted { .. })
    ));
}

#[test]
fn stop_words_only_gives_insufficient_data() {
    let mut vectorizer = TfidfVectorizer::new(FeatureConfig::default()).unwrap();
    assert!(matches!(
        vectorizer.fit(&["the and of", "a an it"]),
        Err(Error::InsufficientData(_))
    ));
}

// ---------------------------------------------------------------------------
// Keyword detector
// ---------------------------------------------------------------------------

#[test]
fn keyword_detector_is_pure() {
    let detector = KeywordDetector::default();
    assert_eq!(detector.predict("where do you live?"), 1);
    assert_eq!(detector.predict("let's play again tomorrow"), 0);
    for _ in 0..3 {
        assert_eq!(detector.predict("where do you live?"), 1);
    }
}
