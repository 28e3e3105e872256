//! Scores clickable elements by how likely they are the download button.
//!
//! Each `<a>`/`<button>` carrying an `href` is encoded into eight features
//! and run through a logistic model. The browser strategy clicks the best
//! element only when the model is confident enough.
//!
//! ## Feature order
//!
//! | idx | feature |
//! |-----|---------|
//! | 0 | text contains `تحميل` or `download` |
//! | 1 | element is an anchor |
//! | 2 | number of class tokens |
//! | 3 | text mentions `pdf` |
//! | 4 | href ends in `.pdf`, `.zip` or `.epub` |
//! | 5 | count of `.` and `#` in the element's CSS selector |
//! | 6 | DOM depth below `<html>` |
//! | 7 | inside `<main>` or `<article>` |

use anyhow::{bail, Context, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::path::Path;

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 8;

/// Embedded default weights.
const DEFAULT_WEIGHTS_JSON: &str = include_str!("selector_weights.json");

/// Raw features of one clickable element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFeatures {
    pub has_download_word: bool,
    pub is_anchor: bool,
    pub class_token_count: usize,
    pub mentions_pdf: bool,
    pub is_file_link: bool,
    pub selector_complexity: usize,
    pub depth: usize,
    pub in_main_section: bool,
}

impl ElementFeatures {
    /// Flatten into the model's input vector.
    pub fn to_vector(&self) -> [f32; FEATURE_COUNT] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            flag(self.has_download_word),
            flag(self.is_anchor),
            self.class_token_count as f32,
            flag(self.mentions_pdf),
            flag(self.is_file_link),
            self.selector_complexity as f32,
            self.depth as f32,
            flag(self.in_main_section),
        ]
    }
}

/// A clickable element with its features and the selector used to click it.
#[derive(Debug, Clone)]
pub struct ElementCandidate {
    pub selector: String,
    pub href: String,
    pub text: String,
    pub features: ElementFeatures,
}

/// An element the model is confident about.
#[derive(Debug, Clone)]
pub struct ScoredElement {
    pub selector: String,
    pub href: String,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct WeightsFile {
    weights: Vec<f32>,
    bias: f32,
    threshold: f32,
}

/// Logistic-regression scorer over [`ElementFeatures`].
#[derive(Debug, Clone)]
pub struct SelectorModel {
    weights: [f32; FEATURE_COUNT],
    bias: f32,
    threshold: f32,
}

impl Default for SelectorModel {
    fn default() -> Self {
        Self::from_json(DEFAULT_WEIGHTS_JSON).unwrap_or(Self {
            weights: [0.0; FEATURE_COUNT],
            bias: 0.0,
            threshold: 0.70,
        })
    }
}

impl SelectorModel {
    /// Load weights from `path`, or the embedded defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read selector model {}", p.display()))?;
                Self::from_json(&raw)
                    .with_context(|| format!("invalid selector model {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a weights document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: WeightsFile = serde_json::from_str(raw)?;
        if file.weights.len() != FEATURE_COUNT {
            bail!(
                "expected {FEATURE_COUNT} weights, found {}",
                file.weights.len()
            );
        }
        if !(0.0..=1.0).contains(&file.threshold) {
            bail!("threshold {} outside [0, 1]", file.threshold);
        }
        let mut weights = [0.0f32; FEATURE_COUNT];
        weights.copy_from_slice(&file.weights);
        Ok(Self {
            weights,
            bias: file.bias,
            threshold: file.threshold,
        })
    }

    /// Minimum probability for [`SelectorModel::pick_best`] to return a pick.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Probability that the element is the download trigger.
    pub fn probability(&self, features: &ElementFeatures) -> f32 {
        let x = features.to_vector();
        let z: f32 = self.bias + self.weights.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f32>();
        1.0 / (1.0 + (-z).exp())
    }

    /// Best element on the page, if its probability clears the threshold.
    pub fn pick_best(&self, html: &str) -> Option<ScoredElement> {
        let mut best: Option<ScoredElement> = None;

        for candidate in collect_candidates(html) {
            let p = self.probability(&candidate.features);
            if best.as_ref().map_or(true, |b| p > b.confidence) {
                best = Some(ScoredElement {
                    selector: candidate.selector,
                    href: candidate.href,
                    confidence: p,
                });
            }
        }

        match best {
            Some(b) if b.confidence >= self.threshold => {
                tracing::debug!(selector = %b.selector, confidence = b.confidence, "selector model pick");
                Some(b)
            }
            Some(b) => {
                tracing::debug!(confidence = b.confidence, "best element below threshold");
                None
            }
            None => None,
        }
    }
}

/// Every `<a>`/`<button>` with a non-fragment `href`, encoded.
pub fn collect_candidates(html: &str) -> Vec<ElementCandidate> {
    let document = Html::parse_document(html);
    let sel = match Selector::parse("a[href], button[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&sel)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            Some(encode_element(el, href))
        })
        .collect()
}

fn encode_element(el: ElementRef<'_>, href: &str) -> ElementCandidate {
    let tag = el.value().name();
    let text = el.text().collect::<String>().trim().to_string();
    let lower_text = text.to_lowercase();
    let lower_href = href.to_lowercase();
    let selector = format!("{tag}[href='{}']", href.replace('\'', "\\'"));

    let mut depth = 0usize;
    let mut in_main_section = false;
    for ancestor in el.ancestors() {
        let Some(name) = ancestor.value().as_element().map(|e| e.name()) else {
            continue;
        };
        if name == "html" {
            break;
        }
        depth += 1;
        if name == "main" || name == "article" {
            in_main_section = true;
        }
    }

    let features = ElementFeatures {
        has_download_word: text.contains("تحميل") || lower_text.contains("download"),
        is_anchor: tag == "a",
        class_token_count: el.value().classes().count(),
        mentions_pdf: lower_text.contains("pdf"),
        is_file_link: [".pdf", ".zip", ".epub"]
            .iter()
            .any(|ext| lower_href.ends_with(ext)),
        selector_complexity: selector.matches(['.', '#']).count(),
        depth,
        in_main_section,
    };

    ElementCandidate {
        selector,
        href: href.to_string(),
        text,
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body>
          <nav><a href="/">Home</a><a href="/about">About</a><a href="#top">Top</a></nav>
          <main><article>
            <h1>كتاب</h1>
            <a class="btn btn-success" href="/files/book.pdf">تحميل PDF</a>
          </article></main>
        </body></html>
    "##;

    #[test]
    fn test_candidates_skip_fragments() {
        let c = collect_candidates(PAGE);
        assert_eq!(c.len(), 3);
        assert!(c.iter().all(|e| !e.href.starts_with('#')));
    }

    #[test]
    fn test_feature_encoding() {
        let c = collect_candidates(PAGE);
        let dl = c.iter().find(|e| e.href == "/files/book.pdf").unwrap();
        let f = &dl.features;
        assert!(f.has_download_word);
        assert!(f.is_anchor);
        assert_eq!(f.class_token_count, 2);
        assert!(f.mentions_pdf);
        assert!(f.is_file_link);
        assert_eq!(f.selector_complexity, 1);
        assert_eq!(f.depth, 3);
        assert!(f.in_main_section);
        assert_eq!(dl.selector, "a[href='/files/book.pdf']");
    }

    #[test]
    fn test_pick_best_finds_download_link() {
        let model = SelectorModel::default();
        let pick = model.pick_best(PAGE).expect("confident pick");
        assert_eq!(pick.href, "/files/book.pdf");
        assert!(pick.confidence >= model.threshold());
    }

    #[test]
    fn test_below_threshold_returns_none() {
        let model = SelectorModel::default();
        let html = r#"<a href="/about">About us</a><a href="/contact">Contact</a>"#;
        assert!(model.pick_best(html).is_none());
    }

    #[test]
    fn test_download_word_alone_is_not_enough() {
        let model = SelectorModel::default();
        assert!(model.pick_best(r#"<a href="/dl?id=1">Download</a>"#).is_none());
        assert!(model
            .pick_best(r#"<a href="/get/123">Download PDF</a>"#)
            .is_some());
    }

    #[test]
    fn test_from_json_validates_shape() {
        assert!(SelectorModel::from_json(r#"{"weights":[1.0],"bias":0,"threshold":0.5}"#).is_err());
        assert!(SelectorModel::from_json(
            r#"{"weights":[0,0,0,0,0,0,0,0],"bias":0,"threshold":1.5}"#
        )
        .is_err());
        let m = SelectorModel::from_json(r#"{"weights":[0,0,0,0,0,0,0,0],"bias":0,"threshold":0.5}"#)
            .unwrap();
        let f = collect_candidates(PAGE)[0].features.clone();
        assert!((m.probability(&f) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, DEFAULT_WEIGHTS_JSON).unwrap();
        let model = SelectorModel::load(Some(&path)).unwrap();
        assert!((model.threshold() - 0.70).abs() < 1e-6);
        assert!(SelectorModel::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
