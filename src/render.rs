// Render model for the results grid. Kept free of terminal I/O so the
// UI layer only has to print it.

use crate::api::MatchResult;
use serde::Serialize;

pub const NO_MATCHES_MESSAGE: &str = "No similar images found.";

/// One image element in the results grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMatch {
    /// Where the matched reference image can be fetched.
    pub src: String,
    /// Path plus score, e.g. `fruits/apple1.jpg (similarity: 0.87)`.
    pub label: String,
    pub path: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    Matches(Vec<RenderedMatch>),
    Empty,
}

impl ResultsView {
    /// Build the grid from the service's matches, in the order received.
    pub fn from_matches(base_url: &str, matches: &[MatchResult]) -> Self {
        if matches.is_empty() {
            return ResultsView::Empty;
        }
        ResultsView::Matches(
            matches
                .iter()
                .map(|m| RenderedMatch {
                    src: dataset_url(base_url, &m.path),
                    label: format_label(&m.path, m.score),
                    path: m.path.clone(),
                    score: m.score,
                })
                .collect(),
        )
    }

    pub fn images(&self) -> &[RenderedMatch] {
        match self {
            ResultsView::Matches(items) => items,
            ResultsView::Empty => &[],
        }
    }

    /// Text lines for the terminal grid.
    pub fn lines(&self) -> Vec<String> {
        match self {
            ResultsView::Empty => vec![NO_MATCHES_MESSAGE.to_string()],
            ResultsView::Matches(items) => items
                .iter()
                .enumerate()
                .map(|(i, m)| format!("{:>2}. {}\n    {}", i + 1, m.label, m.src))
                .collect(),
        }
    }
}

/// `{base}/dataset/{path}`. Backslash separators (a service running on
/// Windows reports them) are turned into `/`.
pub fn dataset_url(base_url: &str, path: &str) -> String {
    let path = path.replace('\\', "/");
    format!(
        "{}/dataset/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn format_label(path: &str, score: f64) -> String {
    format!("{} (similarity: {:.2})", path, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(path: &str, score: f64) -> MatchResult {
        MatchResult {
            path: path.into(),
            score,
        }
    }

    #[test]
    fn single_match_renders_one_image() {
        let view = ResultsView::from_matches("http://127.0.0.1:8000", &[hit("catalog/img1.jpg", 0.873_456)]);
        let images = view.images();
        assert_eq!(images.len(), 1);
        assert!(images[0].src.ends_with("/dataset/catalog/img1.jpg"));
        assert!(images[0].label.contains("0.87"));
        assert_eq!(images[0].label, "catalog/img1.jpg (similarity: 0.87)");
    }

    #[test]
    fn empty_matches_render_message_and_no_images() {
        let view = ResultsView::from_matches("http://h", &[]);
        assert_eq!(view, ResultsView::Empty);
        assert!(view.images().is_empty());
        assert_eq!(view.lines(), vec![NO_MATCHES_MESSAGE.to_string()]);
    }

    #[test]
    fn order_and_raw_scores_are_preserved() {
        let view = ResultsView::from_matches("http://h", &[hit("b.jpg", 0.2), hit("a.jpg", 1.4)]);
        let paths: Vec<_> = view.images().iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["b.jpg", "a.jpg"]);
        assert!(view.images()[1].label.ends_with("(similarity: 1.40)"));
    }

    #[test]
    fn dataset_url_joins_cleanly() {
        assert_eq!(dataset_url("http://h/", "fruits\\apple1.jpg"), "http://h/dataset/fruits/apple1.jpg");
        assert_eq!(dataset_url("http://h", "/x.png"), "http://h/dataset/x.png");
    }
}
