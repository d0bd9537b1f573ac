use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::{Console, Phase, Results};
use crate::models::Similarity;

const CONSOLE_TEMPLATE: &str = include_str!("../../templates/console.hbs");

#[derive(Debug, Error)]
#[error("console rendering failed: {0}")]
pub struct RenderError(String);

impl From<handlebars::RenderError> for RenderError {
    fn from(err: handlebars::RenderError) -> Self {
        RenderError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for RenderError {
    fn from(err: handlebars::TemplateError) -> Self {
        RenderError(err.to_string())
    }
}

/// Renders the console page with Handlebars.
#[derive(Clone)]
pub struct ConsoleRenderer {
    handlebars: Arc<Handlebars<'static>>,
}

impl ConsoleRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string("console", CONSOLE_TEMPLATE)?;

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    pub fn render(&self, console: &Console) -> Result<String, RenderError> {
        let view = ConsoleView::from(console);
        Ok(self.handlebars.render("console", &view)?)
    }
}

#[derive(Debug, Serialize)]
struct RowView<'a> {
    index: usize,
    number: usize,
    document: &'a str,
    metadata: &'a str,
}

#[derive(Debug, Serialize)]
struct BannerView<'a> {
    success: bool,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct HitView<'a> {
    number: usize,
    document: &'a str,
    distance: String,
    similarity: Option<String>,
    metadata: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResultsView<'a> {
    query: &'a str,
    empty: bool,
    hits: Vec<HitView<'a>>,
}

impl<'a> From<&'a Results> for ResultsView<'a> {
    fn from(results: &'a Results) -> Self {
        let hits = results
            .result
            .hits()
            .map(|hit| HitView {
                number: hit.rank + 1,
                document: hit.document,
                distance: format!("{:.4}", hit.distance),
                similarity: Similarity::percent(hit.distance, results.metric)
                    .map(|percent| format!("{percent:.1}%")),
                metadata: (!hit.metadata.is_empty())
                    .then(|| serde_json::to_string_pretty(hit.metadata).ok())
                    .flatten(),
            })
            .collect();

        Self {
            query: &results.query,
            empty: results.result.is_empty(),
            hits,
        }
    }
}

#[derive(Debug, Serialize)]
struct ConsoleView<'a> {
    rows: Vec<RowView<'a>>,
    removable: bool,
    query: &'a str,
    confirming_clear: bool,
    banner: Option<BannerView<'a>>,
    results: Option<ResultsView<'a>>,
}

impl<'a> From<&'a Console> for ConsoleView<'a> {
    fn from(console: &'a Console) -> Self {
        Self {
            rows: console
                .rows()
                .iter()
                .enumerate()
                .map(|(index, row)| RowView {
                    index,
                    number: index + 1,
                    document: &row.document,
                    metadata: &row.metadata,
                })
                .collect(),
            removable: console.rows().len() > 1,
            query: console.query(),
            confirming_clear: console.phase() == Phase::ConfirmingClear,
            banner: console.banner().map(|banner| BannerView {
                success: banner.is_success(),
                text: banner.text(),
            }),
            results: console.results().map(ResultsView::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{Action, Outcome};
    use crate::metadata::index_metadata;
    use crate::models::{DistanceMetric, DocumentEntry, QueryResult};

    fn render(console: &Console) -> String {
        ConsoleRenderer::new().unwrap().render(console).unwrap()
    }

    fn queried(metric: DistanceMetric, result: QueryResult) -> Console {
        let mut console = Console::new();
        console.set_query("hello");
        console.begin(Action::Query).unwrap();
        console.finish(Outcome::Queried(Results {
            query: "hello".into(),
            metric,
            result,
        }));
        console
    }

    #[test]
    fn test_renders_rows_and_escapes_text() {
        let console = Console::restore(
            vec![
                DocumentEntry::new("<b>bold</b>", ""),
                DocumentEntry::new("second", "plain"),
            ],
            String::new(),
            false,
        );
        let html = render(&console);
        assert!(html.contains("Document #1"));
        assert!(html.contains("Document #2"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("remove_row:1"));
    }

    #[test]
    fn test_single_row_has_no_remove_button() {
        let html = render(&Console::new());
        assert!(!html.contains("remove_row:0"));
    }

    #[test]
    fn test_renders_hits_with_similarity() {
        let console = queried(
            DistanceMetric::Cosine,
            QueryResult::aligned(
                vec!["hello world".into()],
                vec![0.125],
                vec![index_metadata(0)],
                vec!["doc_1_0".into()],
            ),
        );
        let html = render(&console);
        assert!(html.contains("Result #1"));
        assert!(html.contains("87.5%"));
        assert!(html.contains("Distance: 0.1250"));
        assert!(html.contains("&quot;index&quot;: 0"));
        assert!(html.contains("Found 1 results"));
    }

    #[test]
    fn test_similarity_hidden_for_unbounded_metrics() {
        let console = queried(
            DistanceMetric::L2,
            QueryResult::aligned(
                vec!["a".into()],
                vec![3.5],
                vec![Default::default()],
                vec!["doc_1_0".into()],
            ),
        );
        let html = render(&console);
        assert!(html.contains("Distance: 3.5000"));
        assert!(!html.contains("Similarity Score"));
        assert!(!html.contains("Metadata:"));
    }

    #[test]
    fn test_similarity_hidden_for_opposing_cosine_distance() {
        let console = queried(
            DistanceMetric::Cosine,
            QueryResult::aligned(
                vec!["word20 token20".into()],
                vec![1.4444444],
                vec![index_metadata(0)],
                vec!["doc_1_0".into()],
            ),
        );
        let html = render(&console);
        assert!(html.contains("Distance: 1.4444"));
        assert!(!html.contains("Similarity Score"));
        assert!(!html.contains("-44.4%"));
    }

    #[test]
    fn test_empty_results() {
        let html = render(&queried(DistanceMetric::Cosine, QueryResult::default()));
        assert!(html.contains("No results found"));
    }

    #[test]
    fn test_enter_in_text_field_runs_query() {
        let html = render(&Console::new());
        let first_submit = html
            .split(r#"type="submit""#)
            .nth(1)
            .and_then(|rest| rest.split('>').next())
            .unwrap();
        assert!(first_submit.contains(r#"value="query""#), "{first_submit}");
    }

    #[test]
    fn test_confirmation_prompt() {
        let mut console = Console::new();
        console.begin(Action::Clear).unwrap();
        let html = render(&console);
        assert!(html.contains("Are you sure you want to delete all documents?"));
        assert!(html.contains("confirm_clear"));
        assert!(html.contains(r#"value="confirming_clear""#));
    }
}
