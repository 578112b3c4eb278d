//! SEO signal extraction from fetched HTML.
//!
//! Parsing goes through `scraper` (html5ever), which recovers from any markup,
//! so extraction has no error path: a missing tag is `None`, a tag with no
//! text is `Some("")`.

use std::sync::LazyLock;

use pagecheck_common::{clamp_opt, MAX_TEXT_CHARS};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"]"#));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector literal")
}

/// Signals pulled out of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    /// First `<h1>`, at most 255 characters.
    pub h1: Option<String>,
    /// First `<title>`, at most 255 characters.
    pub title: Option<String>,
    /// `content` of the first `<meta name="description">`, uncapped.
    pub description: Option<String>,
}

/// Parse `html` leniently and pull out `h1`, `title` and meta description.
///
/// ```
/// use pagecheck_web::extract;
///
/// let got = extract("<title>T</title><h1>H</h1>");
/// assert_eq!(got.title.as_deref(), Some("T"));
/// assert_eq!(got.h1.as_deref(), Some("H"));
/// assert_eq!(got.description, None);
/// ```
pub fn extract(html: &str) -> ExtractedContent {
    let doc = Html::parse_document(html);

    let h1 = doc.select(&H1).next().map(element_text);
    let title = doc.select(&TITLE).next().map(element_text);
    let description = doc
        .select(&META_DESCRIPTION)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string);

    tracing::trace!(
        has_h1 = h1.is_some(),
        has_title = title.is_some(),
        has_description = description.is_some(),
        "extract.done"
    );

    ExtractedContent {
        h1: clamp_opt(h1, MAX_TEXT_CHARS),
        title: clamp_opt(title, MAX_TEXT_CHARS),
        description,
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
