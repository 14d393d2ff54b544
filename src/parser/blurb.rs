use std::sync::LazyLock;

use scraper::{Html, Selector};

static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#JobDescriptionContainer").unwrap());

/// Full description text from a job detail page, or `None` when the page has
/// no description container. Only the outer whitespace is trimmed; line
/// breaks and indentation inside the description are kept as served.
pub fn extract_blurb(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let container = doc.select(&DESCRIPTION).next()?;
    let text: String = container.text().collect();
    Some(filter_non_printables(text.trim()))
}

/// Drop control and zero-width characters, keeping newlines and tabs.
pub fn filter_non_printables(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, '\n' | '\t') || !(c.is_control() || is_invisible(*c)))
        .collect()
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}' | '\u{FEFF}'
    )
}
