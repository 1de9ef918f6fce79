//! Reading the volcano payload embedded in the served page.

use scraper::{ElementRef, Html};
use tracing::debug;

/// Text content of the element with `element_id`, or `None` when the page
/// has no such element.
///
/// The payload lives in a `<script type="application/json">` node, whose
/// contents the HTML parser keeps verbatim.
pub fn embedded_payload(html: &str, element_id: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let found = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().id() == Some(element_id));

    match found {
        Some(el) => {
            let text: String = el.text().collect();
            debug!(element_id, tag = el.value().name(), bytes = text.len(), "Embedded payload located");
            Some(text)
        }
        None => None,
    }
}
