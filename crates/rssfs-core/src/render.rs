//! Rendering of feed items into file contents.

use crate::feed::RawItem;
use chrono::{DateTime, SecondsFormat, Utc};

/// A rendered item: file extension and document bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Extension without the leading dot (e.g. `html`).
    pub extension: String,
    /// Document content.
    pub content: Vec<u8>,
}

/// Turns an item into a document.
///
/// `timestamp` is the item's resolved timestamp (see
/// [`RawItem::timestamp`]); rendering must be a pure function of its inputs
/// so that identical items produce identical bytes, and hence identical
/// identifiers, across refreshes.
pub trait Renderer: Send + Sync {
    /// Renders `item`.
    fn render(&self, item: &RawItem, timestamp: DateTime<Utc>) -> Rendered;
}

/// Author shown when an item carries none.
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Renders items as a small HTML document: a linked title heading, an
/// author/date line and the item body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, item: &RawItem, timestamp: DateTime<Utc>) -> Rendered {
        let author = item.author.as_deref().unwrap_or(UNKNOWN_AUTHOR);
        let content = format!(
            "<h1><a href=\"{link}\">{title}</a></h1>\n\
             <h2><a href=\"{link}\">{author}</a> published at {time}</h2>\n\
             {body}",
            link = item.link,
            title = item.title,
            time = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            body = item.content,
        );
        Rendered {
            extension: "html".to_string(),
            content: content.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item() -> RawItem {
        RawItem {
            title: "Post".to_string(),
            link: "http://x/post".to_string(),
            author: None,
            updated: None,
            published: None,
            content: "<p>body</p>".to_string(),
        }
    }

    #[test]
    fn test_html_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let out = HtmlRenderer.render(&item(), ts);
        assert_eq!(out.extension, "html");
        assert_eq!(
            String::from_utf8(out.content).unwrap(),
            "<h1><a href=\"http://x/post\">Post</a></h1>\n\
             <h2><a href=\"http://x/post\">Unknown author</a> published at 2024-03-04T05:06:07Z</h2>\n\
             <p>body</p>"
        );
    }

    #[test]
    fn test_html_uses_author() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let mut it = item();
        it.author = Some("Jane".to_string());
        let out = String::from_utf8(HtmlRenderer.render(&it, ts).content).unwrap();
        assert!(out.contains(">Jane</a>"));
        assert!(!out.contains(UNKNOWN_AUTHOR));
    }

    #[test]
    fn test_render_is_pure() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(HtmlRenderer.render(&item(), ts), HtmlRenderer.render(&item(), ts));
    }
}
