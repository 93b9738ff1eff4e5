//! Record → book card rendering.
//!
//! [`Card`] holds the values pulled out of a [`Record`]; the two
//! [`CardRenderer`] backends turn it into a markup string or an element tree
//! with identical structure.

use crate::airtable::model::Record;
use crate::config::Fields;
use crate::dom::Element;

pub const DEFAULT_TITLE: &str = "Untitled";

/// Separator between cards inside the gallery container.
pub const CARD_SEPARATOR: &str = "\n      ";

/// Entity-escape text for both element content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub cover: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub link: Option<Link>,
}

impl Card {
    pub fn from_record(record: &Record, fields: &Fields) -> Self {
        let cover = record
            .first_attachment(&fields.cover)
            .and_then(|a| a.url().map(str::to_string));
        let title = record.text(&fields.title).unwrap_or(DEFAULT_TITLE).to_string();
        let notes = record.text(&fields.notes).map(str::to_string);
        let link = match (record.text(&fields.link_url), record.text(&fields.link_text)) {
            (Some(url), Some(text)) => Some(Link {
                url: url.to_string(),
                text: text.to_string(),
            }),
            _ => None,
        };
        Self {
            cover,
            title,
            notes,
            link,
        }
    }

    pub fn alt_text(&self) -> String {
        format!("Cover of {}", self.title)
    }
}

impl Link {
    pub fn label(&self) -> String {
        format!("{} →", self.text)
    }
}

pub trait CardRenderer {
    type Output;

    fn render_card(&self, card: &Card) -> Self::Output;

    /// Render every record in source order.
    fn render_records(&self, records: &[Record], fields: &Fields) -> Vec<Self::Output> {
        records
            .iter()
            .map(|r| self.render_card(&Card::from_record(r, fields)))
            .collect()
    }
}

/// Markup-string backend used for the static pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl CardRenderer for HtmlRenderer {
    type Output = String;

    fn render_card(&self, card: &Card) -> String {
        let mut html = String::from("<div class=\"book-card\">");

        if let Some(cover) = &card.cover {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" class=\"book-cover\" loading=\"lazy\">",
                escape_html(cover),
                escape_html(&card.alt_text())
            ));
        }

        html.push_str(&format!(
            "<div class=\"book-title\">{}</div>",
            escape_html(&card.title)
        ));

        if let Some(notes) = &card.notes {
            html.push_str(&format!(
                "<div class=\"book-notes\">{}</div>",
                escape_html(notes)
            ));
        }

        if let Some(link) = &card.link {
            html.push_str(&format!(
                "<div class=\"book-link\"><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></div>",
                escape_html(&link.url),
                escape_html(&link.label())
            ));
        }

        html.push_str("</div>");
        html
    }
}

/// Element-tree backend used by the live renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomRenderer;

impl CardRenderer for DomRenderer {
    type Output = Element;

    fn render_card(&self, card: &Card) -> Element {
        let mut el = Element::new("div").with_class("book-card");

        if let Some(cover) = &card.cover {
            el.append_child(
                Element::new("img")
                    .with_attr("src", cover)
                    .with_attr("alt", &card.alt_text())
                    .with_class("book-cover")
                    .with_attr("loading", "lazy"),
            );
        }

        el.append_child(
            Element::new("div")
                .with_class("book-title")
                .with_text(&card.title),
        );

        if let Some(notes) = &card.notes {
            el.append_child(Element::new("div").with_class("book-notes").with_text(notes));
        }

        if let Some(link) = &card.link {
            let a = Element::new("a")
                .with_attr("href", &link.url)
                .with_attr("target", "_blank")
                .with_attr("rel", "noopener noreferrer")
                .with_text(&link.label());
            let mut wrapper = Element::new("div").with_class("book-link");
            wrapper.append_child(a);
            el.append_child(wrapper);
        }

        el
    }
}

/// Render all records to markup and join them for the gallery container.
pub fn render_cards_html(records: &[Record], fields: &Fields) -> String {
    HtmlRenderer
        .render_records(records, fields)
        .join(CARD_SEPARATOR)
}
