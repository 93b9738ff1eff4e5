//! Full-document assembly: shared chrome, heading and the card gallery.

use crate::config::{Config, PageDescriptor};
use crate::render::escape_html;

pub const LIST_VIEW_CLASS: &str = "list-view";

/// Chrome shared by every page of one build.
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    pub header: &'a str,
    pub stylesheet: &'a str,
    /// Pages listed in the navigation bar; `None` disables it.
    pub nav: Option<&'a [PageDescriptor]>,
}

impl<'a> Layout<'a> {
    pub fn from_config(cfg: &'a Config, header: &'a str) -> Self {
        Self {
            header,
            stylesheet: &cfg.site.stylesheet,
            nav: cfg.site.nav.then_some(cfg.pages.as_slice()),
        }
    }
}

/// Navigation bar; the page whose file equals `current` is marked active.
pub fn render_nav(pages: &[PageDescriptor], current: &str) -> String {
    let links: Vec<String> = pages
        .iter()
        .map(|p| {
            let active = if p.file == current { " class=\"active\"" } else { "" };
            format!(
                "<a href=\"{}\"{}>{}</a>",
                escape_html(&p.file),
                active,
                escape_html(p.label())
            )
        })
        .collect();
    format!(
        "<nav class=\"nav-links\">{}</nav>",
        links.join("<span> · </span>")
    )
}

pub fn render_page(page: &PageDescriptor, layout: &Layout<'_>, cards_html: &str) -> String {
    let body_class = if page.is_list {
        format!(" class=\"{}\"", LIST_VIEW_CLASS)
    } else {
        String::new()
    };
    let nav = layout
        .nav
        .map(|pages| render_nav(pages, &page.file))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <link rel="stylesheet" href="{stylesheet}">
</head>
<body{body_class}>
  <div class="container">
    {header}
    {nav}
    <div class="page-heading">
      <h2>{heading}</h2>
    </div>
    <div id="gallery" class="gallery">
      {cards}
    </div>
  </div>
</body>
</html>
"#,
        title = escape_html(&page.title),
        stylesheet = escape_html(layout.stylesheet),
        body_class = body_class,
        header = layout.header.trim_end(),
        nav = nav,
        heading = escape_html(&page.heading),
        cards = cards_html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(file: &str, heading: &str, is_list: bool) -> PageDescriptor {
        PageDescriptor {
            file: file.into(),
            table: "Books read".into(),
            view: heading.into(),
            title: format!("Library — {}", heading),
            heading: heading.into(),
            is_list,
            nav_label: None,
        }
    }

    #[test]
    fn grid_page_has_no_list_class() {
        let page = descriptor("2024.html", "2024", false);
        let layout = Layout {
            header: "",
            stylesheet: "styles.css",
            nav: None,
        };
        let html = render_page(&page, &layout, "<div class=\"book-card\"></div>");
        assert!(html.contains("<body>"));
        assert!(!html.contains(LIST_VIEW_CLASS));
        assert!(html.contains("<h2>2024</h2>"));
        assert!(html.contains("<title>Library — 2024</title>"));
        assert!(html.contains("<div class=\"book-card\"></div>"));
        assert!(!html.contains("nav-links"));
    }

    #[test]
    fn list_page_sets_body_class_only() {
        let grid = descriptor("a.html", "A", false);
        let list = PageDescriptor {
            is_list: true,
            ..grid.clone()
        };
        let layout = Layout {
            header: "<header>Books</header>",
            stylesheet: "styles.css",
            nav: None,
        };
        let g = render_page(&grid, &layout, "");
        let l = render_page(&list, &layout, "");
        assert!(l.contains("<body class=\"list-view\">"));
        assert_eq!(l.replace(" class=\"list-view\"", ""), g);
    }

    #[test]
    fn heading_and_title_are_escaped() {
        let page = descriptor("a.html", "Tom & <Jerry>", false);
        let layout = Layout {
            header: "",
            stylesheet: "styles.css",
            nav: None,
        };
        let html = render_page(&page, &layout, "");
        assert!(html.contains("<h2>Tom &amp; &lt;Jerry&gt;</h2>"));
        assert!(!html.contains("<Jerry>"));
    }

    #[test]
    fn nav_marks_exact_filename_active() {
        let pages = vec![
            descriptor("2025.html", "2025", false),
            descriptor("2024.html", "2024", false),
            PageDescriptor {
                nav_label: Some("Library".into()),
                ..descriptor("library.html", "All my books", true)
            },
        ];
        let nav = render_nav(&pages, "2024.html");
        assert_eq!(
            nav,
            "<nav class=\"nav-links\">\
             <a href=\"2025.html\">2025</a><span> · </span>\
             <a href=\"2024.html\" class=\"active\">2024</a><span> · </span>\
             <a href=\"library.html\">Library</a></nav>"
        );
        assert!(!render_nav(&pages, "2024.HTML").contains("active"));
        assert!(!render_nav(&pages, "/2024.html").contains("active"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let pages = vec![descriptor("a.html", "A", false), descriptor("b.html", "B", true)];
        let layout = Layout {
            header: "<header></header>\n",
            stylesheet: "styles.css",
            nav: Some(&pages),
        };
        assert_eq!(
            render_page(&pages[1], &layout, "x"),
            render_page(&pages[1], &layout, "x")
        );
    }
}
