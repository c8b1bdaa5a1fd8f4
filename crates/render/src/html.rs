//! Self-contained HTML documents for each slide kind.
//!
//! Every slide is a 720pt x 405pt page with inline styles only, so a slide
//! file can be opened or converted on its own. Images are referenced
//! relative to the slides directory.

use deck_core::{AssetRef, Slide, SlideItem};
use std::path::Path;

/// Shared page setup for every slide.
const BASE_STYLE: &str = "html { background: #ffffff; }
body {
  width: 720pt; height: 405pt; margin: 0; padding: 0;
  background: #F4F6F6; font-family: Arial, sans-serif;
  display: flex;
}
.slide { width: 720pt; height: 405pt; }
.header { background: #181B24; height: 54pt; display: flex; align-items: center; padding: 0 36pt; border-bottom: 4pt solid #B165FB; }
.header h1 { color: #ffffff; font-size: 18pt; margin: 0; }";

const COVER_STYLE: &str = "body { background: #181B24; }
.hero { width: 720pt; height: 200pt; }
.hero img { width: 720pt; height: 200pt; object-fit: cover; }
.title-block { padding: 18pt 36pt 0 36pt; }
.title-block h1 { color: #ffffff; font-size: 36pt; margin: 0 0 6pt 0; }
.subtitle { color: #B165FB; font-size: 18pt; margin: 0 0 6pt 0; }
.meta { color: #cccccc; font-size: 12pt; margin: 0; }
.accent { height: 6pt; background: #B165FB; width: 720pt; }";

const TITLE_STYLE: &str = ".header h1 { font-size: 22pt; }
.content { padding: 40pt 48pt; }
.title { font-size: 24pt; color: #181B24; margin: 0 0 12pt 0; font-weight: bold; }
.meta { font-size: 14pt; color: #333333; margin: 0 0 6pt 0; }";

const TEXT_STYLE: &str = ".content { padding: 18pt 36pt 26pt 36pt; }
.heading { font-size: 18pt; font-weight: bold; color: #181B24; margin: 0 0 8pt 0; }
.text { font-size: 13pt; color: #333333; line-height: 1.5; margin: 0 0 8pt 0; }";

const IMAGE_STYLE: &str = ".content { padding: 18pt 24pt; display: flex; flex-direction: column; align-items: center; }
.image-box { background: #ffffff; padding: 6pt; border: 1pt solid #DDDDDD; }
.caption { font-size: 11pt; color: #666666; margin: 6pt 0 0 0; text-align: center; }";

/// Image box for landscape and square images, in points.
const LANDSCAPE_BOX: (u32, u32) = (620, 280);

/// Image box for tall images, in points.
const PORTRAIT_BOX: (u32, u32) = (320, 280);

/// Height-to-width ratio above which an image counts as portrait.
const PORTRAIT_RATIO: f64 = 1.2;

const MISSING_AUTHOR: &str = "Author not shown";
const MISSING_PUBLISHED: &str = "Publication time not shown";

/// Content of the deck's cover slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverInfo {
    pub title: String,
    pub subtitle: Option<String>,
    pub note: Option<String>,

    /// File name of a banner image inside the shared assets directory.
    pub banner: Option<String>,
}

impl Default for CoverInfo {
    fn default() -> Self {
        Self::new("Slide Deck")
    }
}

impl CoverInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            note: None,
            banner: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_banner(mut self, file_name: impl Into<String>) -> Self {
        self.banner = Some(file_name.into());
        self
    }
}

/// Renders slides to HTML documents.
#[derive(Debug, Clone)]
pub struct SlideRenderer {
    cover: CoverInfo,

    /// Name of the shared assets directory, a sibling of the slides directory.
    assets_dir: String,
}

impl SlideRenderer {
    pub fn new(cover: CoverInfo) -> Self {
        Self {
            cover,
            assets_dir: "assets".to_string(),
        }
    }

    pub fn with_assets_dir(mut self, name: impl Into<String>) -> Self {
        self.assets_dir = name.into();
        self
    }

    /// Render one slide. The same slide always renders to the same text.
    pub fn render(&self, slide: &Slide) -> String {
        match slide {
            Slide::Cover => self.render_cover(),
            Slide::ArticleTitle {
                title,
                author,
                published_at,
            } => render_article_title(title, author.as_deref(), published_at.as_deref()),
            Slide::TextBody {
                items,
                article_label,
            } => render_text_body(items, article_label),
            Slide::Image {
                asset,
                caption,
                article_label,
            } => self.render_image(asset, caption, article_label),
        }
    }

    fn render_cover(&self) -> String {
        let cover = &self.cover;
        let mut body = String::from("<div>\n");

        if let Some(banner) = &cover.banner {
            body.push_str(&format!(
                "  <div class=\"hero\">\n    <img src=\"{}\" />\n  </div>\n",
                escape_html(&self.asset_src(banner))
            ));
        }
        body.push_str("  <div class=\"accent\"></div>\n  <div class=\"title-block\">\n");
        body.push_str(&format!("    <h1>{}</h1>\n", escape_html(&cover.title)));
        if let Some(subtitle) = &cover.subtitle {
            body.push_str(&format!(
                "    <p class=\"subtitle\">{}</p>\n",
                escape_html(subtitle)
            ));
        }
        if let Some(note) = &cover.note {
            body.push_str(&format!("    <p class=\"meta\">{}</p>\n", escape_html(note)));
        }
        body.push_str("  </div>\n</div>");

        page(COVER_STYLE, &body)
    }

    fn render_image(&self, asset: &AssetRef, caption: &str, label: &str) -> String {
        let (width, height) = image_box(&asset.path);
        let caption_html = if caption.is_empty() {
            String::new()
        } else {
            format!("\n    <p class=\"caption\">{}</p>", escape_html(caption))
        };

        let body = format!(
            "<div class=\"slide\">\n  {}\n  <div class=\"content\">\n    <div class=\"image-box\">\n      \
             <img src=\"{}\" style=\"width: {}pt; height: {}pt; object-fit: contain;\" />\n    \
             </div>{}\n  </div>\n</div>",
            header_bar(label),
            escape_html(&self.asset_src(&asset.file_name())),
            width,
            height,
            caption_html
        );
        page(IMAGE_STYLE, &body)
    }

    fn asset_src(&self, file_name: &str) -> String {
        format!("../{}/{}", self.assets_dir, file_name)
    }
}

fn render_article_title(title: &str, author: Option<&str>, published_at: Option<&str>) -> String {
    let body = format!(
        "<div class=\"slide\">\n  {}\n  <div class=\"content\">\n    <p class=\"title\">{}</p>\n    \
         <p class=\"meta\">Author: {}</p>\n    <p class=\"meta\">Published: {}</p>\n  </div>\n</div>",
        header_bar(title),
        escape_html(title),
        escape_html(author.unwrap_or(MISSING_AUTHOR)),
        escape_html(published_at.unwrap_or(MISSING_PUBLISHED))
    );
    page(TITLE_STYLE, &body)
}

fn render_text_body(items: &[SlideItem], label: &str) -> String {
    let content = items
        .iter()
        .map(|item| {
            let class = if item.is_heading() { "heading" } else { "text" };
            format!("<p class=\"{}\">{}</p>", class, escape_html(item.text()))
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    let body = format!(
        "<div class=\"slide\">\n  {}\n  <div class=\"content\">\n    {}\n  </div>\n</div>",
        header_bar(label),
        content
    );
    page(TEXT_STYLE, &body)
}

fn header_bar(title: &str) -> String {
    format!("<div class=\"header\"><h1>{}</h1></div>", escape_html(title))
}

fn page(style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        BASE_STYLE, style, body
    )
}

/// Box the image is fitted into. Images whose size cannot be read are
/// treated as landscape.
fn image_box(path: &Path) -> (u32, u32) {
    match image::image_dimensions(path) {
        Ok((w, h)) if f64::from(h) > f64::from(w) * PORTRAIT_RATIO => PORTRAIT_BOX,
        Ok(_) => LANDSCAPE_BOX,
        Err(e) => {
            log::debug!("Cannot read size of {}: {}", path.display(), e);
            LANDSCAPE_BOX
        }
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
