use crate::fetcher::ImageList;

const LINK_MARKER: &str = "data-image-link";
const SRC_MARKER: &str = "data-image-src";
const TEXT_SLOT: &str = "{{URL}}";

/// Markup cloned once per image. The URL is bound into the element carrying
/// `data-image-link` (as `href`), the one carrying `data-image-src` (as
/// `src`), and any `{{URL}}` text slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    markup: String,
}

impl Template {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn card() -> Self {
        Self::new(
            r#"<figure class="card"><a data-image-link target="_blank" rel="noopener"><img data-image-src alt="Gallery image" loading="lazy" /></a></figure>"#,
        )
    }

    pub fn link() -> Self {
        Self::new(r#"<li><a data-image-link target="_blank" rel="noopener">{{URL}}</a></li>"#)
    }

    pub fn instantiate(&self, url: &str) -> String {
        let escaped = escape_html(url);
        self.markup
            .replacen(LINK_MARKER, &format!(r#"{LINK_MARKER} href="{escaped}""#), 1)
            .replacen(SRC_MARKER, &format!(r#"{SRC_MARKER} src="{escaped}""#), 1)
            .replace(TEXT_SLOT, &escaped)
    }
}

/// Element that receives rendered instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    children: Vec<String>,
}

impl Container {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn append(&mut self, child: String) {
        self.children.push(child);
    }

    pub fn inner_html(&self) -> String {
        self.children.concat()
    }
}

/// Replaces the container's content with one template instance per URL and
/// returns how many were rendered. Missing collaborators make this a no-op.
pub fn render_images(
    images: &ImageList,
    template: Option<&Template>,
    container: Option<&mut Container>,
) -> usize {
    let (Some(template), Some(container)) = (template, container) else {
        return 0;
    };

    container.clear();
    for url in images.urls() {
        container.append(template.instantiate(url));
    }
    container.children().len()
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            // Braces would otherwise read as template placeholders.
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
