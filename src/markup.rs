//! Just enough HTML handling to read Wiktionary's Parsoid output.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h[2-4]\b[^>]*>(.*?)</h[2-4]\s*>").expect("valid heading regex")
});
static HEADING_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h[2-4]\b").expect("valid heading-open regex"));
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid paragraph regex"));
static INVISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid block regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex")
});
static EDIT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\s*edit\s*\]").expect("valid edit-link regex"));

/// A heading and the markup that follows it up to the next heading.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub title_html: &'a str,
    pub body_html: &'a str,
}

impl Section<'_> {
    pub fn title(&self) -> String {
        let text = text_content(self.title_html);
        EDIT_LINK.replace_all(&text, "").trim().to_string()
    }

    pub fn paragraphs(&self) -> Vec<String> {
        paragraphs(self.body_html)
    }
}

/// Iterates `h2`–`h4` sections in document order.
pub fn sections(html: &str) -> impl Iterator<Item = Section<'_>> + '_ {
    HEADING.captures_iter(html).filter_map(move |caps| {
        let whole = caps.get(0)?;
        let rest = &html[whole.end()..];
        let body_end = HEADING_OPEN
            .find(rest)
            .map(|m| m.start())
            .unwrap_or(rest.len());
        Some(Section {
            title_html: caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
            body_html: &rest[..body_end],
        })
    })
}

/// Text of every `<p>` element, whitespace-collapsed, in document order.
pub fn paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH
        .captures_iter(html)
        .map(|caps| text_content(&caps[1]))
        .collect()
}

/// Visible text of a fragment with tags removed and entities decoded.
pub fn text_content(html: &str) -> String {
    let visible = INVISIBLE.replace_all(html, " ");
    let stripped = TAG.replace_all(&visible, "");
    collapse_whitespace(&decode_entities(&stripped))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            decode_entity(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "–",
        "mdash" => "—",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        _ => return None,
    };
    Some(decoded.to_string())
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_content_strips_tags_and_entities() {
        let html = r#"<span class="etyl">From <a href="x">Old&nbsp;English</a> <i>wæter</i> &amp; more</span>"#;
        assert_eq!(text_content(html), "From Old English wæter & more");
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode_entities("&#8220;water&#x201D;"), "“water”");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn sections_stop_at_next_heading() {
        let html = "<h2>English</h2><p>intro</p><h3 id=\"Etymology\">Etymology [edit]</h3><p>one</p><pre>x</pre><p>two</p><h3>Noun</h3><p>three</p>";
        let all: Vec<_> = sections(html).collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].title(), "Etymology");
        assert_eq!(all[1].paragraphs(), vec!["one", "two"]);
        assert_eq!(all[2].paragraphs(), vec!["three"]);
    }

    #[test]
    fn escape_handles_markup_characters() {
        assert_eq!(escape("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
