use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use super::{trim_url, OutputStage, StageError, URL_PATTERN};

const STAGE_NAME: &str = "link_buttons";
const LABEL_PATH_CHARS: usize = 20;

// Markdown links come first in the alternation so their URL is never picked
// up again as a bare URL.
static LINK_REGEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\[(?P<text>[^\]]+)\]\((?P<target>{URL_PATTERN})\)|(?P<bare>{URL_PATTERN})"
    ))
});

/// Renders markdown links and bare URLs as HTML buttons that open in a new tab
pub struct LinkButtonStage {
    class: String,
}

impl LinkButtonStage {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
        }
    }

    fn button(&self, url: &str, label: &str) -> String {
        format!(
            r#"<button class="{}" onclick="window.open('{}', '_blank')">{}</button>"#,
            self.class,
            url.replace('\'', "%27"),
            escape_html(label)
        )
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `host + path` for short paths, else `host + first 20 path chars + "..."`.
/// Query and fragment are not shown.
pub fn bare_url_label(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (host, tail) = rest.split_at(host_end);
    let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
    let path = &tail[..path_end];

    if path.chars().count() > LABEL_PATH_CHARS {
        let head: String = path.chars().take(LABEL_PATH_CHARS).collect();
        format!("{host}{head}...")
    } else {
        format!("{host}{path}")
    }
}

impl OutputStage for LinkButtonStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let regex = LINK_REGEX
            .as_ref()
            .map_err(|e| StageError::Internal(format!("link pattern failed to compile: {e}")))?;

        let mut markdown_links = 0usize;
        let mut bare_urls = 0usize;

        let rendered = regex.replace_all(text, |caps: &Captures| {
            if let (Some(label), Some(target)) = (caps.name("text"), caps.name("target")) {
                markdown_links += 1;
                return self.button(target.as_str(), label.as_str());
            }
            match caps.name("bare") {
                Some(bare) => {
                    let url = trim_url(bare.as_str());
                    let trailing = &bare.as_str()[url.len()..];
                    bare_urls += 1;
                    format!("{}{}", self.button(url, &bare_url_label(url)), trailing)
                }
                None => caps[0].to_string(),
            }
        });

        if markdown_links > 0 || bare_urls > 0 {
            debug!(markdown_links, bare_urls, "urls converted to buttons");
        }
        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage() -> LinkButtonStage {
        LinkButtonStage::new("hsbc-link-button")
    }

    #[test]
    fn test_markdown_link() {
        assert_eq!(
            stage().apply("See [Card offers](https://hsbc.com.hk/cards) now").unwrap(),
            "See <button class=\"hsbc-link-button\" \
             onclick=\"window.open('https://hsbc.com.hk/cards', '_blank')\">Card offers</button> now"
        );
    }

    #[test]
    fn test_bare_url_label() {
        assert_eq!(bare_url_label("https://hsbc.com"), "hsbc.com");
        assert_eq!(bare_url_label("https://hsbc.com/short"), "hsbc.com/short");
        assert_eq!(
            bare_url_label("https://www.hsbc.com.hk/credit-cards/products/visa?x=1"),
            "www.hsbc.com.hk/credit-cards/produc..."
        );
        // Exactly 20 characters keeps the whole path
        assert_eq!(
            bare_url_label("https://hsbc.com/abcdefghijklmnopqrs"),
            "hsbc.com/abcdefghijklmnopqrs"
        );
    }

    #[test]
    fn test_bare_url_keeps_sentence_punctuation() {
        assert_eq!(
            stage().apply("Visit https://hsbc.com/help.").unwrap(),
            "Visit <button class=\"hsbc-link-button\" \
             onclick=\"window.open('https://hsbc.com/help', '_blank')\">hsbc.com/help</button>."
        );
    }

    #[test]
    fn test_mixed_links_render_once() {
        let out = stage()
            .apply("[Home](https://hsbc.com) and https://hsbc.com.hk")
            .unwrap();
        assert_eq!(out.matches("<button").count(), 2);
        assert!(out.contains(">Home</button>"));
        assert!(out.contains(">hsbc.com.hk</button>"));
    }

    #[test]
    fn test_escaping() {
        let out = stage()
            .apply("[Terms & <b>conditions</b>](https://hsbc.com/t's)")
            .unwrap();
        assert!(out.contains("window.open('https://hsbc.com/t%27s', '_blank')"));
        assert!(out.contains(">Terms &amp; &lt;b&gt;conditions&lt;/b&gt;</button>"));
    }

    #[test]
    fn test_custom_class_and_plain_text() {
        let stage = LinkButtonStage::new("link-btn");
        assert!(stage
            .apply("https://hsbc.com")
            .unwrap()
            .starts_with("<button class=\"link-btn\""));
        assert_eq!(stage.apply("no links").unwrap(), "no links");
    }
}
