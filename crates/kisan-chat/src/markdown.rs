//! Markdown-to-markup rendering for assistant replies.
//!
//! A small, stateless subset: headings, bullet and numbered lists, bold,
//! emphasis, inline code, paragraphs and line breaks. Input is HTML-escaped
//! before any markup is produced.

use std::sync::LazyLock;

use regex::Regex;

/// Pure text transform from reply text to display markup.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid heading regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("valid bullet regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.*)$").expect("valid numbered regex"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid code regex"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("valid emphasis regex"));

/// HTML renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlMarkdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Paragraph,
    Bullets,
    Numbers,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn inline(text: &str) -> String {
    let text = CODE.replace_all(text, "<code>$1</code>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    EMPHASIS.replace_all(&text, "<em>$1</em>").into_owned()
}

fn close(block: Block, out: &mut String) {
    match block {
        Block::None => {}
        Block::Paragraph => out.push_str("</p>"),
        Block::Bullets => out.push_str("</ul>"),
        Block::Numbers => out.push_str("</ol>"),
    }
}

impl MarkdownRenderer for HtmlMarkdown {
    fn render(&self, text: &str) -> String {
        let escaped = escape(text);
        let mut out = String::new();
        let mut block = Block::None;

        for line in escaped.lines() {
            if line.trim().is_empty() {
                close(block, &mut out);
                block = Block::None;
                continue;
            }

            if let Some(caps) = HEADING.captures(line) {
                close(block, &mut out);
                block = Block::None;
                let level = caps[1].len();
                out.push_str(&format!("<h{level}>{}</h{level}>", inline(caps[2].trim())));
            } else if let Some(caps) = BULLET.captures(line) {
                if block != Block::Bullets {
                    close(block, &mut out);
                    out.push_str("<ul>");
                    block = Block::Bullets;
                }
                out.push_str(&format!("<li>{}</li>", inline(&caps[1])));
            } else if let Some(caps) = NUMBERED.captures(line) {
                if block != Block::Numbers {
                    close(block, &mut out);
                    out.push_str("<ol>");
                    block = Block::Numbers;
                }
                out.push_str(&format!("<li>{}</li>", inline(&caps[1])));
            } else if block == Block::Paragraph {
                out.push_str("<br>");
                out.push_str(&inline(line.trim()));
            } else {
                close(block, &mut out);
                out.push_str("<p>");
                out.push_str(&inline(line.trim()));
                block = Block::Paragraph;
            }
        }
        close(block, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        HtmlMarkdown.render(text)
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(render("Sow early.\nWater daily."), "<p>Sow early.<br>Water daily.</p>");
        assert_eq!(render("One.\n\nTwo."), "<p>One.</p><p>Two.</p>");
    }

    #[test]
    fn test_inline_styles() {
        assert_eq!(
            render("Use **neem oil** and *not* `urea`"),
            "<p>Use <strong>neem oil</strong> and <em>not</em> <code>urea</code></p>"
        );
    }

    #[test]
    fn test_heading() {
        assert_eq!(render("## Wheat"), "<h2>Wheat</h2>");
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            render("Options:\n- Wheat\n- Mustard\n1. Plough\n2. Sow"),
            "<p>Options:</p><ul><li>Wheat</li><li>Mustard</li></ul><ol><li>Plough</li><li>Sow</li></ol>"
        );
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(
            render("<script>alert(1)</script> & more"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n"), "");
    }
}
