//! HTML to markdown conversion for event descriptions.
//!
//! Event descriptions arrive as HTML fragments. [`html_to_markdown`] renders
//! them as markdown-flavoured text:
//!
//! | HTML | Markdown |
//! |------|----------|
//! | `<p>`, `<div>` | paragraphs separated by a blank line |
//! | `<br>` | hard line break (two trailing spaces) |
//! | `<h1>`..`<h6>` | `#` .. `######` |
//! | `<strong>`, `<b>` | `**text**` |
//! | `<em>`, `<i>` | `_text_` |
//! | `<code>` | `` `text` `` |
//! | `<a href>` | `[text](href)` |
//! | `<img>` | `![alt](src)` |
//! | `<ul>`, `<ol>` | `  * item`, `  1. item` |
//! | `<blockquote>` | `> ` prefixed lines |
//! | `<hr>` | `* * *` |
//! | `<pre>` | four-space indented block |
//!
//! Script, style and head content is dropped. Entities are decoded by the
//! HTML parser, so `&nbsp;` comes out as U+00A0.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank-line regex"));

/// Converts an HTML fragment to markdown.
///
/// Leading blank lines and all trailing whitespace are removed, so the
/// result carries no trailing newline. Plain text without
/// markup passes through with only ASCII whitespace runs collapsed.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut writer = MarkdownWriter::default();
    writer.children(fragment.root_element());
    writer.finish()
}

#[derive(Debug, Clone, Copy)]
enum ListState {
    Unordered,
    Ordered(usize),
}

#[derive(Debug, Default)]
struct MarkdownWriter {
    out: String,
    pending_space: bool,
    /// Set after an opening inline marker; the next word follows it directly.
    hug_next: bool,
    quote_depth: usize,
    lists: Vec<ListState>,
}

impl MarkdownWriter {
    fn children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(&**text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            "script" | "style" | "head" | "title" | "template" => {}
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "table" => {
                self.paragraph_break();
                self.children(element);
                self.paragraph_break();
            }
            "tr" => {
                self.line_break();
                self.children(element);
                self.line_break();
            }
            "br" => {
                self.pending_space = false;
                self.start_line();
                self.out.push_str("  \n");
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                self.paragraph_break();
                self.write(&format!("{} ", "#".repeat(level)));
                self.children(element);
                self.paragraph_break();
            }
            "strong" | "b" => self.inline(element, "**"),
            "em" | "i" => self.inline(element, "_"),
            "code" => self.inline(element, "`"),
            "a" => self.link(element),
            "img" => {
                if let Some(src) = element.value().attr("src") {
                    let alt = element.value().attr("alt").unwrap_or_default();
                    self.write(&format!("![{}]({})", alt, src));
                }
            }
            "ul" | "ol" => {
                if self.lists.is_empty() {
                    self.paragraph_break();
                } else {
                    self.line_break();
                }
                self.lists.push(if name == "ol" {
                    ListState::Ordered(0)
                } else {
                    ListState::Unordered
                });
                self.children(element);
                self.lists.pop();
                if self.lists.is_empty() {
                    self.paragraph_break();
                } else {
                    self.line_break();
                }
            }
            "li" => {
                self.line_break();
                let indent = "  ".repeat(self.lists.len().max(1));
                let marker = match self.lists.last_mut() {
                    Some(ListState::Ordered(n)) => {
                        *n += 1;
                        format!("{}. ", n)
                    }
                    _ => "* ".to_string(),
                };
                self.write(&format!("{}{}", indent, marker));
                self.children(element);
                self.line_break();
            }
            "blockquote" => {
                self.paragraph_break();
                self.quote_depth += 1;
                self.children(element);
                self.line_break();
                self.quote_depth -= 1;
                self.paragraph_break();
            }
            "hr" => {
                self.paragraph_break();
                self.write("* * *");
                self.paragraph_break();
            }
            "pre" => {
                self.paragraph_break();
                let text: String = element.text().collect();
                for line in text.trim_matches('\n').lines() {
                    self.start_line();
                    self.out.push_str("    ");
                    self.out.push_str(line);
                    self.out.push('\n');
                }
                self.paragraph_break();
            }
            _ => self.children(element),
        }
    }

    fn inline(&mut self, element: ElementRef<'_>, marker: &str) {
        let text: String = element.text().collect();
        if text.trim_matches(|c: char| c.is_ascii_whitespace()).is_empty() {
            self.children(element);
            return;
        }
        if text.starts_with(|c: char| c.is_ascii_whitespace()) {
            self.pending_space = true;
        }
        self.write(marker);
        self.hug_next = true;
        self.children(element);
        // Closing markers hug the text; a pending space stays pending.
        self.out.push_str(marker);
    }

    fn link(&mut self, element: ElementRef<'_>) {
        let href = element
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|h| !h.is_empty());
        let text = collapse_whitespace(&element.text().collect::<String>());

        match href {
            None => self.children(element),
            Some(_) if text.is_empty() => self.children(element),
            Some(href) if text == href => self.write(href),
            Some(href) => self.write(&format!("[{}]({})", text, href)),
        }
    }

    fn text(&mut self, text: &str) {
        let mut word = String::new();
        for ch in text.chars() {
            if ch.is_ascii_whitespace() {
                if !word.is_empty() {
                    self.write(&word);
                    word.clear();
                }
                self.pending_space = true;
            } else {
                word.push(ch);
            }
        }
        if !word.is_empty() {
            self.write(&word);
        }
    }

    fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.pending_space && !self.hug_next && !self.at_line_start() && !self.out.ends_with(' ') {
            self.out.push(' ');
        }
        self.pending_space = false;
        self.hug_next = false;
        self.start_line();
        self.out.push_str(s);
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn start_line(&mut self) {
        if self.at_line_start() && self.quote_depth > 0 {
            self.out.push_str(&"> ".repeat(self.quote_depth));
        }
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        if !self.at_line_start() {
            self.out.push('\n');
        }
    }

    fn paragraph_break(&mut self) {
        self.pending_space = false;
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn finish(self) -> String {
        let normalized = self
            .out
            .lines()
            .map(|line| if line.trim().is_empty() { "" } else { line })
            .collect::<Vec<_>>()
            .join("\n");
        BLANK_RUNS
            .replace_all(&normalized, "\n\n")
            .trim_start_matches('\n')
            .trim_end()
            .to_string()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}
