//! Markdown renderer using pulldown-cmark.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::{
    escape_html,
    syntax::{SyntaxHighlighter, plain_code_block},
};

/// Markdown renderer with optional syntax highlighting.
#[derive(Debug)]
pub struct MarkdownRenderer {
    highlighter: Option<SyntaxHighlighter>,
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A fenced or indented code block being collected.
struct CodeBlock {
    lang: Option<String>,
    code: String,
}

/// An image whose alt text is being collected.
struct Image {
    src: String,
    title: String,
    alt: String,
}

impl MarkdownRenderer {
    /// Create a new renderer without highlighting.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: None,
            options,
        }
    }

    /// Create a renderer that highlights fenced code with the given theme.
    pub fn with_highlighting(theme: &str) -> Self {
        Self {
            highlighter: Some(SyntaxHighlighter::new(theme)),
            ..Self::new()
        }
    }

    /// Render a Markdown body to an HTML fragment.
    ///
    /// Never fails: malformed constructs come out as literal text.
    pub fn render(&self, content: &str) -> String {
        let parser = Parser::new_ext(content, self.options);
        let mut html = String::with_capacity(content.len() * 3 / 2);
        let mut code_block: Option<CodeBlock> = None;
        let mut image: Option<Image> = None;
        let mut in_table_head = false;

        for event in parser {
            if image.is_some() {
                match event {
                    Event::End(TagEnd::Image) => {
                        if let Some(img) = image.take() {
                            html.push_str(&image_html(&img));
                        }
                    }
                    Event::Text(text) | Event::Code(text) => {
                        if let Some(img) = image.as_mut() {
                            img.alt.push_str(&text);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(CodeBlock {
                        lang,
                        code: String::new(),
                    });
                }

                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        html.push_str(&self.code_block_html(&block.code, block.lang.as_deref()));
                    }
                }

                Event::Text(text) => match code_block.as_mut() {
                    Some(block) => block.code.push_str(&text),
                    None => html.push_str(&escape_html(&text)),
                },

                Event::Code(code) => {
                    html.push_str(&format!("<code>{}</code>", escape_html(&code)));
                }

                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    image = Some(Image {
                        src: dest_url.to_string(),
                        title: title.to_string(),
                        alt: String::new(),
                    });
                }

                Event::Start(Tag::TableHead) => {
                    in_table_head = true;
                    html.push_str("<thead><tr>");
                }

                Event::End(TagEnd::TableHead) => {
                    in_table_head = false;
                    html.push_str("</tr></thead>\n<tbody>\n");
                }

                Event::Start(Tag::TableCell) => {
                    html.push_str(if in_table_head { "<th>" } else { "<td>" });
                }

                Event::End(TagEnd::TableCell) => {
                    html.push_str(if in_table_head { "</th>" } else { "</td>" });
                }

                Event::SoftBreak => html.push('\n'),

                Event::HardBreak => html.push_str("<br />\n"),

                Event::Start(tag) => html.push_str(&tag_to_html_start(&tag)),

                Event::End(tag) => html.push_str(&tag_to_html_end(&tag)),

                Event::Html(raw) | Event::InlineHtml(raw) => html.push_str(&raw),

                Event::FootnoteReference(name) => {
                    let name = escape_html(&name);
                    html.push_str(&format!(
                        "<sup class=\"footnote-ref\"><a href=\"#fn-{name}\">[{name}]</a></sup>"
                    ));
                }

                Event::Rule => html.push_str("<hr />\n"),

                Event::TaskListMarker(checked) => {
                    html.push_str(if checked {
                        "<input type=\"checkbox\" checked disabled />"
                    } else {
                        "<input type=\"checkbox\" disabled />"
                    });
                }

                Event::InlineMath(math) => {
                    html.push_str(&format!(
                        "<span class=\"math inline\">\\({}\\)</span>",
                        escape_html(&math)
                    ));
                }

                Event::DisplayMath(math) => {
                    html.push_str(&format!(
                        "<div class=\"math display\">\\[{}\\]</div>",
                        escape_html(&math)
                    ));
                }
            }
        }

        html
    }

    fn code_block_html(&self, code: &str, lang: Option<&str>) -> String {
        match &self.highlighter {
            Some(highlighter) => highlighter.highlight(code, lang),
            None => plain_code_block(code, lang),
        }
    }
}

fn image_html(img: &Image) -> String {
    let title_attr = if img.title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(&img.title))
    };
    format!(
        "<img src=\"{}\" alt=\"{}\"{title_attr} />",
        escape_html(&img.src),
        escape_html(&img.alt)
    )
}

/// Convert a pulldown-cmark tag to HTML opening tag.
fn tag_to_html_start(tag: &Tag) -> String {
    match tag {
        Tag::Paragraph => "<p>".to_string(),
        Tag::Heading { level, id, .. } => {
            let id_attr = id
                .as_ref()
                .map(|i| format!(" id=\"{}\"", escape_html(i)))
                .unwrap_or_default();
            format!("<h{}{id_attr}>", *level as u8)
        }
        Tag::BlockQuote(_) => "<blockquote>\n".to_string(),
        Tag::List(Some(1)) => "<ol>\n".to_string(),
        Tag::List(Some(start)) => format!("<ol start=\"{start}\">\n"),
        Tag::List(None) => "<ul>\n".to_string(),
        Tag::Item => "<li>".to_string(),
        Tag::FootnoteDefinition(name) => {
            format!("<div class=\"footnote\" id=\"fn-{}\">", escape_html(name))
        }
        Tag::Table(_) => "<table>\n".to_string(),
        Tag::TableRow => "<tr>".to_string(),
        Tag::Emphasis => "<em>".to_string(),
        Tag::Strong => "<strong>".to_string(),
        Tag::Strikethrough => "<del>".to_string(),
        Tag::Link {
            dest_url, title, ..
        } => {
            let title_attr = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", escape_html(title))
            };
            format!("<a href=\"{}\"{title_attr}>", escape_html(dest_url))
        }
        Tag::DefinitionList => "<dl>\n".to_string(),
        Tag::DefinitionListTitle => "<dt>".to_string(),
        Tag::DefinitionListDefinition => "<dd>".to_string(),
        Tag::Superscript => "<sup>".to_string(),
        Tag::Subscript => "<sub>".to_string(),
        // Handled in the render loop or carrying no markup.
        Tag::CodeBlock(_)
        | Tag::Image { .. }
        | Tag::TableHead
        | Tag::TableCell
        | Tag::HtmlBlock
        | Tag::MetadataBlock(_) => String::new(),
    }
}

/// Convert a pulldown-cmark tag end to HTML closing tag.
fn tag_to_html_end(tag: &TagEnd) -> String {
    match tag {
        TagEnd::Paragraph => "</p>\n".to_string(),
        TagEnd::Heading(level) => format!("</h{}>\n", *level as u8),
        TagEnd::BlockQuote(_) => "</blockquote>\n".to_string(),
        TagEnd::List(true) => "</ol>\n".to_string(),
        TagEnd::List(false) => "</ul>\n".to_string(),
        TagEnd::Item => "</li>\n".to_string(),
        TagEnd::FootnoteDefinition => "</div>\n".to_string(),
        TagEnd::Table => "</tbody>\n</table>\n".to_string(),
        TagEnd::TableRow => "</tr>\n".to_string(),
        TagEnd::Emphasis => "</em>".to_string(),
        TagEnd::Strong => "</strong>".to_string(),
        TagEnd::Strikethrough => "</del>".to_string(),
        TagEnd::Link => "</a>".to_string(),
        TagEnd::DefinitionList => "</dl>\n".to_string(),
        TagEnd::DefinitionListTitle => "</dt>\n".to_string(),
        TagEnd::DefinitionListDefinition => "</dd>\n".to_string(),
        TagEnd::Superscript => "</sup>".to_string(),
        TagEnd::Subscript => "</sub>".to_string(),
        TagEnd::CodeBlock
        | TagEnd::Image
        | TagEnd::TableHead
        | TagEnd::TableCell
        | TagEnd::HtmlBlock
        | TagEnd::MetadataBlock(_) => String::new(),
    }
}
