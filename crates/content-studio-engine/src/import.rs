//! Creating blocks from source material: plain copy and markdown.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::models::{
    Annotation, BlockBody, ContentBlock, DividerBlock, HtmlBlock, ImageBlock, ListBlock, Mark,
    TextBlock, TextElement,
};

fn heading_prefix(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some((hashes as u8, title))
}

/// Split imported copy into blocks on blank lines.
///
/// A chunk that is a single `#`..`######` line becomes a heading; everything
/// else becomes a paragraph with its line breaks kept.
pub fn split_source_text(text: &str) -> Vec<ContentBlock> {
    fn flush(chunk: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
        if chunk.is_empty() {
            return;
        }
        let joined = chunk.join("\n");
        chunk.clear();
        let joined = joined.trim();
        match heading_prefix(joined) {
            Some((level, title)) if !joined.contains('\n') => {
                blocks.push(ContentBlock::heading(level, title));
            }
            _ => blocks.push(ContentBlock::text(joined)),
        }
    }

    let mut blocks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut chunk, &mut blocks);
        } else {
            chunk.push(line.trim_end());
        }
    }
    flush(&mut chunk, &mut blocks);
    blocks
}

/// Parse markdown into blocks.
///
/// Headings and paragraphs keep bold, italic and link marks as annotations.
/// Lists are flattened into a single unordered list block, code blocks and
/// raw HTML become html blocks, and images standing on their own become
/// image blocks.
pub fn blocks_from_markdown(markdown: &str) -> Vec<ContentBlock> {
    let mut processor = MarkdownProcessor::default();
    for event in Parser::new(markdown) {
        processor.process_event(event);
    }
    processor.finalize()
}

struct PendingImage {
    url: String,
    title: String,
    alt: String,
}

#[derive(Default)]
struct MarkdownProcessor {
    blocks: Vec<ContentBlock>,
    current_text: String,
    annotations: Vec<Annotation>,
    /// Open inline marks with the byte offset where they started.
    open_marks: Vec<(usize, Mark)>,
    list_items: Vec<String>,
    /// Text of the items being built, innermost last.
    item_stack: Vec<String>,
    list_depth: usize,
    image: Option<PendingImage>,
    html: Option<String>,
    code: Option<String>,
    code_language: Option<String>,
}

impl MarkdownProcessor {
    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) | Event::Start(Tag::BlockQuote(_)) => {
                if self.list_depth == 0 {
                    self.flush_paragraph();
                }
            }
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::BlockQuote(_)) => {
                if self.list_depth == 0 {
                    self.flush_paragraph();
                }
            }
            Event::Start(Tag::Heading { .. }) => self.flush_paragraph(),
            Event::End(TagEnd::Heading(level)) => {
                self.flush_text(TextElement::heading(level as u8));
            }
            Event::Start(Tag::List(_)) => {
                if self.list_depth == 0 {
                    self.flush_paragraph();
                } else if let Some(parent) = self.item_stack.last_mut() {
                    // Nested items follow their parent.
                    let text = std::mem::take(parent);
                    if !text.trim().is_empty() {
                        self.list_items.push(text.trim().to_string());
                    }
                }
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 && !self.list_items.is_empty() {
                    let items = std::mem::take(&mut self.list_items);
                    self.blocks
                        .push(ContentBlock::new(BlockBody::List(ListBlock::new(items))));
                }
            }
            Event::Start(Tag::Item) => self.item_stack.push(String::new()),
            Event::End(TagEnd::Item) => {
                if let Some(text) = self.item_stack.pop()
                    && !text.trim().is_empty()
                {
                    self.list_items.push(text.trim().to_string());
                }
            }
            Event::Start(Tag::Strong) => self.open_mark(Mark::Bold),
            Event::Start(Tag::Emphasis) => self.open_mark(Mark::Italic),
            Event::Start(Tag::Link { dest_url, .. }) => self.open_mark(Mark::Link {
                url: dest_url.to_string(),
            }),
            Event::End(TagEnd::Strong) | Event::End(TagEnd::Emphasis) | Event::End(TagEnd::Link) => {
                self.close_mark();
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                if self.list_depth == 0 {
                    self.flush_paragraph();
                }
                self.image = Some(PendingImage {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(image) = self.image.take() {
                    let mut block = ImageBlock::new(image.url, image.alt.trim());
                    if !image.title.is_empty() {
                        block.caption = Some(image.title);
                    }
                    self.blocks.push(ContentBlock::new(BlockBody::Image(block)));
                }
            }
            Event::Start(Tag::HtmlBlock) => {
                self.flush_paragraph();
                self.html = Some(String::new());
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(html) = self.html.take() {
                    self.push_html(html.trim().to_string(), None);
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_paragraph();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code = Some(String::new());
                self.code_language = language;
            }
            Event::End(TagEnd::CodeBlock) => {
                let language = self.code_language.take();
                if let Some(code) = self.code.take() {
                    let class = language
                        .as_deref()
                        .map(|lang| {
                            format!(
                                " class=\"language-{}\"",
                                html_escape::encode_double_quoted_attribute(lang)
                            )
                        })
                        .unwrap_or_default();
                    let html = format!(
                        "<pre><code{class}>{}</code></pre>",
                        html_escape::encode_text(code.trim_end_matches('\n'))
                    );
                    self.push_html(html, language.map(|lang| format!("{lang} code")));
                }
            }
            Event::Rule => {
                self.flush_paragraph();
                self.blocks
                    .push(ContentBlock::new(BlockBody::Divider(DividerBlock::default())));
            }
            Event::Html(html) => {
                if let Some(buffer) = self.html.as_mut() {
                    buffer.push_str(&html);
                } else {
                    self.push_text(&html);
                }
            }
            Event::Text(text) => {
                if let Some(code) = &mut self.code {
                    code.push_str(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(code) | Event::InlineHtml(code) => self.push_text(&code),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if let Some(item) = self.item_stack.last_mut() {
            item.push_str(text);
        } else {
            self.current_text.push_str(text);
        }
    }

    fn push_html(&mut self, content: String, description: Option<String>) {
        if content.is_empty() {
            return;
        }
        self.blocks.push(ContentBlock::new(BlockBody::Html(HtmlBlock {
            content,
            description,
        })));
    }

    fn open_mark(&mut self, mark: Mark) {
        self.open_marks.push((self.current_text.len(), mark));
    }

    fn close_mark(&mut self) {
        let Some((start, mark)) = self.open_marks.pop() else {
            return;
        };
        // Marks inside list items and image alt text are dropped.
        if self.item_stack.is_empty() && self.image.is_none() {
            let end = self.current_text.len();
            if start < end {
                self.annotations.push(Annotation::new(start, end, mark));
            }
        }
    }

    fn flush_paragraph(&mut self) {
        self.flush_text(TextElement::P);
    }

    fn flush_text(&mut self, element: TextElement) {
        let raw = std::mem::take(&mut self.current_text);
        let mut annotations = std::mem::take(&mut self.annotations);
        self.open_marks.clear();

        let leading = raw.len() - raw.trim_start().len();
        let content = raw.trim();
        if content.is_empty() {
            return;
        }
        for annotation in &mut annotations {
            annotation.start = annotation.start.saturating_sub(leading);
            annotation.end = annotation.end.saturating_sub(leading).min(content.len());
        }
        annotations.retain(|annotation| annotation.fits(content));

        let mut text = TextBlock::new(content);
        text.element = element;
        text.formatting.annotations = annotations;
        self.blocks.push(ContentBlock::new(BlockBody::Text(text)));
    }

    fn finalize(mut self) -> Vec<ContentBlock> {
        self.flush_paragraph();
        self.blocks
    }
}
