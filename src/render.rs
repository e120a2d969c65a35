use anyhow::Context as _;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::chunks::ChunkedDocument;
use crate::cli::RenderArgs;
use crate::formats::Heading;
use crate::toc::{Slugger, extract_headings, slugify};

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read markdown: {}", args.input))?;
    let doc = match args.loaded {
        Some(loaded) => ChunkedDocument::resume(&text, loaded),
        None => ChunkedDocument::new(&text),
    };
    tracing::info!(
        loaded = doc.loaded(),
        total = doc.total(),
        input = %args.input,
        "render chunks"
    );

    let html = render_chunks(doc.visible()).concat();
    match args.out {
        Some(out) => {
            std::fs::write(&out, html).with_context(|| format!("write html: {out}"))?;
        }
        None => print!("{html}"),
    }
    Ok(())
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Renders chunks in order. Heading anchors are the ids
/// [`crate::toc::extract_headings`] gives for the same text.
pub fn render_chunks<S: AsRef<str>>(chunks: &[S]) -> Vec<String> {
    let text = chunks.iter().map(AsRef::as_ref).collect::<String>();
    let mut anchors = Anchors::for_text(&text);
    chunks
        .iter()
        .map(|chunk| render_fragment(chunk.as_ref(), &mut anchors))
        .collect()
}

/// HTML for `chunks[from..to]`. Earlier chunks are still rendered so that
/// duplicate-heading suffixes stay consistent.
pub fn render_window<S: AsRef<str>>(chunks: &[S], from: usize, to: usize) -> Vec<String> {
    let to = to.min(chunks.len());
    let from = from.min(to);
    let mut rendered = render_chunks(&chunks[..to]);
    rendered.drain(..from);
    rendered
}

/// Walks the TOC in document order, handing each rendered heading the next
/// entry with the same level and slug. Headings the TOC does not list get
/// fresh slugs that collide with no TOC id.
struct Anchors {
    toc: Vec<Heading>,
    next: usize,
    fallback: Slugger,
}

impl Anchors {
    fn for_text(text: &str) -> Self {
        let toc = extract_headings(text);
        let mut fallback = Slugger::default();
        for heading in &toc {
            fallback.slug(&heading.title);
        }
        Self {
            toc,
            next: 0,
            fallback,
        }
    }

    fn id(&mut self, level: u8, title: &str) -> String {
        let base = slugify(title);
        let found = self.toc[self.next..]
            .iter()
            .position(|h| h.level == level && slugify(&h.title) == base);
        match found {
            Some(offset) => {
                let idx = self.next + offset;
                self.next = idx + 1;
                self.toc[idx].id.clone()
            }
            None => self.fallback.slug(title),
        }
    }
}

fn render_fragment(markdown: &str, anchors: &mut Anchors) -> String {
    let mut events = Parser::new_ext(markdown, markdown_options()).collect::<Vec<_>>();

    let mut idx = 0usize;
    while idx < events.len() {
        if matches!(events[idx], Event::Start(Tag::Heading { .. })) {
            let mut title = String::new();
            let mut end = idx + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(text) | Event::Code(text) => title.push_str(text),
                    _ => {}
                }
                end += 1;
            }

            if let Event::Start(Tag::Heading { level, id, .. }) = &mut events[idx]
                && id.is_none()
            {
                *id = Some(anchors.id(*level as u8, title.trim()).into());
            }
            idx = end;
        }
        idx += 1;
    }

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}
