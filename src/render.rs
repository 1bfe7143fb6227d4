//! Turns a [`LookupResult`] into the two-column definition page.
//!
//! Rendering happens in two stages. [`render`] scans the lookup result once and
//! builds a [`RenderedPage`], which holds the grouped entries and the explicit
//! tab selection. [`RenderedPage::view`] then maps that value to a [`Node`]
//! tree; it reads nothing else, so re-rendering after [`RenderedPage::select_tab`]
//! always agrees with the selection.

use crate::model::{DefinitionEntry, LookupResult, Origin, Sense, SourceId};
use crate::view::{self, Element, Node};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt;
use tracing::debug;

pub const NOT_FOUND_MESSAGE: &str = "couldn't find that word";
pub const UNAVAILABLE_MESSAGE: &str = "couldn't load that word right now";
const ITALIC_OPEN: &str = "<i>";
const ITALIC_CLOSE: &str = "</i>";
const DEFAULT_HELP_TEXT: &str = "Start typing anywhere on the page to look up another word.";
const DEFAULT_ATTRIBUTION: &str =
    "Definitions, images and word origins are provided by the sources listed above.";

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Images per gallery column; `None` or `Some(0)` keeps one column.
    pub image_column_batch_size: Option<usize>,
    /// Tab order, which also decides the initially selected tab.
    pub source_priority: Vec<SourceId>,
    /// Emit upstream text as raw markup. Off by default, which escapes
    /// everything except `<i>` spans.
    pub trust_markup: bool,
    pub help_text: String,
    pub attribution: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_column_batch_size: Some(3),
            source_priority: SourceId::ALL.to_vec(),
            trust_markup: false,
            help_text: DEFAULT_HELP_TEXT.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

/// Which tabs exist and which one is shown.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct TabState {
    tabs: Vec<SourceId>,
    selected: Option<SourceId>,
}

impl TabState {
    /// Selects the first tab, if any.
    pub fn new(tabs: Vec<SourceId>) -> Self {
        let selected = tabs.first().copied();
        Self { tabs, selected }
    }

    pub fn tabs(&self) -> &[SourceId] {
        &self.tabs
    }

    pub fn selected(&self) -> Option<SourceId> {
        self.selected
    }

    pub fn is_selected(&self, source: SourceId) -> bool {
        self.selected == Some(source)
    }

    /// Returns `Ok(false)` when `source` is already selected.
    pub fn select(&mut self, source: SourceId) -> Result<bool, TabError> {
        if !self.tabs.contains(&source) {
            return Err(TabError::NoSuchTab(source));
        }
        if self.selected == Some(source) {
            return Ok(false);
        }
        self.selected = Some(source);
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TabError {
    NoSuchTab(SourceId),
    NoTabs,
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NoSuchTab(source) => {
                write!(f, "no definitions from {} on this page", source.label())
            }
            TabError::NoTabs => write!(f, "page has no definition tabs"),
        }
    }
}

impl std::error::Error for TabError {}

/// Consecutive senses sharing one part of speech.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Entry {
    pub part_of_speech: String,
    pub items: Vec<NumberedSense>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct NumberedSense {
    pub sense: Sense,
    pub sub_senses: Vec<Sense>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SourcePanel {
    pub source: SourceId,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DefinitionPage {
    pub overview: Vec<String>,
    pub panels: Vec<SourcePanel>,
    pub tabs: TabState,
    pub image_columns: Vec<Vec<String>>,
    pub origins: Vec<Origin>,
    pub sources: Vec<String>,
    pub help_text: String,
    pub attribution: String,
    #[serde(skip)]
    trust_markup: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderedPage {
    NotFound,
    Unavailable { reason: String },
    Definition(Box<DefinitionPage>),
}

/// Groups a source's entries into runs of the same part of speech.
///
/// Empty sub-sense groups are skipped.
pub fn group_entries(definitions: &[DefinitionEntry]) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    for definition in definitions {
        let Some((primary, sub_senses)) = definition.split() else {
            continue;
        };
        let item = NumberedSense {
            sense: decode_sense(primary),
            sub_senses: sub_senses.iter().map(decode_sense).collect(),
        };
        match entries.last_mut() {
            Some(entry) if entry.part_of_speech == primary.part_of_speech => {
                entry.items.push(item)
            }
            _ => entries.push(Entry {
                part_of_speech: primary.part_of_speech.clone(),
                items: vec![item],
            }),
        }
    }
    entries
}

pub fn render(result: &LookupResult, config: &RenderConfig) -> RenderedPage {
    if result.is_empty() {
        debug!("lookup result is empty; rendering placeholder");
        return RenderedPage::NotFound;
    }

    let mut panels = Vec::new();
    for &source in dedup_priority(&config.source_priority).iter() {
        let entries = group_entries(result.definitions(source));
        if entries.is_empty() {
            continue;
        }
        panels.push(SourcePanel { source, entries });
    }
    let tabs = TabState::new(panels.iter().map(|panel| panel.source).collect());

    let page = DefinitionPage {
        overview: result.overview().iter().map(|line| decode(line)).collect(),
        panels,
        tabs,
        image_columns: batch_images(result.stock_images(), config.image_column_batch_size),
        origins: result
            .displayed_origins()
            .iter()
            .map(|origin| Origin {
                part_of_speech: origin.tag().map(str::to_string),
                text: decode(&origin.text),
            })
            .collect(),
        sources: result.sources().to_vec(),
        help_text: config.help_text.clone(),
        attribution: config.attribution.clone(),
        trust_markup: config.trust_markup,
    };
    debug!(
        tabs = page.tabs.tabs().len(),
        selected = ?page.tabs.selected(),
        images = result.stock_images().len(),
        origins = page.origins.len(),
        "rendered definition page"
    );
    RenderedPage::Definition(Box::new(page))
}

impl RenderedPage {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RenderedPage::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RenderedPage::NotFound)
    }

    pub fn definition(&self) -> Option<&DefinitionPage> {
        match self {
            RenderedPage::Definition(page) => Some(page.as_ref()),
            _ => None,
        }
    }

    pub fn tabs(&self) -> Option<&TabState> {
        self.definition().map(|page| &page.tabs)
    }

    /// Shows `source`'s panel and hides every other one.
    ///
    /// Returns `Ok(false)` without touching anything when `source` is already shown.
    pub fn select_tab(&mut self, source: SourceId) -> Result<bool, TabError> {
        match self {
            RenderedPage::Definition(page) => {
                let changed = page.tabs.select(source)?;
                if changed {
                    debug!(%source, "switched definition tab");
                }
                Ok(changed)
            }
            _ => Err(TabError::NoTabs),
        }
    }

    pub fn view(&self) -> Node {
        match self {
            RenderedPage::NotFound => placeholder(NOT_FOUND_MESSAGE),
            RenderedPage::Unavailable { .. } => placeholder(UNAVAILABLE_MESSAGE),
            RenderedPage::Definition(page) => page.view(),
        }
    }

    pub fn to_html(&self) -> String {
        self.view().to_html()
    }
}

fn placeholder(message: &str) -> Node {
    view::div()
        .class("fade-in")
        .child(view::heading(3).class("gray").text(message))
        .into()
}

impl DefinitionPage {
    pub fn panel(&self, source: SourceId) -> Option<&SourcePanel> {
        self.panels.iter().find(|panel| panel.source == source)
    }

    pub fn is_visible(&self, source: SourceId) -> bool {
        self.tabs.is_selected(source)
    }

    pub fn view(&self) -> Node {
        let mut left = view::div().class("word-column");
        if !self.overview.is_empty() {
            left = left.child(self.overview_view());
        }
        left = left.child(self.tab_bar_view());
        left = left.children(self.panels.iter().map(|panel| self.panel_view(panel)));

        let mut right = view::div().class("word-column");
        right = right.children(self.image_columns.iter().map(|column| {
            view::div()
                .class("img-container")
                .children(column.iter().map(|src| view::img(src.as_str()).class("stock-img")))
        }));
        if !self.origins.is_empty() {
            right = right.child(self.origins_view());
        }
        right = right.child(self.sources_view());

        view::div()
            .class("word-columns slide-up")
            .child(left)
            .child(right)
            .into()
    }

    fn content(&self, text: &str) -> Vec<Node> {
        if self.trust_markup {
            vec![Node::markup(text)]
        } else {
            inline_markup(text)
        }
    }

    fn overview_view(&self) -> Element {
        let mut overview = view::div().id("wordOverview");
        for (idx, line) in self.overview.iter().enumerate() {
            let level = if idx == 0 { 3 } else { 4 };
            overview = overview.child(view::heading(level).children(self.content(line)));
        }
        overview
    }

    fn tab_bar_view(&self) -> Element {
        view::div()
            .class("tab-bar")
            .children(self.tabs.tabs().iter().map(|&source| {
                let mut tab = view::button()
                    .class("bar-item")
                    .attr("data-target", source.panel_id())
                    .attr("data-source", source.to_string())
                    .text(source.label());
                if self.tabs.is_selected(source) {
                    tab = tab.class("bar-selected");
                }
                tab
            }))
    }

    fn panel_view(&self, panel: &SourcePanel) -> Element {
        let visible = self.is_visible(panel.source);
        let mut list = view::ul()
            .id(panel.source.panel_id())
            .class("dictionary")
            .style(if visible {
                "display:block"
            } else {
                "display:none"
            });
        if visible {
            list = list.class("fade-in");
        }
        list.children(panel.entries.iter().map(|entry| self.entry_view(entry)))
    }

    fn entry_view(&self, entry: &Entry) -> Element {
        let mut list = view::ol().class("word-entry");
        if !entry.part_of_speech.is_empty() {
            list = list.child(
                view::span()
                    .class("part_of_speech")
                    .class(&entry.part_of_speech)
                    .text(&entry.part_of_speech),
            );
        }
        list.children(entry.items.iter().map(|item| {
            let mut li = self.sense_view(&item.sense).class("numbered");
            if !item.sub_senses.is_empty() {
                li = li.child(
                    view::ol()
                        .class("sub-senses")
                        .attr("type", "a")
                        .children(
                            item.sub_senses
                                .iter()
                                .map(|sense| self.sense_view(sense).class("lettered")),
                        ),
                );
            }
            li
        }))
    }

    fn sense_view(&self, sense: &Sense) -> Element {
        let mut li = view::li().child(
            view::div()
                .class("defContent")
                .child(view::span().class("meaning").children(self.content(&sense.meaning))),
        );
        if !sense.examples.is_empty() {
            li = li.child(
                view::ul().class("examples").children(
                    sense
                        .examples
                        .iter()
                        .map(|example| view::li().class("example").children(self.content(example))),
                ),
            );
        }
        li
    }

    fn origins_view(&self) -> Element {
        let mut list = view::ul()
            .class("origins")
            .child(view::heading(2).text("Word Origin"));
        for origin in &self.origins {
            let mut li = view::li().class("origin");
            if let Some(tag) = origin.tag() {
                li = li.child(view::span().class("part_of_speech").class(tag).text(tag));
            }
            li = li.children(
                origin
                    .paragraphs()
                    .map(|para| view::p().class("origin-text").children(self.content(para))),
            );
            list = list.child(li);
        }
        list
    }

    fn sources_view(&self) -> Element {
        view::div()
            .class("sources")
            .child(view::heading(4).text("Sources"))
            .children(self.sources.iter().map(|source| view::p().class("source").text(source)))
            .child(view::br())
            .child(view::p().class("help").text(&self.help_text))
            .child(view::p().class("attribution").text(&self.attribution))
    }
}

/// Escapes `text`, turning `<i>...</i>` spans into `i` elements.
///
/// An unclosed `<i>` runs to the end of the text.
fn inline_markup(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(ITALIC_OPEN) {
        if start > 0 {
            nodes.push(Node::text(&rest[..start]));
        }
        let after = &rest[start + ITALIC_OPEN.len()..];
        let (inner, tail) = match after.find(ITALIC_CLOSE) {
            Some(end) => (&after[..end], &after[end + ITALIC_CLOSE.len()..]),
            None => (after, ""),
        };
        nodes.push(view::i().text(inner).into());
        rest = tail;
    }
    if !rest.is_empty() {
        nodes.push(Node::text(rest));
    }
    nodes
}

/// Splits images into columns of `batch` images; `None`/`0` keeps a single column.
pub fn batch_images(images: &[String], batch: Option<usize>) -> Vec<Vec<String>> {
    if images.is_empty() {
        return Vec::new();
    }
    match batch.filter(|size| *size > 0) {
        Some(size) => images.chunks(size).map(<[String]>::to_vec).collect(),
        None => vec![images.to_vec()],
    }
}

fn dedup_priority(priority: &[SourceId]) -> Vec<SourceId> {
    let mut seen = Vec::with_capacity(priority.len());
    for source in priority {
        if !seen.contains(source) {
            seen.push(*source);
        }
    }
    seen
}

fn decode_sense(sense: &Sense) -> Sense {
    Sense {
        part_of_speech: sense.part_of_speech.clone(),
        meaning: decode(&sense.meaning),
        examples: sense.examples.iter().map(|example| decode(example)).collect(),
    }
}

/// Percent-decodes upstream text; malformed escapes pass through unchanged.
pub fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}
