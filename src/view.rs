//! A small declarative element tree and its HTML serializer.

use askama::Html as HtmlEscaper;
use askama::MarkupDisplay;
use std::fmt::Write;

const VOID_TAGS: &[&str] = &["br", "img"];

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on output.
    Text { text: String },
    /// Trusted markup, emitted verbatim.
    Markup { html: String },
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: Option<String>,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds one or more space-separated classes.
    pub fn class(mut self, class: impl AsRef<str>) -> Self {
        self.classes.extend(
            class
                .as_ref()
                .split_whitespace()
                .map(|name| name.to_string()),
        );
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::text(text))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|name| name == class)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        if let Some(id) = &self.id {
            push_attr(out, "id", id);
        }
        if !self.classes.is_empty() {
            push_attr(out, "class", &self.classes.join(" "));
        }
        if let Some(style) = &self.style {
            push_attr(out, "style", style);
        }
        for (name, value) in &self.attrs {
            push_attr(out, name, value);
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn markup(html: impl Into<String>) -> Self {
        Node::Markup { html: html.into() }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(1024);
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_html(out),
            Node::Text { text } => push_escaped(out, text),
            Node::Markup { html } => out.push_str(html),
        }
    }

    /// Concatenated text of this node and its descendants; markup is included raw.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Text { text } => out.push_str(text),
            Node::Markup { html } => out.push_str(html),
        }
    }

    /// Every element in the tree in depth-first order, including `self`.
    pub fn elements(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_elements(&mut found);
        found
    }

    fn collect_elements<'a>(&'a self, found: &mut Vec<&'a Element>) {
        if let Node::Element(element) = self {
            found.push(element);
            for child in &element.children {
                child.collect_elements(found);
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.elements()
            .into_iter()
            .find(|element| element.id.as_deref() == Some(id))
    }

    pub fn find_all_by_class(&self, class: &str) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|element| element.has_class(class))
            .collect()
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|element| element.tag == tag)
            .collect()
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

fn push_escaped(out: &mut String, value: &str) {
    let _ = write!(out, "{}", MarkupDisplay::new_unsafe(value, HtmlEscaper));
}

pub fn div() -> Element {
    Element::new("div")
}

pub fn span() -> Element {
    Element::new("span")
}

pub fn i() -> Element {
    Element::new("i")
}

pub fn p() -> Element {
    Element::new("p")
}

pub fn ul() -> Element {
    Element::new("ul")
}

pub fn ol() -> Element {
    Element::new("ol")
}

pub fn li() -> Element {
    Element::new("li")
}

pub fn br() -> Element {
    Element::new("br")
}

pub fn button() -> Element {
    Element::new("button").attr("type", "button")
}

pub fn img(src: impl Into<String>) -> Element {
    Element::new("img").attr("src", src)
}

/// `h1`..`h6`; out-of-range levels are clamped.
pub fn heading(level: u8) -> Element {
    let tag = match level {
        0 | 1 => "h1",
        2 => "h2",
        3 => "h3",
        4 => "h4",
        5 => "h5",
        _ => "h6",
    };
    Element::new(tag)
}
