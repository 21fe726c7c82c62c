//! Page markup as a plain node tree, plus the pruning passes that strip
//! non-content structure before text conversion.

use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees that never carry extractable text.
const STRIP_TAGS: &[&str] = &["script", "style", "img", "svg", "iframe"];

/// Inline attributes dropped from every surviving element.
const STRIP_ATTRS: &[&str] = &["style", "onclick", "onload", "onerror"];

/// One node of the parsed page: an element with attributes and children,
/// or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomNode>,
    },
    Text(String),
}

impl DomNode {
    pub fn tag(&self) -> Option<&str> {
        match self {
            DomNode::Element { tag, .. } => Some(tag),
            DomNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            DomNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            DomNode::Text(_) => None,
        }
    }
}

/// Parse `html` and return its `<body>` as an owned node tree.
///
/// Malformed markup is handled by the underlying html5ever parser; a
/// document without a body yields an empty element.
pub fn parse_body(html: &str) -> DomNode {
    let doc = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next());

    match body {
        Some(el) => convert_element(el),
        None => DomNode::Element {
            tag: "body".to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        },
    }
}

fn convert_element(el: ElementRef<'_>) -> DomNode {
    let tag = el.value().name().to_ascii_lowercase();
    let attrs = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect();

    let mut children = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    children.push(convert_element(child_el));
                }
            }
            Node::Text(text) => children.push(DomNode::Text(text.to_string())),
            _ => {}
        }
    }

    DomNode::Element {
        tag,
        attrs,
        children,
    }
}

/// Strip non-content structure in place: drop script/style/image/vector/
/// frame subtrees, inline style and event-handler attributes, and any
/// `div`/`span` left with no text and no children.
pub fn prune(node: &mut DomNode) {
    if let DomNode::Element {
        attrs, children, ..
    } = node
    {
        attrs.retain(|(k, _)| !STRIP_ATTRS.contains(&k.as_str()));
        children.retain(|c| match c.tag() {
            Some(tag) => !STRIP_TAGS.contains(&tag),
            None => true,
        });
        for child in children.iter_mut() {
            prune(child);
        }
        // Bottom-up, so a container whose only child was itself an empty
        // container goes too.
        children.retain(|c| !is_empty_container(c));
    }
}

fn is_empty_container(node: &DomNode) -> bool {
    match node {
        DomNode::Element { tag, children, .. } if tag == "div" || tag == "span" => {
            children.iter().all(|c| match c {
                DomNode::Text(t) => t.is_empty(),
                DomNode::Element { .. } => false,
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pruned(html: &str) -> DomNode {
        let mut body = parse_body(html);
        prune(&mut body);
        body
    }

    fn render(node: &DomNode) -> String {
        match node {
            DomNode::Text(t) => t.clone(),
            DomNode::Element { tag, children, .. } => {
                let inner: String = children.iter().map(render).collect();
                format!("<{tag}>{inner}</{tag}>")
            }
        }
    }

    #[test]
    fn scripts_and_styles_are_stripped_with_their_text() {
        let body = pruned(
            "<html><body><p>keep</p><script>var x = 1;</script>\
             <style>p { color: red }</style></body></html>",
        );
        let rendered = render(&body);
        assert!(rendered.contains("keep"));
        assert!(!rendered.contains("var x"));
        assert!(!rendered.contains("color"));
    }

    #[test]
    fn images_vectors_and_frames_are_stripped() {
        let body = pruned(
            "<body><p>text</p><img src=\"a.png\"><svg><circle/></svg>\
             <iframe src=\"https://ads.example\"></iframe></body>",
        );
        let rendered = render(&body);
        assert!(!rendered.contains("img"));
        assert!(!rendered.contains("svg"));
        assert!(!rendered.contains("iframe"));
    }

    #[test]
    fn inline_style_and_handler_attributes_are_dropped() {
        let body = pruned(
            "<body><p style=\"color:red\" onclick=\"x()\" onload=\"y()\" \
             onerror=\"z()\" id=\"p1\">text</p></body>",
        );
        let DomNode::Element { children, .. } = &body else {
            panic!("body element");
        };
        let p = &children[0];
        assert_eq!(p.attr("style"), None);
        assert_eq!(p.attr("onclick"), None);
        assert_eq!(p.attr("onload"), None);
        assert_eq!(p.attr("onerror"), None);
        assert_eq!(p.attr("id"), Some("p1"));
    }

    #[test]
    fn empty_containers_are_removed_recursively() {
        let body = pruned("<body><div><span></span></div><div><p>kept</p></div></body>");
        let rendered = render(&body);
        assert!(!rendered.contains("<span>"));
        // The outer div became empty once the span was removed.
        assert_eq!(rendered.matches("<div>").count(), 1);
        assert!(rendered.contains("kept"));
    }

    #[test]
    fn missing_body_yields_empty_tree() {
        let body = parse_body("");
        // html5ever synthesizes a body even for empty input; either way the
        // tree renders to nothing.
        assert!(render(&body).replace("<body></body>", "").is_empty());
    }
}
