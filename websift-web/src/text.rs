//! Deterministic conversion of a pruned node tree into Markdown-like
//! plain text. Headings, paragraphs, lists, quotes, code, links, and
//! emphasis survive as text conventions; everything else flattens.

use crate::dom::DomNode;

/// Render the tree as Markdown-like text. Blocks are separated by blank
/// lines; inline whitespace is collapsed.
pub fn to_markdown(root: &DomNode) -> String {
    let mut blocks = Vec::new();
    match root {
        DomNode::Element { children, .. } => collect_blocks(children, &mut blocks),
        DomNode::Text(t) => {
            let t = collapse_ws(t);
            if !t.trim().is_empty() {
                blocks.push(t.trim().to_string());
            }
        }
    }
    blocks.join("\n\n")
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_block_container(tag: &str) -> bool {
    matches!(
        tag,
        "div"
            | "section"
            | "article"
            | "main"
            | "header"
            | "footer"
            | "nav"
            | "aside"
            | "figure"
            | "form"
            | "table"
            | "thead"
            | "tbody"
            | "tr"
            | "td"
            | "th"
            | "dl"
            | "dt"
            | "dd"
            | "fieldset"
    )
}

fn collect_blocks(nodes: &[DomNode], blocks: &mut Vec<String>) {
    let mut inline_run = String::new();

    for node in nodes {
        match node {
            DomNode::Text(t) => inline_run.push_str(&collapse_ws(t)),
            DomNode::Element { tag, children, .. } => {
                if let Some(level) = heading_level(tag) {
                    flush_inline(&mut inline_run, blocks);
                    let text = render_inline(children);
                    let text = text.trim();
                    if !text.is_empty() {
                        blocks.push(format!("{} {}", "#".repeat(level), text));
                    }
                } else if tag == "p" || tag == "figcaption" {
                    flush_inline(&mut inline_run, blocks);
                    let text = render_inline(children);
                    let text = text.trim();
                    if !text.is_empty() {
                        blocks.push(text.to_string());
                    }
                } else if tag == "ul" || tag == "ol" {
                    flush_inline(&mut inline_run, blocks);
                    let list = render_list(children, tag == "ol", 0);
                    if !list.is_empty() {
                        blocks.push(list);
                    }
                } else if tag == "blockquote" {
                    flush_inline(&mut inline_run, blocks);
                    let mut inner = Vec::new();
                    collect_blocks(children, &mut inner);
                    let quoted = inner
                        .join("\n\n")
                        .lines()
                        .map(|l| format!("> {l}"))
                        .collect::<Vec<_>>()
                        .join("\n");
                    if !quoted.is_empty() {
                        blocks.push(quoted);
                    }
                } else if tag == "pre" {
                    flush_inline(&mut inline_run, blocks);
                    let code = raw_text(children);
                    let code = code.trim_matches('\n');
                    if !code.trim().is_empty() {
                        blocks.push(format!("```\n{code}\n```"));
                    }
                } else if tag == "hr" {
                    flush_inline(&mut inline_run, blocks);
                    blocks.push("* * *".to_string());
                } else if tag == "br" {
                    inline_run.push('\n');
                } else if is_block_container(tag) {
                    flush_inline(&mut inline_run, blocks);
                    collect_blocks(children, blocks);
                } else {
                    inline_run.push_str(&render_inline_node(node));
                }
            }
        }
    }

    flush_inline(&mut inline_run, blocks);
}

fn flush_inline(run: &mut String, blocks: &mut Vec<String>) {
    let text = run.trim();
    if !text.is_empty() {
        blocks.push(text.to_string());
    }
    run.clear();
}

fn render_list(items: &[DomNode], ordered: bool, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let mut lines = Vec::new();
    let mut index = 1usize;

    for item in items {
        let DomNode::Element { tag, children, .. } = item else {
            continue;
        };
        if tag != "li" {
            continue;
        }

        let marker = if ordered {
            format!("{index}. ")
        } else {
            "- ".to_string()
        };

        let own_text: String = children
            .iter()
            .filter(|c| !matches!(c.tag(), Some("ul") | Some("ol")))
            .map(render_inline_node)
            .collect();
        let own_text = own_text.trim();
        lines.push(format!("{indent}{marker}{own_text}"));

        for child in children {
            if let DomNode::Element { tag, children, .. } = child {
                if tag == "ul" || tag == "ol" {
                    let nested = render_list(children, tag == "ol", depth + 1);
                    if !nested.is_empty() {
                        lines.push(nested);
                    }
                }
            }
        }
        index += 1;
    }

    lines.join("\n")
}

fn render_inline(nodes: &[DomNode]) -> String {
    nodes.iter().map(render_inline_node).collect()
}

fn render_inline_node(node: &DomNode) -> String {
    match node {
        DomNode::Text(t) => collapse_ws(t),
        DomNode::Element {
            tag,
            children,
            ..
        } => {
            let inner = render_inline(children);
            match tag.as_str() {
                "a" => {
                    let text = inner.trim().to_string();
                    match node.attr("href").filter(|h| !h.is_empty()) {
                        Some(href) if !text.is_empty() => format!("[{text}]({href})"),
                        _ => text,
                    }
                }
                "strong" | "b" => wrap_if_nonempty(&inner, "**", "**"),
                "em" | "i" => wrap_if_nonempty(&inner, "_", "_"),
                "code" => wrap_if_nonempty(&inner, "`", "`"),
                "br" => "\n".to_string(),
                _ => inner,
            }
        }
    }
}

fn wrap_if_nonempty(inner: &str, open: &str, close: &str) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{open}{trimmed}{close}")
    }
}

fn raw_text(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element { children, .. } => out.push_str(&raw_text(children)),
        }
    }
    out
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !last_ws {
                out.push(' ');
            }
            last_ws = true;
        } else {
            out.push(ch);
            last_ws = false;
        }
    }
    out
}
