//! Element tree used in place of the browser DOM.
//!
//! Renderers rebuild a whole subtree from the model on every call; there is
//! no diffing. Identical input always yields an identical tree, so two
//! renders can be compared with `==` or via their HTML.

use std::collections::HashSet;

use crate::form::BlockForm;
use crate::{Block, Connection, DataFormat, DataSample, Flow};

pub const DEFAULT_ARROW_LABEL: &str = "Data transfer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one or more space-separated classes.
    pub fn class(mut self, classes: &str) -> Self {
        self.add_class(classes);
        self
    }

    pub fn add_class(&mut self, classes: &str) {
        for c in classes.split_whitespace() {
            if !self.has_class(c) {
                self.classes.push(c.to_string());
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search for the first element with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.element_children().find_map(|c| c.find_by_id(id))
    }

    /// All descendants (including self) carrying `class`.
    pub fn find_all_by_class<'a>(&'a self, class: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_by_class(class, &mut out);
        out
    }

    fn collect_by_class<'a>(&'a self, class: &str, out: &mut Vec<&'a Element>) {
        if self.has_class(class) {
            out.push(self);
        }
        for c in self.element_children() {
            c.collect_by_class(class, out);
        }
    }

    /// Concatenated text content of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for n in &self.children {
            match n {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write_html(&mut out);
        out
    }

    /// HTML of the children only (the element's "innerHTML").
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for n in &self.children {
            write_node(n, &mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            out.push_str(" id=\"");
            escape_into(id, out);
            out.push('"');
        }
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            escape_into(&self.classes.join(" "), out);
            out.push('"');
        }
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            escape_into(v, out);
            out.push('"');
        }
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        for n in &self.children {
            write_node(n, out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => escape_into(t, out),
        Node::Element(e) => e.write_html(out),
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "br" | "hr" | "img" | "meta" | "link")
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

pub fn icon(classes: &str) -> Element {
    Element::new("i").class(classes)
}

// --- Flow diagram ---

/// Per-block UI state the renderer needs besides the flow itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramView<'a> {
    pub editing_id: Option<&'a str>,
    pub expanded: Option<&'a HashSet<String>>,
    pub confirming_delete: Option<&'a str>,
    pub deleting: Option<&'a str>,
    pub inline_form: Option<&'a BlockForm>,
}

/// Title, optional description, then each block followed by an arrow when
/// a connection links it to the next block in array order.
pub fn render_flow(flow: &Flow, view: &DiagramView<'_>) -> Element {
    let mut container = Element::new("div").id("diagram");
    container.push(Element::new("h2").text(flow.title.clone()));
    if !flow.description.is_empty() {
        container.push(Element::new("p").text(flow.description.clone()));
    }

    for (index, block) in flow.blocks.iter().enumerate() {
        container.push(block_element(block, view));
        if let Some(next) = flow.blocks.get(index + 1) {
            if let Some(connection) = flow.connection_between(&block.id, &next.id) {
                container.push(arrow_element(connection));
            }
        }
    }
    container
}

pub fn block_element(block: &Block, view: &DiagramView<'_>) -> Element {
    let mut el = Element::new("div").class("block interactive").id(block.id.clone());
    if view.editing_id == Some(block.id.as_str()) {
        el.add_class("being-edited");
    }
    if view.expanded.is_some_and(|set| set.contains(&block.id)) {
        el.add_class("expanded");
    }
    if view.deleting == Some(block.id.as_str()) {
        el.add_class("deleting");
    }

    if view.editing_id == Some(block.id.as_str()) {
        if let Some(form) = view.inline_form {
            return el.child(inline_form_element(form));
        }
    }

    el.children = block_content(block);
    if view.confirming_delete == Some(block.id.as_str()) {
        el.push(confirm_delete_element());
    }
    el
}

/// Inner content of a rendered block, without edit or delete state.
pub fn block_content(block: &Block) -> Vec<Node> {
    let header = Element::new("div")
        .class("block-header")
        .child(icon(&format!("fa-solid {} block-icon", block.icon)))
        .child(Element::new("h3").text(block.title.clone()));

    let controls = Element::new("div")
        .class("block-controls")
        .child(
            Element::new("div")
                .class("edit-block")
                .attr("title", "Edit block")
                .child(icon("fa-solid fa-pen-to-square")),
        )
        .child(
            Element::new("div")
                .class("delete-block")
                .attr("title", "Delete block")
                .child(icon("fa-solid fa-trash")),
        );

    let mut details = Element::new("div").class("details");
    if !block.details.explanation.is_empty() {
        details.push(Element::new("strong").text("Details:"));
        details.push(Element::new("p").text(block.details.explanation.clone()));
    }
    if !block.details.tasks.is_empty() {
        details.push(Element::new("strong").text("Tasks:"));
        let mut list = Element::new("ul");
        for task in &block.details.tasks {
            list.push(Element::new("li").text(task.clone()));
        }
        details.push(list);
    }
    if let Some(sample) = block.input_data.as_ref().filter(|s| !s.data.is_empty()) {
        details.push(sample_element(sample, "received-data", "fa-solid fa-inbox"));
    }
    if let Some(sample) = block.output_data.as_ref().filter(|s| !s.data.is_empty()) {
        details.push(sample_element(sample, "return-value", "fa-solid fa-paper-plane"));
    }

    vec![
        Node::Element(header),
        Node::Element(controls),
        Node::Element(Element::new("p").text(block.description.clone())),
        Node::Element(details),
    ]
}

fn sample_element(sample: &DataSample, class: &str, icon_class: &str) -> Element {
    let mut el = Element::new("div").class(class).child(
        Element::new("strong")
            .child(icon(icon_class))
            .text(format!(" {}", sample.title)),
    );
    if !sample.description.is_empty() {
        el.push(Element::new("p").text(sample.description.clone()));
    }
    el.child(
        Element::new("pre").child(
            Element::new("code")
                .class(&format!("language-{}", sample.format.as_str()))
                .text(sample.data.clone()),
        ),
    )
}

pub fn arrow_element(connection: &Connection) -> Element {
    let label = if connection.label.is_empty() {
        DEFAULT_ARROW_LABEL.to_string()
    } else {
        connection.label.clone()
    };
    Element::new("div")
        .class("arrow-container")
        .child(Element::new("div").class("arrow-label").text(label))
        .child(Element::new("div").class("arrow-line"))
        .child(Element::new("div").class("arrow"))
}

fn confirm_delete_element() -> Element {
    Element::new("div")
        .class("confirm-delete active")
        .child(Element::new("p").text("Are you sure you want to delete this block?"))
        .child(
            Element::new("div")
                .class("confirm-delete-buttons")
                .child(Element::new("button").class("confirm-delete-yes").text("Yes, delete"))
                .child(Element::new("button").class("confirm-delete-no").text("Cancel")),
        )
}

// --- Inline edit form ---

fn form_group(label: &str, field_id: &str, field: Element) -> Element {
    Element::new("div")
        .class("form-group")
        .child(Element::new("label").attr("for", field_id).text(label))
        .child(field.id(field_id))
}

fn text_input(value: &str, required: bool) -> Element {
    let el = Element::new("input").attr("type", "text").attr("value", value);
    if required {
        el.attr("required", "required")
    } else {
        el
    }
}

fn textarea(value: &str) -> Element {
    Element::new("textarea").text(value)
}

fn format_select(selected: DataFormat) -> Element {
    let mut select = Element::new("select");
    for (format, label) in [
        (DataFormat::Json, "JSON"),
        (DataFormat::Http, "HTTP"),
        (DataFormat::Text, "Text"),
    ] {
        let mut option = Element::new("option").attr("value", format.as_str());
        if format == selected {
            option = option.attr("selected", "selected");
        }
        select.push(option.text(label));
    }
    select
}

fn sample_section(
    class: &str,
    heading: &str,
    prefix: &str,
    title: &str,
    description: &str,
    format: DataFormat,
    data: &str,
) -> Element {
    Element::new("div")
        .class(class)
        .child(Element::new("h4").text(heading))
        .child(form_group("Title:", &format!("inline-{prefix}-title"), text_input(title, false)))
        .child(form_group(
            "Description:",
            &format!("inline-{prefix}-description"),
            textarea(description),
        ))
        .child(form_group("Format:", &format!("inline-{prefix}-format"), format_select(format)))
        .child(form_group("Data:", &format!("inline-{prefix}-data"), textarea(data)))
}

/// The editable form that replaces a block's content during inline editing.
pub fn inline_form_element(form: &BlockForm) -> Element {
    let header = Element::new("div")
        .class("inline-edit-header")
        .child(form_group("Icon:", "inline-block-icon", text_input(&form.icon, true)))
        .child(form_group("Title:", "inline-block-title", text_input(&form.title, true)));

    let description = form_group(
        "Description:",
        "inline-block-description",
        textarea(&form.description).attr("required", "required"),
    );

    let details = Element::new("div")
        .class("inline-edit-details")
        .child(Element::new("h4").text("Details"))
        .child(form_group(
            "Detailed explanation:",
            "inline-block-explanation",
            textarea(&form.explanation),
        ))
        .child(form_group(
            "Tasks (one per line):",
            "inline-block-tasks",
            textarea(&form.tasks),
        ));

    let buttons = Element::new("div")
        .class("inline-edit-buttons")
        .child(
            Element::new("button")
                .attr("type", "button")
                .class("inline-save-button")
                .text("Save"),
        )
        .child(
            Element::new("button")
                .attr("type", "button")
                .class("inline-cancel-button")
                .text("Cancel"),
        );

    Element::new("form")
        .class("inline-edit-form")
        .child(header)
        .child(description)
        .child(details)
        .child(sample_section(
            "inline-edit-input",
            "Input data",
            "input",
            &form.input_title,
            &form.input_description,
            form.input_format,
            &form.input_data,
        ))
        .child(sample_section(
            "inline-edit-output",
            "Output data",
            "output",
            &form.output_title,
            &form.output_description,
            form.output_format,
            &form.output_data,
        ))
        .child(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockDetails, Connection};

    fn sample_flow() -> Flow {
        let mut a = Block::bare("a");
        a.title = "Ingest".into();
        a.icon = "fa-inbox".into();
        a.details = BlockDetails {
            explanation: "Reads <raw> input".into(),
            tasks: vec!["read".into(), "decode".into()],
        };
        Flow {
            title: "Pipeline".into(),
            description: String::new(),
            blocks: vec![a, Block::bare("b"), Block::bare("c")],
            connections: vec![Connection {
                from: "a".into(),
                to: "b".into(),
                label: String::new(),
            }],
        }
    }

    #[test]
    fn arrows_only_between_connected_neighbours() {
        let el = render_flow(&sample_flow(), &DiagramView::default());
        let arrows = el.find_all_by_class("arrow-container");
        assert_eq!(arrows.len(), 1);
        assert_eq!(arrows[0].text_content(), DEFAULT_ARROW_LABEL);
        // title + 3 blocks + 1 arrow, no description paragraph
        assert_eq!(el.element_children().count(), 5);
    }

    #[test]
    fn rendering_is_idempotent() {
        let flow = sample_flow();
        let view = DiagramView::default();
        assert_eq!(render_flow(&flow, &view), render_flow(&flow, &view));
        assert_eq!(
            render_flow(&flow, &view).to_html(),
            render_flow(&flow, &view).to_html()
        );
    }

    #[test]
    fn text_is_escaped() {
        let html = render_flow(&sample_flow(), &DiagramView::default()).to_html();
        assert!(html.contains("Reads &lt;raw&gt; input"));
        assert!(html.contains("<li>decode</li>"));
    }

    #[test]
    fn edited_and_expanded_classes() {
        let expanded: HashSet<String> = ["b".to_string()].into();
        let view = DiagramView {
            editing_id: Some("a"),
            expanded: Some(&expanded),
            ..Default::default()
        };
        let el = render_flow(&sample_flow(), &view);
        assert!(el.find_by_id("a").unwrap().has_class("being-edited"));
        assert!(el.find_by_id("b").unwrap().has_class("expanded"));
        assert!(!el.find_by_id("c").unwrap().has_class("expanded"));
    }

    #[test]
    fn inline_form_replaces_content() {
        let flow = sample_flow();
        let form = BlockForm::from_block(&flow.blocks[0]);
        let view = DiagramView {
            editing_id: Some("a"),
            inline_form: Some(&form),
            ..Default::default()
        };
        let block = render_flow(&flow, &view);
        let block = block.find_by_id("a").unwrap();
        assert_eq!(block.element_children().count(), 1);
        let tasks = block.find_by_id("inline-block-tasks").unwrap();
        assert_eq!(tasks.text_content(), "read\ndecode");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let html = text_input("x", true).to_html();
        assert_eq!(html, "<input type=\"text\" value=\"x\" required=\"required\">");
    }
}
