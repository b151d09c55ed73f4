// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A simple arena DOM.
//!
//! Nodes live in a single vector and are addressed by `NodeId` handles, so
//! handles are `Copy` and there are no reference cycles to break. Nodes are
//! never freed: a node removed from the tree keeps its id and can be
//! inserted again.
//!
//! This is the reference `TreeSink` used by the tests. It records parse
//! errors, the quirks mode and the lifecycle hooks the parser calls, and
//! can print the tree in the format of the html5lib tree construction
//! tests.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::iter;

use tendril::StrTendril;

use crate::interface::{Attribute, ElementFlags, Namespace, QualName, QuirksMode, TreeSink};

/// A handle to a node in an `ArenaDom`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

/// The different kinds of nodes in the DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself.
    Document,

    /// The contents of a `<template>`.
    Fragment,

    /// A `DOCTYPE` with name, public id, and system id.
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },

    Text(StrTendril),

    Comment(StrTendril),

    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        template_contents: Option<NodeId>,
        mathml_annotation_xml_integration_point: bool,
    },
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Node {
        Node {
            parent: None,
            children: vec![],
            data,
        }
    }
}

/// A hook call the parser made, in the order it was made.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Lifecycle {
    Attach(NodeId),
    BeginChildren(NodeId),
    FinishChildren(NodeId),
    ScriptAlreadyStarted(NodeId),
    FormAssociated { element: NodeId, form: NodeId },
}

pub struct ArenaDom {
    nodes: RefCell<Vec<Node>>,

    /// Errors that occurred during parsing.
    errors: RefCell<Vec<Cow<'static, str>>>,

    /// The document's quirks mode.
    quirks_mode: Cell<QuirksMode>,

    events: RefCell<Vec<Lifecycle>>,

    current_line: Cell<u64>,
}

impl Default for ArenaDom {
    fn default() -> ArenaDom {
        ArenaDom {
            nodes: RefCell::new(vec![Node::new(NodeData::Document)]),
            errors: Default::default(),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
            events: Default::default(),
            current_line: Cell::new(1),
        }
    }
}

impl ArenaDom {
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn new_node(&self, data: NodeData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node::new(data));
        NodeId(nodes.len() - 1)
    }

    pub fn data(&self, node: NodeId) -> NodeData {
        self.nodes.borrow()[node.0].data.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    /// The contents of a text node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.nodes.borrow()[node.0].data {
            NodeData::Text(ref contents) => Some(contents.to_string()),
            _ => None,
        }
    }

    pub fn element_name(&self, node: NodeId) -> Option<QualName> {
        match self.nodes.borrow()[node.0].data {
            NodeData::Element { ref name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    /// The value of the attribute called `name` in no namespace.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.nodes.borrow()[node.0].data {
            NodeData::Element { ref attrs, .. } => attrs
                .iter()
                .find(|attr| attr.name.ns == Namespace::None && &*attr.name.local == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    pub fn template_contents(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes.borrow()[node.0].data {
            NodeData::Element {
                template_contents, ..
            } => template_contents,
            _ => None,
        }
    }

    /// Element descendants of `root` in tree order, not looking into
    /// template contents.
    pub fn elements_named(&self, root: NodeId, local: &str) -> Vec<NodeId> {
        let mut found = vec![];
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self
                .element_name(node)
                .map_or(false, |name| &*name.local == local)
            {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    pub fn errors(&self) -> Vec<Cow<'static, str>> {
        self.errors.borrow().clone()
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode.get()
    }

    pub fn events(&self) -> Vec<Lifecycle> {
        self.events.borrow().clone()
    }

    /// The last line number the parser reported.
    pub fn current_line(&self) -> u64 {
        self.current_line.get()
    }

    fn record(&self, event: Lifecycle) {
        self.events.borrow_mut().push(event);
    }

    fn unparent(&self, target: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes[target.0].parent.take() else {
            return;
        };
        nodes[parent.0].children.retain(|&child| child != target);
    }

    /// The whole document in html5lib tree format, one node per line.
    pub fn dump(&self) -> String {
        let mut buf = String::new();
        for child in self.children(self.document()) {
            self.serialize(&mut buf, 1, child);
        }
        buf
    }

    /// The children of the root element in html5lib tree format, as the
    /// fragment tests expect.
    pub fn dump_fragment(&self) -> String {
        let mut buf = String::new();
        let root = self
            .children(self.document())
            .into_iter()
            .find(|&node| self.element_name(node).is_some());
        if let Some(root) = root {
            for child in self.children(root) {
                self.serialize(&mut buf, 1, child);
            }
        }
        buf
    }

    fn serialize(&self, buf: &mut String, indent: usize, node: NodeId) {
        buf.push('|');
        buf.extend(iter::repeat(' ').take(indent));

        match self.data(node) {
            NodeData::Document | NodeData::Fragment => buf.push_str("#document\n"),

            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                buf.push_str("<!DOCTYPE ");
                buf.push_str(&name);
                if !public_id.is_empty() || !system_id.is_empty() {
                    buf.push_str(&format!(" \"{}\" \"{}\"", public_id, system_id));
                }
                buf.push_str(">\n");
            },

            NodeData::Text(contents) => {
                buf.push('"');
                buf.push_str(&contents);
                buf.push_str("\"\n");
            },

            NodeData::Comment(contents) => {
                buf.push_str("<!-- ");
                buf.push_str(&contents);
                buf.push_str(" -->\n");
            },

            NodeData::Element {
                name,
                mut attrs,
                template_contents,
                ..
            } => {
                buf.push('<');
                match name.ns {
                    Namespace::Svg => buf.push_str("svg "),
                    Namespace::MathMl => buf.push_str("math "),
                    _ => (),
                }
                buf.push_str(&name.local);
                buf.push_str(">\n");

                attrs.sort_by(|x, y| x.name.local.cmp(&y.name.local));
                for attr in attrs {
                    buf.push('|');
                    buf.extend(iter::repeat(' ').take(indent + 2));
                    match attr.name.ns {
                        Namespace::XLink => buf.push_str("xlink "),
                        Namespace::Xml => buf.push_str("xml "),
                        Namespace::XmlNs => buf.push_str("xmlns "),
                        _ => (),
                    }
                    buf.push_str(&format!("{}=\"{}\"\n", attr.name.local, attr.value));
                }

                if let Some(contents) = template_contents {
                    for child in self.children(node) {
                        self.serialize(buf, indent + 2, child);
                    }
                    buf.push('|');
                    buf.extend(iter::repeat(' ').take(indent + 2));
                    buf.push_str("content\n");
                    for child in self.children(contents) {
                        self.serialize(buf, indent + 4, child);
                    }
                    return;
                }
            },
        }

        for child in self.children(node) {
            self.serialize(buf, indent + 2, child);
        }
    }
}

impl TreeSink for ArenaDom {
    type Handle = NodeId;
    type Output = Self;

    fn finish(self) -> Self {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.borrow_mut().push(msg);
    }

    fn get_document(&self) -> NodeId {
        self.document()
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> NodeId {
        let template_contents = if flags.template {
            Some(self.new_node(NodeData::Fragment))
        } else {
            None
        };
        self.new_node(NodeData::Element {
            name,
            attrs,
            template_contents,
            mathml_annotation_xml_integration_point: flags.mathml_annotation_xml_integration_point,
        })
    }

    fn create_text(&self, text: StrTendril) -> NodeId {
        self.new_node(NodeData::Text(text))
    }

    fn create_comment(&self, text: StrTendril) -> NodeId {
        self.new_node(NodeData::Comment(text))
    }

    fn create_doctype(&self, name: StrTendril, public_id: StrTendril, system_id: StrTendril) -> NodeId {
        self.new_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    fn get_template_contents(&self, target: &NodeId) -> NodeId {
        self.template_contents(*target).unwrap_or(*target)
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.parent(*node)
    }

    fn last_child(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].children.last().copied()
    }

    fn previous_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        let siblings = &nodes[parent.0].children;
        let index = siblings.iter().position(|child| child == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn text_len(&self, node: &NodeId) -> Option<usize> {
        match self.nodes.borrow()[node.0].data {
            NodeData::Text(ref contents) => Some(contents.len()),
            _ => None,
        }
    }

    fn append_text(&self, node: &NodeId, text: &str) {
        if let NodeData::Text(ref mut contents) = self.nodes.borrow_mut()[node.0].data {
            contents.push_slice(text);
        }
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.unparent(*child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[child.0].parent = Some(*parent);
        nodes[parent.0].children.push(*child);
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, next_sibling: &NodeId) {
        self.unparent(*child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[child.0].parent = Some(*parent);
        let siblings = &mut nodes[parent.0].children;
        match siblings.iter().position(|node| node == next_sibling) {
            Some(index) => siblings.insert(index, *child),
            None => siblings.push(*child),
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        self.unparent(*target);
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let children = std::mem::take(&mut nodes[node.0].children);
        for &child in &children {
            nodes[child.0].parent = Some(*new_parent);
        }
        nodes[new_parent.0].children.extend(children);
    }

    fn add_attrs_if_missing(&self, target: &NodeId, new_attrs: Vec<Attribute>) {
        if let NodeData::Element { ref mut attrs, .. } = self.nodes.borrow_mut()[target.0].data {
            let existing: HashSet<QualName> = attrs.iter().map(|attr| attr.name.clone()).collect();
            attrs.extend(
                new_attrs
                    .into_iter()
                    .filter(|attr| !existing.contains(&attr.name)),
            );
        }
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn attach(&self, node: &NodeId) {
        self.record(Lifecycle::Attach(*node));
    }

    fn begin_parsing_children(&self, node: &NodeId) {
        self.record(Lifecycle::BeginChildren(*node));
    }

    fn finish_parsing_children(&self, node: &NodeId) {
        self.record(Lifecycle::FinishChildren(*node));
    }

    fn mark_script_already_started(&self, node: &NodeId) {
        self.record(Lifecycle::ScriptAlreadyStarted(*node));
    }

    fn associate_with_form(&self, target: &NodeId, form: &NodeId) {
        self.record(Lifecycle::FormAssociated {
            element: *target,
            form: *form,
        });
    }

    fn set_current_line(&self, line_number: u64) {
        self.current_line.set(line_number);
    }
}
