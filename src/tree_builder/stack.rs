// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stack of open elements.
//!
//! <https://html.spec.whatwg.org/#the-stack-of-open-elements>

use crate::interface::{Namespace, QualName};
use crate::tokenizer::Tag;
use crate::tree_builder::tag_sets::*;

use std::slice;

/// An entry on the stack of open elements or in the list of active
/// formatting elements.
///
/// The originating tag is kept so the element can be created again by the
/// adoption agency and by reconstruction. Names are read from here, never
/// from the DOM.
#[derive(Clone, Debug)]
pub struct StackItem<Handle> {
    pub node: Handle,
    pub tag: Tag,
    pub name: QualName,
    /// The root `html` element created for fragment parsing.
    pub is_fragment_root: bool,
    pub is_annotation_xml_integration_point: bool,
}

/// <https://html.spec.whatwg.org/#html-integration-point>
pub(crate) fn is_annotation_xml_integration_point(tag: &Tag, ns: Namespace) -> bool {
    ns == Namespace::MathMl
        && &*tag.name == "annotation-xml"
        && tag.get_attribute("encoding").map_or(false, |e| {
            e.eq_ignore_ascii_case("text/html") || e.eq_ignore_ascii_case("application/xhtml+xml")
        })
}

impl<Handle> StackItem<Handle> {
    pub fn new(node: Handle, tag: Tag, ns: Namespace) -> StackItem<Handle> {
        let name = QualName::new(None, ns, tag.name.clone());
        let is_annotation_xml_integration_point = is_annotation_xml_integration_point(&tag, ns);
        StackItem {
            node,
            tag,
            name,
            is_fragment_root: false,
            is_annotation_xml_integration_point,
        }
    }

    #[inline]
    pub fn is_html(&self, local: &str) -> bool {
        self.name.is_html(local)
    }

    #[inline]
    pub fn is_in(&self, set: fn(&QualName) -> bool) -> bool {
        set(&self.name)
    }
}

/// The stack of open elements, most recently added at the end.
///
/// Popping an element never touches the DOM: nodes stay where they were
/// inserted.
#[derive(Debug)]
pub struct ElementStack<Handle> {
    items: Vec<StackItem<Handle>>,
}

impl<Handle> Default for ElementStack<Handle> {
    fn default() -> Self {
        ElementStack { items: Vec::new() }
    }
}

impl<Handle: Clone + PartialEq> ElementStack<Handle> {
    pub fn push(&mut self, item: StackItem<Handle>) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<StackItem<Handle>> {
        self.items.pop()
    }

    /// The current node.
    pub fn top(&self) -> Option<&StackItem<Handle>> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StackItem<Handle>> {
        self.items.get(index)
    }

    /// Bottom (the `html` element) to top.
    pub fn iter(&self) -> slice::Iter<'_, StackItem<Handle>> {
        self.items.iter()
    }

    /// Pop until `node` has been popped. Returns the popped items, most
    /// recent first. Pops nothing if `node` is not open.
    pub fn pop_until(&mut self, node: &Handle) -> Vec<StackItem<Handle>> {
        match self.position(node) {
            Some(index) => self.truncate(index),
            None => Vec::new(),
        }
    }

    /// Pop until an HTML element called `name` has been popped.
    pub fn pop_until_popped(&mut self, name: &str) -> Vec<StackItem<Handle>> {
        match self.topmost(name) {
            Some(index) => self.truncate(index),
            None => Vec::new(),
        }
    }

    /// Pop until an element from `set` has been popped.
    pub fn pop_until_one_of(&mut self, set: fn(&QualName) -> bool) -> Vec<StackItem<Handle>> {
        match self.items.iter().rposition(|item| set(&item.name)) {
            Some(index) => self.truncate(index),
            None => Vec::new(),
        }
    }

    /// Remove everything at `len` and above.
    pub fn truncate(&mut self, len: usize) -> Vec<StackItem<Handle>> {
        let mut popped = self.items.split_off(len.min(self.items.len()));
        popped.reverse();
        popped
    }

    /// Scan down from the current node. True if `pred` matches before an
    /// element of the `scope` boundary set is reached.
    pub fn in_scope_with<P>(&self, scope: fn(&QualName) -> bool, pred: P) -> bool
    where
        P: Fn(&StackItem<Handle>) -> bool,
    {
        for item in self.items.iter().rev() {
            if pred(item) {
                return true;
            }
            if scope(&item.name) {
                return false;
            }
        }

        // The html element bounds every scope, so this is only reached
        // with an empty stack.
        false
    }

    pub fn in_scope(&self, name: &str) -> bool {
        self.in_scope_with(default_scope, |item| item.is_html(name))
    }

    pub fn in_button_scope(&self, name: &str) -> bool {
        self.in_scope_with(button_scope, |item| item.is_html(name))
    }

    pub fn in_list_item_scope(&self, name: &str) -> bool {
        self.in_scope_with(list_item_scope, |item| item.is_html(name))
    }

    pub fn in_table_scope(&self, name: &str) -> bool {
        self.in_scope_with(table_scope, |item| item.is_html(name))
    }

    pub fn in_select_scope(&self, name: &str) -> bool {
        self.in_scope_with(select_scope, |item| item.is_html(name))
    }

    pub fn element_in_scope(&self, node: &Handle) -> bool {
        self.in_scope_with(default_scope, |item| item.node == *node)
    }

    /// Is any element of `set` in default scope?
    pub fn has_in_scope_set(&self, set: fn(&QualName) -> bool) -> bool {
        self.in_scope_with(default_scope, |item| set(&item.name))
    }

    /// The lowest special element above the formatting element at `index`,
    /// which the adoption agency uses as its pivot.
    pub fn furthest_block_for_formatting_element(&self, index: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, item)| special_tag(&item.name))
            .map(|(i, _)| i)
    }

    /// Index of the HTML element called `name` nearest the top.
    pub fn topmost(&self, name: &str) -> Option<usize> {
        self.items.iter().rposition(|item| item.is_html(name))
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.position(node).is_some()
    }

    /// Is any open element an HTML element called `name`?
    pub fn contains_named(&self, name: &str) -> bool {
        self.topmost(name).is_some()
    }

    pub fn position(&self, node: &Handle) -> Option<usize> {
        self.items.iter().rposition(|item| item.node == *node)
    }

    pub fn remove(&mut self, node: &Handle) -> Option<StackItem<Handle>> {
        let index = self.position(node)?;
        Some(self.items.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> StackItem<Handle> {
        self.items.remove(index)
    }

    /// Swap the item at `index` for `item`, returning the old one.
    pub fn replace(&mut self, index: usize, item: StackItem<Handle>) -> StackItem<Handle> {
        std::mem::replace(&mut self.items[index], item)
    }

    pub fn insert_at(&mut self, index: usize, item: StackItem<Handle>) {
        self.items.insert(index, item);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::StartTag;
    use crate::LocalName;

    fn item(id: usize, name: &str) -> StackItem<usize> {
        item_ns(id, name, Namespace::Html)
    }

    fn item_ns(id: usize, name: &str, ns: Namespace) -> StackItem<usize> {
        let tag = Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: vec![],
        };
        StackItem::new(id, tag, ns)
    }

    fn stack(names: &[&str]) -> ElementStack<usize> {
        let mut stack = ElementStack::default();
        for (i, name) in names.iter().enumerate() {
            stack.push(item(i, name));
        }
        stack
    }

    #[test]
    fn button_scope_stops_at_button() {
        let mut s = stack(&["html", "body", "div", "p"]);
        assert!(s.in_button_scope("p"));
        s.push(item(4, "button"));
        assert!(!s.in_button_scope("p"));
        assert!(s.in_scope("p"));
    }

    #[test]
    fn table_scope_ignores_default_boundaries() {
        let s = stack(&["html", "body", "table", "tbody", "tr", "td", "object"]);
        assert!(s.in_table_scope("td"));
        assert!(!s.in_scope("td"));
        assert!(!s.in_table_scope("body"));
    }

    #[test]
    fn list_item_scope_stops_at_lists() {
        let s = stack(&["html", "body", "li", "ul"]);
        assert!(s.in_scope("li"));
        assert!(!s.in_list_item_scope("li"));
    }

    #[test]
    fn select_scope_only_crosses_options() {
        let s = stack(&["html", "body", "select", "optgroup", "option"]);
        assert!(s.in_select_scope("select"));
        let s = stack(&["html", "body", "select", "div", "option"]);
        assert!(!s.in_select_scope("select"));
    }

    #[test]
    fn foreign_integration_points_bound_scope() {
        let mut s = stack(&["html", "body", "p"]);
        s.push(item_ns(3, "svg", Namespace::Svg));
        assert!(s.in_scope("p"));
        s.push(item_ns(4, "foreignObject", Namespace::Svg));
        assert!(!s.in_scope("p"));
        assert!(s.element_in_scope(&4));
        assert!(!s.element_in_scope(&2));
    }

    #[test]
    fn furthest_block_is_lowest_special() {
        let s = stack(&["html", "body", "b", "i", "div", "p"]);
        assert_eq!(s.furthest_block_for_formatting_element(2), Some(4));
        assert_eq!(s.furthest_block_for_formatting_element(5), None);
    }

    #[test]
    fn pops_report_popped_items() {
        let mut s = stack(&["html", "body", "div", "span", "em"]);
        let popped = s.pop_until_popped("div");
        let names: Vec<&str> = popped.iter().map(|i| &*i.tag.name).collect();
        assert_eq!(names, vec!["em", "span", "div"]);
        assert_eq!(s.len(), 2);
        assert!(s.pop_until_popped("table").is_empty());
        assert_eq!(s.pop_until_one_of(td_th).len(), 0);
    }

    #[test]
    fn topmost_finds_nearest_top() {
        let s = stack(&["html", "body", "table", "tbody", "tr", "td", "table"]);
        assert_eq!(s.topmost("table"), Some(6));
        assert!(s.has_in_scope_set(foster_target));
    }

    #[test]
    fn annotation_xml_integration_point() {
        let mut tag = item_ns(0, "annotation-xml", Namespace::MathMl).tag;
        tag.attrs.push(crate::interface::Attribute {
            name: QualName::attr("encoding"),
            value: tendril::StrTendril::from_slice("Text/HTML"),
        });
        assert!(StackItem::new(0usize, tag, Namespace::MathMl).is_annotation_xml_integration_point);
        assert!(!item_ns(0, "annotation-xml", Namespace::MathMl).is_annotation_xml_integration_point);
    }
}
