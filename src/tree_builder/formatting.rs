// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The list of active formatting elements.
//!
//! <https://html.spec.whatwg.org/#list-of-active-formatting-elements>

use crate::tree_builder::stack::StackItem;

#[derive(Clone, Debug)]
pub enum FormatEntry<Handle> {
    Element(StackItem<Handle>),
    Marker,
}

impl<Handle> FormatEntry<Handle> {
    pub fn item(&self) -> Option<&StackItem<Handle>> {
        match *self {
            FormatEntry::Element(ref item) => Some(item),
            FormatEntry::Marker => None,
        }
    }
}

/// A position in the list that survives entries being replaced, used by
/// the adoption agency.
#[derive(Clone, Debug)]
pub struct Bookmark<Handle> {
    anchor: Handle,
    moved: bool,
}

impl<Handle> Bookmark<Handle> {
    /// Move the bookmark to just after the entry for `node`.
    pub fn move_to_after(&mut self, node: Handle) {
        self.anchor = node;
        self.moved = true;
    }
}

#[derive(Debug)]
pub struct FormattingList<Handle> {
    entries: Vec<FormatEntry<Handle>>,
}

impl<Handle> Default for FormattingList<Handle> {
    fn default() -> Self {
        FormattingList { entries: Vec::new() }
    }
}

impl<Handle: Clone + PartialEq> FormattingList<Handle> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FormatEntry<Handle>> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&FormatEntry<Handle>> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatEntry<Handle>> + '_ {
        self.entries.iter()
    }

    /// Entries after the last marker, most recently added first, with
    /// their indices.
    fn since_last_marker(&self) -> impl Iterator<Item = (usize, &StackItem<Handle>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .map_while(|(i, entry)| entry.item().map(|item| (i, item)))
    }

    /// Push an element, first applying the Noah's Ark clause: at most three
    /// equivalent elements may follow the last marker, so the earliest one
    /// is dropped to make room.
    pub fn append(&mut self, item: StackItem<Handle>) {
        let mut first_match = None;
        let mut matches = 0usize;
        for (i, old) in self.since_last_marker() {
            if old.name == item.name && old.tag.equiv_modulo_attr_order(&item.tag) {
                first_match = Some(i);
                matches += 1;
            }
        }

        if matches >= 3 {
            if let Some(i) = first_match {
                self.entries.remove(i);
            }
        }

        self.entries.push(FormatEntry::Element(item));
    }

    pub fn append_marker(&mut self) {
        self.entries.push(FormatEntry::Marker);
    }

    pub fn remove(&mut self, node: &Handle) -> Option<StackItem<Handle>> {
        let index = self.find(node)?;
        match self.entries.remove(index) {
            FormatEntry::Element(item) => Some(item),
            FormatEntry::Marker => None,
        }
    }

    pub fn clear_to_last_marker(&mut self) {
        while let Some(FormatEntry::Element(_)) = self.entries.pop() {}
    }

    pub fn find(&self, node: &Handle) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.item().map_or(false, |item| item.node == *node))
    }

    /// The most recently added HTML element called `name` since the last
    /// marker.
    pub fn closest_element_in_scope_with_name(&self, name: &str) -> Option<(usize, &StackItem<Handle>)> {
        self.since_last_marker().find(|(_, item)| item.is_html(name))
    }

    pub fn bookmark_for(&self, node: &Handle) -> Bookmark<Handle> {
        Bookmark {
            anchor: node.clone(),
            moved: false,
        }
    }

    /// Put `new_item` where the bookmark points and drop the entry for `old`.
    pub fn swap_to(&mut self, old: &Handle, new_item: StackItem<Handle>, bookmark: &Bookmark<Handle>) {
        if !bookmark.moved {
            debug_assert!(bookmark.anchor == *old);
            if let Some(index) = self.find(old) {
                self.entries[index] = FormatEntry::Element(new_item);
            }
            return;
        }

        let at = self.find(&bookmark.anchor).map_or(self.entries.len(), |i| i + 1);
        self.entries.insert(at, FormatEntry::Element(new_item));
        if let Some(index) = self.find(old) {
            self.entries.remove(index);
        }
    }

    /// Replace the entry at `index`, which must be an element.
    pub fn replace(&mut self, index: usize, item: StackItem<Handle>) {
        debug_assert!(matches!(self.entries[index], FormatEntry::Element(_)));
        self.entries[index] = FormatEntry::Element(item);
    }

    pub fn remove_at(&mut self, index: usize) {
        self.entries.remove(index);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::{Attribute, Namespace, QualName};
    use crate::tokenizer::{StartTag, Tag};
    use crate::LocalName;
    use tendril::StrTendril;

    fn item(id: usize, name: &str, attrs: &[(&str, &str)]) -> StackItem<usize> {
        let tag = Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: attrs
                .iter()
                .map(|&(k, v)| Attribute {
                    name: QualName::attr(k),
                    value: StrTendril::from_slice(v),
                })
                .collect(),
        };
        StackItem::new(id, tag, Namespace::Html)
    }

    fn nodes(list: &FormattingList<usize>) -> Vec<Option<usize>> {
        list.iter().map(|e| e.item().map(|i| i.node)).collect()
    }

    #[test]
    fn noahs_ark_keeps_three() {
        let mut list = FormattingList::default();
        for id in 0..4 {
            list.append(item(id, "b", &[("class", "x")]));
        }
        assert_eq!(nodes(&list), vec![Some(1), Some(2), Some(3)]);

        // Different attributes are a different element.
        list.append(item(4, "b", &[("class", "y")]));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn noahs_ark_ignores_attribute_order() {
        let mut list = FormattingList::default();
        list.append(item(0, "a", &[("x", "1"), ("y", "2")]));
        list.append(item(1, "a", &[("y", "2"), ("x", "1")]));
        list.append(item(2, "a", &[("x", "1"), ("y", "2")]));
        list.append(item(3, "a", &[("y", "2"), ("x", "1")]));
        assert_eq!(nodes(&list), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn markers_bound_the_ark_and_lookups() {
        let mut list = FormattingList::default();
        list.append(item(0, "b", &[]));
        list.append(item(1, "b", &[]));
        list.append(item(2, "b", &[]));
        list.append_marker();
        list.append(item(3, "b", &[]));
        assert_eq!(list.len(), 5);
        assert_eq!(list.closest_element_in_scope_with_name("b").map(|(i, _)| i), Some(4));

        list.clear_to_last_marker();
        assert_eq!(list.len(), 3);
        assert!(list.closest_element_in_scope_with_name("i").is_none());
        assert_eq!(list.closest_element_in_scope_with_name("b").map(|(_, it)| it.node), Some(2));
    }

    #[test]
    fn swap_in_place_without_moving_bookmark() {
        let mut list = FormattingList::default();
        list.append(item(0, "a", &[]));
        list.append(item(1, "b", &[]));
        list.append(item(2, "i", &[]));
        let bookmark = list.bookmark_for(&1);
        list.swap_to(&1, item(9, "b", &[]), &bookmark);
        assert_eq!(nodes(&list), vec![Some(0), Some(9), Some(2)]);
    }

    #[test]
    fn swap_after_moved_bookmark() {
        let mut list = FormattingList::default();
        list.append(item(0, "b", &[]));
        list.append(item(1, "i", &[]));
        list.append(item(2, "u", &[]));
        let mut bookmark = list.bookmark_for(&0);
        bookmark.move_to_after(1);
        list.swap_to(&0, item(9, "b", &[]), &bookmark);
        assert_eq!(nodes(&list), vec![Some(1), Some(9), Some(2)]);
    }

    #[test]
    fn remove_and_find() {
        let mut list = FormattingList::default();
        list.append(item(0, "b", &[]));
        list.append_marker();
        list.append(item(1, "i", &[]));
        assert_eq!(list.find(&1), Some(2));
        assert!(list.remove(&0).is_some());
        assert_eq!(list.find(&1), Some(1));
        assert!(list.remove(&0).is_none());
    }
}
