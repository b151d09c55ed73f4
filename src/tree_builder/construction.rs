// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The construction site: every DOM mutation the tree builder wants is
//! queued here as a task and applied to the sink in order by
//! `execute_queued_tasks`.
//!
//! Deferring the mutations lets a sink callback re-enter the parser while
//! tasks run. The queue is swapped out before it is drained, so tasks
//! queued by a reentrant call start a fresh drain.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::mem;

use log::{debug, trace, warn};
use tendril::StrTendril;

use crate::interface::{ElementFlags, Namespace, QualName, TreeSink};
use crate::tokenizer::Tag;
use crate::tree_builder::formatting::{FormatEntry, FormattingList};
use crate::tree_builder::stack::{is_annotation_xml_integration_point, ElementStack, StackItem};
use crate::tree_builder::tag_sets::*;
use crate::tree_builder::types::SplitStatus;
use crate::tree_builder::{DepthLimitPolicy, TreeBuilderOpts};
use crate::util::str::is_all_whitespace;

/// Whitespace-only text up to this many bytes is shared through the cache.
const MAX_INTERNED_WHITESPACE: usize = 64;

/// Where a node goes. Foster parenting is resolved when the task runs,
/// since the table may have been moved by then.
#[derive(Clone, Debug)]
pub(crate) enum InsertionPoint<Handle> {
    LastChild(Handle),
    /// Before `table` if it has a parent, else at the end of
    /// `prev_element`, the element below the table on the stack.
    FosterParent { table: Handle, prev_element: Handle },
}

#[derive(Debug)]
enum Task<Handle> {
    /// A node that was just created.
    Insert {
        point: InsertionPoint<Handle>,
        child: Handle,
        element: bool,
        self_closing: bool,
        depth_limited: bool,
    },
    InsertText {
        point: InsertionPoint<Handle>,
        text: StrTendril,
        depth_limited: bool,
    },
    /// A node already in the tree, relocated by the adoption agency.
    Move {
        point: InsertionPoint<Handle>,
        child: Handle,
    },
    Remove(Handle),
    ReparentChildren { from: Handle, to: Handle },
    FinishChildren(Handle),
}

pub(crate) struct ConstructionSite<Sink: TreeSink> {
    pub(crate) sink: Sink,

    document: Sink::Handle,

    /// Stack of open elements, most recently added at end.
    pub(crate) open_elems: RefCell<ElementStack<Sink::Handle>>,

    /// List of active formatting elements.
    pub(crate) active_formatting: RefCell<FormattingList<Sink::Handle>>,

    tasks: RefCell<Vec<Task<Sink::Handle>>>,

    /// Send insertions into table elements to the foster parent instead.
    redirect_to_foster: Cell<bool>,

    detached: Cell<bool>,

    whitespace_cache: RefCell<HashSet<StrTendril>>,

    text_chunk_size: usize,
    max_tree_depth: Option<usize>,
    depth_limit_policy: DepthLimitPolicy,
}

/// The largest prefix of `s` no longer than `max` bytes that ends on a
/// character boundary.
fn split_point(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut i = max;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

impl<Sink: TreeSink> ConstructionSite<Sink> {
    pub(crate) fn new(sink: Sink, opts: &TreeBuilderOpts) -> ConstructionSite<Sink> {
        let document = sink.get_document();
        ConstructionSite {
            sink,
            document,
            open_elems: RefCell::new(ElementStack::default()),
            active_formatting: RefCell::new(FormattingList::default()),
            tasks: RefCell::new(vec![]),
            redirect_to_foster: Cell::new(false),
            detached: Cell::new(false),
            whitespace_cache: RefCell::new(HashSet::new()),
            text_chunk_size: opts.text_chunk_size.max(1),
            max_tree_depth: opts.max_tree_depth,
            depth_limit_policy: opts.depth_limit_policy,
        }
    }

    pub(crate) fn document(&self) -> &Sink::Handle {
        &self.document
    }

    /// Drop everything queued and refuse further work.
    pub(crate) fn detach(&self) {
        debug!("construction site detached");
        self.detached.set(true);
        self.tasks.borrow_mut().clear();
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.get()
    }

    /// Run `f` with insertions into table elements going to the foster
    /// parent.
    pub(crate) fn with_foster_parenting<R>(&self, f: impl FnOnce() -> R) -> R {
        let saved = self.redirect_to_foster.replace(true);
        let result = f();
        self.redirect_to_foster.set(saved);
        result
    }

    //§ the-stack-of-open-elements
    pub(crate) fn current(&self) -> Option<Ref<'_, StackItem<Sink::Handle>>> {
        Ref::filter_map(self.open_elems.borrow(), |stack| stack.top()).ok()
    }

    pub(crate) fn current_node(&self) -> Option<Sink::Handle> {
        self.open_elems.borrow().top().map(|item| item.node.clone())
    }

    pub(crate) fn current_is(&self, name: &str) -> bool {
        self.open_elems.borrow().top().map_or(false, |item| item.is_html(name))
    }

    pub(crate) fn current_in(&self, set: fn(&QualName) -> bool) -> bool {
        self.open_elems.borrow().top().map_or(false, |item| item.is_in(set))
    }

    pub(crate) fn push(&self, item: StackItem<Sink::Handle>) {
        self.open_elems.borrow_mut().push(item);
    }

    /// Pop the current node, queueing the end of its children.
    pub(crate) fn pop(&self) -> Option<StackItem<Sink::Handle>> {
        let item = self.open_elems.borrow_mut().pop()?;
        self.queue(Task::FinishChildren(item.node.clone()));
        Some(item)
    }

    fn finish_popped(&self, popped: Vec<StackItem<Sink::Handle>>) -> usize {
        let n = popped.len();
        for item in popped {
            self.queue(Task::FinishChildren(item.node));
        }
        n
    }

    pub(crate) fn pop_until(&self, node: &Sink::Handle) -> usize {
        let popped = self.open_elems.borrow_mut().pop_until(node);
        self.finish_popped(popped)
    }

    pub(crate) fn pop_until_popped(&self, name: &str) -> usize {
        let popped = self.open_elems.borrow_mut().pop_until_popped(name);
        self.finish_popped(popped)
    }

    pub(crate) fn pop_until_one_of(&self, set: fn(&QualName) -> bool) -> usize {
        let popped = self.open_elems.borrow_mut().pop_until_one_of(set);
        self.finish_popped(popped)
    }

    pub(crate) fn truncate(&self, len: usize) {
        let popped = self.open_elems.borrow_mut().truncate(len);
        self.finish_popped(popped);
    }

    pub(crate) fn pop_all(&self) {
        self.truncate(0);
    }

    /// Take `node` off the stack wherever it is.
    pub(crate) fn remove_from_stack(&self, node: &Sink::Handle) -> Option<StackItem<Sink::Handle>> {
        let item = self.open_elems.borrow_mut().remove(node)?;
        self.queue(Task::FinishChildren(item.node.clone()));
        Some(item)
    }

    /// Pop while the current node is in `set`, stopping at `except`.
    fn generate_implied_end_tags_with(&self, set: fn(&QualName) -> bool, except: Option<&str>) {
        while self.current_in(set) && !except.map_or(false, |name| self.current_is(name)) {
            self.pop();
        }
    }

    pub(crate) fn generate_implied_end_tags(&self) {
        self.generate_implied_end_tags_with(cursory_implied_end, None);
    }

    pub(crate) fn generate_implied_end_tags_except(&self, name: &str) {
        self.generate_implied_end_tags_with(cursory_implied_end, Some(name));
    }

    pub(crate) fn generate_all_implied_end_tags_thoroughly(&self) {
        self.generate_implied_end_tags_with(thorough_implied_end, None);
    }

    //§ creating-and-inserting-nodes
    fn queue(&self, task: Task<Sink::Handle>) {
        if !self.detached.get() {
            self.tasks.borrow_mut().push(task);
        }
    }

    fn depth_limited(&self) -> bool {
        self.max_tree_depth
            .map_or(false, |max| self.open_elems.borrow().len() >= max)
    }

    /// Queue the insertion of a freshly created node at `point`.
    pub(crate) fn attach_later(
        &self,
        point: InsertionPoint<Sink::Handle>,
        child: Sink::Handle,
        element: bool,
        self_closing: bool,
    ) {
        let depth_limited = self.depth_limited();
        self.queue(Task::Insert {
            point,
            child,
            element,
            self_closing,
            depth_limited,
        });
    }

    /// <https://html.spec.whatwg.org/#appropriate-place-for-inserting-a-node>
    pub(crate) fn appropriate_place(
        &self,
        override_target: Option<&StackItem<Sink::Handle>>,
    ) -> InsertionPoint<Sink::Handle> {
        let stack = self.open_elems.borrow();
        let target = match override_target.or_else(|| stack.top()) {
            Some(target) => target,
            None => return InsertionPoint::LastChild(self.document.clone()),
        };

        if self.redirect_to_foster.get() && target.is_in(foster_target) {
            return self.find_foster_site(&stack);
        }

        if target.is_html("template") {
            InsertionPoint::LastChild(self.sink.get_template_contents(&target.node))
        } else {
            InsertionPoint::LastChild(target.node.clone())
        }
    }

    /// Where foster-parented content goes, relative to the last table on
    /// the stack.
    pub(crate) fn find_foster_site(&self, stack: &ElementStack<Sink::Handle>) -> InsertionPoint<Sink::Handle> {
        let last_table = stack.topmost("table");
        if let Some(template) = stack.topmost("template") {
            if last_table.map_or(true, |table| template > table) {
                if let Some(item) = stack.get(template) {
                    return InsertionPoint::LastChild(self.sink.get_template_contents(&item.node));
                }
            }
        }

        let site = last_table.and_then(|index| Some((stack.get(index)?, stack.get(index.checked_sub(1)?)?)));
        match site {
            Some((table, prev)) => InsertionPoint::FosterParent {
                table: table.node.clone(),
                prev_element: prev.node.clone(),
            },
            None => {
                warn!("foster parenting without an open table");
                let html = stack.get(0).map_or_else(|| self.document.clone(), |item| item.node.clone());
                InsertionPoint::LastChild(html)
            },
        }
    }

    fn create_element(&self, tag: Tag, ns: Namespace) -> StackItem<Sink::Handle> {
        let flags = ElementFlags {
            template: ns == Namespace::Html && &*tag.name == "template",
            mathml_annotation_xml_integration_point: is_annotation_xml_integration_point(&tag, ns),
        };
        let name = QualName::new(None, ns, tag.name.clone());
        let node = self.sink.create_element(name, tag.attrs.clone(), flags);
        StackItem::new(node, tag, ns)
    }

    fn insert_element(&self, tag: Tag, ns: Namespace, push: bool) -> StackItem<Sink::Handle> {
        let item = self.create_element(tag, ns);
        let point = self.appropriate_place(None);
        self.attach_later(point, item.node.clone(), true, !push);
        if push {
            self.push(item.clone());
        }
        item
    }

    pub(crate) fn insert_doctype(&self, name: StrTendril, public_id: StrTendril, system_id: StrTendril) {
        let doctype = self.sink.create_doctype(name, public_id, system_id);
        self.attach_later(InsertionPoint::LastChild(self.document.clone()), doctype, false, false);
    }

    pub(crate) fn insert_comment(&self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        let point = self.appropriate_place(None);
        self.attach_later(point, comment, false, false);
    }

    pub(crate) fn insert_comment_on_document(&self, text: StrTendril) {
        let comment = self.sink.create_comment(text);
        self.attach_later(InsertionPoint::LastChild(self.document.clone()), comment, false, false);
    }

    /// Comments after `</body>` go at the end of the `html` element.
    pub(crate) fn insert_comment_on_html_element(&self, text: StrTendril) {
        let html = self.open_elems.borrow().get(0).map(|item| item.node.clone());
        let comment = self.sink.create_comment(text);
        let parent = html.unwrap_or_else(|| self.document.clone());
        self.attach_later(InsertionPoint::LastChild(parent), comment, false, false);
    }

    /// Create the root `html` element as the document's child and push it.
    pub(crate) fn insert_html_html_element(&self, tag: Tag) -> Sink::Handle {
        let item = self.create_element(tag, Namespace::Html);
        self.attach_later(InsertionPoint::LastChild(self.document.clone()), item.node.clone(), true, false);
        let node = item.node.clone();
        self.push(item);
        node
    }

    /// The root of a fragment parse. Resetting the insertion mode looks at
    /// the context element in its place.
    pub(crate) fn insert_fragment_root(&self, tag: Tag) -> Sink::Handle {
        let mut item = self.create_element(tag, Namespace::Html);
        item.is_fragment_root = true;
        self.attach_later(InsertionPoint::LastChild(self.document.clone()), item.node.clone(), true, false);
        let node = item.node.clone();
        self.push(item);
        node
    }

    pub(crate) fn insert_html_element(&self, tag: Tag) -> Sink::Handle {
        self.insert_element(tag, Namespace::Html, true).node
    }

    pub(crate) fn insert_self_closing_html_element(&self, tag: Tag) -> Sink::Handle {
        self.insert_element(tag, Namespace::Html, false).node
    }

    pub(crate) fn insert_formatting_element(&self, tag: Tag) -> Sink::Handle {
        let item = self.insert_element(tag, Namespace::Html, true);
        let node = item.node.clone();
        self.active_formatting.borrow_mut().append(item);
        node
    }

    pub(crate) fn insert_html_head_element(&self, tag: Tag) -> Sink::Handle {
        self.insert_html_element(tag)
    }

    pub(crate) fn insert_html_body_element(&self, tag: Tag) -> Sink::Handle {
        self.insert_html_element(tag)
    }

    /// A demoted form (one opened inside a table) is inserted but never
    /// pushed, so it cannot gather children.
    pub(crate) fn insert_html_form_element(&self, tag: Tag, is_demoted: bool) -> Sink::Handle {
        self.insert_element(tag, Namespace::Html, !is_demoted).node
    }

    pub(crate) fn insert_script_element(&self, tag: Tag, already_started: bool) -> Sink::Handle {
        let item = self.create_element(tag, Namespace::Html);
        if already_started {
            self.sink.mark_script_already_started(&item.node);
        }
        let point = self.appropriate_place(None);
        self.attach_later(point, item.node.clone(), true, false);
        let node = item.node.clone();
        self.push(item);
        node
    }

    pub(crate) fn insert_foreign_element(&self, tag: Tag, ns: Namespace, self_closing: bool) -> Sink::Handle {
        self.insert_element(tag, ns, !self_closing).node
    }

    /// Queue `text` at the appropriate place. `whitespace` says what is
    /// already known about its content.
    pub(crate) fn insert_text(&self, text: StrTendril, whitespace: SplitStatus) {
        if text.is_empty() {
            return;
        }
        let text = match whitespace {
            SplitStatus::NotWhitespace => text,
            SplitStatus::Whitespace | SplitStatus::NotSplit => self.intern_whitespace(text),
        };
        let point = self.appropriate_place(None);
        let depth_limited = self.depth_limited();
        self.queue(Task::InsertText {
            point,
            text,
            depth_limited,
        });
    }

    fn intern_whitespace(&self, text: StrTendril) -> StrTendril {
        if text.len() > MAX_INTERNED_WHITESPACE || !is_all_whitespace(&text) {
            return text;
        }
        let mut cache = self.whitespace_cache.borrow_mut();
        if let Some(shared) = cache.get(&text) {
            return shared.clone();
        }
        cache.insert(text.clone());
        text
    }

    //§ adoption-agency-algorithm
    /// Queue the relocation of an element that is already in the tree.
    pub(crate) fn move_later(&self, point: InsertionPoint<Sink::Handle>, child: Sink::Handle) {
        self.queue(Task::Move { point, child });
    }

    pub(crate) fn reparent_children_later(&self, from: Sink::Handle, to: Sink::Handle) {
        self.queue(Task::ReparentChildren { from, to });
    }

    pub(crate) fn remove_from_parent_later(&self, node: Sink::Handle) {
        self.queue(Task::Remove(node));
    }

    /// Create a copy of `item`'s element from its originating tag. The copy
    /// is not inserted anywhere yet.
    pub(crate) fn clone_element(&self, item: &StackItem<Sink::Handle>) -> StackItem<Sink::Handle> {
        self.create_element(item.tag.clone(), item.name.ns)
    }

    //§ reconstruct-the-active-formatting-elements
    pub(crate) fn reconstruct_active_formatting_elements(&self) {
        let start = {
            let list = self.active_formatting.borrow();
            let stack = self.open_elems.borrow();
            let settled = |entry: &FormatEntry<Sink::Handle>| {
                entry.item().map_or(true, |item| stack.contains(&item.node))
            };

            match list.last() {
                Some(last) if !settled(last) => (),
                _ => return,
            }

            let mut index = list.len() - 1;
            while index > 0 && !list.get(index - 1).map_or(true, |entry| settled(entry)) {
                index -= 1;
            }
            index
        };

        let len = self.active_formatting.borrow().len();
        for index in start..len {
            let tag = self
                .active_formatting
                .borrow()
                .get(index)
                .and_then(FormatEntry::item)
                .map(|item| item.tag.clone());
            let Some(tag) = tag else { continue };
            trace!("reconstructing <{}>", tag.name);
            let item = self.insert_element(tag, Namespace::Html, true);
            self.active_formatting.borrow_mut().replace(index, item);
        }
    }

    //§ executing-the-tasks
    pub(crate) fn execute_queued_tasks(&self) {
        loop {
            let tasks = mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                return;
            }
            trace!("executing {} construction tasks", tasks.len());
            for task in tasks {
                if self.detached.get() {
                    return;
                }
                self.execute(task);
            }
        }
    }

    fn resolve(&self, point: InsertionPoint<Sink::Handle>) -> (Sink::Handle, Option<Sink::Handle>) {
        match point {
            InsertionPoint::LastChild(parent) => (parent, None),
            InsertionPoint::FosterParent { table, prev_element } => match self.sink.parent_node(&table) {
                Some(parent) => (parent, Some(table)),
                None => (prev_element, None),
            },
        }
    }

    fn insert_node(&self, parent: &Sink::Handle, next: Option<&Sink::Handle>, child: &Sink::Handle) {
        match next {
            Some(next) => self.sink.insert_before(parent, child, next),
            None => self.sink.append_child(parent, child),
        }
    }

    fn execute(&self, task: Task<Sink::Handle>) {
        match task {
            Task::Insert {
                point,
                child,
                element,
                self_closing,
                depth_limited,
            } => {
                let (parent, next) = self.resolve(point);
                let (parent, next) = match self.limit_depth(parent, next, depth_limited) {
                    Some(place) => place,
                    None => return,
                };
                self.insert_node(&parent, next.as_ref(), &child);
                self.sink.attach(&child);
                if element {
                    self.sink.begin_parsing_children(&child);
                    if self_closing {
                        self.sink.finish_parsing_children(&child);
                    }
                }
            },
            Task::InsertText {
                point,
                text,
                depth_limited,
            } => {
                let (parent, next) = self.resolve(point);
                if let Some((parent, next)) = self.limit_depth(parent, next, depth_limited) {
                    self.insert_text_now(&parent, next.as_ref(), text);
                }
            },
            Task::Move { point, child } => {
                let (parent, next) = self.resolve(point);
                self.sink.remove_from_parent(&child);
                self.insert_node(&parent, next.as_ref(), &child);
            },
            Task::Remove(node) => self.sink.remove_from_parent(&node),
            Task::ReparentChildren { from, to } => self.sink.reparent_children(&from, &to),
            Task::FinishChildren(node) => self.sink.finish_parsing_children(&node),
        }
    }

    /// Apply the depth limit policy to a resolved insertion place. `None`
    /// means the node is dropped.
    fn limit_depth(
        &self,
        parent: Sink::Handle,
        next: Option<Sink::Handle>,
        depth_limited: bool,
    ) -> Option<(Sink::Handle, Option<Sink::Handle>)> {
        if !depth_limited {
            return Some((parent, next));
        }
        match self.depth_limit_policy {
            DepthLimitPolicy::Discard => {
                debug!("dropping a node past the maximum tree depth");
                None
            },
            DepthLimitPolicy::ReparentToGrandparent => match self.sink.parent_node(&parent) {
                Some(grandparent) => {
                    debug!("inserting past the maximum tree depth into the grandparent");
                    Some((grandparent, None))
                },
                None => Some((parent, next)),
            },
        }
    }

    /// Fill the preceding text node up to the chunk size, then spill the
    /// rest into new text nodes of at most that size.
    fn insert_text_now(&self, parent: &Sink::Handle, next: Option<&Sink::Handle>, text: StrTendril) {
        let cap = self.text_chunk_size;
        let s: &str = &text;
        let mut offset = 0;

        let prev = match next {
            Some(next) => self.sink.previous_sibling(next),
            None => self.sink.last_child(parent),
        };
        if let Some(prev) = prev {
            if let Some(len) = self.sink.text_len(&prev) {
                if len < cap {
                    offset = split_point(s, cap - len);
                    self.sink.append_text(&prev, &s[..offset]);
                }
            }
        }

        while offset < s.len() {
            let rest = &s[offset..];
            let mut take = split_point(rest, cap);
            if take == 0 {
                // A single character wider than the chunk size.
                take = rest.chars().next().map_or(rest.len(), char::len_utf8);
            }
            let node = self.sink.create_text(text.subtendril(offset as u32, take as u32));
            self.insert_node(parent, next, &node);
            self.sink.attach(&node);
            offset += take;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dom::{ArenaDom, NodeId};
    use crate::tokenizer::{CharacterTokens, EndTag, StartTag, TagToken, TokenSink};
    use crate::tree_builder::TreeBuilder;
    use crate::LocalName;

    fn tag(name: &str) -> Tag {
        Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: vec![],
        }
    }

    fn end_tag(name: &str) -> Tag {
        Tag {
            kind: EndTag,
            ..tag(name)
        }
    }

    fn site(opts: TreeBuilderOpts) -> ConstructionSite<ArenaDom> {
        let site = ConstructionSite::new(ArenaDom::default(), &opts);
        site.insert_html_html_element(tag("html"));
        site.insert_html_body_element(tag("body"));
        site
    }

    fn body(site: &ConstructionSite<ArenaDom>) -> NodeId {
        site.open_elems.borrow().get(1).map(|item| item.node).unwrap()
    }

    fn texts(dom: &ArenaDom, parent: NodeId) -> Vec<String> {
        dom.children(parent).into_iter().filter_map(|c| dom.text(c)).collect()
    }

    #[test]
    fn nothing_happens_before_execution() {
        let site = site(TreeBuilderOpts::default());
        site.insert_text(StrTendril::from_slice("x"), SplitStatus::NotSplit);
        assert!(site.sink.children(*site.document()).is_empty());
        site.execute_queued_tasks();
        assert_eq!(texts(&site.sink, body(&site)), vec!["x"]);
    }

    #[test]
    fn adjacent_text_coalesces_up_to_chunk_size() {
        let site = site(TreeBuilderOpts {
            text_chunk_size: 8,
            ..Default::default()
        });
        site.insert_text(StrTendril::from_slice("abcdef"), SplitStatus::NotSplit);
        site.insert_text(StrTendril::from_slice("ghijklmnopqrstu"), SplitStatus::NotSplit);
        site.execute_queued_tasks();
        assert_eq!(texts(&site.sink, body(&site)), vec!["abcdefgh", "ijklmnop", "qrstu"]);
    }

    #[test]
    fn chunks_split_on_char_boundaries() {
        let site = site(TreeBuilderOpts {
            text_chunk_size: 4,
            ..Default::default()
        });
        site.insert_text(StrTendril::from_slice("aé€b"), SplitStatus::NotSplit);
        site.execute_queued_tasks();
        assert_eq!(texts(&site.sink, body(&site)), vec!["aé", "€b"]);
    }

    #[test]
    fn short_whitespace_is_interned() {
        let site = site(TreeBuilderOpts::default());
        let first = site.intern_whitespace(StrTendril::from_slice("\n  "));
        let second = site.intern_whitespace(StrTendril::from_slice("\n  "));
        assert_eq!(first, second);
        assert_eq!(site.whitespace_cache.borrow().len(), 1);
        site.intern_whitespace(StrTendril::from_slice("not blank"));
        assert_eq!(site.whitespace_cache.borrow().len(), 1);
    }

    #[test]
    fn foster_parenting_goes_before_the_table() {
        let site = site(TreeBuilderOpts::default());
        let table = site.insert_html_element(tag("table"));
        let b = site.with_foster_parenting(|| site.insert_html_element(tag("b")));
        site.execute_queued_tasks();
        assert_eq!(site.sink.children(body(&site)), vec![b, table]);
    }

    #[test]
    fn foster_parenting_without_table_parent_uses_previous_element() {
        let site = site(TreeBuilderOpts::default());
        let table = site.insert_html_element(tag("table"));
        site.execute_queued_tasks();
        site.remove_from_parent_later(table);
        site.with_foster_parenting(|| site.insert_text(StrTendril::from_slice("x"), SplitStatus::NotSplit));
        site.execute_queued_tasks();
        assert_eq!(texts(&site.sink, body(&site)), vec!["x"]);
        assert!(site.sink.parent(table).is_none());
    }

    #[test]
    fn redirect_is_restored() {
        let site = site(TreeBuilderOpts::default());
        let table = site.insert_html_element(tag("table"));
        site.with_foster_parenting(|| ());
        let tbody = site.insert_html_element(tag("tbody"));
        site.execute_queued_tasks();
        assert_eq!(site.sink.parent(tbody), Some(table));
    }

    #[test]
    fn deep_insertions_go_to_the_grandparent() {
        let site = site(TreeBuilderOpts {
            max_tree_depth: Some(3),
            ..Default::default()
        });
        let outer = site.insert_html_element(tag("div"));
        let inner = site.insert_html_element(tag("span"));
        site.execute_queued_tasks();
        assert_eq!(site.sink.parent(outer), Some(body(&site)));
        assert_eq!(site.sink.parent(inner), Some(body(&site)));
    }

    #[test]
    fn deep_insertions_can_be_discarded() {
        let site = site(TreeBuilderOpts {
            max_tree_depth: Some(3),
            depth_limit_policy: DepthLimitPolicy::Discard,
            ..Default::default()
        });
        let outer = site.insert_html_element(tag("div"));
        let inner = site.insert_html_element(tag("span"));
        site.execute_queued_tasks();
        assert_eq!(site.sink.parent(outer), Some(body(&site)));
        assert_eq!(site.sink.parent(inner), None);
    }

    #[test]
    fn detached_site_is_inert() {
        let site = site(TreeBuilderOpts::default());
        site.insert_text(StrTendril::from_slice("x"), SplitStatus::NotSplit);
        site.detach();
        site.execute_queued_tasks();
        assert!(site.sink.children(*site.document()).is_empty());
    }

    #[test]
    fn deep_text_goes_to_the_grandparent() {
        let site = site(TreeBuilderOpts {
            max_tree_depth: Some(3),
            ..Default::default()
        });
        let div = site.insert_html_element(tag("div"));
        site.insert_text(StrTendril::from_slice("x"), SplitStatus::NotSplit);
        site.execute_queued_tasks();
        assert!(texts(&site.sink, div).is_empty());
        assert_eq!(texts(&site.sink, body(&site)), vec!["x"]);
    }

    #[test]
    fn deep_text_can_be_discarded() {
        let site = site(TreeBuilderOpts {
            max_tree_depth: Some(3),
            depth_limit_policy: DepthLimitPolicy::Discard,
            ..Default::default()
        });
        let div = site.insert_html_element(tag("div"));
        site.insert_text(StrTendril::from_slice("x"), SplitStatus::NotSplit);
        site.execute_queued_tasks();
        assert!(texts(&site.sink, div).is_empty());
        assert!(texts(&site.sink, body(&site)).is_empty());
    }

    // An entry that is neither a marker nor open can only be reopened by
    // reconstruction if no marker or open entry comes after it.
    fn assert_formatting_reconstructible(site: &ConstructionSite<ArenaDom>) {
        let open = site.open_elems.borrow();
        let mut closed_seen = false;
        for entry in site.active_formatting.borrow().iter() {
            match entry.item() {
                Some(item) if !open.contains(&item.node) => closed_seen = true,
                _ => assert!(!closed_seen, "an open entry or marker follows a closed entry"),
            }
        }
    }

    #[test]
    fn misnested_formatting_stays_reconstructible() {
        let tb = TreeBuilder::new(ArenaDom::default(), TreeBuilderOpts::default());
        let tokens = vec![
            TagToken(tag("b")),
            TagToken(tag("i")),
            TagToken(tag("p")),
            TagToken(end_tag("b")),
            CharacterTokens(StrTendril::from_slice("x")),
            TagToken(end_tag("i")),
            TagToken(tag("p")),
            TagToken(tag("u")),
            TagToken(tag("s")),
            TagToken(end_tag("p")),
        ];
        for token in tokens {
            let _ = tb.process_token(token, 1);
            assert_formatting_reconstructible(&tb.site);
        }

        // Closing the second paragraph closed all four formatting elements
        // reopened inside it.
        {
            let open = tb.site.open_elems.borrow();
            let closed = tb
                .site
                .active_formatting
                .borrow()
                .iter()
                .filter_map(|entry| entry.item())
                .filter(|item| !open.contains(&item.node))
                .count();
            assert_eq!(closed, 4);
        }

        let _ = tb.process_token(CharacterTokens(StrTendril::from_slice("y")), 1);
        assert_formatting_reconstructible(&tb.site);
        let open = tb.site.open_elems.borrow();
        assert!(tb
            .site
            .active_formatting
            .borrow()
            .iter()
            .filter_map(|entry| entry.item())
            .all(|item| open.contains(&item.node)));
    }
}
