// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The interface between the parser and the DOM it builds.
//!
//! The tree builder never touches nodes directly. It calls the methods of a
//! [`TreeSink`] with opaque handles, and only through the construction
//! site's task queue.

use std::borrow::Cow;
use std::fmt;

use tendril::StrTendril;

use crate::LocalName;

pub use self::QuirksMode::{LimitedQuirks, NoQuirks, Quirks};

/// The namespaces the parser can put elements and attributes in.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
pub enum Namespace {
    /// No namespace, used for ordinary attributes.
    None,
    Html,
    Svg,
    MathMl,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    pub fn url(self) -> &'static str {
        match self {
            Namespace::None => "",
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }
}

/// A fully qualified name (with a namespace), used to name elements and
/// attributes.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub struct QualName {
    /// The prefix written in the source, kept for foreign attributes such
    /// as `xlink:href`.
    pub prefix: Option<LocalName>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    #[inline]
    pub fn new(prefix: Option<LocalName>, ns: Namespace, local: LocalName) -> QualName {
        QualName { prefix, ns, local }
    }

    /// An element name in the HTML namespace.
    pub fn html(local: &str) -> QualName {
        QualName::new(None, Namespace::Html, LocalName::from(local))
    }

    /// An attribute name in no namespace.
    pub fn attr(local: &str) -> QualName {
        QualName::new(None, Namespace::None, LocalName::from(local))
    }

    pub fn is_html(&self, local: &str) -> bool {
        self.ns == Namespace::Html && &*self.local == local
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix {
            Some(ref p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// A tag attribute, e.g. `class="test"` in `<div class="test" ...>`.
///
/// The namespace on the attribute name is almost always `Namespace::None`.
/// The tokenizer creates all attributes this way, but the tree builder
/// adjusts certain attribute names inside foreign content (MathML, SVG).
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    pub name: QualName,
    pub value: StrTendril,
}

#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

/// Special properties of an element, useful for tagging elements with
/// this information.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct ElementFlags {
    /// A document fragment should be created, associated with the element,
    /// and returned in `TreeSink::get_template_contents`.
    pub template: bool,

    /// The element is a MathML `annotation-xml` whose `encoding` makes it an
    /// HTML integration point.
    pub mathml_annotation_xml_integration_point: bool,
}

/// Types which can process tree modifications from the tree builder.
///
/// Every method takes `&self`: callbacks may re-enter the parser, so sinks
/// are expected to use interior mutability. All mutation methods are
/// "parser" variants, and must not dispatch script-observable mutation
/// events.
pub trait TreeSink {
    /// `Handle` is a reference to a DOM node. The tree builder requires
    /// that a `Handle` implements `Clone` to get another reference to
    /// the same node, and `PartialEq` to compare node identity.
    type Handle: Clone + PartialEq;

    /// The overall result of parsing.
    type Output;

    /// Consume this sink and return the overall result of parsing.
    fn finish(self) -> Self::Output;

    /// Signal a parse error. Recovery is always performed by the parser.
    fn parse_error(&self, msg: Cow<'static, str>);

    /// Get a handle to the `Document` node.
    fn get_document(&self) -> Self::Handle;

    /// Create an element.
    ///
    /// When creating a template element (`name == html "template"`),
    /// an associated document fragment called the "template contents" should
    /// also be created. Later calls to `get_template_contents` with that
    /// given element return it.
    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle;

    /// Create a detached text node.
    fn create_text(&self, text: StrTendril) -> Self::Handle;

    /// Create a comment node.
    fn create_comment(&self, text: StrTendril) -> Self::Handle;

    /// Create a doctype node. It is appended to the document by the caller.
    fn create_doctype(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) -> Self::Handle;

    /// Get a handle to a template's template contents. The tree builder
    /// promises this will never be called with something else than
    /// a template element.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle;

    /// The parent of `node`, if it has one.
    fn parent_node(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// The last child of `node`, if it has one.
    fn last_child(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// The sibling immediately before `node`, if it has one.
    fn previous_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// The length in bytes of a text node's data, or `None` if `node` is not
    /// a text node.
    fn text_len(&self, node: &Self::Handle) -> Option<usize>;

    /// Append to the data of an existing text node.
    fn append_text(&self, node: &Self::Handle, text: &str);

    /// Append a node as the last child of the given node.
    fn append_child(&self, parent: &Self::Handle, child: &Self::Handle);

    /// Insert `child` as a child of `parent`, immediately before `next_sibling`.
    fn insert_before(&self, parent: &Self::Handle, child: &Self::Handle, next_sibling: &Self::Handle);

    /// Detach the given node from its parent.
    fn remove_from_parent(&self, target: &Self::Handle);

    /// Remove all the children from node and append them to new_parent.
    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle);

    /// Add each attribute to the given element, if no attribute with that name
    /// already exists. The tree builder promises this will never be called
    /// with something else than an element.
    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>);

    /// Set the document's quirks mode.
    fn set_quirks_mode(&self, mode: QuirksMode);

    /// Couple a freshly inserted node to whatever presentation layer the
    /// host maintains. The parser calls this right after insertion.
    fn attach(&self, _node: &Self::Handle) {}

    /// Called when the parser starts filling in the children of an element.
    fn begin_parsing_children(&self, _node: &Self::Handle) {}

    /// Called when the parser is done with an element's children. For a
    /// self-closing element this follows `begin_parsing_children` directly.
    fn finish_parsing_children(&self, _node: &Self::Handle) {}

    /// Mark a HTML `<script>` as "already started".
    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    /// Associate the given form-associatable element with the form element.
    fn associate_with_form(&self, _target: &Self::Handle, _form: &Self::Handle) {}

    /// Called whenever the line number changes.
    fn set_current_line(&self, _line_number: u64) {}
}
