// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree builder.

pub use self::types::InsertionMode;
pub use crate::interface::{LimitedQuirks, NoQuirks, Quirks, QuirksMode, TreeSink};

use self::construction::{ConstructionSite, InsertionPoint};
use self::stack::StackItem;
use self::tag_sets::*;
use self::types::*;

use crate::interface::{Attribute, ElementFlags, Namespace, QualName};
use crate::tokenizer::states::{self as tok_state, RawKind};
use crate::tokenizer::{self, Doctype, EndTag, StartTag, Tag, TokenSink, TokenSinkResult};
use crate::util::str::to_escaped_string;
use crate::LocalName;

use std::borrow::Cow::{self, Borrowed};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use log::{debug, log_enabled, warn, Level};
use mac::format_if;
use tendril::StrTendril;

#[macro_use]
mod tag_sets;

mod construction;
mod data;
mod foreign;
pub mod formatting;
mod rules;
pub mod stack;
mod types;

/// Tokens a single input token may be re-dispatched through before the
/// loop is considered runaway.
const MAX_REDISPATCH: usize = 32;

/// What to do with a node that would be inserted deeper than
/// `TreeBuilderOpts::max_tree_depth`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum DepthLimitPolicy {
    /// Insert it into its would-be parent's parent instead, so the tree
    /// stops growing deeper but keeps all content.
    #[default]
    ReparentToGrandparent,
    /// Leave it out of the tree.
    Discard,
}

/// Tree builder options, with an impl for Default.
#[derive(Copy, Clone, Debug)]
pub struct TreeBuilderOpts {
    /// Report all parse errors defined by the HTML standard, at some
    /// performance penalty?  Default: false
    pub exact_errors: bool,

    /// Is scripting enabled?
    ///
    /// When it is, `<noscript>` content is parsed as raw text. Otherwise it
    /// is parsed as markup.  Default: true
    pub scripting_enabled: bool,

    /// Are plugins enabled? Decides the same thing for `<noembed>`.
    /// Default: true
    pub plugins_enabled: bool,

    /// Is this an iframe srcdoc document?
    pub iframe_srcdoc: bool,

    /// Should we drop the DOCTYPE (if any) from the tree?
    pub drop_doctype: bool,

    /// Initial TreeBuilder quirks mode. Default: NoQuirks
    pub quirks_mode: QuirksMode,

    /// Use the tokenizer's pre-HTML5 tag recovery. Only read by the driver,
    /// which hands it to the tokenizer.  Default: false
    pub pre_html5_quirks: bool,

    /// The most open elements a new node may be nested under, or `None`
    /// for no limit.  Default: Some(512)
    pub max_tree_depth: Option<usize>,

    pub depth_limit_policy: DepthLimitPolicy,

    /// Longest run of text, in bytes, kept in a single text node.
    /// Default: 65536
    pub text_chunk_size: usize,
}

impl Default for TreeBuilderOpts {
    fn default() -> TreeBuilderOpts {
        TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: true,
            plugins_enabled: true,
            iframe_srcdoc: false,
            drop_doctype: false,
            quirks_mode: NoQuirks,
            pre_html5_quirks: false,
            max_tree_depth: Some(512),
            depth_limit_policy: DepthLimitPolicy::ReparentToGrandparent,
            text_chunk_size: 65536,
        }
    }
}

/// The HTML tree builder.
pub struct TreeBuilder<Sink: TreeSink> {
    /// Options controlling the behavior of the tree builder.
    opts: TreeBuilderOpts,

    /// Queued DOM mutations, the stack of open elements and the list of
    /// active formatting elements.
    site: ConstructionSite<Sink>,

    /// Insertion mode.
    mode: Cell<InsertionMode>,

    /// Original insertion mode, used by Text and InTableText modes.
    orig_mode: Cell<Option<InsertionMode>>,

    /// Stack of template insertion modes.
    template_modes: RefCell<Vec<InsertionMode>>,

    /// Pending table character tokens.
    pending_table_text: RefCell<Vec<(SplitStatus, StrTendril)>>,

    /// Quirks mode as set by the parser.
    quirks_mode: Cell<QuirksMode>,

    //§ the-element-pointers
    /// Head element pointer. The whole stack item is kept so the head can
    /// be pushed again for stray head content after `</head>`.
    head_elem: RefCell<Option<StackItem<Sink::Handle>>>,

    /// Form element pointer.
    form_elem: RefCell<Option<Sink::Handle>>,
    //§ END
    /// Frameset-ok flag.
    frameset_ok: Cell<bool>,

    /// Ignore a following U+000A LINE FEED?
    ignore_lf: Cell<bool>,

    /// The context element for the fragment parsing algorithm.
    context_elem: Option<StackItem<Sink::Handle>>,

    /// Track current line
    current_line: Cell<u64>,

    /// Line of the start tag of the script being parsed.
    script_start_line: Cell<u64>,

    /// A script whose end tag has been seen and which has not been handed
    /// out by `take_script_to_process` yet.
    script_to_process: RefCell<Option<(Sink::Handle, u64)>>,
}

impl<Sink: TreeSink> TreeBuilder<Sink> {
    /// Create a new tree builder which sends tree modifications to a particular `TreeSink`.
    ///
    /// The tree builder is also a `TokenSink`.
    pub fn new(sink: Sink, opts: TreeBuilderOpts) -> TreeBuilder<Sink> {
        TreeBuilder {
            site: ConstructionSite::new(sink, &opts),
            mode: Cell::new(InsertionMode::Initial),
            orig_mode: Cell::new(None),
            template_modes: Default::default(),
            pending_table_text: Default::default(),
            quirks_mode: Cell::new(opts.quirks_mode),
            head_elem: Default::default(),
            form_elem: Default::default(),
            frameset_ok: Cell::new(true),
            ignore_lf: Default::default(),
            context_elem: None,
            current_line: Cell::new(1),
            script_start_line: Cell::new(1),
            script_to_process: Default::default(),
            opts,
        }
    }

    /// Create a new tree builder for parsing a fragment in the context of
    /// an element called `context_name` with `context_attrs`.
    ///
    /// The fragment is built under an `html` root appended to the sink's
    /// document.
    pub fn new_for_fragment(
        sink: Sink,
        context_name: QualName,
        context_attrs: Vec<Attribute>,
        opts: TreeBuilderOpts,
    ) -> TreeBuilder<Sink> {
        let context_tag = Tag {
            kind: StartTag,
            name: context_name.local.clone(),
            self_closing: false,
            attrs: context_attrs,
        };
        let flags = ElementFlags {
            template: context_name.is_html("template"),
            mathml_annotation_xml_integration_point: stack::is_annotation_xml_integration_point(
                &context_tag,
                context_name.ns,
            ),
        };
        let context_node = sink.create_element(context_name.clone(), context_tag.attrs.clone(), flags);
        let context_elem = StackItem::new(context_node, context_tag, context_name.ns);

        let template_modes = if context_elem.is_html("template") {
            vec![InsertionMode::InTemplate]
        } else {
            vec![]
        };

        let mut tb = TreeBuilder::new(sink, opts);
        tb.context_elem = Some(context_elem);
        *tb.template_modes.borrow_mut() = template_modes;

        // https://html.spec.whatwg.org/multipage/#parsing-html-fragments
        // 5. Let root be a new html element with no attributes.
        // 6. Append the element root to the Document node created above.
        // 7. Set up the parser's stack of open elements so that it contains just the single element root.
        tb.site.insert_fragment_root(Tag {
            kind: StartTag,
            name: LocalName::from("html"),
            self_closing: false,
            attrs: vec![],
        });
        // 10. Reset the parser's insertion mode appropriately.
        tb.mode.set(tb.reset_insertion_mode());
        tb.site.execute_queued_tasks();

        tb
    }

    // https://html.spec.whatwg.org/multipage/#concept-frag-parse-context
    // Step 4. Set the state of the HTML parser's tokenization stage as follows:
    pub fn tokenizer_state_for_context_elem(&self) -> tok_state::State {
        let Some(elem) = self.context_elem.as_ref() else {
            return tok_state::Data;
        };
        if elem.name.ns != Namespace::Html {
            return tok_state::Data;
        }
        match &*elem.name.local {
            "title" | "textarea" => tok_state::RawData(tok_state::Rcdata),

            "style" | "xmp" | "iframe" | "noframes" => tok_state::RawData(tok_state::Rawtext),

            "noembed" if self.opts.plugins_enabled => tok_state::RawData(tok_state::Rawtext),

            "noscript" if self.opts.scripting_enabled => tok_state::RawData(tok_state::Rawtext),

            "script" => tok_state::RawData(tok_state::ScriptData),

            "plaintext" => tok_state::Plaintext,

            _ => tok_state::Data,
        }
    }

    pub fn sink(&self) -> &Sink {
        &self.site.sink
    }

    /// Give back the sink, for `TreeSink::finish`.
    pub fn into_sink(self) -> Sink {
        self.site.sink
    }

    /// Are we parsing a HTML fragment?
    pub fn is_fragment(&self) -> bool {
        self.context_elem.is_some()
    }

    pub fn insertion_mode(&self) -> InsertionMode {
        self.mode.get()
    }

    /// The script element whose end tag paused parsing, with the line its
    /// start tag was on. Clears the pending script.
    pub fn take_script_to_process(&self) -> Option<(Sink::Handle, u64)> {
        self.script_to_process.borrow_mut().take()
    }

    /// Stop touching the sink. Queued mutations are dropped and every
    /// later token is ignored.
    pub fn detach(&self) {
        self.site.detach();
        self.script_to_process.borrow_mut().take();
    }

    pub fn is_detached(&self) -> bool {
        self.site.is_detached()
    }

    fn debug_step(&self, mode: InsertionMode, token: &Token) {
        if log_enabled!(Level::Debug) {
            debug!(
                "processing {} in insertion mode {:?}",
                to_escaped_string(token),
                mode
            );
        }
    }

    fn process_to_completion(&self, mut token: Token) -> TokenSinkResult<Sink::Handle> {
        // Queue of additional tokens yet to be processed.
        // This stays empty in the common case where we don't split whitespace.
        let mut more_tokens = VecDeque::new();
        let mut redispatched = 0;

        loop {
            let should_have_acknowledged_self_closing_flag = matches!(
                token,
                Token::Tag(Tag {
                    self_closing: true,
                    kind: StartTag,
                    ..
                })
            );
            let result = if self.is_foreign(&token) {
                self.step_foreign(token)
            } else {
                let mode = self.mode.get();
                self.step(mode, token)
            };
            match result {
                ProcessResult::Done => {
                    if should_have_acknowledged_self_closing_flag {
                        self.parse_error("Unacknowledged self-closing tag");
                    }
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                    redispatched = 0;
                },
                ProcessResult::DoneAckSelfClosing => {
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                    redispatched = 0;
                },
                ProcessResult::Reprocess(m, t) => {
                    redispatched += 1;
                    debug_assert!(redispatched <= MAX_REDISPATCH, "runaway reprocessing of {t:?}");
                    self.mode.set(m);
                    token = t;
                },
                ProcessResult::SplitWhitespace(mut buf) => {
                    let p = buf.pop_front_char_run(|c| c.is_ascii_whitespace());
                    let Some((first, is_ws)) = p else {
                        return TokenSinkResult::Continue;
                    };
                    let status = if is_ws {
                        SplitStatus::Whitespace
                    } else {
                        SplitStatus::NotWhitespace
                    };
                    token = Token::Characters(status, first);

                    if buf.len32() > 0 {
                        more_tokens.push_front(Token::Characters(SplitStatus::NotSplit, buf));
                    }
                },
                ProcessResult::Synthesize(tokens) => {
                    for t in tokens.into_iter().rev() {
                        more_tokens.push_front(t);
                    }
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                    redispatched = 0;
                },
                ProcessResult::Script(node) => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::Script(node);
                },
                ProcessResult::ToPlaintext => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::Plaintext;
                },
                ProcessResult::ToRawData(k) => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::RawData(k);
                },
            }
        }
    }

    fn process_doctype(&self, dt: Doctype) {
        if self.mode.get() != InsertionMode::Initial {
            self.site.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "DOCTYPE in body",
                "DOCTYPE in insertion mode {:?}",
                self.mode.get()
            ));
            return;
        }

        let (err, quirk) = data::doctype_error_and_quirks(&dt, self.opts.iframe_srcdoc);
        if err {
            self.site
                .sink
                .parse_error(format_if!(self.opts.exact_errors, "Bad DOCTYPE", "Bad DOCTYPE: {:?}", dt));
        }
        let Doctype {
            name,
            public_id,
            system_id,
            force_quirks: _,
        } = dt;
        if !self.opts.drop_doctype {
            self.site.insert_doctype(
                name.unwrap_or_default(),
                public_id.unwrap_or_default(),
                system_id.unwrap_or_default(),
            );
        }
        self.set_quirks_mode(quirk);

        self.mode.set(InsertionMode::BeforeHtml);
    }
}

impl<Sink: TreeSink> TokenSink for TreeBuilder<Sink> {
    type Handle = Sink::Handle;

    fn process_token(&self, token: tokenizer::Token, line_number: u64) -> TokenSinkResult<Sink::Handle> {
        if self.site.is_detached() {
            return TokenSinkResult::Continue;
        }
        if line_number != self.current_line.get() {
            self.current_line.set(line_number);
            self.site.sink.set_current_line(line_number);
        }
        let ignore_lf = self.ignore_lf.take();

        // Handle `ParseError` and `DoctypeToken`; convert everything else to the local `Token` type.
        let token = match token {
            tokenizer::ParseError(e) => {
                self.site.sink.parse_error(e);
                return TokenSinkResult::Continue;
            },

            tokenizer::DoctypeToken(dt) => {
                self.process_doctype(dt);
                self.site.execute_queued_tasks();
                return TokenSinkResult::Continue;
            },

            tokenizer::TagToken(x) => Token::Tag(x),
            tokenizer::CommentToken(x) => Token::Comment(x),
            tokenizer::NullCharacterToken => Token::NullCharacter,
            tokenizer::EOFToken => Token::Eof,

            tokenizer::CharacterTokens(mut x) => {
                if ignore_lf && x.starts_with('\n') {
                    x.pop_front(1);
                }
                if x.is_empty() {
                    return TokenSinkResult::Continue;
                }
                Token::Characters(SplitStatus::NotSplit, x)
            },
        };

        let result = self.process_to_completion(token);
        self.site.execute_queued_tasks();
        result
    }

    fn end(&self) {
        if self.site.is_detached() {
            return;
        }
        self.site.pop_all();
        self.site.execute_queued_tasks();
    }

    fn should_allow_cdata(&self) -> bool {
        self.with_adjusted_current_node(|node| node.name.ns != Namespace::Html)
            .unwrap_or(false)
    }

    fn force_null_character_replacement(&self) -> bool {
        self.mode.get() == InsertionMode::Text
    }
}

#[doc(hidden)]
impl<Sink: TreeSink> TreeBuilder<Sink> {
    fn unexpected<T: fmt::Debug>(&self, thing: &T) -> ProcessResult<Sink::Handle> {
        self.site.sink.parse_error(format_if!(
            self.opts.exact_errors,
            "Unexpected token",
            "Unexpected token {} in insertion mode {:?}",
            to_escaped_string(thing),
            self.mode.get()
        ));
        ProcessResult::Done
    }

    fn parse_error(&self, msg: &'static str) {
        self.site.sink.parse_error(Borrowed(msg));
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
        self.site.sink.set_quirks_mode(mode);
    }

    fn stop_parsing(&self) -> ProcessResult<Sink::Handle> {
        ProcessResult::Done
    }

    //§ parsing-elements-that-contain-only-text
    // Switch to `Text` insertion mode, save the old mode, and
    // switch the tokenizer to a raw-data state.
    // The latter only takes effect after the current / next
    // `process_token` of a start tag returns!
    fn to_raw_text_mode(&self, k: RawKind) -> ProcessResult<Sink::Handle> {
        self.orig_mode.set(Some(self.mode.get()));
        self.mode.set(InsertionMode::Text);
        ProcessResult::ToRawData(k)
    }

    // The generic raw text / RCDATA parsing algorithm.
    fn parse_raw_data(&self, tag: Tag, k: RawKind) -> ProcessResult<Sink::Handle> {
        self.insert_element_for(tag);
        self.to_raw_text_mode(k)
    }
    //§ END

    /// Run `f` on the adjusted current node: the context element while
    /// only the fragment root is open, otherwise the current node.
    fn with_adjusted_current_node<R>(&self, f: impl FnOnce(&StackItem<Sink::Handle>) -> R) -> Option<R> {
        let open_elems = self.site.open_elems.borrow();
        match (self.context_elem.as_ref(), open_elems.len()) {
            (Some(ctx), 1) => Some(f(ctx)),
            _ => open_elems.top().map(f),
        }
    }

    fn stack_item(&self, index: usize) -> Option<StackItem<Sink::Handle>> {
        self.site.open_elems.borrow().get(index).cloned()
    }

    fn current_node_named(&self, name: &str) -> bool {
        self.site.current_is(name)
    }

    fn current_node_in(&self, set: fn(&QualName) -> bool) -> bool {
        self.site.current_in(set)
    }

    fn in_scope_named(&self, scope: fn(&QualName) -> bool, name: &str) -> bool {
        self.site
            .open_elems
            .borrow()
            .in_scope_with(scope, |item| item.is_html(name))
    }

    fn in_html_elem_named(&self, name: &str) -> bool {
        self.site.open_elems.borrow().contains_named(name)
    }

    /// The first element on the stack, which will be the <html> element.
    fn html_elem(&self) -> Option<Sink::Handle> {
        self.site.open_elems.borrow().get(0).map(|item| item.node.clone())
    }

    /// The second element on the stack, if it's a HTML body element.
    fn body_elem(&self) -> Option<Sink::Handle> {
        self.site
            .open_elems
            .borrow()
            .get(1)
            .filter(|item| item.is_html("body"))
            .map(|item| item.node.clone())
    }

    /// Signal an error depending on the state of the stack of open elements at
    /// the end of the body.
    fn check_body_end(&self) {
        declare_tag_set!(body_end_ok =
            "dd" "dt" "li" "optgroup" "option" "p" "rb" "rp" "rt" "rtc" "tbody" "td"
            "tfoot" "th" "thead" "tr" "body" "html");

        let open_elems = self.site.open_elems.borrow();
        if let Some(item) = open_elems.iter().find(|item| !item.is_in(body_end_ok)) {
            self.site.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "Unexpected open tag at end of body",
                "Unexpected open tag {:?} at end of body",
                item.name
            ));
        }
    }

    fn pop(&self) -> Option<StackItem<Sink::Handle>> {
        self.site.pop()
    }

    // Pop elements until the current element is in the set.
    fn pop_until_current(&self, set: fn(&QualName) -> bool) {
        while !self.current_node_in(set) {
            if self.pop().is_none() {
                break;
            }
        }
    }

    fn pop_until_named(&self, name: &str) -> usize {
        self.site.pop_until_popped(name)
    }

    /// Pop elements until one with the specified name has been popped.
    /// Signal an error if it was not the first one.
    fn expect_to_close(&self, name: &str) {
        if self.pop_until_named(name) != 1 {
            self.site.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "Unexpected open element",
                "Unexpected open element while closing {:?}",
                name
            ));
        }
    }

    fn close_p_element(&self) {
        self.site.generate_implied_end_tags_except("p");
        self.expect_to_close("p");
    }

    fn close_p_element_in_button_scope(&self) {
        if self.in_scope_named(button_scope, "p") {
            self.close_p_element();
        }
    }

    // Check <input> tags for type=hidden
    fn is_type_hidden(&self, tag: &Tag) -> bool {
        tag.get_attribute("type")
            .map_or(false, |value| value.eq_ignore_ascii_case("hidden"))
    }

    fn foster_parent_in_body(&self, token: Token) -> ProcessResult<Sink::Handle> {
        self.site
            .with_foster_parenting(|| self.step(InsertionMode::InBody, token))
    }

    fn process_chars_in_table(&self, token: Token) -> ProcessResult<Sink::Handle> {
        if self.current_node_in(table_text_context) {
            assert!(self.pending_table_text.borrow().is_empty());
            self.orig_mode.set(Some(self.mode.get()));
            ProcessResult::Reprocess(InsertionMode::InTableText, token)
        } else {
            self.site.sink.parse_error(format_if!(
                self.opts.exact_errors,
                "Unexpected characters in table",
                "Unexpected characters {} in table",
                to_escaped_string(&token)
            ));
            self.foster_parent_in_body(token)
        }
    }

    // https://html.spec.whatwg.org/multipage/#reset-the-insertion-mode-appropriately
    fn reset_insertion_mode(&self) -> InsertionMode {
        let open_elems = self.site.open_elems.borrow();
        for (i, mut node) in open_elems.iter().enumerate().rev() {
            let last = i == 0usize;
            if let (true, Some(ctx)) = (last, self.context_elem.as_ref()) {
                node = ctx;
            }
            if node.name.ns != Namespace::Html {
                continue;
            }
            match &*node.name.local {
                "select" => {
                    for ancestor in open_elems.iter().take(i).rev() {
                        if ancestor.is_html("template") {
                            return InsertionMode::InSelect;
                        } else if ancestor.is_html("table") {
                            return InsertionMode::InSelectInTable;
                        }
                    }
                    return InsertionMode::InSelect;
                },
                "td" | "th" => {
                    if !last {
                        return InsertionMode::InCell;
                    }
                },
                "tr" => return InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => return InsertionMode::InTableBody,
                "caption" => return InsertionMode::InCaption,
                "colgroup" => return InsertionMode::InColumnGroup,
                "table" => return InsertionMode::InTable,
                "template" => {
                    return self
                        .template_modes
                        .borrow()
                        .last()
                        .copied()
                        .unwrap_or(InsertionMode::InTemplate);
                },
                "head" => {
                    if !last {
                        return InsertionMode::InHead;
                    }
                },
                "body" => return InsertionMode::InBody,
                "frameset" => return InsertionMode::InFrameset,
                "html" => {
                    return match *self.head_elem.borrow() {
                        None => InsertionMode::BeforeHead,
                        Some(_) => InsertionMode::AfterHead,
                    };
                },

                _ => (),
            }
        }
        InsertionMode::InBody
    }

    fn close_the_cell(&self) {
        self.site.generate_implied_end_tags();
        if self.site.pop_until_one_of(td_th) != 1 {
            self.parse_error("expected to close <td> or <th> with cell");
        }
        self.clear_active_formatting_to_marker();
    }

    fn append_text(&self, split: SplitStatus, text: StrTendril) -> ProcessResult<Sink::Handle> {
        self.site.insert_text(text, split);
        ProcessResult::Done
    }

    fn append_comment(&self, text: StrTendril) -> ProcessResult<Sink::Handle> {
        self.site.insert_comment(text);
        ProcessResult::Done
    }

    fn append_comment_to_doc(&self, text: StrTendril) -> ProcessResult<Sink::Handle> {
        self.site.insert_comment_on_document(text);
        ProcessResult::Done
    }

    fn append_comment_to_html(&self, text: StrTendril) -> ProcessResult<Sink::Handle> {
        self.site.insert_comment_on_html_element(text);
        ProcessResult::Done
    }

    //§ creating-and-inserting-nodes
    fn create_root(&self, attrs: Vec<Attribute>) {
        self.site.insert_html_html_element(Tag {
            kind: StartTag,
            name: LocalName::from("html"),
            self_closing: false,
            attrs,
        });
    }

    /// The form a new element for `tag` should be associated with, if any.
    fn form_owner_for(&self, tag: &Tag) -> Option<Sink::Handle> {
        let name = QualName::html(&tag.name);
        if !form_associatable(&name) || self.in_html_elem_named("template") {
            return None;
        }
        if listed(&name) && tag.get_attribute("form").is_some() {
            return None;
        }
        self.form_elem.borrow().clone()
    }

    fn associate_with_form(&self, elem: &Sink::Handle, form: Option<Sink::Handle>) {
        if let Some(form) = form {
            self.site.sink.associate_with_form(elem, &form);
        }
    }

    fn insert_element_for(&self, tag: Tag) -> Sink::Handle {
        let form = self.form_owner_for(&tag);
        let elem = self.site.insert_html_element(tag);
        self.associate_with_form(&elem, form);
        elem
    }

    fn insert_and_pop_element_for(&self, tag: Tag) -> Sink::Handle {
        let form = self.form_owner_for(&tag);
        let elem = self.site.insert_self_closing_html_element(tag);
        self.associate_with_form(&elem, form);
        elem
    }

    fn insert_phantom(&self, name: &str) -> Sink::Handle {
        self.site.insert_html_element(Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: vec![],
        })
    }

    fn create_formatting_element_for(&self, tag: Tag) -> Sink::Handle {
        self.site.insert_formatting_element(tag)
    }

    fn clear_active_formatting_to_marker(&self) {
        self.site.active_formatting.borrow_mut().clear_to_last_marker();
    }

    fn insert_marker(&self) {
        self.site.active_formatting.borrow_mut().append_marker();
    }
    //§ END

    /// Insert a node the adoption agency has just created, or move one
    /// that is already in the tree.
    fn relocate(&self, point: InsertionPoint<Sink::Handle>, node: Sink::Handle, fresh: bool) {
        if fresh {
            self.site.attach_later(point, node, true, false);
        } else {
            self.site.move_later(point, node);
        }
    }

    /// <https://html.spec.whatwg.org/#adoption-agency-algorithm>
    fn adoption_agency(&self, subject: LocalName) {
        // 1.
        let current_is_unlisted = self.site.current().map_or(false, |current| {
            current.is_html(&subject)
                && self
                    .site
                    .active_formatting
                    .borrow()
                    .find(&current.node)
                    .is_none()
        });
        if current_is_unlisted {
            self.pop();
            return;
        }

        // 2. 3. 4.
        for _ in 0..8 {
            // 5.
            let fmt_entry = self
                .site
                .active_formatting
                .borrow()
                .closest_element_in_scope_with_name(&subject)
                .map(|(i, item)| (i, item.clone()));

            let Some((fmt_elem_index, fmt_item)) = fmt_entry else {
                return self.process_end_tag_in_body(Tag {
                    kind: EndTag,
                    name: subject,
                    self_closing: false,
                    attrs: vec![],
                });
            };
            let fmt_elem = fmt_item.node.clone();

            // 6.
            let fmt_elem_stack_index = self.site.open_elems.borrow().position(&fmt_elem);
            let Some(fmt_elem_stack_index) = fmt_elem_stack_index else {
                self.parse_error("Formatting element not open");
                self.site
                    .active_formatting
                    .borrow_mut()
                    .remove_at(fmt_elem_index);
                return;
            };

            // 7.
            if !self.site.open_elems.borrow().element_in_scope(&fmt_elem) {
                self.parse_error("Formatting element not in scope");
                return;
            }

            // 8.
            if self.site.current_node().as_ref() != Some(&fmt_elem) {
                self.parse_error("Formatting element not current node");
            }

            // 9.
            let furthest_block = self
                .site
                .open_elems
                .borrow()
                .furthest_block_for_formatting_element(fmt_elem_stack_index);

            let Some(furthest_block_index) = furthest_block else {
                // 10.
                self.site.truncate(fmt_elem_stack_index);
                self.site
                    .active_formatting
                    .borrow_mut()
                    .remove_at(fmt_elem_index);
                return;
            };
            let Some(furthest_block) = self.stack_item(furthest_block_index) else {
                return;
            };

            // 11.
            let Some(common_ancestor) = fmt_elem_stack_index
                .checked_sub(1)
                .and_then(|i| self.stack_item(i))
            else {
                warn!("formatting element at the bottom of the stack");
                return;
            };

            // 12.
            let mut bookmark = self.site.active_formatting.borrow().bookmark_for(&fmt_elem);

            // 13.
            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block.node.clone();
            let mut last_node_is_fresh = false;

            // 13.1.
            let mut inner_counter = 0;
            loop {
                // 13.2.
                inner_counter += 1;

                // 13.3.
                node_index -= 1;
                let Some(node) = self.stack_item(node_index) else {
                    break;
                };

                // 13.4.
                if node.node == fmt_elem {
                    break;
                }

                // 13.5.
                if inner_counter > 3 {
                    self.site.active_formatting.borrow_mut().remove(&node.node);
                    self.site.remove_from_stack(&node.node);
                    continue;
                }

                let node_formatting_index = self.site.active_formatting.borrow().find(&node.node);
                let Some(node_formatting_index) = node_formatting_index else {
                    // 13.6.
                    self.site.remove_from_stack(&node.node);
                    continue;
                };

                // 13.7.
                let new_item = self.site.clone_element(&node);
                self.site
                    .open_elems
                    .borrow_mut()
                    .replace(node_index, new_item.clone());
                self.site
                    .active_formatting
                    .borrow_mut()
                    .replace(node_formatting_index, new_item.clone());

                // 13.8.
                if last_node == furthest_block.node {
                    bookmark.move_to_after(new_item.node.clone());
                }

                // 13.9.
                self.relocate(
                    InsertionPoint::LastChild(new_item.node.clone()),
                    last_node,
                    last_node_is_fresh,
                );

                // 13.10.
                last_node = new_item.node;
                last_node_is_fresh = true;

                // 13.11.
            }

            // 14.
            let point = self.site.appropriate_place(Some(&common_ancestor));
            self.relocate(point, last_node, last_node_is_fresh);

            // 15.
            let new_item = self.site.clone_element(&fmt_item);

            // 16.
            self.site
                .reparent_children_later(furthest_block.node.clone(), new_item.node.clone());

            // 17.
            self.site.attach_later(
                InsertionPoint::LastChild(furthest_block.node.clone()),
                new_item.node.clone(),
                true,
                false,
            );

            // 18.
            self.site
                .active_formatting
                .borrow_mut()
                .swap_to(&fmt_elem, new_item.clone(), &bookmark);

            // 19.
            self.site.remove_from_stack(&fmt_elem);
            let position = self.site.open_elems.borrow().position(&furthest_block.node);
            match position {
                Some(index) => self.site.open_elems.borrow_mut().insert_at(index + 1, new_item),
                None => warn!("furthest block missing from the stack of open elements"),
            }

            // 20.
        }
    }

    fn process_end_tag_in_body(&self, tag: Tag) {
        // Look back for a matching open element.
        let mut match_idx = None;
        for (i, item) in self.site.open_elems.borrow().iter().enumerate().rev() {
            if item.is_html(&tag.name) {
                match_idx = Some(i);
                break;
            }

            if item.is_in(special_tag) {
                self.parse_error("Found special tag while closing generic tag");
                return;
            }
        }

        let Some(match_idx) = match_idx else {
            // The root <html> element is special, so this only happens with
            // an empty stack.
            self.unexpected(&tag);
            return;
        };

        self.site.generate_implied_end_tags_except(&tag.name);

        if match_idx != self.site.open_elems.borrow().len() - 1 {
            // mis-nested tags
            self.unexpected(&tag);
        }
        self.site.truncate(match_idx);
    }

    fn handle_misnested_a_tags(&self, tag: &Tag) {
        let node = self
            .site
            .active_formatting
            .borrow()
            .closest_element_in_scope_with_name("a")
            .map(|(_, item)| item.node.clone());
        let Some(node) = node else {
            return;
        };

        self.unexpected(tag);
        self.adoption_agency(LocalName::from("a"));
        self.site.active_formatting.borrow_mut().remove(&node);
        self.site.remove_from_stack(&node);
    }

    //§ tree-construction
    fn is_foreign(&self, token: &Token) -> bool {
        if let Token::Eof = *token {
            return false;
        }

        self.with_adjusted_current_node(|node| {
            let name = &node.name;
            if name.ns == Namespace::Html {
                return false;
            }

            if mathml_text_integration_point(name) {
                match *token {
                    Token::Characters(..) | Token::NullCharacter => return false,
                    Token::Tag(Tag {
                        kind: StartTag,
                        ref name,
                        ..
                    }) if !matches!(&**name, "mglyph" | "malignmark") => return false,
                    _ => (),
                }
            }

            if svg_html_integration_point(name) {
                match *token {
                    Token::Characters(..) | Token::NullCharacter => return false,
                    Token::Tag(Tag { kind: StartTag, .. }) => return false,
                    _ => (),
                }
            }

            if name.ns == Namespace::MathMl && &*name.local == "annotation-xml" {
                match *token {
                    Token::Tag(Tag {
                        kind: StartTag,
                        ref name,
                        ..
                    }) if &**name == "svg" => return false,
                    Token::Characters(..)
                    | Token::NullCharacter
                    | Token::Tag(Tag { kind: StartTag, .. }) => {
                        return !node.is_annotation_xml_integration_point;
                    },
                    _ => {},
                };
            }

            true
        })
        .unwrap_or(false)
    }
    //§ END

    fn insert_foreign(&self, tag: Tag, ns: Namespace) -> ProcessResult<Sink::Handle> {
        if tag.self_closing {
            self.site.insert_foreign_element(tag, ns, true);
            ProcessResult::DoneAckSelfClosing
        } else {
            self.site.insert_foreign_element(tag, ns, false);
            ProcessResult::Done
        }
    }

    fn enter_foreign(&self, mut tag: Tag, ns: Namespace) -> ProcessResult<Sink::Handle> {
        self.site.reconstruct_active_formatting_elements();
        foreign::adjust_for_namespace(&mut tag, ns);
        self.insert_foreign(tag, ns)
    }

    fn foreign_start_tag(&self, mut tag: Tag) -> ProcessResult<Sink::Handle> {
        let current_ns = self
            .with_adjusted_current_node(|node| node.name.ns)
            .unwrap_or(Namespace::Html);
        foreign::adjust_for_namespace(&mut tag, current_ns);
        self.insert_foreign(tag, current_ns)
    }

    /// Is the current node HTML, or a point where HTML content may resume?
    fn current_node_accepts_html(&self) -> bool {
        self.site.current().map_or(true, |current| {
            current.name.ns == Namespace::Html
                || mathml_text_integration_point(&current.name)
                || svg_html_integration_point(&current.name)
                || current.is_annotation_xml_integration_point
        })
    }

    fn unexpected_start_tag_in_foreign_content(&self, tag: Tag) -> ProcessResult<Sink::Handle> {
        self.unexpected(&tag);
        while !self.current_node_accepts_html() {
            self.pop();
        }
        self.step(self.mode.get(), Token::Tag(tag))
    }

    /// Expand the legacy `<isindex>` element into the form it stands for.
    fn expand_isindex(&self, tag: Tag) -> ProcessResult<Sink::Handle> {
        fn start(name: &str, attrs: Vec<Attribute>) -> Token {
            Token::Tag(Tag {
                kind: StartTag,
                name: LocalName::from(name),
                self_closing: false,
                attrs,
            })
        }
        fn end(name: &str) -> Token {
            Token::Tag(Tag {
                kind: EndTag,
                name: LocalName::from(name),
                self_closing: false,
                attrs: vec![],
            })
        }

        self.unexpected(&tag);
        if self.form_elem.borrow().is_some() && !self.in_html_elem_named("template") {
            return ProcessResult::DoneAckSelfClosing;
        }

        let mut form_attrs = vec![];
        let mut input_attrs = vec![];
        let mut prompt = None;
        for attr in tag.attrs {
            if attr.name.ns != Namespace::None {
                input_attrs.push(attr);
                continue;
            }
            match &*attr.name.local {
                "action" => form_attrs.push(attr),
                "prompt" => prompt = Some(attr.value),
                "name" => (),
                _ => input_attrs.push(attr),
            }
        }
        input_attrs.push(Attribute {
            name: QualName::attr("name"),
            value: StrTendril::from_slice("isindex"),
        });
        let prompt = prompt
            .unwrap_or_else(|| StrTendril::from_slice("This is a searchable index. Enter search keywords: "));

        ProcessResult::Synthesize(vec![
            start("form", form_attrs),
            start("hr", vec![]),
            start("label", vec![]),
            Token::Characters(SplitStatus::NotSplit, prompt),
            start("input", input_attrs),
            end("label"),
            start("hr", vec![]),
            end("form"),
        ])
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;
    use crate::dom::ArenaDom;
    use crate::tokenizer::{CharacterTokens, EOFToken, TagToken};

    fn start(name: &str) -> tokenizer::Token {
        TagToken(Tag {
            kind: StartTag,
            name: LocalName::from(name),
            self_closing: false,
            attrs: vec![],
        })
    }

    fn feed(tb: &TreeBuilder<ArenaDom>, tokens: Vec<tokenizer::Token>) {
        for token in tokens {
            let _ = tb.process_token(token, 1);
        }
    }

    #[test]
    fn implied_document_skeleton() {
        let tb = TreeBuilder::new(ArenaDom::default(), TreeBuilderOpts::default());
        feed(&tb, vec![CharacterTokens(StrTendril::from_slice("hi"))]);
        assert_eq!(tb.insertion_mode(), InsertionMode::InBody);
        assert_eq!(tb.quirks_mode.get(), Quirks);
        feed(&tb, vec![EOFToken]);
        tb.end();
        assert_eq!(tb.sink().dump(), "| <html>\n|   <head>\n|   <body>\n|     \"hi\"\n");
    }

    #[test]
    fn script_end_tag_pauses() {
        let tb = TreeBuilder::new(ArenaDom::default(), TreeBuilderOpts::default());
        feed(&tb, vec![start("script")]);
        assert_eq!(tb.insertion_mode(), InsertionMode::Text);
        let result = tb.process_token(
            TagToken(Tag {
                kind: EndTag,
                name: LocalName::from("script"),
                self_closing: false,
                attrs: vec![],
            }),
            3,
        );
        assert!(matches!(result, TokenSinkResult::Script(_)));
        let (_, line) = tb.take_script_to_process().unwrap();
        assert_eq!(line, 1);
        assert!(tb.take_script_to_process().is_none());
        assert_eq!(tb.insertion_mode(), InsertionMode::InHead);
    }

    #[test]
    fn fragment_context_picks_mode_and_state() {
        let tb = TreeBuilder::new_for_fragment(
            ArenaDom::default(),
            QualName::html("textarea"),
            vec![],
            TreeBuilderOpts::default(),
        );
        assert_eq!(tb.insertion_mode(), InsertionMode::InBody);
        assert_eq!(tb.tokenizer_state_for_context_elem(), tok_state::RawData(tok_state::Rcdata));

        let tb = TreeBuilder::new_for_fragment(
            ArenaDom::default(),
            QualName::html("tr"),
            vec![],
            TreeBuilderOpts::default(),
        );
        assert_eq!(tb.insertion_mode(), InsertionMode::InRow);
    }

    #[test]
    fn detached_builder_ignores_tokens() {
        let tb = TreeBuilder::new(ArenaDom::default(), TreeBuilderOpts::default());
        tb.detach();
        feed(&tb, vec![start("p"), CharacterTokens(StrTendril::from_slice("x")), EOFToken]);
        tb.end();
        assert_eq!(tb.sink().dump(), "");
        assert_eq!(tb.insertion_mode(), InsertionMode::Initial);
    }

    #[test]
    fn cdata_only_in_foreign_content() {
        let tb = TreeBuilder::new(ArenaDom::default(), TreeBuilderOpts::default());
        feed(&tb, vec![start("body")]);
        assert!(!tb.should_allow_cdata());
        feed(&tb, vec![start("svg")]);
        assert!(tb.should_allow_cdata());
    }
}
