// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// The tree builder rules, one arm per insertion mode, each matching on
// `(tag.kind, name)` for tags.

use crate::interface::{Namespace, QualName, Quirks};
use crate::tokenizer::states::{Rawtext, Rcdata, ScriptData};
use crate::tokenizer::{EndTag, StartTag, Tag};
use crate::tree_builder::tag_sets::*;
use crate::tree_builder::types::*;
use crate::tree_builder::{TreeBuilder, TreeSink};
use crate::util::str::is_all_whitespace;
use crate::LocalName;

use log::warn;
use tendril::StrTendril;

fn any_not_whitespace(x: &StrTendril) -> bool {
    !is_all_whitespace(x)
}

#[doc(hidden)]
impl<Sink: TreeSink> TreeBuilder<Sink> {
    /// Remember the head element that was just pushed.
    fn remember_head(&self) {
        let head = self.site.current().map(|item| item.clone());
        *self.head_elem.borrow_mut() = head;
    }

    fn pop_expecting(&self, name: &str) {
        match self.pop() {
            Some(item) if item.is_html(name) => (),
            Some(item) => warn!("expected to pop <{}>, popped {:?}", name, item.name),
            None => warn!("expected to pop <{}> from an empty stack", name),
        }
    }

    /// Process an HTML content token
    ///
    /// <https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhtml>
    pub(crate) fn step(&self, mode: InsertionMode, token: Token) -> ProcessResult<Sink::Handle> {
        self.debug_step(mode, &token);

        match mode {
            //§ the-initial-insertion-mode
            InsertionMode::Initial => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, _) => ProcessResult::Done,
                Token::Comment(text) => self.append_comment_to_doc(text),
                token => {
                    if !self.opts.iframe_srcdoc {
                        self.unexpected(&token);
                        self.set_quirks_mode(Quirks);
                    }
                    ProcessResult::Reprocess(InsertionMode::BeforeHtml, token)
                },
            },

            //§ the-before-html-insertion-mode
            InsertionMode::BeforeHtml => {
                let anything_else = |token: Token| {
                    self.create_root(vec![]);
                    ProcessResult::Reprocess(InsertionMode::BeforeHead, token)
                };

                match token {
                    Token::Comment(text) => self.append_comment_to_doc(text),
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, _) => ProcessResult::Done,

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => {
                            self.create_root(tag.attrs);
                            self.mode.set(InsertionMode::BeforeHead);
                            ProcessResult::Done
                        },
                        (EndTag, "head" | "body" | "html" | "br") => anything_else(Token::Tag(tag)),
                        (EndTag, _) => self.unexpected(&tag),
                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ the-before-head-insertion-mode
            InsertionMode::BeforeHead => {
                let anything_else = |token: Token| {
                    self.insert_phantom("head");
                    self.remember_head();
                    ProcessResult::Reprocess(InsertionMode::InHead, token)
                };

                match token {
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, _) => ProcessResult::Done,
                    Token::Comment(text) => self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),
                        (StartTag, "head") => {
                            self.site.insert_html_head_element(tag);
                            self.remember_head();
                            self.mode.set(InsertionMode::InHead);
                            ProcessResult::Done
                        },
                        (EndTag, "head" | "body" | "html" | "br") => anything_else(Token::Tag(tag)),
                        (EndTag, _) => self.unexpected(&tag),
                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ parsing-main-inhead
            InsertionMode::InHead => {
                let anything_else = |token: Token| {
                    self.pop();
                    ProcessResult::Reprocess(InsertionMode::AfterHead, token)
                };

                match token {
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        self.append_text(SplitStatus::Whitespace, text)
                    },
                    Token::Comment(text) => self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                        (StartTag, "base" | "basefont" | "bgsound" | "link" | "meta") => {
                            self.insert_and_pop_element_for(tag);
                            ProcessResult::DoneAckSelfClosing
                        },

                        (StartTag, "title") => self.parse_raw_data(tag, Rcdata),

                        (StartTag, "noscript") if !self.opts.scripting_enabled => {
                            self.insert_element_for(tag);
                            self.mode.set(InsertionMode::InHeadNoscript);
                            ProcessResult::Done
                        },

                        (StartTag, "noframes" | "style" | "noscript") => self.parse_raw_data(tag, Rawtext),

                        (StartTag, "script") => {
                            self.script_start_line.set(self.current_line.get());
                            self.site.insert_script_element(tag, self.is_fragment());
                            self.to_raw_text_mode(ScriptData)
                        },

                        (EndTag, "head") => {
                            self.pop();
                            self.mode.set(InsertionMode::AfterHead);
                            ProcessResult::Done
                        },

                        (EndTag, "body" | "html" | "br") => anything_else(Token::Tag(tag)),

                        (StartTag, "template") => {
                            self.insert_element_for(tag);
                            self.insert_marker();
                            self.frameset_ok.set(false);
                            self.mode.set(InsertionMode::InTemplate);
                            self.template_modes.borrow_mut().push(InsertionMode::InTemplate);
                            ProcessResult::Done
                        },

                        (EndTag, "template") => {
                            if !self.in_html_elem_named("template") {
                                self.unexpected(&tag);
                            } else {
                                self.site.generate_all_implied_end_tags_thoroughly();
                                self.expect_to_close("template");
                                self.clear_active_formatting_to_marker();
                                self.template_modes.borrow_mut().pop();
                                self.mode.set(self.reset_insertion_mode());
                            }
                            ProcessResult::Done
                        },

                        (StartTag, "head") | (EndTag, _) => self.unexpected(&tag),

                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ parsing-main-inheadnoscript
            InsertionMode::InHeadNoscript => {
                let anything_else = |token: Token| {
                    self.unexpected(&token);
                    self.pop();
                    ProcessResult::Reprocess(InsertionMode::InHead, token)
                };

                match token {
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, _) | Token::Comment(_) => {
                        self.step(InsertionMode::InHead, token)
                    },

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                        (EndTag, "noscript") => {
                            self.pop();
                            self.mode.set(InsertionMode::InHead);
                            ProcessResult::Done
                        },

                        (StartTag, "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style") => {
                            self.step(InsertionMode::InHead, Token::Tag(tag))
                        },

                        (EndTag, "br") => anything_else(Token::Tag(tag)),

                        (StartTag, "head" | "noscript") | (EndTag, _) => self.unexpected(&tag),

                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ the-after-head-insertion-mode
            InsertionMode::AfterHead => {
                let anything_else = |token: Token| {
                    self.insert_phantom("body");
                    ProcessResult::Reprocess(InsertionMode::InBody, token)
                };

                match token {
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        self.append_text(SplitStatus::Whitespace, text)
                    },
                    Token::Comment(text) => self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                        (StartTag, "body") => {
                            self.site.insert_html_body_element(tag);
                            self.frameset_ok.set(false);
                            self.mode.set(InsertionMode::InBody);
                            ProcessResult::Done
                        },

                        (StartTag, "frameset") => {
                            self.insert_element_for(tag);
                            self.mode.set(InsertionMode::InFrameset);
                            ProcessResult::Done
                        },

                        (
                            StartTag,
                            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                            | "style" | "template" | "title",
                        ) => {
                            self.unexpected(&tag);
                            let head = self.head_elem.borrow().clone();
                            let Some(head) = head else {
                                return self.step(InsertionMode::InHead, Token::Tag(tag));
                            };
                            let node = head.node.clone();
                            self.site.push(head);
                            let result = self.step(InsertionMode::InHead, Token::Tag(tag));
                            self.site.open_elems.borrow_mut().remove(&node);
                            result
                        },

                        (EndTag, "template") => self.step(InsertionMode::InHead, Token::Tag(tag)),

                        (EndTag, "body" | "html" | "br") => anything_else(Token::Tag(tag)),

                        (StartTag, "head") | (EndTag, _) => self.unexpected(&tag),

                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ parsing-main-inbody
            InsertionMode::InBody => match token {
                Token::NullCharacter => self.unexpected(&token),

                Token::Characters(split, text) => {
                    self.site.reconstruct_active_formatting_elements();
                    if split == SplitStatus::NotWhitespace
                        || (split == SplitStatus::NotSplit && any_not_whitespace(&text))
                    {
                        self.frameset_ok.set(false);
                    }
                    self.append_text(split, text)
                },

                Token::Comment(text) => self.append_comment(text),

                Token::Eof => {
                    if !self.template_modes.borrow().is_empty() {
                        self.step(InsertionMode::InTemplate, token)
                    } else {
                        self.check_body_end();
                        self.stop_parsing()
                    }
                },

                Token::Tag(tag) => self.step_in_body_tag(tag),
            },

            //§ parsing-main-incdata
            InsertionMode::Text => match token {
                Token::Characters(split, text) => self.append_text(split, text),

                Token::Eof => {
                    self.unexpected(&token);
                    if let Some(current) = self.site.current_node() {
                        if self.current_node_named("script") {
                            self.site.sink.mark_script_already_started(&current);
                        }
                    }
                    self.pop();
                    let mode = self.orig_mode.take().unwrap_or(InsertionMode::InBody);
                    ProcessResult::Reprocess(mode, token)
                },

                Token::Tag(tag) if tag.kind == EndTag => {
                    let node = self.pop();
                    self.mode
                        .set(self.orig_mode.take().unwrap_or(InsertionMode::InBody));
                    match node {
                        Some(item) if &*tag.name == "script" && item.is_html("script") => {
                            if self.is_fragment() {
                                return ProcessResult::Done;
                            }
                            *self.script_to_process.borrow_mut() =
                                Some((item.node.clone(), self.script_start_line.get()));
                            ProcessResult::Script(item.node)
                        },
                        _ => ProcessResult::Done,
                    }
                },

                // The tokenizer only emits text and end tags in raw data states.
                token => self.unexpected(&token),
            },

            //§ parsing-main-intable
            InsertionMode::InTable => match token {
                Token::NullCharacter | Token::Characters(..) => self.process_chars_in_table(token),

                Token::Comment(text) => self.append_comment(text),

                Token::Eof => self.step(InsertionMode::InBody, token),

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "caption") => {
                        self.pop_until_current(table_scope);
                        self.insert_marker();
                        self.insert_element_for(tag);
                        self.mode.set(InsertionMode::InCaption);
                        ProcessResult::Done
                    },

                    (StartTag, "colgroup") => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode.set(InsertionMode::InColumnGroup);
                        ProcessResult::Done
                    },

                    (StartTag, "col") => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom("colgroup");
                        ProcessResult::Reprocess(InsertionMode::InColumnGroup, Token::Tag(tag))
                    },

                    (StartTag, "tbody" | "tfoot" | "thead") => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode.set(InsertionMode::InTableBody);
                        ProcessResult::Done
                    },

                    (StartTag, "td" | "th" | "tr") => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom("tbody");
                        ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                    },

                    (StartTag, "table") => {
                        self.unexpected(&tag);
                        if self.in_scope_named(table_scope, "table") {
                            self.pop_until_named("table");
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    (EndTag, "table") => {
                        if self.in_scope_named(table_scope, "table") {
                            self.pop_until_named("table");
                            self.mode.set(self.reset_insertion_mode());
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        EndTag,
                        "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot"
                        | "th" | "thead" | "tr",
                    ) => self.unexpected(&tag),

                    (StartTag, "style" | "script" | "template") | (EndTag, "template") => {
                        self.step(InsertionMode::InHead, Token::Tag(tag))
                    },

                    (StartTag, "input") if self.is_type_hidden(&tag) => {
                        self.unexpected(&tag);
                        self.insert_and_pop_element_for(tag);
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, "form") => {
                        self.unexpected(&tag);
                        if !self.in_html_elem_named("template") && self.form_elem.borrow().is_none() {
                            let form = self.site.insert_html_form_element(tag, true);
                            *self.form_elem.borrow_mut() = Some(form);
                        }
                        ProcessResult::Done
                    },

                    _ => {
                        self.unexpected(&tag);
                        self.foster_parent_in_body(Token::Tag(tag))
                    },
                },
            },

            //§ parsing-main-intabletext
            InsertionMode::InTableText => match token {
                Token::NullCharacter => self.unexpected(&token),

                Token::Characters(split, text) => {
                    self.pending_table_text.borrow_mut().push((split, text));
                    ProcessResult::Done
                },

                token => {
                    let pending = self.pending_table_text.take();
                    let contains_nonspace = pending.iter().any(|(split, text)| match split {
                        SplitStatus::Whitespace => false,
                        SplitStatus::NotWhitespace => true,
                        SplitStatus::NotSplit => any_not_whitespace(text),
                    });

                    if contains_nonspace {
                        self.parse_error("Non-space table text");
                        for (split, text) in pending {
                            self.foster_parent_in_body(Token::Characters(split, text));
                        }
                    } else {
                        for (split, text) in pending {
                            self.append_text(split, text);
                        }
                    }

                    let mode = self.orig_mode.take().unwrap_or(InsertionMode::InTable);
                    ProcessResult::Reprocess(mode, token)
                },
            },

            //§ parsing-main-incaption
            InsertionMode::InCaption => match token {
                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr",
                    )
                    | (EndTag, "table" | "caption") => {
                        if !self.in_scope_named(table_scope, "caption") {
                            return self.unexpected(&tag);
                        }
                        self.site.generate_implied_end_tags();
                        self.expect_to_close("caption");
                        self.clear_active_formatting_to_marker();
                        if tag.kind == EndTag && &*tag.name == "caption" {
                            self.mode.set(InsertionMode::InTable);
                            ProcessResult::Done
                        } else {
                            ProcessResult::Reprocess(InsertionMode::InTable, Token::Tag(tag))
                        }
                    },

                    (
                        EndTag,
                        "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th" | "thead"
                        | "tr",
                    ) => self.unexpected(&tag),

                    _ => self.step(InsertionMode::InBody, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InBody, token),
            },

            //§ parsing-main-incolgroup
            InsertionMode::InColumnGroup => {
                let anything_else = |token: Token| {
                    if self.current_node_named("colgroup") {
                        self.pop();
                        ProcessResult::Reprocess(InsertionMode::InTable, token)
                    } else {
                        self.unexpected(&token)
                    }
                };

                match token {
                    Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        self.append_text(SplitStatus::Whitespace, text)
                    },
                    Token::Comment(text) => self.append_comment(text),

                    Token::Eof => self.step(InsertionMode::InBody, token),

                    Token::Tag(tag) => match (tag.kind, &*tag.name) {
                        (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                        (StartTag, "col") => {
                            self.insert_and_pop_element_for(tag);
                            ProcessResult::DoneAckSelfClosing
                        },

                        (EndTag, "colgroup") => {
                            if self.current_node_named("colgroup") {
                                self.pop();
                                self.mode.set(InsertionMode::InTable);
                            } else {
                                self.unexpected(&tag);
                            }
                            ProcessResult::Done
                        },

                        (EndTag, "col") => self.unexpected(&tag),

                        (_, "template") => self.step(InsertionMode::InHead, Token::Tag(tag)),

                        _ => anything_else(Token::Tag(tag)),
                    },

                    token => anything_else(token),
                }
            },

            //§ parsing-main-intbody
            InsertionMode::InTableBody => match token {
                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "tr") => {
                        self.pop_until_current(table_body_context);
                        self.insert_element_for(tag);
                        self.mode.set(InsertionMode::InRow);
                        ProcessResult::Done
                    },

                    (StartTag, "th" | "td") => {
                        self.unexpected(&tag);
                        self.pop_until_current(table_body_context);
                        self.insert_phantom("tr");
                        ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                    },

                    (EndTag, "tbody" | "tfoot" | "thead") => {
                        if self.in_scope_named(table_scope, &tag.name) {
                            self.pop_until_current(table_body_context);
                            self.pop();
                            self.mode.set(InsertionMode::InTable);
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (StartTag, "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead")
                    | (EndTag, "table") => {
                        declare_tag_set!(table_section = "tbody" "thead" "tfoot");
                        let section_open = self
                            .site
                            .open_elems
                            .borrow()
                            .in_scope_with(table_scope, |item| item.is_in(table_section));
                        if section_open {
                            self.pop_until_current(table_body_context);
                            self.pop();
                            ProcessResult::Reprocess(InsertionMode::InTable, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (
                        EndTag,
                        "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr",
                    ) => self.unexpected(&tag),

                    _ => self.step(InsertionMode::InTable, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InTable, token),
            },

            //§ parsing-main-intr
            InsertionMode::InRow => match token {
                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "th" | "td") => {
                        self.pop_until_current(table_row_context);
                        self.insert_element_for(tag);
                        self.mode.set(InsertionMode::InCell);
                        self.insert_marker();
                        ProcessResult::Done
                    },

                    (EndTag, "tr") => {
                        if self.in_scope_named(table_scope, "tr") {
                            self.pop_until_current(table_row_context);
                            self.pop_expecting("tr");
                            self.mode.set(InsertionMode::InTableBody);
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr",
                    )
                    | (EndTag, "table") => {
                        if self.in_scope_named(table_scope, "tr") {
                            self.pop_until_current(table_row_context);
                            self.pop_expecting("tr");
                            ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (EndTag, "tbody" | "tfoot" | "thead") => {
                        if !self.in_scope_named(table_scope, &tag.name) {
                            return self.unexpected(&tag);
                        }
                        if self.in_scope_named(table_scope, "tr") {
                            self.pop_until_current(table_row_context);
                            self.pop_expecting("tr");
                            ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    (EndTag, "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th") => {
                        self.unexpected(&tag)
                    },

                    _ => self.step(InsertionMode::InTable, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InTable, token),
            },

            //§ parsing-main-intd
            InsertionMode::InCell => match token {
                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (EndTag, "td" | "th") => {
                        if self.in_scope_named(table_scope, &tag.name) {
                            self.site.generate_implied_end_tags();
                            self.expect_to_close(&tag.name);
                            self.clear_active_formatting_to_marker();
                            self.mode.set(InsertionMode::InRow);
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr",
                    ) => {
                        let cell_open = self
                            .site
                            .open_elems
                            .borrow()
                            .in_scope_with(table_scope, |item| item.is_in(td_th));
                        if cell_open {
                            self.close_the_cell();
                            ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (EndTag, "body" | "caption" | "col" | "colgroup" | "html") => self.unexpected(&tag),

                    (EndTag, "table" | "tbody" | "tfoot" | "thead" | "tr") => {
                        if self.in_scope_named(table_scope, &tag.name) {
                            self.close_the_cell();
                            ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    _ => self.step(InsertionMode::InBody, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InBody, token),
            },

            //§ parsing-main-inselect
            InsertionMode::InSelect => match token {
                Token::NullCharacter => self.unexpected(&token),
                Token::Characters(split, text) => self.append_text(split, text),
                Token::Comment(text) => self.append_comment(text),
                Token::Eof => self.step(InsertionMode::InBody, token),

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                    (StartTag, "option") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, "optgroup") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, "hr") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        }
                        self.insert_and_pop_element_for(tag);
                        ProcessResult::DoneAckSelfClosing
                    },

                    (EndTag, "optgroup") => {
                        let option_in_optgroup = {
                            let open_elems = self.site.open_elems.borrow();
                            let len = open_elems.len();
                            len >= 2
                                && open_elems.get(len - 1).map_or(false, |item| item.is_html("option"))
                                && open_elems.get(len - 2).map_or(false, |item| item.is_html("optgroup"))
                        };
                        if option_in_optgroup {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, "option") => {
                        if self.current_node_named("option") {
                            self.pop();
                        } else {
                            self.unexpected(&tag);
                        }
                        ProcessResult::Done
                    },

                    (_, "select") => {
                        let in_scope = self.in_scope_named(select_scope, "select");

                        if !in_scope || tag.kind == StartTag {
                            self.unexpected(&tag);
                        }

                        if in_scope {
                            self.pop_until_named("select");
                            self.mode.set(self.reset_insertion_mode());
                        }
                        ProcessResult::Done
                    },

                    (StartTag, "input" | "keygen" | "textarea") => {
                        self.unexpected(&tag);
                        if self.in_scope_named(select_scope, "select") {
                            self.pop_until_named("select");
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    (StartTag, "script" | "template") | (EndTag, "template") => {
                        self.step(InsertionMode::InHead, Token::Tag(tag))
                    },

                    _ => self.unexpected(&tag),
                },
            },

            //§ parsing-main-inselectintable
            InsertionMode::InSelectInTable => match token {
                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th") => {
                        self.unexpected(&tag);
                        self.pop_until_named("select");
                        ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                    },

                    (EndTag, "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th") => {
                        self.unexpected(&tag);
                        if self.in_scope_named(table_scope, &tag.name) {
                            self.pop_until_named("select");
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    _ => self.step(InsertionMode::InSelect, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InSelect, token),
            },

            //§ parsing-main-intemplate
            InsertionMode::InTemplate => match token {
                Token::Characters(..) | Token::Comment(_) => self.step(InsertionMode::InBody, token),

                Token::Eof => {
                    if !self.in_html_elem_named("template") {
                        return self.stop_parsing();
                    }
                    self.unexpected(&token);
                    self.pop_until_named("template");
                    self.clear_active_formatting_to_marker();
                    self.template_modes.borrow_mut().pop();
                    let mode = self.reset_insertion_mode();
                    self.mode.set(mode);
                    ProcessResult::Reprocess(mode, token)
                },

                Token::Tag(tag) => {
                    let template_mode = match (tag.kind, &*tag.name) {
                        (
                            StartTag,
                            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                            | "style" | "template" | "title",
                        )
                        | (EndTag, "template") => {
                            return self.step(InsertionMode::InHead, Token::Tag(tag));
                        },
                        (StartTag, "caption" | "colgroup" | "tbody" | "tfoot" | "thead") => InsertionMode::InTable,
                        (StartTag, "col") => InsertionMode::InColumnGroup,
                        (StartTag, "tr") => InsertionMode::InTableBody,
                        (StartTag, "td" | "th") => InsertionMode::InRow,
                        (StartTag, _) => InsertionMode::InBody,
                        (EndTag, _) => return self.unexpected(&tag),
                    };
                    {
                        let mut template_modes = self.template_modes.borrow_mut();
                        template_modes.pop();
                        template_modes.push(template_mode);
                    }
                    ProcessResult::Reprocess(template_mode, Token::Tag(tag))
                },

                token => self.unexpected(&token),
            },

            //§ parsing-main-afterbody
            InsertionMode::AfterBody => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, _) => self.step(InsertionMode::InBody, token),
                Token::Comment(text) => self.append_comment_to_html(text),
                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),
                    (EndTag, "html") => {
                        if self.is_fragment() {
                            self.unexpected(&tag);
                        } else {
                            self.mode.set(InsertionMode::AfterAfterBody);
                        }
                        ProcessResult::Done
                    },
                    _ => {
                        self.unexpected(&tag);
                        ProcessResult::Reprocess(InsertionMode::InBody, Token::Tag(tag))
                    },
                },

                token => {
                    self.unexpected(&token);
                    ProcessResult::Reprocess(InsertionMode::InBody, token)
                },
            },

            //§ parsing-main-inframeset
            InsertionMode::InFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, text) => {
                    self.append_text(SplitStatus::Whitespace, text)
                },
                Token::Comment(text) => self.append_comment(text),

                Token::Eof => {
                    if self.site.open_elems.borrow().len() != 1 {
                        self.unexpected(&token);
                    }
                    self.stop_parsing()
                },

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),

                    (StartTag, "frameset") => {
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (EndTag, "frameset") => {
                        if self.site.open_elems.borrow().len() == 1 {
                            self.unexpected(&tag);
                        } else {
                            self.pop();
                            if !self.is_fragment() && !self.current_node_named("frameset") {
                                self.mode.set(InsertionMode::AfterFrameset);
                            }
                        }
                        ProcessResult::Done
                    },

                    (StartTag, "frame") => {
                        self.insert_and_pop_element_for(tag);
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, "noframes") => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    _ => self.unexpected(&tag),
                },

                token => self.unexpected(&token),
            },

            //§ parsing-main-afterframeset
            InsertionMode::AfterFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, text) => {
                    self.append_text(SplitStatus::Whitespace, text)
                },
                Token::Comment(text) => self.append_comment(text),
                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),
                    (EndTag, "html") => {
                        self.mode.set(InsertionMode::AfterAfterFrameset);
                        ProcessResult::Done
                    },
                    (StartTag, "noframes") => self.step(InsertionMode::InHead, Token::Tag(tag)),
                    _ => self.unexpected(&tag),
                },

                token => self.unexpected(&token),
            },

            //§ the-after-after-body-insertion-mode
            InsertionMode::AfterAfterBody => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, _) => self.step(InsertionMode::InBody, token),
                Token::Comment(text) => self.append_comment_to_doc(text),
                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) if tag.kind == StartTag && &*tag.name == "html" => {
                    self.step(InsertionMode::InBody, Token::Tag(tag))
                },

                token => {
                    self.unexpected(&token);
                    ProcessResult::Reprocess(InsertionMode::InBody, token)
                },
            },

            //§ the-after-after-frameset-insertion-mode
            InsertionMode::AfterAfterFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => ProcessResult::SplitWhitespace(text),
                Token::Characters(SplitStatus::Whitespace, _) => self.step(InsertionMode::InBody, token),
                Token::Comment(text) => self.append_comment_to_doc(text),
                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) => match (tag.kind, &*tag.name) {
                    (StartTag, "html") => self.step(InsertionMode::InBody, Token::Tag(tag)),
                    (StartTag, "noframes") => self.step(InsertionMode::InHead, Token::Tag(tag)),
                    _ => self.unexpected(&tag),
                },

                token => self.unexpected(&token),
            },
            //§ END
        }
    }

    /// Tags in the "in body" insertion mode.
    fn step_in_body_tag(&self, tag: Tag) -> ProcessResult<Sink::Handle> {
        match (tag.kind, &*tag.name) {
            (StartTag, "html") => {
                self.unexpected(&tag);
                if !self.in_html_elem_named("template") {
                    if let Some(html) = self.html_elem() {
                        self.site.sink.add_attrs_if_missing(&html, tag.attrs);
                    }
                }
                ProcessResult::Done
            },

            (
                StartTag,
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style"
                | "template" | "title",
            )
            | (EndTag, "template") => self.step(InsertionMode::InHead, Token::Tag(tag)),

            (StartTag, "body") => {
                self.unexpected(&tag);
                let body = self.body_elem();
                match body {
                    Some(node)
                        if self.site.open_elems.borrow().len() != 1
                            && !self.in_html_elem_named("template") =>
                    {
                        self.frameset_ok.set(false);
                        self.site.sink.add_attrs_if_missing(&node, tag.attrs);
                    },
                    _ => (),
                }
                ProcessResult::Done
            },

            (StartTag, "frameset") => {
                self.unexpected(&tag);
                if !self.frameset_ok.get() {
                    return ProcessResult::Done;
                }
                let Some(body) = self.body_elem() else {
                    return ProcessResult::Done;
                };
                self.site.remove_from_parent_later(body);
                self.site.truncate(1);
                self.insert_element_for(tag);
                self.mode.set(InsertionMode::InFrameset);
                ProcessResult::Done
            },

            (EndTag, "body") => {
                if self.in_scope_named(default_scope, "body") {
                    self.check_body_end();
                    self.mode.set(InsertionMode::AfterBody);
                } else {
                    self.parse_error("</body> with no <body> in scope");
                }
                ProcessResult::Done
            },

            (EndTag, "html") => {
                if self.in_scope_named(default_scope, "body") {
                    self.check_body_end();
                    ProcessResult::Reprocess(InsertionMode::AfterBody, Token::Tag(tag))
                } else {
                    self.parse_error("</html> with no <body> in scope");
                    ProcessResult::Done
                }
            },

            (
                StartTag,
                "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog" | "dir"
                | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer" | "header" | "hgroup"
                | "main" | "menu" | "nav" | "ol" | "p" | "search" | "section" | "summary" | "ul",
            ) => {
                self.close_p_element_in_button_scope();
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                self.close_p_element_in_button_scope();
                if self.current_node_in(heading_tag) {
                    self.parse_error("nested heading tags");
                    self.pop();
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "pre" | "listing") => {
                self.close_p_element_in_button_scope();
                self.insert_element_for(tag);
                self.ignore_lf.set(true);
                self.frameset_ok.set(false);
                ProcessResult::Done
            },

            (StartTag, "form") => {
                let in_template = self.in_html_elem_named("template");
                if self.form_elem.borrow().is_some() && !in_template {
                    self.parse_error("nested forms");
                } else {
                    self.close_p_element_in_button_scope();
                    let form = self.site.insert_html_form_element(tag, false);
                    if !in_template {
                        *self.form_elem.borrow_mut() = Some(form);
                    }
                }
                ProcessResult::Done
            },

            (StartTag, "isindex") => self.expand_isindex(tag),

            (StartTag, "li" | "dd" | "dt") => {
                declare_tag_set!(close_list = "li");
                declare_tag_set!(close_defn = "dd" "dt");
                declare_tag_set!(extra_special = [special_tag] - "address" "div" "p");
                let can_close: fn(&QualName) -> bool = if &*tag.name == "li" {
                    close_list
                } else {
                    close_defn
                };

                self.frameset_ok.set(false);

                let mut to_close = None;
                for item in self.site.open_elems.borrow().iter().rev() {
                    if item.is_in(can_close) {
                        to_close = Some(item.name.local.clone());
                        break;
                    }
                    if item.is_in(extra_special) {
                        break;
                    }
                }

                if let Some(name) = to_close {
                    self.site.generate_implied_end_tags_except(&name);
                    self.expect_to_close(&name);
                }

                self.close_p_element_in_button_scope();
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "plaintext") => {
                self.close_p_element_in_button_scope();
                self.insert_element_for(tag);
                ProcessResult::ToPlaintext
            },

            (StartTag, "button") => {
                if self.in_scope_named(default_scope, "button") {
                    self.parse_error("nested buttons");
                    self.site.generate_implied_end_tags();
                    self.pop_until_named("button");
                }
                self.site.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                ProcessResult::Done
            },

            (
                EndTag,
                "address" | "article" | "aside" | "blockquote" | "button" | "center" | "details"
                | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer"
                | "header" | "hgroup" | "listing" | "main" | "menu" | "nav" | "ol" | "pre" | "search"
                | "section" | "summary" | "ul",
            ) => {
                if !self.in_scope_named(default_scope, &tag.name) {
                    self.unexpected(&tag);
                } else {
                    self.site.generate_implied_end_tags();
                    self.expect_to_close(&tag.name);
                }
                ProcessResult::Done
            },

            (EndTag, "form") => {
                if self.in_html_elem_named("template") {
                    if !self.in_scope_named(default_scope, "form") {
                        self.parse_error("Form element not in scope on </form>");
                        return ProcessResult::Done;
                    }
                    self.site.generate_implied_end_tags();
                    if !self.current_node_named("form") {
                        self.parse_error("Bad open element on </form>");
                    }
                    self.pop_until_named("form");
                    return ProcessResult::Done;
                }

                let Some(node) = self.form_elem.take() else {
                    self.parse_error("Null form element pointer on </form>");
                    return ProcessResult::Done;
                };
                if !self.site.open_elems.borrow().element_in_scope(&node) {
                    self.parse_error("Form element not in scope on </form>");
                    return ProcessResult::Done;
                }
                self.site.generate_implied_end_tags();
                let current = self.site.current_node();
                self.site.remove_from_stack(&node);
                if current.as_ref() != Some(&node) {
                    self.parse_error("Bad open element on </form>");
                }
                ProcessResult::Done
            },

            (EndTag, "p") => {
                if !self.in_scope_named(button_scope, "p") {
                    self.parse_error("No <p> tag to close");
                    self.insert_phantom("p");
                }
                self.close_p_element();
                ProcessResult::Done
            },

            (EndTag, "li" | "dd" | "dt") => {
                let scope = if &*tag.name == "li" {
                    list_item_scope
                } else {
                    default_scope
                };
                if self.in_scope_named(scope, &tag.name) {
                    self.site.generate_implied_end_tags_except(&tag.name);
                    self.expect_to_close(&tag.name);
                } else {
                    self.parse_error("No matching tag to close");
                }
                ProcessResult::Done
            },

            (EndTag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                if self.site.open_elems.borrow().has_in_scope_set(heading_tag) {
                    self.site.generate_implied_end_tags();
                    if !self.current_node_named(&tag.name) {
                        self.parse_error("Closing wrong heading tag");
                    }
                    self.site.pop_until_one_of(heading_tag);
                } else {
                    self.parse_error("No heading tag to close");
                }
                ProcessResult::Done
            },

            (StartTag, "a") => {
                self.handle_misnested_a_tags(&tag);
                self.site.reconstruct_active_formatting_elements();
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },

            (
                StartTag,
                "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike" | "strong" | "tt"
                | "u",
            ) => {
                self.site.reconstruct_active_formatting_elements();
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "nobr") => {
                self.site.reconstruct_active_formatting_elements();
                if self.in_scope_named(default_scope, "nobr") {
                    self.parse_error("Nested <nobr>");
                    self.adoption_agency(LocalName::from("nobr"));
                    self.site.reconstruct_active_formatting_elements();
                }
                self.create_formatting_element_for(tag);
                ProcessResult::Done
            },

            (
                EndTag,
                "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike"
                | "strong" | "tt" | "u",
            ) => {
                self.adoption_agency(tag.name);
                ProcessResult::Done
            },

            (StartTag, "applet" | "marquee" | "object") => {
                self.site.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.insert_marker();
                self.frameset_ok.set(false);
                ProcessResult::Done
            },

            (EndTag, "applet" | "marquee" | "object") => {
                if !self.in_scope_named(default_scope, &tag.name) {
                    self.unexpected(&tag);
                } else {
                    self.site.generate_implied_end_tags();
                    self.expect_to_close(&tag.name);
                    self.clear_active_formatting_to_marker();
                }
                ProcessResult::Done
            },

            (StartTag, "table") => {
                if self.quirks_mode.get() != Quirks {
                    self.close_p_element_in_button_scope();
                }
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                self.mode.set(InsertionMode::InTable);
                ProcessResult::Done
            },

            (EndTag, "br") => {
                self.unexpected(&tag);
                self.step(
                    InsertionMode::InBody,
                    Token::Tag(Tag {
                        kind: StartTag,
                        attrs: vec![],
                        ..tag
                    }),
                )
            },

            (StartTag, "area" | "br" | "embed" | "img" | "keygen" | "wbr" | "input") => {
                let keep_frameset_ok = &*tag.name == "input" && self.is_type_hidden(&tag);
                self.site.reconstruct_active_formatting_elements();
                self.insert_and_pop_element_for(tag);
                if !keep_frameset_ok {
                    self.frameset_ok.set(false);
                }
                ProcessResult::DoneAckSelfClosing
            },

            (StartTag, "param" | "source" | "track") => {
                self.insert_and_pop_element_for(tag);
                ProcessResult::DoneAckSelfClosing
            },

            (StartTag, "hr") => {
                self.close_p_element_in_button_scope();
                self.insert_and_pop_element_for(tag);
                self.frameset_ok.set(false);
                ProcessResult::DoneAckSelfClosing
            },

            (StartTag, "image") => {
                self.unexpected(&tag);
                self.step(
                    InsertionMode::InBody,
                    Token::Tag(Tag {
                        name: LocalName::from("img"),
                        ..tag
                    }),
                )
            },

            (StartTag, "textarea") => {
                self.ignore_lf.set(true);
                self.frameset_ok.set(false);
                self.parse_raw_data(tag, Rcdata)
            },

            (StartTag, "xmp") => {
                self.close_p_element_in_button_scope();
                self.site.reconstruct_active_formatting_elements();
                self.frameset_ok.set(false);
                self.parse_raw_data(tag, Rawtext)
            },

            (StartTag, "iframe") => {
                self.frameset_ok.set(false);
                self.parse_raw_data(tag, Rawtext)
            },

            (StartTag, "noembed") if self.opts.plugins_enabled => self.parse_raw_data(tag, Rawtext),

            (StartTag, "noscript") if self.opts.scripting_enabled => self.parse_raw_data(tag, Rawtext),

            (StartTag, "select") => {
                self.site.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                self.frameset_ok.set(false);
                // The mode may be a table mode processing this "as in body".
                self.mode.set(match self.mode.get() {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                });
                ProcessResult::Done
            },

            (StartTag, "optgroup" | "option") => {
                if self.current_node_named("option") {
                    self.pop();
                }
                self.site.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "rb" | "rtc") => {
                if self.in_scope_named(default_scope, "ruby") {
                    self.site.generate_implied_end_tags();
                }
                if !self.current_node_named("ruby") {
                    self.unexpected(&tag);
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "rp" | "rt") => {
                if self.in_scope_named(default_scope, "ruby") {
                    self.site.generate_implied_end_tags_except("rtc");
                }
                if !self.current_node_named("rtc") && !self.current_node_named("ruby") {
                    self.unexpected(&tag);
                }
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (StartTag, "math") => self.enter_foreign(tag, Namespace::MathMl),

            (StartTag, "svg") => self.enter_foreign(tag, Namespace::Svg),

            (
                StartTag,
                "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot" | "th"
                | "thead" | "tr",
            ) => self.unexpected(&tag),

            (StartTag, _) => {
                self.site.reconstruct_active_formatting_elements();
                self.insert_element_for(tag);
                ProcessResult::Done
            },

            (EndTag, _) => {
                self.process_end_tag_in_body(tag);
                ProcessResult::Done
            },
        }
    }

    /// <https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign>
    pub(crate) fn step_foreign(&self, token: Token) -> ProcessResult<Sink::Handle> {
        match token {
            Token::NullCharacter => {
                self.unexpected(&token);
                self.append_text(SplitStatus::NotWhitespace, StrTendril::from_slice("\u{fffd}"))
            },

            Token::Characters(split, text) => {
                if split == SplitStatus::NotWhitespace
                    || (split == SplitStatus::NotSplit && any_not_whitespace(&text))
                {
                    self.frameset_ok.set(false);
                }
                self.append_text(split, text)
            },

            Token::Comment(text) => self.append_comment(text),

            Token::Tag(tag) => match (tag.kind, &*tag.name) {
                (
                    StartTag,
                    "b" | "big" | "blockquote" | "body" | "br" | "center" | "code" | "dd" | "div" | "dl"
                    | "dt" | "em" | "embed" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "hr"
                    | "i" | "img" | "li" | "listing" | "menu" | "meta" | "nobr" | "ol" | "p" | "pre"
                    | "ruby" | "s" | "small" | "span" | "strong" | "strike" | "sub" | "sup" | "table"
                    | "tt" | "u" | "ul" | "var",
                )
                | (EndTag, "br" | "p") => self.unexpected_start_tag_in_foreign_content(tag),

                (StartTag, "font") => {
                    let breaks_out = tag.attrs.iter().any(|attr| {
                        attr.name.ns == Namespace::None
                            && matches!(&*attr.name.local, "color" | "face" | "size")
                    });
                    if breaks_out {
                        self.unexpected_start_tag_in_foreign_content(tag)
                    } else {
                        self.foreign_start_tag(tag)
                    }
                },

                (StartTag, _) => self.foreign_start_tag(tag),

                (EndTag, _) => {
                    let mut first = true;
                    let mut stack_idx = self.site.open_elems.borrow().len().saturating_sub(1);
                    loop {
                        if stack_idx == 0 {
                            return ProcessResult::Done;
                        }

                        let (html, eq) = match self.site.open_elems.borrow().get(stack_idx) {
                            Some(item) => (
                                item.name.ns == Namespace::Html,
                                item.name.local.eq_ignore_ascii_case(&tag.name),
                            ),
                            None => return ProcessResult::Done,
                        };

                        if !first && html {
                            return self.step(self.mode.get(), Token::Tag(tag));
                        }

                        if eq {
                            self.site.truncate(stack_idx);
                            return ProcessResult::Done;
                        }

                        if first {
                            self.unexpected(&tag);
                            first = false;
                        }
                        stack_idx -= 1;
                    }
                },
            },

            // `is_foreign` never sends end of file here.
            Token::Eof => self.step(self.mode.get(), token),
        }
    }
}
