// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! High-level interface to the parser.

use crate::interface::{Attribute, QualName};
use crate::tokenizer::states::{self, Plaintext, RawData};
use crate::tokenizer::{CharacterTokens, TagToken, Token, StartTag};
use crate::tokenizer::{TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts, TokenizerResult};
use crate::tree_builder::{TreeBuilder, TreeBuilderOpts, TreeSink};
use crate::util::buffer_queue::BufferQueue;

use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use log::debug;
use tendril::{StrTendril, TendrilSink};

/// All-encompassing options struct for the parser.
#[derive(Clone, Default)]
pub struct ParseOpts {
    /// Tokenizer options.
    pub tokenizer: TokenizerOpts,

    /// Tree builder options.
    pub tree_builder: TreeBuilderOpts,
}

impl ParseOpts {
    /// Tokenizer options with the settings both halves read taken from the
    /// tree builder options.
    fn tokenizer_opts(&self) -> TokenizerOpts {
        TokenizerOpts {
            exact_errors: self.tokenizer.exact_errors || self.tree_builder.exact_errors,
            pre_html5_quirks: self.tokenizer.pre_html5_quirks || self.tree_builder.pre_html5_quirks,
            scripting_enabled: self.tree_builder.scripting_enabled,
            plugins_enabled: self.tree_builder.plugins_enabled,
            ..self.tokenizer.clone()
        }
    }
}

/// Where the parser stopped.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ParseStatus {
    /// Everything fed so far has been parsed.
    NeedInput,
    /// A script's end tag was reached. Run the script handed out by
    /// `Parser::take_script_to_process`, then call `Parser::resume`.
    ScriptPending,
}

/// Parse an HTML document.
///
/// The returned parser is fed with `Parser::feed` and closed with
/// `Parser::finish`, which returns the sink's output.
pub fn parse_document<Sink>(sink: Sink, opts: ParseOpts) -> Parser<Sink>
where
    Sink: TreeSink,
{
    let tok_opts = opts.tokenizer_opts();
    let tb = TreeBuilder::new(sink, opts.tree_builder);
    Parser::new(Tokenizer::new(tb, tok_opts))
}

/// Parse an HTML fragment in the context of an element called
/// `context_name` with `context_attrs`.
///
/// The fragment's nodes end up under an `html` root element appended to the
/// sink's document.
pub fn parse_fragment<Sink>(
    sink: Sink,
    opts: ParseOpts,
    context_name: QualName,
    context_attrs: Vec<Attribute>,
) -> Parser<Sink>
where
    Sink: TreeSink,
{
    let tb = TreeBuilder::new_for_fragment(sink, context_name, context_attrs, opts.tree_builder);
    let tok_opts = TokenizerOpts {
        initial_state: Some(tb.tokenizer_state_for_context_elem()),
        ..opts.tokenizer_opts()
    };
    Parser::new(Tokenizer::new(tb, tok_opts))
}

/// An HTML parser that is fed text incrementally and pauses whenever a
/// script is ready to run.
pub struct Parser<Sink>
where
    Sink: TreeSink,
{
    pub tokenizer: Tokenizer<TreeBuilder<Sink>>,
    pub input_buffer: BufferQueue,
    script_pending: Cell<bool>,
}

impl<Sink: TreeSink> Parser<Sink> {
    fn new(tokenizer: Tokenizer<TreeBuilder<Sink>>) -> Parser<Sink> {
        Parser {
            tokenizer,
            input_buffer: BufferQueue::default(),
            script_pending: Cell::new(false),
        }
    }

    /// Queue `chunk` and parse as far as possible. While a script is
    /// pending the chunk is only queued.
    pub fn feed(&self, chunk: StrTendril) -> ParseStatus {
        if !chunk.is_empty() {
            self.input_buffer.push_back(chunk);
        }
        if self.script_pending.get() {
            return ParseStatus::ScriptPending;
        }
        self.run()
    }

    /// The script element whose end tag paused the parser, with the line
    /// its start tag was on.
    pub fn take_script_to_process(&self) -> Option<(Sink::Handle, u64)> {
        self.tokenizer.sink.take_script_to_process()
    }

    /// Continue after a script pause with the input queued so far.
    pub fn resume(&self) -> ParseStatus {
        if self.script_pending.replace(false) {
            // A script that was never taken will not be reported again.
            self.tokenizer.sink.take_script_to_process();
        }
        self.run()
    }

    /// Parse the rest of the queued input, then end of file, and return the
    /// sink's output. Scripts reached on the way are not reported.
    pub fn finish(self) -> Sink::Output {
        loop {
            match self.tokenizer.feed(&self.input_buffer) {
                TokenizerResult::Done => break,
                TokenizerResult::Script(_) => {
                    debug!("dropping a script pause while finishing");
                    self.tokenizer.sink.take_script_to_process();
                },
            }
        }
        self.tokenizer.end();
        self.tokenizer.sink.into_sink().finish()
    }

    /// Stop building the tree. The sink sees no further mutations, even if
    /// the parser keeps being fed.
    pub fn detach(&self) {
        self.tokenizer.sink.detach();
        self.script_pending.set(false);
    }

    pub fn is_detached(&self) -> bool {
        self.tokenizer.sink.is_detached()
    }

    pub fn sink(&self) -> &Sink {
        self.tokenizer.sink.sink()
    }

    fn run(&self) -> ParseStatus {
        match self.tokenizer.feed(&self.input_buffer) {
            TokenizerResult::Done => ParseStatus::NeedInput,
            TokenizerResult::Script(_) => {
                self.script_pending.set(true);
                ParseStatus::ScriptPending
            },
        }
    }
}

impl<Sink: TreeSink> TendrilSink<tendril::fmt::UTF8> for Parser<Sink> {
    type Output = Sink::Output;

    // Script pauses are resumed straight away.
    fn process(&mut self, t: StrTendril) {
        let mut status = self.feed(t);
        while status == ParseStatus::ScriptPending {
            status = self.resume();
        }
    }

    fn error(&mut self, desc: Cow<'static, str>) {
        self.tokenizer.sink.sink().parse_error(desc)
    }

    fn finish(self) -> Self::Output {
        Parser::finish(self)
    }
}

/// Collects tokens, switching the tokenizer into the raw text states a
/// tree builder would have chosen.
struct ApproximateSink {
    tokens: RefCell<Vec<Token>>,
    scripting_enabled: bool,
    plugins_enabled: bool,
}

impl TokenSink for ApproximateSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut tokens = self.tokens.borrow_mut();
        let result = match token {
            TagToken(ref tag) if tag.kind == StartTag => {
                match states::approximate_state_for(&tag.name, self.scripting_enabled, self.plugins_enabled) {
                    Some(RawData(kind)) => TokenSinkResult::RawData(kind),
                    Some(Plaintext) => TokenSinkResult::Plaintext,
                    _ => TokenSinkResult::Continue,
                }
            },
            _ => TokenSinkResult::Continue,
        };

        match token {
            CharacterTokens(text) => match tokens.last_mut() {
                Some(CharacterTokens(prev)) => prev.push_tendril(&text),
                _ => tokens.push(CharacterTokens(text)),
            },
            token => tokens.push(token),
        }
        result
    }
}

/// Tokenize `input` without building a tree.
///
/// Raw text elements are recognised by name alone, so this differs from a
/// real parse in three ways: the newline after `<pre>` is kept, NUL is never
/// replaced by the tokenizer, and CDATA sections in foreign content come out
/// as bogus comments. Adjacent character tokens are merged.
pub fn tokenize_approximately(input: StrTendril, opts: TokenizerOpts) -> Vec<Token> {
    let sink = ApproximateSink {
        tokens: RefCell::new(vec![]),
        scripting_enabled: opts.scripting_enabled,
        plugins_enabled: opts.plugins_enabled,
    };
    let tok = Tokenizer::new(sink, opts);
    let buffer = BufferQueue::default();
    buffer.push_back(input);
    let _ = tok.feed(&buffer);
    tok.end();
    tok.sink.tokens.take()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dom::ArenaDom;
    use crate::tokenizer::EOFToken;

    #[test]
    fn empty_feed_needs_input() {
        let parser = parse_document(ArenaDom::default(), ParseOpts::default());
        assert_eq!(parser.feed(StrTendril::new()), ParseStatus::NeedInput);
        assert!(parser.take_script_to_process().is_none());
    }

    #[test]
    fn tree_builder_settings_reach_the_tokenizer() {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                pre_html5_quirks: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let tok = opts.tokenizer_opts();
        assert!(!tok.scripting_enabled);
        assert!(tok.pre_html5_quirks);
        assert!(tok.plugins_enabled);
    }

    #[test]
    fn approximate_tokens_end_with_eof() {
        let tokens = tokenize_approximately(StrTendril::from_slice("<title><b></title>"), TokenizerOpts::default());
        assert_eq!(tokens.last(), Some(&EOFToken));
        assert!(tokens.contains(&CharacterTokens(StrTendril::from_slice("<b>"))));
    }
}
