// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cell::RefCell;

use html5tree::tendril::{SliceExt, StrTendril};
use html5tree::tokenizer::{CharacterTokens, CommentToken, DoctypeToken, EOFToken, ParseError, TagToken};
use html5tree::tokenizer::{EndTag, StartTag, Token};
use html5tree::tokenizer::{TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts};
use html5tree::{tokenize_approximately, BufferQueue};

// Collects tokens with their line numbers. Character runs are merged and
// parse errors are dropped, so the output does not depend on chunking.
#[derive(Default)]
struct TokenCollector {
    tokens: RefCell<Vec<(Token, u64)>>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        let mut tokens = self.tokens.borrow_mut();
        match token {
            ParseError(_) => (),
            CharacterTokens(text) => match tokens.last_mut() {
                Some((CharacterTokens(prev), _)) => prev.push_tendril(&text),
                _ => tokens.push((CharacterTokens(text), line_number)),
            },
            token => tokens.push((token, line_number)),
        }
        TokenSinkResult::Continue
    }
}

fn tokenize_chunks<I: IntoIterator<Item = StrTendril>>(chunks: I) -> Vec<(Token, u64)> {
    let tok = Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
    let buffer = BufferQueue::default();
    for chunk in chunks {
        buffer.push_back(chunk);
        let _ = tok.feed(&buffer);
    }
    tok.end();
    tok.sink.tokens.take()
}

fn tokenize(input: &str) -> Vec<Token> {
    tokenize_chunks(Some(input.to_tendril()))
        .into_iter()
        .map(|(t, _)| t)
        .collect()
}

fn text_of(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            CharacterTokens(s) => Some(&**s),
            _ => None,
        })
        .collect()
}

fn tag_names(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|t| match t {
            TagToken(tag) if tag.kind == StartTag => Some(tag.name.to_string()),
            TagToken(tag) => Some(format!("/{}", tag.name)),
            _ => None,
        })
        .collect()
}

#[test]
fn character_references_in_text() {
    let tokens = tokenize("&amp;&lt;&#x41;&#128;&notin;&notit;");
    assert_eq!(text_of(&tokens), "&<A\u{20ac}\u{2209}\u{ac}it;");
}

#[test]
fn character_references_out_of_range() {
    let tokens = tokenize("&#0;&#x110000;&#xD800;&bogus;");
    assert_eq!(text_of(&tokens), "\u{fffd}\u{fffd}\u{fffd}&bogus;");
}

#[test]
fn legacy_reference_in_attribute_stays_literal() {
    let tokens = tokenize("<a href=\"?x=1&copy=2\" title='&copy;'>");
    match &tokens[0] {
        TagToken(tag) => {
            assert_eq!(tag.get_attribute("href"), Some("?x=1&copy=2".to_tendril()));
            assert_eq!(tag.get_attribute("title"), Some("\u{a9}".to_tendril()));
        },
        other => panic!("expected a tag, got {other:?}"),
    }
}

#[test]
fn tag_names_and_attributes_are_lowercased() {
    let tokens = tokenize("<DIV ID=Main></Div>");
    assert_eq!(tag_names(&tokens), vec!["div", "/div"]);
    match &tokens[0] {
        TagToken(tag) => assert_eq!(tag.get_attribute("id"), Some("Main".to_tendril())),
        other => panic!("expected a tag, got {other:?}"),
    }
}

#[test]
fn doctype_and_comments() {
    let tokens = tokenize("<!doctype HTML><!-- hi --><!x>");
    match &tokens[0] {
        DoctypeToken(d) => {
            assert_eq!(d.name, Some("html".to_tendril()));
            assert!(!d.force_quirks);
        },
        other => panic!("expected a doctype, got {other:?}"),
    }
    assert_eq!(tokens[1], CommentToken(" hi ".to_tendril()));
    assert_eq!(tokens[2], CommentToken("x".to_tendril()));
}

#[test]
fn one_char_chunks_match_whole_input() {
    let doc = "<!DOCTYPE html>\n<title>a&amp;b</title>\r\n<p class=x>&notin; &#x41;<br/>\n<!-- end -->";
    let whole = tokenize_chunks(Some(doc.to_tendril()));
    let by_char = tokenize_chunks(doc.chars().map(StrTendril::from_char));
    assert_eq!(whole, by_char);
}

#[test]
fn carriage_returns_are_normalized() {
    let tokens = tokenize("a\r\nb\rc");
    assert_eq!(text_of(&tokens), "a\nb\nc");
}

#[test]
fn tokens_carry_line_numbers() {
    let tokens = tokenize_chunks(Some("a\n\nb<p>\r\n</p>".to_tendril()));
    let lines: Vec<u64> = tokens
        .iter()
        .filter(|(t, _)| matches!(t, TagToken(_)))
        .map(|&(_, line)| line)
        .collect();
    assert_eq!(lines, vec![3, 4]);
}

#[test]
fn approximation_switches_raw_text_states() {
    let tokens = tokenize_approximately("<style><b></style><pre>\nx".to_tendril(), TokenizerOpts::default());
    assert_eq!(tag_names(&tokens), vec!["style", "/style", "pre"]);
    assert!(tokens.contains(&CharacterTokens("<b>".to_tendril())));
    // Nothing knows the newline after <pre> is dropped.
    assert!(tokens.contains(&CharacterTokens("\nx".to_tendril())));
    assert_eq!(tokens.last(), Some(&EOFToken));
}

#[test]
fn approximation_follows_scripting_setting() {
    let input = "<noscript><b></noscript>";
    let tokens = tokenize_approximately(input.to_tendril(), TokenizerOpts::default());
    assert_eq!(tag_names(&tokens), vec!["noscript", "/noscript"]);

    let opts = TokenizerOpts {
        scripting_enabled: false,
        ..Default::default()
    };
    let tokens = tokenize_approximately(input.to_tendril(), opts);
    assert_eq!(tag_names(&tokens), vec!["noscript", "b", "/noscript"]);
}

#[test]
fn approximation_plaintext_swallows_rest() {
    let tokens = tokenize_approximately("<plaintext></plaintext><b>".to_tendril(), TokenizerOpts::default());
    assert_eq!(tag_names(&tokens), vec!["plaintext"]);
    assert!(tokens.contains(&CharacterTokens("</plaintext><b>".to_tendril())));
}

#[test]
fn script_end_tag_needs_matching_name() {
    let tokens = tokenize_approximately("<script>a</b></scriptx></script>".to_tendril(), TokenizerOpts::default());
    assert_eq!(tag_names(&tokens), vec!["script", "/script"]);
    assert!(tokens.contains(&CharacterTokens("a</b></scriptx>".to_tendril())));
    match &tokens[2] {
        TagToken(tag) => assert_eq!(tag.kind, EndTag),
        other => panic!("expected a tag, got {other:?}"),
    }
}

#[test]
fn comment_and_doctype_identifier_states() {
    let doc = "<!----><!-- a --!><!--->x<!DOCTYPE html PUBLIC \"a\" 'b'><p a = 1 b/>";
    let tokens = tokenize(doc);
    assert_eq!(tokens[0], CommentToken("".to_tendril()));
    assert_eq!(tokens[1], CommentToken(" a ".to_tendril()));
    assert_eq!(tokens[2], CommentToken("".to_tendril()));
    assert_eq!(tokens[3], CharacterTokens("x".to_tendril()));
    match &tokens[4] {
        DoctypeToken(d) => {
            assert_eq!(d.name, Some("html".to_tendril()));
            assert_eq!(d.public_id, Some("a".to_tendril()));
            assert_eq!(d.system_id, Some("b".to_tendril()));
            assert!(!d.force_quirks);
        },
        other => panic!("expected a doctype, got {other:?}"),
    }
    match &tokens[5] {
        TagToken(tag) => {
            assert!(tag.self_closing);
            assert_eq!(tag.get_attribute("a"), Some("1".to_tendril()));
            assert_eq!(tag.get_attribute("b"), Some("".to_tendril()));
        },
        other => panic!("expected a tag, got {other:?}"),
    }

    let whole = tokenize_chunks(Some(doc.to_tendril()));
    let by_char = tokenize_chunks(doc.chars().map(StrTendril::from_char));
    assert_eq!(whole, by_char);
}

#[test]
fn double_escaped_script_hides_end_tag() {
    let input = "<script><!--<script></script>--></script>";
    let tokens = tokenize_approximately(input.to_tendril(), TokenizerOpts::default());
    assert_eq!(tag_names(&tokens), vec!["script", "/script"]);
    assert!(tokens.contains(&CharacterTokens("<!--<script></script>-->".to_tendril())));
}
