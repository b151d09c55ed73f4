// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use html5tree::dom::{ArenaDom, Lifecycle};
use html5tree::tendril::{SliceExt, StrTendril, TendrilSink};
use html5tree::tree_builder::{DepthLimitPolicy, TreeBuilderOpts};
use html5tree::{parse_document, parse_fragment, ParseOpts, ParseStatus, QualName};

fn parse(input: &str) -> ArenaDom {
    parse_document(ArenaDom::default(), ParseOpts::default()).one(input)
}

fn tree_opts(opts: TreeBuilderOpts) -> ParseOpts {
    ParseOpts {
        tree_builder: opts,
        ..Default::default()
    }
}

#[test]
fn script_pauses_between_chunks() {
    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    assert_eq!(parser.feed("<scr".to_tendril()), ParseStatus::NeedInput);
    assert_eq!(parser.feed("ipt>alert(1)</scr".to_tendril()), ParseStatus::NeedInput);
    assert_eq!(parser.feed("ipt>".to_tendril()), ParseStatus::ScriptPending);

    let (script, line) = parser.take_script_to_process().expect("a pending script");
    assert_eq!(line, 1);
    assert_eq!(parser.take_script_to_process(), None);
    assert_eq!(parser.resume(), ParseStatus::NeedInput);

    let dom = parser.finish();
    assert_eq!(dom.element_name(script), Some(QualName::html("script")));
    let expected = "| <html>\n|   <head>\n|     <script>\n|       \"alert(1)\"\n|   <body>\n";
    assert_eq!(dom.dump(), expected);
    assert_eq!(parse("<script>alert(1)</script>").dump(), expected);
}

#[test]
fn input_fed_while_paused_is_only_queued() {
    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    assert_eq!(parser.feed("<script>a</script><p>".to_tendril()), ParseStatus::ScriptPending);
    assert_eq!(parser.feed("x".to_tendril()), ParseStatus::ScriptPending);
    assert!(parser.sink().elements_named(parser.sink().document(), "p").is_empty());

    assert!(parser.take_script_to_process().is_some());
    assert_eq!(parser.resume(), ParseStatus::NeedInput);
    let dom = parser.finish();
    let p = dom.elements_named(dom.document(), "p")[0];
    assert_eq!(dom.text(dom.children(p)[0]), Some("x".to_string()));
}

#[test]
fn script_line_is_its_start_tag_line() {
    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    let status = parser.feed("<p>\n\n<script>\nfoo()\n</script>".to_tendril());
    assert_eq!(status, ParseStatus::ScriptPending);
    let (_, line) = parser.take_script_to_process().expect("a pending script");
    assert_eq!(line, 3);
}

#[test]
fn chunked_feed_matches_one_shot() {
    let doc = "<!DOCTYPE html><title>T &amp; t</title><table><tr><td>a<b>b</table>\
               <p>x<i>y<p>z</i><svg><path d='M0'/></svg><!--c--><pre>\nq</pre>";
    let whole = parse(doc);

    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    for c in doc.chars() {
        assert_eq!(parser.feed(StrTendril::from_char(c)), ParseStatus::NeedInput);
    }
    let by_char = parser.finish();

    assert_eq!(whole.dump(), by_char.dump());
    assert_eq!(whole.errors().len(), by_char.errors().len());
}

#[test]
fn finish_parses_queued_input_past_scripts() {
    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    assert_eq!(
        parser.feed("<script>1</script><script>2</script>".to_tendril()),
        ParseStatus::ScriptPending
    );
    let dom = parser.finish();
    assert_eq!(dom.elements_named(dom.document(), "script").len(), 2);
}

#[test]
fn detached_parser_stops_mutating() {
    let parser = parse_document(ArenaDom::default(), ParseOpts::default());
    assert_eq!(parser.feed("<div>a".to_tendril()), ParseStatus::NeedInput);
    parser.detach();
    assert!(parser.is_detached());
    assert_eq!(parser.feed("<p>b<script>c</script>".to_tendril()), ParseStatus::NeedInput);
    assert_eq!(parser.take_script_to_process(), None);

    let dom = parser.finish();
    assert!(dom.elements_named(dom.document(), "p").is_empty());
    assert_eq!(dom.elements_named(dom.document(), "div").len(), 1);
    assert!(!dom.dump().contains("\"b\""));
}

#[test]
fn depth_limit_reparents_to_grandparent() {
    let opts = tree_opts(TreeBuilderOpts {
        max_tree_depth: Some(4),
        ..Default::default()
    });
    let dom = parse_document(ArenaDom::default(), opts).one("<div><div><div>x");
    let divs = dom.elements_named(dom.document(), "div");
    assert_eq!(divs.len(), 3);
    assert_eq!(dom.parent(divs[1]), Some(divs[0]));
    assert_eq!(dom.parent(divs[2]), Some(divs[0]));
    // Text inside the too-deep div is lifted the same way.
    assert!(dom.children(divs[2]).is_empty());
    let last = dom.children(divs[0]).last().copied();
    assert_eq!(last.and_then(|n| dom.text(n)), Some("x".to_string()));
}

#[test]
fn depth_limit_can_discard() {
    let opts = tree_opts(TreeBuilderOpts {
        max_tree_depth: Some(4),
        depth_limit_policy: DepthLimitPolicy::Discard,
        ..Default::default()
    });
    let dom = parse_document(ArenaDom::default(), opts).one("<div><div><div>x</div>y");
    let body = dom.elements_named(dom.document(), "body")[0];
    assert_eq!(dom.elements_named(body, "div").len(), 2);
    assert!(!dom.dump().contains("\"x\""));
    // The innermost surviving div is itself at the limit.
    assert!(!dom.dump().contains("\"y\""));
}

#[test]
fn long_text_is_split_into_chunks() {
    let opts = tree_opts(TreeBuilderOpts {
        text_chunk_size: 4,
        ..Default::default()
    });
    let parser = parse_document(ArenaDom::default(), opts);
    assert_eq!(parser.feed("<p>abc".to_tendril()), ParseStatus::NeedInput);
    assert_eq!(parser.feed("defghij".to_tendril()), ParseStatus::NeedInput);
    let dom = parser.finish();

    let p = dom.elements_named(dom.document(), "p")[0];
    let texts: Vec<String> = dom.children(p).into_iter().filter_map(|n| dom.text(n)).collect();
    assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
}

#[test]
fn lifecycle_hooks_bracket_children() {
    let dom = parse("<p>x</p>");
    let p = dom.elements_named(dom.document(), "p")[0];
    let events = dom.events();
    let position = |event: Lifecycle| events.iter().position(|e| *e == event);

    let attached = position(Lifecycle::Attach(p)).expect("p attached");
    let begun = position(Lifecycle::BeginChildren(p)).expect("p began children");
    let finished = position(Lifecycle::FinishChildren(p)).expect("p finished children");
    assert!(attached < begun);
    assert!(begun < finished);
}

#[test]
fn fragment_scripts_are_already_started() {
    let dom = parse_fragment(ArenaDom::default(), ParseOpts::default(), QualName::html("div"), vec![])
        .one("<script>x()</script>");
    let script = dom.elements_named(dom.document(), "script")[0];
    assert!(dom.events().contains(&Lifecycle::ScriptAlreadyStarted(script)));
    assert_eq!(dom.dump_fragment(), "| <script>\n|   \"x()\"\n");
}

#[test]
fn current_line_is_reported_to_the_sink() {
    let dom = parse("a\nb\n<p>c");
    assert_eq!(dom.current_line(), 3);
}

#[test]
fn pre_html5_quirks_reach_the_tokenizer() {
    let input = "<a href=x <b>y";
    let opts = tree_opts(TreeBuilderOpts {
        pre_html5_quirks: true,
        ..Default::default()
    });
    let dom = parse_document(ArenaDom::default(), opts).one(input);
    assert_eq!(dom.elements_named(dom.document(), "b").len(), 1);

    let dom = parse(input);
    assert!(dom.elements_named(dom.document(), "b").is_empty());
}
