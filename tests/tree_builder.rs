// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use html5tree::dom::ArenaDom;
use html5tree::tendril::TendrilSink;
use html5tree::tree_builder::TreeBuilderOpts;
use html5tree::{parse_document, parse_fragment, ParseOpts, QualName, QuirksMode};

fn parse_with(input: &str, opts: ParseOpts) -> ArenaDom {
    parse_document(ArenaDom::default(), opts).one(input)
}

fn parse(input: &str) -> ArenaDom {
    parse_with(input, ParseOpts::default())
}

fn fragment(context: &str, input: &str) -> ArenaDom {
    parse_fragment(ArenaDom::default(), ParseOpts::default(), QualName::html(context), vec![]).one(input)
}

/// The dump of a document whose html and head were implied, with `body`
/// holding the given lines, each indented under `<body>`.
fn in_body(lines: &[&str]) -> String {
    let mut expected = String::from("| <html>\n|   <head>\n|   <body>\n");
    for line in lines {
        expected.push_str("|     ");
        expected.push_str(line);
        expected.push('\n');
    }
    expected
}

#[test]
fn paragraphs_close_each_other() {
    let dom = parse("<p>A<p>B");
    assert_eq!(dom.dump(), in_body(&["<p>", "  \"A\"", "<p>", "  \"B\""]));
}

#[test]
fn formatting_reopened_across_paragraph() {
    let dom = parse("<b>1<i>2<p>3</b>4</p>5</i>6");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<b>",
            "  \"1\"",
            "  <i>",
            "    \"2\"",
            "<i>",
            "  <p>",
            "    <b>",
            "      \"3\"",
            "    \"4\"",
            "  \"5\"",
            "\"6\"",
        ])
    );
}

#[test]
fn implied_tbody_and_rows() {
    let dom = parse("<table><tr><td>cell<tr><td>cell2</table>");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"cell\"",
            "    <tr>",
            "      <td>",
            "        \"cell2\"",
        ])
    );
}

#[test]
fn table_text_is_foster_parented() {
    let dom = parse("text<table>injected</table>more");
    // The fostered text lands right after "text" and merges with it.
    assert_eq!(dom.dump(), in_body(&["\"textinjected\"", "<table>", "\"more\""]));
}

#[test]
fn lone_end_html_builds_skeleton() {
    let dom = parse("</html>");
    assert_eq!(dom.dump(), "| <html>\n|   <head>\n|   <body>\n");
    assert!(!dom.errors().is_empty());
}

#[test]
fn formatting_inside_table_goes_before_it() {
    let dom = parse("<table><b>X</b></table>");
    assert_eq!(dom.dump(), in_body(&["<b>", "  \"X\"", "<table>"]));
}

#[test]
fn whitespace_stays_inside_table() {
    let dom = parse("<table> <tr> </tr></table>");
    assert_eq!(
        dom.dump(),
        in_body(&["<table>", "  \" \"", "  <tbody>", "    <tr>", "      \" \""])
    );
}

#[test]
fn adoption_agency_terminates_on_deep_misnesting() {
    let mut input = String::new();
    for _ in 0..40 {
        input.push_str("<b>");
    }
    input.push_str("<div>x");
    for _ in 0..40 {
        input.push_str("</b>");
    }
    input.push_str("y");
    let dom = parse(&input);
    let body = dom.elements_named(dom.document(), "body")[0];
    assert_eq!(dom.elements_named(body, "div").len(), 1);
    assert!(dom.dump().contains("\"x\""));
    assert!(dom.dump().contains("\"y\""));
}

#[test]
fn adoption_agency_inner_loop_drops_outer_formatting() {
    let dom = parse("<a><b><i><u><s><div>x</a>y");
    assert_eq!(dom.elements_named(dom.document(), "div").len(), 1);
    // Only the three formatting elements closest to the div are cloned.
    assert_eq!(dom.elements_named(dom.document(), "a").len(), 2);
    assert_eq!(dom.elements_named(dom.document(), "s").len(), 2);
    assert_eq!(dom.elements_named(dom.document(), "b").len(), 1);
}

#[test]
fn nested_anchors_are_split() {
    let dom = parse("<a href=1>x<a href=2>y");
    assert_eq!(
        dom.dump(),
        in_body(&["<a>", "  href=\"1\"", "  \"x\"", "<a>", "  href=\"2\"", "  \"y\""])
    );
}

#[test]
fn noahs_ark_limits_reconstruction() {
    // Four <b> were open, but at most three equal entries are remembered.
    let dom = parse("<p><b><b><b><b></p>x");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<p>",
            "  <b>",
            "    <b>",
            "      <b>",
            "        <b>",
            "<b>",
            "  <b>",
            "    <b>",
            "      \"x\"",
        ])
    );
}

#[test]
fn list_items_close_siblings() {
    let dom = parse("<ul><li>a<li>b</ul><dl><dt>c<dd>d</dl>");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<ul>",
            "  <li>",
            "    \"a\"",
            "  <li>",
            "    \"b\"",
            "<dl>",
            "  <dt>",
            "    \"c\"",
            "  <dd>",
            "    \"d\"",
        ])
    );
}

#[test]
fn foreign_content_and_breakout() {
    let dom = parse("<svg viewbox='0 0 1 1'><foreignobject><p>hi</p></foreignobject></svg><math><mi>x</mi></math><svg><b>out");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<svg svg>",
            "  viewBox=\"0 0 1 1\"",
            "  <svg foreignObject>",
            "    <p>",
            "      \"hi\"",
            "<math math>",
            "  <math mi>",
            "    \"x\"",
            "<svg svg>",
            "<b>",
            "  \"out\"",
        ])
    );
}

#[test]
fn xlink_attributes_get_namespaces() {
    let dom = parse("<svg><a xlink:href='#x'></a></svg>");
    assert!(dom.dump().contains("|         xlink href=\"#x\"\n"));
}

#[test]
fn cdata_in_svg_is_text() {
    let dom = parse("<svg><![CDATA[a<b]]></svg><![CDATA[c]]>");
    assert_eq!(
        dom.dump(),
        in_body(&["<svg svg>", "  \"a<b\"", "<!-- [CDATA[c]] -->"])
    );
}

#[test]
fn template_contents() {
    let dom = parse("<template><td>x</td></template>");
    assert_eq!(
        dom.dump(),
        "| <html>\n|   <head>\n|     <template>\n|       content\n|         <td>\n|           \"x\"\n|   <body>\n"
    );
}

#[test]
fn isindex_expands_to_form() {
    let dom = parse("<isindex prompt='Find: ' action='/s'>");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<form>",
            "  action=\"/s\"",
            "  <hr>",
            "  <label>",
            "    \"Find: \"",
            "    <input>",
            "      name=\"isindex\"",
            "  <hr>",
        ])
    );
}

#[test]
fn isindex_ignored_inside_form() {
    let dom = parse("<form><isindex>");
    assert_eq!(dom.dump(), in_body(&["<form>"]));
}

#[test]
fn doctype_sets_quirks_mode() {
    let dom = parse("<!DOCTYPE html><p>");
    assert_eq!(dom.quirks_mode(), QuirksMode::NoQuirks);
    assert!(dom.dump().starts_with("| <!DOCTYPE html>\n| <html>\n"));

    assert_eq!(parse("<p>").quirks_mode(), QuirksMode::Quirks);

    let dom = parse("<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"\">");
    assert_eq!(dom.quirks_mode(), QuirksMode::LimitedQuirks);
}

#[test]
fn quirks_table_does_not_close_paragraph() {
    let dom = parse("<p><table>");
    assert_eq!(dom.dump(), in_body(&["<p>", "  <table>"]));

    let dom = parse("<!DOCTYPE html><p><table>");
    assert_eq!(
        dom.dump(),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|     <table>\n"
    );
}

#[test]
fn noscript_depends_on_scripting() {
    let dom = parse("<noscript><p>x</p></noscript>");
    assert!(dom.dump().contains("\"<p>x</p>\""));

    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_with("<body><noscript><p>x</p></noscript>", opts);
    assert_eq!(dom.dump(), in_body(&["<noscript>", "  <p>", "    \"x\""]));
}

#[test]
fn select_closes_on_table_tags() {
    let dom = parse("<table><tr><td><select><option>a<td>b");
    assert_eq!(
        dom.dump(),
        in_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        <select>",
            "          <option>",
            "            \"a\"",
            "      <td>",
            "        \"b\"",
        ])
    );
}

#[test]
fn frameset_replaces_body() {
    let dom = parse("<frameset><frame></frameset>");
    assert_eq!(dom.dump(), "| <html>\n|   <head>\n|   <frameset>\n|     <frame>\n");
}

#[test]
fn pre_drops_leading_newline() {
    let dom = parse("<pre>\nx</pre><textarea>\ny</textarea>");
    assert_eq!(
        dom.dump(),
        in_body(&["<pre>", "  \"x\"", "<textarea>", "  \"y\""])
    );
}

#[test]
fn comments_after_body_go_to_html_and_document() {
    let dom = parse("<body></body><!--a--></html><!--b-->");
    assert_eq!(
        dom.dump(),
        "| <html>\n|   <head>\n|   <body>\n|   <!-- a -->\n| <!-- b -->\n"
    );
}

#[test]
fn form_controls_are_associated() {
    let dom = parse("<form id=f><input><input form=other></form>");
    let form = dom.elements_named(dom.document(), "form")[0];
    let inputs = dom.elements_named(dom.document(), "input");
    let associated: Vec<_> = dom
        .events()
        .into_iter()
        .filter_map(|event| match event {
            html5tree::dom::Lifecycle::FormAssociated { element, form } => Some((element, form)),
            _ => None,
        })
        .collect();
    assert_eq!(associated, vec![(inputs[0], form)]);
}

#[test]
fn fragment_in_table_context() {
    let dom = fragment("table", "<tr><td>x");
    assert_eq!(
        dom.dump_fragment(),
        "| <tbody>\n|   <tr>\n|     <td>\n|       \"x\"\n"
    );
}

#[test]
fn fragment_in_rcdata_context() {
    let dom = fragment("textarea", "<b>x</b></textarea>");
    assert_eq!(dom.dump_fragment(), "| \"<b>x</b></textarea>\"\n");
}

#[test]
fn fragment_in_body_context() {
    let dom = fragment("body", "<p>a</html>b");
    assert_eq!(dom.dump_fragment(), "| <p>\n|   \"ab\"\n");
}

#[test]
fn search_is_a_furthest_block() {
    let dom = parse("<b><search>x</b>y");
    assert_eq!(
        dom.dump(),
        in_body(&["<b>", "<search>", "  <b>", "    \"x\"", "  \"y\""])
    );
}

#[test]
fn table_text_in_template_row_context() {
    let dom = parse("<!DOCTYPE html><template><tr></tr> </template>");
    assert_eq!(
        dom.dump(),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|     <template>\n|       content\n\
         |         <tr>\n|         \" \"\n|   <body>\n"
    );
    assert!(dom.errors().is_empty(), "{:?}", dom.errors());
}
