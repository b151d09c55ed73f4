// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Various sets of HTML tag names, and macros for declaring them.
//!
//! A tag set is a plain `fn(&QualName) -> bool`, so sets compose and can be
//! handed to the scope queries on the element stack.

use crate::interface::{Namespace, QualName};

macro_rules! declare_tag_set_body (
    ($name:ident, [$supr:ident] - $($tag:tt)+) => (
        if $name.ns == $crate::interface::Namespace::Html && matches!(&*$name.local, $($tag)|+) {
            false
        } else {
            $supr($name)
        }
    );

    ($name:ident, [$supr:ident] + $($tag:tt)+) => (
        ($name.ns == $crate::interface::Namespace::Html && matches!(&*$name.local, $($tag)|+))
            || $supr($name)
    );

    ($name:ident, $($tag:tt)+) => (
        $name.ns == $crate::interface::Namespace::Html && matches!(&*$name.local, $($tag)|+)
    );
);

macro_rules! declare_tag_set (
    (pub $name:ident = $($toks:tt)+) => (
        pub(crate) fn $name(name: &$crate::interface::QualName) -> bool {
            declare_tag_set_body!(name, $($toks)+)
        }
    );

    ($name:ident = $($toks:tt)+) => (
        #[allow(dead_code)]
        fn $name(name: &$crate::interface::QualName) -> bool {
            declare_tag_set_body!(name, $($toks)+)
        }
    );
);

fn html_default_scope(name: &QualName) -> bool {
    name.ns == Namespace::Html
        && matches!(
            &*name.local,
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object" | "template"
        )
}

pub(crate) fn mathml_text_integration_point(name: &QualName) -> bool {
    name.ns == Namespace::MathMl && matches!(&*name.local, "mi" | "mo" | "mn" | "ms" | "mtext")
}

pub(crate) fn svg_html_integration_point(name: &QualName) -> bool {
    name.ns == Namespace::Svg && matches!(&*name.local, "foreignObject" | "desc" | "title")
}

/// <https://html.spec.whatwg.org/#has-an-element-in-scope>
pub(crate) fn default_scope(name: &QualName) -> bool {
    html_default_scope(name)
        || mathml_text_integration_point(name)
        || svg_html_integration_point(name)
        || (name.ns == Namespace::MathMl && &*name.local == "annotation-xml")
}

declare_tag_set!(pub list_item_scope = [default_scope] + "ol" "ul");
declare_tag_set!(pub button_scope = [default_scope] + "button");
declare_tag_set!(pub table_scope = "html" "table" "template");

/// Every element except `optgroup` and `option` bounds select scope.
pub(crate) fn select_scope(name: &QualName) -> bool {
    !(name.ns == Namespace::Html && matches!(&*name.local, "optgroup" | "option"))
}

declare_tag_set!(pub table_body_context = "tbody" "tfoot" "thead" "template" "html");
declare_tag_set!(pub table_row_context = "tr" "template" "html");
declare_tag_set!(pub td_th = "td" "th");
declare_tag_set!(pub heading_tag = "h1" "h2" "h3" "h4" "h5" "h6");

// Current nodes that send insertions to the foster parent while the
// redirect is engaged.
declare_tag_set!(pub foster_target = "table" "tbody" "tfoot" "thead" "tr");

// Current nodes for which characters in table go through table text.
declare_tag_set!(pub table_text_context = [foster_target] + "template");

declare_tag_set!(pub cursory_implied_end =
    "dd" "dt" "li" "option" "optgroup" "p" "rb" "rp" "rt" "rtc");

declare_tag_set!(pub thorough_implied_end = [cursory_implied_end]
    + "caption" "colgroup" "tbody" "td" "tfoot" "th" "thead" "tr");

declare_tag_set!(pub form_associatable =
    "button" "fieldset" "input" "object" "output" "select" "textarea" "img");

declare_tag_set!(pub listed = [form_associatable] - "img");

/// <https://html.spec.whatwg.org/#special>
pub(crate) fn special_tag(name: &QualName) -> bool {
    match name.ns {
        Namespace::Html => matches!(
            &*name.local,
            "address" | "applet" | "area" | "article" | "aside" | "base" | "basefont"
                | "bgsound" | "blockquote" | "body" | "br" | "button" | "caption" | "center"
                | "col" | "colgroup" | "dd" | "details" | "dir" | "div" | "dl" | "dt" | "embed"
                | "fieldset" | "figcaption" | "figure" | "footer" | "form" | "frame"
                | "frameset" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "header"
                | "hgroup" | "hr" | "html" | "iframe" | "img" | "input" | "isindex"
                | "keygen" | "li" | "link" | "listing" | "main" | "marquee" | "menu" | "meta"
                | "nav" | "noembed" | "noframes" | "noscript" | "object" | "ol" | "p"
                | "param" | "plaintext" | "pre" | "script" | "search" | "section" | "select"
                | "source" | "style" | "summary" | "table" | "tbody" | "td" | "template"
                | "textarea" | "tfoot" | "th" | "thead" | "title" | "tr" | "track" | "ul"
                | "wbr" | "xmp"
        ),
        Namespace::MathMl => matches!(
            &*name.local,
            "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"
        ),
        Namespace::Svg => matches!(&*name.local, "foreignObject" | "desc" | "title"),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::LocalName;

    fn svg(local: &str) -> QualName {
        QualName::new(None, Namespace::Svg, LocalName::from(local))
    }

    #[test]
    fn derived_sets() {
        assert!(button_scope(&QualName::html("button")));
        assert!(button_scope(&QualName::html("table")));
        assert!(!button_scope(&QualName::html("div")));
        assert!(thorough_implied_end(&QualName::html("tbody")));
        assert!(!cursory_implied_end(&QualName::html("tbody")));
        assert!(listed(&QualName::html("input")));
        assert!(!listed(&QualName::html("img")));
        assert!(table_text_context(&QualName::html("template")));
        assert!(table_text_context(&QualName::html("tr")));
        assert!(!foster_target(&QualName::html("template")));
    }

    #[test]
    fn newer_special_elements() {
        assert!(special_tag(&QualName::html("search")));
        assert!(special_tag(&QualName::html("keygen")));
        assert!(!special_tag(&QualName::html("span")));
    }

    #[test]
    fn namespaces_matter() {
        assert!(!table_scope(&svg("table")));
        assert!(default_scope(&svg("foreignObject")));
        assert!(special_tag(&svg("desc")));
        assert!(!special_tag(&svg("g")));
        assert!(select_scope(&svg("option")));
        assert!(!select_scope(&QualName::html("option")));
    }
}
