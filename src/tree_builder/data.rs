// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! DOCTYPE conformance and quirks mode selection.

use crate::interface::{LimitedQuirks, NoQuirks, Quirks, QuirksMode};
use crate::tokenizer::Doctype;

use tendril::StrTendril;

// These should all be lowercase, for ASCII-case-insensitive matching.
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

const QUIRKY_PUBLIC_MATCHES: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const QUIRKY_SYSTEM_MATCHES: &[&str] = &[
    "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd",
];

const LIMITED_QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

const HTML4_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

fn opt_eq(s: &Option<StrTendril>, expected: &str) -> bool {
    s.as_deref().map_or(expected.is_empty(), |s| s == expected)
}

fn is_doctype_ok(doctype: &Doctype) -> bool {
    let public = &doctype.public_id;
    let system = &doctype.system_id;
    let has_system_id = system.is_some();

    if !opt_eq(&doctype.name, "html") {
        false
    } else if public.is_none() {
        !has_system_id || opt_eq(system, "about:legacy-compat")
    } else if opt_eq(public, "-//W3C//DTD HTML 4.0//EN") {
        !has_system_id || opt_eq(system, "http://www.w3.org/TR/REC-html40/strict.dtd")
    } else if opt_eq(public, "-//W3C//DTD HTML 4.01//EN") {
        !has_system_id || opt_eq(system, "http://www.w3.org/TR/html4/strict.dtd")
    } else if opt_eq(public, "-//W3C//DTD XHTML 1.0 Strict//EN") {
        opt_eq(system, "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd")
    } else if opt_eq(public, "-//W3C//DTD XHTML 1.1//EN") {
        opt_eq(system, "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd")
    } else {
        false
    }
}

// Quirks-mode matches are ASCII case-insensitive.
fn matches_any(haystack: &[&str], needle: &str) -> bool {
    haystack.iter().any(|x| needle.eq_ignore_ascii_case(x))
}

fn has_any_prefix(haystack: &[&str], needle: &str) -> bool {
    haystack.iter().any(|x| {
        needle
            .get(..x.len())
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(x))
    })
}

/// Is this DOCTYPE a parse error, and which quirks mode does it select?
pub(crate) fn doctype_error_and_quirks(doctype: &Doctype, iframe_srcdoc: bool) -> (bool, QuirksMode) {
    let err = !is_doctype_ok(doctype);

    let public = doctype.public_id.as_deref();
    let system = doctype.system_id.as_deref();

    let quirk = match (public, system) {
        _ if doctype.force_quirks => Quirks,
        _ if !opt_eq(&doctype.name, "html") => Quirks,

        _ if iframe_srcdoc => NoQuirks,

        (Some(p), _) if matches_any(QUIRKY_PUBLIC_MATCHES, p) => Quirks,
        (_, Some(s)) if matches_any(QUIRKY_SYSTEM_MATCHES, s) => Quirks,

        (Some(p), _) if has_any_prefix(QUIRKY_PUBLIC_PREFIXES, p) => Quirks,
        (Some(p), _) if has_any_prefix(LIMITED_QUIRKY_PUBLIC_PREFIXES, p) => LimitedQuirks,

        (Some(p), s) if has_any_prefix(HTML4_PUBLIC_PREFIXES, p) => match s {
            None => Quirks,
            Some(_) => LimitedQuirks,
        },

        _ => NoQuirks,
    };

    (err, quirk)
}

#[cfg(test)]
mod test {
    use super::*;

    fn doctype(name: &str, public: Option<&str>, system: Option<&str>) -> Doctype {
        Doctype {
            name: Some(StrTendril::from_slice(name)),
            public_id: public.map(StrTendril::from_slice),
            system_id: system.map(StrTendril::from_slice),
            force_quirks: false,
        }
    }

    #[test]
    fn html5_doctype_is_standards_mode() {
        assert_eq!(doctype_error_and_quirks(&doctype("html", None, None), false), (false, NoQuirks));
    }

    #[test]
    fn legacy_public_ids() {
        let d = doctype("html", Some("-//W3C//DTD HTML 4.01 Transitional//EN"), None);
        assert_eq!(doctype_error_and_quirks(&d, false), (true, Quirks));

        let d = doctype(
            "html",
            Some("-//W3C//DTD HTML 4.01 Transitional//EN"),
            Some("http://www.w3.org/TR/html4/loose.dtd"),
        );
        assert_eq!(doctype_error_and_quirks(&d, false).1, LimitedQuirks);

        let d = doctype("html", Some("-//IETF//DTD HTML 2.0//EN"), None);
        assert_eq!(doctype_error_and_quirks(&d, false).1, Quirks);
    }

    #[test]
    fn prefix_match_ignores_case() {
        let d = doctype("html", Some("-//w3c//DTD XHTML 1.0 TRANSITIONAL//en"), None);
        assert_eq!(doctype_error_and_quirks(&d, false).1, LimitedQuirks);
    }

    #[test]
    fn srcdoc_skips_public_id_checks() {
        let d = doctype("html", Some("html"), None);
        assert_eq!(doctype_error_and_quirks(&d, false).1, Quirks);
        assert_eq!(doctype_error_and_quirks(&d, true).1, NoQuirks);
    }

    #[test]
    fn force_quirks_wins() {
        let mut d = doctype("html", None, None);
        d.force_quirks = true;
        assert_eq!(doctype_error_and_quirks(&d, true).1, Quirks);
    }
}
