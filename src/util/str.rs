// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

pub fn to_escaped_string<T: fmt::Debug>(x: &T) -> String {
    // FIXME: don't allocate twice
    let string = format!("{x:?}");
    string.chars().flat_map(|c| c.escape_default()).collect()
}

/// If `c` is an ASCII letter, return the corresponding lowercase
/// letter, otherwise None.
pub fn lower_ascii_letter(c: char) -> Option<char> {
    match c {
        'a'..='z' => Some(c),
        'A'..='Z' => Some((c as u8 - b'A' + b'a') as char),
        _ => None,
    }
}

/// HTML whitespace: tab, line feed, form feed, carriage return, space.
pub fn is_ascii_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\r' | '\n' | '\x0C' | ' ')
}

pub fn is_ascii_alnum(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Is every character of `s` HTML whitespace? True for the empty string.
pub fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(is_ascii_whitespace)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::{is_all_whitespace, is_ascii_alnum, is_ascii_whitespace, lower_ascii_letter};
    use mac::test_eq;

    test_eq!(lower_letter_a_is_a, lower_ascii_letter('a'), Some('a'));
    test_eq!(lower_letter_A_is_a, lower_ascii_letter('A'), Some('a'));
    test_eq!(lower_letter_symbol_is_None, lower_ascii_letter('!'), None);
    test_eq!(lower_letter_nonascii_is_None, lower_ascii_letter('\u{a66e}'), None);

    test_eq!(is_alnum_a, is_ascii_alnum('a'), true);
    test_eq!(is_alnum_A, is_ascii_alnum('A'), true);
    test_eq!(is_alnum_1, is_ascii_alnum('1'), true);
    test_eq!(is_not_alnum_symbol, is_ascii_alnum('!'), false);
    test_eq!(is_not_alnum_nonascii, is_ascii_alnum('\u{a66e}'), false);

    test_eq!(form_feed_is_whitespace, is_ascii_whitespace('\x0C'), true);
    test_eq!(vertical_tab_is_not_whitespace, is_ascii_whitespace('\x0B'), false);
    test_eq!(nbsp_is_not_whitespace, is_ascii_whitespace('\u{a0}'), false);

    test_eq!(empty_is_all_whitespace, is_all_whitespace(""), true);
    test_eq!(mixed_is_not_all_whitespace, is_all_whitespace(" x "), false);
}
