// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// Represents a set of "small characters", those with Unicode scalar
/// values less than 64.
///
/// The tokenizer uses these sets to split the input into runs of plain
/// text and single characters that need a state machine decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmallCharSet {
    pub bits: u64,
}

impl SmallCharSet {
    #[inline]
    fn contains(&self, n: u8) -> bool {
        0 != (self.bits & (1 << (n as usize)))
    }

    /// Count the number of bytes of characters at the beginning
    /// of `buf` which are not in the set.
    ///
    /// Non-ASCII bytes are never members, so the count always ends on a
    /// character boundary.
    pub fn nonmember_prefix_len(&self, buf: &str) -> u32 {
        let mut n = 0;
        for b in buf.bytes() {
            if b >= 64 || !self.contains(b) {
                n += 1;
            } else {
                break;
            }
        }
        n
    }

    /// Is `c` a member of the set?
    pub fn contains_char(&self, c: char) -> bool {
        (c as u32) < 64 && self.contains(c as u8)
    }
}
