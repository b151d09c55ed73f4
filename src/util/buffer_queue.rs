// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The [`BufferQueue`] struct and helper types.
//!
//! A `BufferQueue` is the tokenizer's input cursor. Input arrives in
//! chunks, possibly split at arbitrary character boundaries, and is
//! consumed one character (or one run of uninteresting characters) at a
//! time. Characters the tokenizer looked ahead at but could not use can be
//! pushed back onto the front of the queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::mem;

use tendril::StrTendril;

pub use self::SetResult::{FromSet, NotFromSet};
use crate::util::smallcharset::SmallCharSet;

/// Result from [`BufferQueue::pop_except_from`] containing either a character
/// from a [`SmallCharSet`], or a string buffer of characters not from the set.
#[derive(PartialEq, Eq, Debug)]
pub enum SetResult {
    /// A character from the `SmallCharSet`.
    FromSet(char),
    /// A block of text containing no characters from the `SmallCharSet`.
    NotFromSet(StrTendril),
}

/// A queue of owned string buffers, which supports incrementally consuming
/// characters.
///
/// All methods take `&self`, so the queue can be shared with a tokenizer
/// whose sink re-enters the parser.
#[derive(Debug)]
pub struct BufferQueue {
    /// Buffers to process. Invariant: no buffer is empty.
    buffers: RefCell<VecDeque<StrTendril>>,
}

impl Default for BufferQueue {
    fn default() -> Self {
        BufferQueue {
            buffers: RefCell::new(VecDeque::with_capacity(16)),
        }
    }
}

impl BufferQueue {
    /// Returns whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.borrow().is_empty()
    }

    /// Get the buffer at the beginning of the queue.
    #[inline]
    pub fn pop_front(&self) -> Option<StrTendril> {
        self.buffers.borrow_mut().pop_front()
    }

    /// Add a buffer to the beginning of the queue.
    ///
    /// If the buffer is empty, it will be skipped.
    pub fn push_front(&self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.buffers.borrow_mut().push_front(buf);
    }

    /// Add a buffer to the end of the queue.
    ///
    /// If the buffer is empty, it will be skipped.
    pub fn push_back(&self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.buffers.borrow_mut().push_back(buf);
    }

    /// Move every buffer of `other` to the end of this queue.
    pub fn append(&self, other: &BufferQueue) {
        let taken = mem::take(&mut *other.buffers.borrow_mut());
        self.buffers.borrow_mut().extend(taken);
    }

    /// Total number of bytes still queued.
    pub fn len_bytes(&self) -> usize {
        self.buffers.borrow().iter().map(|b| b.len()).sum()
    }

    /// Look at the next available character without removing it, if the
    /// queue is not empty.
    pub fn peek(&self) -> Option<char> {
        debug_assert!(
            !self.buffers.borrow().iter().any(|el| el.len32() == 0),
            "invariant \"all buffers in the queue are non-empty\" failed"
        );
        self.buffers
            .borrow()
            .front()
            .and_then(|b| b.chars().next())
    }

    /// Pops and returns the next character, if one is available.
    pub fn next(&self) -> Option<char> {
        let mut buffers = self.buffers.borrow_mut();
        let (result, now_empty) = match buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let c = buf.pop_front_char();
                (c, buf.is_empty())
            },
        };

        if now_empty {
            buffers.pop_front();
        }

        result
    }

    /// Pops and returns either a single character from the given set, or
    /// a buffer of characters none of which are in the set.
    pub fn pop_except_from(&self, set: SmallCharSet) -> Option<SetResult> {
        let mut buffers = self.buffers.borrow_mut();
        let (result, now_empty) = match buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let n = set.nonmember_prefix_len(buf);
                if n > 0 {
                    let out = buf.subtendril(0, n);
                    buf.pop_front(n);
                    (Some(NotFromSet(out)), buf.is_empty())
                } else {
                    let c = buf.pop_front_char();
                    (c.map(FromSet), buf.is_empty())
                }
            },
        };

        // Unborrow self for this part.
        if now_empty {
            buffers.pop_front();
        }

        result
    }

    /// Consume bytes matching the pattern, using a custom comparison function `eq`.
    ///
    /// Returns `Some(true)` if there is a match, `Some(false)` if there is no
    /// match, or `None` if it wasn't possible to know (more data is needed).
    ///
    /// The custom comparison function is used elsewhere to compare ASCII
    /// case-insensitively.
    pub fn eat<F: Fn(&u8, &u8) -> bool>(&self, pat: &str, eq: F) -> Option<bool> {
        let mut buffers_exhausted = 0;
        let mut consumed_from_last = 0;

        {
            let buffers = self.buffers.borrow();
            buffers.front()?;

            for pattern_byte in pat.bytes() {
                if buffers_exhausted >= buffers.len() {
                    return None;
                }
                let buf = &buffers[buffers_exhausted];

                if !eq(&buf.as_bytes()[consumed_from_last], &pattern_byte) {
                    return Some(false);
                }

                consumed_from_last += 1;
                if consumed_from_last >= buf.len() {
                    buffers_exhausted += 1;
                    consumed_from_last = 0;
                }
            }
        }

        // We have a match. Commit changes to the BufferQueue.
        let mut buffers = self.buffers.borrow_mut();
        for _ in 0..buffers_exhausted {
            buffers.pop_front();
        }

        match buffers.front_mut() {
            None => assert_eq!(consumed_from_last, 0),
            Some(buf) => buf.pop_front(consumed_from_last as u32),
        }

        Some(true)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use tendril::SliceExt;

    use super::BufferQueue;
    use super::SetResult::{FromSet, NotFromSet};

    #[test]
    fn smoke_test() {
        let bq = BufferQueue::default();
        assert_eq!(bq.peek(), None);
        assert_eq!(bq.next(), None);

        bq.push_back("abc".to_tendril());
        assert_eq!(bq.peek(), Some('a'));
        assert_eq!(bq.next(), Some('a'));
        assert_eq!(bq.peek(), Some('b'));
        assert_eq!(bq.peek(), Some('b'));
        assert_eq!(bq.next(), Some('b'));
        assert_eq!(bq.peek(), Some('c'));
        assert_eq!(bq.next(), Some('c'));
        assert_eq!(bq.peek(), None);
        assert_eq!(bq.next(), None);
    }

    #[test]
    fn can_unconsume() {
        let bq = BufferQueue::default();
        bq.push_back("abc".to_tendril());
        assert_eq!(bq.next(), Some('a'));

        bq.push_front("xy".to_tendril());
        assert_eq!(bq.next(), Some('x'));
        assert_eq!(bq.next(), Some('y'));
        assert_eq!(bq.next(), Some('b'));
        assert_eq!(bq.next(), Some('c'));
        assert_eq!(bq.next(), None);
    }

    #[test]
    fn can_pop_except_set() {
        let bq = BufferQueue::default();
        bq.push_back("abc&def".to_tendril());
        let pop = || bq.pop_except_from(small_char_set!('&'));
        assert_eq!(pop(), Some(NotFromSet("abc".to_tendril())));
        assert_eq!(pop(), Some(FromSet('&')));
        assert_eq!(pop(), Some(NotFromSet("def".to_tendril())));
        assert_eq!(pop(), None);
    }

    #[test]
    fn can_eat() {
        // This is not very comprehensive.  We rely on the tokenizer
        // integration tests for more thorough testing with many
        // different input buffer splits.
        let bq = BufferQueue::default();
        bq.push_back("a".to_tendril());
        bq.push_back("bc".to_tendril());
        assert_eq!(bq.eat("abcd", u8::eq_ignore_ascii_case), None);
        assert_eq!(bq.eat("ax", u8::eq_ignore_ascii_case), Some(false));
        assert_eq!(bq.eat("ab", u8::eq_ignore_ascii_case), Some(true));
        assert_eq!(bq.next(), Some('c'));
        assert_eq!(bq.next(), None);
    }

    #[test]
    fn empty_buffers_are_skipped() {
        let bq = BufferQueue::default();
        bq.push_back("".to_tendril());
        bq.push_front("".to_tendril());
        assert!(bq.is_empty());
        assert_eq!(bq.len_bytes(), 0);
    }

    #[test]
    fn append_moves_buffers() {
        let a = BufferQueue::default();
        let b = BufferQueue::default();
        a.push_back("x".to_tendril());
        b.push_back("yz".to_tendril());
        a.append(&b);
        assert!(b.is_empty());
        assert_eq!(a.len_bytes(), 3);
        assert_eq!(a.next(), Some('x'));
        assert_eq!(a.next(), Some('y'));
    }
}
