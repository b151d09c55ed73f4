// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A resumable HTML5 tokenizer and tree construction core.
//!
//! Tokens flow from the [`tokenizer`] into the [`tree_builder`], which
//! queues DOM mutations on its construction site and applies them through
//! a [`TreeSink`]. The [`driver`] module wraps both into a parser that can
//! be fed input incrementally and paused when a script is ready to run.

pub use markup5ever::LocalName;
pub use tendril;

pub use driver::{parse_document, parse_fragment, tokenize_approximately};
pub use driver::{ParseOpts, ParseStatus, Parser};
pub use interface::{Attribute, ElementFlags, Namespace, QualName, QuirksMode, TreeSink};
pub use util::buffer_queue::BufferQueue;
pub use util::smallcharset::SmallCharSet;

#[macro_use]
mod macros;

pub mod dom;
pub mod driver;
pub mod interface;
pub mod tokenizer;
pub mod tree_builder;
pub mod util;
