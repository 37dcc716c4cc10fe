// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Regular expressions with guaranteed linear-time matching and full
//! capture trees.
//!
//! A pattern is compiled into a flat bytecode program and executed as an
//! NFA simulation: the engine keeps a frontier of partial matches and
//! never dispatches the same (position, program-counter) pair twice.
//! Patterns that send backtracking engines into exponential blow-up, such
//! as `(a+)+b` against a long run of `a`s, complete here in time
//! proportional to the subject length times the program length.
//!
//! # Matching
//!
//! `matches` anchors at the start of the subject; `search` finds the
//! leftmost match. Both return a [`Match`], which is a *tree*: every
//! capture group that participated in the match appears as a child node,
//! once per repetition, in the order the groups were completed.
//!
//! ```
//! let pattern = retree::compile(r"(\d+)-(\d+)").unwrap();
//! let m = pattern.search("order 12-34").unwrap();
//! assert_eq!(m.text(), "12-34");
//! assert_eq!(m.span(), (6, 11));
//! let children = m.children();
//! assert_eq!(children[0].text(), "12");
//! assert_eq!(children[1].text(), "34");
//! ```
//!
//! Named groups are declared with `(?P<name>...)` and looked up with
//! [`Match::get`] / [`Match::get_all`], which search the capture tree
//! depth-first:
//!
//! ```
//! let m = retree::search(r"Name: (?P<name>\w+)", "Name: Ada")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(m.get("name").unwrap().text(), "Ada");
//! ```
//!
//! The module-level functions compile through a global cache, so calling
//! them repeatedly with the same pattern text is cheap.
//!
//! # Syntax
//!
//! Concatenation, alternation `|`, grouping `(...)`, `(?:...)`,
//! `(?P<name>...)`, the quantifiers `?`, `+`, `*` (append `?` for the
//! lazy variant), the anchors `^`, `$`, `\A`, `\Z`, the wildcard `.`
//! (which matches any character, including `\n`), the predicate escapes
//! `\d \D \s \S \w \W`, and the literal escapes `\n \t \r \0 \xHH` plus
//! backslash-escaped punctuation.
//!
//! Character classes `[...]`, bounded repetition `{m,n}`, lookaround and
//! backreferences are recognized and rejected with
//! [`Error::Unsupported`], distinct from [`Error::Syntax`] so callers can
//! route fallback logic.

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::sync::Mutex;

use lazy_static::lazy_static;

pub use crate::program::GroupDescription;
pub use crate::re::{FindMatches, GroupKey, Match, Matches, Pattern};

mod compile;
mod inst;
mod literals;
mod nfa;
mod program;
mod re;

/// An error that prevented a pattern from being compiled.
///
/// Matching itself never fails: an unmatched pattern is an absence of
/// result, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pattern is malformed. `pos` is the 1-based character position
    /// of the offending syntax.
    Syntax {
        pos: usize,
        msg: String,
    },
    /// The pattern uses a construct that is recognized but intentionally
    /// not implemented, such as `[...]` classes or backreferences.
    Unsupported {
        pos: usize,
        feature: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Syntax { pos, ref msg } => {
                write!(f, "syntax error at position {}: {}", pos, msg)
            }
            Error::Unsupported { pos, feature } => {
                write!(f, "unsupported at position {}: {}", pos, feature)
            }
        }
    }
}

impl error::Error for Error {}

/// Compiles a pattern.
pub fn compile(pattern: &str) -> Result<Pattern, Error> {
    Pattern::new(pattern)
}

lazy_static! {
    static ref CACHE: Mutex<HashMap<String, Pattern>> = Mutex::new(HashMap::new());
}

/// Compile through the global pattern cache.
fn cached_compile(pattern: &str) -> Result<Pattern, Error> {
    let mut cache = CACHE.lock().unwrap();
    if let Some(compiled) = cache.get(pattern) {
        return Ok(compiled.clone());
    }
    let compiled = Pattern::new(pattern)?;
    cache.insert(pattern.to_string(), compiled.clone());
    Ok(compiled)
}

/// Match `pattern` anchored at the start of `text`.
pub fn matches<'t>(pattern: &str, text: &'t str) -> Result<Option<Match<'t>>, Error> {
    Ok(cached_compile(pattern)?.matches(text))
}

/// Find the leftmost match of `pattern` in `text`.
pub fn search<'t>(pattern: &str, text: &'t str) -> Result<Option<Match<'t>>, Error> {
    Ok(cached_compile(pattern)?.search(text))
}

/// Iterate over the matches of `pattern` in `text`, left to right.
pub fn finditer<'t>(pattern: &str, text: &'t str) -> Result<Matches<'t>, Error> {
    Ok(Matches::new(cached_compile(pattern)?, text))
}

/// All matches of `pattern` in `text`.
pub fn findall<'t>(pattern: &str, text: &'t str) -> Result<Vec<Match<'t>>, Error> {
    Ok(cached_compile(pattern)?.findall(text))
}
