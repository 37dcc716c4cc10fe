// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::sync::Arc;

use crate::nfa::{GroupMatch, Nfa};
use crate::program::{GroupDescription, Program};
use crate::Error;

/// A compiled regular expression.
///
/// A `Pattern` is immutable once compiled and can be shared freely across
/// threads; every match call builds its own executor state.
#[derive(Clone, Debug)]
pub struct Pattern {
    prog: Program,
}

impl Pattern {
    /// Compiles a pattern, reporting syntax and unsupported-construct
    /// errors with their 1-based position in the pattern text.
    pub fn new(re: &str) -> Result<Pattern, Error> {
        Ok(Pattern {
            prog: Program::new(re)?,
        })
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.prog.original
    }

    /// The pattern's capture groups, indexed by group id. Group 0 is the
    /// whole pattern.
    pub fn groups(&self) -> &[GroupDescription] {
        &self.prog.groups
    }

    /// Returns true if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.search(text).is_some()
    }

    /// Match anchored at the start of `text`.
    pub fn matches<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.matches_at(text, 0)
    }

    /// Match anchored at byte offset `start` (which must lie on a
    /// character boundary). A single execution; no scanning.
    pub fn matches_at<'t>(&self, text: &'t str, start: usize) -> Option<Match<'t>> {
        let root = Nfa::exec(&self.prog, text, start)?;
        Some(Match::new(root, text, self.prog.groups.clone()))
    }

    /// Find the leftmost match in `text`.
    pub fn search<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.search_range(text, 0, text.len())
    }

    /// Find the leftmost match starting in `lo..=hi`. Each start position
    /// is tried with a fresh execution, low to high; anchored programs and
    /// extracted prefix literals prune starts that cannot match.
    pub fn search_range<'t>(
        &self,
        text: &'t str,
        lo: usize,
        hi: usize,
    ) -> Option<Match<'t>> {
        let mut start = lo;
        loop {
            if start > hi || start > text.len() {
                return None;
            }
            if self.prog.anchored_begin && start > 0 {
                return None;
            }
            if !self.prog.prefixes.is_empty() {
                match self.prog.prefixes.find(text[start..].as_bytes()) {
                    None => return None,
                    Some(i) => start += i,
                }
                if start > hi {
                    return None;
                }
            }
            if let Some(m) = self.matches_at(text, start) {
                return Some(m);
            }
            start = next_start(text, start);
        }
    }

    /// An iterator over the matches in `text`, left to right. After a
    /// match starting at `s`, the scan resumes one character past `s`, so
    /// zero-width matches still make progress.
    pub fn finditer<'r, 't>(&'r self, text: &'t str) -> FindMatches<'r, 't> {
        FindMatches {
            pattern: self,
            text: text,
            next_start: 0,
            done: false,
        }
    }

    /// All matches in `text`, materialized.
    pub fn findall<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        self.finditer(text).collect()
    }

    /// Like `matches_at`, but records the program listing and a line per
    /// instruction dispatch; returns the log alongside the result.
    pub fn matches_traced<'t>(
        &self,
        text: &'t str,
        start: usize,
    ) -> (Option<Match<'t>>, String) {
        let mut nfa = Nfa::with_trace(&self.prog, text);
        nfa.start_at(start);
        let root = nfa.run();
        let log = nfa.take_trace();
        let m = root.map(|r| Match::new(r, text, self.prog.groups.clone()));
        (m, log)
    }

    /// The length of the compiled program.
    ///
    /// N.B. This is exported for use in testing.
    #[doc(hidden)]
    pub fn num_insts(&self) -> usize {
        self.prog.insts.len()
    }

    /// Like `matches_at`, but also reports the number of instruction
    /// dispatches the execution took.
    ///
    /// N.B. This is exported for use in testing.
    #[doc(hidden)]
    pub fn matches_with_steps<'t>(
        &self,
        text: &'t str,
        start: usize,
    ) -> (Option<Match<'t>>, usize) {
        let mut nfa = Nfa::new(&self.prog, text);
        nfa.start_at(start);
        let root = nfa.run();
        let steps = nfa.steps();
        let m = root.map(|r| Match::new(r, text, self.prog.groups.clone()));
        (m, steps)
    }
}

/// Advance to the next character boundary after `start`.
fn next_start(text: &str, start: usize) -> usize {
    match text[start..].chars().next() {
        Some(c) => start + c.len_utf8(),
        None => start + 1,
    }
}

/// One match of a pattern: a node in the capture tree.
///
/// The root corresponds to group 0 (the whole match); `children` holds the
/// captures closed while this group was open, in completion order, each of
/// them a `Match` over the same subject.
#[derive(Clone, Debug)]
pub struct Match<'t> {
    subject: &'t str,
    node: GroupMatch,
    groups: Arc<Vec<GroupDescription>>,
}

impl<'t> Match<'t> {
    fn new(
        node: GroupMatch,
        subject: &'t str,
        groups: Arc<Vec<GroupDescription>>,
    ) -> Match<'t> {
        Match {
            subject: subject,
            node: node,
            groups: groups,
        }
    }

    /// The matched byte span within the subject.
    pub fn span(&self) -> (usize, usize) {
        self.node.span
    }

    /// The id of the capture group this node belongs to.
    pub fn group_id(&self) -> usize {
        self.node.group_id
    }

    /// The group's name; empty for unnamed groups.
    pub fn group_name(&self) -> &str {
        &self.groups[self.node.group_id].name
    }

    /// The description of this node's group.
    pub fn group(&self) -> &GroupDescription {
        &self.groups[self.node.group_id]
    }

    /// The matched text.
    pub fn text(&self) -> &'t str {
        let (start, end) = self.node.span;
        &self.subject[start..end]
    }

    /// The captures closed inside this one, in completion order.
    pub fn children(&self) -> Vec<Match<'t>> {
        self.node
            .sub_matches
            .iter()
            .map(|node| Match::new(node.clone(), self.subject, self.groups.clone()))
            .collect()
    }

    /// The first capture under this node matching `key`, depth first.
    /// The key may be a group id, a group name, or a `GroupDescription`.
    pub fn get<'k, K: Into<GroupKey<'k>>>(&self, key: K) -> Option<Match<'t>> {
        self.find_first(&key.into())
    }

    /// Every capture under this node matching `key`, depth first.
    pub fn get_all<'k, K: Into<GroupKey<'k>>>(&self, key: K) -> Vec<Match<'t>> {
        let key = key.into();
        let mut found = vec![];
        self.collect_all(&key, &mut found);
        found
    }

    fn find_first(&self, key: &GroupKey) -> Option<Match<'t>> {
        for child in self.children() {
            if child.matches_key(key) {
                return Some(child);
            }
            if let Some(found) = child.find_first(key) {
                return Some(found);
            }
        }
        None
    }

    fn collect_all(&self, key: &GroupKey, found: &mut Vec<Match<'t>>) {
        for child in self.children() {
            if child.matches_key(key) {
                found.push(child.clone());
            }
            child.collect_all(key, found);
        }
    }

    fn matches_key(&self, key: &GroupKey) -> bool {
        match *key {
            GroupKey::Id(id) => self.node.group_id == id,
            GroupKey::Name(name) => self.group_name() == name,
            GroupKey::Desc(desc) => self.group() == desc,
        }
    }
}

impl<'t> fmt::Display for Match<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// A key identifying a capture group: by id, by name, or by description.
#[derive(Clone, Copy, Debug)]
pub enum GroupKey<'a> {
    Id(usize),
    Name(&'a str),
    Desc(&'a GroupDescription),
}

impl From<usize> for GroupKey<'static> {
    fn from(id: usize) -> GroupKey<'static> {
        GroupKey::Id(id)
    }
}

impl<'a> From<&'a str> for GroupKey<'a> {
    fn from(name: &'a str) -> GroupKey<'a> {
        GroupKey::Name(name)
    }
}

impl<'a> From<&'a GroupDescription> for GroupKey<'a> {
    fn from(desc: &'a GroupDescription) -> GroupKey<'a> {
        GroupKey::Desc(desc)
    }
}

/// An iterator over successive matches of a pattern in a subject.
#[derive(Debug)]
pub struct FindMatches<'r, 't> {
    pattern: &'r Pattern,
    text: &'t str,
    next_start: usize,
    done: bool,
}

impl<'r, 't> Iterator for FindMatches<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.done {
            return None;
        }
        match self.pattern.search_range(self.text, self.next_start, self.text.len()) {
            None => {
                self.done = true;
                None
            }
            Some(m) => {
                self.next_start = next_start(self.text, m.span().0);
                Some(m)
            }
        }
    }
}

/// Like `FindMatches`, but owns its pattern; this is what the module-level
/// `finditer` hands back.
#[derive(Debug)]
pub struct Matches<'t> {
    pattern: Pattern,
    text: &'t str,
    next_start: usize,
    done: bool,
}

impl<'t> Matches<'t> {
    pub(crate) fn new(pattern: Pattern, text: &'t str) -> Matches<'t> {
        Matches {
            pattern: pattern,
            text: text,
            next_start: 0,
            done: false,
        }
    }
}

impl<'t> Iterator for Matches<'t> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.done {
            return None;
        }
        match self.pattern.search_range(self.text, self.next_start, self.text.len()) {
            None => {
                self.done = true;
                None
            }
            Some(m) => {
                self.next_start = next_start(self.text, m.span().0);
                Some(m)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Pattern;

    fn pat(re: &str) -> Pattern {
        Pattern::new(re).unwrap()
    }

    #[test]
    fn search_is_leftmost() {
        let p = pat("b+");
        let m = p.search("aabbbab").unwrap();
        assert_eq!(m.span(), (2, 5));
    }

    #[test]
    fn search_range_respects_bounds() {
        let p = pat("a");
        assert!(p.search_range("bba", 0, 1).is_none());
        assert_eq!(p.search_range("bba", 0, 2).unwrap().span(), (2, 3));
        assert!(p.search_range("abb", 1, 3).is_none());
    }

    #[test]
    fn anchored_search_only_tries_the_start() {
        let p = pat("^b");
        assert!(p.search("ab").is_none());
        assert_eq!(p.search("ba").unwrap().span(), (0, 1));
        assert!(p.search_range("ba", 1, 2).is_none());
    }

    #[test]
    fn prefix_literals_accelerate_but_do_not_change_results() {
        // `foo\d` has the required prefix "foo"; the scan must still
        // verify the full pattern at each candidate.
        let p = pat(r"foo\d");
        let m = p.search("xx foox foo7").unwrap();
        assert_eq!(m.span(), (8, 12));
        assert!(p.search("foox foox").is_none());
    }

    #[test]
    fn finditer_advances_past_each_start() {
        let p = pat("a+");
        let spans: Vec<_> = p.finditer("aa b aaa").map(|m| m.span()).collect();
        assert_eq!(spans, vec![(0, 2), (1, 2), (5, 8), (6, 8), (7, 8)]);
    }

    #[test]
    fn finditer_makes_progress_on_zero_width_matches() {
        let p = pat("a*");
        let spans: Vec<_> = p.finditer("ab").map(|m| m.span()).collect();
        assert_eq!(spans, vec![(0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn findall_equals_finditer() {
        let p = pat(r"\w+");
        let text = "one two three";
        let from_iter: Vec<_> = p.finditer(text).map(|m| m.span()).collect();
        let from_all: Vec<_> = p.findall(text).iter().map(|m| m.span()).collect();
        assert_eq!(from_iter, from_all);
    }

    #[test]
    fn match_text_and_display() {
        let p = pat(r"\d+");
        assert_eq!(p.as_str(), r"\d+");
        let m = p.search("abc 123 def").unwrap();
        assert_eq!(m.text(), "123");
        assert_eq!(m.to_string(), "123");
        assert_eq!(m.group_id(), 0);
        assert_eq!(m.group_name(), "");
    }

    #[test]
    fn lookup_by_id_name_and_description() {
        let p = pat(r"(?P<key>\w+)=(?P<value>\w+)");
        let m = p.matches("size=10").unwrap();
        assert_eq!(m.get("key").unwrap().text(), "size");
        assert_eq!(m.get("value").unwrap().text(), "10");
        assert_eq!(m.get(1usize).unwrap().text(), "size");
        assert_eq!(m.get(2usize).unwrap().text(), "10");
        let desc = &p.groups()[2];
        assert_eq!(m.get(desc).unwrap().text(), "10");
        assert!(m.get("missing").is_none());
    }

    #[test]
    fn get_all_is_depth_first_over_children() {
        let p = pat(r"((\d)(\d))(\d)");
        let m = p.matches("123").unwrap();
        let digits: Vec<_> = m.get_all(2usize).iter().map(|d| d.text()).collect();
        assert_eq!(digits, vec!["1"]);
        let spans: Vec<_> = m.children().iter().map(|c| c.group_id()).collect();
        assert_eq!(spans, vec![1, 4]);
    }

    #[test]
    fn repeated_named_group_collects_every_capture() {
        let p = pat(r"(?:(?P<ch>a)|b)+");
        let m = p.matches("abaa").unwrap();
        let all: Vec<_> = m.get_all("ch").iter().map(|c| c.span()).collect();
        assert_eq!(all, vec![(0, 1), (2, 3), (3, 4)]);
    }

    #[test]
    fn is_match_searches() {
        let p = pat("b");
        assert!(p.is_match("ab"));
        assert!(!p.is_match("ac"));
    }

    #[test]
    fn traced_match_logs_the_execution() {
        let p = pat("a+");
        let (m, log) = p.matches_traced("aa", 0);
        assert!(m.is_some());
        assert!(log.contains("Program listing"));
        assert!(log.contains("char 'a'"));
    }
}
