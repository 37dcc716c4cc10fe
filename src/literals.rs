// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use aho_corasick::{AhoCorasick, MatchKind};
use memchr::memchr;
use memchr::memmem;

use crate::inst::Inst;

// Give up on prefix extraction past these budgets; a huge literal set
// costs more to scan with than it saves.
const NUM_PREFIX_LIMIT: usize = 30;
const PREFIX_BYTE_LIMIT: usize = 250;

/// A prefix extracted from a compiled regular expression.
///
/// A regex prefix is a set of literal strings such that every match of the
/// regex starts with one of them. `search` uses it to skip directly to the
/// next candidate position instead of attempting a match at every offset.
///
/// Scanning strategy depends on what was extracted:
///
/// 1. A single one-byte literal: `memchr`.
/// 2. A single longer literal: a substring search.
/// 3. Several literals: an Aho-Corasick automaton, built leftmost-first
///    because skipping needs the earliest candidate *start*. (The default
///    match kind reports the earliest *end*, which may skip over a longer
///    literal that starts sooner.)
#[derive(Clone, Debug)]
pub struct Literals {
    matcher: LiteralMatcher,
}

#[derive(Clone, Debug)]
enum LiteralMatcher {
    /// No prefixes; never advances through the input.
    Empty,
    /// A single byte prefix.
    Byte(u8),
    /// A single multi-byte literal.
    Single(Vec<u8>),
    /// Two or more literals.
    Automaton(AhoCorasick),
}

impl Literals {
    /// Returns a matcher that never matches and never advances the input.
    pub fn empty() -> Literals {
        Literals {
            matcher: LiteralMatcher::Empty,
        }
    }

    /// Extract the required literal prefixes of a program.
    ///
    /// Walks the instructions from pc 0, forking at splits, skipping group
    /// markers and following jumps, and gathers the characters each path
    /// must begin with. If any path reaches a non-literal instruction (or
    /// the accepting terminal) before contributing a single character,
    /// then nothing can be concluded about the program's prefixes and the
    /// empty matcher is returned.
    pub fn extract(insts: &[Inst]) -> Literals {
        let mut literals: Vec<Vec<u8>> = vec![];
        let mut total_bytes = 0;
        let mut stack = vec![0];
        let mut seen = vec![false; insts.len() + 1];
        while let Some(pc) = stack.pop() {
            let pc = skip_markers(insts, pc);
            if seen[pc] {
                continue;
            }
            seen[pc] = true;
            match insts.get(pc) {
                Some(&Inst::Split(off)) | Some(&Inst::SplitAfter(off)) => {
                    stack.push(target(pc, off));
                    stack.push(pc + 1);
                }
                _ => {
                    let lit = required_literal(insts, pc);
                    if lit.is_empty() {
                        // This path can match without any particular
                        // leading text, so skipping is never sound.
                        return Literals::empty();
                    }
                    total_bytes += lit.len();
                    literals.push(lit);
                    if literals.len() > NUM_PREFIX_LIMIT
                        || total_bytes > PREFIX_BYTE_LIMIT
                    {
                        return Literals::empty();
                    }
                }
            }
        }
        Literals::new(literals)
    }

    fn new(mut literals: Vec<Vec<u8>>) -> Literals {
        literals.sort();
        literals.dedup();
        let matcher = match literals.len() {
            0 => LiteralMatcher::Empty,
            1 if literals[0].len() == 1 => LiteralMatcher::Byte(literals[0][0]),
            1 => LiteralMatcher::Single(literals.pop().unwrap()),
            _ => {
                let built = AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostFirst)
                    .build(&literals);
                match built {
                    Ok(automaton) => LiteralMatcher::Automaton(automaton),
                    Err(_) => LiteralMatcher::Empty,
                }
            }
        };
        Literals { matcher: matcher }
    }

    /// Find the start of the earliest prefix occurrence in `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self.matcher {
            LiteralMatcher::Empty => None,
            LiteralMatcher::Byte(b) => memchr(b, haystack),
            LiteralMatcher::Single(ref lit) => memmem::find(haystack, lit),
            LiteralMatcher::Automaton(ref automaton) => {
                automaton.find(haystack).map(|m| m.start())
            }
        }
    }

    /// Returns true iff no prefixes were extracted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of prefixes in this machine.
    pub fn len(&self) -> usize {
        match self.matcher {
            LiteralMatcher::Empty => 0,
            LiteralMatcher::Byte(_) | LiteralMatcher::Single(_) => 1,
            LiteralMatcher::Automaton(ref automaton) => automaton.patterns_len(),
        }
    }
}

/// Step over instructions that never consume input and never branch:
/// group markers, forward jumps and the start anchor.
fn skip_markers(insts: &[Inst], mut pc: usize) -> usize {
    loop {
        match insts.get(pc) {
            Some(&Inst::StartGroup(_))
            | Some(&Inst::EndGroup)
            | Some(&Inst::AssertStart) => pc += 1,
            Some(&Inst::Jump(off)) => pc = target(pc, off),
            _ => return pc,
        }
    }
}

/// Collect the literal characters every execution from `pc` must consume,
/// stopping at the first instruction that is not a plain character.
fn required_literal(insts: &[Inst], mut pc: usize) -> Vec<u8> {
    let mut lit = vec![];
    loop {
        pc = skip_markers(insts, pc);
        match insts.get(pc) {
            Some(&Inst::Char(c)) => {
                let mut buf = [0; 4];
                lit.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                pc += 1;
            }
            _ => return lit,
        }
    }
}

/// The absolute branch target of the instruction at `pc`, whose offset is
/// relative to the post-increment pc.
fn target(pc: usize, off: isize) -> usize {
    (pc as isize + 1 + off) as usize
}
