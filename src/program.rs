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

use crate::compile;
use crate::inst::Inst;
use crate::literals::Literals;
use crate::Error;

/// The description of one capture group in a pattern.
///
/// Group 0 always exists and denotes the whole pattern. Groups opened with
/// plain parentheses have an empty name; `(?P<name>...)` groups carry the
/// user-supplied name. Non-capturing groups have no description at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDescription {
    /// The group's name, or the empty string for unnamed groups.
    pub name: String,
    /// The character span of the group's body within the pattern text.
    pub pattern_span: (usize, usize),
}

impl GroupDescription {
    pub fn new(name: &str, pattern_span: (usize, usize)) -> GroupDescription {
        GroupDescription {
            name: name.to_string(),
            pattern_span: pattern_span,
        }
    }

    /// Returns true if this group was given a name in the pattern.
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Program represents a compiled regular expression. Once an expression is
/// compiled, its representation is immutable and will never change.
///
/// The instruction sequence has a fixed length `L`; the valid pc range
/// during execution is `[0, L]`, where `L` is the accepting terminal.
#[derive(Clone, Debug)]
pub struct Program {
    /// The original regular expression string.
    pub original: String,
    /// A sequence of instructions.
    pub insts: Vec<Inst>,
    /// The capture groups of the pattern, indexed by group id. Shared
    /// with every `Match` produced from this program.
    pub groups: Arc<Vec<GroupDescription>>,
    /// Literal prefixes extracted from the instructions, used to skip
    /// along the subject quickly when searching.
    pub prefixes: Literals,
    /// True iff the program is anchored at the beginning.
    pub anchored_begin: bool,
}

impl Program {
    /// Compiles a pattern into a program.
    pub fn new(re: &str) -> Result<Program, Error> {
        let (insts, groups) = compile::compile(re)?;
        let prefixes = Literals::extract(&insts);
        let anchored_begin = insts.first() == Some(&Inst::AssertStart);
        Ok(Program {
            original: re.to_string(),
            insts: insts,
            groups: Arc::new(groups),
            prefixes: prefixes,
            anchored_begin: anchored_begin,
        })
    }

    /// The number of capture groups, including the zeroth group.
    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }
}

impl fmt::Display for Program {
    /// Renders the instruction listing, one numbered line per instruction.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, inst) in self.insts.iter().enumerate() {
            writeln!(f, "{:4}:  {}", i, inst)?;
        }
        Ok(())
    }
}
