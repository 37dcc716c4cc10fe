// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::inst::{Inst, Predicate};
use crate::program::GroupDescription;
use crate::Error;

/// The compiler: a recursive-descent parser over the pattern text that
/// emits instructions directly, one concatenable sequence per production.
///
/// The grammar:
///
/// ```text
/// expression := serial ("|" serial)*
/// serial     := single*
/// single     := atomic (quantifier "?"?)*
/// quantifier := "?" | "+" | "*"
/// atomic     := group | escape | "^" | "$" | "." | literal-char
/// group      := "(" ("?:" | "?P<" name ">")? expression ")"
/// ```
///
/// Branch offsets are relative, so every helper returns a self-contained
/// `Vec<Inst>` that callers splice together without fixups.
pub struct Compiler {
    chars: Vec<char>,
    pos: usize,
    groups: Vec<GroupDescription>,
}

/// Compile a pattern into an instruction sequence and its group table.
///
/// Group 0 is always present and describes the whole pattern. Errors carry
/// the 1-based character position of the offending syntax.
pub fn compile(pattern: &str) -> Result<(Vec<Inst>, Vec<GroupDescription>), Error> {
    let mut compiler = Compiler::new(pattern);
    let insts = compiler.expression()?;
    if compiler.peek().is_some() {
        // The only way expression() stops early is an unbalanced ')'.
        return compiler.err(compiler.pos, "unmatched closing parenthesis");
    }
    Ok((insts, compiler.groups))
}

impl Compiler {
    fn new(pattern: &str) -> Compiler {
        let chars: Vec<char> = pattern.chars().collect();
        let len = chars.len();
        Compiler {
            chars: chars,
            pos: 0,
            groups: vec![GroupDescription::new("", (0, len))],
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).cloned()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Report a syntax error at the given 0-based character position.
    fn err<T>(&self, pos: usize, msg: &str) -> Result<T, Error> {
        Err(Error::Syntax {
            pos: pos + 1,
            msg: msg.to_string(),
        })
    }

    /// Report a recognized-but-unimplemented construct.
    fn unsupported<T>(&self, pos: usize, feature: &'static str) -> Result<T, Error> {
        Err(Error::Unsupported {
            pos: pos + 1,
            feature: feature,
        })
    }

    fn expression(&mut self) -> Result<Vec<Inst>, Error> {
        let mut branches = vec![self.serial()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.serial()?);
        }
        if branches.len() == 1 {
            return Ok(branches.pop().unwrap());
        }

        // Every branch but the last jumps over the branches that follow it.
        let k = branches.len();
        let mut tail_len = branches[k - 1].len();
        for j in (0..k - 1).rev() {
            branches[j].push(Inst::Jump(tail_len as isize));
            tail_len += branches[j].len();
        }

        // k-1 splits at the head, each parking one alternative branch. The
        // frontier is a stack, so the heads target the branches in reverse:
        // falling through every split reaches branch 1, and once a branch
        // dies the parked states pop in pattern order 2, 3, ... k.
        let mut starts = Vec::with_capacity(k);
        let mut at = k - 1;
        for branch in &branches {
            starts.push(at);
            at += branch.len();
        }
        let mut program = Vec::with_capacity(at);
        for i in 1..k {
            program.push(Inst::Split(starts[k - i] as isize - i as isize));
        }
        for branch in branches {
            program.extend(branch);
        }
        Ok(program)
    }

    fn serial(&mut self) -> Result<Vec<Inst>, Error> {
        let mut program = vec![];
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => return Ok(program),
                Some(_) => program.extend(self.single()?),
            }
        }
    }

    fn single(&mut self) -> Result<Vec<Inst>, Error> {
        let mut program = self.atomic()?;
        loop {
            let q = match self.peek() {
                Some(c @ '?') | Some(c @ '+') | Some(c @ '*') => c,
                Some('{') => {
                    return self.unsupported(self.pos, "bounded repetition");
                }
                _ => return Ok(program),
            };
            self.bump();
            // A '?' right after a quantifier flips its preference.
            let lazy = self.peek() == Some('?');
            if lazy {
                self.bump();
            }
            let n = program.len() as isize;
            program = match (q, lazy) {
                ('?', false) => prefixed(Inst::Split(n), program),
                ('?', true) => prefixed(Inst::SplitAfter(n), program),
                ('+', false) => suffixed(program, Inst::SplitAfter(-(n + 1))),
                ('+', true) => suffixed(program, Inst::Split(-(n + 1))),
                ('*', false) => {
                    let p = prefixed(Inst::Split(n + 1), program);
                    suffixed(p, Inst::SplitAfter(-(n + 1)))
                }
                ('*', true) => {
                    let p = prefixed(Inst::SplitAfter(n + 1), program);
                    suffixed(p, Inst::Split(-(n + 1)))
                }
                _ => unreachable!(),
            };
        }
    }

    fn atomic(&mut self) -> Result<Vec<Inst>, Error> {
        let pos = self.pos;
        match self.bump().expect("serial() peeks before calling atomic()") {
            '.' => Ok(vec![Inst::Any]),
            '^' => Ok(vec![Inst::AssertStart]),
            '$' => Ok(vec![Inst::AssertEnd]),
            '\\' => self.escape(pos),
            '(' => self.parens(pos),
            '[' => self.unsupported(pos, "character class"),
            ']' => self.err(pos, "unmatched closing bracket"),
            c @ '?' | c @ '+' | c @ '*' => {
                self.err(pos, &format!("operator '{}' has nothing to repeat", c))
            }
            c => Ok(vec![Inst::Char(c)]),
        }
    }

    fn parens(&mut self, open_pos: usize) -> Result<Vec<Inst>, Error> {
        if self.peek() == Some(')') {
            return self.err(open_pos, "empty parentheses");
        }
        let mut name = String::new();
        if self.peek() == Some('?') {
            self.bump();
            let mod_pos = self.pos;
            match self.bump() {
                None => return self.err(open_pos, "opening parenthesis is never closed"),
                Some(':') => {
                    let program = self.expression()?;
                    self.close_paren(open_pos)?;
                    return Ok(program);
                }
                Some('P') => {
                    name = self.group_name()?;
                }
                Some('=') | Some('!') => {
                    return self.unsupported(open_pos, "lookaround");
                }
                Some(_) => {
                    return self.err(
                        mod_pos,
                        "unknown group modifier, only (?: and (?P< are recognized",
                    );
                }
            }
        }

        let group_id = self.groups.len();
        let body_start = self.pos;
        self.groups
            .push(GroupDescription::new(&name, (body_start, body_start)));
        let program = self.expression()?;
        self.close_paren(open_pos)?;
        self.groups[group_id] = GroupDescription::new(&name, (body_start, self.pos - 1));

        let mut wrapped = Vec::with_capacity(program.len() + 2);
        wrapped.push(Inst::StartGroup(group_id));
        wrapped.extend(program);
        wrapped.push(Inst::EndGroup);
        Ok(wrapped)
    }

    fn close_paren(&mut self, open_pos: usize) -> Result<(), Error> {
        match self.bump() {
            Some(')') => Ok(()),
            // expression() only ever stops at ')' or the end of the pattern.
            _ => self.err(open_pos, "opening parenthesis is never closed"),
        }
    }

    fn group_name(&mut self) -> Result<String, Error> {
        let bracket_pos = self.pos;
        if self.bump() != Some('<') {
            return self.err(bracket_pos, "expected a group name in <angle brackets>");
        }
        let mut name = String::new();
        loop {
            match self.bump() {
                None => {
                    return self.err(bracket_pos, "group name has no closing bracket");
                }
                Some('>') => break,
                Some(c) => name.push(c),
            }
        }
        if name.is_empty() {
            return self.err(bracket_pos, "empty group name");
        }
        Ok(name)
    }

    fn escape(&mut self, slash_pos: usize) -> Result<Vec<Inst>, Error> {
        let c = match self.bump() {
            None => {
                return self.err(
                    slash_pos,
                    "a backslash cannot be the last character of the pattern",
                );
            }
            Some(c) => c,
        };
        match c {
            'A' => Ok(vec![Inst::AssertStart]),
            'Z' => Ok(vec![Inst::AssertEnd]),
            'd' => Ok(vec![Inst::Filter(Predicate::Digit)]),
            'D' => Ok(vec![Inst::Filter(Predicate::NotDigit)]),
            's' => Ok(vec![Inst::Filter(Predicate::Space)]),
            'S' => Ok(vec![Inst::Filter(Predicate::NotSpace)]),
            'w' => Ok(vec![Inst::Filter(Predicate::Word)]),
            'W' => Ok(vec![Inst::Filter(Predicate::NotWord)]),
            'n' => Ok(vec![Inst::Char('\n')]),
            't' => Ok(vec![Inst::Char('\t')]),
            'r' => Ok(vec![Inst::Char('\r')]),
            '0' => Ok(vec![Inst::Char('\0')]),
            'x' => self.hex_escape(slash_pos),
            '1'..='9' => self.unsupported(slash_pos, "backreference"),
            '\\' | '[' | ']' | '(' | ')' | '{' | '}' | '?' | '+' | '*' | '|' | '.' | '^'
            | '$' => Ok(vec![Inst::Char(c)]),
            _ => self.err(slash_pos, &format!("unrecognized escape sequence \\{}", c)),
        }
    }

    /// `\xHH` with exactly two lowercase hex digits.
    fn hex_escape(&mut self, slash_pos: usize) -> Result<Vec<Inst>, Error> {
        let mut value = 0u32;
        for _ in 0..2 {
            let d = match self.bump() {
                None => {
                    return self.err(slash_pos, "escape sequence is cut in the middle");
                }
                Some(d) => d,
            };
            value = match d {
                '0'..='9' => value * 16 + (d as u32 - '0' as u32),
                'a'..='f' => value * 16 + (d as u32 - 'a' as u32 + 10),
                _ => {
                    return self.err(
                        slash_pos,
                        &format!("the character {:?} is not a lowercase hex digit", d),
                    );
                }
            };
        }
        // Two hex digits always form a valid scalar value.
        Ok(vec![Inst::Char(char::from_u32(value).unwrap())])
    }
}

fn prefixed(inst: Inst, program: Vec<Inst>) -> Vec<Inst> {
    let mut out = Vec::with_capacity(program.len() + 1);
    out.push(inst);
    out.extend(program);
    out
}

fn suffixed(mut program: Vec<Inst>, inst: Inst) -> Vec<Inst> {
    program.push(inst);
    program
}

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::inst::Inst::*;
    use crate::inst::Predicate;
    use crate::Error;

    fn insts(pattern: &str) -> Vec<super::Inst> {
        compile(pattern).unwrap().0
    }

    fn syntax_pos(pattern: &str) -> usize {
        match compile(pattern).unwrap_err() {
            Error::Syntax { pos, .. } => pos,
            err => panic!("expected a syntax error, got {:?}", err),
        }
    }

    fn unsupported_pos(pattern: &str) -> (usize, &'static str) {
        match compile(pattern).unwrap_err() {
            Error::Unsupported { pos, feature } => (pos, feature),
            err => panic!("expected an unsupported error, got {:?}", err),
        }
    }

    #[test]
    fn literals_concatenate() {
        assert_eq!(insts("abc"), vec![Char('a'), Char('b'), Char('c')]);
        assert_eq!(insts("a.c"), vec![Char('a'), Any, Char('c')]);
    }

    #[test]
    fn escapes() {
        assert_eq!(insts(r"\d\W"), vec![
            Filter(Predicate::Digit),
            Filter(Predicate::NotWord),
        ]);
        assert_eq!(insts(r"\n\\\."), vec![Char('\n'), Char('\\'), Char('.')]);
        assert_eq!(insts(r"\x41"), vec![Char('A')]);
        assert_eq!(insts(r"\A\Z"), vec![AssertStart, AssertEnd]);
    }

    #[test]
    fn quantifiers() {
        assert_eq!(insts("a?"), vec![Split(1), Char('a')]);
        assert_eq!(insts("a+"), vec![Char('a'), SplitAfter(-2)]);
        assert_eq!(insts("a*"), vec![Split(2), Char('a'), SplitAfter(-2)]);
        assert_eq!(insts("ab+"), vec![Char('a'), Char('b'), SplitAfter(-2)]);
    }

    #[test]
    fn lazy_quantifiers_flip_the_preference() {
        assert_eq!(insts("a??"), vec![SplitAfter(1), Char('a')]);
        assert_eq!(insts("a+?"), vec![Char('a'), Split(-2)]);
        assert_eq!(insts("a*?"), vec![SplitAfter(2), Char('a'), Split(-2)]);
    }

    #[test]
    fn quantifiers_stack() {
        // (a+)* without the group: the inner loop keeps its back-edge, the
        // outer star wraps the whole thing.
        assert_eq!(insts("a+*"), vec![
            Split(3),
            Char('a'),
            SplitAfter(-2),
            SplitAfter(-3),
        ]);
    }

    #[test]
    fn quantified_group() {
        assert_eq!(insts("(ab)+"), vec![
            StartGroup(1),
            Char('a'),
            Char('b'),
            EndGroup,
            SplitAfter(-5),
        ]);
    }

    #[test]
    fn alternation_two_branches() {
        assert_eq!(insts("a|b"), vec![Split(2), Char('a'), Jump(1), Char('b')]);
    }

    #[test]
    fn alternation_heads_are_reversed() {
        // The first head split parks the *last* branch; the pattern-order
        // preference then falls out of the LIFO frontier.
        assert_eq!(insts("a|b|c"), vec![
            Split(5),
            Split(2),
            Char('a'),
            Jump(3),
            Char('b'),
            Jump(1),
            Char('c'),
        ]);
    }

    #[test]
    fn empty_alternation_branch_is_legal() {
        assert_eq!(insts("a|"), vec![Split(2), Char('a'), Jump(0)]);
    }

    #[test]
    fn groups() {
        let (prog, groups) = compile("(a)(?:b)(?P<end>c)").unwrap();
        assert_eq!(prog, vec![
            StartGroup(1),
            Char('a'),
            EndGroup,
            Char('b'),
            StartGroup(2),
            Char('c'),
            EndGroup,
        ]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "");
        assert_eq!(groups[0].pattern_span, (0, 18));
        assert_eq!(groups[1].name, "");
        assert_eq!(groups[1].pattern_span, (1, 2));
        assert_eq!(groups[2].name, "end");
        assert_eq!(groups[2].pattern_span, (16, 17));
    }

    #[test]
    fn non_capturing_groups_allocate_no_description() {
        let (_, groups) = compile("(?:a(?:b))").unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn anchors_are_plain_instructions() {
        assert_eq!(insts("^a$"), vec![AssertStart, Char('a'), AssertEnd]);
    }

    #[test]
    fn syntax_error_positions_are_one_based() {
        assert_eq!(syntax_pos("*a"), 1);
        assert_eq!(syntax_pos("a)"), 2);
        assert_eq!(syntax_pos("(a"), 1);
        assert_eq!(syntax_pos("ab()"), 3);
        assert_eq!(syntax_pos("]"), 1);
        assert_eq!(syntax_pos(r"ab\q"), 3);
        assert_eq!(syntax_pos(r"\x4"), 1);
        assert_eq!(syntax_pos(r"\x4G"), 1);
        assert_eq!(syntax_pos(r"\x4F"), 1); // uppercase hex is rejected
        assert_eq!(syntax_pos(r"a\"), 2);
        assert_eq!(syntax_pos("(?Pa)"), 4);
        assert_eq!(syntax_pos("(?P<a"), 4);
        assert_eq!(syntax_pos("(?P<>a)"), 4);
        assert_eq!(syntax_pos("(?Xa)"), 3);
    }

    #[test]
    fn unsupported_features_are_distinct_errors() {
        assert_eq!(unsupported_pos("[ab]"), (1, "character class"));
        assert_eq!(unsupported_pos("a{2,3}"), (2, "bounded repetition"));
        assert_eq!(unsupported_pos("(?=a)"), (1, "lookaround"));
        assert_eq!(unsupported_pos("(?!a)"), (1, "lookaround"));
        assert_eq!(unsupported_pos(r"(a)\1"), (4, "backreference"));
    }

    #[test]
    fn double_quantifier_is_legal() {
        // `a**` is (a*)*, not an error: quantifiers may stack.
        assert!(compile("a**").is_ok());
        assert!(compile("^*").is_ok());
    }
}
