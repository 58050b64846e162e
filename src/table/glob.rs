// Copyright 2026 Tracedb Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! GLOB pattern matching
//!
//! Supports SQL GLOB patterns, case-sensitive:
//! - `*` matches any sequence of characters (including empty)
//! - `?` matches any single character
//! - `[...]` matches a character class; `[^...]` negates it

use regex::Regex;

/// A compiled GLOB pattern
///
/// Patterns that fail to compile (e.g. an unterminated character class)
/// match nothing; GLOB has no compile-error surface in SQL.
#[derive(Debug)]
pub struct GlobPattern {
    regex: Option<Regex>,
}

impl GlobPattern {
    /// Compile a GLOB pattern
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: Self::compile_pattern(pattern),
        }
    }

    /// Compile a GLOB pattern to an anchored regex
    fn compile_pattern(pattern: &str) -> Option<Regex> {
        let mut regex_pattern = String::with_capacity(pattern.len() * 2);
        regex_pattern.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                '[' => {
                    // Copy the character class through; regex classes share
                    // the GLOB syntax apart from the leading negation.
                    regex_pattern.push('[');
                    if chars.peek() == Some(&'^') {
                        chars.next();
                        regex_pattern.push('^');
                    }
                    for cc in chars.by_ref() {
                        if cc == '\\' {
                            regex_pattern.push_str("\\\\");
                            continue;
                        }
                        regex_pattern.push(cc);
                        if cc == ']' {
                            break;
                        }
                    }
                }
                // Escape regex special characters
                '.' | '+' | '^' | '$' | '(' | ')' | ']' | '{' | '}' | '|' | '\\' => {
                    regex_pattern.push('\\');
                    regex_pattern.push(c);
                }
                _ => regex_pattern.push(c),
            }
        }

        regex_pattern.push('$');
        Regex::new(&regex_pattern).ok()
    }

    /// Match a text value against the pattern
    pub fn matches(&self, text: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(text),
            None => false,
        }
    }
}
