//! Reader and writer for `key=value` bundle files.
//!
//! The reader keeps what the writer needs to reproduce a file: the head comment,
//! per-entry comments, `##` commented-out entries, and the number of blank lines
//! after each entry. The writer guarantees that reading its output yields the
//! same keys, values, comments, and commented flags. The one exception is an
//! entry comment line that would read back as a `##` commented-out entry: it
//! is written with an extra leading `#`.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::escape::{
    convert_encoded_to_unicode, convert_line_breaks, convert_unicode_to_encoded,
    escape_line_breaks, find_key_value_separator, unescape_key,
};
use crate::{
    bundle::Bundle,
    traits::BundleFormat,
    types::{BundleEntry, KeyOrder},
};

lazy_static! {
    static ref LINE_BREAK_REGEX: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
    static ref COMMENTED_ENTRY_REGEX: Regex = Regex::new(r"^##[^#]").unwrap();
}

/// First line of a generated file when the generator banner is enabled.
pub const GENERATED_BY: &str = "#Generated by propbundle";

const COMMENTED_PREFIX: &str = "##";

/// Layout and escaping options for reading and writing bundle files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Decode `\uXXXX` escapes on read and produce them on write.
    pub convert_unicode: bool,
    /// Write `\u00E9` instead of `\u00e9`.
    pub uppercase_hex: bool,
    /// Start generated files with [`GENERATED_BY`].
    pub show_generator: bool,
    /// Write `key = value` instead of `key=value`.
    pub spaces_around_equals: bool,
    /// Pad keys so that separators line up.
    pub align_equals: bool,
    /// Separate key groups with blank lines.
    pub group_keys: bool,
    /// Number of key segments that make up a group.
    pub group_level_depth: usize,
    /// Blank lines written between two groups.
    pub group_line_breaks: usize,
    /// Align separators per group rather than per file.
    pub group_align_equals: bool,
    /// Separator between key segments.
    pub key_group_separator: String,
    /// Wrap long values with `\` continuations.
    pub wrap_lines: bool,
    /// Column after which lines are wrapped.
    pub wrap_column: usize,
    /// Indentation of continuation lines.
    pub wrap_indent: usize,
    /// Continue the value on a new line after each escaped line break.
    pub new_line_nice: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            convert_unicode: true,
            uppercase_hex: true,
            show_generator: false,
            spaces_around_equals: true,
            align_equals: false,
            group_keys: false,
            group_level_depth: 1,
            group_line_breaks: 1,
            group_align_equals: true,
            key_group_separator: ".".to_string(),
            wrap_lines: false,
            wrap_column: 80,
            wrap_indent: 4,
            new_line_nice: false,
        }
    }
}

/// The `key=value` bundle format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesFormat {
    pub options: FormatOptions,
}

impl PropertiesFormat {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }
}

impl BundleFormat for PropertiesFormat {
    fn parse(&self, text: &str) -> Bundle {
        Parser::new(self.options.convert_unicode).run(text)
    }

    fn generate(&self, bundle: &Bundle) -> String {
        Generator::new(&self.options).run(bundle)
    }
}

struct Parser {
    convert_unicode: bool,
    bundle: Bundle,
    head: Vec<String>,
    head_done: bool,
    pending_comment: Vec<String>,
    last_entry: Option<BundleEntry>,
}

impl Parser {
    fn new(convert_unicode: bool) -> Self {
        Self {
            convert_unicode,
            bundle: Bundle::new(),
            head: Vec::new(),
            head_done: false,
            pending_comment: Vec::new(),
            last_entry: None,
        }
    }

    fn run(mut self, text: &str) -> Bundle {
        let mut lines: Vec<&str> = LINE_BREAK_REGEX.split(text).collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let separator = find_key_value_separator(line);
            let is_regular = !line.is_empty() && !line.starts_with(['#', '!']);
            let is_commented = self.head_done && COMMENTED_ENTRY_REGEX.is_match(line);
            let key_start = if is_commented { COMMENTED_PREFIX.len() } else { 0 };

            match separator {
                Some(position) if (is_regular || is_commented) && position > key_start => {
                    let mut buffer = line[key_start..].to_string();
                    while ends_with_continuation(&buffer) {
                        buffer.pop();
                        if i + 1 < lines.len() {
                            i += 1;
                            let wrapped = strip_leading_whitespace(lines[i]);
                            let wrapped = if is_commented {
                                wrapped.strip_prefix(COMMENTED_PREFIX).unwrap_or(wrapped)
                            } else {
                                wrapped
                            };
                            buffer.push_str(wrapped);
                        }
                    }
                    self.push_entry(&buffer, position - key_start, is_commented);
                }
                _ if line.starts_with(['#', '!']) => {
                    if self.head_done {
                        self.pending_comment.push(line.to_string());
                    } else {
                        self.head.push(line.to_string());
                    }
                }
                _ => self.push_blank(),
            }
            i += 1;
        }

        self.flush_entry();
        // The blank line that closes the head belongs to the layout.
        if self.head.last().is_some_and(String::is_empty) {
            self.head.pop();
        }
        self.bundle.set_head_comment(self.head.join("\n"));
        trace!(entries = self.bundle.len(), "parsed bundle");
        self.bundle
    }

    fn push_entry(&mut self, buffer: &str, separator: usize, commented: bool) {
        self.head_done = true;
        self.flush_entry();

        let key = unescape_key(buffer[..separator].trim_matches(|c: char| c <= ' '));
        let mut value = strip_leading_whitespace(&buffer[separator + 1..]);
        if value.starts_with("\\ ") {
            value = &value[1..];
        }
        let (key, value) = if self.convert_unicode {
            (
                convert_encoded_to_unicode(&key),
                convert_encoded_to_unicode(value),
            )
        } else {
            (key, convert_line_breaks(value))
        };

        let comment = std::mem::take(&mut self.pending_comment).join("\n");
        self.last_entry = Some(
            BundleEntry::new(key, value)
                .with_comment(comment)
                .with_commented(commented),
        );
    }

    fn push_blank(&mut self) {
        self.head_done = true;
        match self.last_entry.as_mut() {
            Some(entry) => entry.trailing_blank_lines += 1,
            None if self.pending_comment.is_empty() => self.head.push(String::new()),
            None => {}
        }
    }

    fn flush_entry(&mut self) {
        if let Some(entry) = self.last_entry.take() {
            self.bundle.add_entry(entry);
        }
    }
}

/// Whether a comment line after the head would be read as a `##` entry.
fn reads_as_commented_entry(line: &str) -> bool {
    COMMENTED_ENTRY_REGEX.is_match(line)
        && find_key_value_separator(line).is_some_and(|position| position > COMMENTED_PREFIX.len())
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(buffer: &str) -> bool {
    buffer.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn strip_leading_whitespace(text: &str) -> &str {
    text.trim_start_matches([' ', '\t', '\n', '\r', '\u{000B}', '\u{000C}'])
}

struct Generator<'a> {
    options: &'a FormatOptions,
    out: String,
}

impl<'a> Generator<'a> {
    fn new(options: &'a FormatOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    fn run(mut self, bundle: &Bundle) -> String {
        let entries = bundle.entries();
        let keep_blank_lines = bundle.key_order() == KeyOrder::Insertion;

        let mut head: Vec<&str> = Vec::new();
        if self.options.show_generator && !bundle.head_comment().starts_with(GENERATED_BY) {
            head.push(GENERATED_BY);
        }
        if !bundle.head_comment().is_empty() {
            head.extend(bundle.head_comment().split('\n'));
        }
        for line in &head {
            self.push_comment_line(line, true);
        }
        let needs_separation = !head.is_empty()
            || entries
                .first()
                .is_some_and(|entry| entry.comment.is_some() || entry.commented);
        if needs_separation && !entries.is_empty() {
            self.out.push('\n');
        }

        let widths = self.key_widths(&entries);
        let mut previous: Option<(&BundleEntry, Option<&str>)> = None;
        for entry in &entries {
            let group = self.key_group(&entry.key);
            if let Some((previous_entry, previous_group)) = previous {
                let mut blank_lines = if keep_blank_lines {
                    previous_entry.trailing_blank_lines
                } else {
                    0
                };
                if self.options.group_keys && previous_group != group {
                    blank_lines = blank_lines.max(self.options.group_line_breaks);
                }
                for _ in 0..blank_lines {
                    self.out.push('\n');
                }
            }

            let width = widths
                .iter()
                .find(|(g, _)| *g == group)
                .map(|(_, width)| *width)
                .unwrap_or(0);
            self.push_entry(entry, width);
            previous = Some((entry, group));
        }
        self.out
    }

    /// Prefix of `key` up to the `group_level_depth`-th separator, if any.
    fn key_group<'k>(&self, key: &'k str) -> Option<&'k str> {
        let separator = self.options.key_group_separator.as_str();
        if separator.is_empty() {
            return None;
        }
        key.match_indices(separator)
            .nth(self.options.group_level_depth.max(1) - 1)
            .map(|(index, _)| &key[..index])
    }

    /// Separator column per key group (a single `None` group when alignment is
    /// file-wide).
    fn key_widths<'k>(&self, entries: &[&'k BundleEntry]) -> Vec<(Option<&'k str>, usize)> {
        let mut widths: Vec<(Option<&'k str>, usize)> = Vec::new();
        if !self.options.align_equals {
            return widths;
        }
        let per_group = self.options.group_keys && self.options.group_align_equals;
        let global = entries
            .iter()
            .map(|entry| self.written_key(entry).chars().count())
            .max()
            .unwrap_or(0);
        for entry in entries {
            let group = self.key_group(&entry.key);
            if widths.iter().any(|(g, _)| *g == group) {
                continue;
            }
            let width = if per_group {
                entries
                    .iter()
                    .filter(|other| self.key_group(&other.key) == group)
                    .map(|other| self.written_key(other).chars().count())
                    .max()
                    .unwrap_or(0)
            } else {
                global
            };
            widths.push((group, width));
        }
        widths
    }

    fn push_comment_line(&mut self, line: &str, in_head: bool) {
        if line.trim().is_empty() {
            self.out.push_str(if in_head { "" } else { "#" });
        } else if !line.starts_with(['#', '!']) {
            self.out.push_str("# ");
            self.out.push_str(line);
        } else {
            if !in_head && reads_as_commented_entry(line) {
                self.out.push('#');
            }
            self.out.push_str(line);
        }
        self.out.push('\n');
    }

    fn written_key(&self, entry: &BundleEntry) -> String {
        let mut written = String::new();
        if entry.commented {
            written.push_str(COMMENTED_PREFIX);
        }
        for (index, c) in entry.key.chars().enumerate() {
            match c {
                '=' | ':' => written.push('\\'),
                '#' | '!' if index == 0 => written.push('\\'),
                _ => {}
            }
            written.push(c);
        }
        written
    }

    fn push_entry(&mut self, entry: &BundleEntry, width: usize) {
        if let Some(comment) = &entry.comment {
            for line in comment.split('\n') {
                self.push_comment_line(line, false);
            }
        }

        let mut first = self.written_key(entry);
        let padding = width.saturating_sub(first.chars().count());
        first.extend(std::iter::repeat_n(' ', padding));
        first.push_str(if self.options.spaces_around_equals {
            " = "
        } else {
            "="
        });
        let value_start = first.len();

        let mut segments = self.escaped_value(&entry.value).into_iter();
        first.push_str(&segments.next().unwrap_or_default());
        let mut physical = vec![first];
        physical.extend(segments);

        let continuation_prefix = format!(
            "{}{}",
            " ".repeat(self.options.wrap_indent),
            if entry.commented { COMMENTED_PREFIX } else { "" }
        );
        let mut pieces: Vec<String> = Vec::new();
        for (index, line) in physical.iter().enumerate() {
            let continuation_width = continuation_prefix.chars().count();
            let (min_break, first_width) = if index == 0 {
                (value_start, 0)
            } else {
                (0, continuation_width)
            };
            if self.options.wrap_lines {
                pieces.extend(wrap(
                    line,
                    min_break,
                    first_width,
                    continuation_width,
                    self.options.wrap_column,
                ));
            } else {
                pieces.push(line.clone());
            }
        }

        for (index, piece) in pieces.iter().enumerate() {
            if index > 0 {
                self.out.push_str("\\\n");
                self.out.push_str(&continuation_prefix);
            }
            self.out.push_str(piece);
        }
        self.out.push('\n');
    }

    /// Escaped value split into the segments that start a new physical line.
    fn escaped_value(&self, value: &str) -> Vec<String> {
        let escape = |segment: &str| {
            if self.options.convert_unicode {
                convert_unicode_to_encoded(segment, self.options.uppercase_hex)
            } else {
                escape_line_breaks(segment)
            }
        };

        let mut segments = value.split('\n');
        let mut current = escape(segments.next().unwrap_or_default());
        if current.starts_with(' ') {
            current.insert(0, '\\');
        }
        let mut physical = Vec::new();
        for segment in segments {
            current.push_str("\\n");
            let escaped = escape(segment);
            let breakable = self.options.new_line_nice
                && escaped.chars().next().is_some_and(|c| !c.is_whitespace());
            if breakable {
                physical.push(std::mem::replace(&mut current, escaped));
            } else {
                current.push_str(&escaped);
            }
        }
        physical.push(current);
        physical
    }
}

/// Splits `line` after whitespace runs so that pieces fit in `column`
/// characters where possible. No break happens at or before `min_break`.
fn wrap(
    line: &str,
    min_break: usize,
    first_width: usize,
    continuation_width: usize,
    column: usize,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = line;
    let mut min_break = min_break;
    let mut prefix_width = first_width;

    loop {
        if prefix_width + rest.chars().count() <= column {
            pieces.push(rest.to_string());
            break;
        }
        let mut best = None;
        let mut fallback = None;
        let mut previous = None;
        let mut width = prefix_width;
        for (index, c) in rest.char_indices() {
            if index > min_break && previous == Some(' ') && !c.is_whitespace() {
                if width <= column {
                    best = Some(index);
                } else {
                    fallback = Some(index);
                    break;
                }
            }
            previous = Some(c);
            width += 1;
        }
        match best.or(fallback) {
            Some(index) => {
                pieces.push(rest[..index].to_string());
                rest = &rest[index..];
                min_break = 0;
                prefix_width = continuation_width;
            }
            None => {
                pieces.push(rest.to_string());
                break;
            }
        }
    }
    pieces
}
