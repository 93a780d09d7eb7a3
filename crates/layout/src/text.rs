//! Text measurement cache and line wrapping.
//!
//! A text run is measured once per distinct (content, font) pair and split
//! into words. The words are kept in a persistent linked list so that a later
//! frame can wrap the same run against a different width without calling the
//! measurer again. Entries that go unused for a frame are evicted and their
//! words returned to a free list.

use crate::arena::{CapacityExceeded, FixedMap, Pool};
use crate::perf::Profiler;
use crate::reporter::ErrorReporter;
use crate::tree::{ChildRange, Frame, TextNode, WrappedLine};
use trellis_traits::{LayoutError, TextMeasurer};
use trellis_types::ids::hash_text;
use trellis_types::{TextConfig, TextWrapMode};

const NO_WORD: u32 = u32::MAX;

/// Slack allowed when deciding whether a word still fits on a line.
const WRAP_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
pub(crate) struct MeasuredWord {
    /// Byte offset within the text.
    pub start: u32,
    /// Byte length, including the trailing space if there is one.
    pub len: u32,
    /// Width, including the trailing space if there is one.
    pub width: f32,
    pub trailing_space: bool,
    /// Zero-length marker standing for an explicit newline.
    pub line_break: bool,
    next: u32,
}

impl MeasuredWord {
    fn run(start: usize, len: usize, width: f32, trailing_space: bool) -> Self {
        Self {
            start: start as u32,
            len: len as u32,
            width,
            trailing_space,
            line_break: false,
            next: NO_WORD,
        }
    }

    fn line_break(after: usize) -> Self {
        Self {
            start: after as u32,
            len: 0,
            width: 0.0,
            trailing_space: false,
            line_break: true,
            next: NO_WORD,
        }
    }
}

/// Result of measuring one text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeasuredText {
    /// Width of the longest line when only explicit newlines break.
    pub unwrapped_width: f32,
    /// Lines when only explicit newlines break. Zero for empty text.
    pub line_count: u32,
    /// Height of one line as reported by the measurer.
    pub line_height: f32,
    /// Width of the widest single word.
    pub min_width: f32,
    pub space_width: f32,
    first_word: u32,
    last_used: u32,
}

impl MeasuredText {
    fn uncached(width: f32, height: f32, line_count: u32) -> Self {
        Self {
            unwrapped_width: width,
            line_count,
            line_height: height,
            min_width: width,
            space_width: 0.0,
            first_word: NO_WORD,
            last_used: 0,
        }
    }
}

/// Cache key for a run. Zero is reserved for uncached measurements.
pub(crate) fn measurement_key(text: &str, config: &TextConfig) -> u32 {
    let seed = config
        .measurement_key()
        .iter()
        .fold(0_u32, |hash, value| hash.wrapping_mul(31).wrapping_add(*value));
    match hash_text(text, seed) {
        0 => 1,
        key => key,
    }
}

#[derive(Debug, Default)]
pub(crate) struct TextCache {
    entries: FixedMap<MeasuredText>,
    words: Pool<MeasuredWord>,
    free_words: Pool<u32>,
}

impl TextCache {
    pub(crate) fn new(
        entries: FixedMap<MeasuredText>,
        words: Pool<MeasuredWord>,
        free_words: Pool<u32>,
    ) -> Self {
        Self {
            entries,
            words,
            free_words,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Words currently held by live entries.
    #[cfg(test)]
    pub(crate) fn word_count(&self) -> usize {
        self.words.len() - self.free_words.len()
    }

    /// Drops entries that were not used during the previous frame.
    pub(crate) fn evict_stale(&mut self, frame: u32) {
        let Self {
            entries,
            words,
            free_words,
        } = self;
        let mut evicted = 0_usize;
        entries.retain(|_, entry| {
            if frame.wrapping_sub(entry.last_used) <= 1 {
                return true;
            }
            release_chain(words, free_words, entry.first_word);
            evicted += 1;
            false
        });
        if evicted > 0 {
            log::trace!("evicted {} text measurements", evicted);
        }
    }

    /// Measures `text`, reusing a cached result when one exists.
    ///
    /// Returns the cache key (zero when the result could not be cached) and
    /// the measurement.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn measure(
        &mut self,
        text: &str,
        config: &TextConfig,
        measurer: Option<&dyn TextMeasurer>,
        available_width: f32,
        frame: u32,
        reporter: &mut ErrorReporter,
        profiler: &dyn Profiler,
    ) -> (u32, MeasuredText) {
        let Some(measurer) = measurer else {
            reporter.report_once_per_frame(LayoutError::TextMeasurementFunctionNotProvided);
            return (0, MeasuredText::uncached(0.0, 0.0, 0));
        };

        let key = measurement_key(text, config);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = frame;
            profiler.count_hit();
            return (key, *entry);
        }
        profiler.count_miss();

        if self.entries.len() >= self.entries.capacity() {
            return (0, self.measure_uncached(text, config, measurer, available_width, reporter));
        }

        match self.measure_words(text, config, measurer, available_width) {
            Ok(mut measured) => {
                measured.last_used = frame;
                if self.entries.insert(key, measured).is_err() {
                    release_chain(&mut self.words, &mut self.free_words, measured.first_word);
                    return (0, self.measure_uncached(text, config, measurer, available_width, reporter));
                }
                (key, measured)
            }
            Err(CapacityExceeded) => (0, self.measure_uncached(text, config, measurer, available_width, reporter)),
        }
    }

    fn measure_uncached(
        &self,
        text: &str,
        config: &TextConfig,
        measurer: &dyn TextMeasurer,
        available_width: f32,
        reporter: &mut ErrorReporter,
    ) -> MeasuredText {
        reporter.report_once_per_frame(LayoutError::TextMeasurementCapacityExceeded {
            capacity: self.words.capacity(),
        });
        let size = measurer.measure_text(text, config, available_width);
        let line_count = u32::from(!text.is_empty());
        MeasuredText::uncached(size.width, size.height, line_count)
    }

    /// Splits `text` at spaces and newlines and measures every word.
    fn measure_words(
        &mut self,
        text: &str,
        config: &TextConfig,
        measurer: &dyn TextMeasurer,
        available_width: f32,
    ) -> Result<MeasuredText, CapacityExceeded> {
        let space = measurer.measure_text(" ", config, available_width);
        let mut chain = Chain::default();
        let mut line_height = space.height;
        let mut min_width = 0.0_f32;
        let mut max_line_width = 0.0_f32;
        let mut line_width = 0.0_f32;
        let mut line_trailing_space = false;
        let mut open_line = false;
        let mut line_breaks = 0_u32;
        let mut start = 0_usize;

        for (index, byte) in text.bytes().enumerate() {
            if byte != b' ' && byte != b'\n' {
                continue;
            }
            let word = &text[start..index];
            let width = if word.is_empty() {
                0.0
            } else {
                let size = measurer.measure_text(word, config, available_width);
                line_height = line_height.max(size.height);
                min_width = min_width.max(size.width);
                size.width
            };

            if byte == b' ' {
                let measured = MeasuredWord::run(start, index + 1 - start, width + space.width, true);
                self.append(&mut chain, measured)?;
                line_width += measured.width;
                line_trailing_space = true;
                open_line = true;
            } else {
                if !word.is_empty() {
                    self.append(&mut chain, MeasuredWord::run(start, index - start, width, false))?;
                    line_width += width;
                    line_trailing_space = false;
                }
                self.append(&mut chain, MeasuredWord::line_break(index + 1))?;
                max_line_width = max_line_width.max(trimmed(line_width, line_trailing_space, space.width));
                line_width = 0.0;
                line_trailing_space = false;
                open_line = false;
                line_breaks += 1;
            }
            start = index + 1;
        }

        if start < text.len() {
            let word = &text[start..];
            let size = measurer.measure_text(word, config, available_width);
            line_height = line_height.max(size.height);
            min_width = min_width.max(size.width);
            self.append(&mut chain, MeasuredWord::run(start, text.len() - start, size.width, false))?;
            line_width += size.width;
            line_trailing_space = false;
            open_line = true;
        }
        max_line_width = max_line_width.max(trimmed(line_width, line_trailing_space, space.width));

        Ok(MeasuredText {
            unwrapped_width: max_line_width,
            line_count: line_breaks + u32::from(open_line),
            line_height,
            min_width,
            space_width: space.width,
            first_word: chain.first,
            last_used: 0,
        })
    }

    fn append(&mut self, chain: &mut Chain, word: MeasuredWord) -> Result<(), CapacityExceeded> {
        let slot = match self.free_words.pop() {
            Some(slot) => {
                self.words[slot as usize] = word;
                slot
            }
            None => match self.words.push(word) {
                Ok(index) => index as u32,
                Err(err) => {
                    release_chain(&mut self.words, &mut self.free_words, chain.first);
                    return Err(err);
                }
            },
        };
        if chain.last == NO_WORD {
            chain.first = slot;
        } else {
            self.words[chain.last as usize].next = slot;
        }
        chain.last = slot;
        Ok(())
    }

    fn words(&self, first: u32) -> Words<'_> {
        Words {
            words: &self.words,
            next: first,
        }
    }

    /// Breaks every text node of the frame into lines against its resolved
    /// width, then sets the node's height from the line count.
    pub(crate) fn wrap(&self, frame: &mut Frame, reporter: &mut ErrorReporter) {
        for index in 0..frame.texts.len() {
            let text = frame.texts[index];
            let node = text.node.index();
            let max_width = frame.nodes[node].dimensions.width;
            let lines = match self.wrap_text(&text, max_width, &mut frame.lines) {
                Ok(lines) => lines,
                Err(CapacityExceeded) => {
                    reporter.report_once_per_frame(LayoutError::TextMeasurementCapacityExceeded {
                        capacity: frame.lines.capacity(),
                    });
                    ChildRange {
                        start: frame.lines.len() as u32,
                        len: 0,
                    }
                }
            };
            frame.texts[index].lines = lines;
            let height = lines.len as f32 * text.line_height;
            let node = &mut frame.nodes[node];
            node.dimensions.height = height;
            node.min_dimensions.height = height;
        }
    }

    pub(crate) fn wrap_text(
        &self,
        text: &TextNode,
        max_width: f32,
        lines: &mut Pool<WrappedLine>,
    ) -> Result<ChildRange, CapacityExceeded> {
        let first_line = lines.len();
        let entry = match self.entries.get(&text.measure_key) {
            Some(entry) if text.measure_key != 0 => entry,
            _ => {
                if !text.text.is_empty() {
                    lines.push(WrappedLine {
                        start: 0,
                        len: text.text.len() as u32,
                        width: text.unwrapped.width,
                    })?;
                }
                return Ok(line_range(first_line, lines.len()));
            }
        };

        let single_line = text.config.wrap_mode == TextWrapMode::None
            || (entry.line_count <= 1 && entry.unwrapped_width <= max_width + WRAP_EPSILON);
        if single_line {
            if !text.text.is_empty() {
                lines.push(WrappedLine {
                    start: 0,
                    len: text.text.len() as u32,
                    width: entry.unwrapped_width,
                })?;
            }
            return Ok(line_range(first_line, lines.len()));
        }

        let break_on_width = text.config.wrap_mode == TextWrapMode::Words;
        let space = entry.space_width;
        let mut line = LineBuilder::default();
        for word in self.words(entry.first_word) {
            if word.line_break {
                line.finish(lines, space)?;
                line = LineBuilder::starting_at(word.start);
                continue;
            }
            let visible = word.width - if word.trailing_space { space } else { 0.0 };
            if break_on_width && line.has_words && line.width + visible > max_width + WRAP_EPSILON {
                line.finish(lines, space)?;
                line = LineBuilder::starting_at(word.start);
            }
            line.push(&word);
        }
        if line.has_words {
            line.finish(lines, space)?;
        }
        Ok(line_range(first_line, lines.len()))
    }
}

fn trimmed(width: f32, trailing_space: bool, space_width: f32) -> f32 {
    if trailing_space { width - space_width } else { width }
}

fn line_range(start: usize, end: usize) -> ChildRange {
    ChildRange {
        start: start as u32,
        len: (end - start) as u32,
    }
}

fn release_chain(words: &mut Pool<MeasuredWord>, free_words: &mut Pool<u32>, first: u32) {
    let mut current = first;
    while current != NO_WORD {
        let Some(word) = words.get(current as usize) else {
            break;
        };
        let next = word.next;
        if free_words.push(current).is_err() {
            break;
        }
        current = next;
    }
}

#[derive(Debug, Clone, Copy)]
struct Chain {
    first: u32,
    last: u32,
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            first: NO_WORD,
            last: NO_WORD,
        }
    }
}

struct Words<'a> {
    words: &'a Pool<MeasuredWord>,
    next: u32,
}

impl Iterator for Words<'_> {
    type Item = MeasuredWord;

    fn next(&mut self) -> Option<MeasuredWord> {
        if self.next == NO_WORD {
            return None;
        }
        let word = *self.words.get(self.next as usize)?;
        self.next = word.next;
        Some(word)
    }
}

#[derive(Debug, Default)]
struct LineBuilder {
    start: u32,
    end: u32,
    width: f32,
    trailing_space: bool,
    has_words: bool,
}

impl LineBuilder {
    fn starting_at(start: u32) -> Self {
        Self {
            start,
            end: start,
            ..Self::default()
        }
    }

    fn push(&mut self, word: &MeasuredWord) {
        self.width += word.width;
        self.end = word.start + word.len;
        self.trailing_space = word.trailing_space;
        self.has_words = true;
    }

    fn finish(&self, lines: &mut Pool<WrappedLine>, space_width: f32) -> Result<(), CapacityExceeded> {
        let len = self.end - self.start - u32::from(self.trailing_space);
        lines.push(WrappedLine {
            start: self.start,
            len,
            width: trimmed(self.width, self.trailing_space, space_width).max(0.0),
        })?;
        Ok(())
    }
}
