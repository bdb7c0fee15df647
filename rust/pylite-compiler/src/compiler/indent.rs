//! Indentation stack automaton used by the tokenizer.

use tracing::trace;

pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Structural change produced for one line's indentation width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentEvent {
    /// A new, deeper level was pushed.
    Indent(usize),
    /// One level was popped; carries the width now on top of the stack.
    Dedent(usize),
    /// The width does not match any enclosing level.
    Mismatch { expected: usize, actual: usize },
}

/// Tracks previously seen indentation widths.
///
/// Widths are measured by [`IndentEngine::measure`], which expands each tab
/// to a fixed `tab_width`. That is a policy, not a measurement of visual
/// width: tabs and spaces are not reconciled beyond the fixed expansion, so
/// mixing them can produce surprising widths.
#[derive(Debug, Clone)]
pub struct IndentEngine {
    stack: Vec<usize>,
    tab_width: usize,
}

impl Default for IndentEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_WIDTH)
    }
}

impl IndentEngine {
    pub fn new(tab_width: usize) -> Self {
        Self { stack: vec![0], tab_width }
    }

    pub fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }

    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    /// Width of a run of leading whitespace.
    pub fn measure(&self, indent: &str) -> usize {
        indent
            .chars()
            .map(|c| match c {
                '\t' => self.tab_width,
                ' ' => 1,
                _ => 0,
            })
            .sum()
    }

    /// Feed the width of a line that has content.
    pub fn process(&mut self, width: usize) -> Vec<IndentEvent> {
        let top = self.current();
        let mut events = Vec::new();
        if width > top {
            self.stack.push(width);
            events.push(IndentEvent::Indent(width));
        } else if width < top {
            while self.stack.len() > 1 && self.current() > width {
                self.stack.pop();
                events.push(IndentEvent::Dedent(self.current()));
            }
            if self.current() != width {
                events.push(IndentEvent::Mismatch { expected: self.current(), actual: width });
            }
        }
        trace!(width, stack = ?self.stack, "indent processed");
        events
    }

    /// Close every open level at end of input.
    pub fn end_of_file(&mut self) -> Vec<IndentEvent> {
        let mut events = Vec::new();
        while self.stack.len() > 1 {
            self.stack.pop();
            events.push(IndentEvent::Dedent(self.current()));
        }
        events
    }
}
