//! Strip display reassembly
//!
//! The LCD is 2 rows of 56 characters, 7 per strip. Hosts update it with
//! display frames `[offset, text...]` of arbitrary length, from single
//! strip labels up to the whole panel. The buffer is merged in place and
//! only blocks whose content actually changed are reported.

use serde::Serialize;
use tracing::trace;

use super::addr::STRIPS;
use super::state::StripState;

pub const ROWS: usize = 2;

/// Characters per strip and row
pub const BLOCK_WIDTH: usize = 7;

pub const ROW_WIDTH: usize = STRIPS * BLOCK_WIDTH;

pub const DISPLAY_SIZE: usize = ROWS * ROW_WIDTH;

const BLOCKS: usize = ROWS * STRIPS;

/// Column whose content separates two strip labels
const SEPARATOR_COLUMN: usize = BLOCK_WIDTH - 1;

pub const BLANK_BLOCK: [u8; BLOCK_WIDTH] = [b' '; BLOCK_WIDTH];

/// One strip/row block whose text changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayChange {
    /// The row looks like one free-text message rather than strip labels
    pub global: bool,
    pub strip: u8,
    pub row: u8,
}

/// Flat 112-character display buffer, index = row * 56 + strip * 7 + column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    chars: [u8; DISPLAY_SIZE],
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self { chars: [b' '; DISPLAY_SIZE] }
    }
}

impl DisplayBuffer {
    /// Buffer offset of a strip/row block
    pub const fn offset(strip: usize, row: usize) -> usize {
        row * ROW_WIDTH + strip * BLOCK_WIDTH
    }

    fn block(&self, strip: usize, row: usize) -> &[u8] {
        let start = Self::offset(strip, row);
        &self.chars[start..start + BLOCK_WIDTH]
    }

    /// Text of one block with trailing spaces removed
    pub fn text(&self, strip: u8, row: u8) -> Option<String> {
        let (strip, row) = (strip as usize, row as usize);
        if strip >= STRIPS || row >= ROWS {
            return None;
        }
        let text: String = self.block(strip, row).iter().map(|&b| b as char).collect();
        Some(text.trim_end_matches(' ').to_string())
    }

    /// All 56 characters of a row, untrimmed
    pub fn row_text(&self, row: u8) -> Option<String> {
        let row = row as usize;
        if row >= ROWS {
            return None;
        }
        let start = row * ROW_WIDTH;
        Some(self.chars[start..start + ROW_WIDTH].iter().map(|&b| b as char).collect())
    }

    /// Any strip separator of the row overwritten means free text
    fn is_global(&self, row: usize) -> bool {
        (0..STRIPS).any(|strip| self.chars[Self::offset(strip, row) + SEPARATOR_COLUMN] != b' ')
    }

    /// Merge a display frame payload into the buffer
    ///
    /// Returns `None` if the frame is malformed or overflows the buffer,
    /// otherwise the blocks whose content differs from `strips`' caches.
    /// The caches are updated for every reported block.
    pub fn apply(&mut self, payload: &[u8], strips: &mut [StripState; STRIPS]) -> Option<Vec<DisplayChange>> {
        let (&start, text) = payload.split_first()?;
        let start = start as usize;
        let end = start + text.len();

        if end > DISPLAY_SIZE {
            trace!("Display frame overflows buffer: offset {} + {} bytes", start, text.len());
            return None;
        }

        self.chars[start..end].copy_from_slice(text);

        let global = [self.is_global(0), self.is_global(1)];

        // A frame ending on a block boundary still touches the next block.
        let first = start / BLOCK_WIDTH;
        let last = (end / BLOCK_WIDTH).min(BLOCKS - 1);

        let mut changes = Vec::new();
        for block in first..=last {
            let (strip, row) = (block % STRIPS, block / STRIPS);
            let cache = &mut strips[strip].display_cache[row];

            let current = self.block(strip, row);
            if current == &cache[..] {
                continue;
            }

            cache.copy_from_slice(current);
            changes.push(DisplayChange {
                global: global[row],
                strip: strip as u8,
                row: row as u8,
            });
        }

        Some(changes)
    }
}
