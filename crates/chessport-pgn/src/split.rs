use std::iter::FusedIterator;

use chessport_types::game::{is_tag_line, GameRecord};

/// Lazy iterator over the games of a multi-game PGN text.
///
/// A game starts at the first tag line that follows move text or a blank
/// line after a header, so a game without moves still stands alone. The
/// yielded slices are contiguous, so concatenating them gives back the input.
#[derive(Debug, Clone)]
pub struct Games<'a> {
    text: &'a str,
    pos: usize,
}

pub fn split_games(text: &str) -> Games<'_> {
    let pos = if text.trim().is_empty() { text.len() } else { 0 };
    Games { text, pos }
}

/// Splits `text` and trims surrounding whitespace from each game.
pub fn parse_games(text: &str) -> impl Iterator<Item = GameRecord> + '_ {
    split_games(text).map(|raw| GameRecord::new(raw.trim()))
}

impl<'a> Games<'a> {
    fn next_boundary(&self) -> usize {
        let mut offset = self.pos;
        let mut seen_tag = false;
        let mut header_closed = false;
        for line in self.text[self.pos..].split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            if is_tag_line(line) {
                if header_closed {
                    return start;
                }
                seen_tag = true;
            } else if seen_tag {
                // Move text or a blank line both end the header.
                header_closed = true;
            }
        }
        self.text.len()
    }
}

impl<'a> Iterator for Games<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let end = self.next_boundary();
        let game = &self.text[self.pos..end];
        self.pos = end;
        Some(game)
    }
}

impl FusedIterator for Games<'_> {}
