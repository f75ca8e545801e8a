//! Word-by-word reveal of assistant replies.
//!
//! A [`Typewriter`] is a finite, timed sequence of growing prefixes of its
//! target text: one more word every `delay`. It cannot be rewound.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Default pause between two revealed words.
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(30);

pub struct Typewriter {
    words: Vec<String>,
    shown: usize,
    ticker: Option<Interval>,
}

impl Typewriter {
    pub fn new(text: &str, delay: Duration) -> Self {
        // Splitting on single spaces keeps runs of spaces intact once rejoined.
        let words = text.split(' ').map(str::to_string).collect();

        // A zero period would make `Interval` panic; reveal without waiting.
        let ticker = (!delay.is_zero()).then(|| {
            let mut ticker = interval_at(Instant::now() + delay, delay);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        Self {
            words,
            shown: 0,
            ticker,
        }
    }

    /// Wait for the next word and return the text revealed so far, or `None`
    /// once every word has been shown. Cancel-safe.
    pub async fn next_frame(&mut self) -> Option<String> {
        if self.is_done() {
            return None;
        }
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }
        self.shown += 1;
        Some(self.words[..self.shown].join(" "))
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.words.len()
    }

    /// Skip the remaining frames and return the full text.
    pub fn finish(&mut self) -> String {
        self.shown = self.words.len();
        self.words.join(" ")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_frames_are_growing_prefixes() {
        let mut typewriter = Typewriter::new("alpha beta gamma", DEFAULT_WORD_DELAY);
        let mut frames = Vec::new();
        while let Some(frame) = typewriter.next_frame().await {
            frames.push(frame);
        }
        assert_eq!(frames, vec!["alpha", "alpha beta", "alpha beta gamma"]);
        assert!(typewriter.next_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_frame_waits_for_the_delay() {
        let start = Instant::now();
        let mut typewriter = Typewriter::new("one two", Duration::from_millis(30));

        typewriter.next_frame().await.unwrap();
        let first = start.elapsed();
        assert!(first >= Duration::from_millis(30) && first < Duration::from_millis(60));
        typewriter.next_frame().await.unwrap();
        let second = start.elapsed();
        assert!(second >= Duration::from_millis(60) && second < Duration::from_millis(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_yields_single_empty_frame() {
        let mut typewriter = Typewriter::new("", DEFAULT_WORD_DELAY);
        assert_eq!(typewriter.len(), 1);
        assert_eq!(typewriter.next_frame().await.as_deref(), Some(""));
        assert!(typewriter.next_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_spaces_are_preserved() {
        let mut typewriter = Typewriter::new("a  b", DEFAULT_WORD_DELAY);
        let mut last = String::new();
        while let Some(frame) = typewriter.next_frame().await {
            last = frame;
        }
        assert_eq!(last, "a  b");
    }

    #[tokio::test]
    async fn test_zero_delay_reveals_immediately() {
        let mut typewriter = Typewriter::new("x y", Duration::ZERO);
        assert_eq!(typewriter.next_frame().await.as_deref(), Some("x"));
        assert_eq!(typewriter.next_frame().await.as_deref(), Some("x y"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_skips_remaining_frames() {
        let mut typewriter = Typewriter::new("alpha beta gamma", DEFAULT_WORD_DELAY);
        typewriter.next_frame().await.unwrap();
        assert_eq!(typewriter.finish(), "alpha beta gamma");
        assert!(typewriter.is_done());
        assert!(typewriter.next_frame().await.is_none());
    }
}
