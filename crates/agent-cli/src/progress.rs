//! Progress indicators for model calls and shell commands
//!
//! An [`Indicator`] animates while it is alive and clears itself when
//! dropped, so it disappears on every exit path of the awaited operation.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const THINKING_FRAMES: &[&str] = &["🤔", "💭", "🧠", "⚡"];
const LOADING_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const ASCII_FRAMES: &[&str] = &["|", "/", "-", "\\"];

/// A running spinner
pub struct Indicator {
    bar: ProgressBar,
}

impl Indicator {
    /// Slow spinner shown while the model is working
    pub fn thinking(message: impl Into<String>) -> Self {
        Self::start(message.into(), THINKING_FRAMES, Duration::from_millis(500))
    }

    /// Fast spinner shown while a command runs
    pub fn loading(message: impl Into<String>) -> Self {
        Self::start(message.into(), LOADING_FRAMES, Duration::from_millis(100))
    }

    fn start(message: String, frames: &[&str], tick: Duration) -> Self {
        let frames = if crate::ui::supports_unicode() {
            frames
        } else {
            ASCII_FRAMES
        };

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&with_final_frame(frames));
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(tick);

        Self { bar }
    }

    /// Stop and erase the spinner
    pub fn finish(self) {
        drop(self);
    }
}

impl Drop for Indicator {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// indicatif shows the last tick string once the bar is finished
fn with_final_frame<'a>(frames: &[&'a str]) -> Vec<&'a str> {
    let mut all = frames.to_vec();
    all.push(" ");
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_frame_appended() {
        let frames = with_final_frame(ASCII_FRAMES);
        assert_eq!(frames.len(), ASCII_FRAMES.len() + 1);
        assert_eq!(*frames.last().unwrap(), " ");
    }

    #[tokio::test]
    async fn test_indicator_clears_on_drop() {
        let indicator = Indicator::loading("Testing");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!indicator.bar.is_finished());
        let bar = indicator.bar.clone();
        indicator.finish();
        assert!(bar.is_finished());
    }
}
