//! A terminal "in progress" indicator for the scoring call.

use std::io::Write;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const INTERVAL: Duration = Duration::from_millis(80);

/// The line drawn for one frame, e.g. `⠙ evaluating LP-1 (3s)`.
fn frame_line(tick: usize, message: &str, elapsed: Duration) -> String {
    let frame = FRAMES[tick % FRAMES.len()];
    format!("{frame} {message} ({}s)", elapsed.as_secs())
}

/// A spinner with an elapsed-seconds counter, drawn on stderr by a
/// background task so stdout stays clean.
pub struct Spinner {
    handle: JoinHandle<()>,
    cancel: tokio::sync::watch::Sender<bool>,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
        let message = message.to_string();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut tick = 0;
            loop {
                // \x1b[2K clears the line, \r returns to its start
                eprint!("\x1b[2K\r{}", frame_line(tick, &message, started.elapsed()));
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
                tick += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            cancel: cancel_tx,
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}
