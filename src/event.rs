use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::query::Delivery;
use crate::storefront::client::Family;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// A line typed by the user
  Input(String),
  /// Standard input was closed
  InputClosed,
  /// A spawned request finished
  Delivered(Family, Delivery),
}

/// Event handler that produces events from standard input and spawned tasks
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn stdin line reader
    tokio::spawn(read_lines(tokio::io::stdin(), tx.clone()));

    Self { tx, rx }
  }

  /// Sender for tasks that report back to the event loop
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Forward each line as an input event. End of input and read errors both
/// close the session.
async fn read_lines<R: AsyncRead + Unpin>(reader: R, input_tx: mpsc::UnboundedSender<Event>) {
  let mut lines = BufReader::new(reader).lines();
  loop {
    match lines.next_line().await {
      Ok(Some(line)) => {
        if input_tx.send(Event::Input(line)).is_err() {
          break;
        }
      }
      Ok(None) => {
        let _ = input_tx.send(Event::InputClosed);
        break;
      }
      Err(e) => {
        warn!(error = %e, "Failed to read input, ending session");
        let _ = input_tx.send(Event::InputClosed);
        break;
      }
    }
  }
}
