//! In-process stand-in for the content API, used by tests.

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use super::client::{ContentApi, ContentError, ContentReply, GenerateRequest};

type Responder = Box<dyn Fn(&GenerateRequest) -> Result<ContentReply, ContentError> + Send + Sync>;

/// Content API double with scripted replies and per-prompt gates.
pub struct FakeApi {
  respond: Responder,
  calls: AtomicUsize,
  gates: Mutex<Vec<(String, oneshot::Receiver<()>)>>,
  started: mpsc::UnboundedSender<String>,
}

impl FakeApi {
  pub fn new(
    respond: impl Fn(&GenerateRequest) -> Result<ContentReply, ContentError> + Send + Sync + 'static,
  ) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
    let (started, started_rx) = mpsc::unbounded_channel();
    let api = Self {
      respond: Box::new(respond),
      calls: AtomicUsize::new(0),
      gates: Mutex::new(Vec::new()),
      started,
    };
    (Arc::new(api), started_rx)
  }

  /// Hold back replies to prompts containing `marker` until the sender fires.
  pub fn gate(&self, marker: &str) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.gates.lock().unwrap().push((marker.to_string(), rx));
    tx
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl ContentApi for FakeApi {
  fn generate<'a>(
    &'a self,
    request: &'a GenerateRequest,
  ) -> BoxFuture<'a, Result<ContentReply, ContentError>> {
    Box::pin(async move {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let _ = self.started.send(request.prompt.clone());

      let gate = {
        let mut gates = self.gates.lock().unwrap();
        gates
          .iter()
          .position(|(marker, _)| request.prompt.contains(marker.as_str()))
          .map(|i| gates.remove(i).1)
      };
      if let Some(gate) = gate {
        let _ = gate.await;
      }

      (self.respond)(request)
    })
  }
}

pub fn text(body: &str) -> Result<ContentReply, ContentError> {
  Ok(ContentReply {
    text: Some(body.to_string()),
    grounding: Vec::new(),
  })
}

pub fn products_named(name: &str) -> Result<ContentReply, ContentError> {
  text(&format!(
    r#"```json
[{{"id":"{name}-1","name":"{name}","brand":"Stander","description":"d","price":"99","currency":"USD","category":"Mobility","reasoning":"r","imageUrl":"https://remote.example/img.png"}}]
```"#
  ))
}
