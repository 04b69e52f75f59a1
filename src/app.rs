use crate::commands::{self, Action};
use crate::event::{Event, EventHandler};
use crate::query::{Delivery, QueryState, RequestId};
use crate::render;
use crate::storefront::client::Family;
use crate::storefront::types::{Category, Region};
use crate::storefront::Storefront;
use chrono::Local;
use color_eyre::Result;
use std::future::Future;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Interactive browse session state
pub struct App<W: Write = Stdout> {
  storefront: Arc<Storefront>,

  /// Current market
  region: Region,

  /// Active aisle filter
  category: Option<Category>,

  /// Last product search, re-run when a filter changes
  query: String,

  /// Event sender for spawned requests
  event_tx: mpsc::UnboundedSender<Event>,

  out: W,

  /// Whether to quit
  should_quit: bool,
}

impl App<Stdout> {
  pub fn new(storefront: Arc<Storefront>, region: Region) -> Self {
    Self::with_writer(storefront, region, io::stdout())
  }
}

impl<W: Write> App<W> {
  pub fn with_writer(storefront: Arc<Storefront>, region: Region, out: W) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      storefront,
      region,
      category: None,
      query: String::new(),
      event_tx: tx,
      out,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut events = EventHandler::new();
    self.event_tx = events.sender();

    writeln!(self.out, "{}", render::header(self.region, self.category))?;
    writeln!(self.out, "Type 'help' for commands.")?;
    self.refresh_products();
    self.prompt()?;

    while !self.should_quit {
      match events.next().await {
        Some(event) => self.handle_event(event)?,
        None => break,
      }
    }

    Ok(())
  }

  fn prompt(&mut self) -> Result<()> {
    write!(self.out, "> ")?;
    self.out.flush()?;
    Ok(())
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Input(line) => self.handle_line(&line),
      Event::InputClosed => {
        self.should_quit = true;
        Ok(())
      }
      Event::Delivered(family, delivery) => self.handle_delivery(family, delivery),
    }
  }

  fn handle_line(&mut self, line: &str) -> Result<()> {
    if !line.trim().is_empty() {
      match commands::parse_line(line) {
        Ok(action) => self.execute(action)?,
        Err(msg) => writeln!(self.out, "{}", msg)?,
      }
    }

    if !self.should_quit {
      self.prompt()?;
    }
    Ok(())
  }

  fn execute(&mut self, action: Action) -> Result<()> {
    match action {
      Action::Search(query) => {
        self.query = query;
        self.refresh_products();
      }
      Action::Category(category) => {
        self.category = category;
        writeln!(self.out, "{}", render::header(self.region, self.category))?;
        self.refresh_products();
      }
      Action::Region(region) => {
        self.region = region;
        writeln!(self.out, "{}", render::header(self.region, self.category))?;
        self.refresh_products();
      }
      Action::Prices(product) => {
        let region = self.region;
        self.spawn(Family::BuyingOptions, move |storefront, id| async move {
          storefront.refresh_buying_options(id, &product, region).await
        });
      }
      Action::Insights => {
        let region = self.region;
        self.spawn(Family::Insights, move |storefront, id| async move {
          storefront.refresh_insights(id, region).await
        });
      }
      Action::Resources(location) => {
        let region = self.region;
        self.spawn(Family::LocalResources, move |storefront, id| async move {
          storefront.refresh_local_resources(id, &location, region).await
        });
      }
      Action::Help => write!(self.out, "{}", render::help())?,
      Action::Quit => self.should_quit = true,
    }
    Ok(())
  }

  fn refresh_products(&self) {
    let query = self.query.clone();
    let region = self.region;
    let category = self.category;
    self.spawn(Family::Products, move |storefront, id| async move {
      storefront
        .refresh_products(id, &query, region, category)
        .await
    });
  }

  /// Run a race-guarded request in the background and report back when done.
  ///
  /// The request id is taken here, before the task is spawned, so dispatch
  /// order decides which request wins.
  fn spawn<F, Fut>(&self, family: Family, request: F)
  where
    F: FnOnce(Arc<Storefront>, RequestId) -> Fut,
    Fut: Future<Output = Delivery> + Send + 'static,
  {
    let id = self.storefront.begin(family);
    let request = request(self.storefront.clone(), id);
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let delivery = request.await;
      let _ = tx.send(Event::Delivered(family, delivery));
    });
  }

  /// Redraw a family's results, but only when this request is the one that
  /// reached the visible state.
  fn handle_delivery(&mut self, family: Family, delivery: Delivery) -> Result<()> {
    if let Delivery::Superseded { id, latest } = delivery {
      debug!(?family, id = id.get(), latest = latest.get(), "Skipping redraw for superseded request");
      return Ok(());
    }

    match family {
      Family::Products => self.draw(self.storefront.products_state(), render::products),
      Family::BuyingOptions => {
        self.draw(self.storefront.buying_options_state(), render::buying_options)
      }
      Family::Insights => self.draw(self.storefront.insights_state(), render::insights),
      Family::LocalResources => {
        self.draw(self.storefront.local_resources_state(), render::local_resources)
      }
    }
  }

  fn draw<T>(&mut self, state: QueryState<Vec<T>>, render: fn(&[T]) -> String) -> Result<()> {
    debug!(request = ?state.applied.map(RequestId::get), "Redrawing");

    writeln!(self.out)?;
    write!(self.out, "{}", render(state.data().map(Vec::as_slice).unwrap_or_default()))?;
    if let Some(fetched_at) = state.fetched_at {
      writeln!(
        self.out,
        "(updated {})",
        fetched_at.with_timezone(&Local).format("%H:%M:%S")
      )?;
    }
    self.prompt()
  }
}
