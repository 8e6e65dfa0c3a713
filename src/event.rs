//! Event hub. Multiplexes terminal input, frame and clock ticks, data-dir
//! changes and fetch completions into a single async channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use tokio::sync::mpsc;

use portfolio_dashboard::list::{FetchPayload, RequestSeq};
use portfolio_dashboard::model::Table;
use portfolio_dashboard::store::StoreError;

use crate::app::ListId;

/// Roughly 30 frames per second.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug)]
pub enum Event {
    /// Terminal key press
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// Terminal resized
    Resize(u16, u16),
    /// Animation frame; scroll-spy work is batched here
    Frame,
    /// Periodic tick (1 second)
    Tick,
    /// A table file in the data dir changed
    StoreChanged(Vec<PathBuf>),
    /// A list fetch finished
    Fetched {
        list: ListId,
        seq: RequestSeq,
        result: Result<FetchPayload, StoreError>,
    },
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(data_dir: PathBuf, watch_enabled: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn crossterm event reader
        let tx_key = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(Ok(evt)) = reader.next().await {
                let event = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                    CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
                    CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                    _ => continue,
                };
                if tx_key.send(event).is_err() {
                    break;
                }
            }
        });

        spawn_ticker(tx.clone(), FRAME_INTERVAL, || Event::Frame);
        spawn_ticker(tx.clone(), Duration::from_secs(1), || Event::Tick);

        // Spawn file watcher (if enabled)
        if watch_enabled {
            let tx_watch = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = run_file_watcher(data_dir, tx_watch).await {
                    tracing::error!(error = %e, "file watcher failed");
                }
            });
        }

        EventHandler { tx, rx }
    }

    /// Handle for tasks that report back (fetches).
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

fn spawn_ticker(tx: mpsc::UnboundedSender<Event>, period: Duration, make: fn() -> Event) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(make()).is_err() {
                break;
            }
        }
    });
}

async fn run_file_watcher(
    data_dir: PathBuf,
    tx: mpsc::UnboundedSender<Event>,
) -> color_eyre::Result<()> {
    let (wtx, mut wrx) = mpsc::channel::<Vec<PathBuf>>(100);

    let mut debouncer = notify_debouncer_mini::new_debouncer(
        Duration::from_millis(300),
        move |result: notify_debouncer_mini::DebounceEventResult| {
            if let Ok(events) = result {
                let paths: Vec<_> = events
                    .iter()
                    .filter(|e| is_table_file(&e.path))
                    .map(|e| e.path.clone())
                    .collect();
                if !paths.is_empty() {
                    let _ = wtx.blocking_send(paths);
                }
            }
        },
    )?;

    debouncer
        .watcher()
        .watch(&data_dir, notify::RecursiveMode::NonRecursive)?;

    // Keep debouncer alive; forward events
    while let Some(paths) = wrx.recv().await {
        if tx.send(Event::StoreChanged(paths)).is_err() {
            break;
        }
    }

    Ok(())
}

fn is_table_file(path: &Path) -> bool {
    let ext_ok = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json" | "yaml" | "yml")
    );
    let stem = path.file_stem().and_then(|s| s.to_str());
    ext_ok && [Table::Projects, Table::Works].iter().any(|t| Some(t.name()) == stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_table_files_trigger_reload() {
        assert!(is_table_file(Path::new("data/portfolio_works.json")));
        assert!(is_table_file(Path::new("data/portfolio_projects.yaml")));
        assert!(!is_table_file(Path::new("data/portfolio_works.json.swp")));
        assert!(!is_table_file(Path::new("data/notes.json")));
    }
}
