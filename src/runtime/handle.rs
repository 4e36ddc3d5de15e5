use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    combo::NumberSet,
    core::{
        history::{Draw, DrawHistory, HistoryError},
        store::{ComboStore, StoreError},
    },
    engine::{ComboView, FilterEngine},
    favorites::{FavoriteFilter, FavoriteStore, FavoritesError},
    filter::{FilterError, FilterSpec, PageResult},
    op::{SideOp, StoredOp},
    persist::{PersistError, Storage},
    suggestions::{SavedSuggestion, SuggestionStore, SuggestionsError},
    types::{ComboId, ContestNumber, FavoriteId, OpSeq, SuggestionId},
};

use super::events::LotoEvent;

/// Failure surfaced through the runtime handle.
#[derive(Debug)]
pub enum RuntimeError {
    /// FilterSpec validation failure.
    Filter(FilterError),
    /// Universe lookup failure.
    Store(StoreError),
    /// Draw history failure.
    History(HistoryError),
    /// Favorite store failure.
    Favorites(FavoritesError),
    /// Suggestion store failure.
    Suggestions(SuggestionsError),
    /// Persistence failure.
    Persist(PersistError),
    /// The caller lacks the administrative purge capability.
    Forbidden,
    /// The runtime loop is gone.
    ChannelClosed,
}

impl From<FilterError> for RuntimeError {
    fn from(value: FilterError) -> Self {
        Self::Filter(value)
    }
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<HistoryError> for RuntimeError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<FavoritesError> for RuntimeError {
    fn from(value: FavoritesError) -> Self {
        Self::Favorites(value)
    }
}

impl From<SuggestionsError> for RuntimeError {
    fn from(value: SuggestionsError) -> Self {
        Self::Suggestions(value)
    }
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Tuning knobs for the runtime loop and its persistence worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Whether the administrative purge capability is granted.
    pub allow_purge: bool,
    /// Flush the backing store eagerly after every mutation batch.
    pub flush_on_write: bool,
    /// Largest op batch handed to the backing store in one call.
    pub batch_max_ops: usize,
    /// Longest an op may sit buffered before a deadline flush.
    pub batch_max_latency_ms: u64,
    /// Bound of the persistence queue; overflow surfaces as an error.
    pub persist_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            allow_purge: false,
            flush_on_write: true,
            batch_max_ops: 32,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
        }
    }
}

/// Cloneable handle to the single-writer runtime loop.
pub struct LotoHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LotoEvent>,
}

impl Clone for LotoHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Search {
        spec: FilterSpec,
        resp: oneshot::Sender<Result<PageResult<ComboView>, RuntimeError>>,
    },
    GetCombo {
        id: ComboId,
        resp: oneshot::Sender<Result<ComboView, RuntimeError>>,
    },
    RecordDraw {
        draw: Draw,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    RemoveDraw {
        contest_number: ContestNumber,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    PurgeDraws {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SaveFavorite {
        name: String,
        spec: FilterSpec,
        resp: oneshot::Sender<Result<FavoriteId, RuntimeError>>,
    },
    ListFavorites {
        resp: oneshot::Sender<Vec<FavoriteFilter>>,
    },
    LoadFavorite {
        id: FavoriteId,
        resp: oneshot::Sender<Result<FilterSpec, RuntimeError>>,
    },
    DeleteFavorite {
        id: FavoriteId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    SaveSuggestion {
        numbers: Vec<u8>,
        kind: String,
        resp: oneshot::Sender<Result<SuggestionId, RuntimeError>>,
    },
    ListSuggestions {
        page: u32,
        page_size: u32,
        resp: oneshot::Sender<PageResult<SavedSuggestion>>,
    },
    DeleteSuggestion {
        id: SuggestionId,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    ClearSuggestions {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    ExportSuggestions {
        resp: oneshot::Sender<Vec<u8>>,
    },
    Flush {
        resp: oneshot::Sender<Result<OpSeq, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Op(StoredOp),
    Flush {
        resp: oneshot::Sender<Result<OpSeq, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct LoopState {
    engine: FilterEngine,
    favorites: FavoriteStore,
    suggestions: SuggestionStore,
    next_op_seq: OpSeq,
}

impl LoopState {
    fn next_stored(&mut self, op: SideOp) -> StoredOp {
        let seq = self.next_op_seq;
        self.next_op_seq += 1;
        StoredOp {
            seq,
            ts_ms: now_ms(),
            op,
        }
    }

    fn latest_op_seq(&self) -> OpSeq {
        self.next_op_seq.saturating_sub(1)
    }
}

/// Spawns the runtime over `store`, restoring persisted state from
/// `storage` when given, and returns a handle to it.
///
/// The loaded draws are validated and the score snapshot is computed once
/// before the loop starts serving queries.
pub fn spawn_lotofiltro(
    store: ComboStore,
    storage: Option<Box<dyn Storage>>,
    config: RuntimeConfig,
) -> Result<LotoHandle, RuntimeError> {
    let persisted = match &storage {
        Some(backing) => backing.load()?,
        None => Default::default(),
    };

    let history = DrawHistory::from_draws(persisted.draws)?;
    let mut state = LoopState {
        engine: FilterEngine::with_history(store, history),
        favorites: FavoriteStore::from_records(persisted.favorites),
        suggestions: SuggestionStore::from_records(persisted.suggestions),
        next_op_seq: 1,
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<LotoEvent>(1024);

    let (persist_tx_opt, mut durable_rx) = if let Some(backing) = storage {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<OpSeq, PersistError>>();
        spawn_persistence_worker(backing, persist_rx, durable_tx, config.clone());
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        loop {
            if let Some(rx) = durable_rx.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break; };
                        if handle_command(cmd, &mut state, &events_tx_loop, persist_tx_opt.as_ref(), &config).await {
                            break;
                        }
                    }
                    durable = rx.recv() => {
                        if let Some(Ok(op_seq)) = durable {
                            let _ = events_tx_loop.send(LotoEvent::DurableUpTo { op_seq });
                        }
                    }
                }
            } else {
                let Some(cmd) = cmd_rx.recv().await else { break; };
                if handle_command(cmd, &mut state, &events_tx_loop, persist_tx_opt.as_ref(), &config).await {
                    break;
                }
            }
        }
    });

    Ok(LotoHandle { cmd_tx, events_tx })
}

impl LotoHandle {
    /// Subscribes to the runtime event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LotoEvent> {
        self.events_tx.subscribe()
    }

    /// Runs a filter query, returning one page of combination summaries.
    pub async fn search(&self, spec: FilterSpec) -> Result<PageResult<ComboView>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Search { spec, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Looks up one combination by id.
    pub async fn get_combo(&self, id: ComboId) -> Result<ComboView, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::GetCombo { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Records an official draw.
    pub async fn record_draw(&self, draw: Draw) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RecordDraw { draw, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Removes one recorded draw.
    pub async fn remove_draw(&self, contest_number: ContestNumber) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RemoveDraw {
                contest_number,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Purges the whole draw history. Requires the purge capability.
    pub async fn purge_draws(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PurgeDraws { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves a filter spec under `name`, returning the new favorite id.
    pub async fn save_favorite(
        &self,
        name: impl Into<String>,
        spec: FilterSpec,
    ) -> Result<FavoriteId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SaveFavorite {
                name: name.into(),
                spec,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Lists every saved favorite.
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteFilter>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListFavorites { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Loads the filter spec stored under favorite `id`.
    pub async fn load_favorite(&self, id: FavoriteId) -> Result<FilterSpec, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::LoadFavorite { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Deletes favorite `id`.
    pub async fn delete_favorite(&self, id: FavoriteId) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DeleteFavorite { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Saves a suggestion, scoring it against the latest draw.
    pub async fn save_suggestion(
        &self,
        numbers: Vec<u8>,
        kind: impl Into<String>,
    ) -> Result<SuggestionId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::SaveSuggestion {
                numbers,
                kind: kind.into(),
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Lists saved suggestions, newest first.
    pub async fn list_suggestions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<PageResult<SavedSuggestion>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ListSuggestions {
                page,
                page_size,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Deletes suggestion `id`.
    pub async fn delete_suggestion(&self, id: SuggestionId) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::DeleteSuggestion { id, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Clears the suggestion history.
    pub async fn clear_suggestions(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ClearSuggestions { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Exports the suggestion history as CSV bytes.
    pub async fn export_suggestions(&self) -> Result<Vec<u8>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::ExportSuggestions { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Forces the persistence worker to flush, returning the durable seq.
    pub async fn flush(&self) -> Result<OpSeq, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Drains persistence and stops the runtime loop.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    state: &mut LoopState,
    events_tx: &broadcast::Sender<LotoEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    config: &RuntimeConfig,
) -> bool {
    match cmd {
        Command::Search { spec, resp } => {
            let _ = resp.send(state.engine.search(&spec).map_err(RuntimeError::from));
        }
        Command::GetCombo { id, resp } => {
            let _ = resp.send(state.engine.get(id).map_err(RuntimeError::from));
        }
        Command::RecordDraw { draw, resp } => {
            let contest_number = draw.contest_number;
            let res = state
                .engine
                .record_draw(draw.clone())
                .map_err(RuntimeError::from)
                .and_then(|()| {
                    let stored = state.next_stored(SideOp::AppendDraw { draw });
                    emit_durable(state, events_tx, persist_tx, stored)?;
                    tracing::info!(contest_number, "draw recorded, scores republished");
                    let _ = events_tx.send(LotoEvent::DrawRecorded { contest_number });
                    Ok(())
                });
            let _ = resp.send(res);
        }
        Command::RemoveDraw {
            contest_number,
            resp,
        } => {
            let res = state
                .engine
                .remove_draw(contest_number)
                .map_err(RuntimeError::from)
                .and_then(|_removed| {
                    let stored = state.next_stored(SideOp::RemoveDraw { contest_number });
                    emit_durable(state, events_tx, persist_tx, stored)?;
                    tracing::info!(contest_number, "draw removed, scores republished");
                    let _ = events_tx.send(LotoEvent::DrawRemoved { contest_number });
                    Ok(())
                });
            let _ = resp.send(res);
        }
        Command::PurgeDraws { resp } => {
            let res = if !config.allow_purge {
                Err(RuntimeError::Forbidden)
            } else {
                state.engine.purge_draws();
                let stored = state.next_stored(SideOp::PurgeDraws);
                emit_durable(state, events_tx, persist_tx, stored).map(|()| {
                    tracing::info!("draw history purged, scores reset");
                    let _ = events_tx.send(LotoEvent::DrawsPurged);
                })
            };
            let _ = resp.send(res);
        }
        Command::SaveFavorite { name, spec, resp } => {
            let res = state
                .favorites
                .save(&name, &spec, now_ms())
                .map_err(RuntimeError::from)
                .and_then(|(favorite, replaced)| {
                    let id = favorite.id;
                    let stored = state.next_stored(SideOp::SaveFavorite { favorite, replaced });
                    emit_durable(state, events_tx, persist_tx, stored)?;
                    let _ = events_tx.send(LotoEvent::FavoriteSaved { id });
                    Ok(id)
                });
            let _ = resp.send(res);
        }
        Command::ListFavorites { resp } => {
            let _ = resp.send(state.favorites.list());
        }
        Command::LoadFavorite { id, resp } => {
            let _ = resp.send(state.favorites.load_spec(id).map_err(RuntimeError::from));
        }
        Command::DeleteFavorite { id, resp } => {
            let res = state
                .favorites
                .delete(id)
                .map_err(RuntimeError::from)
                .and_then(|_removed| {
                    let stored = state.next_stored(SideOp::DeleteFavorite { id });
                    emit_durable(state, events_tx, persist_tx, stored)?;
                    let _ = events_tx.send(LotoEvent::FavoriteDeleted { id });
                    Ok(())
                });
            let _ = resp.send(res);
        }
        Command::SaveSuggestion {
            numbers,
            kind,
            resp,
        } => {
            let res = match NumberSet::from_numbers(&numbers) {
                Err(e) => Err(RuntimeError::Suggestions(SuggestionsError::InvalidNumbers {
                    reason: e.to_string(),
                })),
                Ok(set) => {
                    let score = state.engine.match_score_for(set);
                    state
                        .suggestions
                        .save(set, &kind, score, now_ms())
                        .map_err(RuntimeError::from)
                        .and_then(|suggestion| {
                            let id = suggestion.id;
                            let stored = state.next_stored(SideOp::SaveSuggestion { suggestion });
                            emit_durable(state, events_tx, persist_tx, stored)?;
                            let _ = events_tx.send(LotoEvent::SuggestionSaved { id });
                            Ok(id)
                        })
                }
            };
            let _ = resp.send(res);
        }
        Command::ListSuggestions {
            page,
            page_size,
            resp,
        } => {
            let _ = resp.send(state.suggestions.list_page(page, page_size));
        }
        Command::DeleteSuggestion { id, resp } => {
            let res = state
                .suggestions
                .delete(id)
                .map_err(RuntimeError::from)
                .and_then(|_removed| {
                    let stored = state.next_stored(SideOp::DeleteSuggestion { id });
                    emit_durable(state, events_tx, persist_tx, stored)?;
                    let _ = events_tx.send(LotoEvent::SuggestionDeleted { id });
                    Ok(())
                });
            let _ = resp.send(res);
        }
        Command::ClearSuggestions { resp } => {
            state.suggestions.clear();
            let stored = state.next_stored(SideOp::ClearSuggestions);
            let res = emit_durable(state, events_tx, persist_tx, stored).map(|()| {
                let _ = events_tx.send(LotoEvent::SuggestionsCleared);
            });
            let _ = resp.send(res);
        }
        Command::ExportSuggestions { resp } => {
            let _ = resp.send(state.suggestions.export_csv());
        }
        Command::Flush { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (flush_tx, flush_rx) = oneshot::channel();
                if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    flush_rx
                        .await
                        .map_err(|_| RuntimeError::ChannelClosed)
                        .and_then(|r| r.map_err(RuntimeError::from))
                }
            } else {
                Ok(state.latest_op_seq())
            };
            let _ = resp.send(out);
        }
        Command::Shutdown { resp } => {
            let out = if let Some(tx) = persist_tx {
                let (done_tx, done_rx) = oneshot::channel();
                if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                    Err(RuntimeError::ChannelClosed)
                } else {
                    done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                }
            } else {
                Ok(())
            };
            let _ = resp.send(out);
            return true;
        }
    }

    false
}

fn emit_durable(
    state: &LoopState,
    events_tx: &broadcast::Sender<LotoEvent>,
    persist_tx: Option<&mpsc::Sender<PersistMsg>>,
    stored: StoredOp,
) -> Result<(), RuntimeError> {
    if let Some(tx) = persist_tx {
        enqueue_persist(tx, stored)
    } else {
        let _ = events_tx.send(LotoEvent::DurableUpTo {
            op_seq: state.latest_op_seq(),
        });
        Ok(())
    }
}

fn spawn_persistence_worker(
    backing: Box<dyn Storage>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    config: RuntimeConfig,
) {
    let backing = Arc::new(Mutex::new(backing));
    tokio::spawn(async move {
        let mut buf = Vec::<StoredOp>::new();
        let mut deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
        let mut last_durable: OpSeq = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_buf(&backing, &mut buf, &mut last_durable, &durable_tx, true).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Op(stored) => {
                            buf.push(stored);
                            if buf.len() >= config.batch_max_ops || config.flush_on_write {
                                let _ = flush_buf(&backing, &mut buf, &mut last_durable, &durable_tx, true).await;
                                deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = flush_buf(&backing, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                            deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = flush_buf(&backing, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !buf.is_empty() => {
                    let _ = flush_buf(&backing, &mut buf, &mut last_durable, &durable_tx, false).await;
                    deadline = Instant::now() + Duration::from_millis(config.batch_max_latency_ms);
                }
            }
        }
    });
}

async fn flush_buf(
    backing: &Arc<Mutex<Box<dyn Storage>>>,
    buf: &mut Vec<StoredOp>,
    last_durable: &mut OpSeq,
    durable_tx: &mpsc::UnboundedSender<Result<OpSeq, PersistError>>,
    call_flush: bool,
) -> Result<(), PersistError> {
    if buf.is_empty() {
        if call_flush {
            let backing_ref = Arc::clone(backing);
            tokio::task::spawn_blocking(move || {
                let mut backing = backing_ref.blocking_lock();
                backing.flush()
            })
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        }
        return Ok(());
    }

    let ops = std::mem::take(buf);
    let backing_ref = Arc::clone(backing);
    let append_res: Result<OpSeq, PersistError> = tokio::task::spawn_blocking(move || {
        let mut backing = backing_ref.blocking_lock();
        let seq = backing.apply_ops(&ops)?;
        if call_flush {
            backing.flush()?;
        }
        Ok(seq)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    match append_res {
        Ok(seq) => {
            *last_durable = (*last_durable).max(seq);
            let _ = durable_tx.send(Ok(*last_durable));
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = ?err, "persistence batch failed");
            let _ = durable_tx.send(Err(PersistError::Message(format!("apply failed: {err:?}"))));
            Err(err)
        }
    }
}

fn enqueue_persist(tx: &mpsc::Sender<PersistMsg>, stored: StoredOp) -> Result<(), RuntimeError> {
    tx.try_send(PersistMsg::Op(stored))
        .map_err(|err| RuntimeError::Persist(PersistError::Message(format!("persist queue error: {err}"))))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
