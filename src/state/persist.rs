use crate::codec::encode;
use crate::models::Document;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use wasm_bindgen::JsCast;

/// Timer backend for [`Debouncer`]. Ids are the browser's timeout handles.
pub(crate) trait TimerHost: Clone + 'static {
    fn set_timeout(&self, cb: Box<dyn FnOnce()>, delay_ms: i32) -> Option<i32>;
    fn clear_timeout(&self, id: i32);
}

#[derive(Clone, Copy, Default)]
pub(crate) struct WindowTimers;

impl TimerHost for WindowTimers {
    fn set_timeout(&self, cb: Box<dyn FnOnce()>, delay_ms: i32) -> Option<i32> {
        let win = web_sys::window()?;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || cb());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay_ms,
        )
        .ok()
    }

    fn clear_timeout(&self, id: i32) {
        if let Some(win) = web_sys::window() {
            win.clear_timeout_with_handle(id);
        }
    }
}

/// Trailing-edge debounce: each call cancels the pending one and re-arms the
/// timer, so only the last call of a burst runs.
#[derive(Clone)]
pub(crate) struct Debouncer<H: TimerHost> {
    host: H,
    delay_ms: i32,
    pending: Arc<Mutex<Option<i32>>>,
}

impl<H: TimerHost> Debouncer<H> {
    pub fn new(host: H, delay_ms: i32) -> Self {
        Self {
            host,
            delay_ms,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn call(&self, f: impl FnOnce() + 'static) {
        self.cancel();

        let pending = self.pending.clone();
        let cb = Box::new(move || {
            if let Ok(mut p) = pending.lock() {
                *p = None;
            }
            f();
        });

        let tid = self.host.set_timeout(cb, self.delay_ms);
        if let Ok(mut p) = self.pending.lock() {
            *p = tid;
        }
    }

    pub fn cancel(&self) {
        let prev = self.pending.lock().ok().and_then(|mut p| p.take());
        if let Some(tid) = prev {
            self.host.clear_timeout(tid);
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.lock().map(|p| p.is_some()).unwrap_or(false)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    #[error("no browser window")]
    NoWindow,

    #[error("location.hash assignment failed: {0}")]
    SetHash(String),
}

/// Where an encoded document ends up.
pub(crate) trait FragmentWriter: Clone + 'static {
    /// Current fragment, without the leading `#`.
    fn current(&self) -> Option<String>;

    fn write(&self, fragment: &str, title: &str) -> Result<(), PersistError>;
}

/// Writes into the address bar, preferring a history entry so back/forward
/// navigate between saved states.
#[derive(Clone, Copy, Default)]
pub(crate) struct AddressBar;

impl FragmentWriter for AddressBar {
    fn current(&self) -> Option<String> {
        let hash = web_sys::window()?.location().hash().ok()?;
        Some(hash.strip_prefix('#').unwrap_or(&hash).to_string())
    }

    fn write(&self, fragment: &str, title: &str) -> Result<(), PersistError> {
        let win = web_sys::window().ok_or(PersistError::NoWindow)?;
        let url = format!("#{fragment}");

        if let Some(doc) = win.document() {
            doc.set_title(title);
        }

        let pushed = win.history().and_then(|h| {
            h.push_state_with_url(&wasm_bindgen::JsValue::NULL, title, Some(url.as_str()))
        });

        match pushed {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("pushState unavailable ({e:?}); assigning location.hash");
                win.location()
                    .set_hash(&url)
                    .map_err(|e| PersistError::SetHash(format!("{e:?}")))
            }
        }
    }
}

/// Debounced `encode` + fragment write.
#[derive(Clone)]
pub(crate) struct PersistSink<H: TimerHost, W: FragmentWriter> {
    debouncer: Debouncer<H>,
    writer: W,
    app_title: String,
    on_written: Arc<dyn Fn(usize) + Send + Sync>,
    last_written: Arc<Mutex<Option<String>>>,
}

impl<H: TimerHost, W: FragmentWriter> PersistSink<H, W> {
    pub fn new(host: H, writer: W, delay_ms: i32, app_title: String) -> Self {
        Self {
            debouncer: Debouncer::new(host, delay_ms),
            writer,
            app_title,
            on_written: Arc::new(|_| {}),
            last_written: Arc::new(Mutex::new(None)),
        }
    }

    /// Called with the fragment length after each write.
    pub fn on_written(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_written = Arc::new(f);
        self
    }

    /// Schedules `doc` to be written once edits go quiet. A later call
    /// replaces it.
    pub fn schedule(&self, doc: Document) {
        let s2 = self.clone();
        self.debouncer.call(move || {
            if let Err(e) = s2.flush(&doc) {
                log::error!("could not persist document: {e}");
            }
        });
    }

    /// Writes `doc` immediately.
    pub fn flush(&self, doc: &Document) -> Result<(), PersistError> {
        let fragment = encode(doc);

        if self.writer.current().as_deref() == Some(fragment.as_str()) {
            log::debug!("fragment unchanged; skipping write");
            self.remember(&fragment);
            return Ok(());
        }

        let title = window_title(doc, &self.app_title);
        self.writer.write(&fragment, &title)?;
        self.remember(&fragment);
        log::debug!(
            "persisted {} block(s) in {} chars",
            doc.block_order.len(),
            fragment.len()
        );
        (self.on_written)(fragment.len() + 1);
        Ok(())
    }

    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    /// Records `fragment` as the one the address bar holds on our behalf.
    pub fn remember(&self, fragment: &str) {
        if let Ok(mut last) = self.last_written.lock() {
            *last = Some(fragment.to_string());
        }
    }

    /// Whether `fragment` is the last one written (or restored) here. A
    /// `hashchange` for it is our own write arriving late, not navigation.
    pub fn is_own_write(&self, fragment: &str) -> bool {
        self.last_written
            .lock()
            .map(|last| last.as_deref() == Some(fragment))
            .unwrap_or(false)
    }
}

/// `"<first block title> - <app>"`, or just the app title when empty.
pub(crate) fn window_title(doc: &Document, app_title: &str) -> String {
    match doc.block_at(0) {
        Some(b) => format!("{} - {app_title}", b.title),
        None => app_title.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{ManualTimers, RecordingWriter};
    use super::*;
    use crate::codec::decode;
    use crate::state::mutation::{apply, BlockStamp, Intent};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stamp() -> BlockStamp<'static> {
        BlockStamp {
            now_ms: 1,
            creator: "me",
            mint_content_key: || "k".to_string(),
        }
    }

    fn doc_with(title: &str) -> Document {
        apply(
            &Document::empty(),
            Intent::CreateBlock {
                title: title.to_string(),
            },
            &stamp(),
        )
        .expect("create never fails")
    }

    #[test]
    fn test_debouncer_runs_only_last_call() {
        let timers = ManualTimers::default();
        let d = Debouncer::new(timers.clone(), 200);
        let hits = Rc::new(Cell::new(0));
        let last = Rc::new(Cell::new(0));

        for i in 1..=3 {
            let hits = hits.clone();
            let last = last.clone();
            d.call(move || {
                hits.set(hits.get() + 1);
                last.set(i);
            });
        }

        assert_eq!(timers.armed(), 1);
        assert_eq!(timers.last_delay(), Some(200));
        assert!(d.is_pending());

        timers.fire_all();
        assert_eq!(hits.get(), 1);
        assert_eq!(last.get(), 3);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_debouncer_cancel() {
        let timers = ManualTimers::default();
        let d = Debouncer::new(timers.clone(), 50);
        let hit = Rc::new(Cell::new(false));
        let h2 = hit.clone();
        d.call(move || h2.set(true));
        d.cancel();
        timers.fire_all();
        assert!(!hit.get());
    }

    #[test]
    fn test_three_rapid_updates_persist_once_with_final_state() {
        let timers = ManualTimers::default();
        let writer = RecordingWriter::default();
        let written_len = Arc::new(AtomicUsize::new(0));
        let wl = written_len.clone();
        let sink = PersistSink::new(timers.clone(), writer.clone(), 200, "scratch".to_string())
            .on_written(move |n| wl.store(n, Ordering::SeqCst));

        let mut doc = doc_with("note");
        for text in ["a", "ab", "abc"] {
            let content = doc.blocks["note"]
                .content_state
                .with_plain_text(text, || "k".to_string());
            doc = apply(
                &doc,
                Intent::UpdateBlockContent {
                    key: "note".to_string(),
                    content,
                },
                &stamp(),
            )
            .expect("live key");
            sink.schedule(doc.clone());
        }

        assert!(writer.writes.borrow().is_empty());
        timers.fire_all();

        let writes = writer.writes.borrow();
        assert_eq!(writes.len(), 1);
        let restored = decode(&writes[0].0).expect("written fragment decodes");
        assert_eq!(restored, doc);
        assert_eq!(restored.blocks["note"].content_state.to_plain_text(), "abc");
        assert_eq!(writes[0].1, "note - scratch");
        assert_eq!(written_len.load(Ordering::SeqCst), writes[0].0.len() + 1);
    }

    #[test]
    fn test_flush_skips_unchanged_fragment() {
        let writer = RecordingWriter::default();
        let sink = PersistSink::new(ManualTimers::default(), writer.clone(), 200, "s".to_string());
        let doc = doc_with("x");

        sink.flush(&doc).expect("write");
        sink.flush(&doc).expect("write");
        assert_eq!(writer.writes.borrow().len(), 1);
    }

    #[test]
    fn test_sink_tracks_last_written_fragment() {
        let writer = RecordingWriter::default();
        let sink = PersistSink::new(ManualTimers::default(), writer.clone(), 200, "s".to_string());
        let first = doc_with("x");
        let second = doc_with("y");

        assert!(!sink.is_own_write(&encode(&first)));
        sink.flush(&first).expect("write");
        assert!(sink.is_own_write(&encode(&first)));

        sink.flush(&second).expect("write");
        assert!(sink.is_own_write(&encode(&second)));
        assert!(!sink.is_own_write(&encode(&first)));
    }

    #[test]
    fn test_window_title() {
        assert_eq!(window_title(&Document::empty(), "scratch"), "scratch");
        assert_eq!(window_title(&doc_with("hello"), "scratch"), "hello - scratch");
    }
}
