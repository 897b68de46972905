pub(crate) mod mutation;
pub(crate) mod persist;

use crate::codec::{decode, decode_or_empty};
use crate::config::EnvConfig;
use crate::models::{Document, RawContent};
use crate::util::{mint_content_key, now_ms, today_key};
use leptos::ev;
use leptos::prelude::*;
use mutation::{apply, ensure_day_block, BlockStamp, Intent};
use persist::{AddressBar, FragmentWriter, PersistSink, WindowTimers};
use std::time::Duration;

/// The single owner of the document.
///
/// Every transition goes through [`AppState::dispatch`], which computes the
/// next document from the current one and replaces the signal's value.
#[derive(Clone)]
pub(crate) struct AppState {
    pub document: RwSignal<Document>,

    /// Index into `block_order` of the block that should hold focus.
    pub focus_idx: RwSignal<usize>,

    /// Length of the last written fragment (including `#`), for the footer.
    pub fragment_len: RwSignal<usize>,

    pub config: StoredValue<EnvConfig>,

    sink: PersistSink<WindowTimers, AddressBar>,
}

impl AppState {
    /// Restores the document from the address bar.
    pub fn new(config: EnvConfig) -> Self {
        let fragment = AddressBar.current().unwrap_or_default();
        let state = Self::with_document(config, decode_or_empty(&fragment));
        if !fragment.is_empty() {
            state.fragment_len.set(fragment.len() + 1);
            state.sink.remember(&fragment);
        }
        state
    }

    pub fn with_document(config: EnvConfig, doc: Document) -> Self {
        let fragment_len = RwSignal::new(0);
        let sink = PersistSink::new(
            WindowTimers,
            AddressBar,
            config.persist_debounce_ms,
            config.app_title.clone(),
        )
        .on_written(move |n| fragment_len.set(n));

        Self {
            document: RwSignal::new(doc),
            focus_idx: RwSignal::new(0),
            fragment_len,
            config: StoredValue::new(config),
            sink,
        }
    }

    fn stamp_with<T>(&self, f: impl FnOnce(&BlockStamp<'_>) -> T) -> T {
        self.config.with_value(|cfg| {
            f(&BlockStamp {
                now_ms: now_ms(),
                creator: &cfg.creator,
                mint_content_key,
            })
        })
    }

    /// Applies `intent`. Intents naming a key that is no longer live are
    /// logged and dropped. Returns whether the document changed.
    pub fn dispatch(&self, intent: Intent) -> bool {
        let kind = intent.kind();
        let is_create = matches!(intent, Intent::CreateBlock { .. });

        let next = self.stamp_with(|stamp| {
            self.document
                .with_untracked(|doc| apply(doc, intent, stamp))
        });

        match next {
            Ok(doc) => {
                log::debug!("{kind}: {} block(s)", doc.block_order.len());
                let len = doc.block_order.len();
                self.document.set(doc);
                if is_create {
                    self.focus_idx.set(0);
                } else if self.focus_idx.get_untracked() >= len {
                    self.focus_idx.set(len.saturating_sub(1));
                }
                true
            }
            Err(e) => {
                log::warn!("dropping {kind}: {e}");
                false
            }
        }
    }

    pub fn on_create_new_block(&self, title: String) {
        self.dispatch(Intent::CreateBlock { title });
    }

    pub fn on_update_block_content(&self, key: String, content: RawContent) {
        self.dispatch(Intent::UpdateBlockContent { key, content });
    }

    pub fn on_update_block_title(&self, key: String, title: String) {
        self.dispatch(Intent::UpdateBlockTitle { key, title });
    }

    pub fn on_delete_block(&self, key: String) {
        self.dispatch(Intent::DeleteBlock { key });
    }

    /// Creates today's journal block if it is missing.
    pub fn check_today_block(&self) {
        self.check_day_block(&today_key());
    }

    fn check_day_block(&self, day: &str) {
        let next = self.stamp_with(|stamp| {
            self.document
                .with_untracked(|doc| ensure_day_block(doc, day, stamp))
        });
        if let Some(doc) = next {
            log::info!("created journal block {day:?}");
            self.document.set(doc);
            self.focus_idx.set(0);
        }
    }

    pub fn focus_this(&self, idx: usize) {
        self.focus_idx.set(idx);
    }

    pub fn focus_next(&self, idx: usize) {
        let len = self.document.with_untracked(|d| d.block_order.len());
        if len > 0 {
            self.focus_idx.set((idx + 1) % len);
        }
    }

    pub fn focus_previous(&self, idx: usize) {
        let len = self.document.with_untracked(|d| d.block_order.len());
        if len > 0 {
            self.focus_idx.set((idx + len - 1) % len);
        }
    }

    /// Re-reads the fragment after back/forward navigation.
    fn on_fragment_changed(&self) {
        if let Some(fragment) = AddressBar.current() {
            self.follow_fragment(&fragment);
        }
    }

    /// Replaces the document with `fragment` unless it is one this state
    /// wrote itself; newer in-memory edits win over a late echo.
    fn follow_fragment(&self, fragment: &str) {
        if self.sink.is_own_write(fragment) {
            log::debug!("fragment change is our own write; ignoring");
            return;
        }

        match decode(fragment) {
            Ok(doc) => {
                log::info!("navigated to saved state ({} block(s))", doc.block_order.len());
                self.sink.remember(fragment);
                self.fragment_len.set(fragment.len() + 1);
                self.document.set(doc);
                self.focus_idx.set(0);
            }
            Err(e) => log::warn!("ignoring fragment change: {e}"),
        }
    }

    /// Wires persistence, the day-rollover check and history navigation to
    /// the current reactive owner. Everything is torn down with the owner.
    pub fn start(&self) {
        let s2 = self.clone();
        Effect::new(move |_| {
            let doc = s2.document.get();
            s2.sink.schedule(doc);
        });
        let sink = self.sink.clone();
        on_cleanup(move || sink.cancel());

        let s3 = self.clone();
        Effect::new(move |_| {
            s3.document.track();
            s3.check_today_block();
        });

        let interval_ms = self.config.with_value(|c| c.rollover_interval_ms);
        let s4 = self.clone();
        match set_interval_with_handle(
            move || s4.check_today_block(),
            Duration::from_millis(u64::from(interval_ms)),
        ) {
            Ok(handle) => on_cleanup(move || handle.clear()),
            Err(e) => log::error!("could not start day-rollover interval: {e:?}"),
        }

        let s5 = self.clone();
        let popstate = window_event_listener(ev::popstate, move |_ev: web_sys::PopStateEvent| {
            s5.on_fragment_changed();
        });
        let s6 = self.clone();
        let hashchange =
            window_event_listener(ev::hashchange, move |_ev: web_sys::HashChangeEvent| {
                s6.on_fragment_changed();
            });
        on_cleanup(move || {
            popstate.remove();
            hashchange.remove();
        });
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn with_state(doc: Document, f: impl FnOnce(AppState)) {
        let owner = Owner::new();
        owner.with(|| f(AppState::with_document(EnvConfig::default(), doc)));
    }

    #[test]
    fn test_create_moves_focus_to_first_block() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("a".to_string());
            s.on_create_new_block("b".to_string());
            s.focus_this(1);
            s.on_create_new_block("a".to_string());

            let doc = s.document.get_untracked();
            assert_eq!(doc.block_order, vec!["a 1", "b", "a"]);
            assert_eq!(s.focus_idx.get_untracked(), 0);
            assert_eq!(doc.blocks["a 1"].creator, "me");
        });
    }

    #[test]
    fn test_unknown_key_leaves_document_unchanged() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("a".to_string());
            let before = s.document.get_untracked();

            assert!(!s.dispatch(Intent::DeleteBlock {
                key: "missing".to_string()
            }));
            s.on_update_block_title("missing".to_string(), "x".to_string());

            assert_eq!(s.document.get_untracked(), before);
        });
    }

    #[test]
    fn test_delete_clamps_focus() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("a".to_string());
            s.on_create_new_block("b".to_string());
            s.focus_this(1);
            s.on_delete_block("a".to_string());
            assert_eq!(s.focus_idx.get_untracked(), 0);
        });
    }

    #[test]
    fn test_focus_wraps_around() {
        with_state(Document::empty(), |s| {
            for t in ["a", "b", "c"] {
                s.on_create_new_block(t.to_string());
            }
            s.focus_next(2);
            assert_eq!(s.focus_idx.get_untracked(), 0);
            s.focus_previous(0);
            assert_eq!(s.focus_idx.get_untracked(), 2);
        });
    }

    #[test]
    fn test_day_check_creates_once() {
        with_state(Document::empty(), |s| {
            s.check_day_block("June 1st 2024");
            s.check_day_block("June 1st 2024");
            let doc = s.document.get_untracked();
            assert_eq!(doc.block_order, vec!["June 1st 2024"]);
        });
    }

    #[test]
    fn test_late_echo_of_own_write_keeps_newer_edits() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("note".to_string());
            let written = s.document.with_untracked(encode);
            s.sink.remember(&written);

            // Typed after the write went out, before its hashchange arrived.
            s.on_update_block_title("note".to_string(), "newer".to_string());
            s.follow_fragment(&written);

            let doc = s.document.get_untracked();
            assert_eq!(doc.blocks["note"].title, "newer");
        });
    }

    #[test]
    fn test_foreign_fragment_replaces_document() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("mine".to_string());
            s.sink.remember(&s.document.with_untracked(encode));

            let other = apply(
                &Document::empty(),
                Intent::CreateBlock {
                    title: "theirs".to_string(),
                },
                &BlockStamp {
                    now_ms: 5,
                    creator: "me",
                    mint_content_key,
                },
            )
            .expect("create never fails");
            let fragment = encode(&other);

            s.follow_fragment(&fragment);
            assert_eq!(s.document.get_untracked(), other);
            assert_eq!(s.fragment_len.get_untracked(), fragment.len() + 1);
            assert!(s.sink.is_own_write(&fragment));

            s.follow_fragment("#garbage!!");
            assert_eq!(s.document.get_untracked(), other);
        });
    }

    #[test]
    fn test_title_and_content_updates() {
        with_state(Document::empty(), |s| {
            s.on_create_new_block("n".to_string());
            let content = s.document.with_untracked(|d| {
                d.blocks["n"]
                    .content_state
                    .with_plain_text("body", || "k".to_string())
            });
            s.on_update_block_content("n".to_string(), content);
            s.on_update_block_title("n".to_string(), "renamed".to_string());

            let doc = s.document.get_untracked();
            assert_eq!(doc.blocks["n"].title, "renamed");
            assert_eq!(doc.blocks["n"].content_state.to_plain_text(), "body");
        });
    }
}
