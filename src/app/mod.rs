use crate::components::ui::{PageContainer, PageFooter};
use crate::config::EnvConfig;
use crate::editor::{shortcut_for, BlockEditor, Shortcut};
use crate::state::{AppContext, AppState};
use crate::util::random_emoji;
use leptos::ev;
use leptos::prelude::*;

#[component]
pub fn App(config: EnvConfig) -> impl IntoView {
    let state = AppState::new(config);
    provide_context(AppContext(state.clone()));
    state.start();

    // Cmd/Ctrl+Enter anywhere on the page opens a new block. Editors handle the
    // chord themselves (with their selection) and mark the event as handled.
    let s_keys = state.clone();
    let keydown = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.default_prevented() {
            return;
        }
        if shortcut_for(&ev.key(), ev.meta_key() || ev.ctrl_key()) == Some(Shortcut::NewBlock) {
            ev.prevent_default();
            s_keys.on_create_new_block(random_emoji());
        }
    });
    on_cleanup(move || keydown.remove());

    let document = state.document;
    let fragment_len = state.fragment_len;

    view! {
        <PageContainer>
            <For
                each=move || document.with(|d| d.block_order.clone())
                key=|k| k.clone()
                children=|k| view! { <BlockEditor block_key=k /> }
            />
            <PageFooter>{move || format!("{} chars", fragment_len.get())}</PageFooter>
        </PageContainer>
    }
}
