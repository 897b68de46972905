use crate::components::ui::{BlockBody, BlockCard, BlockMeta, BlockTimestamp, IconButton};
use crate::state::AppContext;
use crate::util::{mint_content_key, now_ms, random_emoji, relative_time};
use leptos::html;
use leptos::prelude::*;
use std::time::Duration;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// Editor-level commands bound to Cmd/Ctrl chords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shortcut {
    NewBlock,
    DeleteBlock,
    FocusPrevious,
    FocusNext,
}

/// Maps a `KeyboardEvent.key` plus "command held" (Meta or Ctrl) to a shortcut.
pub(crate) fn shortcut_for(key: &str, command: bool) -> Option<Shortcut> {
    if !command {
        return None;
    }
    match key {
        "Enter" => Some(Shortcut::NewBlock),
        "Backspace" => Some(Shortcut::DeleteBlock),
        "ArrowUp" | "ArrowLeft" => Some(Shortcut::FocusPrevious),
        "ArrowDown" | "ArrowRight" => Some(Shortcut::FocusNext),
        _ => None,
    }
}

fn utf16_to_byte_idx(s: &str, pos_utf16: u32) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: u32 = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16() as u32;
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

/// Text between two UTF-16 selection offsets (as reported by the DOM).
pub(crate) fn selected_text(value: &str, start_utf16: u32, end_utf16: u32) -> String {
    let (a, b) = (start_utf16.min(end_utf16), start_utf16.max(end_utf16));
    let start = utf16_to_byte_idx(value, a);
    let end = utf16_to_byte_idx(value, b);
    value[start..end].to_string()
}

fn textarea_selection(el: &web_sys::HtmlTextAreaElement) -> String {
    let start = el.selection_start().ok().flatten().unwrap_or(0);
    let end = el.selection_end().ok().flatten().unwrap_or(start);
    selected_text(&el.value(), start, end)
}

/// Title label that turns into a text input while pressed/focused.
#[component]
pub fn Editable(
    #[prop(into)] value: Signal<String>,
    on_update: Callback<String>,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let editing = RwSignal::new(false);
    let input_ref: NodeRef<html::Input> = NodeRef::new();

    let merged_class = tw_merge!("min-w-0 flex-1 truncate text-sm font-medium", class);

    Effect::new(move |_| {
        if !editing.get() {
            return;
        }
        if let Some(el) = input_ref.get() {
            let _ = el.focus();
        }
    });

    view! {
        <div
            data-name="Editable"
            class=merged_class
            on:mousedown=move |_| editing.set(true)
            on:focusout=move |_| editing.set(false)
        >
            <Show
                when=move || editing.get()
                fallback=move || view! { <span>{move || value.get()}</span> }
            >
                <input
                    type="text"
                    name="title"
                    placeholder="Write a title"
                    class="w-full bg-transparent outline-none"
                    prop:value=move || value.get()
                    on:input=move |ev: web_sys::Event| {
                        if let Some(input) = ev
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                        {
                            on_update.run(input.value());
                        }
                    }
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" || ev.key() == "Escape" {
                            editing.set(false);
                        }
                    }
                    node_ref=input_ref
                />
            </Show>
        </div>
    }
}

#[component]
pub fn BlockEditor(block_key: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let state = app_state.0;
    let key_sv = StoredValue::new(block_key);

    let s_block = state.clone();
    let block = Memo::new(move |_| {
        key_sv.with_value(|k| s_block.document.with(|d| d.blocks.get(k).cloned()))
    });

    let s_idx = state.clone();
    let idx = Memo::new(move |_| {
        key_sv.with_value(|k| {
            s_idx
                .document
                .with(|d| d.block_order.iter().position(|o| o == k))
                .unwrap_or(0)
        })
    });

    let title = Signal::derive(move || {
        block
            .with(|b| b.as_ref().map(|b| b.title.clone()))
            .unwrap_or_default()
    });
    let text = Signal::derive(move || {
        block
            .with(|b| b.as_ref().map(|b| b.content_state.to_plain_text()))
            .unwrap_or_default()
    });

    // Relative timestamp, refreshed once a second.
    let created_at = block.with_untracked(|b| b.as_ref().map(|b| b.created_at).unwrap_or(0));
    let timestamp = RwSignal::new(relative_time(created_at, now_ms()));
    match set_interval_with_handle(
        move || timestamp.set(relative_time(created_at, now_ms())),
        Duration::from_secs(1),
    ) {
        Ok(handle) => on_cleanup(move || handle.clear()),
        Err(e) => log::warn!("timestamp refresh unavailable: {e:?}"),
    }

    let body_ref: NodeRef<html::Textarea> = NodeRef::new();

    // Move DOM focus here when this block becomes the focused one.
    let s_focus = state.clone();
    Effect::new(move |_| {
        if s_focus.focus_idx.get() != idx.get() {
            return;
        }
        let Some(el) = body_ref.get() else {
            return;
        };
        // Focus on next tick so the node is mounted.
        if let Some(win) = web_sys::window() {
            let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
                wasm_bindgen::closure::Closure::once_into_js(move || {
                    let _ = el.focus();
                })
                .as_ref()
                .unchecked_ref(),
                0,
            );
        }
    });

    let s_title = state.clone();
    let on_title = Callback::new(move |new_title: String| {
        s_title.on_update_block_title(key_sv.get_value(), new_title);
    });

    let s_input = state.clone();
    let on_input = move |ev: web_sys::Event| {
        let Some(el) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            return;
        };
        let new_text = el.value();
        let content = block.with_untracked(|b| {
            b.as_ref()
                .map(|b| b.content_state.with_plain_text(&new_text, mint_content_key))
        });
        if let Some(content) = content {
            s_input.on_update_block_content(key_sv.get_value(), content);
        }
    };

    let s_keys = state.clone();
    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        let Some(shortcut) = shortcut_for(&ev.key(), ev.meta_key() || ev.ctrl_key()) else {
            return;
        };
        ev.prevent_default();

        match shortcut {
            Shortcut::NewBlock => {
                let selected = body_ref
                    .get_untracked()
                    .map(|el| textarea_selection(&el))
                    .unwrap_or_default();
                let title = if selected.trim().is_empty() {
                    random_emoji()
                } else {
                    selected
                };
                s_keys.on_create_new_block(title);
            }
            Shortcut::DeleteBlock => s_keys.on_delete_block(key_sv.get_value()),
            Shortcut::FocusPrevious => s_keys.focus_previous(idx.get_untracked()),
            Shortcut::FocusNext => s_keys.focus_next(idx.get_untracked()),
        }
    };

    let s_focus_this = state.clone();
    let s_delete = state.clone();
    let s_class = state.clone();

    view! {
        <BlockCard
            attr:data-focused=move || (s_class.focus_idx.get() == idx.get()).to_string()
        >
            <BlockMeta>
                <Editable value=title on_update=on_title />
                <BlockTimestamp>{move || timestamp.get()}</BlockTimestamp>
                <IconButton
                    attr:title="Delete block"
                    on:mousedown=move |_| s_delete.on_delete_block(key_sv.get_value())
                >
                    "×"
                </IconButton>
            </BlockMeta>
            <BlockBody>
                <textarea
                    class="min-h-24 w-full resize-y bg-transparent text-sm leading-relaxed outline-none"
                    prop:value=move || text.get()
                    on:input=on_input
                    on:keydown=on_keydown
                    on:focus=move |_| s_focus_this.focus_this(idx.get_untracked())
                    node_ref=body_ref
                />
            </BlockBody>
        </BlockCard>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcuts_need_command_modifier() {
        assert_eq!(shortcut_for("Enter", false), None);
        assert_eq!(shortcut_for("Enter", true), Some(Shortcut::NewBlock));
        assert_eq!(shortcut_for("Backspace", true), Some(Shortcut::DeleteBlock));
        assert_eq!(shortcut_for("ArrowUp", true), Some(Shortcut::FocusPrevious));
        assert_eq!(shortcut_for("ArrowLeft", true), Some(Shortcut::FocusPrevious));
        assert_eq!(shortcut_for("ArrowDown", true), Some(Shortcut::FocusNext));
        assert_eq!(shortcut_for("ArrowRight", true), Some(Shortcut::FocusNext));
        assert_eq!(shortcut_for("a", true), None);
    }

    #[test]
    fn test_selected_text_ascii() {
        assert_eq!(selected_text("hello world", 6, 11), "world");
        assert_eq!(selected_text("hello", 3, 3), "");
    }

    #[test]
    fn test_selected_text_reversed_range() {
        assert_eq!(selected_text("hello world", 11, 6), "world");
    }

    #[test]
    fn test_selected_text_utf16_offsets() {
        // "🍕" is two UTF-16 code units.
        let s = "a🍕b";
        assert_eq!(selected_text(s, 1, 3), "🍕");
        assert_eq!(selected_text(s, 3, 4), "b");
        assert_eq!(selected_text(s, 0, 10), s);
    }
}
