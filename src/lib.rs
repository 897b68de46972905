mod app;
mod codec;
mod components;
mod config;
mod editor;
mod models;
mod state;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

pub use app::App;
pub use codec::{decode, decode_or_empty, encode, CodecError};
pub use config::EnvConfig;
pub use models::{Block, Document, RawBlock, RawContent};
pub use util::make_unique_key;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::state::persist::{AddressBar, FragmentWriter};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn sample() -> Document {
        let mut doc = Document::empty();
        let block = Block {
            key: "hello".to_string(),
            title: "hello".to_string(),
            creator: "me".to_string(),
            created_at: 1,
            content_state: RawContent::empty(|| "abcde".to_string())
                .with_plain_text("hi there", || "fghij".to_string()),
        };
        doc.blocks.insert(block.key.clone(), block);
        doc.block_order.push("hello".to_string());
        doc
    }

    #[wasm_bindgen_test]
    fn test_address_bar_roundtrip() {
        let doc = sample();
        let fragment = encode(&doc);

        AddressBar
            .write(&fragment, "hello - scratch")
            .expect("address bar should accept the fragment");

        let current = AddressBar.current().expect("fragment should be readable");
        assert_eq!(current, fragment);
        assert_eq!(decode(&current).expect("should decode"), doc);

        let title = web_sys::window()
            .and_then(|w| w.document())
            .map(|d| d.title())
            .unwrap_or_default();
        assert_eq!(title, "hello - scratch");
    }

    #[wasm_bindgen_test]
    fn test_env_config_without_window_env() {
        assert_eq!(EnvConfig::new(), EnvConfig::default());
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let config = EnvConfig::new();
    if let Err(e) = console_log::init_with_level(config.log_level) {
        web_sys::console::warn_1(&format!("logger already set: {e}").into());
    }
    log::info!("starting {}", config.app_title);

    mount_to_body(move || view! { <App config=config.clone() /> });
}
