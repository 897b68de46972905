use serde::{Deserialize, Serialize};

/// Runtime settings, read from `window.ENV` when the page defines it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnvConfig {
    pub persist_debounce_ms: i32,
    pub rollover_interval_ms: u32,
    pub creator: String,
    pub log_level: log::Level,
    pub app_title: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            persist_debounce_ms: 200,
            rollover_interval_ms: 1000,
            creator: "me".to_string(),
            log_level: log::Level::Info,
            app_title: "scratch".to_string(),
        }
    }
}

impl EnvConfig {
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        let Some(env) = env else {
            return Self::default();
        };

        Self::from_lookup(|key| {
            let v = js_sys::Reflect::get(&env, &key.into()).ok()?;
            if let Some(s) = v.as_string() {
                Some(s)
            } else {
                v.as_f64().map(|n| n.to_string())
            }
        })
    }

    /// Builds a config from a key lookup. Each setting is looked up by its
    /// upper-case name first (`PERSIST_DEBOUNCE_MS`), then lower-case.
    /// Missing or unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).or_else(|| lookup(&name.to_lowercase()));
        let mut cfg = Self::default();

        if let Some(ms) = get("PERSIST_DEBOUNCE_MS").and_then(|v| parse_ms(&v)) {
            cfg.persist_debounce_ms = ms;
        }
        if let Some(ms) = get("ROLLOVER_INTERVAL_MS").and_then(|v| parse_ms(&v)) {
            if ms > 0 {
                cfg.rollover_interval_ms = ms as u32;
            }
        }
        if let Some(creator) = get("CREATOR").filter(|c| !c.trim().is_empty()) {
            cfg.creator = creator;
        }
        if let Some(level) = get("LOG_LEVEL").and_then(|v| v.trim().parse().ok()) {
            cfg.log_level = level;
        }
        if let Some(title) = get("APP_TITLE").filter(|t| !t.trim().is_empty()) {
            cfg.app_title = title;
        }

        cfg
    }
}

fn parse_ms(v: &str) -> Option<i32> {
    let n: f64 = v.trim().parse().ok()?;
    if !n.is_finite() || n < 0.0 || n > i32::MAX as f64 {
        return None;
    }
    Some(n.round() as i32)
}
