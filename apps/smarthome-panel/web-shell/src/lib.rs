//! Browser entrypoint for the smart-home control panel.
//!
//! The page markup is served as-is; this crate attaches one delegated click
//! listener and one delegated submit listener to the document and hands
//! every resolved intent to [`smarthome_panel_core::ControlPanel`].

use smarthome_panel_core::{ElementView, EventKind, PanelConfig, UiIntent, resolve_intent};

/// Body dataset key holding an optional api base path override.
pub const API_BASE_DATA_KEY: &str = "apiBase";

/// What the delegated listeners do with one DOM event.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEvent {
    pub intent: UiIntent,
    /// Set for intercepted form submissions, which must not navigate.
    pub prevent_default: bool,
}

/// `None` leaves the event entirely to the browser.
pub fn route_event<E: ElementView>(kind: EventKind, target: &E) -> Option<RoutedEvent> {
    let intent = resolve_intent(kind, target)?;
    let prevent_default = matches!(intent, UiIntent::SubmitForm(_));
    Some(RoutedEvent {
        intent,
        prevent_default,
    })
}

/// JSON view of the panel wiring, exported for console diagnostics.
#[must_use]
pub fn panel_config_json(config: &PanelConfig) -> String {
    serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use smarthome_panel_core::{ControlPanel, EventKind, PanelConfig, UiIntent};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    use super::{API_BASE_DATA_KEY, panel_config_json, route_event};

    mod dom;
    mod lifecycle;
    mod network;

    use dom::{WebElement, WebPage};
    use network::GlooTransport;

    type WebPanel = ControlPanel<GlooTransport, WebPage>;

    thread_local! {
        static PANEL: RefCell<Option<Rc<WebPanel>>> = const { RefCell::new(None) };
        static CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static SUBMIT_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        spawn_local(async {
            if let Err(error) = lifecycle::boot().await {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "smart-home panel failed to start: {error}"
                )));
            }
        });
    }

    /// Runs one catalog demo from the devtools console.
    #[wasm_bindgen]
    pub fn run_pattern_demo(pattern: String) {
        lifecycle::dispatch(UiIntent::RunPattern { pattern });
    }

    #[wasm_bindgen]
    pub fn panel_config() -> String {
        PANEL.with(|slot| {
            slot.borrow()
                .as_ref()
                .map_or_else(|| panel_config_json(&PanelConfig::default()), |panel| {
                    panel_config_json(panel.config())
                })
        })
    }
}
