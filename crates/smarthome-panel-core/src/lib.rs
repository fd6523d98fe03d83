//! Core of the smart-home control panel.
//!
//! Everything here is independent of the browser: the page is reached through
//! [`dom::PageView`] and the network through [`request::ApiTransport`], so
//! the same panel runs under `wasm32` and in native tests.

pub mod catalog;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod panel;
pub mod params;
pub mod request;
#[cfg(test)]
mod scripted;
pub mod template;
pub mod trace;

pub use catalog::{ACTION_CATALOG, ActionDescriptor, DEFAULT_ACTION, LAB_BUTTONS, lookup_action};
pub use config::PanelConfig;
pub use device::{DeviceSnapshot, sync_device};
pub use dispatch::{EventKind, FormSubmission, UiIntent, resolve_intent};
pub use dom::{ElementView, MemoryElement, MemoryPage, PageView};
pub use error::{ApiError, ConfigError};
pub use panel::ControlPanel;
pub use params::{ParamMap, ParamValue, param_map};
pub use request::{
    ApiRequest, ApiResponse, ApiTransport, HttpMethod, RawResponse, RequestExecutor, ResponseBody,
    build_url,
};
pub use template::expand_template;
pub use trace::{MemoryTraceSink, PageLogSink, Presenter, TraceEntry, TraceSink};
