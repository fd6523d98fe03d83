//! High-level panel operations. Every handler absorbs its own failures into
//! the trace, so nothing here returns an error.

use std::rc::Rc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::catalog::{
    LAB_AUDIT_ENDPOINT, LAB_AUDIT_PATTERN, LAB_SCENE_ENDPOINT, LAB_SCENE_PATTERN,
    LAB_STRATEGY_ENDPOINT, LAB_STRATEGY_PATTERN, LabButton, lookup_action,
};
use crate::config::PanelConfig;
use crate::device::{DeviceSnapshot, active_count, home_mode_label, parse_devices, sync_device};
use crate::dispatch::{EventKind, FormSubmission, UiIntent, resolve_intent};
use crate::dom::{ElementView, PageView};
use crate::error::ApiError;
use crate::params::{ParamMap, param_map};
use crate::request::{ApiTransport, HttpMethod, RequestExecutor};
use crate::trace::{PageLogSink, Presenter, TraceSink, write_result_panel};

pub const WELCOME_MESSAGE: &str = "UI loaded. Open the Patterns Lab to run all demos.";

const DEVICES_ENDPOINT: &str = "/devices";
const MODE_ENDPOINT: &str = "/mode/{mode}";
const DEVICE_CONTROL_ENDPOINT: &str = "/devices/{deviceId}/control";
const ROOM_CONTROL_ENDPOINT: &str = "/patterns/composite/rooms/{roomId}/control";
const SCENE_ENDPOINT: &str = "/patterns/facade/scene/{sceneName}";

fn error_payload(error: &ApiError) -> Value {
    json!({ "error": error.to_string() })
}

/// Drives the page: resolves events, calls the backend, logs and syncs.
///
/// Holds no per-event state, so overlapping handlers are fine; their trace
/// entries and card updates land in completion order.
pub struct ControlPanel<T, P> {
    executor: RequestExecutor<T>,
    page: Rc<P>,
    presenter: Presenter,
    config: PanelConfig,
}

impl<T, P> ControlPanel<T, P>
where
    T: ApiTransport,
    P: PageView + 'static,
{
    pub fn new(transport: T, page: Rc<P>) -> Self {
        Self::with_config(transport, page, PanelConfig::default())
    }

    pub fn with_config(transport: T, page: Rc<P>, config: PanelConfig) -> Self {
        let log = PageLogSink::with_element_id(page.clone(), config.output_element_id.clone());
        Self {
            executor: RequestExecutor::with_base_path(transport, config.api_base_path.clone()),
            presenter: Presenter::new().with_sink(Rc::new(log)),
            page,
            config,
        }
    }

    pub fn add_sink(&mut self, sink: Rc<dyn TraceSink>) {
        self.presenter.add_sink(sink);
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    async fn call(&self, method: HttpMethod, template: &str, params: ParamMap) -> Result<Value, ApiError> {
        let response = self.executor.execute(method, template, params).await?;
        Ok(response.body.to_value())
    }

    fn report_failure(&self, message: String, error: &ApiError) {
        warn!(%error, status = ?error.status(), "{message}");
        self.presenter.present(message, Some(error_payload(error)));
    }

    /// Initial device sync plus the welcome line.
    pub async fn boot(&self) {
        self.refresh_devices().await;
        if self.page.element_by_id(&self.config.output_element_id).is_some() {
            self.presenter.present(WELCOME_MESSAGE, None);
        }
    }

    /// Re-reads every device, updates the active counter and all cards.
    pub async fn refresh_devices(&self) -> Option<Vec<DeviceSnapshot>> {
        let body = match self.call(HttpMethod::Get, DEVICES_ENDPOINT, ParamMap::new()).await {
            Ok(body) => body,
            Err(error) => {
                self.report_failure("Error refreshing devices".to_string(), &error);
                return None;
            }
        };

        let devices = parse_devices(&body);
        if let Some(counter) = self.page.element_by_id(&self.config.active_devices_element_id) {
            counter.set_text(&active_count(&devices).to_string());
        }
        for device in &devices {
            sync_device(self.page(), device);
        }
        debug!(devices = devices.len(), "device cards refreshed");
        Some(devices)
    }

    pub async fn set_home_mode(&self, mode: &str) {
        match self.call(HttpMethod::Post, MODE_ENDPOINT, param_map([("mode", mode)])).await {
            Ok(result) => {
                let header = self.page.element_by_id(&self.config.home_mode_element_id);
                if let (Some(header), Some(label)) = (header, home_mode_label(&result)) {
                    header.set_text(&label);
                }
                self.presenter.present(format!("Home Mode -> {mode}"), Some(result));
            }
            Err(error) => self.report_failure("Failed to set home mode".to_string(), &error),
        }
    }

    pub async fn control_device(&self, device_id: &str, action: &str) {
        let params = param_map([("deviceId", device_id), ("action", action)]);
        match self.call(HttpMethod::Post, DEVICE_CONTROL_ENDPOINT, params).await {
            Ok(result) => {
                self.presenter.present(
                    format!("Device Control: {device_id} -> {action}"),
                    Some(result.clone()),
                );
                if let Some(device) = DeviceSnapshot::from_value(&result) {
                    sync_device(self.page(), &device);
                }
                self.refresh_devices().await;
            }
            Err(error) => self.report_failure("Device control failed".to_string(), &error),
        }
    }

    pub async fn control_room(&self, room: &str, action: &str) {
        let params = param_map([("roomId", room), ("action", action)]);
        match self.call(HttpMethod::Post, ROOM_CONTROL_ENDPOINT, params).await {
            Ok(result) => {
                self.presenter
                    .present(format!("Room Control: {room} -> {action}"), Some(result));
                self.refresh_devices().await;
            }
            Err(error) => self.report_failure("Room control failed".to_string(), &error),
        }
    }

    pub async fn activate_scene(&self, scene: &str) {
        let params = param_map([("sceneName", scene)]);
        match self.call(HttpMethod::Post, SCENE_ENDPOINT, params).await {
            Ok(result) => {
                self.presenter
                    .present(format!("Scene Activated: {scene}"), Some(result));
                self.refresh_devices().await;
            }
            Err(error) => self.report_failure("Scene activation failed".to_string(), &error),
        }
    }

    /// Id of the first device the backend reports, refreshing the cards on
    /// the way.
    pub async fn any_device_id(&self) -> Option<String> {
        self.refresh_devices()
            .await?
            .into_iter()
            .next()
            .and_then(|device| device.id)
    }

    /// Runs a catalog demo. Every demo first re-syncs the device cards; the
    /// first reported id feeds descriptors that take one. The response also
    /// lands in `#<pattern>-result` when the page has one.
    pub async fn run_pattern(&self, pattern: &str) -> Option<Value> {
        let descriptor = lookup_action(pattern);
        let device_id = self.any_device_id().await;
        let params = descriptor.build_params(device_id.as_deref());

        match self.call(descriptor.method, descriptor.endpoint, params).await {
            Ok(result) => {
                let entry = self
                    .presenter
                    .present(format!("Pattern Demo: {pattern}"), Some(result.clone()));
                write_result_panel(self.page(), pattern, &entry);
                Some(result)
            }
            Err(error) => {
                let message = format!("Pattern demo failed: {pattern}");
                warn!(%error, pattern, "{message}");
                let entry = self.presenter.present(message, Some(error_payload(&error)));
                write_result_panel(self.page(), pattern, &entry);
                None
            }
        }
    }

    /// Sends a lab request and shows the outcome in the pattern's panel.
    pub async fn run_lab_request(
        &self,
        pattern: &str,
        method: HttpMethod,
        template: &str,
        params: ParamMap,
    ) {
        let payload = match self.call(method, template, params).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, pattern, "lab request failed");
                error_payload(&error)
            }
        };
        self.presenter
            .present_pattern_result(self.page(), pattern, payload);
    }

    pub async fn press_lab_button(&self, button: &LabButton) {
        let input_value = button.input.and_then(|input| {
            self.page
                .element_by_id(input.section)
                .and_then(|section| section.input_value(input.name))
        });
        let params = button.build_params(input_value.as_deref());
        self.run_lab_request(button.pattern, button.method, button.endpoint, params)
            .await;
    }

    pub async fn submit_form(&self, submission: FormSubmission) {
        let FormSubmission {
            endpoint,
            method,
            refresh,
            section,
            params,
        } = submission;

        match self.call(method, &endpoint, params).await {
            Ok(result) => {
                match &section {
                    Some(section) => {
                        self.presenter
                            .present_pattern_result(self.page(), section, result);
                    }
                    None => {
                        self.presenter.present(format!("{method} {endpoint}"), Some(result));
                    }
                }
                self.refresh_devices().await;
                if refresh {
                    self.page.reload();
                }
            }
            Err(error) => match &section {
                Some(section) => {
                    warn!(%error, %method, endpoint = %endpoint, "form request failed");
                    self.presenter.present_pattern_result(
                        self.page(),
                        section,
                        error_payload(&error),
                    );
                }
                None => self.report_failure(format!("Request failed: {method} {endpoint}"), &error),
            },
        }
    }

    pub async fn dispatch(&self, intent: UiIntent) {
        debug!(?intent, "dispatching ui intent");
        match intent {
            UiIntent::ControlDevice { device_id, action } => {
                self.control_device(&device_id, &action).await;
            }
            UiIntent::ControlRoom { room, action } => self.control_room(&room, &action).await,
            UiIntent::SetMode { mode } => self.set_home_mode(&mode).await,
            UiIntent::ActivateScene { scene } => self.activate_scene(&scene).await,
            UiIntent::RunPattern { pattern } => {
                self.run_pattern(&pattern).await;
            }
            UiIntent::LabScene { scene } => {
                let params = param_map([("sceneName", scene)]);
                self.run_lab_request(LAB_SCENE_PATTERN, HttpMethod::Post, LAB_SCENE_ENDPOINT, params)
                    .await;
            }
            UiIntent::LabStrategy { strategy } => {
                let params = param_map([("strategy", strategy)]);
                self.run_lab_request(
                    LAB_STRATEGY_PATTERN,
                    HttpMethod::Post,
                    LAB_STRATEGY_ENDPOINT,
                    params,
                )
                .await;
            }
            UiIntent::LabAudit { audit } => {
                let params = param_map([("type", audit)]);
                self.run_lab_request(LAB_AUDIT_PATTERN, HttpMethod::Get, LAB_AUDIT_ENDPOINT, params)
                    .await;
            }
            UiIntent::LabButton(button) => self.press_lab_button(button).await,
            UiIntent::SubmitForm(submission) => self.submit_form(submission).await,
        }
    }

    /// Resolves and runs one event. Returns false when the event carried no
    /// intent.
    pub async fn handle_event(&self, kind: EventKind, target: &P::Element) -> bool {
        let Some(intent) = resolve_intent(kind, target) else {
            return false;
        };
        self.dispatch(intent).await;
        true
    }
}

impl<T, P> std::fmt::Debug for ControlPanel<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPanel")
            .field("config", &self.config)
            .field("presenter", &self.presenter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use futures::channel::oneshot;

    use crate::dom::{MemoryElement, MemoryPage};
    use crate::request::{ApiRequest, RawResponse};
    use crate::scripted::ScriptedTransport;
    use crate::trace::MemoryTraceSink;

    struct Harness {
        transport: Rc<ScriptedTransport>,
        page: Rc<MemoryPage>,
        trace: Rc<MemoryTraceSink>,
        panel: ControlPanel<Rc<ScriptedTransport>, MemoryPage>,
    }

    fn harness() -> Harness {
        let transport = Rc::new(ScriptedTransport::new());
        let page = Rc::new(MemoryPage::new());
        let trace = Rc::new(MemoryTraceSink::new());
        let mut panel = ControlPanel::new(transport.clone(), page.clone());
        panel.add_sink(trace.clone());
        Harness {
            transport,
            page,
            trace,
            panel,
        }
    }

    fn add_card(page: &MemoryPage, id: &str) -> MemoryElement {
        let card = page.body().append(
            MemoryElement::new("div")
                .with_class("device-card")
                .with_data("deviceId", id),
        );
        card.append(MemoryElement::new("span").with_class("device-status").with_text("OFF"))
    }

    fn devices(transport: &ScriptedTransport, body: Value) {
        transport.respond(HttpMethod::Get, "/api/devices", RawResponse::json(200, &body));
    }

    #[tokio::test]
    async fn boot_refreshes_cards_and_greets() {
        let h = harness();
        let output = h.page.body().append(MemoryElement::new("pre").with_id("output"));
        let counter = h.page.body().append(MemoryElement::new("span").with_id("activeDevices"));
        let status = add_card(&h.page, "living-light-1");
        devices(
            &h.transport,
            json!([
                {"id": "living-light-1", "isOn": true, "power": 60},
                {"id": "front-lock", "isOn": false}
            ]),
        );

        h.panel.boot().await;

        assert_eq!(counter.text(), "1");
        assert_eq!(status.text(), "ON");
        assert_eq!(h.trace.messages(), vec![WELCOME_MESSAGE]);
        assert!(output.text().contains(WELCOME_MESSAGE));
    }

    #[tokio::test]
    async fn boot_without_output_element_stays_quiet() {
        let h = harness();
        devices(&h.transport, json!([]));
        h.panel.boot().await;
        assert!(h.trace.messages().is_empty());
    }

    #[tokio::test]
    async fn refresh_failure_is_traced_not_raised() {
        let h = harness();
        h.transport.set_offline(true);

        assert_eq!(h.panel.refresh_devices().await, None);

        let entry = h.trace.last().expect("failure traced");
        assert_eq!(entry.message, "Error refreshing devices");
        assert_eq!(
            entry.payload,
            Some(json!({"error": "network error: Failed to fetch"}))
        );
    }

    #[tokio::test]
    async fn device_click_controls_syncs_and_refreshes() {
        let h = harness();
        let status = add_card(&h.page, "living-light-1");
        let button = h.page.body().append(
            MemoryElement::new("button")
                .with_class("device-control-btn")
                .with_data("deviceId", "living-light-1")
                .with_data("action", "on"),
        );
        h.transport.respond(
            HttpMethod::Post,
            "/api/devices/living-light-1/control",
            RawResponse::json(200, &json!({"id": "living-light-1", "isOn": true, "power": 60})),
        );
        devices(&h.transport, json!([{"id": "living-light-1", "isOn": true}]));

        assert!(h.panel.handle_event(EventKind::Click, &button).await);

        assert_eq!(
            h.transport.request_urls(),
            vec![
                "POST /api/devices/living-light-1/control?action=on",
                "GET /api/devices",
            ]
        );
        assert_eq!(status.text(), "ON");
        assert_eq!(
            h.trace.messages(),
            vec!["Device Control: living-light-1 -> on"]
        );
    }

    #[tokio::test]
    async fn backend_error_message_reaches_the_trace() {
        let h = harness();
        h.transport.respond(
            HttpMethod::Post,
            "/api/devices/ghost/control",
            RawResponse::json(
                404,
                &json!({"status": 404, "error": "Not Found", "message": "Device not found: ghost", "timestamp": "2026-01-01T00:00:00"}),
            ),
        );

        h.panel.control_device("ghost", "on").await;

        let entry = h.trace.last().expect("failure traced");
        assert_eq!(entry.message, "Device control failed");
        assert_eq!(entry.payload, Some(json!({"error": "Device not found: ghost"})));
        assert_eq!(h.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn home_mode_updates_header() {
        let h = harness();
        let header = h.page.body().append(MemoryElement::new("span").with_id("homeMode"));
        h.transport.respond(
            HttpMethod::Post,
            "/api/mode/AWAY",
            RawResponse::json(200, &json!({"systemStatus": "OK", "homeMode": "AWAY", "activeDevices": 0})),
        );

        h.panel.set_home_mode("AWAY").await;

        assert_eq!(header.text(), "AWAY");
        assert_eq!(h.trace.messages(), vec!["Home Mode -> AWAY"]);
    }

    #[tokio::test]
    async fn room_and_scene_refresh_afterwards() {
        let h = harness();
        devices(&h.transport, json!([]));
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/composite/rooms/Living%20Room/control",
            RawResponse::text(200, "Living Room turned off"),
        );
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/facade/scene/movie",
            RawResponse::json(200, &json!({"scene": "movie"})),
        );

        h.panel.control_room("Living Room", "off").await;
        h.panel.activate_scene("movie").await;

        assert_eq!(
            h.transport.request_urls(),
            vec![
                "POST /api/patterns/composite/rooms/Living%20Room/control?action=off",
                "GET /api/devices",
                "POST /api/patterns/facade/scene/movie",
                "GET /api/devices",
            ]
        );
        assert_eq!(
            h.trace.messages(),
            vec!["Room Control: Living Room -> off", "Scene Activated: movie"]
        );
        assert_eq!(
            h.trace.entries()[0].payload,
            Some(json!("Living Room turned off"))
        );
    }

    #[tokio::test]
    async fn unknown_pattern_lists_patterns() {
        let h = harness();
        devices(&h.transport, json!([]));
        h.transport.respond(
            HttpMethod::Get,
            "/api/patterns",
            RawResponse::json(200, &json!([{"id": "singleton"}])),
        );

        let result = h.panel.run_pattern("does-not-exist").await;

        assert_eq!(result, Some(json!([{"id": "singleton"}])));
        assert_eq!(
            h.transport.request_urls(),
            vec!["GET /api/devices", "GET /api/patterns"]
        );
        assert_eq!(h.trace.messages(), vec!["Pattern Demo: does-not-exist"]);
    }

    #[tokio::test]
    async fn every_demo_resyncs_device_cards_first() {
        let h = harness();
        let counter = h.page.body().append(MemoryElement::new("span").with_id("activeDevices"));
        let status = add_card(&h.page, "hall-light");
        devices(&h.transport, json!([{"id": "hall-light", "isOn": true}]));
        h.transport.respond(
            HttpMethod::Get,
            "/api/status",
            RawResponse::json(200, &json!({"systemStatus": "OK"})),
        );

        h.panel.run_pattern("singleton").await;

        assert_eq!(
            h.transport.request_urls(),
            vec!["GET /api/devices", "GET /api/status"]
        );
        assert_eq!(counter.text(), "1");
        assert_eq!(status.text(), "ON");
    }

    #[tokio::test]
    async fn demo_still_runs_when_device_refresh_fails() {
        let h = harness();
        h.transport.respond(
            HttpMethod::Get,
            "/api/devices",
            RawResponse::text(503, "devices offline"),
        );
        h.transport.respond(
            HttpMethod::Get,
            "/api/status",
            RawResponse::json(200, &json!({"systemStatus": "OK"})),
        );

        assert!(h.panel.run_pattern("singleton").await.is_some());
        assert_eq!(
            h.trace.messages(),
            vec!["Error refreshing devices", "Pattern Demo: singleton"]
        );
    }

    #[tokio::test]
    async fn device_patterns_use_first_live_device() {
        let h = harness();
        devices(
            &h.transport,
            json!([{"id": "kitchen-light", "isOn": false}, {"id": "hall-light", "isOn": true}]),
        );
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/command/execute",
            RawResponse::json(200, &json!({"executed": "ON"})),
        );
        let panel = h.page.body().append(MemoryElement::new("pre").with_id("command-result"));

        h.panel.run_pattern("command").await;

        assert_eq!(
            h.transport.request_urls(),
            vec![
                "GET /api/devices",
                "POST /api/patterns/command/execute?command=ON&deviceId=kitchen-light",
            ]
        );
        assert!(panel.text().contains("\"executed\": \"ON\""));
    }

    #[tokio::test]
    async fn device_patterns_fall_back_when_backend_has_no_devices() {
        let h = harness();
        h.transport.set_offline(true);

        assert_eq!(h.panel.run_pattern("observer").await, None);

        assert_eq!(
            h.transport.request_urls(),
            vec![
                "GET /api/devices",
                "POST /api/patterns/observer/register?deviceId=sensor-1&observerType=MOBILE",
            ]
        );
        assert_eq!(
            h.trace.messages(),
            vec!["Error refreshing devices", "Pattern demo failed: observer"]
        );
    }

    #[tokio::test]
    async fn lab_buttons_read_section_inputs() {
        let h = harness();
        let section = h.page.body().append(MemoryElement::new("section").with_id("memento"));
        section.append(MemoryElement::field("sceneName", "Evening"));
        let result = section.append(MemoryElement::new("pre").with_id("memento-result"));
        let restore = section.append(MemoryElement::new("button").with_id("restore-btn"));
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/memento/restore",
            RawResponse::text(200, "Restored Evening"),
        );

        assert!(h.panel.handle_event(EventKind::Click, &restore).await);

        assert_eq!(
            h.transport.request_urls(),
            vec!["POST /api/patterns/memento/restore?sceneName=Evening"]
        );
        assert!(result.text().ends_with("] Restored Evening"));
        assert_eq!(h.trace.messages(), vec!["[MEMENTO]"]);
    }

    #[tokio::test]
    async fn lab_failures_land_in_the_result_panel() {
        let h = harness();
        let result = h.page.body().append(MemoryElement::new("pre").with_id("visitor-result"));
        let button = h.page.body().append(
            MemoryElement::new("button")
                .with_class("btn-audit")
                .with_data("audit", "ENERGY"),
        );
        h.transport.respond(
            HttpMethod::Get,
            "/api/patterns/visitor/audit",
            RawResponse::json(400, &json!({"message": "Unknown audit type"})),
        );

        h.panel.handle_event(EventKind::Click, &button).await;

        assert_eq!(
            h.transport.request_urls(),
            vec!["GET /api/patterns/visitor/audit?type=ENERGY"]
        );
        assert!(result.text().contains("Unknown audit type"));
        assert_eq!(
            h.trace.last().and_then(|entry| entry.payload),
            Some(json!({"error": "Unknown audit type"}))
        );
    }

    #[tokio::test]
    async fn form_submit_logs_refreshes_and_reloads() {
        let h = harness();
        devices(&h.transport, json!([]));
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/builder/rule",
            RawResponse::json(200, &json!({"name": "Evening"})),
        );
        let form = h.page.body().append(
            MemoryElement::new("form")
                .with_data("apiEndpoint", "/patterns/builder/rule")
                .with_data("apiMethod", "post")
                .with_data("refresh", "true"),
        );
        form.append(MemoryElement::field("name", "Evening"));

        assert!(h.panel.handle_event(EventKind::Submit, &form).await);

        assert_eq!(
            h.transport.request_urls(),
            vec!["POST /api/patterns/builder/rule?name=Evening", "GET /api/devices"]
        );
        assert_eq!(h.trace.messages(), vec!["POST /patterns/builder/rule"]);
        assert_eq!(h.page.reload_count(), 1);
    }

    #[tokio::test]
    async fn failed_form_submit_does_not_reload() {
        let h = harness();
        let form = h.page.body().append(
            MemoryElement::new("form")
                .with_data("apiEndpoint", "/patterns/proxy/remote")
                .with_data("refresh", "true"),
        );

        h.panel.handle_event(EventKind::Submit, &form).await;

        assert_eq!(h.page.reload_count(), 0);
        assert_eq!(
            h.trace.messages(),
            vec!["Request failed: GET /patterns/proxy/remote"]
        );
    }

    #[tokio::test]
    async fn demo_form_reports_into_its_section() {
        let h = harness();
        devices(&h.transport, json!([]));
        let section = h.page.body().append(
            MemoryElement::new("section")
                .with_id("observer")
                .with_class("pattern-section"),
        );
        let result = section.append(MemoryElement::new("pre").with_id("observer-result"));
        let form = section.append(
            MemoryElement::new("form")
                .with_class("demo-form")
                .with_data("apiEndpoint", "/patterns/observer/register"),
        );
        form.append(MemoryElement::field("deviceId", "sensor-1"));
        h.transport.respond(
            HttpMethod::Post,
            "/api/patterns/observer/subscribe",
            RawResponse::json(200, &json!({"subscribed": true})),
        );

        h.panel.handle_event(EventKind::Submit, &form).await;

        assert_eq!(
            h.transport.request_urls()[0],
            "POST /api/patterns/observer/subscribe?deviceId=sensor-1"
        );
        assert!(result.text().contains("\"subscribed\": true"));
        assert_eq!(h.trace.messages(), vec!["[OBSERVER]"]);
    }

    #[tokio::test]
    async fn events_without_intent_send_nothing() {
        let h = harness();
        let plain = h.page.body().append(MemoryElement::new("div"));
        assert!(!h.panel.handle_event(EventKind::Click, &plain).await);
        assert!(h.transport.requests().is_empty());
    }

    /// Holds chosen requests until the test releases them, then answers
    /// with the response registered for that exact url.
    #[derive(Default)]
    struct GatedTransport {
        inner: ScriptedTransport,
        gates: RefCell<HashMap<String, (oneshot::Receiver<()>, RawResponse)>>,
    }

    impl GatedTransport {
        fn gate(&self, url: &str, response: RawResponse) -> oneshot::Sender<()> {
            let (release, gate) = oneshot::channel();
            self.gates
                .borrow_mut()
                .insert(url.to_string(), (gate, response));
            release
        }
    }

    #[async_trait(?Send)]
    impl ApiTransport for GatedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
            let gated = self.gates.borrow_mut().remove(&request.url);
            match gated {
                Some((gate, response)) => {
                    let _ = gate.await;
                    Ok(response)
                }
                None => self.inner.send(request).await,
            }
        }
    }

    #[tokio::test]
    async fn overlapping_controls_apply_in_completion_order() {
        let transport = Rc::new(GatedTransport::default());
        let page = Rc::new(MemoryPage::new());
        let trace = Rc::new(MemoryTraceSink::new());
        let status = add_card(&page, "d1");
        let mut panel = ControlPanel::new(transport.clone(), page.clone());
        panel.add_sink(trace.clone());

        transport
            .inner
            .respond(HttpMethod::Get, "/api/devices", RawResponse::json(200, &json!([])));
        let release_on = transport.gate(
            "/api/devices/d1/control?action=on",
            RawResponse::json(200, &json!({"id": "d1", "isOn": true})),
        );
        let release_off = transport.gate(
            "/api/devices/d1/control?action=off",
            RawResponse::json(200, &json!({"id": "d1", "isOn": false})),
        );

        // Dispatched on then off; the backend answers off first.
        let first = panel.control_device("d1", "on");
        let second = panel.control_device("d1", "off");
        let driver = async {
            let _ = release_off.send(());
            tokio::task::yield_now().await;
            let _ = release_on.send(());
        };
        futures::join!(first, second, driver);

        assert_eq!(
            trace.messages(),
            vec!["Device Control: d1 -> off", "Device Control: d1 -> on"]
        );
        assert_eq!(status.text(), "ON");
        assert!(status.has_class("status-on"));
    }
}
