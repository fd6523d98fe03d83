//! Turns a raw page event into a [`UiIntent`] by inspecting the target's
//! ancestry for role classes and data attributes.

use crate::catalog::{LabButton, lab_button, resolve_form_target};
use crate::dom::ElementView;
use crate::params::{ParamMap, params_from_form_entries};
use crate::request::HttpMethod;

pub const DEMO_FORM_CLASS: &str = "demo-form";
pub const PATTERN_SECTION_CLASS: &str = "pattern-section";
pub const UNKNOWN_SECTION_ID: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    Submit,
}

/// A form submission captured from the page.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    /// Endpoint template after overrides.
    pub endpoint: String,
    pub method: HttpMethod,
    pub refresh: bool,
    /// Result panel for the response, when the form lives in a pattern section.
    pub section: Option<String>,
    pub params: ParamMap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiIntent {
    ControlDevice { device_id: String, action: String },
    ControlRoom { room: String, action: String },
    SetMode { mode: String },
    ActivateScene { scene: String },
    RunPattern { pattern: String },
    LabScene { scene: String },
    LabStrategy { strategy: String },
    LabAudit { audit: String },
    LabButton(&'static LabButton),
    SubmitForm(FormSubmission),
}

/// Click roles in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    DeviceControl,
    RoomControl,
    ModeSelect,
    SceneSelect,
    PatternRun,
    PatternListItem,
    LabScene,
    LabStrategy,
    LabAudit,
    LabButton,
}

pub const CLICK_ROLES: [Role; 10] = [
    Role::DeviceControl,
    Role::RoomControl,
    Role::ModeSelect,
    Role::SceneSelect,
    Role::PatternRun,
    Role::PatternListItem,
    Role::LabScene,
    Role::LabStrategy,
    Role::LabAudit,
    Role::LabButton,
];

impl Role {
    /// Marker class, `None` for roles keyed by element id.
    #[must_use]
    pub fn class(self) -> Option<&'static str> {
        match self {
            Self::DeviceControl => Some("device-control-btn"),
            Self::RoomControl => Some("room-control-btn"),
            Self::ModeSelect => Some("mode-btn"),
            Self::SceneSelect => Some("scene-btn"),
            Self::PatternRun => Some("pattern-run-btn"),
            Self::PatternListItem => Some("pattern-list-item"),
            Self::LabScene => Some("btn-scene"),
            Self::LabStrategy => Some("btn-strategy"),
            Self::LabAudit => Some("btn-audit"),
            Self::LabButton => None,
        }
    }

    pub fn marks<E: ElementView>(self, element: &E) -> bool {
        match self.class() {
            Some(class) => element.has_class(class),
            None => element.id().as_deref().and_then(lab_button).is_some(),
        }
    }

    /// Intent carried by `element`, `None` when required data is missing.
    pub fn intent<E: ElementView>(self, element: &E) -> Option<UiIntent> {
        let data = |key: &str| element.data(key).filter(|value| !value.is_empty());
        match self {
            Self::DeviceControl => Some(UiIntent::ControlDevice {
                device_id: data("deviceId")?,
                action: data("action")?,
            }),
            Self::RoomControl => Some(UiIntent::ControlRoom {
                room: data("room")?,
                action: data("action")?,
            }),
            Self::ModeSelect => Some(UiIntent::SetMode { mode: data("mode")? }),
            Self::SceneSelect => Some(UiIntent::ActivateScene { scene: data("scene")? }),
            Self::PatternRun | Self::PatternListItem => Some(UiIntent::RunPattern {
                pattern: data("pattern")?,
            }),
            Self::LabScene => Some(UiIntent::LabScene { scene: data("scene")? }),
            Self::LabStrategy => Some(UiIntent::LabStrategy {
                strategy: data("strategy")?,
            }),
            Self::LabAudit => Some(UiIntent::LabAudit { audit: data("audit")? }),
            Self::LabButton => element
                .id()
                .as_deref()
                .and_then(lab_button)
                .map(UiIntent::LabButton),
        }
    }
}

pub fn resolve_intent<E: ElementView>(kind: EventKind, target: &E) -> Option<UiIntent> {
    match kind {
        EventKind::Click => resolve_click(target),
        EventKind::Submit => resolve_submit(target).map(UiIntent::SubmitForm),
    }
}

/// The nearest ancestor carrying any click marker decides; a marker missing
/// its data swallows the click.
pub fn resolve_click<E: ElementView>(target: &E) -> Option<UiIntent> {
    let mut current = Some(target.clone());
    while let Some(element) = current {
        if let Some(role) = CLICK_ROLES.iter().find(|role| role.marks(&element)) {
            return role.intent(&element);
        }
        current = element.parent();
    }
    None
}

pub fn resolve_submit<E: ElementView>(target: &E) -> Option<FormSubmission> {
    let mut current = Some(target.clone());
    while let Some(element) = current {
        let endpoint = element
            .is_form()
            .then(|| element.data("apiEndpoint"))
            .flatten();
        if let Some(endpoint) = endpoint {
            return Some(form_submission(&element, &endpoint));
        }
        current = element.parent();
    }
    None
}

fn form_submission<E: ElementView>(form: &E, endpoint: &str) -> FormSubmission {
    let demo = form.has_class(DEMO_FORM_CLASS);
    let default_method = if demo { HttpMethod::Post } else { HttpMethod::Get };
    let method = form
        .data("apiMethod")
        .and_then(|raw| HttpMethod::parse(&raw))
        .unwrap_or(default_method);
    let refresh = form
        .data("refresh")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));

    let section = form.closest_with_class(PATTERN_SECTION_CLASS);
    let section = match section.and_then(|section| section.id()) {
        Some(id) if !id.is_empty() => Some(id),
        _ if demo => Some(UNKNOWN_SECTION_ID.to_string()),
        _ => None,
    };

    let (method, endpoint) = resolve_form_target(endpoint, method);
    FormSubmission {
        endpoint,
        method,
        refresh,
        section,
        params: params_from_form_entries(&form.form_entries()),
    }
}
