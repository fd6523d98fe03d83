//! Fixed action tables: pattern demos, form endpoint overrides and the
//! Patterns Lab buttons.

use crate::params::{ParamMap, ParamValue};
use crate::request::HttpMethod;
use crate::request::HttpMethod::{Get, Post};

use self::StaticParam::{Bool, Number, Text};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticParam {
    Text(&'static str),
    Bool(bool),
    Number(i32),
}

impl StaticParam {
    #[must_use]
    pub fn to_value(self) -> ParamValue {
        match self {
            Self::Text(text) => ParamValue::from(text),
            Self::Bool(flag) => ParamValue::from(flag),
            Self::Number(number) => ParamValue::from(number),
        }
    }
}

/// Parameter filled with a live device id, or `fallback` when the backend
/// reports no devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceParam {
    pub name: &'static str,
    pub fallback: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionDescriptor {
    pub id: &'static str,
    pub method: HttpMethod,
    pub endpoint: &'static str,
    pub params: &'static [(&'static str, StaticParam)],
    pub device_param: Option<DeviceParam>,
}

impl ActionDescriptor {
    const fn new(id: &'static str, method: HttpMethod, endpoint: &'static str) -> Self {
        Self {
            id,
            method,
            endpoint,
            params: &[],
            device_param: None,
        }
    }

    const fn with_params(mut self, params: &'static [(&'static str, StaticParam)]) -> Self {
        self.params = params;
        self
    }

    const fn with_device(mut self, name: &'static str, fallback: &'static str) -> Self {
        self.device_param = Some(DeviceParam { name, fallback });
        self
    }

    #[must_use]
    pub fn needs_device(&self) -> bool {
        self.device_param.is_some()
    }

    /// Request parameters, with `device_id` (or the fallback) filled in.
    #[must_use]
    pub fn build_params(&self, device_id: Option<&str>) -> ParamMap {
        let mut params: ParamMap = self
            .params
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_value()))
            .collect();
        if let Some(device) = self.device_param {
            let id = device_id.filter(|id| !id.is_empty()).unwrap_or(device.fallback);
            params.insert(device.name.to_string(), ParamValue::from(id));
        }
        params
    }
}

/// Used for any id missing from [`ACTION_CATALOG`].
pub static DEFAULT_ACTION: ActionDescriptor = ActionDescriptor::new("patterns", Get, "/patterns");

pub const ACTION_CATALOG: &[ActionDescriptor] = &[
    ActionDescriptor::new("singleton", Get, "/status"),
    ActionDescriptor::new("factory", Post, "/patterns/factory/create").with_params(&[
        ("type", Text("LIGHT")),
        ("name", Text("New Light")),
        ("location", Text("Demo Room")),
    ]),
    ActionDescriptor::new("abstract-factory", Post, "/patterns/abstract-factory/create")
        .with_params(&[("ecosystem", Text("SMARTTHINGS")), ("location", Text("Demo Room"))]),
    ActionDescriptor::new("builder", Post, "/patterns/builder/rule").with_params(&[
        ("name", Text("Motion Lights")),
        ("trigger", Text("motion")),
        ("condition", Text("night")),
        ("action", Text("light on")),
    ]),
    ActionDescriptor::new("prototype", Get, "/patterns/prototype/templates"),
    ActionDescriptor::new("adapter", Post, "/patterns/adapter/legacy")
        .with_params(&[("name", Text("Old Thermostat")), ("location", Text("Basement"))]),
    ActionDescriptor::new("bridge", Get, "/patterns/bridge/demo"),
    ActionDescriptor::new("composite", Get, "/patterns/composite/rooms"),
    ActionDescriptor::new("decorator", Post, "/patterns/decorator/wrap")
        .with_params(&[("decorators", Text("LOGGING,SECURITY,CACHING"))])
        .with_device("deviceId", "living-light-1"),
    ActionDescriptor::new("facade", Post, "/patterns/facade/scene/movie"),
    ActionDescriptor::new("flyweight", Get, "/patterns/flyweight/demo"),
    ActionDescriptor::new("proxy", Post, "/patterns/proxy/remote")
        .with_params(&[("name", Text("Remote Camera")), ("address", Text("192.168.1.100"))]),
    ActionDescriptor::new("chain", Post, "/patterns/chain/alert")
        .with_params(&[
            ("level", Text("WARNING")),
            ("message", Text("Motion detected at front door")),
        ])
        .with_device("deviceId", "sensor-1"),
    ActionDescriptor::new("command", Post, "/patterns/command/execute")
        .with_params(&[("command", Text("ON"))])
        .with_device("deviceId", "living-light-1"),
    ActionDescriptor::new("interpreter", Post, "/patterns/interpreter/evaluate").with_params(&[
        ("rule", Text("motion AND hour >= 18")),
        ("motion", Bool(true)),
        ("hour", Number(20)),
    ]),
    ActionDescriptor::new("iterator", Get, "/patterns/iterator/demo")
        .with_params(&[("filterType", Text("ROOM")), ("filterValue", Text("Living Room"))]),
    ActionDescriptor::new("mediator", Get, "/patterns/mediator/demo"),
    ActionDescriptor::new("memento", Post, "/patterns/memento/save")
        .with_params(&[("sceneName", Text("Demo Scene"))]),
    ActionDescriptor::new("observer", Post, "/patterns/observer/register")
        .with_params(&[("observerType", Text("MOBILE"))])
        .with_device("deviceId", "sensor-1"),
    ActionDescriptor::new("state", Get, "/patterns/state/demo"),
    ActionDescriptor::new("strategy", Post, "/patterns/strategy/apply")
        .with_params(&[("strategy", Text("ECO"))]),
    ActionDescriptor::new("template", Get, "/patterns/template/demo")
        .with_params(&[("deviceType", Text("LIGHT"))]),
    ActionDescriptor::new("visitor", Get, "/patterns/visitor/audit")
        .with_params(&[("type", Text("SECURITY"))]),
];

#[must_use]
pub fn lookup_action(id: &str) -> &'static ActionDescriptor {
    ACTION_CATALOG
        .iter()
        .find(|descriptor| descriptor.id == id)
        .unwrap_or(&DEFAULT_ACTION)
}

/// Rewrites a form submission aimed at `endpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormOverride {
    pub endpoint: &'static str,
    pub method: HttpMethod,
    pub target: &'static str,
}

pub const FORM_ENDPOINT_OVERRIDES: &[FormOverride] = &[
    FormOverride {
        endpoint: "/patterns/observer/register",
        method: Post,
        target: "/patterns/observer/subscribe",
    },
    FormOverride {
        endpoint: "/patterns/mediator/notify",
        method: Post,
        target: "/patterns/mediator/notify",
    },
    FormOverride {
        endpoint: "/patterns/template/init",
        method: Post,
        target: "/patterns/template/init",
    },
];

/// Method and endpoint actually used for a form submission.
#[must_use]
pub fn resolve_form_target(endpoint: &str, method: HttpMethod) -> (HttpMethod, String) {
    FORM_ENDPOINT_OVERRIDES
        .iter()
        .find(|rule| rule.endpoint == endpoint)
        .map_or_else(
            || (method, endpoint.to_string()),
            |rule| (rule.method, rule.target.to_string()),
        )
}

/// Parameter read from a text input inside a lab section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabInput {
    /// Id of the section holding the input.
    pub section: &'static str,
    pub name: &'static str,
    pub fallback: &'static str,
}

/// A Patterns Lab button identified by its element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabButton {
    pub element_id: &'static str,
    /// Result panel receiving the response.
    pub pattern: &'static str,
    pub method: HttpMethod,
    pub endpoint: &'static str,
    pub params: &'static [(&'static str, &'static str)],
    pub input: Option<LabInput>,
}

pub const LAB_BUTTONS: &[LabButton] = &[
    LabButton {
        element_id: "undo-btn",
        pattern: "command",
        method: Post,
        endpoint: "/patterns/command/undo",
        params: &[],
        input: None,
    },
    LabButton {
        element_id: "redo-btn",
        pattern: "command",
        method: Post,
        endpoint: "/patterns/command/redo",
        params: &[],
        input: None,
    },
    LabButton {
        element_id: "restore-btn",
        pattern: "memento",
        method: Post,
        endpoint: "/patterns/memento/restore",
        params: &[],
        input: Some(LabInput {
            section: "memento",
            name: "sceneName",
            fallback: "My Snapshot",
        }),
    },
    LabButton {
        element_id: "list-mementos-btn",
        pattern: "memento",
        method: Get,
        endpoint: "/patterns/memento/list",
        params: &[],
        input: None,
    },
    LabButton {
        element_id: "trigger-event-btn",
        pattern: "observer",
        method: Post,
        endpoint: "/patterns/observer/trigger",
        params: &[("eventType", "MOTION")],
        input: Some(LabInput {
            section: "observer",
            name: "deviceId",
            fallback: "living-thermostat",
        }),
    },
];

#[must_use]
pub fn lab_button(element_id: &str) -> Option<&'static LabButton> {
    LAB_BUTTONS
        .iter()
        .find(|button| button.element_id == element_id)
}

impl LabButton {
    /// `input_value` is the current text of the button's input, if any.
    #[must_use]
    pub fn build_params(&self, input_value: Option<&str>) -> ParamMap {
        let mut params: ParamMap = self
            .params
            .iter()
            .map(|(name, value)| ((*name).to_string(), ParamValue::from(*value)))
            .collect();
        if let Some(input) = self.input {
            let value = input_value.filter(|value| !value.is_empty()).unwrap_or(input.fallback);
            params.insert(input.name.to_string(), ParamValue::from(value));
        }
        params
    }
}

pub const LAB_SCENE_PATTERN: &str = "facade";
pub const LAB_SCENE_ENDPOINT: &str = "/patterns/facade/scene/{sceneName}";
pub const LAB_STRATEGY_PATTERN: &str = "strategy";
pub const LAB_STRATEGY_ENDPOINT: &str = "/patterns/strategy/apply";
pub const LAB_AUDIT_PATTERN: &str = "visitor";
pub const LAB_AUDIT_ENDPOINT: &str = "/patterns/visitor/audit";
