//! Page abstraction consumed by the synchronizer, presenter and dispatcher.
//!
//! The browser shell implements these traits over `web-sys`; [`MemoryPage`]
//! implements them over a small owned tree for headless runs and tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// One element on the page. Cloning yields another handle to the same node.
pub trait ElementView: Clone {
    fn parent(&self) -> Option<Self>;
    fn id(&self) -> Option<String>;
    fn has_class(&self, class: &str) -> bool;
    /// Adds or removes `class`.
    fn set_class(&self, class: &str, enabled: bool);
    /// Dataset lookup by camelCase key, as in `element.dataset.deviceId`.
    fn data(&self, key: &str) -> Option<String>;
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
    /// First descendant matching the descendant chain `.a .b ...`.
    fn find_descendant(&self, class_path: &[&str]) -> Option<Self>;
    fn is_form(&self) -> bool;
    /// `(name, value)` pairs a form would submit, in document order.
    fn form_entries(&self) -> Vec<(String, String)>;
    /// Value of the first descendant `input[name=...]`.
    fn input_value(&self, name: &str) -> Option<String>;

    /// Nearest inclusive ancestor carrying `class`.
    fn closest_with_class(&self, class: &str) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if element.has_class(class) {
                return Some(element);
            }
            current = element.parent();
        }
        None
    }
}

pub trait PageView {
    type Element: ElementView;

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    /// First element whose dataset `key` equals `value` exactly.
    fn element_by_data(&self, key: &str, value: &str) -> Option<Self::Element>;
    fn reload(&self);
}

/// Escapes `value` for use inside a CSS attribute selector. Every character
/// outside `[A-Za-z0-9_-]` gets a backslash.
#[must_use]
pub fn css_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `deviceId` → `data-device-id`.
#[must_use]
pub fn dataset_attribute(key: &str) -> String {
    let mut attribute = String::from("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            attribute.push('-');
            attribute.push(ch.to_ascii_lowercase());
        } else {
            attribute.push(ch);
        }
    }
    attribute
}

/// `[data-device-id="living\ light"]`
#[must_use]
pub fn data_selector(key: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", dataset_attribute(key), css_escape(value))
}

#[derive(Debug, Default)]
struct MemoryNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    dataset: BTreeMap<String, String>,
    text: String,
    name: Option<String>,
    value: Option<String>,
    parent: Weak<RefCell<MemoryNode>>,
    children: Vec<Rc<RefCell<MemoryNode>>>,
}

/// Handle to a node of a [`MemoryPage`] tree.
#[derive(Debug, Clone)]
pub struct MemoryElement(Rc<RefCell<MemoryNode>>);

impl MemoryElement {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(MemoryNode {
            tag: tag.to_ascii_lowercase(),
            ..MemoryNode::default()
        })))
    }

    #[must_use]
    pub fn with_id(self, id: &str) -> Self {
        self.0.borrow_mut().id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_class(self, class: &str) -> Self {
        self.set_class(class, true);
        self
    }

    #[must_use]
    pub fn with_data(self, key: &str, value: &str) -> Self {
        self.0
            .borrow_mut()
            .dataset
            .insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// A named form control, e.g. `<input name=.. value=..>`.
    #[must_use]
    pub fn field(name: &str, value: &str) -> Self {
        let element = Self::new("input");
        {
            let mut node = element.0.borrow_mut();
            node.name = Some(name.to_string());
            node.value = Some(value.to_string());
        }
        element
    }

    /// Appends `child` and returns it, re-parenting it if needed.
    pub fn append(&self, child: MemoryElement) -> MemoryElement {
        if let Some(previous) = child.parent() {
            previous
                .0
                .borrow_mut()
                .children
                .retain(|node| !Rc::ptr_eq(node, &child.0));
        }
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.0.clone());
        child
    }

    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.0.borrow().classes.clone()
    }

    #[must_use]
    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn set_value(&self, value: &str) {
        self.0.borrow_mut().value = Some(value.to_string());
    }

    fn children(&self) -> Vec<MemoryElement> {
        self.0
            .borrow()
            .children
            .iter()
            .map(|node| MemoryElement(node.clone()))
            .collect()
    }

    /// Pre-order walk over descendants, excluding `self`.
    fn find_first(&self, predicate: &dyn Fn(&MemoryElement) -> bool) -> Option<MemoryElement> {
        for child in self.children() {
            if predicate(&child) {
                return Some(child);
            }
            if let Some(found) = child.find_first(predicate) {
                return Some(found);
            }
        }
        None
    }

    fn collect_fields(&self, entries: &mut Vec<(String, String)>) {
        for child in self.children() {
            {
                let node = child.0.borrow();
                if let (Some(name), Some(value)) = (&node.name, &node.value) {
                    entries.push((name.clone(), value.clone()));
                }
            }
            child.collect_fields(entries);
        }
    }
}

impl ElementView for MemoryElement {
    fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(MemoryElement)
    }

    fn id(&self) -> Option<String> {
        self.0.borrow().id.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|value| value == class)
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let mut node = self.0.borrow_mut();
        let present = node.classes.iter().any(|value| value == class);
        if enabled && !present {
            node.classes.push(class.to_string());
        } else if !enabled && present {
            node.classes.retain(|value| value != class);
        }
    }

    fn data(&self, key: &str) -> Option<String> {
        self.0.borrow().dataset.get(key).cloned()
    }

    fn text(&self) -> String {
        self.0.borrow().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.0.borrow_mut().text = text.to_string();
    }

    fn find_descendant(&self, class_path: &[&str]) -> Option<Self> {
        let Some((first, rest)) = class_path.split_first() else {
            return None;
        };
        let mut scope = self.find_first(&|element| element.has_class(first))?;
        for class in rest {
            scope = scope.find_first(&|element| element.has_class(class))?;
        }
        Some(scope)
    }

    fn is_form(&self) -> bool {
        self.0.borrow().tag == "form"
    }

    fn form_entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        if self.is_form() {
            self.collect_fields(&mut entries);
        }
        entries
    }

    fn input_value(&self, name: &str) -> Option<String> {
        self.find_first(&|element| {
            let node = element.0.borrow();
            node.tag == "input" && node.name.as_deref() == Some(name)
        })
        .and_then(|element| {
            let value = element.0.borrow().value.clone();
            value
        })
    }
}

/// Headless page rooted at a `<body>` element.
#[derive(Debug)]
pub struct MemoryPage {
    body: MemoryElement,
    reloads: Cell<u32>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: MemoryElement::new("body"),
            reloads: Cell::new(0),
        }
    }

    #[must_use]
    pub fn body(&self) -> &MemoryElement {
        &self.body
    }

    #[must_use]
    pub fn reload_count(&self) -> u32 {
        self.reloads.get()
    }
}

impl PageView for MemoryPage {
    type Element = MemoryElement;

    fn element_by_id(&self, id: &str) -> Option<MemoryElement> {
        self.body
            .find_first(&|element| element.0.borrow().id.as_deref() == Some(id))
    }

    fn element_by_data(&self, key: &str, value: &str) -> Option<MemoryElement> {
        self.body.find_first(&|element| {
            element.0.borrow().dataset.get(key).map(String::as_str) == Some(value)
        })
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}
