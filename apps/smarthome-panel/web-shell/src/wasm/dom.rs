use super::*;

use smarthome_panel_core::dom::{css_escape, data_selector};
use smarthome_panel_core::{ElementView, PageView};

/// [`ElementView`] over a live DOM element.
#[derive(Debug, Clone)]
pub(super) struct WebElement(web_sys::Element);

impl WebElement {
    pub(super) fn new(element: web_sys::Element) -> Self {
        Self(element)
    }

    fn select(&self, selector: &str) -> Option<web_sys::Element> {
        self.0.query_selector(selector).ok().flatten()
    }
}

impl ElementView for WebElement {
    fn parent(&self) -> Option<Self> {
        self.0.parent_element().map(Self)
    }

    fn id(&self) -> Option<String> {
        let id = self.0.id();
        (!id.is_empty()).then_some(id)
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let _ = self.0.class_list().toggle_with_force(class, enabled);
    }

    fn data(&self, key: &str) -> Option<String> {
        self.0
            .dyn_ref::<web_sys::HtmlElement>()
            .and_then(|element| element.dataset().get(key))
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn find_descendant(&self, class_path: &[&str]) -> Option<Self> {
        let selector = class_path
            .iter()
            .map(|class| format!(".{}", css_escape(class)))
            .collect::<Vec<_>>()
            .join(" ");
        self.select(&selector).map(Self)
    }

    fn is_form(&self) -> bool {
        self.0.dyn_ref::<web_sys::HtmlFormElement>().is_some()
    }

    // File inputs have no string value and are skipped.
    fn form_entries(&self) -> Vec<(String, String)> {
        let Some(form) = self.0.dyn_ref::<web_sys::HtmlFormElement>() else {
            return Vec::new();
        };
        let Ok(form_data) = web_sys::FormData::new_with_form(form) else {
            return Vec::new();
        };
        let Ok(Some(entries)) = js_sys::try_iter(&form_data) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let pair = entry.dyn_into::<js_sys::Array>().ok()?;
                Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
            })
            .collect()
    }

    fn input_value(&self, name: &str) -> Option<String> {
        let selector = format!("input[name=\"{}\"]", css_escape(name));
        self.select(&selector)?
            .dyn_into::<web_sys::HtmlInputElement>()
            .ok()
            .map(|input| input.value())
    }
}

#[derive(Debug)]
pub(super) struct WebPage {
    document: web_sys::Document,
}

impl WebPage {
    pub(super) fn new(document: web_sys::Document) -> Self {
        Self { document }
    }
}

impl PageView for WebPage {
    type Element = WebElement;

    fn element_by_id(&self, id: &str) -> Option<WebElement> {
        self.document.get_element_by_id(id).map(WebElement)
    }

    fn element_by_data(&self, key: &str, value: &str) -> Option<WebElement> {
        self.document
            .query_selector(&data_selector(key, value))
            .ok()
            .flatten()
            .map(WebElement)
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    }
}
