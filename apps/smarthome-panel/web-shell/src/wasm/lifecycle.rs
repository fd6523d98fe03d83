use super::*;

pub(super) async fn boot() -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())?;

    let base_override = document
        .body()
        .and_then(|body| body.dataset().get(API_BASE_DATA_KEY));
    let config = PanelConfig::default()
        .with_api_base_path(base_override.as_deref())
        .map_err(|error| error.to_string())?;

    let page = Rc::new(WebPage::new(document.clone()));
    let panel = Rc::new(ControlPanel::with_config(GlooTransport, page, config));
    PANEL.with(|slot| {
        *slot.borrow_mut() = Some(panel.clone());
    });
    install_listeners(&document)?;

    panel.boot().await;
    Ok(())
}

fn install_listeners(document: &web_sys::Document) -> Result<(), String> {
    let click = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(|event: web_sys::Event| {
        handle_event(EventKind::Click, &event);
    }));
    document
        .add_event_listener_with_callback("click", click.as_ref().unchecked_ref())
        .map_err(|_| "failed to register click listener".to_string())?;
    CLICK_HANDLER.with(|slot| {
        *slot.borrow_mut() = Some(click);
    });

    let submit = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(|event: web_sys::Event| {
        handle_event(EventKind::Submit, &event);
    }));
    document
        .add_event_listener_with_callback("submit", submit.as_ref().unchecked_ref())
        .map_err(|_| "failed to register submit listener".to_string())?;
    SUBMIT_HANDLER.with(|slot| {
        *slot.borrow_mut() = Some(submit);
    });
    Ok(())
}

fn handle_event(kind: EventKind, event: &web_sys::Event) {
    let Some(target) = event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
    else {
        return;
    };
    let Some(routed) = route_event(kind, &WebElement::new(target)) else {
        return;
    };
    if routed.prevent_default {
        event.prevent_default();
    }
    dispatch(routed.intent);
}

/// Each intent runs as its own task; overlapping requests are not serialized.
pub(super) fn dispatch(intent: UiIntent) {
    let Some(panel) = PANEL.with(|slot| slot.borrow().clone()) else {
        return;
    };
    spawn_local(async move {
        panel.dispatch(intent).await;
    });
}
