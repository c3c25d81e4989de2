//! DOM rendering of the panel page.

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, DragEvent, Element, HtmlElement, HtmlImageElement};

use crate::message::Message;
use crate::render::{DragPayload, Gallery, ImageCard, ModeIndicator, PanelView, EMPTY_PLACEHOLDER};

/// Sink for messages raised by rendered elements.
pub(crate) type Dispatch = Rc<dyn Fn(Message)>;

const DOWNLOAD_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" stroke-width="1.5" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" d="M3 16.5v2.25A2.25 2.25 0 0 0 5.25 21h13.5A2.25 2.25 0 0 0 21 18.75V16.5M16.5 12 12 16.5m0 0L7.5 12m4.5 4.5V3" /></svg>"#;
const DELETE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" stroke-width="1.5" stroke="currentColor"><path stroke-linecap="round" stroke-linejoin="round" d="M6 18 18 6M6 6l12 12" /></svg>"#;

/// Panel view writing into the side panel document.
///
/// Expects `#selectMode`, `#status` and `#imagesContainer` in the page.
pub struct DomView {
    document: Document,
    dispatch: Dispatch,
    /// Listeners of the currently rendered cards, dropped on re-render
    card_listeners: Vec<Closure<dyn FnMut(web_sys::Event)>>,
}

impl DomView {
    pub(crate) fn new(document: Document, dispatch: Dispatch) -> Self {
        Self {
            document,
            dispatch,
            card_listeners: Vec::new(),
        }
    }

    fn element(&self, id: &str) -> Option<Element> {
        let element = self.document.get_element_by_id(id);
        if element.is_none() {
            log::warn!("Panel element #{} missing", id);
        }
        element
    }

    fn render_card(&mut self, container: &Element, card: &ImageCard) -> Result<(), JsValue> {
        let item = self.document.create_element("div")?;
        item.set_class_name("image-item");

        let download = self.button("download-btn", "Download this image", DOWNLOAD_ICON)?;
        self.on(&download, "click", Message::Download(card.index))?;

        let delete = self.button("delete-btn", "Delete this image", DELETE_ICON)?;
        let index = isize::try_from(card.index).unwrap_or(isize::MAX);
        self.on(&delete, "click", Message::Delete(index))?;

        let img: HtmlImageElement = self.document.create_element("img")?.dyn_into()?;
        img.set_src(&card.src);
        img.set_alt("Extracted image");
        img.set_draggable(true);
        self.on_drag(&img, &card.src)?;

        let info = self.document.create_element("div")?;
        info.set_class_name("image-info");
        for line in [&card.size, &card.captured, &card.source] {
            let row = self.document.create_element("div")?;
            row.set_text_content(Some(line));
            info.append_child(&row)?;
        }

        item.append_child(&download)?;
        item.append_child(&delete)?;
        item.append_child(&img)?;
        item.append_child(&info)?;
        container.append_child(&item)?;
        Ok(())
    }

    fn button(&self, class: &str, title: &str, icon: &str) -> Result<HtmlElement, JsValue> {
        let button: HtmlElement = self.document.create_element("button")?.dyn_into()?;
        button.set_class_name(class);
        button.set_title(title);
        button.set_inner_html(icon);
        Ok(button)
    }

    fn on(&mut self, target: &Element, event: &str, message: Message) -> Result<(), JsValue> {
        let dispatch = self.dispatch.clone();
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event| {
            dispatch(message.clone());
        });
        target.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        self.card_listeners.push(listener);
        Ok(())
    }

    fn on_drag(&mut self, img: &HtmlImageElement, src: &str) -> Result<(), JsValue> {
        let payload = DragPayload::for_src(src);
        let src = src.to_string();
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(transfer) = event
                .dyn_ref::<DragEvent>()
                .and_then(|event| event.data_transfer())
            else {
                return;
            };
            for (format, data) in &payload.entries {
                let _ = transfer.set_data(format, data);
            }
            if let Some(img) = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlImageElement>().ok())
            {
                let x = i32::try_from(img.width() / 2).unwrap_or_default();
                let y = i32::try_from(img.height() / 2).unwrap_or_default();
                transfer.set_drag_image(&img, x, y);
            }
            transfer.set_effect_allowed(payload.effect.as_str());
            log::debug!("Drag started for image: {}", src);
        });
        img.add_event_listener_with_callback("dragstart", listener.as_ref().unchecked_ref())?;
        self.card_listeners.push(listener);
        Ok(())
    }

    fn try_render_gallery(&mut self, gallery: &Gallery) -> Result<(), JsValue> {
        let Some(container) = self.element("imagesContainer") else {
            return Ok(());
        };
        container.set_inner_html("");
        self.card_listeners.clear();

        match gallery {
            Gallery::Empty => {
                container.class_list().remove_1("has-images")?;
                let placeholder = self.document.create_element("div")?;
                placeholder.set_class_name("placeholder");
                placeholder.set_text_content(Some(EMPTY_PLACEHOLDER));
                container.append_child(&placeholder)?;
            }
            Gallery::Items(cards) => {
                container.class_list().add_1("has-images")?;
                for card in cards {
                    self.render_card(&container, card)?;
                }
            }
        }
        Ok(())
    }

    fn try_show_mode(&self, indicator: &ModeIndicator) -> Result<(), JsValue> {
        if let Some(button) = self.element("selectMode") {
            let label = match button.query_selector("span")? {
                Some(span) => span,
                None => {
                    let span = self.document.create_element("span")?;
                    button.append_child(&span)?;
                    span
                }
            };
            label.set_text_content(Some(indicator.button_label));
            button
                .class_list()
                .toggle_with_force("active", indicator.active)?;
        }

        if let Some(status) = self.element("status") {
            status.set_text_content(Some(indicator.status));
            status
                .class_list()
                .toggle_with_force("active", indicator.active)?;
            status
                .class_list()
                .toggle_with_force("inactive", !indicator.active)?;
        }
        Ok(())
    }
}

impl PanelView for DomView {
    fn render_gallery(&mut self, gallery: &Gallery) {
        if let Err(e) = self.try_render_gallery(gallery) {
            log::error!("Failed to render images: {:?}", e);
        }
    }

    fn show_mode(&mut self, indicator: &ModeIndicator) {
        if let Err(e) = self.try_show_mode(indicator) {
            log::error!("Failed to update selection status: {:?}", e);
        }
    }

    fn notify(&mut self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
