//! Browser bindings for the widget initializer.
//!
//! Compiled behind the `wasm` feature for `wasm32-unknown-unknown`. This is
//! the only module that touches `web_sys`/`js_sys`; the protocol itself lives
//! in [`crate::init`] and runs against the traits in [`crate::dom`].

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::dom::{DocumentView, MountNode, MOUNT_CLASS};
use crate::error::{EmbedError, Result};
use crate::init::{self, ComponentFactory, InstanceProps};
use crate::workers;

/// The loaded page, viewed through the protocol's document seam.
pub struct BrowserDocument {
    doc: Document,
}

impl BrowserDocument {
    pub fn current() -> Result<Self> {
        let doc = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| {
                EmbedError::DependencyUnavailable("no document in this context".to_string())
            })?;
        Ok(Self { doc })
    }
}

pub struct BrowserMount(Element);

impl MountNode for BrowserMount {
    fn id(&self) -> String {
        self.0.id()
    }

    fn clear(&self) {
        self.0.set_inner_html("");
    }

    fn replace_html(&self, html: &str) {
        self.0.set_inner_html(html);
    }
}

impl DocumentView for BrowserDocument {
    type Node = BrowserMount;

    fn mount_points(&self) -> Vec<BrowserMount> {
        let Ok(list) = self.doc.query_selector_all(&format!(".{MOUNT_CLASS}")) else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(list.length() as usize);
        for i in 0..list.length() {
            if let Some(node) = list.get(i) {
                if let Ok(element) = node.dyn_into::<Element>() {
                    nodes.push(BrowserMount(element));
                }
            }
        }
        nodes
    }

    fn fragment_text(&self, id: &str) -> Option<String> {
        self.doc.get_element_by_id(id).and_then(|el| el.text_content())
    }
}

/// The editor+viewer component and the rendering primitives, resolved from
/// the global scope where the bundle exposes them.
pub struct PreactFactory {
    h: js_sys::Function,
    render: js_sys::Function,
    component: JsValue,
}

impl PreactFactory {
    pub fn acquire() -> Result<Self> {
        let global = js_sys::global();
        let preact = lookup(&global, "preact")?;
        let h = as_function(lookup(&preact, "h")?, "preact.h")?;
        let render = as_function(lookup(&preact, "render")?, "preact.render")?;

        let components = lookup(&global, "molstarComponents")?;
        let component = lookup(&components, "EditorWithViewer")?;

        Ok(Self { h, render, component })
    }
}

impl ComponentFactory<BrowserMount> for PreactFactory {
    fn mount(&self, node: &BrowserMount, props: &InstanceProps) -> Result<()> {
        // json_compatible so the flattened props serialize as a plain JS
        // object rather than a Map.
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let js_props = props
            .serialize(&serializer)
            .map_err(|e| EmbedError::Instantiation(e.to_string()))?;

        let vnode = self
            .h
            .call2(&JsValue::NULL, &self.component, &js_props)
            .map_err(|e| EmbedError::Instantiation(js_message(&e)))?;
        self.render
            .call2(&JsValue::NULL, &vnode, &node.0)
            .map_err(|e| EmbedError::Instantiation(js_message(&e)))?;
        Ok(())
    }
}

fn lookup(obj: &JsValue, name: &str) -> Result<JsValue> {
    let value = js_sys::Reflect::get(obj, &JsValue::from_str(name))
        .map_err(|e| EmbedError::DependencyUnavailable(js_message(&e)))?;
    if value.is_undefined() || value.is_null() {
        return Err(EmbedError::DependencyUnavailable(format!("{name} not found")));
    }
    Ok(value)
}

fn as_function(value: JsValue, name: &str) -> Result<js_sys::Function> {
    value
        .dyn_into::<js_sys::Function>()
        .map_err(|_| EmbedError::DependencyUnavailable(format!("{name} is not a function")))
}

fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else {
        value.as_string().unwrap_or_else(|| format!("{value:?}"))
    }
}

fn document_script_srcs(doc: &Document) -> Vec<String> {
    let scripts = doc.get_elements_by_tag_name("script");
    let mut srcs = Vec::with_capacity(scripts.length() as usize);
    for i in 0..scripts.length() {
        if let Some(element) = scripts.item(i) {
            if let Ok(script) = element.dyn_into::<web_sys::HtmlScriptElement>() {
                srcs.push(script.src());
            }
        }
    }
    srcs
}

/// Register the worker resolver and install the component-visible
/// `MonacoEnvironment` hook. Must run before the component initializes, since
/// the editor reads the hook eagerly.
pub fn install_worker_environment() -> std::result::Result<(), JsValue> {
    let _ = workers::register_worker_resolver(Box::new(|label| {
        let base = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|doc| workers::base_path_from_scripts(document_script_srcs(&doc)))
            .unwrap_or_default();
        workers::worker_url(&base, label)
    }));

    let get_worker_url = Closure::<dyn Fn(JsValue, String) -> String>::new(
        |_module_id: JsValue, label: String| {
            workers::resolve_worker(&label).unwrap_or_default()
        },
    );

    let env = js_sys::Object::new();
    js_sys::Reflect::set(&env, &"getWorkerUrl".into(), get_worker_url.as_ref())?;
    get_worker_url.forget();
    js_sys::Reflect::set(&js_sys::global(), &"MonacoEnvironment".into(), &env)?;
    Ok(())
}

/// Initialize every viewer in the current document. Runs exactly once per
/// document load, from [`start`].
fn initialize_viewers() {
    let doc = match BrowserDocument::current() {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };
    init::initialize(&doc, PreactFactory::acquire);
}

/// Module entry point: wire console tracing and the worker environment, then
/// run initialization once the document's structural content is parsed.
#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    let _ = tracing_wasm::try_set_as_global_default();
    install_worker_environment()?;

    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return Ok(());
    };

    if doc.ready_state() == "loading" {
        let on_ready = Closure::<dyn FnMut()>::new(initialize_viewers);
        doc.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
        on_ready.forget();
    } else {
        initialize_viewers();
    }
    Ok(())
}
