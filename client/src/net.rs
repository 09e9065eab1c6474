use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, Window};

use inkgallery_shared::{CaptureRequest, DeleteRequest, DrawingRequest, ImageList, MoveRequest};

fn to_js(error: serde_json::Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}

async fn send(
    window: &Window,
    method: &str,
    url: &str,
    body: Option<String>,
) -> Result<ImageList, JsValue> {
    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = &body {
        init.set_body(&JsValue::from_str(body));
    }
    let request = Request::new_with_str_and_init(url, &init)?;
    if body.is_some() {
        request.headers().set("Content-Type", "application/json")?;
    }

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if response.status() != 200 {
        return Err(JsValue::from_str(&format!(
            "Server Error {} for {method} {url}",
            response.status()
        )));
    }
    let text = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("Response body is not text"))?;
    serde_json::from_str(&text).map_err(to_js)
}

pub async fn fetch_listing(window: &Window) -> Result<ImageList, JsValue> {
    send(window, "GET", "/imageList", None).await
}

pub async fn post_drawing(window: &Window, request: &DrawingRequest) -> Result<ImageList, JsValue> {
    let body = serde_json::to_string(request).map_err(to_js)?;
    send(window, "POST", "/drawing", Some(body)).await
}

pub async fn delete_images(window: &Window, paths: Vec<String>) -> Result<ImageList, JsValue> {
    let body = serde_json::to_string(&DeleteRequest { paths }).map_err(to_js)?;
    send(window, "DELETE", "/image", Some(body)).await
}

pub async fn move_images(
    window: &Window,
    paths: Vec<String>,
    destination: String,
) -> Result<ImageList, JsValue> {
    let body = serde_json::to_string(&MoveRequest { paths, destination }).map_err(to_js)?;
    send(window, "POST", "/move", Some(body)).await
}

pub async fn capture(window: &Window, current_dir: String) -> Result<ImageList, JsValue> {
    let body = serde_json::to_string(&CaptureRequest { current_dir }).map_err(to_js)?;
    send(window, "POST", "/capture", Some(body)).await
}
