use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const PARAMS_FILE_NAME: &str = "simulation_params.json";

/// The chirp designer's inputs, as written to the exported document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    pub mass_a: f64,
    pub mass_b: f64,
    pub duration: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            mass_a: 30.0,
            mass_b: 25.0,
            duration: 4.0,
        }
    }
}

pub fn to_json(params: &SimulationParams) -> Result<String> {
    Ok(serde_json::to_string_pretty(params)?)
}

pub fn from_json(json: &str) -> Result<SimulationParams> {
    Ok(serde_json::from_str(json)?)
}

/// Hands `bytes` to the user under `file_name`: written into `out_dir` on
/// native targets, offered as a browser download on wasm. Returns a
/// human-readable description of where it went.
#[cfg(not(target_arch = "wasm32"))]
pub fn save_bytes(
    out_dir: &std::path::Path,
    file_name: &str,
    bytes: &[u8],
    _mime: &str,
) -> Result<String> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "exported");
    Ok(path.display().to_string())
}

#[cfg(target_arch = "wasm32")]
pub fn save_bytes(
    _out_dir: &std::path::Path,
    file_name: &str,
    bytes: &[u8],
    mime: &str,
) -> Result<String> {
    use crate::error::VivariumError;
    use wasm_bindgen::JsCast;

    let js_err = |e: wasm_bindgen::JsValue| VivariumError::Download(format!("{e:?}"));

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes).buffer());

    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(js_err)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_err)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| VivariumError::Download("no document".into()))?;
    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| VivariumError::Download("anchor cast failed".into()))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    web_sys::Url::revoke_object_url(&url).map_err(js_err)?;

    Ok(format!("download {file_name}"))
}
