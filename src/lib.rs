pub mod error;
pub mod gpx_types;
pub mod options;
pub mod parser;
pub mod values;
pub mod writer;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use crate::error::{ErrorKind, GpxError, ValidationError};
pub use crate::gpx_types::*;
pub use crate::options::WriteOptions;
pub use crate::parser::{parse_extension_node, parse_gpx, read_gpx, read_gpx_file};
pub use crate::values::*;
pub use crate::writer::{GpxWriter, write_gpx, write_gpx_file, write_gpx_string};

/// Parse a GPX string and return the document model as a JS object.
#[wasm_bindgen(js_name = gpxToJson)]
pub fn gpx_to_json(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let gpx = parser::parse_gpx(gpx_string)?;
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    gpx.serialize(&serializer)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse a GPX string and return the document model as a JSON string.
#[wasm_bindgen(js_name = gpxToJsonString)]
pub fn gpx_to_json_string(gpx_string: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let gpx = parser::parse_gpx(gpx_string)?;
    serde_json::to_string(&gpx).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse a GPX string and write it back out in canonical GPX 1.1 form.
#[wasm_bindgen(js_name = normalizeGpx)]
pub fn normalize_gpx(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let gpx = parser::parse_gpx(gpx_string)?;
    Ok(writer::write_gpx_string(&gpx, &opts)?)
}

fn parse_options(options: JsValue) -> Result<WriteOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(WriteOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
