//! WASM bindings for `mdseo`.
//!
//! Exposes the renderer to JavaScript via wasm-bindgen. Call `render_html()`
//! with markdown to get the search-engine fragment, or `parse()` for the
//! document tree.

use wasm_bindgen::prelude::*;

/// Render markdown to the restricted HTML fragment.
///
/// Returns an empty string if the input cannot be parsed.
#[wasm_bindgen]
pub fn render_html(input: &str) -> String {
    let result = mdseo::render_with(&mdseo::MarkdownParser::default(), input);
    for diag in &result.diagnostics {
        console_error(&diag.message);
    }
    result.html
}

/// Parse markdown and return the document tree as a JSON string.
///
/// On failure returns `{ "error": "..." }`.
#[wasm_bindgen]
pub fn parse(input: &str) -> String {
    match mdseo::parse(input) {
        Ok(doc) => serde_json::to_string(&doc).unwrap_or_else(|_| "{\"children\":[]}".to_string()),
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

/// Parse markdown and return the document tree as a JavaScript object.
#[wasm_bindgen]
pub fn parse_tree(input: &str) -> Result<JsValue, JsError> {
    let doc = mdseo::parse(input).map_err(|e| JsError::new(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsError::new(&e.to_string()))
}

/// Validate markdown and return diagnostics as JSON.
///
/// Returns a JSON array of `{ severity, message, code }` objects.
/// An empty array means the document renders without losses.
#[wasm_bindgen]
pub fn validate(input: &str) -> String {
    let diagnostics = match mdseo::parse(input) {
        Ok(doc) => doc.validate(),
        Err(e) => vec![mdseo::Diagnostic::new(
            mdseo::Severity::Error,
            "E001",
            e.to_string(),
        )],
    };
    serde_json::to_string(&diagnostics).unwrap_or_else(|_| "[]".to_string())
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(message: &str);
}
