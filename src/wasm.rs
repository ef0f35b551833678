//! WebAssembly bindings for the Images to PDF assembler

use crate::{assemble_pdf_bytes, AssembleResult, InputImage, PageGeometry};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Collect parallel buffer/MIME arrays into input images.
fn collect_images(
    buffers: &js_sys::Array,
    mime_types: &js_sys::Array,
) -> Result<Vec<InputImage>, JsError> {
    if buffers.length() != mime_types.length() {
        return Err(JsError::new(
            "Each image buffer needs a matching MIME type.",
        ));
    }

    let mut images = Vec::with_capacity(buffers.length() as usize);
    for i in 0..buffers.length() {
        let bytes = js_sys::Uint8Array::new(&buffers.get(i)).to_vec();
        let mime_type = mime_types
            .get(i)
            .as_string()
            .ok_or_else(|| JsError::new("MIME types must be strings."))?;
        images.push(InputImage { bytes, mime_type });
    }
    Ok(images)
}

/// Convert a list of JPEG/PNG images into a single paginated A4 PDF.
///
/// # Arguments
/// * `buffers` - Array of Uint8Array image file buffers, in page order
/// * `mime_types` - Array of MIME type strings, parallel to `buffers`
///
/// # Returns
/// The assembled PDF as a byte array, or throws an error. The error message
/// is user-visible ("Unsupported file type. Please upload JPG or PNG
/// images." for a bad MIME type).
#[wasm_bindgen]
pub fn images_to_pdf(
    buffers: js_sys::Array,
    mime_types: js_sys::Array,
) -> Result<Vec<u8>, JsError> {
    let images = collect_images(&buffers, &mime_types)?;

    let (pdf_bytes, _result) = assemble_pdf_bytes(&images, &PageGeometry::default())
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(pdf_bytes)
}

/// Convert images with a per-page placement report.
///
/// Same conversion as [`images_to_pdf`], returning an
/// [`AssembleResultJs`] with the PDF bytes, the page count and the per-page
/// image placement as JSON.
#[wasm_bindgen]
pub fn images_to_pdf_with_info(
    buffers: js_sys::Array,
    mime_types: js_sys::Array,
) -> Result<AssembleResultJs, JsError> {
    let images = collect_images(&buffers, &mime_types)?;
    let geometry = PageGeometry::default();

    let (pdf_bytes, result) =
        assemble_pdf_bytes(&images, &geometry).map_err(|e| JsError::new(&e.to_string()))?;

    let page_info_json = serde_json::to_string(&placements_to_json(&geometry, &result))
        .unwrap_or_else(|_| "[]".to_string());

    Ok(AssembleResultJs {
        pdf_bytes,
        page_count: result.page_count,
        page_info_json,
    })
}

/// Convert placements to a JSON-serializable structure
fn placements_to_json(geometry: &PageGeometry, result: &AssembleResult) -> Vec<serde_json::Value> {
    result
        .placements
        .iter()
        .enumerate()
        .map(|(i, placed)| {
            serde_json::json!({
                "page": i + 1,
                "pageWidth": geometry.width,
                "pageHeight": geometry.height,
                "x": placed.x,
                "y": placed.y,
                "width": placed.width,
                "height": placed.height,
            })
        })
        .collect()
}

/// Result of a PDF assembly with per-page placement information
#[wasm_bindgen]
pub struct AssembleResultJs {
    pdf_bytes: Vec<u8>,
    page_count: usize,
    page_info_json: String,
}

#[wasm_bindgen]
impl AssembleResultJs {
    /// Get the assembled PDF bytes
    #[wasm_bindgen(getter)]
    pub fn pdf_bytes(&self) -> Vec<u8> {
        self.pdf_bytes.clone()
    }

    /// Get the number of pages
    #[wasm_bindgen(getter)]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Get per-page placement information as a JSON string
    #[wasm_bindgen(getter)]
    pub fn page_info_json(&self) -> String {
        self.page_info_json.clone()
    }
}
