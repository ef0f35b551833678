//! Images to PDF Assembler Library
//!
//! Core logic for assembling JPEG/PNG images into a single paginated PDF,
//! one page per image. Shared between CLI and WASM targets.
//!
//! Each image is scaled uniformly to fit a fixed page content box (aspect
//! ratio preserved, no upscale cap) and centered on its own page. Assembly is
//! all-or-nothing: the first unsupported or undecodable image aborts the
//! whole batch and no document is produced.

#[cfg(target_arch = "wasm32")]
pub mod wasm;

use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use thiserror::Error;

/// JPEG quality for alpha SMask streams.
const SMASK_QUALITY: u8 = 90;

/// A single input image: raw file bytes plus the caller-declared MIME type.
#[derive(Debug, Clone)]
pub struct InputImage {
    /// Complete JPEG or PNG file contents
    pub bytes: Vec<u8>,
    /// Declared MIME type ("image/jpeg", "image/jpg" or "image/png")
    pub mime_type: String,
}

/// Page geometry for the assembled document, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Margin reserved on every side of the content box
    pub margin: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with a 20 pt margin.
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 20.0,
        }
    }
}

impl PageGeometry {
    /// Usable width between the margins.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Usable height between the margins.
    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// The margin must leave a positive content box on both axes.
    fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.margin >= 0.0
            && self.margin < self.width / 2.0
            && self.margin < self.height / 2.0
    }

    /// Scale an image uniformly to fit the content box and center it.
    ///
    /// The scale factor is not capped at 1.0: images smaller than the
    /// content box are scaled up to fill the available space.
    pub fn fit(&self, pixel_width: u32, pixel_height: u32) -> PlacedImage {
        let scale = (self.content_width() / pixel_width as f32)
            .min(self.content_height() / pixel_height as f32);
        let width = pixel_width as f32 * scale;
        let height = pixel_height as f32 * scale;

        PlacedImage {
            x: (self.width - width) / 2.0,
            y: (self.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Position and size of one image on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedImage {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of a PDF assembly operation.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// Number of pages in the output document
    pub page_count: usize,
    /// Per-page image placement, in page order
    pub placements: Vec<PlacedImage>,
}

/// Error type for PDF assembly operations.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// No images were supplied.
    #[error("Please upload at least one image file.")]
    EmptyInput,
    /// An image's declared MIME type is not JPEG or PNG. Aborts the batch.
    #[error("Unsupported file type. Please upload JPG or PNG images.")]
    UnsupportedFormat,
    #[error("Invalid page geometry: the margin must be smaller than half the page width and height")]
    InvalidGeometry,
    /// Corrupt or unreadable image bytes, with the decoder's message.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to read image: {0}")]
    Read(String),
    #[error("Failed to encode image stream: {0}")]
    Encode(String),
    #[error("Failed to save PDF: {0}")]
    Save(String),
}

/// Supported raster formats, keyed by declared MIME type.
enum ImageKind {
    Jpeg,
    Png,
}

/// Map a declared MIME type to a supported format. Matching is exact.
fn image_kind(mime_type: &str) -> Option<ImageKind> {
    match mime_type {
        "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
        "image/png" => Some(ImageKind::Png),
        _ => None,
    }
}

/// A decoded image ready to be inserted as a PDF image XObject.
struct EmbeddedImage {
    width: u32,
    height: u32,
    stream: Stream,
    smask: Option<Stream>,
}

/// Check if an image has meaningful alpha.
fn has_alpha(img: &DynamicImage) -> bool {
    match img {
        DynamicImage::ImageRgba8(rgba) => {
            let sample_rate = std::cmp::max(1, rgba.pixels().len() / 10000);
            rgba.pixels().step_by(sample_rate).any(|p| p.0[3] < 255)
        }
        DynamicImage::ImageLumaA8(la) => {
            let sample_rate = std::cmp::max(1, la.pixels().len() / 10000);
            la.pixels().step_by(sample_rate).any(|p| p.0[1] < 255)
        }
        _ => false,
    }
}

/// Check if an image is grayscale.
fn is_grayscale(img: &DynamicImage) -> bool {
    matches!(
        img,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_)
    )
}

/// Compress raw pixel data with FlateDecode.
fn flate_compress(data: &[u8]) -> Result<Vec<u8>, AssembleError> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    std::io::Write::write_all(&mut encoder, data)
        .map_err(|e| AssembleError::Encode(format!("pixel data compression: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| AssembleError::Encode(format!("pixel data compression: {}", e)))
}

/// Build the dictionary shared by all image XObject streams.
fn image_xobject_dict(width: u32, height: u32, color_space: &str, filter: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    dict
}

/// Create an SMask stream for an alpha channel using JPEG compression.
fn smask_stream(alpha_data: &[u8], width: u32, height: u32) -> Result<Stream, AssembleError> {
    let mut jpeg_bytes = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut jpeg_bytes, SMASK_QUALITY);
    encoder
        .encode(
            alpha_data,
            width as u16,
            height as u16,
            jpeg_encoder::ColorType::Luma,
        )
        .map_err(|e| AssembleError::Encode(format!("SMask: {}", e)))?;

    let dict = image_xobject_dict(width, height, "DeviceGray", "DCTDecode");
    Ok(Stream::new(dict, jpeg_bytes))
}

/// Embed a JPEG image.
///
/// The original bytes pass straight through as a DCTDecode stream; decoding
/// is still performed to validate the bytes and read the intrinsic
/// dimensions and color.
fn embed_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, AssembleError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| AssembleError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    let color_space = if is_grayscale(&img) {
        "DeviceGray"
    } else {
        "DeviceRGB"
    };

    let dict = image_xobject_dict(width, height, color_space, "DCTDecode");
    Ok(EmbeddedImage {
        width,
        height,
        stream: Stream::new(dict, bytes.to_vec()),
        smask: None,
    })
}

/// Embed a PNG image as Flate-compressed raw pixels.
///
/// Color data stays lossless; a meaningful alpha channel is split off into a
/// DeviceGray SMask.
fn embed_png(bytes: &[u8]) -> Result<EmbeddedImage, AssembleError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| AssembleError::Decode(e.to_string()))?;
    let (width, height) = (img.width(), img.height());

    if has_alpha(&img) {
        // Separate RGB and Alpha channels
        let raw = img.to_rgba8().into_raw();
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha_data = Vec::with_capacity((width * height) as usize);
        for chunk in raw.chunks(4) {
            rgb_data.push(chunk[0]);
            rgb_data.push(chunk[1]);
            rgb_data.push(chunk[2]);
            alpha_data.push(chunk[3]);
        }

        let dict = image_xobject_dict(width, height, "DeviceRGB", "FlateDecode");
        Ok(EmbeddedImage {
            width,
            height,
            stream: Stream::new(dict, flate_compress(&rgb_data)?),
            smask: Some(smask_stream(&alpha_data, width, height)?),
        })
    } else if is_grayscale(&img) {
        let gray = img.to_luma8();
        let dict = image_xobject_dict(width, height, "DeviceGray", "FlateDecode");
        Ok(EmbeddedImage {
            width,
            height,
            stream: Stream::new(dict, flate_compress(gray.as_raw())?),
            smask: None,
        })
    } else {
        let rgb = img.to_rgb8();
        let dict = image_xobject_dict(width, height, "DeviceRGB", "FlateDecode");
        Ok(EmbeddedImage {
            width,
            height,
            stream: Stream::new(dict, flate_compress(rgb.as_raw())?),
            smask: None,
        })
    }
}

/// Assemble images into a single paginated PDF, one page per image.
///
/// Images are processed strictly in input order; the input order determines
/// the page order. The first unsupported MIME type or undecodable image
/// aborts the whole assembly and no partial document is returned. On success
/// the serialized PDF is returned together with the per-page placement
/// report.
pub fn assemble_pdf_bytes(
    images: &[InputImage],
    geometry: &PageGeometry,
) -> Result<(Vec<u8>, AssembleResult), AssembleError> {
    if images.is_empty() {
        return Err(AssembleError::EmptyInput);
    }
    if !geometry.is_valid() {
        return Err(AssembleError::InvalidGeometry);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());
    let mut placements = Vec::with_capacity(images.len());

    for input in images {
        let embedded = match image_kind(&input.mime_type) {
            Some(ImageKind::Jpeg) => embed_jpeg(&input.bytes)?,
            Some(ImageKind::Png) => embed_png(&input.bytes)?,
            None => return Err(AssembleError::UnsupportedFormat),
        };
        let placed = geometry.fit(embedded.width, embedded.height);

        let mut image_stream = embedded.stream;
        if let Some(smask) = embedded.smask {
            let smask_id = doc.add_object(Object::Stream(smask));
            image_stream.dict.set("SMask", Object::Reference(smask_id));
        }
        let xobject_id = doc.add_object(Object::Stream(image_stream));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placed.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(placed.height),
                        Object::Real(placed.x),
                        Object::Real(placed.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| AssembleError::Encode(format!("content stream: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => xobject_id },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(geometry.width),
                Object::Real(geometry.height),
            ],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
        placements.push(placed);
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    // No CreationDate: identical input must produce identical output.
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("images-to-pdf"),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| AssembleError::Save(e.to_string()))?;

    Ok((
        output,
        AssembleResult {
            page_count,
            placements,
        },
    ))
}

/// Assemble images using the default A4 page geometry.
///
/// Convenience wrapper around [`assemble_pdf_bytes`] that discards the
/// placement report.
pub fn assemble(images: &[InputImage]) -> Result<Vec<u8>, AssembleError> {
    assemble_pdf_bytes(images, &PageGeometry::default()).map(|(bytes, _)| bytes)
}

#[cfg(not(target_arch = "wasm32"))]
pub mod file_ops {
    use super::*;
    use std::fs;
    use std::path::Path;

    /// Assemble image files from disk into a PDF written to `output`.
    ///
    /// The MIME type of each input is derived from its file extension, so an
    /// unrecognized extension is rejected the same way an unsupported upload
    /// would be.
    pub fn images_to_pdf_file(
        inputs: &[impl AsRef<Path>],
        output: &Path,
        geometry: &PageGeometry,
    ) -> Result<AssembleResult, AssembleError> {
        let mut images = Vec::with_capacity(inputs.len());
        for path in inputs {
            let path = path.as_ref();
            let bytes = fs::read(path)
                .map_err(|e| AssembleError::Read(format!("{:?}: {}", path, e)))?;
            images.push(InputImage {
                bytes,
                mime_type: mime_type_for_path(path).to_string(),
            });
        }

        let (pdf_bytes, result) = assemble_pdf_bytes(&images, geometry)?;

        fs::write(output, &pdf_bytes)
            .map_err(|e| AssembleError::Save(format!("{:?}: {}", output, e)))?;

        Ok(result)
    }

    /// Derive a MIME type from a file extension (case-insensitive).
    pub fn mime_type_for_path(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            _ => "application/octet-stream",
        }
    }
}
