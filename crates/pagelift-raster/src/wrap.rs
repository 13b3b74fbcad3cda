//! Page container assembly
//!
//! Wraps a flattened raster as a single-page PDF whose page size equals the
//! raster's pixel dimensions. The raster is embedded as a FlateDecode RGB
//! image XObject and painted across the full page by the content stream.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::Write;
use tracing::info;

use pagelift_core::PageImage;

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// A finished export: the document bytes plus the page geometry they carry.
#[derive(Debug, Clone)]
pub struct ExportedPage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// Wrap a raster as a one-page document sized exactly to it.
pub fn wrap_page(raster: &PageImage) -> Result<ExportedPage, ExportError> {
    let width = raster.width();
    let height = raster.height();
    let orientation = if width > height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };

    // RGB only: the flatten surface is opaque, alpha carries no information.
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for rgba in raster.pixels().chunks_exact(4) {
        rgb.extend_from_slice(&rgba[..3]);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&rgb)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    let mut doc = Document::with_version("1.7");

    let image_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    )));

    let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ");
    let content_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        content.into_bytes(),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (width as i64).into(),
            (height as i64).into(),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    });
    if let Ok(page) = doc.get_object_mut(page_id) {
        if let Ok(dict) = page.as_dict_mut() {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Container(e.to_string()))?;

    info!(width, height, ?orientation, "wrapped raster as single-page document");

    Ok(ExportedPage {
        bytes,
        width,
        height,
        orientation,
    })
}

/// Encode a raster as PNG for interchange (preview, HTTP responses).
pub fn encode_png(image: &PageImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        writer
            .write_image_data(image.pixels())
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(out)
}
