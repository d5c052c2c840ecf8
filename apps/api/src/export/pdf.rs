//! Writes a laid-out surface to an A4 PDF with lopdf.
//!
//! Every page carries the whole surface, shifted by that page's offset from
//! the `PagePlan` and clipped to the page box. Operations entirely outside a
//! page are left out of its content stream. Text uses the base-14 Helvetica
//! faces with WinAnsiEncoding, so nothing is embedded except the photo.

use std::io::Cursor;

use image::imageops;
use image::io::{Limits, Reader as ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::document::photo::MAX_PHOTO_DIMENSION;
use crate::export::surface::{DrawOp, Rgb, Surface};
use crate::export::ExportError;
use crate::layout::{FontFace, PageConfig, PagePlan};

const PHOTO_XOBJECT: &str = "Im1";

/// Longest side of the embedded photo, in pixels. The photo is drawn 96 CSS
/// px wide, which is 384 device px at the largest export scale.
pub const EMBEDDED_PHOTO_SIDE: u32 = 512;

/// A photo decoded to packed 8-bit RGB.
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Decodes PNG or JPEG bytes and shrinks the result so neither side exceeds
/// `max_side`. Alpha is dropped. Images larger than `MAX_PHOTO_DIMENSION`
/// on either side are refused before any pixels are allocated.
pub fn decode_photo(bytes: &[u8], max_side: u32) -> Result<DecodedPhoto, image::ImageError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_PHOTO_DIMENSION);
    limits.max_image_height = Some(MAX_PHOTO_DIMENSION);

    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);
    let mut img = reader.decode()?.to_rgb8();

    let (width, height) = img.dimensions();
    let longest = width.max(height);
    if longest > max_side {
        let shrink = |side: u32| ((u64::from(side) * u64::from(max_side)) / u64::from(longest)).max(1) as u32;
        img = imageops::thumbnail(&img, shrink(width), shrink(height));
    }

    let (width, height) = img.dimensions();
    Ok(DecodedPhoto {
        width,
        height,
        rgb: img.into_raw(),
    })
}

pub fn write_pdf(
    surface: &Surface,
    plan: &PagePlan,
    config: &PageConfig,
    photo: Option<&DecodedPhoto>,
    title: &str,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }

    let mut resources = dictionary! { "Font" => fonts };
    if let Some(photo) = photo {
        let image_id = add_photo(&mut doc, photo);
        resources.set("XObject", dictionary! { PHOTO_XOBJECT => image_id });
    }
    let resources_id = doc.add_object(resources);

    let k = config.pt_per_device_px();
    let mut kids = Vec::with_capacity(plan.page_count());
    for offset in &plan.offsets_pt {
        let operations = page_operations(surface, *offset, k, config.page_height_pt, photo.is_some());
        let content = Content { operations }
            .encode()
            .map_err(|e| ExportError::Writer(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(config.page_width_pt),
                real(config.page_height_pt),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal(concat!("cvkit ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Writer(e.to_string()))?;
    Ok(out)
}

fn add_photo(doc: &mut Document, photo: &DecodedPhoto) -> ObjectId {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(photo.width),
        "Height" => i64::from(photo.height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
    };
    doc.add_object(Stream::new(dict, photo.rgb.clone()))
}

/// Content stream for one page. `offset_pt` is where the surface's top edge
/// sits relative to the page's top edge; `k` converts device px to points.
fn page_operations(
    surface: &Surface,
    offset_pt: f32,
    k: f32,
    page_height_pt: f32,
    has_photo: bool,
) -> Vec<Operation> {
    let page_width_pt = surface.width * k;
    // PDF space grows upward from the bottom of the page.
    let to_pdf_y = |y_dev: f32| page_height_pt - (offset_pt + y_dev * k);

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "re",
            vec![real(0.0), real(0.0), real(page_width_pt), real(page_height_pt)],
        ),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
    ];

    for op in &surface.ops {
        let (top, bottom) = op.vertical_extent();
        let top_pt = offset_pt + top * k;
        let bottom_pt = offset_pt + bottom * k;
        if bottom_pt < 0.0 || top_pt > page_height_pt {
            continue;
        }

        match op {
            DrawOp::Text {
                x,
                baseline,
                size,
                face,
                color,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![
                        Object::Name(face.resource_name().as_bytes().to_vec()),
                        real(size * k),
                    ],
                ));
                ops.push(fill_color(*color));
                ops.push(Operation::new(
                    "Tm",
                    vec![
                        real(1.0),
                        real(0.0),
                        real(0.0),
                        real(1.0),
                        real(x * k),
                        real(to_pdf_y(*baseline)),
                    ],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rect { x, y, w, h, color } => {
                ops.push(fill_color(*color));
                ops.push(Operation::new(
                    "re",
                    vec![real(x * k), real(to_pdf_y(y + h)), real(w * k), real(h * k)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::Image { x, y, w, h } => {
                if !has_photo {
                    continue;
                }
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        real(w * k),
                        real(0.0),
                        real(0.0),
                        real(h * k),
                        real(x * k),
                        real(to_pdf_y(y + h)),
                    ],
                ));
                ops.push(Operation::new(
                    "Do",
                    vec![Object::Name(PHOTO_XOBJECT.as_bytes().to_vec())],
                ));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }

    ops.push(Operation::new("Q", vec![]));
    ops
}

fn fill_color(Rgb(r, g, b): Rgb) -> Operation {
    Operation::new(
        "rg",
        vec![
            real(f32::from(r) / 255.0),
            real(f32::from(g) / 255.0),
            real(f32::from(b) / 255.0),
        ],
    )
}

#[allow(clippy::useless_conversion)]
fn real(v: f32) -> Object {
    Object::Real(v.into())
}

/// Encodes text for a WinAnsiEncoding font. Characters outside the code page
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '•' => 0x95,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}
