//! Draws [LayoutOp]s onto a `printpdf` document.

use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
    image_crate::{DynamicImage, GenericImageView},
};

use crate::pdf::{
    PdfError,
    layout::{Colour, LayoutOp, PAGE_HEIGHT, PAGE_WIDTH, Weight},
};

const LAYER_NAME: &str = "Contenido";
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

/// Render `ops` to PDF bytes.
///
/// Image ops index into `images`. An op that points past the end of the
/// list is skipped.
pub(super) fn render(
    title: &str,
    ops: &[LayoutOp],
    images: &[DynamicImage],
) -> Result<Vec<u8>, PdfError> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|error| PdfError::Render(error.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|error| PdfError::Render(error.to_string()))?;

    let mut current = doc.get_page(page).get_layer(layer);

    for op in ops {
        match op {
            LayoutOp::NewPage => {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
                current = doc.get_page(page).get_layer(layer);
            }
            LayoutOp::Text {
                x,
                y,
                size,
                weight,
                colour,
                text,
            } => {
                let font = match weight {
                    Weight::Regular => &regular,
                    Weight::Bold => &bold,
                };
                draw_text(&current, font, *x, *y, *size, *colour, text);
            }
            LayoutOp::FillRect {
                x,
                y,
                width,
                height,
                colour,
            } => {
                current.set_fill_color(pdf_colour(*colour));
                current.add_rect(Rect::new(
                    Mm(*x),
                    Mm(PAGE_HEIGHT - y - height),
                    Mm(x + width),
                    Mm(PAGE_HEIGHT - y),
                ));
            }
            LayoutOp::Line { x1, y1, x2, y2 } => {
                current.set_outline_color(pdf_colour(Colour::RULE));
                current.set_outline_thickness(0.3);
                current.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), Mm(PAGE_HEIGHT - y1)), false),
                        (Point::new(Mm(*x2), Mm(PAGE_HEIGHT - y2)), false),
                    ],
                    is_closed: false,
                });
            }
            LayoutOp::Image {
                index,
                x,
                y,
                width,
                height,
            } => {
                let Some(source) = images.get(*index) else {
                    tracing::warn!("Layout referenced missing image {index}, skipping");
                    continue;
                };
                draw_image(&current, source, *x, *y, *width, *height);
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|error| PdfError::Render(error.to_string()))
}

fn draw_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    x: f32,
    y: f32,
    size: f32,
    colour: Colour,
    text: &str,
) {
    layer.set_fill_color(pdf_colour(colour));
    layer.use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - y), font);
}

fn draw_image(
    layer: &PdfLayerReference,
    source: &DynamicImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    // At the given DPI an image is drawn at its natural size, so scale from
    // there to the laid-out box.
    let (width_px, height_px) = source.dimensions();
    let natural_width = width_px as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height = height_px as f32 / IMAGE_DPI * MM_PER_INCH;
    if natural_width <= 0.0 || natural_height <= 0.0 {
        tracing::warn!("Skipping empty image");
        return;
    }

    Image::from_dynamic_image(source).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(PAGE_HEIGHT - y - height)),
            scale_x: Some(width / natural_width),
            scale_y: Some(height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn pdf_colour(Colour(r, g, b): Colour) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}
