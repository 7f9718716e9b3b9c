//! Рендеринг ROC кривой в PNG (base64)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;

use crate::error::EvaluationError;
use crate::evaluation::metrics::RocCurve;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

const DARK_ORANGE: RGBColor = RGBColor(255, 140, 0);
const NAVY: RGBColor = RGBColor(0, 0, 128);

/// Кривая положительного класса и пунктирная диагональ случайного угадывания.
///
/// Текст не рисуется, поэтому системные шрифты не нужны.
pub fn render_roc_curve(roc: &RocCurve) -> Result<Vec<u8>, EvaluationError> {
    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    draw(roc, &mut pixels).map_err(EvaluationError::Render)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, WIDTH, HEIGHT, ColorType::Rgb8)
        .map_err(|e| EvaluationError::Render(e.to_string()))?;
    Ok(png)
}

pub fn render_roc_curve_base64(roc: &RocCurve) -> Result<String, EvaluationError> {
    Ok(STANDARD.encode(render_roc_curve(roc)?))
}

fn draw(roc: &RocCurve, pixels: &mut [u8]) -> Result<(), String> {
    let root = BitMapBackend::with_buffer(pixels, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .margin(24)
        .build_cartesian_2d(0f64..1f64, 0f64..1.05f64)
        .map_err(|e| e.to_string())?;

    chart
        .plotting_area()
        .draw(&Rectangle::new([(0.0, 0.0), (1.0, 1.05)], BLACK.stroke_width(1)))
        .map_err(|e| e.to_string())?;

    // Диагональ пунктиром: 20 отрезков с промежутками
    let navy = NAVY.stroke_width(2);
    chart
        .draw_series((0..20).map(|i| {
            let start = i as f64 / 20.0;
            let end = start + 0.03;
            PathElement::new(vec![(start, start), (end, end)], navy)
        }))
        .map_err(|e| e.to_string())?;

    chart
        .draw_series(LineSeries::new(roc.points(), DARK_ORANGE.stroke_width(2)))
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}
