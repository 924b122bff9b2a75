// ============================================================
// Layer 6 — Learning Curve Plots
// ============================================================
// Renders the per-epoch series of a TrainingHistory as PNGs:
//
//   loss_curve.png   train_loss / val_loss per epoch
//   rouge_curve.png  train_rouge / val_rouge per epoch
//
// When the test pass has run, its value is drawn as a dashed
// horizontal line across the whole epoch range.
//
// Captions, axis labels and the legend need a font backend and
// are only drawn with the `plot-text` feature. Without it the
// chart holds the curves alone.
//
// Reference: plotters crate documentation (ChartBuilder, LineSeries)

use anyhow::{anyhow, Result};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::{Path, PathBuf};

use crate::domain::history::TrainingHistory;

pub const LOSS_PLOT_FILE:  &str = "loss_curve.png";
pub const ROUGE_PLOT_FILE: &str = "rouge_curve.png";

const DRAW_TEXT: bool = cfg!(feature = "plot-text");

/// What one chart shows
struct Curves<'a> {
    title: &'a str,
    y_desc: &'a str,
    train: &'a [f64],
    val: &'a [f64],
    test: Option<f64>,
}

pub fn plot_loss_curves(dir: &Path, history: &TrainingHistory) -> Result<PathBuf> {
    render(
        &dir.join(LOSS_PLOT_FILE),
        Curves {
            title: "Cross-entropy loss",
            y_desc: "Loss",
            train: &history.train_loss,
            val: &history.val_loss,
            test: history.test_loss,
        },
    )
}

pub fn plot_rouge_curves(dir: &Path, history: &TrainingHistory) -> Result<PathBuf> {
    render(
        &dir.join(ROUGE_PLOT_FILE),
        Curves {
            title: "ROUGE-L F-measure",
            y_desc: "ROUGE-L",
            train: &history.train_rouge,
            val: &history.val_rouge,
            test: history.test_rouge,
        },
    )
}

fn render(path: &Path, curves: Curves<'_>) -> Result<PathBuf> {
    draw(path, &curves).map_err(|e| anyhow!("Cannot draw '{}': {}", path.display(), e))?;
    tracing::info!("Saved plot '{}'", path.display());
    Ok(path.to_path_buf())
}

/// Value range covering every finite point, padded by 5%
fn y_range(curves: &Curves<'_>) -> (f64, f64) {
    let (lo, hi) = curves
        .train
        .iter()
        .chain(curves.val)
        .copied()
        .chain(curves.test)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-3);
    (lo - pad, hi + pad)
}

fn draw(path: &Path, curves: &Curves<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let epochs = curves.train.len().max(curves.val.len());
    // A single epoch still gets a visible x span
    let x_max  = (epochs as f64).max(2.0);
    let (y_lo, y_hi) = y_range(curves);

    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if DRAW_TEXT {
        builder
            .caption(curves.title, ("sans-serif", 22))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(1f64..x_max, y_lo..y_hi)?;

    if DRAW_TEXT {
        chart
            .configure_mesh()
            .x_desc("Epoch")
            .y_desc(curves.y_desc)
            .draw()?;
    }

    let points = |series: &[f64]| -> Vec<(f64, f64)> {
        series.iter().enumerate().map(|(i, v)| ((i + 1) as f64, *v)).collect()
    };

    let train = chart.draw_series(LineSeries::new(points(curves.train), BLUE.stroke_width(2)))?;
    if DRAW_TEXT {
        train
            .label("train")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    }
    let val = chart.draw_series(LineSeries::new(points(curves.val), RED.stroke_width(2)))?;
    if DRAW_TEXT {
        val
            .label("validation")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    }

    if let Some(test) = curves.test {
        let line = chart.draw_series(DashedLineSeries::new(
            vec![(1.0, test), (x_max, test)],
            8,
            6,
            BLACK.stroke_width(1),
        ))?;
        if DRAW_TEXT {
            line
                .label(format!("test = {test:.4}"))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));
        }
    }

    if DRAW_TEXT {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_y_range_ignores_non_finite_values() {
        let curves = Curves {
            title: "t",
            y_desc: "y",
            train: &[2.0, f64::NAN],
            val: &[3.0],
            test: Some(1.0),
        };
        let (lo, hi) = y_range(&curves);
        assert!(lo < 1.0 && hi > 3.0);
        assert!(hi - lo < 2.5);
    }

    #[test]
    fn test_y_range_of_empty_series() {
        let curves = Curves { title: "t", y_desc: "y", train: &[], val: &[], test: None };
        assert_eq!(y_range(&curves), (0.0, 1.0));
    }

    #[test]
    fn test_curves_render_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let history = TrainingHistory {
            train_loss:  vec![4.0, 3.1],
            val_loss:    vec![4.2, 3.5],
            train_rouge: vec![0.10, 0.18],
            val_rouge:   vec![0.08, 0.15],
            test_loss:   Some(3.6),
            test_rouge:  Some(0.14),
            ..TrainingHistory::default()
        };

        let loss  = plot_loss_curves(dir.path(), &history).unwrap();
        let rouge = plot_rouge_curves(dir.path(), &history).unwrap();
        for path in [loss, rouge] {
            assert!(fs::metadata(&path).unwrap().len() > 0, "{}", path.display());
        }
    }
}
