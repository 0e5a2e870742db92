use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::{
    AXIS_LABEL_GAP, PlotArea, TICK_LABEL_GAP, label_text_style, tick_text_style,
};
use crate::primitives::*;

/// Draw a box frame with ticks, tick labels and axis labels.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let frame_color = Color::rgb(0, 0, 0);
    let lw = config.axes.line_width;
    let tick_style_line = LineStyle::solid(frame_color, lw);
    let minor_tick_style = LineStyle::solid(frame_color, lw * 0.75);

    let inward = config.axes.tick_direction == "in";
    let tl = config.axes.tick_length;
    let mtl = config.axes.minor_tick_length;
    // Outward ticks push the labels away from the frame.
    let label_offset = if inward { 0.0 } else { tl };

    draw_frame(canvas, area, lw);

    let tick_label_style = TextStyle {
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..tick_text_style(config)
    };

    // --- X axis ticks ---
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        let dir = if inward { -1.0 } else { 1.0 };
        canvas.line(px, area.bottom(), px, area.bottom() + dir * tl, &tick_style_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top - dir * tl, &tick_style_line);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            let label_y = area.bottom() + label_offset + TICK_LABEL_GAP;
            canvas.text(px, label_y, label, &tick_label_style);
        }
    }

    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        let dir = if inward { -1.0 } else { 1.0 };
        canvas.line(px, area.bottom(), px, area.bottom() + dir * mtl, &minor_tick_style);
    }

    // --- Y axis ticks ---
    let y_tick_label_style = TextStyle {
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..tick_text_style(config)
    };

    let mut max_y_label_w = 0.0_f64;
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        let dir = if inward { 1.0 } else { -1.0 };
        canvas.line(area.left, py, area.left + dir * tl, py, &tick_style_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - dir * tl, py, &tick_style_line);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            let label_x = area.left - label_offset - TICK_LABEL_GAP;
            canvas.text(label_x, py, label, &y_tick_label_style);
            max_y_label_w = max_y_label_w.max(canvas.measure_text(label, &y_tick_label_style).width);
        }
    }

    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        let dir = if inward { 1.0 } else { -1.0 };
        canvas.line(area.left, py, area.left + dir * mtl, py, &minor_tick_style);
    }

    // --- Axis labels ---
    let label_style = label_text_style(config);

    if !x_axis.label.is_empty() {
        let tick_h = canvas.measure_text("0", &tick_label_style).height;
        let style = TextStyle { anchor: TextAnchor::Middle, baseline: TextBaseline::Hanging, ..label_style.clone() };
        let label_y = area.bottom() + label_offset + TICK_LABEL_GAP + tick_h + AXIS_LABEL_GAP;
        canvas.text(area.left + area.width / 2.0, label_y, &x_axis.label, &style);
    }

    if !y_axis.label.is_empty() {
        let label_h = canvas.measure_text(&y_axis.label, &label_style).height;
        let style = TextStyle { anchor: TextAnchor::Middle, baseline: TextBaseline::Central, ..label_style };
        let label_x =
            area.left - label_offset - TICK_LABEL_GAP - max_y_label_w - AXIS_LABEL_GAP - label_h / 2.0;
        let label_y = area.top + area.height / 2.0;
        canvas.text_rotated(label_x, label_y, &y_axis.label, &style, -90.0);
    }
}

/// Frame only, no ticks.
pub fn draw_frame(canvas: &mut Canvas, area: &PlotArea, width: f64) {
    let style = LineStyle::solid(Color::rgb(0, 0, 0), width);
    canvas.line(area.left, area.top, area.right(), area.top, &style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &style);
}
