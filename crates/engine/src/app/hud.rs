use super::metrics::LoopRates;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const TEXT_SCALE: i32 = 3;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;
const PANEL_PADDING: i32 = 6 * TEXT_SCALE;
const PANEL_INSET_X: i32 = 4 * TEXT_SCALE;
const PANEL_INSET_Y: i32 = 3 * TEXT_SCALE;
const TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const OBJECTIVE_BORDER_COLOR: [u8; 4] = [214, 182, 96, 255];
const PERF_SECTION_LABEL: &str = "Perf";
const SCENE_SECTION_LABEL: &str = "Scene";

#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub rates: LoopRates,
    pub render_fps_cap: Option<u32>,
    pub entity_count: usize,
    pub visible_entity_count: usize,
    pub scene_lines: Vec<String>,
}

/// Draws the current objective centered along the top edge of the frame.
pub(crate) fn draw_objective_banner(frame: &mut [u8], width: u32, height: u32, text: &str) {
    if width == 0 || height == 0 || text.is_empty() {
        return;
    }

    let text_width = text.chars().count() as i32 * GLYPH_ADVANCE;
    let panel_width = text_width + PANEL_INSET_X * 2;
    let panel_height = GLYPH_HEIGHT * TEXT_SCALE + PANEL_INSET_Y * 2;
    let panel_left = (width as i32 - panel_width) / 2;
    let panel_top = PANEL_PADDING - PANEL_INSET_Y;
    draw_filled_rect(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        OBJECTIVE_BORDER_COLOR,
    );
    draw_text_clipped(
        frame,
        width,
        height,
        panel_left + PANEL_INSET_X,
        PANEL_PADDING,
        text,
        TEXT_PRIMARY_COLOR,
    );
}

/// Debug panel in the bottom-left corner.
pub(crate) fn draw_overlay(frame: &mut [u8], width: u32, height: u32, data: &OverlayData) {
    if width == 0 || height == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * GLYPH_ADVANCE + PANEL_INSET_X * 2;
    let panel_height = lines.len() as i32 * LINE_ADVANCE + PANEL_INSET_Y * 2;
    let panel_left = PANEL_PADDING - PANEL_INSET_X;
    let panel_top = height as i32 - PANEL_PADDING - panel_height + PANEL_INSET_Y;
    draw_filled_rect(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        PANEL_BORDER_COLOR,
    );

    let mut y = panel_top + PANEL_INSET_Y;
    for line in lines {
        let color = overlay_line_color(&line);
        draw_text_clipped(frame, width, height, PANEL_PADDING, y, &line, color);
        y += LINE_ADVANCE;
    }
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(data.rates.fps, data.render_fps_cap),
        format!("TPS: {:.0}", data.rates.tps),
        String::new(),
        SCENE_SECTION_LABEL.to_string(),
        format!(
            "Entities: {} ({} shown)",
            data.entity_count, data.visible_entity_count
        ),
    ];
    lines.extend(data.scene_lines.iter().cloned());
    lines
}

fn overlay_line_color(line: &str) -> [u8; 4] {
    if matches!(line, PERF_SECTION_LABEL | SCENE_SECTION_LABEL) {
        TEXT_DIM_COLOR
    } else {
        TEXT_PRIMARY_COLOR
    }
}

fn format_fps_line(fps: f32, cap: Option<u32>) -> String {
    match cap {
        Some(cap) => format!("FPS: {fps:.0} / {cap}"),
        None => format!("FPS: {fps:.0} (uncapped)"),
    }
}

fn draw_text_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    for ch in text.chars() {
        let glyph = glyph_for(ch).unwrap_or(SPACE_GLYPH);
        draw_glyph_clipped(frame, width, height, x, y, glyph, color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    glyph: Glyph,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }

    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            draw_filled_rect(
                frame,
                width,
                height,
                x + col * TEXT_SCALE,
                glyph_y,
                TEXT_SCALE,
                TEXT_SCALE,
                color,
            );
        }
    }
}

pub(crate) fn write_pixel_rgba(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }

    let blended = blend_over(&frame[byte_offset..end], color);
    frame[byte_offset..end].copy_from_slice(&blended);
}

fn blend_over(dst: &[u8], src: [u8; 4]) -> [u8; 4] {
    let alpha = src[3] as u32;
    if alpha == 255 {
        return src;
    }
    let inv = 255 - alpha;
    let mix = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * inv) / 255) as u8;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), 255]
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    let width_usize = width as usize;
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba(frame, width_usize, px as usize, py as usize, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    draw_filled_rect(frame, width, height, x, y, rect_width, 1, color);
    draw_filled_rect(
        frame,
        width,
        height,
        x,
        y + rect_height - 1,
        rect_width,
        1,
        color,
    );
    draw_filled_rect(frame, width, height, x, y, 1, rect_height, color);
    draw_filled_rect(
        frame,
        width,
        height,
        x + rect_width - 1,
        y,
        1,
        rect_height,
        color,
    );
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    rows: [u8; GLYPH_HEIGHT as usize],
}

const SPACE_GLYPH: Glyph = Glyph {
    rows: [0, 0, 0, 0, 0],
};

const fn glyph(rows: [u8; GLYPH_HEIGHT as usize]) -> Glyph {
    Glyph { rows }
}

/// 3x5 caps-only font. Lowercase letters render as their uppercase glyph.
fn glyph_for(ch: char) -> Option<Glyph> {
    let glyph = match ch.to_ascii_uppercase() {
        ' ' => SPACE_GLYPH,
        '!' => glyph([0b010, 0b010, 0b010, 0b000, 0b010]),
        '\'' => glyph([0b010, 0b010, 0b000, 0b000, 0b000]),
        '(' => glyph([0b001, 0b010, 0b010, 0b010, 0b001]),
        ')' => glyph([0b100, 0b010, 0b010, 0b010, 0b100]),
        '+' => glyph([0b000, 0b010, 0b111, 0b010, 0b000]),
        ',' => glyph([0b000, 0b000, 0b000, 0b010, 0b100]),
        '-' => glyph([0b000, 0b000, 0b111, 0b000, 0b000]),
        '.' => glyph([0b000, 0b000, 0b000, 0b000, 0b010]),
        '/' => glyph([0b001, 0b001, 0b010, 0b100, 0b100]),
        ':' => glyph([0b000, 0b010, 0b000, 0b010, 0b000]),
        '=' => glyph([0b000, 0b111, 0b000, 0b111, 0b000]),
        '>' => glyph([0b100, 0b010, 0b001, 0b010, 0b100]),
        '?' => glyph([0b111, 0b001, 0b011, 0b000, 0b010]),
        '[' => glyph([0b110, 0b100, 0b100, 0b100, 0b110]),
        ']' => glyph([0b011, 0b001, 0b001, 0b001, 0b011]),
        '|' => glyph([0b010, 0b010, 0b010, 0b010, 0b010]),
        '0' => glyph([0b111, 0b101, 0b101, 0b101, 0b111]),
        '1' => glyph([0b010, 0b110, 0b010, 0b010, 0b111]),
        '2' => glyph([0b111, 0b001, 0b111, 0b100, 0b111]),
        '3' => glyph([0b111, 0b001, 0b111, 0b001, 0b111]),
        '4' => glyph([0b101, 0b101, 0b111, 0b001, 0b001]),
        '5' => glyph([0b111, 0b100, 0b111, 0b001, 0b111]),
        '6' => glyph([0b111, 0b100, 0b111, 0b101, 0b111]),
        '7' => glyph([0b111, 0b001, 0b010, 0b010, 0b010]),
        '8' => glyph([0b111, 0b101, 0b111, 0b101, 0b111]),
        '9' => glyph([0b111, 0b101, 0b111, 0b001, 0b111]),
        'A' => glyph([0b010, 0b101, 0b111, 0b101, 0b101]),
        'B' => glyph([0b110, 0b101, 0b110, 0b101, 0b110]),
        'C' => glyph([0b111, 0b100, 0b100, 0b100, 0b111]),
        'D' => glyph([0b110, 0b101, 0b101, 0b101, 0b110]),
        'E' => glyph([0b111, 0b100, 0b110, 0b100, 0b111]),
        'F' => glyph([0b111, 0b100, 0b110, 0b100, 0b100]),
        'G' => glyph([0b111, 0b100, 0b101, 0b101, 0b111]),
        'H' => glyph([0b101, 0b101, 0b111, 0b101, 0b101]),
        'I' => glyph([0b111, 0b010, 0b010, 0b010, 0b111]),
        'J' => glyph([0b111, 0b001, 0b001, 0b101, 0b111]),
        'K' => glyph([0b101, 0b101, 0b110, 0b101, 0b101]),
        'L' => glyph([0b100, 0b100, 0b100, 0b100, 0b111]),
        'M' => glyph([0b101, 0b111, 0b111, 0b101, 0b101]),
        'N' => glyph([0b101, 0b111, 0b111, 0b111, 0b101]),
        'O' => glyph([0b111, 0b101, 0b101, 0b101, 0b111]),
        'P' => glyph([0b110, 0b101, 0b110, 0b100, 0b100]),
        'Q' => glyph([0b111, 0b101, 0b101, 0b111, 0b001]),
        'R' => glyph([0b110, 0b101, 0b110, 0b101, 0b101]),
        'S' => glyph([0b111, 0b100, 0b111, 0b001, 0b111]),
        'T' => glyph([0b111, 0b010, 0b010, 0b010, 0b010]),
        'U' => glyph([0b101, 0b101, 0b101, 0b101, 0b111]),
        'V' => glyph([0b101, 0b101, 0b101, 0b101, 0b010]),
        'W' => glyph([0b101, 0b101, 0b111, 0b111, 0b101]),
        'X' => glyph([0b101, 0b101, 0b010, 0b101, 0b101]),
        'Y' => glyph([0b101, 0b101, 0b010, 0b010, 0b010]),
        'Z' => glyph([0b111, 0b001, 0b010, 0b100, 0b111]),
        _ => return None,
    };
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_pixels(frame: &[u8]) -> usize {
        frame
            .chunks_exact(4)
            .filter(|pixel| pixel.iter().any(|byte| *byte != 0))
            .count()
    }

    #[test]
    fn objective_strings_have_glyphs_for_every_character() {
        let samples = [
            "Task 1: Find the Ancient Shrine (Stone Pillar)",
            "Task 2: Collect the Sacred Crystal (Blue Crystal)",
            "Task 3: Deliver the Crystal to the Village Elder",
            "All tasks complete! The village thanks you.",
        ];
        for sample in samples {
            for ch in sample.chars() {
                assert!(glyph_for(ch).is_some(), "missing glyph for '{ch}'");
            }
        }
    }

    #[test]
    fn lowercase_uses_uppercase_glyph() {
        let lower = glyph_for('q').expect("q");
        let upper = glyph_for('Q').expect("Q");
        assert_eq!(lower.rows, upper.rows);
    }

    #[test]
    fn unknown_character_is_safe_and_draws_like_space() {
        assert!(glyph_for('\u{1f642}').is_none());
        let mut frame = vec![0u8; 16 * 16 * 4];
        draw_text_clipped(&mut frame, 16, 16, 0, 0, "\u{1f642}", TEXT_PRIMARY_COLOR);
        assert_eq!(lit_pixels(&frame), 0);
    }

    #[test]
    fn clipped_text_beyond_bounds_is_safe() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_text_clipped(&mut frame, 8, 8, -2, -2, "FPS", TEXT_PRIMARY_COLOR);
        assert_eq!(frame.len(), 8 * 8 * 4);

        let mut untouched = vec![0u8; 8 * 8 * 4];
        draw_text_clipped(&mut untouched, 8, 8, 64, 64, "TPS", TEXT_PRIMARY_COLOR);
        assert_eq!(lit_pixels(&untouched), 0);
    }

    #[test]
    fn tiny_viewports_never_panic_or_write_oob() {
        let mut frame_1x1 = vec![0u8; 4];
        draw_objective_banner(&mut frame_1x1, 1, 1, "Task 1");
        draw_overlay(
            &mut frame_1x1,
            1,
            1,
            &OverlayData {
                rates: LoopRates::default(),
                render_fps_cap: None,
                entity_count: 0,
                visible_entity_count: 0,
                scene_lines: Vec::new(),
            },
        );

        let mut empty = vec![];
        draw_objective_banner(&mut empty, 0, 8, "Task 1");
        draw_objective_banner(&mut empty, 8, 0, "Task 1");
    }

    #[test]
    fn objective_banner_writes_pixels_only_when_text_present() {
        let mut frame = vec![0u8; 320 * 64 * 4];
        draw_objective_banner(&mut frame, 320, 64, "");
        assert_eq!(lit_pixels(&frame), 0);

        draw_objective_banner(&mut frame, 320, 64, "Task 2");
        assert!(lit_pixels(&frame) > 0);
    }

    #[test]
    fn overlay_lines_include_scene_lines_after_builtins() {
        let data = OverlayData {
            rates: LoopRates {
                fps: 59.6,
                tps: 60.0,
            },
            render_fps_cap: Some(60),
            entity_count: 5,
            visible_entity_count: 4,
            scene_lines: vec!["task: 2/4".to_string()],
        };
        let lines = build_overlay_lines(&data);
        assert_eq!(lines[0], PERF_SECTION_LABEL);
        assert_eq!(lines[1], "FPS: 60 / 60");
        assert_eq!(lines[2], "TPS: 60");
        assert!(lines.contains(&"Entities: 5 (4 shown)".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("task: 2/4"));
    }

    #[test]
    fn fps_line_names_the_render_cap() {
        assert_eq!(format_fps_line(118.4, Some(120)), "FPS: 118 / 120");
        assert_eq!(format_fps_line(431.0, None), "FPS: 431 (uncapped)");
        for line in [format_fps_line(0.0, Some(1)), format_fps_line(0.0, None)] {
            assert!(line.chars().all(|ch| glyph_for(ch).is_some()), "{line}");
        }
    }

    #[test]
    fn translucent_pixels_blend_over_destination() {
        let blended = blend_over(&[200, 100, 0, 255], [0, 0, 0, 0]);
        assert_eq!(blended, [200, 100, 0, 255]);
        let opaque = blend_over(&[200, 100, 0, 255], [1, 2, 3, 255]);
        assert_eq!(opaque, [1, 2, 3, 255]);
    }

    #[test]
    fn layout_metrics_follow_text_scale() {
        assert_eq!(GLYPH_ADVANCE, 12);
        assert_eq!(LINE_ADVANCE, 21);
        assert_eq!(PANEL_PADDING, 18);
    }
}
