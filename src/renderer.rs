//! # Sky Graph Rendering
//!
//! This module draws a [`Frame`] either to any monochrome `embedded-graphics`
//! target or to an ASCII grid for terminal development mode.
//!
//! Screen layout, top to bottom:
//! - sky graph (sun path, moon path, horizon, live markers)
//! - time in a large font
//! - date
//! - info line

use crate::display::SunImage;
use crate::engine::Frame;
use crate::interpolate::{GraphGeometry, PathSegment};
use crate::lunar::MoonImage;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
    text::{Alignment, Text},
};

const SUN_DIAMETER: u32 = 13;
const MOON_DIAMETER: u32 = 11;
const TIME_BLOCK: i32 = 24;
const LINE_HEIGHT: i32 = 14;

fn to_point(frame: &Frame, hour: f64, altitude: f64) -> Point {
    let (x, y) = frame.to_screen(hour, altitude);
    Point::new(x.round() as i32, y.round() as i32)
}

fn draw_path<S>(display: &mut S, frame: &Frame, path: &[PathSegment], width: u32)
where
    S: DrawTarget<Color = BinaryColor, Error = core::convert::Infallible>,
{
    let style = PrimitiveStyle::with_stroke(BinaryColor::On, width);
    for seg in path {
        Line::new(
            to_point(frame, seg.start_hour, seg.start_alt),
            to_point(frame, seg.end_hour, seg.end_alt),
        )
        .into_styled(style)
        .draw(display)
        .ok();
    }
}

/// Render a frame to a monochrome display.
pub fn draw_sky<S>(frame: &Frame, display: &mut S)
where
    S: DrawTarget<Color = BinaryColor, Error = core::convert::Infallible>,
{
    let width = frame.geometry.width.round() as i32;
    let graph_bottom = frame.geometry.height.round() as i32;

    // Paths first so the markers sit on top
    draw_path(display, frame, &frame.sun_path, 1);
    draw_path(display, frame, &frame.moon_path, 1);

    // Horizon
    let horizon = to_point(frame, 0.0, 0.0).y;
    Line::new(Point::new(0, horizon), Point::new(width - 1, horizon))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)
        .ok();

    // Sun: filled when risen, ring when on the rim
    let sun_center = to_point(frame, frame.sun_marker.hour, frame.sun_marker.draw_altitude);
    let sun_style = match frame.sun_image {
        SunImage::Risen => PrimitiveStyle::with_fill(BinaryColor::On),
        SunImage::Rim => PrimitiveStyle::with_stroke(BinaryColor::On, 1),
    };
    Circle::with_center(sun_center, SUN_DIAMETER)
        .into_styled(sun_style)
        .draw(display)
        .ok();

    // Moon: filled around full, ring otherwise
    let moon_center = to_point(frame, frame.moon_marker.hour, frame.moon_marker.draw_altitude);
    let moon_style = match frame.moon_image {
        MoonImage::WaxingGibbous | MoonImage::Full | MoonImage::WaningGibbous => {
            PrimitiveStyle::with_fill(BinaryColor::On)
        }
        _ => PrimitiveStyle::with_stroke(BinaryColor::On, 1),
    };
    Circle::with_center(moon_center, MOON_DIAMETER)
        .into_styled(moon_style)
        .draw(display)
        .ok();

    // Text block under the graph
    let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let center_x = width / 2;
    let mut y = graph_bottom + TIME_BLOCK;

    Text::with_alignment(&frame.time_text, Point::new(center_x, y), large, Alignment::Center)
        .draw(display)
        .ok();
    y += LINE_HEIGHT;
    Text::with_alignment(&frame.date_text, Point::new(center_x, y), small, Alignment::Center)
        .draw(display)
        .ok();
    y += LINE_HEIGHT;
    Text::with_alignment(&frame.info.text(), Point::new(center_x, y), small, Alignment::Center)
        .draw(display)
        .ok();
}

const ASCII_COLS: usize = 49; // two columns per hour plus the closing midnight
const ASCII_ROWS: usize = 16;

/// Render a frame as text.
pub fn render_ascii(frame: &Frame) -> String {
    let geometry = GraphGeometry::new((ASCII_COLS - 1) as f64, (ASCII_ROWS - 1) as f64);
    let cell = |hour: f64, alt: f64| -> Option<(usize, usize)> {
        let (x, y) = geometry.to_screen(hour, alt, frame.latitude);
        let (col, row) = (x.round(), y.round());
        if col < 0.0 || row < 0.0 || col >= ASCII_COLS as f64 || row >= ASCII_ROWS as f64 {
            None
        } else {
            Some((col as usize, row as usize))
        }
    };

    let mut grid = vec![vec![' '; ASCII_COLS]; ASCII_ROWS];

    if let Some((_, row)) = cell(0.0, 0.0) {
        for c in grid[row].iter_mut() {
            *c = '─';
        }
    }

    let mut plot = |path: &[PathSegment], mark: char| {
        for seg in path {
            for step in 0..=4 {
                let f = step as f64 / 4.0;
                let hour = seg.start_hour + (seg.end_hour - seg.start_hour) * f;
                let alt = seg.start_alt + (seg.end_alt - seg.start_alt) * f;
                if let Some((col, row)) = cell(hour, alt) {
                    grid[row][col] = mark;
                }
            }
        }
    };
    plot(&frame.sun_path, '*');
    plot(&frame.moon_path, '.');

    let sun_mark = match frame.sun_image {
        SunImage::Risen => '☼',
        SunImage::Rim => 'o',
    };
    if let Some((col, row)) = cell(frame.sun_marker.hour, frame.sun_marker.draw_altitude) {
        grid[row][col] = sun_mark;
    }
    if let Some((col, row)) = cell(frame.moon_marker.hour, frame.moon_marker.draw_altitude) {
        grid[row][col] = frame.moon_image.glyph();
    }

    let mut out = String::new();
    for row in grid {
        out.extend(row);
        out.push('\n');
    }

    // Hour ticks every 6 hours
    let ticks: String = (0..ASCII_COLS)
        .map(|i| if i % 12 == 0 { '|' } else { ' ' })
        .collect();
    out.push_str(&ticks);
    out.push('\n');
    out.push_str(&format!("{:<12}{:<12}{:<12}{:<12}{}\n", "0h", "6h", "12h", "18h", "24h"));
    out.push('\n');
    out.push_str(&format!("{}\n{}\n{}\n", frame.time_text, frame.date_text, frame.info.text()));
    out
}

/// Render a frame to stdout.
pub fn draw_ascii(frame: &Frame) {
    print!("{}", render_ascii(frame));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{InfoLine, Reading};
    use crate::interpolate::Marker;

    fn test_frame() -> Frame {
        let sun_path = (6..18)
            .map(|h| PathSegment {
                start_hour: h as f64,
                start_alt: 30.0 - (h as f64 - 12.0).abs() * 5.0,
                end_hour: h as f64 + 1.0,
                end_alt: 30.0 - (h as f64 + 1.0 - 12.0).abs() * 5.0,
            })
            .collect();
        Frame {
            geometry: GraphGeometry::new(144.0, 67.0),
            latitude: 45.0,
            sun_path,
            moon_path: vec![PathSegment {
                start_hour: 20.5,
                start_alt: 5.0,
                end_hour: 21.5,
                end_alt: 12.0,
            }],
            sun_marker: Marker {
                hour: 12.5,
                altitude: 27.5,
                draw_altitude: 27.5,
            },
            moon_marker: Marker {
                hour: 3.25,
                altitude: -20.0,
                draw_altitude: -7.0,
            },
            sun_image: SunImage::Risen,
            moon_image: MoonImage::Full,
            time_text: "12:30".to_string(),
            date_text: "Tue, Jun  1".to_string(),
            info: InfoLine::Sun(Reading {
                altitude: 28,
                azimuth: 190,
            }),
        }
    }

    #[test]
    fn test_ascii_rendering() {
        let text = render_ascii(&test_frame());
        assert!(text.contains('*'), "sun path missing:\n{text}");
        assert!(text.contains('.'), "moon path missing:\n{text}");
        assert!(text.contains('☼'));
        assert!(text.contains('─'));
        assert!(text.contains("12:30"));
        assert!(text.contains("Sun [28:190]"));
    }

    #[test]
    fn test_ascii_hidden_info_line() {
        let mut frame = test_frame();
        frame.info = InfoLine::Hidden;
        frame.sun_image = SunImage::Rim;
        let text = render_ascii(&frame);
        assert!(!text.contains("Sun ["));
        assert!(text.contains('o'));
    }

    mod graphics_tests {
        use super::*;
        use embedded_graphics::mock_display::MockDisplay;

        fn mock() -> MockDisplay<BinaryColor> {
            let mut display = MockDisplay::<BinaryColor>::new();
            display.set_allow_out_of_bounds_drawing(true);
            display.set_allow_overdraw(true);
            display
        }

        #[test]
        fn test_sky_rendering() {
            let mut display = mock();
            draw_sky(&test_frame(), &mut display);
            assert!(!display.affected_area().is_zero_sized());
        }

        #[test]
        fn test_rim_sun_and_new_moon_render() {
            let mut frame = test_frame();
            frame.sun_image = SunImage::Rim;
            frame.moon_image = MoonImage::New;
            frame.sun_path.clear();
            frame.moon_path.clear();
            let mut display = mock();
            draw_sky(&frame, &mut display);
            // the horizon line alone still draws
            assert!(!display.affected_area().is_zero_sized());
        }
    }
}
