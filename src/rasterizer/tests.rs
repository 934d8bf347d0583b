use super::*;
use test_log::test;

const W: usize = 32;
const H: usize = 24;

fn buffer(_width: usize, height: usize, stride: usize) -> Vec<u8> {
    vec![0u8; stride * height]
}

/// Coordinates of every pixel that is not zero.
fn lit(canvas: &Canvas<'_>) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            if canvas.get_pixel(x, y) != Some(Colour(0)) {
                out.push((x, y));
            }
        }
    }
    out
}

#[test]
fn it_should_write_and_read_back_one_pixel() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.set_pixel(3, 5, Colour(0x1234_5678));
    assert_eq!(canvas.get_pixel(3, 5), Some(Colour(0x1234_5678)));
    assert_eq!(lit(&canvas), vec![(3, 5)]);
    let at = 5 * W * 4 + 3 * 4;
    assert_eq!(&buf[at..at + 4], &0x1234_5678u32.to_ne_bytes());
}

#[test]
fn it_should_ignore_pixels_outside_the_canvas() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    for (x, y) in [
        (-1, 0),
        (0, -1),
        (W as i32, 0),
        (0, H as i32),
        (i32::MIN, i32::MIN),
        (i32::MAX, i32::MAX),
    ] {
        canvas.set_pixel(x, y, Colour::WHITE);
        assert_eq!(canvas.get_pixel(x, y), None);
    }
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn it_should_leave_row_padding_untouched() {
    let stride = W * 4 + 16;
    let mut buf = buffer(W, H, stride);
    let mut canvas = Canvas::new(&mut buf, W, H, stride).unwrap();
    canvas.clear(Colour::WHITE);
    canvas.fill_rectangle(-10, -10, 1000, 1000, Colour::RED);
    for y in 0..H {
        let padding = &buf[y * stride + W * 4..(y + 1) * stride];
        assert!(padding.iter().all(|&b| b == 0), "row {y} padding written");
    }
}

#[test]
fn it_should_reject_buffers_too_small_for_the_geometry() {
    let mut buf = vec![0u8; 10];
    assert!(matches!(
        Canvas::new(&mut buf, 4, 4, 16),
        Err(DisplayError::InvalidArgument(_))
    ));
    let mut buf = vec![0u8; 64];
    assert!(matches!(
        Canvas::new(&mut buf, 4, 4, 8),
        Err(DisplayError::InvalidArgument(_))
    ));
}

#[test]
fn it_should_fill_exactly_the_closed_rectangle() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.fill_rectangle(2, 3, 5, 4, Colour::GREEN);
    let px = lit(&canvas);
    assert_eq!(px.len(), 4 * 2);
    assert!(px
        .iter()
        .all(|&(x, y)| (2..=5).contains(&x) && (3..=4).contains(&y)));
}

#[test]
fn it_should_normalise_swapped_corners() {
    let mut a = buffer(W, H, W * 4);
    let mut b = buffer(W, H, W * 4);
    Canvas::new(&mut a, W, H, W * 4)
        .unwrap()
        .fill_rectangle(2, 3, 9, 7, Colour::BLUE);
    Canvas::new(&mut b, W, H, W * 4)
        .unwrap()
        .fill_rectangle(9, 7, 2, 3, Colour::BLUE);
    assert_eq!(a, b);
}

#[test]
fn it_should_clamp_partially_visible_rectangles() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.fill_rectangle(-5, -5, 1, 1, Colour::RED);
    assert_eq!(lit(&canvas), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
}

#[test]
fn it_should_skip_fully_offscreen_rectangles() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.fill_rectangle(-20, 0, -1, 5, Colour::RED);
    canvas.fill_rectangle(W as i32, 0, W as i32 + 10, 5, Colour::RED);
    canvas.fill_rectangle(0, -9, 5, -2, Colour::RED);
    canvas.fill_rectangle(0, H as i32, 5, i32::MAX, Colour::RED);
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn it_should_outline_a_rectangle_with_the_border_width() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_rectangle(2, 2, 11, 9, Colour::WHITE, 2);
    // 10x8 outer, 6x4 hole
    assert_eq!(lit(&canvas).len(), 10 * 8 - 6 * 4);
    assert_eq!(canvas.get_pixel(3, 3), Some(Colour::WHITE));
    assert_eq!(canvas.get_pixel(4, 4), Some(Colour(0)));
    assert_eq!(canvas.get_pixel(9, 7), Some(Colour(0)));
    assert_eq!(canvas.get_pixel(10, 8), Some(Colour::WHITE));
}

#[test]
fn it_should_fill_or_skip_rectangles_by_border_width() {
    let mut filled = buffer(W, H, W * 4);
    let mut reference = buffer(W, H, W * 4);
    Canvas::new(&mut filled, W, H, W * 4)
        .unwrap()
        .draw_rectangle(1, 1, 6, 4, Colour::RED, -1);
    Canvas::new(&mut reference, W, H, W * 4)
        .unwrap()
        .fill_rectangle(1, 1, 6, 4, Colour::RED);
    assert_eq!(filled, reference);

    // Borders meeting in the middle also fill.
    let mut thick = buffer(W, H, W * 4);
    Canvas::new(&mut thick, W, H, W * 4)
        .unwrap()
        .draw_rectangle(1, 1, 6, 4, Colour::RED, 2);
    assert_eq!(thick, reference);

    let mut none = buffer(W, H, W * 4);
    Canvas::new(&mut none, W, H, W * 4)
        .unwrap()
        .draw_rectangle(1, 1, 6, 4, Colour::RED, 0);
    assert!(none.iter().all(|&b| b == 0));
}

#[test]
fn it_should_draw_a_one_pixel_horizontal_line_inclusive() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(2, 5, 9, 5, Colour::WHITE, 1);
    let px = lit(&canvas);
    assert_eq!(px, (2..=9).map(|x| (x, 5)).collect::<Vec<_>>());
}

#[test]
fn it_should_draw_the_same_pixels_in_either_direction() {
    let mut a = buffer(W, H, W * 4);
    let mut b = buffer(W, H, W * 4);
    Canvas::new(&mut a, W, H, W * 4)
        .unwrap()
        .draw_line(1, 1, 20, 1, Colour::WHITE, 1);
    Canvas::new(&mut b, W, H, W * 4)
        .unwrap()
        .draw_line(20, 1, 1, 1, Colour::WHITE, 1);
    assert_eq!(a, b);
}

#[test]
fn it_should_thicken_a_vertical_line_sideways() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(5, 0, 5, 10, Colour::WHITE, 5);
    let px = lit(&canvas);
    // With no x movement the step direction is -1, so the extra column is x = 4.
    assert_eq!(px.len(), 2 * 11);
    assert!(px
        .iter()
        .all(|&(x, y)| (x == 4 || x == 5) && (0..=10).contains(&y)));
}

#[test]
fn it_should_keep_a_width_3_vertical_line_on_one_column() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(5, 0, 5, 10, Colour::WHITE, 3);
    let px = lit(&canvas);
    assert_eq!(px, (0..=10).map(|y| (5, y)).collect::<Vec<_>>());
}

#[test]
fn it_should_draw_a_single_pixel_for_a_zero_length_line() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(4, 4, 4, 4, Colour::RED, 1);
    assert_eq!(lit(&canvas), vec![(4, 4)]);
}

#[test]
fn it_should_connect_the_endpoints_of_a_diagonal() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(0, 0, 10, 10, Colour::RED, 1);
    assert_eq!(lit(&canvas), (0..=10).map(|i| (i, i)).collect::<Vec<_>>());
}

#[test]
fn it_should_draw_one_pixel_per_column_for_a_thin_shallow_line() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(0, 0, 10, 3, Colour::RED, 1);
    assert_eq!(
        lit(&canvas),
        vec![
            (0, 0),
            (1, 0),
            (2, 0),
            (3, 1),
            (4, 1),
            (5, 1),
            (6, 1),
            (7, 2),
            (8, 2),
            (9, 2),
            (10, 3),
        ]
    );
}

#[test]
fn it_should_truncate_the_half_width_of_even_widths() {
    let mut thin = buffer(W, H, W * 4);
    let mut even = buffer(W, H, W * 4);
    Canvas::new(&mut thin, W, H, W * 4)
        .unwrap()
        .draw_line(0, 0, 10, 3, Colour::RED, 1);
    Canvas::new(&mut even, W, H, W * 4)
        .unwrap()
        .draw_line(0, 0, 10, 3, Colour::RED, 2);
    assert_eq!(thin, even);
}

#[test]
fn it_should_clip_lines_crossing_the_edges() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_line(-100, -50, 200, 120, Colour::RED, 5);
    canvas.draw_line(-1000, 10, -500, 10, Colour::RED, 1);
    assert!(!lit(&canvas).is_empty());
}

#[test]
fn it_should_draw_a_solid_disc_when_the_border_reaches_the_centre() {
    let (w, h) = (41, 41);
    let mut buf = buffer(w, h, w * 4);
    let mut canvas = Canvas::new(&mut buf, w, h, w * 4).unwrap();
    canvas.draw_circle(20, 20, 10, Colour::WHITE, 11);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let d2 = (x - 20).pow(2) + (y - 20).pow(2);
            let set = canvas.get_pixel(x, y) == Some(Colour::WHITE);
            if d2 <= 9 * 9 {
                assert!(set, "({x}, {y}) inside the disc is empty");
            }
            if d2 > 11 * 11 {
                assert!(!set, "({x}, {y}) outside the disc is set");
            }
        }
    }
}

#[test]
fn it_should_treat_any_border_past_the_radius_as_a_disc() {
    let draw = |border: i32| {
        let mut buf = buffer(41, 41, 41 * 4);
        Canvas::new(&mut buf, 41, 41, 41 * 4)
            .unwrap()
            .draw_circle(20, 20, 10, Colour::WHITE, border);
        buf
    };
    let disc = draw(11);
    assert_eq!(draw(12), disc);
    assert_eq!(draw(1000), disc);
    // One short of the centre still leaves it empty.
    assert_ne!(draw(10), disc);
}

#[test]
fn it_should_leave_the_inside_of_a_thin_ring_empty() {
    let (w, h) = (41, 41);
    let mut buf = buffer(w, h, w * 4);
    let mut canvas = Canvas::new(&mut buf, w, h, w * 4).unwrap();
    canvas.draw_circle(20, 20, 10, Colour::WHITE, 1);
    for (x, y) in [(30, 20), (10, 20), (20, 30), (20, 10)] {
        assert_eq!(canvas.get_pixel(x, y), Some(Colour::WHITE));
    }
    assert_eq!(canvas.get_pixel(20, 20), Some(Colour(0)));
    assert_eq!(canvas.get_pixel(25, 20), Some(Colour(0)));
}

#[test]
fn it_should_skip_negative_radii() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_circle(10, 10, -3, Colour::WHITE, 1);
    assert!(lit(&canvas).is_empty());
}

#[test]
fn it_should_clip_circles_at_the_edges() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_circle(0, 0, 50, Colour::WHITE, 60);
    assert_eq!(lit(&canvas).len(), W * H);
}

#[test]
fn it_should_draw_glyph_bits_only() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_string(0, 0, "A", Colour::WHITE).unwrap();
    let glyph = glyph_for(b'A').unwrap();
    for y in 0..H as i32 {
        for x in 0..W as i32 {
            let expected = x < 8 && y < 8 && glyph.is_set(x as usize, y as usize);
            let set = canvas.get_pixel(x, y) == Some(Colour::WHITE);
            assert_eq!(set, expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn it_should_keep_the_background_under_text() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.clear(Colour::BLUE);
    canvas.draw_string(0, 0, "A", Colour::WHITE).unwrap();
    let glyph = glyph_for(b'A').unwrap();
    let (x, y) = (0..8)
        .flat_map(|y| (0..8).map(move |x| (x, y)))
        .find(|&(x, y)| !glyph.is_set(x, y))
        .unwrap();
    assert_eq!(canvas.get_pixel(x as i32, y as i32), Some(Colour::BLUE));
}

#[test]
fn it_should_reject_text_placed_outside_the_canvas() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    for (x, y) in [(0, -1), (0, H as i32 - 8), (0, H as i32 - 4), (W as i32, 0)] {
        assert!(matches!(
            canvas.draw_string(x, y, "Hi", Colour::WHITE),
            Err(DisplayError::InvalidArgument(_))
        ));
    }
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn it_should_advance_over_non_ascii_bytes() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.draw_string(0, 0, b"\xffA", Colour::WHITE).unwrap();
    let px = lit(&canvas);
    assert!(!px.is_empty());
    assert!(px.iter().all(|&(x, _)| (8..16).contains(&x)));
}

#[test]
fn it_should_clip_text_running_off_either_side() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas
        .draw_string(-4, 0, "MMMMMMMMMM", Colour::WHITE)
        .unwrap();
    assert!(!lit(&canvas).is_empty());
}

#[test]
fn it_should_blit_rgb_triplets_as_opaque_colours() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    let rgb = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
    canvas.blit_rgb(W as i32 - 1, 0, &rgb, 2, 2).unwrap();
    assert_eq!(canvas.get_pixel(W as i32 - 1, 0), Some(Colour::rgb(1, 2, 3)));
    assert_eq!(canvas.get_pixel(W as i32 - 1, 1), Some(Colour::rgb(7, 8, 9)));
    assert_eq!(lit(&canvas).len(), 2);
}

#[test]
fn it_should_ignore_an_empty_rgb_image() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    canvas.blit_rgb(0, 0, &[], 0, 5).unwrap();
    canvas.blit_rgb(0, 0, &[], 5, 0).unwrap();
    assert!(lit(&canvas).is_empty());
}

#[test]
fn it_should_reject_short_rgb_data() {
    let mut buf = buffer(W, H, W * 4);
    let mut canvas = Canvas::new(&mut buf, W, H, W * 4).unwrap();
    assert!(matches!(
        canvas.blit_rgb(0, 0, &[0; 11], 2, 2),
        Err(DisplayError::InvalidArgument(_))
    ));
}
