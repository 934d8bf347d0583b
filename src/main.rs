// src/main.rs

//! Demo: paints a few frames through whatever surface the config selects.

use anyhow::Context;
use log::{info, warn};
use raw_display::{Colour, Display, Event, CONFIG};
use std::time::Duration;

/// Fills the visible area with a red/green gradient.
fn paint_gradient(display: &mut Display) {
    let info = display.info();
    let mut canvas = display.canvas();
    for y in 0..info.height {
        let green = (y * 256 / info.height) as u8;
        for x in 0..info.width {
            let red = (x * 256 / info.width) as u8;
            canvas.set_pixel(x as i32, y as i32, Colour::rgb(red, green, 0));
        }
    }
}

fn paint_frame(display: &mut Display, frame: u32) -> anyhow::Result<()> {
    let info = display.info();
    let (w, h) = (info.width as i32, info.height as i32);
    let background = CONFIG.demo.background;

    paint_gradient(display);

    // One glyph per frame, walking through printable ASCII.
    let ch = [b' ' + (frame % 95) as u8];
    display.fill_rectangle(0, 0, 7, 7, background);
    display
        .draw_string(0, 0, ch, Colour::GREEN)
        .context("Failed to draw frame glyph")?;

    let banner = format!("What is this? frame {frame}");
    display.fill_rectangle(0, 10, banner.len() as i32 * 8 - 1, 17, background);
    if let Err(e) = display.draw_string(0, 10, &banner, Colour::WHITE) {
        warn!("Banner skipped: {}", e);
    }

    let sweep = (frame as i32 * 7) % w.max(1);
    display.draw_line(0, h - 1, sweep, h / 2, Colour::YELLOW, 3);
    display.draw_rectangle(w / 8, h / 4, w / 8 + 120, h / 4 + 80, Colour::BLUE, 4);
    display.draw_circle(w / 2, h / 2, h / 6, Colour::WHITE, 8);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("raw display demo");
    let demo = &CONFIG.demo;

    let mut display = Display::init("Demo app", demo.width, demo.height)
        .context("Unable to open display")?;
    let info = display.info();
    info!(
        "Info: {}x{}@{} (stride={})",
        info.width, info.height, info.bpp, info.stride
    );

    'frames: for frame in 0..demo.frames {
        paint_frame(&mut display, frame)?;
        if let Some(path) = demo.snapshot_path.as_ref().filter(|_| frame + 1 == demo.frames) {
            display
                .save_frame(path)
                .with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
            info!("Snapshot written to {}", path.display());
        }
        display
            .flip()
            .with_context(|| format!("Failed to present frame {frame}"))?;

        for event in display.drain_events() {
            match event {
                Event::Quit => {
                    info!("Quit requested after frame {}", frame);
                    break 'frames;
                }
                Event::Unknown => {}
                other => info!("Event: {:?}", other),
            }
        }
        std::thread::sleep(Duration::from_millis(demo.frame_delay_ms));
    }

    display.shutdown();
    info!("Done.");
    Ok(())
}
