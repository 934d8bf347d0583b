// src/display/events.rs
//! Closed event set handed to callers, and the translation from native events.
//!
//! Every coordinate leaving this module is in top-left-origin pixel space with
//! Y growing downward, whatever the backend's own convention.

use crate::display::surface::{NativeEvent, Origin};
use log::trace;

/// Which button a mouse event refers to. Wheel steps are reported as releases
/// of `ScrollUp` / `ScrollDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    /// Extra buttons, X11 numbering.
    Other(u8),
}

impl MouseButton {
    fn from_native(button: u8) -> Self {
        match button {
            1 => MouseButton::Left,
            2 => MouseButton::Middle,
            3 => MouseButton::Right,
            4 => MouseButton::ScrollUp,
            5 => MouseButton::ScrollDown,
            other => MouseButton::Other(other),
        }
    }

    pub fn is_scroll(self) -> bool {
        matches!(self, MouseButton::ScrollUp | MouseButton::ScrollDown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A native event with no counterpart here. It was still consumed.
    Unknown,
    Key { code: u32 },
    MouseDown { x: i32, y: i32, button: MouseButton },
    MouseUp { x: i32, y: i32, button: MouseButton },
    MouseMove { x: i32, y: i32 },
    /// The window manager or user asked for the surface to close.
    Quit,
}

/// Maps a native position into top-left pixel space.
fn to_pixel(x: f64, y: f64, height: usize, origin: Origin) -> (i32, i32) {
    let y = match origin {
        Origin::TopLeft => y,
        Origin::BottomLeft => height as f64 - y,
    };
    // `as` saturates on out-of-range floats, NaN becomes 0.
    (x.floor() as i32, y.floor() as i32)
}

/// Translates one native event. `Expose` is answered by the caller (it needs
/// the frame ring) and comes out of here as `Unknown`.
pub fn normalize(native: &NativeEvent, height: usize, origin: Origin) -> Event {
    let event = match *native {
        NativeEvent::Key { code } => Event::Key { code },
        NativeEvent::ButtonPress { x, y, button } => {
            let (x, y) = to_pixel(x, y, height, origin);
            match MouseButton::from_native(button) {
                _ if y < 0 => Event::Unknown,
                // X11 reports one press/release pair per wheel step; the press
                // carries the step.
                b if b.is_scroll() => Event::MouseUp { x, y, button: b },
                b => Event::MouseDown { x, y, button: b },
            }
        }
        NativeEvent::ButtonRelease { x, y, button } => {
            let (x, y) = to_pixel(x, y, height, origin);
            match MouseButton::from_native(button) {
                _ if y < 0 => Event::Unknown,
                b if b.is_scroll() => Event::Unknown,
                b => Event::MouseUp { x, y, button: b },
            }
        }
        NativeEvent::Scroll { x, y, delta_y } => {
            let (x, y) = to_pixel(x, y, height, origin);
            if y < 0 {
                Event::Unknown
            } else {
                let button = if delta_y < 0.0 {
                    MouseButton::ScrollUp
                } else {
                    MouseButton::ScrollDown
                };
                Event::MouseUp { x, y, button }
            }
        }
        NativeEvent::Motion { x, y } => {
            let (x, y) = to_pixel(x, y, height, origin);
            Event::MouseMove { x, y }
        }
        NativeEvent::CloseRequested => Event::Quit,
        NativeEvent::Expose | NativeEvent::Other(_) => Event::Unknown,
    };
    trace!("EventNormalizer: {:?} -> {:?}", native, event);
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn it_should_pass_top_left_coordinates_through() {
        let e = normalize(
            &NativeEvent::ButtonPress {
                x: 10.0,
                y: 20.0,
                button: 1,
            },
            600,
            Origin::TopLeft,
        );
        assert_eq!(
            e,
            Event::MouseDown {
                x: 10,
                y: 20,
                button: MouseButton::Left
            }
        );
    }

    #[test]
    fn it_should_flip_bottom_left_coordinates() {
        let e = normalize(
            &NativeEvent::ButtonRelease {
                x: 10.5,
                y: 100.25,
                button: 1,
            },
            600,
            Origin::BottomLeft,
        );
        assert_eq!(
            e,
            Event::MouseUp {
                x: 10,
                y: 499,
                button: MouseButton::Left
            }
        );
        let e = normalize(&NativeEvent::Motion { x: 0.0, y: 600.0 }, 600, Origin::BottomLeft);
        assert_eq!(e, Event::MouseMove { x: 0, y: 0 });
    }

    #[test]
    fn it_should_drop_clicks_above_the_surface() {
        // Title bar on a bottom-left backend: native y beyond the height.
        let e = normalize(
            &NativeEvent::ButtonPress {
                x: 5.0,
                y: 610.0,
                button: 1,
            },
            600,
            Origin::BottomLeft,
        );
        assert_eq!(e, Event::Unknown);
    }

    #[test]
    fn it_should_report_wheel_steps_as_scroll_releases() {
        let up = normalize(
            &NativeEvent::ButtonPress {
                x: 1.0,
                y: 2.0,
                button: 4,
            },
            600,
            Origin::TopLeft,
        );
        assert_eq!(
            up,
            Event::MouseUp {
                x: 1,
                y: 2,
                button: MouseButton::ScrollUp
            }
        );
        let release = normalize(
            &NativeEvent::ButtonRelease {
                x: 1.0,
                y: 2.0,
                button: 4,
            },
            600,
            Origin::TopLeft,
        );
        assert_eq!(release, Event::Unknown);

        let down = normalize(
            &NativeEvent::Scroll {
                x: 3.0,
                y: 4.0,
                delta_y: 1.5,
            },
            600,
            Origin::TopLeft,
        );
        assert_eq!(
            down,
            Event::MouseUp {
                x: 3,
                y: 4,
                button: MouseButton::ScrollDown
            }
        );
        let up = normalize(
            &NativeEvent::Scroll {
                x: 3.0,
                y: 4.0,
                delta_y: -0.5,
            },
            600,
            Origin::TopLeft,
        );
        assert!(matches!(
            up,
            Event::MouseUp {
                button: MouseButton::ScrollUp,
                ..
            }
        ));
    }

    #[test]
    fn it_should_turn_close_requests_into_quit() {
        assert_eq!(
            normalize(&NativeEvent::CloseRequested, 600, Origin::TopLeft),
            Event::Quit
        );
    }

    #[test]
    fn it_should_map_unrecognised_events_to_unknown() {
        assert_eq!(
            normalize(&NativeEvent::Other(33), 600, Origin::TopLeft),
            Event::Unknown
        );
        assert_eq!(
            normalize(&NativeEvent::Expose, 600, Origin::TopLeft),
            Event::Unknown
        );
        assert_eq!(
            normalize(&NativeEvent::Key { code: 38 }, 600, Origin::TopLeft),
            Event::Key { code: 38 }
        );
    }

    #[test]
    fn it_should_keep_extra_buttons() {
        let e = normalize(
            &NativeEvent::ButtonPress {
                x: 0.0,
                y: 0.0,
                button: 8,
            },
            600,
            Origin::TopLeft,
        );
        assert_eq!(
            e,
            Event::MouseDown {
                x: 0,
                y: 0,
                button: MouseButton::Other(8)
            }
        );
    }
}
