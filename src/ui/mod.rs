//! User interface subsystem - OLED display + physical buttons.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C, splash and main screens
//! - **Buttons**: 3 tactile switches with debouncing (UP, DOWN, SELECT)
//!
//! [`OledPresenter`] is the firmware implementation of the
//! [`Presenter`] seam: it caches the field text the state machine sets
//! and redraws whichever screen is visible.

pub mod buttons;
pub mod display;

use crate::config::{EMAIL_MAX, NAME_MAX, PHONE_MAX, STATUS_MAX};
use crate::state::{Presenter, Screen, TextField};
use self::display::Display;
use heapless::String;

pub struct OledPresenter<I2C> {
    display: Display<I2C>,
    visible: Screen,
    status: String<STATUS_MAX>,
    name: String<NAME_MAX>,
    email: String<EMAIL_MAX>,
    phone: String<PHONE_MAX>,
}

impl<I2C> OledPresenter<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Take over a freshly initialised display, showing the splash.
    pub fn new(mut display: Display<I2C>) -> Self {
        display::draw_splash(&mut display);
        Self {
            display,
            visible: Screen::Splash,
            status: String::new(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }

    fn redraw(&mut self) {
        match self.visible {
            Screen::Splash => display::draw_splash(&mut self.display),
            Screen::Main => display::draw_main(
                &mut self.display,
                self.status.as_str(),
                self.name.as_str(),
                self.email.as_str(),
                self.phone.as_str(),
            ),
        }
    }
}

impl<I2C> Presenter for OledPresenter<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show_screen(&mut self, screen: Screen) {
        self.visible = screen;
        self.redraw();
    }

    fn hide_screen(&mut self, _screen: Screen) {
        // A show of the next screen always follows; clearing here would
        // only flash the panel.
    }

    fn set_text(&mut self, field: TextField, text: &str) {
        match field {
            TextField::Status => copy_into(&mut self.status, text),
            TextField::Name => copy_into(&mut self.name, text),
            TextField::Email => copy_into(&mut self.email, text),
            TextField::Phone => copy_into(&mut self.phone, text),
        }
        if self.visible == Screen::Main {
            self.redraw();
        }
    }
}

fn copy_into<const N: usize>(dst: &mut String<N>, src: &str) {
    dst.clear();
    for ch in src.chars() {
        if dst.len() + ch.len_utf8() > N {
            break;
        }
        let _ = dst.push(ch);
    }
}
