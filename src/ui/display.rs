//! SSD1306 OLED display wrapper.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Display<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let _ = display.init();
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn text_style() -> embedded_graphics::mono_font::MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// Render the boot splash.
pub fn draw_splash<I2C>(display: &mut Display<I2C>)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::with_alignment("wristlink", Point::new(64, 28), text_style(), Alignment::Center)
        .draw(display);
    let _ = Text::with_alignment("loading...", Point::new(64, 44), text_style(), Alignment::Center)
        .draw(display);

    let _ = display.flush();
}

/// Render the main screen: status line plus the contact fields.
pub fn draw_main<I2C>(display: &mut Display<I2C>, status: &str, name: &str, email: &str, phone: &str)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::with_alignment(status, Point::new(64, 10), text_style(), Alignment::Center)
        .draw(display);

    let _ = Text::new(name, Point::new(0, 28), text_style()).draw(display);
    let _ = Text::new(email, Point::new(0, 42), text_style()).draw(display);
    let _ = Text::new(phone, Point::new(0, 56), text_style()).draw(display);

    let _ = display.flush();
}
