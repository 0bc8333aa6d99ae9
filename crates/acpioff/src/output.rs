//! Destination of the interpreter's formatted output.

use alloc::boxed::Box;
use core::fmt;

/// A caller-supplied output destination.
pub type Destination = Box<dyn fmt::Write + Send>;

/// Where formatted output currently goes: the platform console unless it
/// was redirected.
#[derive(Default)]
pub struct OutputSink {
    redirect: Option<Destination>,
}

impl OutputSink {
    pub const fn new() -> Self {
        Self { redirect: None }
    }

    /// Send subsequent output to `destination`. `None` leaves the current
    /// destination in place.
    pub fn redirect(&mut self, destination: Option<Destination>) {
        if let Some(destination) = destination {
            self.redirect = Some(destination);
        }
    }

    /// Go back to the console.
    pub fn reset(&mut self) {
        self.redirect = None;
    }

    #[inline]
    pub fn is_redirected(&self) -> bool {
        self.redirect.is_some()
    }

    /// Write to the active destination, falling back to `console`.
    pub fn print(&mut self, console: &mut dyn fmt::Write, args: fmt::Arguments<'_>) -> fmt::Result {
        match self.redirect.as_mut() {
            Some(destination) => destination.write_fmt(args),
            None => console.write_fmt(args),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("redirected", &self.is_redirected())
            .finish()
    }
}
