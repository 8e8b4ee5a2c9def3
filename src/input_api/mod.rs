//! Contains logic for sampling user inactivity and injecting pointer motion in different
//! environments. [GenericInputManager] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
///
/// Ticks are monotonically increasing millisecond counters with an unspecified origin. They are
/// only ever compared against each other, never interpreted as wall-clock time.
#[cfg_attr(test, mockall::automock)]
pub trait InputManager {
    /// Tick count of "now".
    fn current_tick(&mut self) -> u64;

    /// Tick at which the OS last observed real user input (keyboard/mouse).
    fn last_input_tick(&mut self) -> Result<u64>;

    /// Retrieve amount of time user has been inactive in milliseconds
    fn idle_duration(&mut self) -> Result<u64> {
        let last_input = self.last_input_tick()?;
        Ok(self.current_tick().saturating_sub(last_input))
    }

    /// Emit a single synthetic relative pointer-motion event.
    fn move_pointer(&mut self, dx: i32, dy: i32) -> Result<()>;
}

/// Serves as a cross-compatible InputManager implementation.
pub struct GenericInputManager {
    inner: Box<dyn InputManager>,
}

impl GenericInputManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsInputManager;
                Ok(Self {
                    inner: Box::new(WindowsInputManager::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxInputManager;
                Ok(Self {
                    inner: Box::new(LinuxInputManager::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No input manager was specified")
            }
        }
    }
}

impl InputManager for GenericInputManager {
    fn current_tick(&mut self) -> u64 {
        self.inner.current_tick()
    }

    fn last_input_tick(&mut self) -> Result<u64> {
        self.inner.last_input_tick()
    }

    fn idle_duration(&mut self) -> Result<u64> {
        self.inner.idle_duration()
    }

    fn move_pointer(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.inner.move_pointer(dx, dy)
    }
}
