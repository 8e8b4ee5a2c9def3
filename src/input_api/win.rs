
use anyhow::{Result, anyhow};
use tracing::error;
use windows::Win32::{
    System::SystemInformation::GetTickCount64,
    UI::Input::KeyboardAndMouse::{
        GetLastInputInfo, INPUT, INPUT_0, INPUT_MOUSE, LASTINPUTINFO, MOUSEEVENTF_MOVE,
        MOUSEINPUT, SendInput,
    },
};

use super::InputManager;

pub fn current_tick() -> u64 {
    unsafe { GetTickCount64() }
}

/// Returns the tick of the last keyboard/mouse event the OS observed. When the query fails the
/// current tick is reported instead, which degrades to "no idle time observed" rather than
/// failing the whole polling tick.
pub fn last_input_tick() -> u64 {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        error!("Failed to retrieve last input tick");
        return current_tick();
    }

    // dwTime is a 32-bit tick and wraps every ~49.7 days. The comparisons downstream only care
    // about equality and short distances, so the raw value is enough.
    last.dwTime as u64
}

pub fn send_pointer_move(dx: i32, dy: i32) -> Result<()> {
    let input = INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: 0,
                dwFlags: MOUSEEVENTF_MOVE,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    let inserted = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
    if inserted != 1 {
        error!("Failed to inject pointer motion");
        return Err(anyhow!("Failed to inject pointer motion"));
    }
    Ok(())
}

pub struct WindowsInputManager {}

impl WindowsInputManager {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsInputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager for WindowsInputManager {
    fn current_tick(&mut self) -> u64 {
        current_tick()
    }

    fn last_input_tick(&mut self) -> Result<u64> {
        Ok(last_input_tick())
    }

    fn move_pointer(&mut self, dx: i32, dy: i32) -> Result<()> {
        send_pointer_move(dx, dy).inspect_err(|e| error!("Failed to move pointer {e:?}"))
    }
}
