use std::time::Instant;

use anyhow::Result;
use tracing::instrument;
use xcb::{
    Connection, Extension,
    screensaver::{QueryInfo, QueryInfoReply},
    test::FakeInput,
    x::{Drawable, Window},
};

use super::InputManager;

/// Core protocol event code for MotionNotify, which is what XTEST expects when faking pointer
/// motion.
const MOTION_NOTIFY_EVENT: u8 = 6;

pub struct LinuxInputManager {
    connection: Connection,
    preferred_screen: i32,
    /// Reference point for the process-local millisecond tick counter. X11 has no global input
    /// tick, so last-input ticks are derived from the screensaver idle counter instead.
    started: Instant,
}

impl LinuxInputManager {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = Connection::connect_with_extensions(
            None,
            &[Extension::ScreenSaver, Extension::Test],
            &[],
        )?;
        Ok(Self {
            connection,
            preferred_screen,
            started: Instant::now(),
        })
    }

    fn root_window(&self) -> Window {
        let setup = self.connection.get_setup();

        // Currently the application only supports 1 x11 screen.
        setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .unwrap()
            .root()
    }

    #[instrument(skip(self))]
    fn query_idle_ms(&self) -> Result<u64> {
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(self.root_window()),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(reply.ms_since_user_input() as u64)
    }
}

impl InputManager for LinuxInputManager {
    fn current_tick(&mut self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn last_input_tick(&mut self) -> Result<u64> {
        let idle = self.query_idle_ms()?;
        Ok(self.current_tick().saturating_sub(idle))
    }

    fn idle_duration(&mut self) -> Result<u64> {
        self.query_idle_ms()
    }

    #[instrument(skip(self))]
    fn move_pointer(&mut self, dx: i32, dy: i32) -> Result<()> {
        let root = self.root_window();
        let cookie = self.connection.send_request_checked(&FakeInput {
            r#type: MOTION_NOTIFY_EVENT,
            // A non-zero detail makes the coordinates relative to the current pointer position.
            detail: 1,
            time: 0,
            root,
            root_x: dx as i16,
            root_y: dy as i16,
            deviceid: 0,
        });
        self.connection.check_request(cookie)?;
        Ok(())
    }
}
