//! The monitor's multiplexed trap interface and the video bring-up that
//! runs just before control transfer.

/// Operations multiplexed through the monitor's trap 12 call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOp {
    ScreenOff,
    ScreenOn,
    VgaMode,
    LoadPalette,
    ClearScreen,
    MoveCursor,
    WriteText,
}

impl TrapOp {
    /// Operation code passed in the trap frame.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            TrapOp::ScreenOff => 0x80,
            TrapOp::ScreenOn => 0x81,
            TrapOp::VgaMode => 0x12,
            TrapOp::LoadPalette => 0x85,
            TrapOp::ClearScreen => 0x89,
            TrapOp::MoveCursor => 0x90,
            TrapOp::WriteText => 0x91,
        }
    }
}

/// One trap call: operation code, two small arguments, optional data
/// pointer. The single hardware implementation marshals this into the
/// monitor's register convention.
pub trait Monitor {
    fn call(&mut self, op: TrapOp, arg1: u16, arg2: u16, data: Option<&[u8]>);
}

/// VGA mode 12 with this palette gives a linear monochrome framebuffer on
/// plane 0: black text on white.
const PALETTE: [u8; 16] = [
    0x3F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const STATUS_TEXT: &[u8] = b"EmuTOS loading...";

/// Switches the display adapter into graphics mode and draws the status
/// line. Assumes an adapter is present; absence is not detected.
pub fn init_video<M: Monitor>(monitor: &mut M) {
    monitor.call(TrapOp::ScreenOff, 0, 0, None);
    monitor.call(TrapOp::VgaMode, 0, 0, None);
    monitor.call(TrapOp::LoadPalette, 0, 0, Some(&PALETTE));
    monitor.call(TrapOp::ClearScreen, 0, 0, None);
    monitor.call(TrapOp::ScreenOn, 0, 0, None);
    monitor.call(TrapOp::MoveCursor, 5, 5, None);
    monitor.call(TrapOp::WriteText, 15, 0, Some(STATUS_TEXT));
}
