//! Keyboard commands for driving the mouse
//!
//! A serial console, or anything else that produces keys, feeds a
//! [`CommandBuffer`]. A periodic task takes [`Command`]s out of the buffer and
//! performs their [`Action`]s.
//!
//! | Key | Action             |
//! |-----|--------------------|
//! | `a` | move left          |
//! | `d` | move right         |
//! | `w` | move up            |
//! | `s` | move down          |
//! | `t` | scroll up          |
//! | `g` | scroll down        |
//! | `q` | left click         |
//! | `e` | right click        |

use crate::mouse::Buttons;

/// Pointer distance for one move command
pub const MOVE_STEP: i8 = 10;
/// Wheel distance for one scroll command
pub const SCROLL_STEP: i8 = 3;

/// A mouse command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Left,
    Right,
    Up,
    Down,
    ScrollUp,
    ScrollDown,
    LeftClick,
    RightClick,
}

/// What a command does to the mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move { x: i8, y: i8 },
    Scroll(i8),
    Click(Buttons),
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Left,
        Command::Right,
        Command::Up,
        Command::Down,
        Command::ScrollUp,
        Command::ScrollDown,
        Command::LeftClick,
        Command::RightClick,
    ];

    pub const fn from_key(key: u8) -> Option<Self> {
        Some(match key {
            b'a' => Command::Left,
            b'd' => Command::Right,
            b'w' => Command::Up,
            b's' => Command::Down,
            b't' => Command::ScrollUp,
            b'g' => Command::ScrollDown,
            b'q' => Command::LeftClick,
            b'e' => Command::RightClick,
            _ => return None,
        })
    }

    pub const fn key(self) -> u8 {
        match self {
            Command::Left => b'a',
            Command::Right => b'd',
            Command::Up => b'w',
            Command::Down => b's',
            Command::ScrollUp => b't',
            Command::ScrollDown => b'g',
            Command::LeftClick => b'q',
            Command::RightClick => b'e',
        }
    }

    /// Screen coordinates: positive Y is down
    pub const fn action(self) -> Action {
        match self {
            Command::Left => Action::Move {
                x: -MOVE_STEP,
                y: 0,
            },
            Command::Right => Action::Move { x: MOVE_STEP, y: 0 },
            Command::Up => Action::Move {
                x: 0,
                y: -MOVE_STEP,
            },
            Command::Down => Action::Move { x: 0, y: MOVE_STEP },
            Command::ScrollUp => Action::Scroll(SCROLL_STEP),
            Command::ScrollDown => Action::Scroll(-SCROLL_STEP),
            Command::LeftClick => Action::Click(Buttons::LEFT),
            Command::RightClick => Action::Click(Buttons::RIGHT),
        }
    }
}

/// Pending keys, waiting to become a command
///
/// Only lowercase letters are kept. A newline, or a key that arrives when the
/// buffer is full, discards what's pending.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    keys: [u8; CommandBuffer::CAPACITY],
    len: usize,
}

impl CommandBuffer {
    pub const CAPACITY: usize = 2;

    pub const fn new() -> Self {
        CommandBuffer {
            keys: [0; Self::CAPACITY],
            len: 0,
        }
    }

    pub fn push(&mut self, key: u8) {
        if self.len == Self::CAPACITY || key == b'\n' {
            self.clear();
        }
        if key.is_ascii_lowercase() {
            self.keys[self.len] = key;
            self.len += 1;
        }
    }

    /// Take the pending command, if any
    ///
    /// Only the first pending key matters. Once there's a pending key, the
    /// buffer is emptied, whether or not the key is a command.
    pub fn take(&mut self) -> Option<Command> {
        let first = self.pending().first().copied()?;
        self.clear();
        Command::from_key(first)
    }

    pub fn pending(&self) -> &[u8] {
        &self.keys[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.keys = [0; Self::CAPACITY];
        self.len = 0;
    }
}
