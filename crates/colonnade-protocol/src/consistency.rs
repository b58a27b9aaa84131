//! Consistency levels carried in error payloads

use serde::{Deserialize, Serialize};

/// Guarantee level the server was asked to honor, echoed back inside
/// unavailable/timeout error payloads.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consistency {
    Any = 0x0000,
    One = 0x0001,
    Two = 0x0002,
    Three = 0x0003,
    Quorum = 0x0004,
    All = 0x0005,
    LocalQuorum = 0x0006,
    EachQuorum = 0x0007,
}

impl Consistency {
    /// Map a wire code to a level. Unknown codes return `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0000 => Some(Consistency::Any),
            0x0001 => Some(Consistency::One),
            0x0002 => Some(Consistency::Two),
            0x0003 => Some(Consistency::Three),
            0x0004 => Some(Consistency::Quorum),
            0x0005 => Some(Consistency::All),
            0x0006 => Some(Consistency::LocalQuorum),
            0x0007 => Some(Consistency::EachQuorum),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

impl std::fmt::Display for Consistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
        };
        write!(f, "{name}")
    }
}
