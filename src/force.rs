use std::fmt;

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;


// Serialized as "white" / "black": this is how the server spells colours.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Enum, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Force {
    White,
    Black,
}

impl Force {
    pub fn opponent(self) -> Force {
        match self {
            Force::White => Force::Black,
            Force::Black => Force::White,
        }
    }

    pub fn to_protocol_str(self) -> &'static str {
        match self {
            Force::White => "white",
            Force::Black => "black",
        }
    }
}

impl fmt::Display for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_protocol_str()) }
}
