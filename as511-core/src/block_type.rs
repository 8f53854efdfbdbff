use crate::error::{As511Error, As511Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// S5 block type
///
/// The discriminant of each variant is the type code carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    /// Data block (DB)
    Data = 0x01,
    /// System block (SB)
    System = 0x02,
    /// Program block (PB)
    Program = 0x04,
    /// Function block (FB)
    Function = 0x08,
    /// Organization block (OB)
    Organization = 0x30,
    /// Special function block (FX)
    SpecialFunction = 0x4C,
    /// Extended data block (DX)
    DataExtended = 0x90,
}

impl BlockType {
    /// All block types known to the protocol
    pub const ALL: [BlockType; 7] = [
        BlockType::Data,
        BlockType::System,
        BlockType::Program,
        BlockType::Function,
        BlockType::Organization,
        BlockType::SpecialFunction,
        BlockType::DataExtended,
    ];

    /// Get block type from its wire code
    pub fn from_code(code: u8) -> As511Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .ok_or_else(|| As511Error::InvalidAddress(format!("Unknown block type code: 0x{:02X}", code)))
    }

    /// Get the wire code of this block type
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Get the conventional two-letter name (e.g. `DB`)
    pub fn short_name(&self) -> &'static str {
        match self {
            BlockType::Data => "DB",
            BlockType::System => "SB",
            BlockType::Program => "PB",
            BlockType::Function => "FB",
            BlockType::Organization => "OB",
            BlockType::SpecialFunction => "FX",
            BlockType::DataExtended => "DX",
        }
    }

    /// Get block type from its two-letter name (case-insensitive)
    pub fn from_short_name(name: &str) -> As511Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.short_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| As511Error::InvalidAddress(format!("Unknown block type: {}", name)))
    }
}

impl TryFrom<u8> for BlockType {
    type Error = As511Error;

    fn try_from(code: u8) -> As511Result<Self> {
        Self::from_code(code)
    }
}

impl From<BlockType> for u8 {
    fn from(block_type: BlockType) -> Self {
        block_type.code()
    }
}

/// Accepts `FB`, `0x08` or `8`
impl FromStr for BlockType {
    type Err = As511Error;

    fn from_str(s: &str) -> As511Result<Self> {
        let s = s.trim();
        let code = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u8::from_str_radix(hex, 16).ok()
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse::<u8>().ok()
        } else {
            return Self::from_short_name(s);
        };

        match code {
            Some(code) => Self::from_code(code),
            None => Err(As511Error::InvalidAddress(format!(
                "Block type code out of range: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_type_map() {
        assert_eq!(BlockType::Data.code(), 0x01);
        assert_eq!(BlockType::Function.code(), 0x08);
        assert_eq!(BlockType::Organization.code(), 0x30);
        assert_eq!(BlockType::DataExtended.code(), 0x90);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(BlockType::from_code(0x4C).unwrap(), BlockType::SpecialFunction);
        assert!(matches!(
            BlockType::from_code(0x07),
            Err(As511Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_names_and_numbers() {
        assert_eq!("fb".parse::<BlockType>().unwrap(), BlockType::Function);
        assert_eq!("OB".parse::<BlockType>().unwrap(), BlockType::Organization);
        assert_eq!("0x90".parse::<BlockType>().unwrap(), BlockType::DataExtended);
        assert_eq!("4".parse::<BlockType>().unwrap(), BlockType::Program);
        assert!("QB".parse::<BlockType>().is_err());
        assert!("0x1FF".parse::<BlockType>().is_err());
        assert!("".parse::<BlockType>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(BlockType::System.to_string(), "SB");
    }
}
