/// TN3270 Protocol Constants and Codes
///
/// Command codes, order codes, structured field types, WCC bits and AID
/// keys used by the engine.
///
/// # References
/// - RFC 1576: TN3270 Current Practices
/// - RFC 2355: TN3270 Enhancements
/// - IBM 3270 Data Stream Programmer's Reference (GA23-0059)
/// 3270 Command Codes
///
/// First byte of every host record
pub const CMD_WRITE: u8 = 0x01;              // Write
pub const CMD_READ_BUFFER: u8 = 0x02;        // Read Buffer
pub const CMD_ERASE_WRITE: u8 = 0x05;        // Erase/Write
pub const CMD_READ_MODIFIED: u8 = 0x06;      // Read Modified
pub const CMD_ERASE_WRITE_ALTERNATE: u8 = 0x0D; // Erase/Write Alternate
pub const CMD_READ_MODIFIED_ALL: u8 = 0x0E;  // Read Modified All
pub const CMD_ERASE_ALL_UNPROTECTED: u8 = 0x0F; // Erase All Unprotected
pub const CMD_WRITE_STRUCTURED_FIELD: u8 = 0x11; // Write Structured Field

/// SNA encodings of the same commands, as sent by VTAM applications
pub const CMD_SNA_WRITE: u8 = 0xF1;
pub const CMD_SNA_READ_BUFFER: u8 = 0xF2;
pub const CMD_SNA_WRITE_STRUCTURED_FIELD: u8 = 0xF3;
pub const CMD_SNA_ERASE_WRITE: u8 = 0xF5;
pub const CMD_SNA_READ_MODIFIED: u8 = 0xF6;
pub const CMD_SNA_ERASE_WRITE_ALTERNATE: u8 = 0x7E;
pub const CMD_SNA_READ_MODIFIED_ALL: u8 = 0x6E;
pub const CMD_SNA_ERASE_ALL_UNPROTECTED: u8 = 0x6F;

/// 3270 Order Codes
/// Embedded in write data to control formatting
pub const ORDER_PT: u8 = 0x05;    // Program Tab
pub const ORDER_GE: u8 = 0x08;    // Graphic Escape
pub const ORDER_SBA: u8 = 0x11;   // Set Buffer Address
pub const ORDER_EUA: u8 = 0x12;   // Erase Unprotected
pub const ORDER_IC: u8 = 0x13;    // Insert Cursor
pub const ORDER_SF: u8 = 0x1D;    // Start Field
pub const ORDER_SA: u8 = 0x28;    // Set Attribute

/// Structured Field Types (WSF record type byte)
pub const SF_COLOR_PAIR: u8 = 0x0B;
pub const SF_EXTENDED_FIELD: u8 = 0x0C;
pub const SF_FIELD_VALIDATION: u8 = 0x0D;
pub const SF_SEAL_UNSEAL: u8 = 0x0E;
pub const SF_TRANSPARENCY: u8 = 0x0F;
pub const SF_CHARACTER_SET: u8 = 0x10;

/// Write Control Character (WCC) Bits
pub const WCC_RESET: u8 = 0x40;           // Reset partition
pub const WCC_ALARM: u8 = 0x04;           // Sound alarm
pub const WCC_RESTORE: u8 = 0x02;         // Restore keyboard
pub const WCC_RESET_MDT: u8 = 0x01;       // Reset MDT bits

/// AID (Attention Identifier) Keys
pub const AID_NO_AID: u8 = 0x60;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_CLEAR: u8 = 0x6D;
pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

/// PF1-PF24 in key order
pub const AID_PF: [u8; 24] = [
    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C,
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C,
];

/// Highlighting values carried by extended field attribute records
pub const HIGHLIGHT_DEFAULT: u8 = 0x00;
pub const HIGHLIGHT_BLINK: u8 = 0xF1;
pub const HIGHLIGHT_REVERSE: u8 = 0xF2;
pub const HIGHLIGHT_UNDERSCORE: u8 = 0xF4;

/// Color values carried by color pair and extended field records
pub const COLOR_DEFAULT: u8 = 0x00;
pub const COLOR_BLUE: u8 = 0xF1;
pub const COLOR_RED: u8 = 0xF2;
pub const COLOR_PINK: u8 = 0xF3;
pub const COLOR_GREEN: u8 = 0xF4;
pub const COLOR_TURQUOISE: u8 = 0xF5;
pub const COLOR_YELLOW: u8 = 0xF6;
pub const COLOR_WHITE: u8 = 0xF7;

/// Validation rule bits carried by field validation records
pub const VALIDATION_MANDATORY_FILL: u8 = 0x04;
pub const VALIDATION_MANDATORY_ENTRY: u8 = 0x02;
pub const VALIDATION_TRIGGER: u8 = 0x01;

/// One-byte wire enumeration
pub trait WireEnum: Sized + Copy {
    fn from_u8(value: u8) -> Option<Self>;
    fn to_u8(self) -> u8;
}

/// A wire byte that is either a modeled code or preserved verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireCode<T> {
    Known(T),
    Unknown(u8),
}

impl<T: WireEnum> WireCode<T> {
    pub fn from_u8(value: u8) -> Self {
        match T::from_u8(value) {
            Some(code) => WireCode::Known(code),
            None => WireCode::Unknown(value),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            WireCode::Known(code) => code.to_u8(),
            WireCode::Unknown(value) => value,
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            WireCode::Known(code) => Some(code),
            WireCode::Unknown(_) => None,
        }
    }
}

/// Enum representation of 3270 command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Write,
    EraseWrite,
    EraseWriteAlternate,
    ReadBuffer,
    ReadModified,
    ReadModifiedAll,
    EraseAllUnprotected,
    WriteStructuredField,
}

impl CommandCode {
    /// Whether the command carries a WCC and write orders
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::EraseWrite | Self::EraseWriteAlternate)
    }

    /// Whether the command clears the screen before writing
    pub fn is_erase(self) -> bool {
        matches!(self, Self::EraseWrite | Self::EraseWriteAlternate)
    }

    /// Whether the command asks for an inbound reply
    pub fn is_read(self) -> bool {
        matches!(self, Self::ReadBuffer | Self::ReadModified | Self::ReadModifiedAll)
    }
}

impl WireEnum for CommandCode {
    /// Accepts both the channel and the SNA encoding
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_WRITE | CMD_SNA_WRITE => Some(Self::Write),
            CMD_ERASE_WRITE | CMD_SNA_ERASE_WRITE => Some(Self::EraseWrite),
            CMD_ERASE_WRITE_ALTERNATE | CMD_SNA_ERASE_WRITE_ALTERNATE => Some(Self::EraseWriteAlternate),
            CMD_READ_BUFFER | CMD_SNA_READ_BUFFER => Some(Self::ReadBuffer),
            CMD_READ_MODIFIED | CMD_SNA_READ_MODIFIED => Some(Self::ReadModified),
            CMD_READ_MODIFIED_ALL | CMD_SNA_READ_MODIFIED_ALL => Some(Self::ReadModifiedAll),
            CMD_ERASE_ALL_UNPROTECTED | CMD_SNA_ERASE_ALL_UNPROTECTED => Some(Self::EraseAllUnprotected),
            CMD_WRITE_STRUCTURED_FIELD | CMD_SNA_WRITE_STRUCTURED_FIELD => Some(Self::WriteStructuredField),
            _ => None,
        }
    }

    /// Channel encoding
    fn to_u8(self) -> u8 {
        match self {
            Self::Write => CMD_WRITE,
            Self::EraseWrite => CMD_ERASE_WRITE,
            Self::EraseWriteAlternate => CMD_ERASE_WRITE_ALTERNATE,
            Self::ReadBuffer => CMD_READ_BUFFER,
            Self::ReadModified => CMD_READ_MODIFIED,
            Self::ReadModifiedAll => CMD_READ_MODIFIED_ALL,
            Self::EraseAllUnprotected => CMD_ERASE_ALL_UNPROTECTED,
            Self::WriteStructuredField => CMD_WRITE_STRUCTURED_FIELD,
        }
    }
}

/// Enum representation of 3270 order codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderCode {
    SetBufferAddress,
    StartField,
    SetAttribute,
    InsertCursor,
    ProgramTab,
    EraseUnprotected,
    GraphicEscape,
}

impl OrderCode {
    /// Fixed payload length following the order byte
    pub fn payload_len(self) -> usize {
        match self {
            Self::SetBufferAddress => 2,
            Self::StartField => 1,
            _ => 0,
        }
    }
}

impl WireEnum for OrderCode {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            ORDER_SBA => Some(Self::SetBufferAddress),
            ORDER_SF => Some(Self::StartField),
            ORDER_SA => Some(Self::SetAttribute),
            ORDER_IC => Some(Self::InsertCursor),
            ORDER_PT => Some(Self::ProgramTab),
            ORDER_EUA => Some(Self::EraseUnprotected),
            ORDER_GE => Some(Self::GraphicEscape),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::SetBufferAddress => ORDER_SBA,
            Self::StartField => ORDER_SF,
            Self::SetAttribute => ORDER_SA,
            Self::InsertCursor => ORDER_IC,
            Self::ProgramTab => ORDER_PT,
            Self::EraseUnprotected => ORDER_EUA,
            Self::GraphicEscape => ORDER_GE,
        }
    }
}

/// Structured field record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuredFieldType {
    ColorPair,
    ExtendedField,
    FieldValidation,
    SealUnseal,
    Transparency,
    CharacterSet,
}

impl WireEnum for StructuredFieldType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            SF_COLOR_PAIR => Some(Self::ColorPair),
            SF_EXTENDED_FIELD => Some(Self::ExtendedField),
            SF_FIELD_VALIDATION => Some(Self::FieldValidation),
            SF_SEAL_UNSEAL => Some(Self::SealUnseal),
            SF_TRANSPARENCY => Some(Self::Transparency),
            SF_CHARACTER_SET => Some(Self::CharacterSet),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::ColorPair => SF_COLOR_PAIR,
            Self::ExtendedField => SF_EXTENDED_FIELD,
            Self::FieldValidation => SF_FIELD_VALIDATION,
            Self::SealUnseal => SF_SEAL_UNSEAL,
            Self::Transparency => SF_TRANSPARENCY,
            Self::CharacterSet => SF_CHARACTER_SET,
        }
    }
}

/// Write Control Character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wcc {
    pub reset: bool,
    pub alarm: bool,
    pub restore_keyboard: bool,
    pub reset_mdt: bool,
}

impl Wcc {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            reset: byte & WCC_RESET != 0,
            alarm: byte & WCC_ALARM != 0,
            restore_keyboard: byte & WCC_RESTORE != 0,
            reset_mdt: byte & WCC_RESET_MDT != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.reset {
            byte |= WCC_RESET;
        }
        if self.alarm {
            byte |= WCC_ALARM;
        }
        if self.restore_keyboard {
            byte |= WCC_RESTORE;
        }
        if self.reset_mdt {
            byte |= WCC_RESET_MDT;
        }
        byte
    }
}

/// Attention identifier sent at the head of every inbound reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AidKey {
    #[default]
    NoAid,
    Enter,
    Clear,
    PA1,
    PA2,
    PA3,
    /// PF1 through PF24
    PF(u8),
}

impl AidKey {
    /// Whether the key produces a short read (AID only)
    pub fn is_short_read(self) -> bool {
        matches!(self, Self::Clear | Self::PA1 | Self::PA2 | Self::PA3)
    }
}

impl WireEnum for AidKey {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            AID_NO_AID => Some(Self::NoAid),
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_PA1 => Some(Self::PA1),
            AID_PA2 => Some(Self::PA2),
            AID_PA3 => Some(Self::PA3),
            _ => AID_PF
                .iter()
                .position(|&code| code == value)
                .map(|index| Self::PF(index as u8 + 1)),
        }
    }

    /// PF numbers outside 1..=24 encode as "no AID"
    fn to_u8(self) -> u8 {
        match self {
            Self::NoAid => AID_NO_AID,
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::PA1 => AID_PA1,
            Self::PA2 => AID_PA2,
            Self::PA3 => AID_PA3,
            Self::PF(n) => match n {
                1..=24 => AID_PF[n as usize - 1],
                _ => AID_NO_AID,
            },
        }
    }
}
