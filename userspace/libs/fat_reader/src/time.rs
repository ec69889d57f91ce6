/// Packed FAT date and time fields.
///
/// Pure bit-field extraction; values are not calendar-checked, so a corrupt
/// entry decodes to whatever its bits say (month 0, hour 31, ...).
///
/// ```text
/// time: 15..11 hours | 10..5 minutes | 4..0 seconds / 2
/// date: 15..9 years since 1980 | 8..5 month | 4..0 day
/// ```

use core::fmt;

pub const FAT_EPOCH_YEAR: u16 = 1980;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FatTime {
    pub hour:   u8,
    pub minute: u8,
    /// Always even; the on-disk resolution is two seconds.
    pub second: u8,
}

impl FatTime {
    pub fn decode(raw: u16) -> Self {
        Self {
            hour:   (raw >> 11) as u8,
            minute: ((raw >> 5) & 0x3F) as u8,
            second: ((raw & 0x1F) as u8) * 2,
        }
    }

    /// Odd seconds are truncated.
    pub fn encode(&self) -> u16 {
        (u16::from(self.hour & 0x1F) << 11)
            | (u16::from(self.minute & 0x3F) << 5)
            | u16::from((self.second / 2) & 0x1F)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FatDate {
    /// Full year, 1980..=2107.
    pub year:  u16,
    pub month: u8,
    pub day:   u8,
}

impl FatDate {
    pub fn decode(raw: u16) -> Self {
        Self {
            year:  FAT_EPOCH_YEAR + (raw >> 9),
            month: ((raw >> 5) & 0x0F) as u8,
            day:   (raw & 0x1F) as u8,
        }
    }

    pub fn encode(&self) -> u16 {
        (self.year.saturating_sub(FAT_EPOCH_YEAR).min(0x7F) << 9)
            | (u16::from(self.month & 0x0F) << 5)
            | u16::from(self.day & 0x1F)
    }

    /// An all-zero field; tools write it when they keep no date.
    pub fn is_unset(&self) -> bool {
        self.month == 0 && self.day == 0 && self.year == FAT_EPOCH_YEAR
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FatDateTime {
    pub date: FatDate,
    pub time: FatTime,
}

impl FatDateTime {
    pub fn decode(date: u16, time: u16) -> Self {
        Self { date: FatDate::decode(date), time: FatTime::decode(time) }
    }

    /// `(date, time)` words.
    pub fn encode(&self) -> (u16, u16) {
        (self.date.encode(), self.time.encode())
    }
}

impl fmt::Display for FatDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for FatTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl fmt::Display for FatDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
