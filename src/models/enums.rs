use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored string does not map back to an enum variant.
#[derive(Debug, Error)]
#[error("invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(SourceList {
    Prior => "prior",
    Current => "current",
});

str_enum!(ExtractionTier {
    Dictionary => "dictionary",
    Pattern => "pattern",
});

str_enum!(Severity {
    Low => "low",
    Moderate => "moderate",
    High => "high",
});

/// Closed set of normalized administration routes.
/// Unrecognized raw routes stay verbatim on the event with a flag.
str_enum!(RouteCode {
    Oral => "PO",
    Intravenous => "IV",
    Intramuscular => "IM",
    Subcutaneous => "SC",
    Sublingual => "SL",
    Rectal => "PR",
    Topical => "TOP",
    Inhaled => "INH",
});

/// Closed set of normalized frequency codes.
str_enum!(FrequencyCode {
    OnceDaily => "QD",
    TwiceDaily => "BID",
    ThreeTimesDaily => "TID",
    FourTimesDaily => "QID",
    AtBedtime => "QHS",
    InMorning => "QAM",
    AsNeeded => "PRN",
    Every4Hours => "Q4H",
    Every6Hours => "Q6H",
    Every8Hours => "Q8H",
    Every12Hours => "Q12H",
    Weekly => "QWK",
});

impl FrequencyCode {
    /// Administrations per day, used for daily-dose math.
    /// `None` for schedules with no fixed daily multiple.
    pub fn daily_multiplier(&self) -> Option<f64> {
        match self {
            Self::OnceDaily | Self::AtBedtime | Self::InMorning => Some(1.0),
            Self::TwiceDaily | Self::Every12Hours => Some(2.0),
            Self::ThreeTimesDaily | Self::Every8Hours => Some(3.0),
            Self::FourTimesDaily | Self::Every6Hours => Some(4.0),
            Self::Every4Hours => Some(6.0),
            Self::AsNeeded | Self::Weekly => None,
        }
    }
}
