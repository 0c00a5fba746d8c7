use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Display label for the dataset's 0/1 flag columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YesNo {
    No,
    Si,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlagError {
    #[error("flag value is missing")]
    Missing,
    #[error("flag value '{0}' is not 0 or 1")]
    OutOfRange(String),
    #[error("'{0}' is not one of \"Si\" or \"No\"")]
    UnknownLabel(String),
}

impl YesNo {
    /// Both labels in select-box order.
    pub const OPTIONS: [YesNo; 2] = [YesNo::Si, YesNo::No];

    pub fn from_flag(value: u8) -> Result<Self, FlagError> {
        match value {
            1 => Ok(YesNo::Si),
            0 => Ok(YesNo::No),
            other => Err(FlagError::OutOfRange(other.to_string())),
        }
    }

    /// Parses a raw CSV cell. Accepts `1`, `0`, `1.0` and `0.0`.
    pub fn from_raw(raw: &str) -> Result<Self, FlagError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FlagError::Missing);
        }
        match raw.parse::<f64>() {
            Ok(v) if v == 1.0 => Ok(YesNo::Si),
            Ok(v) if v == 0.0 => Ok(YesNo::No),
            _ => Err(FlagError::OutOfRange(raw.to_string())),
        }
    }

    pub fn from_label(label: &str) -> Result<Self, FlagError> {
        match label {
            "Si" => Ok(YesNo::Si),
            "No" => Ok(YesNo::No),
            other => Err(FlagError::UnknownLabel(other.to_string())),
        }
    }

    pub fn to_flag(self) -> u8 {
        match self {
            YesNo::Si => 1,
            YesNo::No => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            YesNo::Si => "Si",
            YesNo::No => "No",
        }
    }
}

impl Display for YesNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_is_bijective_on_zero_and_one() {
        let column: Vec<u8> = vec![1, 0, 0, 1, 1, 0];
        let labels: Vec<YesNo> = column.iter().map(|&v| YesNo::from_flag(v).unwrap()).collect();
        assert_eq!(labels[0].label(), "Si");
        assert_eq!(labels[1].label(), "No");
        let restored: Vec<u8> = labels.iter().map(|l| l.to_flag()).collect();
        assert_eq!(restored, column);
    }

    #[test]
    fn labels_round_trip() {
        for option in YesNo::OPTIONS {
            assert_eq!(YesNo::from_label(option.label()).unwrap(), option);
        }
    }

    #[test]
    fn other_values_are_errors() {
        assert_eq!(YesNo::from_flag(2), Err(FlagError::OutOfRange("2".into())));
        assert_eq!(YesNo::from_raw(""), Err(FlagError::Missing));
        assert_eq!(YesNo::from_raw("0.5"), Err(FlagError::OutOfRange("0.5".into())));
        assert_eq!(YesNo::from_raw("t"), Err(FlagError::OutOfRange("t".into())));
        assert!(matches!(YesNo::from_label("si"), Err(FlagError::UnknownLabel(_))));
    }

    #[test]
    fn raw_accepts_float_encoding() {
        assert_eq!(YesNo::from_raw("1.0").unwrap(), YesNo::Si);
        assert_eq!(YesNo::from_raw(" 0 ").unwrap(), YesNo::No);
    }
}
