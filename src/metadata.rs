//! Image metadata as read by exiftool.
//!
//! The daemon only needs a handful of tags from the JSON record `exiftool -j`
//! produces, in its default (print-converted) form:
//!
//! | Tag | Example | Notes |
//! |---|---|---|
//! | `FileType` | `"ARW"` | short code, required |
//! | `FocalLength` | `"24.0 mm"`, `"35.0A mm"` | string, parsed by [`lens`](crate::lens) |
//! | `FNumber` | `2.8`, `0`, `"undef"` | `undef` when the lens has no contacts |
//! | `ImageWidth` / `ImageHeight` | `6048` | informational only |
//!
//! Print conversion matters: with `-n` exiftool would report `FocalLength` as a
//! bare number and lose the qualifier letter some bodies append.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("exiftool record is not a JSON object")]
    NotAnObject,
    #[error("exiftool record has no FileType tag")]
    MissingFileType,
}

/// The `FNumber` tag, as far as anamorphic detection cares.
#[derive(Debug, Clone, PartialEq)]
pub enum FNumber {
    /// The `undef` sentinel: no aperture reported electronically.
    Undefined,
    Value(f64),
    /// Present, but neither a number nor `undef` (e.g. `"n/a"`, `""`).
    Unrecognized(String),
    /// The tag is absent from the record.
    Missing,
}

impl FNumber {
    /// Interpret an exiftool JSON value.
    ///
    /// Numbers and numeric strings are values, `undef` (any case) is the
    /// sentinel, anything else is kept verbatim as unrecognized.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => FNumber::Missing,
            Some(Value::Number(n)) => n
                .as_f64()
                .map_or_else(|| FNumber::Unrecognized(n.to_string()), FNumber::Value),
            Some(Value::String(s)) => {
                let text = s.trim();
                if text.eq_ignore_ascii_case("undef") {
                    FNumber::Undefined
                } else {
                    text.parse::<f64>()
                        .map_or_else(|_| FNumber::Unrecognized(s.clone()), FNumber::Value)
                }
            }
            Some(other) => FNumber::Unrecognized(other.to_string()),
        }
    }

    /// `undef` and `0` both mean "not recorded".
    pub fn is_unrecorded(&self) -> bool {
        match self {
            FNumber::Undefined => true,
            FNumber::Value(v) => *v == 0.0,
            FNumber::Unrecognized(_) | FNumber::Missing => false,
        }
    }
}

impl std::fmt::Display for FNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FNumber::Undefined => write!(f, "undef"),
            FNumber::Value(v) => write!(f, "f/{v}"),
            FNumber::Unrecognized(raw) => write!(f, "unrecognized {raw:?}"),
            FNumber::Missing => write!(f, "missing"),
        }
    }
}

/// Metadata of one source file. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub file_type: String,
    pub focal_length: Option<String>,
    pub f_number: FNumber,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageMetadata {
    /// Build from a single exiftool JSON record (one element of the `-j` array).
    pub fn from_exiftool_json(record: &Value) -> Result<Self, MetadataError> {
        let object = record.as_object().ok_or(MetadataError::NotAnObject)?;

        let file_type = object
            .get("FileType")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(MetadataError::MissingFileType)?;

        // Some writers store FocalLength as a bare number; keep it as text so the
        // focal-length parser sees one format.
        let focal_length = object.get("FocalLength").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => n.as_f64().map(|mm| format!("{mm:.1} mm")),
            _ => None,
        });

        Ok(Self {
            file_type,
            focal_length,
            f_number: FNumber::from_json(object.get("FNumber")),
            width: dimension(object.get("ImageWidth")),
            height: dimension(object.get("ImageHeight")),
        })
    }

    /// Case-insensitive file type match, e.g. `"ARW"` vs `"arw"`.
    pub fn is_file_type(&self, code: &str) -> bool {
        self.file_type.eq_ignore_ascii_case(code)
    }
}

fn dimension(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
