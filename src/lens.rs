//! Anamorphic adapter detection.
//!
//! The adapter has no electronic contacts, so the camera records whatever the
//! mount reports without a lens: a nominal focal length from a small set and
//! an f-number of `undef` (or `0`). A file is anamorphic when both hold:
//!
//! ```text
//! trunc(FocalLength) ∈ candidate_focal_lengths  AND  FNumber ∈ {undef, 0}
//! ```
//!
//! A recognised focal length with a real aperture means a genuine prime was
//! mounted. Anything that does not look like a focal length at all is
//! treated as "not anamorphic" rather than an error, but stays
//! distinguishable through [`Rejection::UnparseableFocalLength`].

use crate::metadata::{FNumber, ImageMetadata};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `<digits>.<digits>[letter] mm`, anchored at the start only.
static FOCAL_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)([A-Za-z])? mm").expect("focal length pattern is valid")
});

/// Lens constants for one adapter setup, injected into the classifier and
/// the geometry calculations.
#[derive(Debug, Clone, PartialEq)]
pub struct LensProfile {
    /// Horizontal-to-vertical stretch of the adapter.
    pub scale_factor: f64,
    /// Whole-millimetre focal lengths the body reports with the adapter fitted.
    pub candidate_focal_lengths: Vec<u32>,
    /// Written in place of a reported `0.0 mm`.
    pub default_focal_length: String,
}

impl Default for LensProfile {
    fn default() -> Self {
        Self {
            scale_factor: 1.33,
            candidate_focal_lengths: vec![0, 24, 50],
            default_focal_length: "35.0A mm".to_string(),
        }
    }
}

/// Result of parsing an exiftool `FocalLength` string.
#[derive(Debug, Clone, PartialEq)]
pub enum FocalLengthReading {
    Parsed {
        millimeters: f64,
        whole_millimeters: u32,
        qualifier: Option<char>,
    },
    Unparseable,
}

/// Parse `"24.0 mm"` / `"35.0A mm"`. Never fails; malformed input yields
/// [`FocalLengthReading::Unparseable`].
pub fn parse_focal_length(text: &str) -> FocalLengthReading {
    let Some(caps) = FOCAL_LENGTH.captures(text) else {
        return FocalLengthReading::Unparseable;
    };

    let Ok(whole_millimeters) = caps[1].parse::<u32>() else {
        return FocalLengthReading::Unparseable;
    };
    let Ok(millimeters) = format!("{}.{}", &caps[1], &caps[2]).parse::<f64>() else {
        return FocalLengthReading::Unparseable;
    };

    FocalLengthReading::Parsed {
        millimeters,
        whole_millimeters,
        qualifier: caps.get(3).and_then(|m| m.as_str().chars().next()),
    }
}

/// Why a file was classified as not anamorphic.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// `FocalLength` absent or not of the `<n>.<n> mm` shape.
    UnparseableFocalLength(Option<String>),
    FocalLengthNotCandidate(u32),
    FNumberRecorded(f64),
    /// `FNumber` present but neither numeric nor `undef`.
    FNumberUnrecognized(String),
    FNumberMissing,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnparseableFocalLength(Some(raw)) => {
                write!(f, "unparseable focal length {raw:?}")
            }
            Rejection::UnparseableFocalLength(None) => write!(f, "no focal length"),
            Rejection::FocalLengthNotCandidate(mm) => {
                write!(f, "focal length {mm} mm is not an adapter focal length")
            }
            Rejection::FNumberRecorded(v) => write!(f, "aperture f/{v} was recorded"),
            Rejection::FNumberUnrecognized(raw) => write!(f, "unrecognized FNumber {raw:?}"),
            Rejection::FNumberMissing => write!(f, "no FNumber tag"),
        }
    }
}

/// Outcome of classifying one file.
#[derive(Debug, Clone, PartialEq)]
pub enum AnamorphicDecision {
    Anamorphic {
        /// Focal length to write back, when the recorded one is meaningless.
        focal_length_override: Option<String>,
    },
    NotAnamorphic(Rejection),
}

impl AnamorphicDecision {
    pub fn is_anamorphic(&self) -> bool {
        matches!(self, AnamorphicDecision::Anamorphic { .. })
    }

    pub fn effective_focal_length(&self) -> Option<&str> {
        match self {
            AnamorphicDecision::Anamorphic {
                focal_length_override,
            } => focal_length_override.as_deref(),
            AnamorphicDecision::NotAnamorphic(_) => None,
        }
    }
}

/// Pure metadata → decision function over an injected [`LensProfile`].
#[derive(Debug, Clone, Default)]
pub struct AnamorphicClassifier {
    profile: LensProfile,
}

impl AnamorphicClassifier {
    pub fn new(profile: LensProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LensProfile {
        &self.profile
    }

    pub fn classify(&self, metadata: &ImageMetadata) -> AnamorphicDecision {
        let reading = metadata
            .focal_length
            .as_deref()
            .map_or(FocalLengthReading::Unparseable, parse_focal_length);

        let (millimeters, whole) = match reading {
            FocalLengthReading::Parsed {
                millimeters,
                whole_millimeters,
                ..
            } => (millimeters, whole_millimeters),
            FocalLengthReading::Unparseable => {
                return AnamorphicDecision::NotAnamorphic(Rejection::UnparseableFocalLength(
                    metadata.focal_length.clone(),
                ));
            }
        };

        if !self.profile.candidate_focal_lengths.contains(&whole) {
            return AnamorphicDecision::NotAnamorphic(Rejection::FocalLengthNotCandidate(whole));
        }

        if !metadata.f_number.is_unrecorded() {
            let rejection = match &metadata.f_number {
                FNumber::Value(v) => Rejection::FNumberRecorded(*v),
                FNumber::Unrecognized(raw) => Rejection::FNumberUnrecognized(raw.clone()),
                _ => Rejection::FNumberMissing,
            };
            return AnamorphicDecision::NotAnamorphic(rejection);
        }

        AnamorphicDecision::Anamorphic {
            focal_length_override: (millimeters == 0.0)
                .then(|| self.profile.default_focal_length.clone()),
        }
    }
}
