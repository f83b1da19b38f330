use serde::{Deserialize, Serialize};
use std::fmt;

/// Video recording quality tiers, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    /// 720x480
    Sd,
    /// 1280x720
    Hd,
    /// 1920x1080
    Fhd,
    /// 3840x2160
    Uhd,
}

impl Quality {
    /// All tiers in ascending order
    pub const ALL: [Quality; 4] = [Quality::Sd, Quality::Hd, Quality::Fhd, Quality::Uhd];

    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Quality::Sd => (720, 480),
            Quality::Hd => (1280, 720),
            Quality::Fhd => (1920, 1080),
            Quality::Uhd => (3840, 2160),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Sd => "SD",
            Quality::Hd => "HD",
            Quality::Fhd => "FHD",
            Quality::Uhd => "UHD",
        };
        f.write_str(name)
    }
}

/// A quality the selector asks for before any fallback applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreference {
    Highest,
    Lowest,
    Exact(Quality),
}

/// What to try when none of the preferred qualities is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
    None,
    /// The given quality, then closest higher, then closest lower
    HigherQualityOrLowerThan(Quality),
    /// Closest strictly higher, then closest lower or equal
    HigherQualityThan(Quality),
    /// The given quality, then closest lower, then closest higher
    LowerQualityOrHigherThan(Quality),
    /// Closest strictly lower, then closest higher or equal
    LowerQualityThan(Quality),
}

impl FallbackStrategy {
    /// Fallback tiers in the order they are tried
    fn order(&self) -> Vec<Quality> {
        let (anchor, prefer_higher, include_anchor_first) = match *self {
            FallbackStrategy::None => return Vec::new(),
            FallbackStrategy::HigherQualityOrLowerThan(q) => (q, true, true),
            FallbackStrategy::HigherQualityThan(q) => (q, true, false),
            FallbackStrategy::LowerQualityOrHigherThan(q) => (q, false, true),
            FallbackStrategy::LowerQualityThan(q) => (q, false, false),
        };

        let higher = Quality::ALL.iter().copied().filter(|q| *q > anchor);
        let lower = Quality::ALL.iter().rev().copied().filter(|q| *q < anchor);

        let mut order = Vec::with_capacity(Quality::ALL.len());
        if include_anchor_first {
            order.push(anchor);
        }
        if prefer_higher {
            order.extend(higher);
            if !include_anchor_first {
                order.push(anchor);
            }
            order.extend(lower);
        } else {
            order.extend(lower);
            if !include_anchor_first {
                order.push(anchor);
            }
            order.extend(higher);
        }
        order
    }
}

/// Chooses the recording quality against what a device supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualitySelector {
    preferences: Vec<QualityPreference>,
    fallback: FallbackStrategy,
}

impl QualitySelector {
    pub fn from(preference: QualityPreference, fallback: FallbackStrategy) -> Self {
        Self {
            preferences: vec![preference],
            fallback,
        }
    }

    pub fn from_ordered_list(preferences: Vec<QualityPreference>, fallback: FallbackStrategy) -> Self {
        Self {
            preferences,
            fallback,
        }
    }

    /// Highest available quality, falling back down to SD
    pub fn highest_with_sd_floor() -> Self {
        Self::from(
            QualityPreference::Highest,
            FallbackStrategy::HigherQualityOrLowerThan(Quality::Sd),
        )
    }

    pub fn fallback(&self) -> FallbackStrategy {
        self.fallback
    }

    /// Ordered tiers this selector would try on a device with `supported`
    pub fn candidates(&self, supported: &[Quality]) -> Vec<Quality> {
        let mut order = Vec::new();
        let push = |q: Quality, order: &mut Vec<Quality>| {
            if !order.contains(&q) {
                order.push(q);
            }
        };

        for preference in &self.preferences {
            match preference {
                QualityPreference::Highest => {
                    for q in Quality::ALL.iter().rev().filter(|q| supported.contains(q)) {
                        push(*q, &mut order);
                    }
                }
                QualityPreference::Lowest => {
                    for q in Quality::ALL.iter().filter(|q| supported.contains(q)) {
                        push(*q, &mut order);
                    }
                }
                QualityPreference::Exact(q) => push(*q, &mut order),
            }
        }

        for q in self.fallback.order() {
            push(q, &mut order);
        }

        order
    }

    /// First candidate the device supports
    pub fn resolve(&self, supported: &[Quality]) -> Option<Quality> {
        self.candidates(supported)
            .into_iter()
            .find(|q| supported.contains(q))
    }
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::highest_with_sd_floor()
    }
}
