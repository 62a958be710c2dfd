use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entities::{CameraReliability, LatestFrame};
use crate::domain::value_objects::camera_status::CameraStatus;

/// 1-based camera identifier assigned by the backend.
pub type CameraId = u32;

/// Raw per-camera signals gathered from the latest frame and the reliability report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CameraSignals {
    pub ptz_offset: bool,
    pub stream_online: bool,
    /// `None` while the reliability source has no reading for this camera.
    pub umbrella_reliable: Option<bool>,
    pub umbrella_count: Option<u32>,
}

/// Classify a camera. Priority is fixed, first match wins:
/// offline, then PTZ offset, then rain affected, otherwise normal.
///
/// A missing reliability reading is absence of adverse evidence, never rain.
#[must_use]
pub const fn classify(signals: &CameraSignals) -> CameraStatus {
    if !signals.stream_online {
        return CameraStatus::Offline;
    }
    if signals.ptz_offset {
        return CameraStatus::PtzOffset;
    }
    if matches!(signals.umbrella_reliable, Some(false)) {
        return CameraStatus::RainAffected;
    }
    CameraStatus::Normal
}

/// Key of a camera in the reliability map.
#[must_use]
pub fn camera_key(id: CameraId) -> String {
    format!("camera_{id}")
}

/// One camera with its signals and derived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CameraReading {
    pub id: CameraId,
    pub signals: CameraSignals,
    pub status: CameraStatus,
}

/// Build the signals of every camera reported by `frame`.
///
/// The camera count comes from the frame's arrays; `reliability` may be absent
/// or partial.
#[must_use]
pub fn collect_signals(
    frame: &LatestFrame,
    reliability: Option<&BTreeMap<String, CameraReliability>>,
) -> Vec<(CameraId, CameraSignals)> {
    (0..frame.camera_count())
        .map(|index| {
            #[allow(clippy::cast_possible_truncation)]
            let id = index as CameraId + 1;
            let entry = reliability.and_then(|cameras| cameras.get(&camera_key(id)));
            let signals = CameraSignals {
                ptz_offset: frame.ptz_offset(index),
                stream_online: frame.stream_online(index),
                umbrella_reliable: entry.map(|e| e.reliable),
                umbrella_count: entry.map(|e| e.umbrella_count),
            };
            (id, signals)
        })
        .collect()
}

/// Classify every camera of `frame`.
#[must_use]
pub fn classify_all(
    frame: &LatestFrame,
    reliability: Option<&BTreeMap<String, CameraReliability>>,
) -> Vec<CameraReading> {
    collect_signals(frame, reliability)
        .into_iter()
        .map(|(id, signals)| CameraReading {
            id,
            signals,
            status: classify(&signals),
        })
        .collect()
}

/// Camera monitor filter over raw stream/PTZ flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraFilter {
    #[default]
    All,
    Online,
    Offline,
    PtzNormal,
    PtzOffset,
}

impl CameraFilter {
    #[must_use]
    pub const fn matches(self, signals: &CameraSignals) -> bool {
        match self {
            Self::All => true,
            Self::Online => signals.stream_online,
            Self::Offline => !signals.stream_online,
            Self::PtzNormal => !signals.ptz_offset,
            Self::PtzOffset => signals.ptz_offset,
        }
    }

    #[must_use]
    pub fn apply(self, readings: &[CameraReading]) -> Vec<CameraReading> {
        readings
            .iter()
            .filter(|r| self.matches(&r.signals))
            .copied()
            .collect()
    }
}

impl std::str::FromStr for CameraFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "ptz-normal" | "ptz_normal" => Ok(Self::PtzNormal),
            "ptz-offset" | "ptz_offset" => Ok(Self::PtzOffset),
            other => Err(format!(
                "unknown camera filter '{other}' (expected all, online, offline, ptz-normal, ptz-offset)"
            )),
        }
    }
}

/// Number of cameras per status, for legends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub normal: usize,
    pub ptz_offset: usize,
    pub offline: usize,
    pub rain_affected: usize,
}

impl StatusTally {
    #[must_use]
    pub fn from_readings(readings: &[CameraReading]) -> Self {
        readings.iter().fold(Self::default(), |mut tally, r| {
            match r.status {
                CameraStatus::Normal => tally.normal += 1,
                CameraStatus::PtzOffset => tally.ptz_offset += 1,
                CameraStatus::Offline => tally.offline += 1,
                CameraStatus::RainAffected => tally.rain_affected += 1,
            }
            tally
        })
    }

    #[must_use]
    pub const fn get(&self, status: CameraStatus) -> usize {
        match status {
            CameraStatus::Normal => self.normal,
            CameraStatus::PtzOffset => self.ptz_offset,
            CameraStatus::Offline => self.offline,
            CameraStatus::RainAffected => self.rain_affected,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.normal + self.ptz_offset + self.offline + self.rain_affected
    }
}

/// Sum of umbrellas seen across all cameras of the reliability report.
#[must_use]
pub fn total_umbrella_count(cameras: &BTreeMap<String, CameraReliability>) -> u64 {
    cameras.values().map(|c| u64::from(c.umbrella_count)).sum()
}
