use serde::{Deserialize, Serialize};

/// Normalized display status of one camera, shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraStatus {
    Normal,
    PtzOffset,
    Offline,
    RainAffected,
}

impl CameraStatus {
    pub const ALL: [Self; 4] = [
        Self::Normal,
        Self::PtzOffset,
        Self::Offline,
        Self::RainAffected,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::PtzOffset => "PTZ offset",
            Self::Offline => "Offline",
            Self::RainAffected => "Rain affected",
        }
    }

    /// Colour used by the ring layout legend.
    #[must_use]
    pub const fn color_hex(&self) -> &'static str {
        match self {
            Self::Normal => "#52c41a",
            Self::PtzOffset => "#f5222d",
            Self::Offline => "#bfbfbf",
            Self::RainAffected => "#faad14",
        }
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
