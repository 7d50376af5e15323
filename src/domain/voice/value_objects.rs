//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::errors::VoiceError;

/// 音色性别
///
/// 序列化为 `"Male"` / `"Female"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// 该性别对应的固定变调系数
    pub fn pitch_factor(&self) -> PitchFactor {
        match self {
            Gender::Male => PitchFactor::MALE,
            Gender::Female => PitchFactor::FEMALE,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 重采样步长
///
/// 不变量: 有限且大于 0
/// - < 1.0: 音调降低、时长变长
/// - > 1.0: 音调升高、时长变短
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PitchFactor(f64);

impl PitchFactor {
    pub const MALE: PitchFactor = PitchFactor(0.85);
    pub const FEMALE: PitchFactor = PitchFactor(1.15);

    pub fn new(value: f64) -> Result<Self, VoiceError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(VoiceError::InvalidFactor(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for PitchFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
