//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    #[error("无效的变调系数: {0}")]
    InvalidFactor(f64),
}
