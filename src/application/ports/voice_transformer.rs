//! Voice Transformer Port - 变声抽象
//!
//! 输入原始音频字节，输出同容器格式的变调音频。
//! 失败时返回显式错误，由调用方决定回退策略。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::voice::{Gender, PitchFactor};

/// 变声错误
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Transform task failed: {0}")]
    Internal(String),
}

/// 音频容器格式（由文件扩展名推断）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioContainer {
    /// 从扩展名推断，允许带前导 `.`
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "wav" | "wave" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" | "oga" => Some(Self::Ogg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
        }
    }
}

impl std::fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// 变声结果
#[derive(Debug, Clone)]
pub struct TransformedAudio {
    /// 编码后的音频数据
    pub data: Vec<u8>,
    pub container: AudioContainer,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// 输入帧数
    pub input_frames: usize,
    /// 输出帧数
    pub output_frames: usize,
    pub factor: PitchFactor,
}

/// Voice Transformer Port
///
/// 同步接口，调用方负责放到阻塞线程池执行
pub trait VoiceTransformerPort: Send + Sync {
    /// 对音频做变调
    ///
    /// # Arguments
    /// * `input` - 上传的原始音频字节
    /// * `container` - 由扩展名推断出的容器格式，未知时为 None
    /// * `gender` - 目标音色性别，决定变调系数
    fn transform(
        &self,
        input: &[u8],
        container: Option<AudioContainer>,
        gender: Gender,
    ) -> Result<TransformedAudio, TransformError>;

    /// 检查是否能输出指定容器
    fn supports_container(&self, container: AudioContainer) -> bool;
}
