//! Transform Commands

/// 变声命令
///
/// `retain_prosody` / `retain_accent` 只记录到任务上，不影响变调结果
#[derive(Debug, Clone)]
pub struct TransformVoice {
    pub original_filename: String,
    pub data: Vec<u8>,
    pub voice_id: String,
    pub retain_prosody: bool,
    pub retain_accent: bool,
}
