//! Job Context - Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务状态
///
/// processing -> transformed | fallback，只迁移一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// 已接收上传，处理中
    Processing,
    /// 变调成功
    Transformed,
    /// 变调失败，输出为原始文件的拷贝
    Fallback,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Transformed => "transformed",
            JobStatus::Fallback => "fallback",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 变声任务记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationJob {
    pub id: Uuid,
    pub original_filename: String,
    pub transformed_filename: Option<String>,
    /// 提交时选择的音色 id
    pub voice_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    pub retain_prosody: bool,
    pub retain_accent: bool,
    /// 存储后端返回的地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
}

impl TransformationJob {
    /// 以 processing 状态创建任务
    pub fn new(
        id: Uuid,
        original_filename: impl Into<String>,
        transformed_filename: impl Into<String>,
        voice_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            original_filename: original_filename.into(),
            transformed_filename: Some(transformed_filename.into()),
            voice_id: Some(voice_id.into()),
            created_at: Utc::now(),
            status: JobStatus::Processing,
            retain_prosody: true,
            retain_accent: true,
            storage_url: None,
        }
    }

    pub fn with_retention(mut self, retain_prosody: bool, retain_accent: bool) -> Self {
        self.retain_prosody = retain_prosody;
        self.retain_accent = retain_accent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_processing() {
        let job = TransformationJob::new(Uuid::new_v4(), "a.wav", "transformed_a.wav", "en-US-sarah");
        assert_eq!(job.status, JobStatus::Processing);
        assert!(!job.status.is_terminal());
        assert!(job.storage_url.is_none());
    }

    #[test]
    fn test_job_serialization() {
        let job = TransformationJob::new(Uuid::new_v4(), "a.wav", "transformed_a.wav", "en-US-sarah")
            .with_retention(false, true);
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["status"], "processing");
        assert_eq!(value["original_filename"], "a.wav");
        assert_eq!(value["retain_prosody"], false);
        assert!(value.get("storage_url").is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::Transformed.as_str(), "transformed");
        assert_eq!(
            serde_json::to_string(&JobStatus::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
