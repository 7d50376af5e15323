//! Transform Command Handlers
//!
//! 上传 -> 变调 -> 落盘 -> 状态更新 的完整流程

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::application::commands::TransformVoice;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioContainer, JobStorePort, StorageAdapterPort, TransformError, TransformedAudio,
    VoiceTransformerPort,
};
use crate::domain::job::{JobStatus, TransformationJob};
use crate::domain::voice::{Catalog, Gender};

/// 工作目录
#[derive(Debug, Clone)]
pub struct WorkDirs {
    /// 上传临时文件目录
    pub upload_dir: PathBuf,
    /// 输出文件目录
    pub output_dir: PathBuf,
    /// 输出文件的公开 URL 前缀
    pub output_url_prefix: String,
}

impl WorkDirs {
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
            output_url_prefix: "/outputs".to_string(),
        }
    }

    pub fn output_url(&self, filename: &str) -> String {
        format!("{}/{}", self.output_url_prefix.trim_end_matches('/'), filename)
    }
}

/// 取小写扩展名（含前导 `.`），无扩展名时为空串
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

// ============================================================================
// TransformVoice
// ============================================================================

/// 变声响应
#[derive(Debug, Clone)]
pub struct TransformVoiceResponse {
    pub job_id: Uuid,
    pub filename: String,
    pub url: String,
    pub status: JobStatus,
    pub storage_url: Option<String>,
}

/// TransformVoice Handler
pub struct TransformVoiceHandler {
    catalog: Catalog,
    job_store: Arc<dyn JobStorePort>,
    transformer: Arc<dyn VoiceTransformerPort>,
    storage: Arc<dyn StorageAdapterPort>,
    dirs: WorkDirs,
}

impl TransformVoiceHandler {
    pub fn new(
        catalog: Catalog,
        job_store: Arc<dyn JobStorePort>,
        transformer: Arc<dyn VoiceTransformerPort>,
        storage: Arc<dyn StorageAdapterPort>,
        dirs: WorkDirs,
    ) -> Self {
        Self {
            catalog,
            job_store,
            transformer,
            storage,
            dirs,
        }
    }

    pub async fn handle(
        &self,
        command: TransformVoice,
    ) -> Result<TransformVoiceResponse, ApplicationError> {
        // 先校验音色，未知音色不落任何文件
        let voice = self
            .catalog
            .find(&command.voice_id)
            .ok_or_else(|| ApplicationError::UnknownVoice(command.voice_id.clone()))?;

        let job_id = Uuid::new_v4();
        let ext = file_extension(&command.original_filename);
        let input_path = self.dirs.upload_dir.join(format!("input_{}{}", job_id, ext));
        let output_filename = format!("transformed_{}{}", job_id, ext);
        let output_path = self.dirs.output_dir.join(&output_filename);

        fs::write(&input_path, &command.data)
            .await
            .map_err(|e| ApplicationError::storage(format!("Failed to save upload: {}", e)))?;

        tracing::info!(
            job_id = %job_id,
            voice_id = %voice.id,
            input = %input_path.display(),
            "Processing upload"
        );

        let job = TransformationJob::new(
            job_id,
            command.original_filename.clone(),
            output_filename.clone(),
            command.voice_id.clone(),
        )
        .with_retention(command.retain_prosody, command.retain_accent);
        self.job_store.append(job)?;

        let container = AudioContainer::from_extension(&ext);
        let result = self
            .produce_output(job_id, command.data, container, voice.gender, &input_path, &output_path)
            .await;

        // 清理上传临时文件，失败不影响结果
        if let Err(e) = fs::remove_file(&input_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to delete input file");
            }
        }

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                // 回退拷贝也失败：任务不再处理中，按回退终态记录后返回错误
                if let Err(store_err) = self.job_store.update_status(job_id, JobStatus::Fallback) {
                    tracing::warn!(job_id = %job_id, error = %store_err, "Failed to record fallback status");
                }
                return Err(e);
            }
        };
        self.job_store.update_status(job_id, status)?;

        let storage_url = self.storage.upload(&output_path).await;
        if let Some(url) = &storage_url {
            self.job_store.set_storage_url(job_id, url.clone())?;
        }

        tracing::info!(
            job_id = %job_id,
            status = %status,
            output = %output_filename,
            "Voice transformation finished"
        );

        Ok(TransformVoiceResponse {
            job_id,
            url: self.dirs.output_url(&output_filename),
            filename: output_filename,
            status,
            storage_url,
        })
    }

    /// 生成输出文件，返回任务终态
    ///
    /// 变调或写出失败时回退为原样拷贝输入文件
    async fn produce_output(
        &self,
        job_id: Uuid,
        data: Vec<u8>,
        container: Option<AudioContainer>,
        gender: Gender,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<JobStatus, ApplicationError> {
        match self.run_transform(data, container, gender).await {
            Ok(audio) => {
                tracing::info!(
                    job_id = %job_id,
                    factor = %audio.factor,
                    input_frames = audio.input_frames,
                    output_frames = audio.output_frames,
                    "Applied pitch shift"
                );
                match fs::write(output_path, &audio.data).await {
                    Ok(()) => return Ok(JobStatus::Transformed),
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, error = %e, "Failed to write transformed audio");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Transformation failed, using original audio");
            }
        }

        fs::copy(input_path, output_path)
            .await
            .map_err(|e| ApplicationError::storage(format!("Failed to copy fallback output: {}", e)))?;

        Ok(JobStatus::Fallback)
    }

    /// 在阻塞线程池执行变调
    async fn run_transform(
        &self,
        data: Vec<u8>,
        container: Option<AudioContainer>,
        gender: Gender,
    ) -> Result<TransformedAudio, TransformError> {
        let transformer = self.transformer.clone();
        tokio::task::spawn_blocking(move || transformer.transform(&data, container, gender))
            .await
            .unwrap_or_else(|e| Err(TransformError::Internal(e.to_string())))
    }
}
