//! VoiceForge - 上传音频并按音色变调的 HTTP 服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 静态音色目录、性别与变调系数
//! - Job Context: 变声任务记录
//! - pitch: 重采样变调算法
//!
//! 应用层 (application/):
//! - Ports: 端口定义（JobStore, VoiceTransformer, StorageAdapter）
//! - Commands: TransformVoice
//! - Queries: ListVoices, ListHistory
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + /outputs 静态文件
//! - Memory: JobStore 内存实现
//! - Adapters: 重采样变调器，本地 / Azure / Cloudinary 存储

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
