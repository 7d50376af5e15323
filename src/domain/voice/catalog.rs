//! Voice Context - 静态音色目录
//!
//! 进程启动时即固定，只读，不增删改

use serde::Serialize;

use super::Gender;

/// 音色描述
///
/// 不变量:
/// - `id` 在目录内唯一
/// - 永不修改、永不删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: Gender,
    pub language: &'static str,
    pub accent: &'static str,
    pub description: &'static str,
    pub sample_url: Option<&'static str>,
}

static SEED: [VoiceDescriptor; 4] = [
    VoiceDescriptor {
        id: "en-US-terrell",
        name: "Terrell",
        gender: Gender::Male,
        language: "English",
        accent: "American",
        description: "Professional male voice with a warm tone",
        sample_url: None,
    },
    VoiceDescriptor {
        id: "en-US-sarah",
        name: "Sarah",
        gender: Gender::Female,
        language: "English",
        accent: "American",
        description: "Friendly female voice",
        sample_url: None,
    },
    VoiceDescriptor {
        id: "en-US-david",
        name: "David",
        gender: Gender::Male,
        language: "English",
        accent: "American",
        description: "Narrator voice with deep tone",
        sample_url: None,
    },
    VoiceDescriptor {
        id: "en-US-emma",
        name: "Emma",
        gender: Gender::Female,
        language: "English",
        accent: "American",
        description: "Conversational female voice",
        sample_url: None,
    },
];

/// 音色目录
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    voices: &'static [VoiceDescriptor],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Catalog {
    /// 内置的 4 个音色
    pub fn seeded() -> Self {
        Self { voices: &SEED }
    }

    /// 按种子顺序返回全部音色
    pub fn all(&self) -> &'static [VoiceDescriptor] {
        self.voices
    }

    pub fn find(&self, id: &str) -> Option<&'static VoiceDescriptor> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
