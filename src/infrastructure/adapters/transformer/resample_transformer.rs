//! Resample Transformer - 基于 symphonia 的变调实现
//!
//! 支持：
//! - 用 symphonia 解码为交织整型 PCM（WAV / MP3 / FLAC / Ogg Vorbis，按内容探测）
//! - 按性别系数抽帧变调
//! - 按扩展名对应的容器重新编码：WAV、FLAC、Ogg Opus
//!
//! MP3 没有编码器，交由调用方回退

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioContainer, TransformError, TransformedAudio, VoiceTransformerPort,
};
use super::flac_encoder::{encode_flac, flac_bits};
use super::opus_encoder::encode_ogg_opus;
use crate::domain::pitch_shift;
use crate::domain::voice::Gender;

/// 解码后的 PCM 数据
///
/// 样本为满量程 i32，与原始位深无关
#[derive(Debug, Clone)]
pub struct DecodedPcm {
    /// 交织样本
    pub samples: Vec<i32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// 原始位深，编码时按此位深输出
    pub bits_per_sample: u16,
}

impl DecodedPcm {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// 变调器
pub struct ResampleTransformer;

impl ResampleTransformer {
    pub fn new() -> Self {
        Self
    }

    /// 使用 symphonia 解码为 PCM
    pub fn decode(&self, data: &[u8], container: AudioContainer) -> Result<DecodedPcm, TransformError> {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(container.extension());

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| TransformError::Decode(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| TransformError::Decode("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| TransformError::Decode("Unknown sample rate".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| TransformError::Decode("Unknown channel count".to_string()))?;

        let bits_per_sample = match track.codec_params.bits_per_sample {
            Some(bits @ (8 | 16 | 24 | 32)) => bits as u16,
            _ => 16,
        };

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| TransformError::Decode(format!("Decoder creation failed: {}", e)))?;

        let track_id = track.id;
        let mut samples: Vec<i32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(TransformError::Decode(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(TransformError::Decode(format!("Decode failed: {}", e)));
                }
            };

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<i32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual_samples = num_frames * spec.channels.count();
            samples.extend_from_slice(&sample_buf.samples()[..actual_samples]);
        }

        Ok(DecodedPcm {
            samples,
            sample_rate,
            channels,
            bits_per_sample,
        })
    }

    /// 将 PCM 编码为 WAV（整型 PCM，保持位深）
    pub fn encode_wav(&self, pcm: &DecodedPcm) -> Result<Vec<u8>, TransformError> {
        let bits_per_sample = pcm.bits_per_sample;
        let bytes_per_sample = (bits_per_sample / 8) as usize;
        if !matches!(bits_per_sample, 8 | 16 | 24 | 32) {
            return Err(TransformError::Encode(format!(
                "Unsupported bit depth: {}",
                bits_per_sample
            )));
        }

        let num_channels = pcm.channels;
        let sample_rate = pcm.sample_rate;
        let block_align = num_channels * bits_per_sample / 8;
        let byte_rate = sample_rate * block_align as u32;

        let data_size = pcm.samples.len() * bytes_per_sample;
        let pad = data_size % 2;
        let riff_size = 36 + data_size + pad;
        if riff_size > u32::MAX as usize {
            return Err(TransformError::Encode("Audio too large for WAV".to_string()));
        }

        let mut wav = Vec::with_capacity(8 + riff_size);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(riff_size as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for &sample in &pcm.samples {
            match bits_per_sample {
                // 8-bit WAV 为无符号
                8 => wav.push(((sample >> 24) + 128) as u8),
                16 => wav.extend_from_slice(&((sample >> 16) as i16).to_le_bytes()),
                24 => wav.extend_from_slice(&(sample >> 8).to_le_bytes()[..3]),
                _ => wav.extend_from_slice(&sample.to_le_bytes()),
            }
        }

        if pad == 1 {
            wav.push(0);
        }

        Ok(wav)
    }

    /// 按容器编码
    pub fn encode(&self, pcm: &DecodedPcm, container: AudioContainer) -> Result<Vec<u8>, TransformError> {
        match container {
            AudioContainer::Wav => self.encode_wav(pcm),
            AudioContainer::Flac => encode_flac(pcm),
            AudioContainer::Ogg => encode_ogg_opus(pcm),
            AudioContainer::Mp3 => Err(TransformError::UnsupportedContainer(container.to_string())),
        }
    }
}

/// 输出文件实际的位深
fn output_bits(container: AudioContainer, bits_per_sample: u16) -> u16 {
    match container {
        AudioContainer::Flac => flac_bits(bits_per_sample),
        AudioContainer::Ogg => 16,
        _ => bits_per_sample,
    }
}

impl Default for ResampleTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceTransformerPort for ResampleTransformer {
    fn transform(
        &self,
        input: &[u8],
        container: Option<AudioContainer>,
        gender: Gender,
    ) -> Result<TransformedAudio, TransformError> {
        let container = container
            .ok_or_else(|| TransformError::UnsupportedContainer("unknown".to_string()))?;
        if !self.supports_container(container) {
            return Err(TransformError::UnsupportedContainer(container.to_string()));
        }

        let pcm = self.decode(input, container)?;
        if pcm.samples.is_empty() {
            return Err(TransformError::EmptyAudio);
        }

        let factor = gender.pitch_factor();
        let shifted = pitch_shift(&pcm.samples, pcm.channels as usize, factor);

        let output = DecodedPcm {
            samples: shifted,
            ..pcm
        };
        let data = self.encode(&output, container)?;

        Ok(TransformedAudio {
            data,
            container,
            sample_rate: output.sample_rate,
            channels: output.channels,
            bits_per_sample: output_bits(container, output.bits_per_sample),
            input_frames: pcm.samples.len() / pcm.channels.max(1) as usize,
            output_frames: output.frames(),
            factor,
        })
    }

    fn supports_container(&self, container: AudioContainer) -> bool {
        matches!(
            container,
            AudioContainer::Wav | AudioContainer::Flac | AudioContainer::Ogg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resample_indices;
    use crate::domain::voice::PitchFactor;

    /// 锯齿波 PCM，第二声道取反
    fn make_pcm(frames: usize, channels: u16, bits: u16) -> DecodedPcm {
        let samples: Vec<i32> = (0..frames)
            .flat_map(|i| {
                let v = ((i % 200) as i32 - 100) << 24;
                (0..channels).map(move |c| if c == 0 { v } else { -v })
            })
            .collect();
        DecodedPcm {
            samples,
            sample_rate: 8000,
            channels,
            bits_per_sample: bits,
        }
    }

    /// 生成锯齿波 WAV
    fn make_wav(frames: usize, channels: u16, bits: u16) -> Vec<u8> {
        ResampleTransformer::new()
            .encode_wav(&make_pcm(frames, channels, bits))
            .unwrap()
    }

    #[test]
    fn test_wav_roundtrip_header() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(1000, 1, 16);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 2000);

        let pcm = transformer.decode(&wav, AudioContainer::Wav).unwrap();
        assert_eq!(pcm.sample_rate, 8000);
        assert_eq!(pcm.channels, 1);
        assert_eq!(pcm.bits_per_sample, 16);
        assert_eq!(pcm.frames(), 1000);
    }

    #[test]
    fn test_male_lengthens_audio() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(1000, 1, 16);

        let out = transformer
            .transform(&wav, Some(AudioContainer::Wav), Gender::Male)
            .unwrap();

        assert_eq!(out.input_frames, 1000);
        let expected = 1000.0 / 0.85;
        assert!((out.output_frames as f64 - expected).abs() <= 2.0);

        let decoded = transformer.decode(&out.data, AudioContainer::Wav).unwrap();
        assert_eq!(decoded.frames(), out.output_frames);
    }

    #[test]
    fn test_female_shortens_audio() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(1000, 1, 16);

        let out = transformer
            .transform(&wav, Some(AudioContainer::Wav), Gender::Female)
            .unwrap();

        let expected = 1000.0 / 1.15;
        assert!((out.output_frames as f64 - expected).abs() <= 2.0);
        assert_eq!(out.factor, PitchFactor::FEMALE);
    }

    #[test]
    fn test_output_samples_follow_indices() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(500, 1, 16);
        let input = transformer.decode(&wav, AudioContainer::Wav).unwrap();

        let out = transformer
            .transform(&wav, Some(AudioContainer::Wav), Gender::Male)
            .unwrap();
        let output = transformer.decode(&out.data, AudioContainer::Wav).unwrap();

        let indices = resample_indices(500, PitchFactor::MALE);
        let expected: Vec<i32> = indices.iter().map(|&i| input.samples[i]).collect();
        assert_eq!(output.samples, expected);
    }

    #[test]
    fn test_stereo_and_bit_depth_preserved() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(300, 2, 24);

        let out = transformer
            .transform(&wav, Some(AudioContainer::Wav), Gender::Female)
            .unwrap();
        assert_eq!(out.channels, 2);
        assert_eq!(out.bits_per_sample, 24);

        let decoded = transformer.decode(&out.data, AudioContainer::Wav).unwrap();
        assert_eq!(decoded.channels, 2);
        for frame in decoded.samples.chunks(2) {
            assert_eq!(frame[0], -frame[1]);
        }
    }

    #[test]
    fn test_eight_bit_roundtrip() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(101, 1, 8);
        // 奇数长度的 data chunk 需要补齐
        assert_eq!(wav.len() % 2, 0);

        let pcm = transformer.decode(&wav, AudioContainer::Wav).unwrap();
        assert_eq!(pcm.bits_per_sample, 8);
        assert_eq!(pcm.frames(), 101);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let transformer = ResampleTransformer::new();
        let result = transformer.transform(
            b"this is definitely not a wav file",
            Some(AudioContainer::Wav),
            Gender::Male,
        );
        assert!(matches!(result, Err(TransformError::Decode(_))));
    }

    #[test]
    fn test_flac_transform_roundtrip() {
        let transformer = ResampleTransformer::new();
        let flac = encode_flac(&make_pcm(1000, 2, 16)).unwrap();

        let input = transformer.decode(&flac, AudioContainer::Flac).unwrap();
        assert_eq!(input.frames(), 1000);
        assert_eq!(input.channels, 2);
        assert_eq!(input.sample_rate, 8000);
        assert_eq!(input.bits_per_sample, 16);

        let out = transformer
            .transform(&flac, Some(AudioContainer::Flac), Gender::Male)
            .unwrap();
        assert_eq!(&out.data[0..4], b"fLaC");
        assert_eq!(out.container, AudioContainer::Flac);
        assert_eq!(out.output_frames, 1176);

        let decoded = transformer.decode(&out.data, AudioContainer::Flac).unwrap();
        assert_eq!(decoded.frames(), 1176);
        assert_eq!(decoded.channels, 2);
        assert!(decoded.samples.iter().any(|&s| s != 0));
        for frame in decoded.samples.chunks(2) {
            assert_eq!(frame[0], -frame[1]);
        }
    }

    #[test]
    fn test_flac_from_32_bit_source() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(400, 1, 32);

        // 按内容探测，扩展名只决定输出容器
        let out = transformer
            .transform(&wav, Some(AudioContainer::Flac), Gender::Female)
            .unwrap();
        assert_eq!(out.bits_per_sample, 24);

        let decoded = transformer.decode(&out.data, AudioContainer::Flac).unwrap();
        assert_eq!(decoded.bits_per_sample, 24);
        assert_eq!(decoded.frames(), out.output_frames);
    }

    #[test]
    fn test_ogg_transform_writes_opus() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(8000, 1, 16);

        let out = transformer
            .transform(&wav, Some(AudioContainer::Ogg), Gender::Female)
            .unwrap();

        assert_eq!(&out.data[0..4], b"OggS");
        assert!(out.data.windows(8).any(|w| w == b"OpusHead"));
        assert_eq!(out.container, AudioContainer::Ogg);
        assert_eq!(out.sample_rate, 8000);
        assert_eq!(out.bits_per_sample, 16);
        assert_eq!(out.input_frames, 8000);
        assert_eq!(out.output_frames, resample_indices(8000, PitchFactor::FEMALE).len());
    }

    #[test]
    fn test_mp3_has_no_encoder() {
        let transformer = ResampleTransformer::new();
        assert!(!transformer.supports_container(AudioContainer::Mp3));
        assert!(transformer.supports_container(AudioContainer::Flac));
        assert!(transformer.supports_container(AudioContainer::Ogg));

        let pcm = make_pcm(10, 1, 16);
        assert!(matches!(
            transformer.encode(&pcm, AudioContainer::Mp3),
            Err(TransformError::UnsupportedContainer(_))
        ));
    }

    #[test]
    fn test_unsupported_container() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(100, 1, 16);

        let result = transformer.transform(&wav, Some(AudioContainer::Mp3), Gender::Male);
        assert!(matches!(result, Err(TransformError::UnsupportedContainer(_))));

        let result = transformer.transform(&wav, None, Gender::Male);
        assert!(matches!(result, Err(TransformError::UnsupportedContainer(_))));
    }

    #[test]
    fn test_empty_wav() {
        let transformer = ResampleTransformer::new();
        let wav = make_wav(0, 1, 16);

        let result = transformer.transform(&wav, Some(AudioContainer::Wav), Gender::Male);
        assert!(result.is_err());
    }
}
