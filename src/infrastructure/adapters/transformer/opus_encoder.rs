//! Opus 编码（OGG 容器）
//!
//! 按 RFC 7845 封装：OpusHead、OpusTags 各占一页，之后为 20ms 音频包。

use ogg::writing::PacketWriter;
use opus::{Application, Channels, Encoder};

use super::resample_transformer::DecodedPcm;
use crate::application::ports::TransformError;

/// 输出比特率（语音）
const OPUS_BITRATE: i32 = 64_000;

/// Opus 包最大字节数
const MAX_PACKET_SIZE: usize = 4000;

/// granule position 固定以 48kHz 计
const GRANULE_RATE: u32 = 48_000;

const VENDOR: &str = "voiceforge";

/// 将 PCM 编码为 Ogg Opus
///
/// 仅支持单声道和立体声；采样率不在 Opus 支持范围内时先线性重采样。
pub fn encode_ogg_opus(pcm: &DecodedPcm) -> Result<Vec<u8>, TransformError> {
    let (channels, channel_count) = match pcm.channels {
        1 => (Channels::Mono, 1usize),
        2 => (Channels::Stereo, 2usize),
        n => {
            return Err(TransformError::Encode(format!(
                "Opus supports mono or stereo only, got {} channels",
                n
            )))
        }
    };

    let sample_rate = opus_compatible_sample_rate(pcm.sample_rate);
    let pcm_i16: Vec<i16> = pcm.samples.iter().map(|&s| (s >> 16) as i16).collect();
    let samples = resample_linear(&pcm_i16, pcm.sample_rate, sample_rate, channel_count);

    let mut encoder = Encoder::new(sample_rate, channels, Application::Voip)
        .map_err(|e| TransformError::Encode(format!("Failed to create Opus encoder: {}", e)))?;
    encoder
        .set_bitrate(opus::Bitrate::Bits(OPUS_BITRATE))
        .map_err(|e| TransformError::Encode(format!("Failed to set bitrate: {}", e)))?;

    let granule_scale = (GRANULE_RATE / sample_rate) as u64;
    let lookahead = encoder.get_lookahead().map(|l| l as u64).unwrap_or(312);
    let pre_skip = u16::try_from(lookahead * granule_scale).unwrap_or(u16::MAX);

    // 20ms 帧
    let frame_size = sample_rate as usize / 50;
    let samples_per_frame = frame_size * channel_count;
    let frame_granule = frame_size as u64 * granule_scale;
    let flush_frames = (lookahead as usize).div_ceil(frame_size);

    let mut ogg_data = Vec::new();
    {
        let mut writer = PacketWriter::new(&mut ogg_data);

        writer
            .write_packet(
                opus_head(channel_count as u8, pcm.sample_rate, pre_skip),
                0,
                ogg::PacketWriteEndInfo::EndPage,
                0,
            )
            .map_err(|e| TransformError::Encode(format!("Failed to write Opus head: {}", e)))?;
        writer
            .write_packet(opus_tags(), 0, ogg::PacketWriteEndInfo::EndPage, 0)
            .map_err(|e| TransformError::Encode(format!("Failed to write Opus tags: {}", e)))?;

        let mut output_buf = vec![0u8; MAX_PACKET_SIZE];
        let mut granule_pos = pre_skip as u64;
        let silence = vec![0i16; samples_per_frame];

        let audio_frames = samples.chunks(samples_per_frame).map(|chunk| {
            let mut frame = chunk.to_vec();
            frame.resize(samples_per_frame, 0);
            frame
        });
        let flush = std::iter::repeat(silence).take(flush_frames);
        let mut frames = audio_frames.chain(flush).peekable();

        // 编码器缓存的 lookahead 样本需要额外的静音帧冲出
        while let Some(frame) = frames.next() {
            let len = encoder
                .encode(&frame, &mut output_buf)
                .map_err(|e| TransformError::Encode(format!("Opus encode failed: {}", e)))?;
            granule_pos += frame_granule;

            let end_info = if frames.peek().is_none() {
                ogg::PacketWriteEndInfo::EndStream
            } else {
                ogg::PacketWriteEndInfo::NormalPacket
            };
            writer
                .write_packet(output_buf[..len].to_vec(), 0, end_info, granule_pos)
                .map_err(|e| {
                    TransformError::Encode(format!("Failed to write Opus packet: {}", e))
                })?;
        }
    }

    Ok(ogg_data)
}

/// 向上取最近的 Opus 采样率
fn opus_compatible_sample_rate(sample_rate: u32) -> u32 {
    match sample_rate {
        r if r <= 8_000 => 8_000,
        r if r <= 12_000 => 12_000,
        r if r <= 16_000 => 16_000,
        r if r <= 24_000 => 24_000,
        _ => 48_000,
    }
}

/// 简单线性重采样（交织样本）
fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32, channels: usize) -> Vec<i16> {
    let frame_count = samples.len() / channels;
    if from_rate == to_rate || frame_count == 0 {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_frame_count = (frame_count as f64 * ratio) as usize;
    let last = frame_count - 1;
    let mut resampled = Vec::with_capacity(new_frame_count * channels);

    for i in 0..new_frame_count {
        let src_pos = i as f64 / ratio;
        let src_idx = (src_pos as usize).min(last);
        let frac = src_pos - src_idx as f64;
        let next_idx = (src_idx + 1).min(last);

        for ch in 0..channels {
            let s0 = samples[src_idx * channels + ch] as f64;
            let s1 = samples[next_idx * channels + ch] as f64;
            resampled.push((s0 + (s1 - s0) * frac).round() as i16);
        }
    }

    resampled
}

/// OpusHead 包
fn opus_head(channels: u8, input_sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // 版本
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&input_sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // 输出增益
    head.push(0); // 声道映射族 0
    head
}

/// OpusTags 包，无用户注释
fn opus_tags() -> Vec<u8> {
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
    tags.extend_from_slice(VENDOR.as_bytes());
    tags.extend_from_slice(&0u32.to_le_bytes());
    tags
}
