//! FLAC 编码
//!
//! 只输出 VERBATIM 子帧（不做预测压缩），保证任何 FLAC 解码器都能读取。
//! 固定块大小，STREAMINFO 中的 MD5 置零（表示未知）。

use super::resample_transformer::DecodedPcm;
use crate::application::ports::TransformError;

/// 每帧样本数（单声道）
const BLOCK_SIZE: usize = 4096;

/// STREAMINFO 采样率字段为 20 bit
const MAX_SAMPLE_RATE: u32 = 655_350;

/// FLAC 支持的最大声道数
const MAX_CHANNELS: u16 = 8;

/// 按位写入（高位在前）
struct BitWriter {
    bytes: Vec<u8>,
    acc: u64,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    /// 写入 `value` 的低 `n` 位，`n <= 32`
    fn write(&mut self, value: u64, n: u32) {
        debug_assert!(n <= 32);
        let mask = (1u64 << n) - 1;
        self.acc = (self.acc << n) | (value & mask);
        self.bits += n;
        while self.bits >= 8 {
            self.bits -= 8;
            self.bytes.push((self.acc >> self.bits) as u8);
        }
        self.acc &= (1u64 << self.bits) - 1;
    }

    /// 补零到字节边界
    fn align(&mut self) {
        if self.bits > 0 {
            self.write(0, 8 - self.bits);
        }
    }

    fn into_bytes(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x8005
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// 帧头采样率编码：(4 bit 代码, 尾随字段值, 尾随字段位数)
fn sample_rate_code(rate: u32) -> (u64, u64, u32) {
    match rate {
        88_200 => (0b0001, 0, 0),
        176_400 => (0b0010, 0, 0),
        192_000 => (0b0011, 0, 0),
        8_000 => (0b0100, 0, 0),
        16_000 => (0b0101, 0, 0),
        22_050 => (0b0110, 0, 0),
        24_000 => (0b0111, 0, 0),
        32_000 => (0b1000, 0, 0),
        44_100 => (0b1001, 0, 0),
        48_000 => (0b1010, 0, 0),
        96_000 => (0b1011, 0, 0),
        r if r % 1000 == 0 && r / 1000 <= 0xFF => (0b1100, (r / 1000) as u64, 8),
        r if r <= 0xFFFF => (0b1101, r as u64, 16),
        r if r % 10 == 0 && r / 10 <= 0xFFFF => (0b1110, (r / 10) as u64, 16),
        // 从 STREAMINFO 读取
        _ => (0b0000, 0, 0),
    }
}

fn sample_size_code(bits: u16) -> u64 {
    match bits {
        8 => 0b001,
        16 => 0b100,
        _ => 0b110,
    }
}

/// 帧号的 UTF-8 式变长编码
fn push_coded_number(out: &mut Vec<u8>, n: u32) {
    if n < 0x80 {
        out.push(n as u8);
        return;
    }

    let continuation = match n {
        0..=0x7FF => 1,
        0x800..=0xFFFF => 2,
        0x1_0000..=0x1F_FFFF => 3,
        0x20_0000..=0x3FF_FFFF => 4,
        _ => 5,
    };
    let lead_marker: u8 = !(0xFFu8 >> (continuation + 1));
    out.push(lead_marker | (n >> (6 * continuation)) as u8);
    for i in (0..continuation).rev() {
        out.push(0x80 | ((n >> (6 * i)) & 0x3F) as u8);
    }
}

/// 将 PCM 编码为 FLAC
///
/// 位深取 8 / 16 / 24，32-bit 源降为 24-bit。
pub fn encode_flac(pcm: &DecodedPcm) -> Result<Vec<u8>, TransformError> {
    let channels = pcm.channels;
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(TransformError::Encode(format!(
            "FLAC supports 1-{} channels, got {}",
            MAX_CHANNELS, channels
        )));
    }
    if pcm.sample_rate == 0 || pcm.sample_rate > MAX_SAMPLE_RATE {
        return Err(TransformError::Encode(format!(
            "Unsupported FLAC sample rate: {}",
            pcm.sample_rate
        )));
    }

    let bits = flac_bits(pcm.bits_per_sample);
    let shift = 32 - bits as u32;
    let channel_count = channels as usize;
    let total_frames = pcm.frames() as u64;
    if total_frames >= 1 << 36 {
        return Err(TransformError::Encode("Audio too large for FLAC".to_string()));
    }

    let mut flac = Vec::new();
    flac.extend_from_slice(b"fLaC");

    // STREAMINFO（唯一的元数据块）
    flac.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    let mut info = BitWriter::new();
    info.write(BLOCK_SIZE as u64, 16);
    info.write(BLOCK_SIZE as u64, 16);
    info.write(0, 24); // 最小帧长：未知
    info.write(0, 24); // 最大帧长：未知
    info.write(pcm.sample_rate as u64, 20);
    info.write((channels - 1) as u64, 3);
    info.write((bits - 1) as u64, 5);
    info.write(total_frames >> 32, 4);
    info.write(total_frames & 0xFFFF_FFFF, 32);
    flac.extend_from_slice(&info.into_bytes());
    flac.extend_from_slice(&[0u8; 16]);

    let (rate_code, rate_trailer, rate_trailer_bits) = sample_rate_code(pcm.sample_rate);
    let frame_samples = BLOCK_SIZE * channel_count;

    for (frame_number, block) in pcm.samples.chunks(frame_samples).enumerate() {
        let block_frames = block.len() / channel_count;
        if block_frames == 0 {
            break;
        }

        let mut header = BitWriter::new();
        header.write(0b11_1111_1111_1110, 14);
        header.write(0, 1); // 保留
        header.write(0, 1); // 固定块大小
        header.write(0b0111, 4); // 块大小写在帧头末尾（16 bit）
        header.write(rate_code, 4);
        header.write((channels - 1) as u64, 4); // 各声道独立
        header.write(sample_size_code(bits), 3);
        header.write(0, 1);
        let mut frame = header.into_bytes();

        push_coded_number(&mut frame, frame_number as u32);
        frame.extend_from_slice(&((block_frames - 1) as u16).to_be_bytes());
        match rate_trailer_bits {
            8 => frame.push(rate_trailer as u8),
            16 => frame.extend_from_slice(&(rate_trailer as u16).to_be_bytes()),
            _ => {}
        }
        frame.push(crc8(&frame));

        let mut body = BitWriter::new();
        for ch in 0..channel_count {
            // 子帧头：填充位 0，类型 VERBATIM，无 wasted bits
            body.write(0b0000_0010, 8);
            for i in 0..block_frames {
                let sample = block[i * channel_count + ch] >> shift;
                body.write(sample as u32 as u64, bits as u32);
            }
        }
        frame.extend_from_slice(&body.into_bytes());

        let crc = crc16(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());
        flac.extend_from_slice(&frame);
    }

    Ok(flac)
}

/// FLAC 输出位深
pub fn flac_bits(bits_per_sample: u16) -> u16 {
    match bits_per_sample {
        8 | 16 | 24 => bits_per_sample,
        b if b < 8 => 8,
        b if b < 16 => 16,
        _ => 24,
    }
}
