//! WAV container helpers.
//!
//! Generates the standard 44-byte RIFF header written in front of the sample
//! bytes and patches its size fields once the recording is finalized.

use crate::models::audio_models::AudioFormat;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Generate a 44-byte WAV RIFF header for PCM data.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits / 8
/// [32-33]  block_align = channels * bits / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(format: &AudioFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = format.byte_rate() as u32;
    let block_align = format.bytes_per_packet() as u16;

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_chunk_size(data_size as u64).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// RIFF chunk size for a given data size, saturating at the 4 GiB field limit.
pub fn riff_chunk_size(data_size: u64) -> u32 {
    (data_size + WAV_HEADER_SIZE as u64 - 8).min(u32::MAX as u64) as u32
}

/// Data sub-chunk size, saturating at the 4 GiB field limit.
pub fn data_chunk_size(data_size: u64) -> u32 {
    data_size.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(header: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([header[offset], header[offset + 1]])
    }

    fn u32_at(header: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            header[offset],
            header[offset + 1],
            header[offset + 2],
            header[offset + 3],
        ])
    }

    #[test]
    fn header_magic() {
        let header = generate_wav_header(&AudioFormat::pcm(44_100, 1, 16), 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16_at(&header, 20), 1);
        assert_eq!(u32_at(&header, 16), 16);
    }

    #[test]
    fn header_16khz_mono_16bit() {
        let header = generate_wav_header(&AudioFormat::pcm(16_000, 1, 16), 32_000);

        assert_eq!(u16_at(&header, 22), 1);
        assert_eq!(u32_at(&header, 24), 16_000);
        assert_eq!(u32_at(&header, 28), 32_000);
        assert_eq!(u16_at(&header, 32), 2);
        assert_eq!(u16_at(&header, 34), 16);
        assert_eq!(u32_at(&header, 40), 32_000);
        assert_eq!(u32_at(&header, 4), 36 + 32_000);
    }

    #[test]
    fn header_stereo_8bit() {
        let header = generate_wav_header(&AudioFormat::pcm(8_000, 2, 8), 0);
        assert_eq!(u32_at(&header, 28), 16_000);
        assert_eq!(u16_at(&header, 32), 2);
        assert_eq!(u16_at(&header, 34), 8);
    }

    #[test]
    fn sizes_saturate() {
        assert_eq!(data_chunk_size(u64::MAX), u32::MAX);
        assert_eq!(riff_chunk_size(u32::MAX as u64), u32::MAX);
        assert_eq!(riff_chunk_size(100), 136);
    }
}
