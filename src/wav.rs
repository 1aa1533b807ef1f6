//! Minimal RIFF/WAVE reading and writing for replay and test material.

use crate::audio::{to_i16, CHANNELS};
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug)]
pub enum WavError {
    Io(io::Error),
    NotWave,
    BadFmt,
    MissingData,
    Unsupported { format: u16, bits: u16 },
}

impl fmt::Display for WavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "wav io: {e}"),
            Self::NotWave => write!(f, "not a RIFF/WAVE file"),
            Self::BadFmt => write!(f, "invalid fmt chunk"),
            Self::MissingData => write!(f, "missing data chunk"),
            Self::Unsupported { format, bits } => {
                write!(f, "unsupported wav format {format} with {bits} bits (want PCM16 or Float32)")
            }
        }
    }
}

impl std::error::Error for WavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WavError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Decoded audio as stereo pairs; mono input is duplicated onto both channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<[i16; CHANNELS]>,
}

impl WavAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate_hz.max(1) as f64
    }
}

pub fn read_wav(path: &Path) -> Result<WavAudio, WavError> {
    parse_wav(&fs::read(path)?)
}

pub fn parse_wav(bytes: &[u8]) -> Result<WavAudio, WavError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format = 0u16;
    let mut channels = 0u16;
    let mut sample_rate_hz = 0u32;
    let mut bits = 0u16;
    let mut data: Option<&[u8]> = None;

    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]])
            as usize;
        let start = pos + 8;
        let end = start.saturating_add(size).min(bytes.len());

        if id == b"fmt " {
            if end - start < 16 {
                return Err(WavError::BadFmt);
            }
            let c = &bytes[start..end];
            format = u16::from_le_bytes([c[0], c[1]]);
            channels = u16::from_le_bytes([c[2], c[3]]);
            sample_rate_hz = u32::from_le_bytes([c[4], c[5], c[6], c[7]]);
            bits = u16::from_le_bytes([c[14], c[15]]);
        } else if id == b"data" {
            data = Some(&bytes[start..end]);
        }

        pos = start.saturating_add(size) + (size % 2);
    }

    let data = data.ok_or(WavError::MissingData)?;
    if channels == 0 || sample_rate_hz == 0 {
        return Err(WavError::BadFmt);
    }
    let ch = channels as usize;

    let samples = match (format, bits) {
        (1, 16) => data
            .chunks_exact(2 * ch)
            .map(|frame| {
                let at = |c: usize| i16::from_le_bytes([frame[2 * c], frame[2 * c + 1]]);
                let left = at(0);
                [left, if ch > 1 { at(1) } else { left }]
            })
            .collect(),
        (3, 32) => data
            .chunks_exact(4 * ch)
            .map(|frame| {
                let at = |c: usize| {
                    let o = 4 * c;
                    to_i16(f32::from_le_bytes([frame[o], frame[o + 1], frame[o + 2], frame[o + 3]]))
                };
                let left = at(0);
                [left, if ch > 1 { at(1) } else { left }]
            })
            .collect(),
        (format, bits) => return Err(WavError::Unsupported { format, bits }),
    };

    Ok(WavAudio {
        sample_rate_hz,
        samples,
    })
}

/// Writes interleaved stereo PCM16.
pub fn write_wav_i16_stereo(
    path: &Path,
    sample_rate_hz: u32,
    samples: &[[i16; CHANNELS]],
) -> Result<(), WavError> {
    let mut w = BufWriter::new(fs::File::create(path)?);

    let channels = CHANNELS as u16;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate_hz * channels as u32 * bits_per_sample as u32 / 8;
    let block_align = channels * bits_per_sample / 8;
    let data_bytes = (samples.len() * CHANNELS * std::mem::size_of::<i16>()) as u32;
    let riff_size = 4 + 8 + 16 + 8 + data_bytes;

    w.write_all(b"RIFF")?;
    w.write_all(&riff_size.to_le_bytes())?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?; // PCM
    w.write_all(&channels.to_le_bytes())?;
    w.write_all(&sample_rate_hz.to_le_bytes())?;
    w.write_all(&byte_rate.to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())?;

    w.write_all(b"data")?;
    w.write_all(&data_bytes.to_le_bytes())?;
    for pair in samples {
        for s in pair {
            w.write_all(&s.to_le_bytes())?;
        }
    }

    w.flush()?;
    Ok(())
}
