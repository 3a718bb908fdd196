use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::core::{SampleBuffer, SampleData, SampleFormat};
use crate::error::PitchError;

fn decode_error(err: hound::Error) -> PitchError {
    match err {
        hound::Error::Unsupported => {
            PitchError::UnsupportedFormat("WAV layout not supported by the reader".to_string())
        }
        other => PitchError::DecodeFailure(other.to_string()),
    }
}

fn encode_error(err: hound::Error) -> PitchError {
    PitchError::EncodeFailure(err.to_string())
}

/// Reads a WAV stream.
///
/// 8- and 16-bit integer PCM become [`SampleFormat::Int16`], 24- and 32-bit
/// integer PCM become [`SampleFormat::Int32`] and 32-bit float becomes
/// [`SampleFormat::Float32`]. Narrower integers are scaled up to full range.
pub fn read_wav<R: Read>(reader: R) -> Result<SampleBuffer, PitchError> {
    let reader = hound::WavReader::new(reader).map_err(decode_error)?;
    let spec = reader.spec();

    let data = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, bits @ (8 | 16)) => {
            let shift = 16 - bits;
            let samples = reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v << shift))
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_error)?;
            SampleData::I16(samples)
        }
        (hound::SampleFormat::Int, bits @ (24 | 32)) => {
            let shift = 32 - bits;
            let samples = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v << shift))
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_error)?;
            SampleData::I32(samples)
        }
        (hound::SampleFormat::Float, 32) => {
            let samples = reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(decode_error)?;
            SampleData::F32(samples)
        }
        (format, bits) => {
            return Err(PitchError::UnsupportedFormat(format!(
                "WAV {:?} with {} bits per sample",
                format, bits
            )))
        }
    };

    SampleBuffer::new(spec.channels, spec.sample_rate, data).map_err(|e| match e {
        PitchError::InvalidParameter(msg) => PitchError::DecodeFailure(msg),
        other => other,
    })
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: &Path) -> Result<SampleBuffer, PitchError> {
    let file = File::open(path)
        .map_err(|e| PitchError::IoError(format!("{}: {}", path.display(), e)))?;
    read_wav(BufReader::new(file))
}

/// Reads a WAV file held in memory.
pub fn read_wav_bytes(data: &[u8]) -> Result<SampleBuffer, PitchError> {
    read_wav(Cursor::new(data))
}

/// Writes `buffer` as WAV in its own sample format.
pub fn write_wav<W: Write + Seek>(writer: W, buffer: &SampleBuffer) -> Result<(), PitchError> {
    let format = buffer.sample_format();
    let spec = hound::WavSpec {
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: format.bits_per_sample(),
        sample_format: match format {
            SampleFormat::Float32 => hound::SampleFormat::Float,
            SampleFormat::Int16 | SampleFormat::Int32 => hound::SampleFormat::Int,
        },
    };

    let mut writer = hound::WavWriter::new(writer, spec).map_err(encode_error)?;
    match buffer.samples() {
        SampleData::I16(samples) => {
            for &s in samples {
                writer.write_sample(s).map_err(encode_error)?;
            }
        }
        SampleData::I32(samples) => {
            for &s in samples {
                writer.write_sample(s).map_err(encode_error)?;
            }
        }
        SampleData::F32(samples) => {
            for &s in samples {
                writer.write_sample(s).map_err(encode_error)?;
            }
        }
    }
    writer.finalize().map_err(encode_error)
}

/// Writes `buffer` to a WAV file on disk.
pub fn write_wav_file(path: &Path, buffer: &SampleBuffer) -> Result<(), PitchError> {
    let file = File::create(path)
        .map_err(|e| PitchError::IoError(format!("{}: {}", path.display(), e)))?;
    write_wav(BufWriter::new(file), buffer)
}

/// Encodes `buffer` as an in-memory WAV file.
pub fn write_wav_bytes(buffer: &SampleBuffer) -> Result<Vec<u8>, PitchError> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, buffer)?;
    Ok(cursor.into_inner())
}
