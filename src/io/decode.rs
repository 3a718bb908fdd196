//! Compressed-audio decoding using symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as DecodedSamples;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::core::SampleBuffer;
use crate::error::PitchError;

fn decode_error(context: &str, err: impl std::fmt::Display) -> PitchError {
    PitchError::DecodeFailure(format!("{}: {}", context, err))
}

/// Decodes an audio file (MP3, WAV, FLAC, OGG) into interleaved Float32
/// samples, keeping the source channel count and sample rate.
pub fn decode_file(path: &Path) -> Result<SampleBuffer, PitchError> {
    let file = File::open(path)
        .map_err(|e| PitchError::IoError(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error("failed to probe format", e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PitchError::DecodeFailure("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| PitchError::DecodeFailure("unknown sample rate".to_string()))?;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error("failed to create decoder", e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(decode_error("error reading packet", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(e) => return Err(decode_error("decode error", e)),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count() as u16);
        let mut block = DecodedSamples::<f32>::new(decoded.capacity() as u64, spec);
        block.copy_interleaved_ref(decoded);
        samples.extend_from_slice(block.samples());
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped corrupt packets");
    }

    let channels =
        channels.ok_or_else(|| PitchError::DecodeFailure("unknown channel layout".to_string()))?;
    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = samples.len(),
        "decoded audio file"
    );
    SampleBuffer::from_f32(channels, sample_rate, samples)
        .map_err(|e| decode_error("decoded stream is malformed", e))
}
