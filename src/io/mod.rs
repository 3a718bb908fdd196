//! Decoding and encoding of audio files.
//!
//! WAV is handled in-process with hound; other containers are decoded with
//! symphonia, and MP3 output goes through an external encoder binary.

pub mod decode;
pub mod transcode;
pub mod wav;

use std::path::Path;

use tracing::info;

use crate::core::SampleBuffer;
use crate::error::PitchError;
use crate::orchestrator::VoiceChanger;

pub use transcode::Transcoder;

/// Container formats the crate can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    Wav,
    Mp3,
}

impl OutputContainer {
    /// Picks the container from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, PitchError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("wav") => Ok(OutputContainer::Wav),
            Some("mp3") => Ok(OutputContainer::Mp3),
            _ => Err(PitchError::UnsupportedFormat(format!(
                "cannot write {} (expected .wav or .mp3)",
                path.display()
            ))),
        }
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// Reads an audio file: WAV keeps its stored sample format, anything else is
/// decoded to Float32.
pub fn read_audio_file(path: &Path) -> Result<SampleBuffer, PitchError> {
    if is_wav(path) {
        wav::read_wav_file(path)
    } else {
        decode::decode_file(path)
    }
}

/// Writes `buffer` to `path`. MP3 output requires a transcoder.
pub fn write_audio_file(
    path: &Path,
    buffer: &SampleBuffer,
    transcoder: Option<&Transcoder>,
) -> Result<(), PitchError> {
    match OutputContainer::from_path(path)? {
        OutputContainer::Wav => wav::write_wav_file(path, buffer),
        OutputContainer::Mp3 => match transcoder {
            Some(t) => t.encode_mp3(buffer, path),
            None => Err(PitchError::EncodeFailure(format!(
                "no MP3 encoder configured for {}",
                path.display()
            ))),
        },
    }
}

/// Decodes `input`, applies `preset` and encodes the result to `output`.
/// Returns the decoded input and the shifted output.
pub fn shift_audio_file(
    input: &Path,
    output: &Path,
    preset: &str,
    changer: &VoiceChanger,
    transcoder: Option<&Transcoder>,
) -> Result<(SampleBuffer, SampleBuffer), PitchError> {
    // Fail on an unwritable container before doing any work.
    OutputContainer::from_path(output)?;

    let source = read_audio_file(input)?;
    info!(
        input = %input.display(),
        channels = source.channels(),
        sample_rate = source.sample_rate(),
        duration_secs = source.duration_secs(),
        "decoded input"
    );

    let shifted = changer.shift_pitch(&source, preset)?;
    write_audio_file(output, &shifted, transcoder)?;
    info!(
        output = %output.display(),
        preset,
        duration_secs = shifted.duration_secs(),
        "wrote output"
    );
    Ok((source, shifted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_container_from_path() {
        assert_eq!(
            OutputContainer::from_path(Path::new("out.WAV")).unwrap(),
            OutputContainer::Wav
        );
        assert_eq!(
            OutputContainer::from_path(Path::new("dir/out.mp3")).unwrap(),
            OutputContainer::Mp3
        );
        assert!(matches!(
            OutputContainer::from_path(Path::new("out.flac")),
            Err(PitchError::UnsupportedFormat(_))
        ));
        assert!(OutputContainer::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_mp3_without_transcoder() {
        let buffer = SampleBuffer::from_f32(1, 44100, vec![0.0; 16]).unwrap();
        assert!(matches!(
            write_audio_file(Path::new("out.mp3"), &buffer, None),
            Err(PitchError::EncodeFailure(_))
        ));
    }

    #[test]
    fn test_shift_audio_file_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let samples: Vec<i16> = (0..44100)
            .map(|i| {
                let t = i as f32 / 44100.0;
                (8000.0 * (std::f32::consts::TAU * 220.0 * t).sin()) as i16
            })
            .collect();
        wav::write_wav_file(&input, &SampleBuffer::from_i16(1, 44100, samples).unwrap()).unwrap();

        let changer = VoiceChanger::default();
        let (source, shifted) =
            shift_audio_file(&input, &output, "Deep Voice", &changer, None).unwrap();
        assert_eq!(source.frame_count(), 44100);

        let written = wav::read_wav_file(&output).unwrap();
        assert_eq!(written, shifted);
        assert!(written.frame_count() > source.frame_count());
    }

    #[test]
    fn test_shift_audio_file_rejects_unknown_output() {
        let dir = tempfile::tempdir().unwrap();
        let result = shift_audio_file(
            &dir.path().join("missing.wav"),
            &dir.path().join("out.ogg"),
            "Deep Voice",
            &VoiceChanger::default(),
            None,
        );
        assert!(matches!(result, Err(PitchError::UnsupportedFormat(_))));
    }
}
