//! Audio loading and format conversion

use std::fs::File;
use std::path::Path;

use hound::WavReader;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::AudioInfo;

/// Audio processing errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Resampling error: {0}")]
    Resample(String),

    #[error("Decoding error: {0}")]
    Decode(String),
}

/// Decoded audio samples
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Sample data (mono, f32)
    pub samples: Vec<f32>,
    /// Sample rate
    pub sample_rate: u32,
}

impl AudioData {
    /// Get the duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Convert samples to 16-bit PCM, as required by the diarization models
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect()
    }
}

/// Decodes audio files to mono f32 at a fixed target sample rate
pub struct AudioProcessor {
    /// Target sample rate
    target_sample_rate: u32,
}

impl AudioProcessor {
    /// Create a new audio processor
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Get audio file information
    pub fn get_info<P: AsRef<Path>>(&self, path: P) -> Result<AudioInfo, AudioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        // Use hound for WAV files (faster)
        if extension.as_deref() == Some("wav") {
            let reader = WavReader::open(path)?;
            let spec = reader.spec();
            let duration = reader.duration() as f64 / spec.sample_rate as f64;

            return Ok(AudioInfo {
                path: path.display().to_string(),
                duration,
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                bits_per_sample: spec.bits_per_sample,
            });
        }

        // Use symphonia for other formats
        self.get_info_symphonia(path)
    }

    fn get_info_symphonia<P: AsRef<Path>>(&self, path: P) -> Result<AudioInfo, AudioError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::Decode("No audio track found".to_string()))?;

        let codec_params = &track.codec_params;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::Decode("Missing sample rate".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2);

        let bits_per_sample = codec_params.bits_per_sample.unwrap_or(16) as u16;

        let duration = if let Some(n_frames) = codec_params.n_frames {
            n_frames as f64 / sample_rate as f64
        } else {
            0.0
        };

        Ok(AudioInfo {
            path: path.display().to_string(),
            duration,
            sample_rate,
            channels,
            bits_per_sample,
        })
    }

    /// Load an audio file as mono f32 at the target sample rate
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<AudioData, AudioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("wav") => self.load_wav(path),
            Some("mp3") | Some("m4a") | Some("aac") | Some("flac") | Some("ogg")
            | Some("mp4") | Some("webm") => self.load_symphonia(path),
            Some(ext) => Err(AudioError::UnsupportedFormat(ext.to_string())),
            None => Err(AudioError::UnsupportedFormat("unknown".to_string())),
        }
    }

    fn load_symphonia<P: AsRef<Path>>(&self, path: P) -> Result<AudioData, AudioError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::Decode("Missing sample rate".to_string()))?;

        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut all_samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    tracing::warn!("Decode warning: {}", e);
                    continue;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Packet decode error: {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;

            let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
            sample_buf.copy_interleaved_ref(decoded);

            let samples = sample_buf.samples();

            // Convert to mono
            if channels == 1 {
                all_samples.extend_from_slice(samples);
            } else {
                for chunk in samples.chunks(channels) {
                    let sum: f32 = chunk.iter().sum();
                    all_samples.push(sum / channels as f32);
                }
            }
        }

        let final_samples = if sample_rate != self.target_sample_rate {
            self.resample(&all_samples, sample_rate, self.target_sample_rate)?
        } else {
            all_samples
        };

        Ok(AudioData {
            samples: final_samples,
            sample_rate: self.target_sample_rate,
        })
    }

    fn load_wav<P: AsRef<Path>>(&self, path: P) -> Result<AudioData, AudioError> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max_val = (1 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        };

        // Downmix to mono
        let mono_samples = if spec.channels == 2 {
            samples
                .chunks(2)
                .map(|chunk| (chunk[0] + chunk[1]) / 2.0)
                .collect()
        } else if spec.channels == 1 {
            samples
        } else {
            samples
                .chunks(spec.channels as usize)
                .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
                .collect()
        };

        let final_samples = if spec.sample_rate != self.target_sample_rate {
            self.resample(&mono_samples, spec.sample_rate, self.target_sample_rate)?
        } else {
            mono_samples
        };

        Ok(AudioData {
            samples: final_samples,
            sample_rate: self.target_sample_rate,
        })
    }

    fn resample(
        &self,
        samples: &[f32],
        from_rate: u32,
        to_rate: u32,
    ) -> Result<Vec<f32>, AudioError> {
        use rubato::{FftFixedInOut, Resampler};

        let ratio = to_rate as f64 / from_rate as f64;
        let chunk_size = 1024;

        let mut resampler =
            FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, chunk_size, 1)
                .map_err(|e| AudioError::Resample(e.to_string()))?;

        let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize);

        for chunk in samples.chunks(chunk_size) {
            if chunk.len() == chunk_size {
                let input = vec![chunk.to_vec()];
                let result = resampler
                    .process(&input, None)
                    .map_err(|e| AudioError::Resample(e.to_string()))?;
                output.extend_from_slice(&result[0]);
            }
        }

        // Pad and process the trailing partial chunk
        let remaining = samples.len() % chunk_size;
        if remaining > 0 {
            let mut padded = samples[samples.len() - remaining..].to_vec();
            padded.resize(chunk_size, 0.0);
            let input = vec![padded];
            let result = resampler
                .process(&input, None)
                .map_err(|e| AudioError::Resample(e.to_string()))?;
            let output_remaining = (remaining as f64 * ratio) as usize;
            output.extend_from_slice(&result[0][..output_remaining.min(result[0].len())]);
        }

        Ok(output)
    }
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new(16000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_test_wav(path: &Path, sample_rate: u32, samples: &[i16]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_wav_at_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, 16000, &vec![0i16; 16000]);

        let processor = AudioProcessor::new(16000);
        let audio = processor.load(&path).unwrap();

        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples.len(), 16000);
        assert!((audio.duration() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_get_info_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, 8000, &vec![0i16; 4000]);

        let processor = AudioProcessor::default();
        let info = processor.get_info(&path).unwrap();

        assert_eq!(info.sample_rate, 8000);
        assert_eq!(info.channels, 1);
        assert!((info.duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not audio").unwrap();

        let processor = AudioProcessor::default();
        assert!(matches!(
            processor.load(&path),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_to_i16_clamps() {
        let audio = AudioData {
            samples: vec![0.0, 1.0, -1.0, 2.0],
            sample_rate: 16000,
        };
        let pcm = audio.to_i16();
        assert_eq!(pcm[0], 0);
        assert_eq!(pcm[1], i16::MAX);
        assert_eq!(pcm[3], i16::MAX);
    }
}
