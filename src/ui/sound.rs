/// Sound engine: procedural ambience and effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Effects are fire-and-forget; the music loop keeps its own Sink so it can
/// be stopped on teardown.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::{debug, warn};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
        music_volume: f32,
        effects_volume: f32,
        bgm: Arc<Vec<u8>>,
        sfx_blip: Arc<Vec<u8>>,
        sfx_static: Arc<Vec<u8>>,
        sfx_chime: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(music_volume: f32, effects_volume: f32) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output device; running silent");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                music: None,
                music_volume,
                effects_volume,
                bgm: Arc::new(make_wav(&gen_drone())),
                sfx_blip: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.5))),
                sfx_static: Arc::new(make_wav(&gen_static())),
                sfx_chime: Arc::new(make_wav(&gen_chime())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.set_volume(self.effects_volume);
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Start the background loop. No-op if it is already playing.
        pub fn start_music(&mut self) {
            if self.music.is_some() {
                return;
            }
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "could not open music sink");
                    return;
                }
            };
            let cursor = Cursor::new(self.bgm.as_ref().clone());
            match rodio::Decoder::new(cursor) {
                Ok(src) => {
                    sink.set_volume(self.music_volume);
                    sink.append(src.repeat_infinite());
                    debug!(volume = self.music_volume, "music started");
                    self.music = Some(sink);
                }
                Err(e) => warn!(error = %e, "could not decode music loop"),
            }
        }

        pub fn stop_music(&mut self) {
            if let Some(sink) = self.music.take() {
                sink.stop();
                debug!("music stopped");
            }
        }

        pub fn play_keystroke(&self) { self.play(&self.sfx_blip); }
        pub fn play_static(&self) { self.play(&self.sfx_static); }
        pub fn play_chime(&self) { self.play(&self.sfx_chime); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * 2.0 * PI).sin() * env * volume
            })
            .collect()
    }

    /// Eight-second ambient drone: a detuned low fifth with a slow swell.
    /// Every partial completes whole cycles over the buffer, so it loops cleanly.
    fn gen_drone() -> Vec<f32> {
        let duration = 8.0;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let voices = [(110.0_f32, 0.35), (110.5, 0.25), (165.0, 0.2), (220.0, 0.1)];
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let swell = 0.6 + 0.4 * (t * 2.0 * PI / duration).sin();
                let wave: f32 = voices.iter()
                    .map(|&(f, a)| (t * f * 2.0 * PI).sin() * a)
                    .sum();
                wave * swell * 0.5
            })
            .collect()
    }

    /// Static burst: filtered noise with a fast decay
    fn gen_static() -> Vec<f32> {
        let duration = 0.35;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x9e37_79b9;
        let mut last = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                last = last * 0.4 + noise * 0.6;
                let crackle = if rng % 97 == 0 { 0.8 } else { 0.0 };
                (last + crackle) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Decryption complete: soft two-note bell
    fn gen_chime() -> Vec<f32> {
        let pairs = [(1047.0_f32, 0.12), (1568.0, 0.45)]; // C6, G6
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (-(i as f32 / n as f32) * 4.0).exp();
                let wave = (t * freq * 2.0 * PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_describes_payload() {
            let wav = make_wav(&[0.0, 1.0, -1.0]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
            assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), 32767);
        }

        #[test]
        fn generated_sounds_stay_in_range() {
            for samples in [gen_drone(), gen_static(), gen_chime(), gen_blip(440.0, 0.05, 0.5)] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }

        #[test]
        fn drone_loops_without_a_click() {
            let d = gen_drone();
            let (first, last) = (d[0], d[d.len() - 1]);
            assert!((first - last).abs() < 0.05, "{first} vs {last}");
        }

        #[test]
        fn decoder_accepts_generated_wav() {
            let wav = make_wav(&gen_chime());
            assert!(rodio::Decoder::new(Cursor::new(wav)).is_ok());
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_music_volume: f32, _effects_volume: f32) -> Option<Self> { Some(SoundEngine) }
    pub fn start_music(&mut self) {}
    pub fn stop_music(&mut self) {}
    pub fn play_keystroke(&self) {}
    pub fn play_static(&self) {}
    pub fn play_chime(&self) {}
}
