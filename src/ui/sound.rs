/// Sound engine: procedural 8-bit style clips and a looping tune via rodio.
///
/// All clips are generated as in-memory WAV buffers at init time and
/// looked up by name. Each channel plays at most one clip; starting a
/// clip on a busy channel replaces what was playing. Channel 0 carries
/// the background music.
///
/// Without the "sound" feature a silent stub takes its place.

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
pub const MUSIC_CHANNEL: usize = 0;
pub const JUMP_CHANNEL: usize = 1;
pub const SWORD_CHANNEL: usize = 2;
pub const FOOTSTEP_CHANNEL: usize = 3;
pub const PLAYER_CHANNEL: usize = 4;
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
pub const CHANNELS: usize = 5;

/// Which clip a game event plays, and on which channel.
pub fn cue_for(event: &GameEvent) -> Option<(String, usize)> {
    match event {
        GameEvent::Jumped => Some(("jump".into(), JUMP_CHANNEL)),
        GameEvent::SwordSwung => Some(("sword".into(), SWORD_CHANNEL)),
        GameEvent::Footstep(step) => Some((step.clip_name(), FOOTSTEP_CHANNEL)),
        GameEvent::PlayerHurt { .. } => Some(("hurt".into(), PLAYER_CHANNEL)),
        GameEvent::PlayerKilled { .. } => Some(("death".into(), PLAYER_CHANNEL)),
        GameEvent::PlayerRespawned | GameEvent::EnemyDespawned { .. } => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::config::SoundConfig;
    use super::{CHANNELS, MUSIC_CHANNEL};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        clips: HashMap<String, Arc<Vec<u8>>>,
        channels: Vec<Option<Sink>>,
        music_volume: f32,
        sfx_volume: f32,
        music_enabled: bool,
    }

    impl SoundEngine {
        pub fn new(cfg: &SoundConfig) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio device, sound disabled: {e}");
                    return None;
                }
            };

            let clips = clip_library()
                .into_iter()
                .map(|(name, samples)| (name, Arc::new(make_wav(&samples))))
                .collect::<HashMap<_, _>>();
            log::debug!("synthesized {} audio clips", clips.len());

            Some(SoundEngine {
                _stream: stream,
                handle,
                clips,
                channels: (0..CHANNELS).map(|_| None).collect(),
                music_volume: cfg.music_volume.clamp(0.0, 1.0),
                sfx_volume: cfg.sfx_volume.clamp(0.0, 1.0),
                music_enabled: cfg.music,
            })
        }

        /// Play `name` on `channel`, replacing whatever it was playing.
        pub fn play_audio_clip(&mut self, name: &str, channel: usize) {
            self.start(name, channel, self.sfx_volume, false);
        }

        /// Loop `name` forever on the music channel.
        pub fn play_background_music(&mut self, name: &str) {
            if !self.music_enabled {
                return;
            }
            self.start(name, MUSIC_CHANNEL, self.music_volume, true);
        }

        fn start(&mut self, name: &str, channel: usize, volume: f32, looped: bool) {
            let Some(buf) = self.clips.get(name) else {
                log::warn!("unknown audio clip '{name}'");
                return;
            };
            let Some(slot) = self.channels.get_mut(channel) else {
                log::warn!("audio channel {channel} out of range");
                return;
            };
            if let Some(old) = slot.take() {
                old.stop();
            }

            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("audio sink unavailable: {e}");
                    return;
                }
            };
            let cursor = Cursor::new(buf.as_ref().clone());
            match rodio::Decoder::new(cursor) {
                Ok(src) if looped => sink.append(src.repeat_infinite()),
                Ok(src) => sink.append(src),
                Err(e) => {
                    log::warn!("audio clip '{name}' failed to decode: {e}");
                    return;
                }
            }
            sink.set_volume(volume);
            *slot = Some(sink);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Clip library: every named clip, as mono f32 samples
    // ════════════════════════════════════════════════════════════

    pub(super) fn clip_library() -> Vec<(String, Vec<f32>)> {
        let mut clips = vec![
            ("jump".to_string(), gen_jump()),
            ("sword".to_string(), gen_sword()),
            ("hurt".to_string(), gen_hurt()),
            ("death".to_string(), gen_death()),
            ("background".to_string(), gen_background()),
        ];
        for (side, pitch) in [('l', 90.0_f32), ('r', 110.0)] {
            for variant in 0..3u32 {
                let freq = pitch + variant as f32 * 15.0;
                clips.push((format!("footstep-{side}{variant}"), gen_thud(freq, 7 + variant)));
            }
        }
        clips
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Seconds since the start of a clip.
    fn secs(i: usize) -> f32 {
        i as f32 / SAMPLE_RATE as f32
    }

    fn sine(secs: f32, freq: f32) -> f32 {
        (secs * freq * 2.0 * PI).sin()
    }

    /// LCG white noise in [-1, 1]. Seeded, so clips are reproducible.
    fn noise(state: &mut u32) -> f32 {
        *state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (*state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
    }

    /// Jump: quick rising square sweep
    fn gen_jump() -> Vec<f32> {
        let n = sample_count(0.12);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let progress = i as f32 / n as f32;
                phase += (300.0 + progress * 500.0) / SAMPLE_RATE as f32;
                let square = if phase.fract() < 0.5 { 1.0 } else { -1.0 };
                square * (1.0 - progress) * 0.15
            })
            .collect()
    }

    /// Sword: noise through a lowpass that opens over the swing
    fn gen_sword() -> Vec<f32> {
        let n = sample_count(0.15);
        let mut state = 4242;
        let mut smooth = 0.0_f32;
        (0..n)
            .map(|i| {
                let progress = i as f32 / n as f32;
                let cutoff = 0.1 + progress * 0.6;
                smooth += cutoff * (noise(&mut state) - smooth);
                smooth * (progress * PI).sin() * 0.4
            })
            .collect()
    }

    /// Footstep: short low thud with a little grit
    fn gen_thud(freq: f32, seed: u32) -> Vec<f32> {
        let n = sample_count(0.06);
        let mut state = seed;
        (0..n)
            .map(|i| {
                let decay = (1.0 - i as f32 / n as f32).powi(2);
                (sine(secs(i), freq) * 0.7 + noise(&mut state) * 0.3) * decay * 0.3
            })
            .collect()
    }

    /// Hurt: falling buzz with a third harmonic
    fn gen_hurt() -> Vec<f32> {
        let n = sample_count(0.18);
        (0..n)
            .map(|i| {
                let progress = i as f32 / n as f32;
                let freq = 400.0 - progress * 250.0;
                let buzz = sine(secs(i), freq) * 0.6 + sine(secs(i), freq * 3.0) * 0.4;
                buzz * (1.0 - progress) * 0.3
            })
            .collect()
    }

    /// Death: four falling notes, last quarter faded out
    fn gen_death() -> Vec<f32> {
        let note_len = sample_count(0.14);
        let mut samples: Vec<f32> = [440.0_f32, 370.0, 311.0, 261.0]
            .iter()
            .flat_map(|&freq| {
                (0..note_len).map(move |i| {
                    let env = 1.0 - (i as f32 / note_len as f32) * 0.3;
                    sine(secs(i), freq) * env * 0.3
                })
            })
            .collect();

        let fade = samples.len() / 4;
        let start = samples.len() - fade;
        for (k, s) in samples[start..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade as f32;
        }
        samples
    }

    /// Background: two passes of an A-minor lead over a bass line
    fn gen_background() -> Vec<f32> {
        let bass = [110.0_f32, 110.0, 87.3, 87.3, 130.8, 130.8, 98.0, 98.0];
        let lead = [
            440.0_f32, 523.3, 659.3, 523.3,
            349.2, 440.0, 523.3, 440.0,
            523.3, 659.3, 784.0, 659.3,
            392.0, 493.9, 587.3, 493.9,
        ];
        let beat = sample_count(0.25);
        let mut samples = Vec::with_capacity(beat * lead.len() * 2);
        for (step, &note) in lead.iter().cycle().take(lead.len() * 2).enumerate() {
            let root = bass[(step / 4) % bass.len()];
            samples.extend((0..beat).map(|i| {
                let env = 1.0 - (i as f32 / beat as f32) * 0.6;
                sine(secs(i), note) * env * 0.12 + sine(secs(i), root) * 0.10
            }));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoding: mono 16-bit PCM
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        const WAV_CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = WAV_CHANNELS * BITS / 8;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend(b"RIFF");
        buf.extend((36 + data_len).to_le_bytes());
        buf.extend(b"WAVEfmt ");
        buf.extend(16u32.to_le_bytes());
        buf.extend(1u16.to_le_bytes()); // PCM
        buf.extend(WAV_CHANNELS.to_le_bytes());
        buf.extend(SAMPLE_RATE.to_le_bytes());
        buf.extend((SAMPLE_RATE * block_align as u32).to_le_bytes());
        buf.extend(block_align.to_le_bytes());
        buf.extend(BITS.to_le_bytes());
        buf.extend(b"data");
        buf.extend(data_len.to_le_bytes());
        buf.extend(samples.iter().flat_map(|&s| {
            ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes()
        }));
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Engine type, a no-op stub without the sound feature
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_cfg: &crate::config::SoundConfig) -> Option<Self> { Some(SoundEngine) }
    pub fn play_audio_clip(&mut self, _name: &str, _channel: usize) {}
    pub fn play_background_music(&mut self, _name: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{FootSide, Footstep};
    use crate::sim::event::DeathCause;

    #[test]
    fn events_map_to_channels() {
        assert_eq!(cue_for(&GameEvent::Jumped), Some(("jump".into(), JUMP_CHANNEL)));
        assert_eq!(cue_for(&GameEvent::SwordSwung), Some(("sword".into(), SWORD_CHANNEL)));
        assert_eq!(
            cue_for(&GameEvent::PlayerHurt { health: 3 }),
            Some(("hurt".into(), PLAYER_CHANNEL)),
        );
        assert_eq!(
            cue_for(&GameEvent::PlayerKilled { cause: DeathCause::Enemy }),
            Some(("death".into(), PLAYER_CHANNEL)),
        );
        assert_eq!(cue_for(&GameEvent::PlayerRespawned), None);
    }

    #[test]
    fn footsteps_use_their_variant() {
        let step = Footstep { side: FootSide::Right, variant: 2 };
        assert_eq!(
            cue_for(&GameEvent::Footstep(step)),
            Some(("footstep-r2".into(), FOOTSTEP_CHANNEL)),
        );
    }

    #[test]
    fn music_has_its_own_channel() {
        let sfx = [JUMP_CHANNEL, SWORD_CHANNEL, FOOTSTEP_CHANNEL, PLAYER_CHANNEL];
        assert!(!sfx.contains(&MUSIC_CHANNEL));
        assert!(sfx.iter().all(|&c| c < CHANNELS));
    }
}
