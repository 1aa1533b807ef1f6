use anyhow::{anyhow, Context};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI16, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const FRAME_SAMPLES: usize = 512;
pub const SPECTRUM_BINS: usize = FRAME_SAMPLES / 2;
pub const CHANNELS: usize = 2;

/// One video frame worth of stereo 16-bit audio.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub channels: [[i16; FRAME_SAMPLES]; CHANNELS],
}

impl AudioFrame {
    pub fn silent() -> Self {
        Self {
            channels: [[0; FRAME_SAMPLES]; CHANNELS],
        }
    }

    /// Same samples on both channels.
    pub fn from_mono(samples: &[i16]) -> Self {
        let mut f = Self::silent();
        for (i, s) in samples.iter().take(FRAME_SAMPLES).enumerate() {
            f.channels[0][i] = *s;
            f.channels[1][i] = *s;
        }
        f
    }

    /// L/R interleaved input; a short slice leaves the tail silent.
    pub fn from_interleaved(samples: &[i16]) -> Self {
        let mut f = Self::silent();
        for (i, pair) in samples.chunks_exact(2).take(FRAME_SAMPLES).enumerate() {
            f.channels[0][i] = pair[0];
            f.channels[1][i] = pair[1];
        }
        f
    }

    pub fn left(&self) -> &[i16; FRAME_SAMPLES] {
        &self.channels[0]
    }

    pub fn right(&self) -> &[i16; FRAME_SAMPLES] {
        &self.channels[1]
    }
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let peak = self
            .channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|s| (*s as i32).abs())
            .max()
            .unwrap_or(0);
        f.debug_struct("AudioFrame").field("peak", &peak).finish()
    }
}

/// Read-side copy of the audio plus everything derived from it this frame.
#[derive(Debug, Clone)]
pub struct AudioState {
    pub time: AudioFrame,
    pub spectrum: [[f32; SPECTRUM_BINS]; CHANNELS],
    pub loudness: i32,
    /// 0..=3, how far the current frame sits above the smoothed loudness.
    pub thickness: u8,
    /// Quiet onset pulse: set on the first silent frame only.
    pub quiet: bool,
    pub beat: bool,
    /// New samples arrived for this frame.
    pub fresh: bool,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            time: AudioFrame::silent(),
            spectrum: [[0.0; SPECTRUM_BINS]; CHANNELS],
            loudness: 0,
            thickness: 0,
            quiet: false,
            beat: false,
            fresh: false,
        }
    }
}

/// Latest-frame handoff between audio producers and the render thread.
///
/// A sequence lock over plain atomics: a writer only waits on another
/// writer, the reader retries while a write is in flight and always sees a
/// complete frame.
/// Overwrites that land before the reader looks are lost on purpose.
pub struct AudioMailbox {
    seq: AtomicU64,
    samples: Box<[[AtomicI16; FRAME_SAMPLES]; CHANNELS]>,
}

impl AudioMailbox {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            samples: Box::new(std::array::from_fn(|_| {
                std::array::from_fn(|_| AtomicI16::new(0))
            })),
        }
    }

    /// Odd sequence means a write is in flight; each writer claims it with a CAS.
    pub fn store(&self, frame: &AudioFrame) {
        let mut seq = self.seq.load(Ordering::Relaxed);
        loop {
            if seq & 1 == 1 {
                std::hint::spin_loop();
                seq = self.seq.load(Ordering::Relaxed);
                continue;
            }
            match self
                .seq
                .compare_exchange_weak(seq, seq + 1, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(current) => seq = current,
            }
        }
        std::sync::atomic::fence(Ordering::Release);
        for (dst, src) in self.samples.iter().zip(frame.channels.iter()) {
            for (d, s) in dst.iter().zip(src.iter()) {
                d.store(*s, Ordering::Relaxed);
            }
        }
        self.seq.store(seq + 2, Ordering::Release);
    }

    /// Completed writes so far.
    pub fn version(&self) -> u64 {
        self.seq.load(Ordering::Acquire) / 2
    }

    /// Returns the newest frame if it is newer than `seen`, updating `seen`.
    pub fn take_newer(&self, seen: &mut u64) -> Option<AudioFrame> {
        let mut out = AudioFrame::silent();
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            if v1 / 2 == *seen {
                return None;
            }

            for (dst, src) in out.channels.iter_mut().zip(self.samples.iter()) {
                for (d, s) in dst.iter_mut().zip(src.iter()) {
                    *d = s.load(Ordering::Relaxed);
                }
            }

            std::sync::atomic::fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                *seen = v1 / 2;
                return Some(out);
            }
        }
    }
}

impl Default for AudioMailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable producer handle onto an engine's mailbox.
#[derive(Clone)]
pub struct AudioInput {
    mailbox: Arc<AudioMailbox>,
}

impl AudioInput {
    pub(crate) fn new(mailbox: Arc<AudioMailbox>) -> Self {
        Self { mailbox }
    }

    pub fn push(&self, frame: &AudioFrame) {
        self.mailbox.store(frame);
    }
}

impl std::fmt::Debug for AudioInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioInput")
            .field("version", &self.mailbox.version())
            .finish()
    }
}

/// Sliding 512-sample stereo window that yields a frame every `hop` samples.
#[derive(Debug, Clone)]
pub struct Framer {
    window: [[i16; FRAME_SAMPLES]; CHANNELS],
    write_pos: usize,
    filled: usize,
    since_last: usize,
    hop: usize,
}

impl Framer {
    pub fn new(hop: usize) -> Self {
        Self {
            window: [[0; FRAME_SAMPLES]; CHANNELS],
            write_pos: 0,
            filled: 0,
            since_last: 0,
            hop: hop.max(1),
        }
    }

    /// Samples between emitted frames for a given rate and frame rate.
    pub fn hop_for(sample_rate_hz: u32, fps: u32) -> usize {
        (sample_rate_hz as usize / fps.max(1) as usize).max(64)
    }

    /// Pushes one stereo sample; true when a new frame is ready.
    pub fn push(&mut self, sample: [i16; CHANNELS]) -> bool {
        self.window[0][self.write_pos] = sample[0];
        self.window[1][self.write_pos] = sample[1];
        self.write_pos = (self.write_pos + 1) % FRAME_SAMPLES;
        if self.filled < FRAME_SAMPLES {
            self.filled += 1;
        }
        self.since_last += 1;
        if self.filled == FRAME_SAMPLES && self.since_last >= self.hop {
            self.since_last = 0;
            return true;
        }
        false
    }

    /// Window contents oldest first.
    pub fn frame(&self) -> AudioFrame {
        let mut f = AudioFrame::silent();
        for ch in 0..CHANNELS {
            for i in 0..FRAME_SAMPLES {
                f.channels[ch][i] = self.window[ch][(self.write_pos + i) % FRAME_SAMPLES];
            }
        }
        f
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

enum AudioBackend {
    Cpal(cpal::Stream),
    Replay,
}

/// Running audio source feeding an [`AudioInput`] from a background thread.
pub struct AudioSystem {
    backend: AudioBackend,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    pub sample_rate_hz: u32,
}

impl AudioSystem {
    /// Microphone / line-in capture through the default cpal host.
    pub fn capture(device_query: Option<&str>, fps: u32, input: AudioInput) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb = HeapRb::<[i16; CHANNELS]>::new((sample_rate_hz as usize).saturating_mul(2));
        let (mut prod, mut cons) = rb.split();

        let err_fn = |err| log::warn!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };
        stream.play().context("start input stream")?;
        log::info!(
            "capturing {} Hz, {} channel(s) from {}",
            sample_rate_hz,
            channels,
            device.name().unwrap_or_else(|_| "<unknown>".to_string())
        );

        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let hop = Framer::hop_for(sample_rate_hz, fps);
        let worker = thread::spawn(move || {
            let mut framer = Framer::new(hop);
            while !stop_for_thread.load(Ordering::Relaxed) {
                let mut got_any = false;
                while let Some(s) = cons.try_pop() {
                    got_any = true;
                    if framer.push(s) {
                        input.push(&framer.frame());
                    }
                }
                if !got_any {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        });

        Ok(Self {
            backend: AudioBackend::Cpal(stream),
            stop,
            worker: Some(worker),
            sample_rate_hz,
        })
    }

    /// Plays decoded stereo samples into `input` at wall-clock pace, optionally looping.
    pub fn replay(
        samples: Vec<[i16; CHANNELS]>,
        sample_rate_hz: u32,
        fps: u32,
        looping: bool,
        input: AudioInput,
    ) -> anyhow::Result<Self> {
        if samples.is_empty() {
            return Err(anyhow!("nothing to replay (no samples)"));
        }
        let sample_rate_hz = sample_rate_hz.max(1);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = Arc::clone(&stop);
        let hop = Framer::hop_for(sample_rate_hz, fps);

        let worker = thread::spawn(move || {
            let mut framer = Framer::new(hop);
            let start = Instant::now();
            let mut played = 0u64;
            'outer: loop {
                for s in &samples {
                    if stop_for_thread.load(Ordering::Relaxed) {
                        break 'outer;
                    }
                    played += 1;
                    if framer.push(*s) {
                        input.push(&framer.frame());
                        let due = Duration::from_secs_f64(played as f64 / sample_rate_hz as f64);
                        if let Some(wait) = due.checked_sub(start.elapsed()) {
                            thread::sleep(wait);
                        }
                    }
                }
                if !looping {
                    break;
                }
            }
        });

        Ok(Self {
            backend: AudioBackend::Replay,
            stop,
            worker: Some(worker),
            sample_rate_hz,
        })
    }

    pub fn is_live(&self) -> bool {
        matches!(self.backend, AudioBackend::Cpal(_))
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.worker.take() {
            let _ = h.join();
        }
        // The cpal stream stops when the backend is dropped after this.
    }
}

fn select_input_device(host: &cpal::Host, device_query: Option<&str>) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    if let Some(want) = device_query.map(|s| s.to_lowercase()) {
        return devices
            .iter()
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&want))
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or_else(|| anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<[i16; CHANNELS]>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let left = to_i16(frame[0].to_float_sample());
        let right = frame.get(1).map(|s| to_i16(s.to_float_sample())).unwrap_or(left);
        let _ = prod.try_push([left, right]);
    }
}

pub fn to_i16(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
