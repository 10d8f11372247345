use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use resona_api::{ChannelMask, IoCallback, IoConfig, SessionInfo};
use resona_device::Device;
use resona_dummy::{DummyBackend, DummyConfig};

#[derive(Default)]
struct Counters {
    started: AtomicUsize,
    blocks: AtomicUsize,
    stopped: AtomicUsize,
    shape_violations: AtomicUsize,
}

struct Probe {
    counters: Arc<Counters>,
    expected_samples: usize,
}

impl IoCallback for Probe {
    fn about_to_start(&mut self, session: &SessionInfo) {
        self.expected_samples = session.buffer_size;
        self.counters.started.fetch_add(1, SeqCst);
    }

    fn process_block(
        &mut self,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
        num_samples: usize,
    ) {
        // Slot layout: input 0 enabled, input 1 not; both outputs enabled.
        let shape_ok = num_samples == self.expected_samples
            && inputs.len() == 2
            && inputs[0].is_some_and(|input| input.len() == num_samples)
            && inputs[1].is_none()
            && outputs.len() == 2
            && outputs.iter().all(|slot| slot.is_some());
        if !shape_ok {
            self.counters.shape_violations.fetch_add(1, SeqCst);
        }

        for channel in outputs.iter_mut().flatten() {
            channel.fill(0.25);
        }
        self.counters.blocks.fetch_add(1, SeqCst);
    }

    fn stopped(&mut self) {
        self.counters.stopped.fetch_add(1, SeqCst);
    }
}

fn device() -> Device {
    Device::new(Box::new(DummyBackend::new(DummyConfig::default())))
}

fn config() -> IoConfig {
    IoConfig {
        input_channels: ChannelMask::from_indices([0]),
        output_channels: ChannelMask::from_indices([0, 1]),
        sample_rate: 48000,
        buffer_size: 64,
    }
}

#[test]
fn stream_stop_drain() {
    let mut device = device();
    device.open(&config()).unwrap();
    assert!(device.is_open());
    assert_eq!(device.current_sample_rate(), Some(48000));
    assert_eq!(device.current_buffer_size(), Some(64));

    let counters = Arc::new(Counters::default());
    device
        .start(Box::new(Probe {
            counters: counters.clone(),
            expected_samples: 0,
        }))
        .unwrap();
    assert!(device.is_playing());
    assert_eq!(counters.started.load(SeqCst), 1);

    // 64 samples @ 48 kHz is a ~1.3 ms period; half a second is plenty.
    let deadline = std::time::Instant::now() + Duration::from_millis(500);
    while counters.blocks.load(SeqCst) < 3 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(counters.blocks.load(SeqCst) >= 3);

    let returned = device.stop();
    assert!(returned.is_some());
    assert!(!device.is_playing());
    assert_eq!(counters.stopped.load(SeqCst), 1);

    // Synchronous stop: the block counter must be frozen from here on.
    let frozen = counters.blocks.load(SeqCst);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(counters.blocks.load(SeqCst), frozen);

    assert_eq!(counters.shape_violations.load(SeqCst), 0);

    device.close();
    assert!(!device.is_open());
}

#[test]
fn restart_after_stop() {
    let mut device = device();
    device.open(&config()).unwrap();

    let counters = Arc::new(Counters::default());
    for _ in 0..2 {
        let baseline = counters.blocks.load(SeqCst);
        device
            .start(Box::new(Probe {
                counters: counters.clone(),
                expected_samples: 0,
            }))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_millis(500);
        while counters.blocks.load(SeqCst) == baseline && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(counters.blocks.load(SeqCst) > baseline);

        assert!(device.stop().is_some());
    }

    assert_eq!(counters.started.load(SeqCst), 2);
    assert_eq!(counters.stopped.load(SeqCst), 2);
    assert!(counters.blocks.load(SeqCst) >= 2);
}

#[test]
fn close_while_playing_stops_first() {
    let mut device = device();
    device.open(&config()).unwrap();

    let counters = Arc::new(Counters::default());
    device
        .start(Box::new(Probe {
            counters: counters.clone(),
            expected_samples: 0,
        }))
        .unwrap();

    device.close();
    assert!(!device.is_open());
    assert!(!device.is_playing());
    assert_eq!(counters.stopped.load(SeqCst), 1);
}

#[test]
fn drop_tears_down_worker() {
    let mut device = device();
    device.open(&config()).unwrap();

    let counters = Arc::new(Counters::default());
    device
        .start(Box::new(Probe {
            counters: counters.clone(),
            expected_samples: 0,
        }))
        .unwrap();

    drop(device);
    assert_eq!(counters.stopped.load(SeqCst), 1);
}
