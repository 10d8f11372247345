use std::time::Duration;

use resona_api::{ChannelMask, IoCallback, IoConfig, SessionInfo};
use resona_device::BackendRegistry;
use resona_dummy::{DummyBackend, DummyConfig};

struct Saw {
    freq: f32,
    sample_rate: f32,
    time: f32,
    peak: f32,
}

impl IoCallback for Saw {
    fn about_to_start(&mut self, session: &SessionInfo) {
        self.sample_rate = session.sample_rate as f32;
        println!(
            "starting: {} Hz, {} samples per block",
            session.sample_rate, session.buffer_size
        );
    }

    fn process_block(
        &mut self,
        _inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
        num_samples: usize,
    ) {
        for i in 0..num_samples {
            let x = self.time / self.sample_rate * self.freq;
            let y = 2.0 * (x - (0.5 + x).floor());
            let sample = y * 0.5;

            for channel in outputs.iter_mut().flatten() {
                channel[i] = sample;
            }

            self.peak = self.peak.max(sample.abs());
            self.time += 1.0;
        }
    }

    fn stopped(&mut self) {
        println!("stopped, peak level {:.3}", self.peak);
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut registry = BackendRegistry::new();
    registry.register("Dummy", || Ok(DummyBackend::new(DummyConfig::default())));

    let mut device = registry.create("Dummy").unwrap();

    println!(
        "device: {} ({}), rates {:?}, buffer sizes {:?}",
        device.name(),
        device.type_name(),
        device.sample_rates(),
        device.buffer_sizes(),
    );

    let config = IoConfig {
        input_channels: ChannelMask::new(),
        output_channels: ChannelMask::from_indices([0, 1]),
        sample_rate: 48000,
        buffer_size: device.default_buffer_size(),
    };
    device.open(&config).unwrap();

    device
        .start(Box::new(Saw {
            freq: 220.0,
            sample_rate: 0.0,
            time: 0.0,
            peak: 0.0,
        }))
        .unwrap();

    std::thread::sleep(Duration::from_secs(2));

    device.stop();
    device.close();
}
