//! Network Benchmarks
//!
//! Block processing cost of band-split networks of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multiband::engine::generate_stereo_test_tone;
use multiband::{AudioBuffer, BandSplitNetwork, ChannelLayout, NetworkConfig};

const BLOCK_SIZE: usize = 512;

fn benchmark_network_block(c: &mut Criterion) {
    let tone = generate_stereo_test_tone(220.0, 330.0, 0.1, 48000);
    let input = AudioBuffer::from_channels(
        (0..2)
            .map(|ch| tone.channel(ch)[..BLOCK_SIZE].to_vec())
            .collect(),
        48000,
    )
    .unwrap();
    let mut output = AudioBuffer::new(BLOCK_SIZE, ChannelLayout::Stereo);

    let mut group = c.benchmark_group("network_block_512");
    for bands in [1usize, 3, 5] {
        let mut network =
            BandSplitNetwork::configure(NetworkConfig::new(48000.0, BLOCK_SIZE, bands)).unwrap();
        network.set_parameter("band_1_threshold", -24.0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(bands), &bands, |b, _| {
            b.iter(|| {
                network.process(black_box(&input), &mut output).unwrap();
            })
        });
    }
    group.finish();
}

fn benchmark_in_place(c: &mut Criterion) {
    let mut buffer = generate_stereo_test_tone(440.0, 440.0, 0.1, 48000);
    let frames = buffer.len().min(BLOCK_SIZE);
    buffer.set_len(frames);
    let mut network =
        BandSplitNetwork::configure(NetworkConfig::new(48000.0, BLOCK_SIZE, 3)).unwrap();

    c.bench_function("network_in_place_3_bands", |b| {
        b.iter(|| {
            network.process_in_place(black_box(&mut buffer)).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_network_block, benchmark_in_place);
criterion_main!(benches);
