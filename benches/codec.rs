//! Codec benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use retro_video::codec::{Codec, MemoryCodec};
use retro_video::core::{Adapter, Charset, ModeCatalog, ScreenBuffer};

fn buffer_for(adapter: Adapter, number: u8) -> (Codec, ScreenBuffer) {
    let mode = ModeCatalog::new(adapter, 0x10000)
        .find(number, None)
        .expect("mode in catalog");
    (Codec::for_mode(&mode), ScreenBuffer::new(mode, Charset::Sbcs, false))
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for (name, adapter, number) in [
        ("text_80", Adapter::Cga, 0),
        ("cga_screen_1", Adapter::Cga, 1),
        ("ega_screen_9", Adapter::Ega, 9),
        ("tandy_screen_6", Adapter::Tandy, 6),
    ] {
        let (codec, mut buf) = buffer_for(adapter, number);
        let size = codec.layout().page_size;
        let bytes: Vec<u8> = (0..size).map(|i| (i * 7) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("encode_page_{}", name), |b| {
            b.iter(|| codec.encode(&mut buf, 0, black_box(&bytes)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for (name, adapter, number) in [
        ("text_80", Adapter::Cga, 0),
        ("cga_screen_1", Adapter::Cga, 1),
        ("ega_screen_9", Adapter::Ega, 9),
        ("tandy_screen_6", Adapter::Tandy, 6),
    ] {
        let (codec, buf) = buffer_for(adapter, number);
        let size = codec.layout().page_size;
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(format!("decode_page_{}", name), |b| {
            b.iter(|| black_box(codec.decode(&buf, 0, black_box(size))))
        });
    }

    group.finish();
}

fn bench_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let (codec, buf) = buffer_for(Adapter::Ega, 7);
    group.bench_function("dump_ega_screen_7", |b| b.iter(|| black_box(codec.dump(&buf))));

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_dump);

criterion_main!(benches);
