use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use utlx::Engine;

fn object_build_script() -> &'static str {
    r#"
%utlx 1.0
input json
output json { pretty: false }
---
{ greeting: "hello " + $input.name, doubled: $input.count * 2, active: $input.count > 0 }
"#
}

fn map_filter_script() -> &'static str {
    r#"
%utlx 1.0
input json
output json { pretty: false }
---
filter(map($input.items, (item) => { sku: item.id, price: item.price * 1.1 }), (row) => row.price > 1.0)
"#
}

fn template_dispatch_script() -> &'static str {
    r#"
%utlx 1.0
input xml
output json { pretty: false }
---
template match="item" { { sku: @sku, qty: @qty } }
apply($input.item)
"#
}

fn json_payload(count: usize) -> Vec<u8> {
    let mut items = String::new();
    for i in 0..count {
        if i > 0 {
            items.push(',');
        }
        items.push_str(&format!(r#"{{"id":{i},"price":{i}.5}}"#));
    }
    format!(r#"{{"name":"Ada","count":{count},"items":[{items}]}}"#).into_bytes()
}

fn xml_payload(count: usize) -> Vec<u8> {
    let mut body = String::from("<root>");
    for i in 0..count {
        body.push_str(&format!("<item sku=\"SKU-{i}\" qty=\"{i}\"/>"));
    }
    body.push_str("</root>");
    body.into_bytes()
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("object_build", |b| {
        b.iter(|| Engine::compile(black_box(object_build_script())).unwrap());
    });

    group.bench_function("template_dispatch", |b| {
        b.iter(|| Engine::compile(black_box(template_dispatch_script())).unwrap());
    });

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    let object_build = Engine::compile(object_build_script()).unwrap();
    let small_payload = json_payload(1);
    group.throughput(Throughput::Bytes(small_payload.len() as u64));
    group.bench_function("object_build", |b| {
        b.iter(|| object_build.transform(black_box(&small_payload)).unwrap());
    });

    let map_filter = Engine::compile(map_filter_script()).unwrap();
    for size in [10usize, 100, 1000] {
        let payload = json_payload(size);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("map_filter", size),
            &payload,
            |b, payload| {
                b.iter(|| map_filter.transform(black_box(payload)).unwrap());
            },
        );
    }

    let template_dispatch = Engine::compile(template_dispatch_script()).unwrap();
    for size in [10usize, 100, 1000] {
        let payload = xml_payload(size);
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("template_dispatch", size),
            &payload,
            |b, payload| {
                b.iter(|| template_dispatch.transform(black_box(payload)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_transform);
criterion_main!(benches);
