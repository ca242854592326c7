use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use utlx::lexer::{Lexer, Token};

/// UTL-X scripts of increasing size, used to gauge lexer throughput as
/// source grows.
fn generate_script(size_category: &str) -> String {
    match size_category {
        "small" => r#"
%utlx 1.0
input json
output json { pretty: false }
---
{ greeting: "hello " + $input.name, active: true, count: 3 }
"#
        .to_string(),
        "medium" => {
            let mut body = String::new();
            body.push_str(
                "%utlx 1.0\ninput json\noutput json { pretty: false }\n---\n{\n",
            );
            for i in 0..100 {
                body.push_str(&format!(
                    "  field_{i}: $input.items[{i}].value * 2 + {i},\n"
                ));
            }
            body.push_str("}\n");
            body
        }
        "large" => {
            let mut body = String::new();
            body.push_str(
                "%utlx 1.0\ninput json\noutput json { pretty: false }\n---\nlet items = [\n",
            );
            for i in 0..1000 {
                body.push_str(&format!(
                    "  {{ id: {i}, name: \"item-{i}\", active: {}, price: {}.5 }},\n",
                    i % 2 == 0,
                    i
                ));
            }
            body.push_str("]\n=> map(items, (item) => { sku: item.id, label: item.name })\n");
            body
        }
        _ => "%utlx 1.0\ninput json\noutput json\n---\n$input\n".to_string(),
    }
}

fn bench_lexer_tokenization(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_tokenization");

    for size in ["small", "medium", "large"] {
        let content = generate_script(size);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("full_scan", size), &content, |b, content| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(content));
                let mut token_count = 0;
                while let Ok((token, _span)) = lexer.next_token() {
                    black_box(&token);
                    token_count += 1;
                    if matches!(token, Token::Eof) {
                        break;
                    }
                }
                token_count
            });
        });
    }

    group.finish();
}

fn bench_string_literal_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_literal_scanning");

    let long_string = format!("\"{}\"", "x".repeat(1000));
    let strings = vec![
        "\"simple\"",
        "\"escaped \\\"quotes\\\" and \\n newline\"",
        long_string.as_str(),
    ];

    for (i, s) in strings.iter().enumerate() {
        group.throughput(Throughput::Bytes(s.len() as u64));
        group.bench_with_input(BenchmarkId::new("string", i), s, |b, content| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(content));
                lexer.next_token()
            });
        });
    }

    group.finish();
}

fn bench_number_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("number_scanning");

    let numbers = ["42", "-123", "3.14159", "1.5e-4", "0"];
    for (i, n) in numbers.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("number", i), n, |b, content| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(content));
                lexer.next_token()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_tokenization,
    bench_string_literal_scanning,
    bench_number_scanning
);
criterion_main!(benches);
