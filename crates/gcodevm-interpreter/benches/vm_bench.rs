//! Criterion benchmarks for whole-program evaluation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gcodevm_interpreter::{GcodeVm, ParsedLine, VmConfig};

/// Raster-style pocketing program with arcs at each row end
fn generate_program(rows: usize) -> Vec<String> {
    let mut lines = vec![
        "G21 G90 G17".to_string(),
        "T1 M6".to_string(),
        "S12000 M3".to_string(),
        "G0 X0 Y0 Z5".to_string(),
        "G1 Z-1 F300".to_string(),
    ];
    for row in 0..rows {
        let y = row as f64 * 2.0;
        let (from, to) = if row % 2 == 0 { (0.0, 100.0) } else { (100.0, 0.0) };
        lines.push(format!("G1 X{:.3} Y{:.3} F1200 (row {})", to, y, row));
        let arc = if row % 2 == 0 { "G3" } else { "G2" };
        lines.push(format!("{} X{:.3} Y{:.3} R1", arc, to, y + 2.0));
        lines.push(format!("G1 X{:.3}", from));
    }
    lines.push("G0 Z5".to_string());
    lines.push("M5".to_string());
    lines.push("M30".to_string());
    lines
}

fn bench_parse(c: &mut Criterion) {
    let program = generate_program(1000);
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(program.len() as u64));
    group.bench_function("parse_lines", |b| {
        b.iter(|| {
            for line in &program {
                black_box(ParsedLine::parse(line));
            }
        })
    });
    group.finish();
}

fn bench_run_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_program");
    for rows in [100, 1000, 5000] {
        let program = generate_program(rows);
        group.throughput(Throughput::Elements(program.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &program, |b, program| {
            b.iter(|| {
                let mut vm = GcodeVm::new(VmConfig::default()).expect("valid config");
                black_box(vm.run_program(program))
            })
        });
    }
    group.finish();
}

fn bench_motion_events(c: &mut Criterion) {
    let program = generate_program(1000);
    c.bench_function("motion_events", |b| {
        b.iter(|| {
            let mut vm = GcodeVm::new(VmConfig::default()).expect("valid config");
            black_box(vm.motion_events(&program).count())
        })
    });
}

criterion_group!(benches, bench_parse, bench_run_program, bench_motion_events);
criterion_main!(benches);
