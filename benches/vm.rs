//! Benchmarks for compilation and VM execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stackvm::bytecode::{Chunk, Op};
use stackvm::Vm;

/// A program with `n` declarations, each concatenating onto the previous.
fn concat_program(n: usize) -> String {
    let mut source = String::from("var s0 = \"x\";\n");
    for i in 1..n {
        source.push_str(&format!("var s{} = s{} + \"x\";\n", i, i - 1));
    }
    source
}

/// Nested blocks that each build an object and read it back.
fn scoped_objects_program(depth: usize) -> String {
    let mut source = String::new();
    for i in 0..depth {
        source.push_str(&format!(
            "{{ var o{i} = {{ id: {i}, tag: \"t\" }}; o{i}.next = o{i}.id + 1; print(o{i}.next);\n"
        ));
    }
    for _ in 0..depth {
        source.push('}');
    }
    source
}

/// Repeated calls into a routine that adds two numbers.
fn call_heavy_chunk(calls: usize) -> Vec<u8> {
    let mut chunk = Chunk::new();
    let mut patches = Vec::with_capacity(calls);
    for _ in 0..calls {
        patches.push(chunk.emit_call(0));
        chunk.emit(Op::Pop);
    }
    chunk.emit(Op::Exit);
    let routine = chunk.len() as u32;
    chunk.emit_number(1.0);
    chunk.emit_number(2.0);
    chunk.emit(Op::Add);
    chunk.emit(Op::Ret);
    for call in patches {
        chunk.patch_call(call, routine);
    }
    chunk.into_bytes()
}

fn compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for n in [10, 25].iter() {
        let source = concat_program(*n);
        group.bench_with_input(BenchmarkId::new("concat", n), &source, |b, src| {
            b.iter(|| stackvm::compile(black_box(src)).unwrap())
        });
    }

    let source = scoped_objects_program(12);
    group.bench_function("scoped_objects", |b| {
        b.iter(|| stackvm::compile(black_box(&source)).unwrap())
    });

    group.finish();
}

fn execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    let bytecode = stackvm::compile(&concat_program(25)).unwrap();
    group.bench_function("concat", |b| {
        b.iter(|| Vm::new().execute(black_box(&bytecode)).unwrap())
    });

    let bytecode = stackvm::compile(&scoped_objects_program(12)).unwrap();
    group.bench_function("scoped_objects", |b| {
        b.iter(|| Vm::new().execute(black_box(&bytecode)).unwrap())
    });

    let bytecode = call_heavy_chunk(500);
    group.bench_function("call_ret", |b| {
        b.iter(|| Vm::new().execute(black_box(&bytecode)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, compilation, execution);

criterion_main!(benches);
