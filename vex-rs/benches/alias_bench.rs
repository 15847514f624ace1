use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vex::script::{ExParser, Interpreter, ScriptParser, MAX_ALIAS_DEPTH};

fn chained(links: usize) -> Interpreter {
    let mut interp = Interpreter::new();
    for i in 1..links {
        interp.define_alias(format!("A{i}"), 0, None, format!("A{}", i + 1));
    }
    interp.define_alias(format!("A{links}"), 0, None, "let reached = 1");
    interp
}

fn bench_alias_resolution(c: &mut Criterion) {
    let mut g = c.benchmark_group("alias_resolution");

    let mut single = chained(1);
    g.bench_function("single", |b| {
        b.iter(|| single.exec_script(black_box("A1")))
    });

    let mut deep = chained(MAX_ALIAS_DEPTH);
    g.bench_function("depth_limit", |b| {
        b.iter(|| deep.exec_script(black_box("A1")))
    });

    let mut cycle = Interpreter::new();
    cycle.define_alias("Foo", 0, None, "Bar");
    cycle.define_alias("Bar", 0, None, "Foo");
    g.bench_function("cycle", |b| {
        b.iter(|| {
            let _ = cycle.exec_script(black_box("Foo"));
            cycle.output.take_lines();
        })
    });

    g.finish();
}

fn bench_while_loop(c: &mut Criterion) {
    let src = "let i = 0\nwhile i < 1000\n  let i += 1\nendwhile";
    let body = match ExParser.parse_script(src) {
        Ok(body) => body,
        Err(e) => panic!("bench script failed to parse: {e}"),
    };
    let mut interp = Interpreter::new();
    c.bench_function("while_1000", |b| b.iter(|| interp.exec_body(black_box(&body))));
}

criterion_group!(benches, bench_alias_resolution, bench_while_loop);
criterion_main!(benches);
