//! Throughput of the orchestrator on each input shape.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use itinparse::{parser::TimelineOrchestrator, ParseContext};

const JSON: &str = r#"{"days": [
  {"day": 1, "title": "故宫", "morning": ["参观故宫，门票60元"], "afternoon": ["景山公园"]},
  {"day": 2, "title": "长城", "morning": ["八达岭长城"], "evening": ["烤鸭晚餐，人均150元"]}
]}"#;

const MARKDOWN: &str = "## Day 1: 故宫\n**上午（09:00-12:00）**：参观故宫\n**下午**：景山公园\n\
## Day 2: 长城\n**上午**：八达岭长城\n**晚上**：烤鸭晚餐，人均150元";

const NUMBERED: &str = "第1天\n09:00-12:00 参观故宫\n1. 午门\n2. 太和殿\n14:00-17:00 景山公园\n\
第2天\n1. 八达岭长城\n2. 农家乐午餐\n3. 返回市区\n4. 南锣鼓巷\n5. 烤鸭晚餐";

const PROSE: &str = "第一天上午参观故宫，下午去景山公园看日落，晚上吃烤鸭。\n\
第二天早上出发去八达岭长城，然后农家乐午餐，傍晚回到市区逛南锣鼓巷。";

fn bench_input_shapes(c: &mut Criterion) {
    let orchestrator = TimelineOrchestrator::new();
    let ctx = ParseContext::new("北京", 2).with_session_id("bench");
    let mut group = c.benchmark_group("parse_timeline");

    for (name, input) in [
        ("json", JSON),
        ("markdown_period", MARKDOWN),
        ("numbered_list", NUMBERED),
        ("heuristic", PROSE),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| orchestrator.parse_timeline(black_box(input), &ctx));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_input_shapes);
criterion_main!(benches);
