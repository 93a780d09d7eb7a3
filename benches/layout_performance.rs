//! Layout engine micro-benchmarks
//!
//! Measures whole frames (declaration through command emission) for flat,
//! text-heavy and deeply nested trees.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use trellis::{
    Alignment, Arena, BorderWidth, ClipConfig, Color, ContextConfig, Dimensions, ElementDeclaration,
    ElementId, LayoutContext, LayoutDirection, LoggingErrorHandler, MonospaceMeasurer, Padding,
    SizingAxis, TextConfig, minimum_memory_size,
};

fn create_context(config: ContextConfig) -> LayoutContext {
    let mut context = LayoutContext::with_config(
        config,
        Arena::with_capacity(minimum_memory_size(&config)),
        Dimensions::new(1280.0, 720.0),
        Box::new(LoggingErrorHandler),
    );
    context.set_text_measurer(MonospaceMeasurer::default());
    context
}

fn declare_grid(context: &mut LayoutContext, cells: u32) {
    context.open_element(
        &ElementId::new("grid"),
        &ElementDeclaration::new()
            .sizing(SizingAxis::grow(), SizingAxis::grow())
            .padding(Padding::all(8))
            .child_gap(4)
            .wrap()
            .clip(ClipConfig::vertical()),
    );
    for index in 0..cells {
        context.open_element(
            &ElementId::indexed("cell", index),
            &ElementDeclaration::new()
                .sizing(SizingAxis::Fixed(48.0), SizingAxis::Fixed(32.0))
                .background(Color::gray((index % 200) as u8))
                .border(Color::BLACK, BorderWidth::outside(1)),
        );
        context.close_element();
    }
    context.close_element();
}

fn declare_paragraphs(context: &mut LayoutContext, paragraphs: u32, text: &str) {
    context.open_element(
        &ElementId::new("document"),
        &ElementDeclaration::new()
            .sizing(SizingAxis::Fixed(640.0), SizingAxis::grow())
            .direction(LayoutDirection::Column)
            .padding(Padding::all(16))
            .child_gap(12),
    );
    let config = TextConfig::default();
    for index in 0..paragraphs {
        context.open_element(
            &ElementId::indexed("paragraph", index),
            &ElementDeclaration::new().width(SizingAxis::grow()),
        );
        context.open_text_element(text, &config);
        context.close_element();
    }
    context.close_element();
}

fn declare_nested(context: &mut LayoutContext, depth: u32) {
    for level in 0..depth {
        let direction = if level % 2 == 0 {
            LayoutDirection::Row
        } else {
            LayoutDirection::Column
        };
        context.open_element(
            &ElementId::indexed("level", level),
            &ElementDeclaration::new()
                .sizing(SizingAxis::grow(), SizingAxis::grow())
                .direction(direction)
                .padding(Padding::all(2))
                .align(Alignment::Center, Alignment::Center)
                .background(Color::gray((level * 7 % 256) as u8)),
        );
        context.open_text_element("label", &TextConfig::default());
    }
    for _ in 0..depth {
        context.close_element();
    }
}

fn benchmark_many_elements(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_many_elements");

    for cells in [100_u32, 1000, 5000] {
        let config = ContextConfig {
            max_element_count: cells as usize + 16,
            ..ContextConfig::default()
        };
        let mut context = create_context(config);
        group.throughput(Throughput::Elements(u64::from(cells)));
        group.bench_with_input(BenchmarkId::new("cells", cells), &cells, |b, &cells| {
            b.iter(|| {
                context.begin_layout();
                declare_grid(&mut context, cells);
                black_box(context.end_layout().len())
            });
        });
    }

    group.finish();
}

fn benchmark_text_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_text_heavy");
    let text = "the quick brown fox jumps over the lazy dog ".repeat(8);

    for paragraphs in [10_u32, 100, 500] {
        let mut context = create_context(ContextConfig::default());
        group.throughput(Throughput::Bytes((text.len() as u64) * u64::from(paragraphs)));
        group.bench_with_input(
            BenchmarkId::new("paragraphs", paragraphs),
            &paragraphs,
            |b, &paragraphs| {
                b.iter(|| {
                    context.begin_layout();
                    declare_paragraphs(&mut context, paragraphs, &text);
                    black_box(context.end_layout().len())
                });
            },
        );
    }

    group.finish();
}

fn benchmark_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_nested");

    for depth in [8_u32, 64, 256] {
        let mut context = create_context(ContextConfig::default());
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            b.iter(|| {
                context.begin_layout();
                declare_nested(&mut context, depth);
                black_box(context.end_layout().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_many_elements, benchmark_text_heavy, benchmark_nested);
criterion_main!(benches);
