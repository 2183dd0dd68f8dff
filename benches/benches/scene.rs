// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use trellis_scene::{NodeId, Scene, SceneConfig, ShapeSpec};
use trellis_transform::Transform;

/// A layer holding `depth` nested groups, each with `fanout` square shapes.
fn build_scene(depth: usize, fanout: usize) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::new(SceneConfig::new(1024.0, 1024.0));
    let layer = scene.create_layer();
    scene.add(scene.stage(), layer);
    let mut parent = layer;
    let mut leaves = Vec::new();
    for level in 0..depth {
        let group = scene.create_group();
        scene.add(parent, group);
        scene.set_position(group, Vec2::new(3.0, 2.0));
        scene.set_rotation(group, 1.0);
        for i in 0..fanout {
            let shape = scene.create_shape(ShapeSpec::new("Rect", |ctx, shape| {
                ctx.rect(Rect::new(0.0, 0.0, shape.width(), shape.height()));
                ctx.fill();
            }));
            scene.set_width(shape, 8.0);
            scene.set_height(shape, 8.0);
            scene.set_x(shape, (i * 10) as f64);
            scene.set_name(shape, if level % 2 == 0 { "even" } else { "odd" });
            scene.add(group, shape);
            leaves.push(shape);
        }
        parent = group;
    }
    (scene, leaves)
}

fn bench_transforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    group.bench_function("compose_decompose", |b| {
        b.iter(|| {
            let mut t = Transform::IDENTITY;
            t.translate(black_box(10.0), 20.0)
                .rotate(0.3)
                .scale(2.0, 0.5)
                .skew(0.1, 0.0);
            black_box(t.decompose().to_transform())
        });
    });

    group.bench_function("absolute_cached", |b| {
        let (mut scene, leaves) = build_scene(32, 4);
        let leaf = leaves[leaves.len() - 1];
        b.iter(|| black_box(scene.absolute_transform(black_box(leaf))));
    });
    group.bench_function("absolute_after_root_move", |b| {
        b.iter_batched(
            || build_scene(32, 4),
            |(mut scene, leaves)| {
                let top = scene.parent(leaves[0]).unwrap();
                scene.set_x(top, 5.0);
                black_box(scene.absolute_transform(leaves[leaves.len() - 1]))
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_hit_testing(c: &mut Criterion) {
    let (mut scene, _) = build_scene(16, 8);
    let mut group = c.benchmark_group("hit");
    group.bench_function("path_containment_hit", |b| {
        b.iter(|| black_box(scene.get_intersection(black_box(Point::new(7.0, 6.0)))));
    });
    group.bench_function("path_containment_miss", |b| {
        b.iter(|| black_box(scene.get_intersection(black_box(Point::new(1000.0, 1000.0)))));
    });
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let (mut scene, leaves) = build_scene(32, 1);
    let leaf = *leaves.last().unwrap();
    for n in scene.ancestors(leaf).collect::<Vec<_>>() {
        scene.on(n, "ping", |_, event| {
            black_box(event.current_target);
        });
    }
    let mut group = c.benchmark_group("events");
    group.bench_function("bubble_depth_32", |b| {
        b.iter(|| black_box(scene.fire(leaf, "ping", true)));
    });
    group.bench_function("find_by_name", |b| {
        b.iter(|| black_box(scene.find(scene.stage(), ".odd").len()));
    });
    group.finish();
}

criterion_group!(benches, bench_transforms, bench_hit_testing, bench_dispatch);
criterion_main!(benches);
