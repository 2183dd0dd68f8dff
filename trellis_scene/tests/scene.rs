// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behaviour of `trellis_scene` through its public API.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use trellis_scene::{
    CacheKey, CacheState, NodeId, PointerAction, PointerInput, Scene, SceneConfig, ShapeSpec,
};

fn square(scene: &mut Scene, size: f64) -> NodeId {
    let id = scene.create_shape(ShapeSpec::new("Rect", |ctx, shape| {
        ctx.rect(Rect::new(0.0, 0.0, shape.width(), shape.height()));
        ctx.fill();
    }));
    scene.set_width(id, size);
    scene.set_height(id, size);
    id
}

fn staged_layer(scene: &mut Scene) -> NodeId {
    let layer = scene.create_layer();
    scene.add(scene.stage(), layer);
    layer
}

#[test]
fn z_order_follows_moves_and_removals() {
    let mut scene = Scene::new(SceneConfig::new(50.0, 50.0));
    let layer = staged_layer(&mut scene);
    let s1 = square(&mut scene, 1.0);
    let s2 = square(&mut scene, 1.0);
    let s3 = square(&mut scene, 1.0);
    for s in [s1, s2, s3] {
        scene.add(layer, s);
    }

    assert!(scene.move_to_top(s2));
    assert_eq!(scene.children(layer), &[s1, s3, s2]);
    assert_eq!(scene.z_index(s2), 2);

    scene.remove(s1);
    assert_eq!(scene.z_index(s3), 0);
    assert_eq!(scene.z_index(s2), 1);
    assert_eq!(scene.parent(s1), None);
}

#[test]
fn bubbling_stops_at_the_cancelling_node() {
    let mut scene = Scene::new(SceneConfig::default());
    let layer = staged_layer(&mut scene);
    let mut chain = vec![layer];
    for _ in 0..4 {
        let group = scene.create_group();
        scene.add(*chain.last().unwrap(), group);
        chain.push(group);
    }
    let leaf = square(&mut scene, 1.0);
    scene.add(*chain.last().unwrap(), leaf);
    chain.push(leaf);

    let visited = Rc::new(RefCell::new(Vec::new()));
    let cancel_at = chain[2];
    for &node in &chain {
        let visited = visited.clone();
        scene.on(node, "ping", move |_, event| {
            visited.borrow_mut().push(node);
            if event.current_target == Some(cancel_at) {
                event.cancel_bubble = true;
            }
        });
    }
    scene.fire(leaf, "ping", true);

    let expected: Vec<NodeId> = chain[2..].iter().rev().copied().collect();
    assert_eq!(*visited.borrow(), expected);
}

#[test]
fn selectors_only_search_below_the_container() {
    let mut scene = Scene::new(SceneConfig::default());
    let layer = staged_layer(&mut scene);
    let left = scene.create_group();
    let right = scene.create_group();
    scene.add(layer, left);
    scene.add(layer, right);
    let a = square(&mut scene, 1.0);
    let b = square(&mut scene, 1.0);
    scene.add(left, a);
    scene.add(right, b);
    scene.set_name(left, "tagged");
    scene.set_name(a, "tagged");
    scene.set_name(b, "tagged");

    assert_eq!(scene.find(layer, ".tagged"), vec![left, a, b]);
    assert_eq!(scene.find(left, ".tagged"), vec![a]);
    assert_eq!(scene.find(right, "Rect"), vec![b]);
    assert_eq!(scene.nodes_by_name("tagged").len(), 3);

    scene.remove(right);
    assert_eq!(scene.nodes_by_name("tagged"), &[left, a]);
}

#[test]
fn derived_values_stay_coherent_with_writes() {
    let mut scene = Scene::new(SceneConfig::default());
    let layer = staged_layer(&mut scene);
    let group = scene.create_group();
    let leaf = square(&mut scene, 4.0);
    scene.add(layer, group);
    scene.add(group, leaf);
    scene.set_position(leaf, Vec2::new(1.0, 2.0));

    assert_eq!(scene.absolute_position(leaf, None), Point::new(1.0, 2.0));
    assert_eq!(scene.cache_state(leaf, CacheKey::AbsoluteTransform), CacheState::Valid);

    scene.set_x(group, 10.0);
    assert_ne!(scene.cache_state(leaf, CacheKey::AbsoluteTransform), CacheState::Valid);
    assert_eq!(scene.absolute_position(leaf, None), Point::new(11.0, 2.0));

    scene.set_visible(group, false);
    assert!(!scene.is_visible(leaf));
    scene.set_visible(group, true);
    assert!(scene.is_visible(leaf));

    scene.set_opacity(layer, 0.5);
    scene.set_opacity(group, 0.5);
    assert_eq!(scene.absolute_opacity(leaf), 0.25);
}

#[test]
fn absolute_transform_round_trips_points() {
    let mut scene = Scene::new(SceneConfig::default());
    let layer = staged_layer(&mut scene);
    let group = scene.create_group();
    let leaf = square(&mut scene, 4.0);
    scene.add(layer, group);
    scene.add(group, leaf);
    scene.set_position(group, Vec2::new(30.0, -5.0));
    scene.set_rotation(group, 30.0);
    scene.set_scale(leaf, Vec2::new(2.0, 0.5));
    scene.set_skew(leaf, Vec2::new(0.25, 0.0));

    let t = scene.absolute_transform(leaf);
    let inverse = t.try_inverse().unwrap();
    let local = Point::new(3.0, 1.5);
    let back = inverse.point(t.point(local));
    assert!((back - local).hypot() < 1e-9, "{back:?} != {local:?}");

    let rebuilt = t.decompose().to_transform();
    assert!(rebuilt.approx_eq(&t, 1e-9));
}

#[test]
fn drag_moves_node_and_bubbles_lifecycle_events() {
    let mut scene = Scene::new(SceneConfig::new(200.0, 200.0));
    let layer = staged_layer(&mut scene);
    let handle = square(&mut scene, 10.0);
    scene.add(layer, handle);
    scene.set_draggable(handle, true);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    scene.on(layer, "dragstart dragmove dragend click", move |_, event| {
        log.borrow_mut().push(event.name.clone());
    });

    let at = |action, x, y| PointerInput::new(action, Point::new(x, y));
    scene.handle_pointer(at(PointerAction::Down, 2.0, 2.0));
    for step in 1..=4 {
        let x = 2.0 + f64::from(step) * 10.0;
        scene.handle_pointer(at(PointerAction::Move, x, 2.0));
    }
    scene.handle_pointer(at(PointerAction::Up, 42.0, 2.0));

    assert_eq!(
        *seen.borrow(),
        ["dragstart", "dragmove", "dragmove", "dragmove", "dragmove", "dragend"]
    );
    assert_eq!(scene.absolute_position(handle, None), Point::new(40.0, 0.0));
    assert!(!scene.is_any_dragging());
    assert_eq!(scene.drag_element_count(), 0);
    assert_eq!(scene.get_intersection(Point::new(45.0, 5.0)), Some(handle));
}

#[test]
fn one_paint_per_tick_for_many_writes() {
    let mut scene = Scene::new(SceneConfig::new(20.0, 20.0));
    let layer = staged_layer(&mut scene);
    let other = staged_layer(&mut scene);
    let leaf = square(&mut scene, 4.0);
    scene.add(layer, leaf);
    scene.tick(0.0);

    for i in 0..10 {
        scene.set_x(leaf, f64::from(i));
    }
    assert!(scene.needs_redraw(layer));
    assert!(!scene.needs_redraw(other));
    assert_eq!(scene.tick(16.0), 1);
    assert_eq!(scene.tick(32.0), 0);
}

#[test]
fn hidden_or_deaf_stage_hides_every_shape_from_hits() {
    let mut scene = Scene::new(SceneConfig::new(50.0, 50.0));
    let layer = staged_layer(&mut scene);
    let leaf = square(&mut scene, 10.0);
    scene.add(layer, leaf);
    let stage = scene.stage();
    let inside = Point::new(5.0, 5.0);
    assert_eq!(scene.get_intersection(inside), Some(leaf));

    scene.set_listening(stage, false);
    assert!(!scene.is_listening(leaf));
    assert_eq!(scene.get_intersection(inside), None);

    scene.set_listening(stage, true);
    scene.set_visible(stage, false);
    assert!(!scene.is_visible(leaf));
    assert_eq!(scene.get_intersection(inside), None);

    scene.set_visible(stage, true);
    assert_eq!(scene.get_intersection(inside), Some(leaf));
}

#[test]
fn moving_a_dragged_node_off_stage_ends_its_drag() {
    let mut scene = Scene::new(SceneConfig::new(200.0, 200.0));
    let layer = staged_layer(&mut scene);
    let handle = square(&mut scene, 10.0);
    scene.add(layer, handle);
    scene.set_draggable(handle, true);
    let detached = scene.create_group();

    let ended = Rc::new(RefCell::new(0));
    let count = ended.clone();
    scene.on(layer, "dragend", move |_, _| *count.borrow_mut() += 1);

    let at = |action, x| PointerInput::new(action, Point::new(x, 2.0));
    scene.handle_pointer(at(PointerAction::Down, 2.0));
    scene.handle_pointer(at(PointerAction::Move, 20.0));
    assert!(scene.is_dragging(handle));

    assert!(scene.move_to(handle, detached));
    assert!(!scene.is_on_stage(handle));
    assert!(!scene.is_dragging(handle));
    assert_eq!(scene.drag_element_count(), 0);
    assert_eq!(*ended.borrow(), 1, "dragend bubbles through the old parent");

    scene.handle_pointer(at(PointerAction::Up, 20.0));
    assert_eq!(*ended.borrow(), 1);
}
