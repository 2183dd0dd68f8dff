// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame callbacks driven by [`Scene::tick`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use log::trace;
use smallvec::SmallVec;

use crate::{NodeId, Scene};

/// Handle to a registered animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

/// Timing handed to an animation callback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Milliseconds since the animation's first frame.
    pub time: f64,
    /// Milliseconds since the previous frame; zero on the first.
    pub time_diff: f64,
    /// Host time of the previous frame.
    pub last_time: f64,
    /// Frames per second implied by `time_diff`; zero on the first frame.
    pub frame_rate: f64,
}

/// An animation callback. Returns whether its layers need a redraw.
pub type AnimationFn = Box<dyn FnMut(&mut Scene, &Frame) -> bool>;

struct Entry {
    id: AnimationId,
    layers: SmallVec<[NodeId; 1]>,
    callback: Option<AnimationFn>,
    last_time: Option<f64>,
    frame: Frame,
}

/// The running animations of a scene.
#[derive(Default)]
pub(crate) struct AnimationRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl fmt::Debug for AnimationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRegistry")
            .field("running", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl AnimationRegistry {
    fn get_mut(&mut self, id: AnimationId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Detaches a destroyed layer from every animation.
    pub(crate) fn forget_layer(&mut self, layer: NodeId) {
        for entry in &mut self.entries {
            entry.layers.retain(|l| *l != layer);
        }
    }
}

impl Scene {
    /// Runs `callback` every tick, redrawing all layers when it returns `true`.
    pub fn add_animation(
        &mut self,
        callback: impl FnMut(&mut Self, &Frame) -> bool + 'static,
    ) -> AnimationId {
        self.add_layer_animation(&[], callback)
    }

    /// Runs `callback` every tick, redrawing `layers` when it returns `true`.
    ///
    /// An empty `layers` redraws every layer of the stage.
    pub fn add_layer_animation(
        &mut self,
        layers: &[NodeId],
        callback: impl FnMut(&mut Self, &Frame) -> bool + 'static,
    ) -> AnimationId {
        let registry = &mut self.animations;
        let id = AnimationId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            layers: layers.iter().copied().collect(),
            callback: Some(Box::new(callback)),
            last_time: None,
            frame: Frame::default(),
        });
        id
    }

    /// Removes the animation; later ticks no longer run it.
    ///
    /// Returns `false` if it was not running.
    pub fn stop_animation(&mut self, id: AnimationId) -> bool {
        let before = self.animations.entries.len();
        self.animations.entries.retain(|e| e.id != id);
        before != self.animations.entries.len()
    }

    /// Whether the animation is registered.
    #[must_use]
    pub fn is_animation_running(&self, id: AnimationId) -> bool {
        self.animations.entries.iter().any(|e| e.id == id)
    }

    /// The last frame handed to the animation.
    #[must_use]
    pub fn animation_frame(&self, id: AnimationId) -> Option<Frame> {
        self.animations
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.frame)
    }

    pub(crate) fn run_animations(&mut self, time_ms: f64) {
        let ids: Vec<AnimationId> = self.animations.entries.iter().map(|e| e.id).collect();
        for id in ids {
            let Some(entry) = self.animations.get_mut(id) else {
                continue;
            };
            let Some(mut callback) = entry.callback.take() else {
                continue;
            };
            let frame = match entry.last_time {
                None => Frame {
                    last_time: time_ms,
                    ..Frame::default()
                },
                Some(last) => {
                    let time_diff = time_ms - last;
                    Frame {
                        time: entry.frame.time + time_diff,
                        time_diff,
                        last_time: last,
                        frame_rate: if time_diff > 0.0 { 1000.0 / time_diff } else { 0.0 },
                    }
                }
            };
            entry.last_time = Some(time_ms);
            entry.frame = frame;

            let redraw = callback(self, &frame);
            let Some(entry) = self.animations.get_mut(id) else {
                trace!("animation {id:?} stopped itself");
                continue;
            };
            entry.callback = Some(callback);
            if !redraw {
                continue;
            }
            let layers = entry.layers.clone();
            if layers.is_empty() {
                self.request_draw(self.stage);
            } else {
                for layer in layers {
                    self.request_draw(layer);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneConfig;
    use alloc::rc::Rc;
    use core::cell::{Cell, RefCell};

    #[test]
    fn frames_track_elapsed_time() {
        let mut scene = Scene::new(SceneConfig::default());
        let frames = Rc::new(RefCell::new(Vec::new()));
        let seen = frames.clone();
        let id = scene.add_animation(move |_, frame| {
            seen.borrow_mut().push(*frame);
            false
        });
        scene.tick(100.0);
        scene.tick(116.0);
        scene.tick(132.0);
        let frames = frames.borrow();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].time_diff, 0.0);
        assert_eq!(frames[2].time, 32.0);
        assert_eq!(frames[2].last_time, 116.0);
        assert_eq!(frames[1].frame_rate, 62.5);
        assert_eq!(scene.animation_frame(id).map(|f| f.time), Some(32.0));
    }

    #[test]
    fn redraw_requests_mark_only_listed_layers() {
        let mut scene = Scene::new(SceneConfig::new(4.0, 4.0));
        let a = scene.create_layer();
        let b = scene.create_layer();
        scene.add(scene.stage(), a);
        scene.add(scene.stage(), b);
        scene.tick(0.0);
        let id = scene.add_layer_animation(&[a], |_, _| true);
        scene.run_animations(16.0);
        assert!(scene.needs_redraw(a));
        assert!(!scene.needs_redraw(b));

        scene.stop_animation(id);
        scene.tick(32.0);
        scene.add_animation(|_, _| true);
        scene.run_animations(48.0);
        assert!(scene.needs_redraw(a) && scene.needs_redraw(b));
    }

    #[test]
    fn stopping_is_idempotent_and_callbacks_may_stop_themselves() {
        let mut scene = Scene::new(SceneConfig::default());
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let slot: Rc<Cell<Option<AnimationId>>> = Rc::default();
        let me = slot.clone();
        let id = scene.add_animation(move |scene, _| {
            counter.set(counter.get() + 1);
            if let Some(id) = me.get() {
                scene.stop_animation(id);
            }
            false
        });
        slot.set(Some(id));
        assert!(scene.is_animation_running(id));
        scene.tick(0.0);
        scene.tick(16.0);
        assert_eq!(runs.get(), 1);
        assert!(!scene.is_animation_running(id));
        assert!(!scene.stop_animation(id));
    }
}
