// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Scene: a retained-mode 2D scene graph.
//!
//! A [`Scene`] owns a tree of nodes rooted at a single stage:
//!
//! - the **stage** accepts only layers;
//! - **layers** are the unit of redraw and hit resolution;
//! - **groups** nest other groups and shapes;
//! - **shapes** are drawable leaves whose drawing comes from a [`ShapeSpec`].
//!
//! Nodes are addressed by [`NodeId`] and carry dynamically typed attributes
//! ([`Value`]). Changing an attribute fires `"{key}Change"` events and
//! invalidates exactly the derived values that depend on it: local and
//! absolute transforms, inherited visibility, listening and opacity, and any
//! raster caches that show the node.
//!
//! ## Events
//!
//! Listeners are registered with [`Scene::on`] using `event[.namespace]`
//! tokens and bubble from the target to the stage until a handler sets
//! [`Event::cancel_bubble`]. Pointer input is fed in with
//! [`Scene::handle_pointer`], which hit-tests, tracks hover with
//! `mouseenter`/`mouseleave` pairs that skip the common ancestor, recognises
//! clicks and double clicks, and drives drags of draggable nodes.
//!
//! ## Drawing
//!
//! Redraw requests are coalesced per layer. [`Scene::tick`] runs animations
//! and paints each dirty layer once through a [`DrawContext`]. The bundled
//! [`reference`] backend rasterises into RGBA8 buffers on the CPU; other
//! backends implement [`SurfaceFactory`].
//!
//! ```
//! use kurbo::{Point, Rect};
//! use trellis_scene::{PointerAction, PointerInput, Scene, SceneConfig, ShapeSpec};
//!
//! let mut scene = Scene::new(SceneConfig::new(100.0, 100.0));
//! let layer = scene.create_layer();
//! scene.add(scene.stage(), layer);
//!
//! let square = scene.create_shape(ShapeSpec::new("Rect", |ctx, shape| {
//!     ctx.rect(Rect::new(0.0, 0.0, shape.width(), shape.height()));
//!     ctx.fill();
//! }));
//! scene.set_width(square, 20.0);
//! scene.set_height(square, 20.0);
//! scene.set_x(square, 10.0);
//! scene.add(layer, square);
//!
//! assert_eq!(scene.get_intersection(Point::new(15.0, 5.0)), Some(square));
//! assert_eq!(scene.get_intersection(Point::new(5.0, 5.0)), None);
//!
//! let hit = scene.handle_pointer(PointerInput::new(PointerAction::Down, Point::new(15.0, 5.0)));
//! assert_eq!(hit, Some(square));
//! assert_eq!(scene.tick(0.0), 1);
//! ```
//!
//! This crate is `no_std` + `alloc`. Enable `libm` when building without `std`.

#![no_std]

extern crate alloc;

mod accessors;
mod animation;
pub mod attr;
mod bounds;
mod config;
mod container;
mod drag;
mod event;
mod hit;
mod id;
mod node;
mod pointer;
mod raster;
pub mod reference;
mod render;
mod scene;
mod selector;
mod snapshot;
mod surface;
mod value;

pub use animation::{AnimationFn, AnimationId, Frame};
pub use attr::{AttrDecl, AttrDefault, CompositeDecl, Validator};
pub use bounds::ClientRectConfig;
pub use config::SceneConfig;
pub use drag::{DragBoundFn, DragElement, DragStatus};
pub use event::{Event, EventDetail, Handler, INTERNAL_NAMESPACE, PointerDetail};
pub use hit::HitStrategy;
pub use id::{NodeId, Role};
pub use node::{CacheKey, CacheState, TransformsEnabled};
pub use pointer::{PointerAction, PointerId, PointerInput, PointerType};
pub use raster::{CacheConfig, CacheError};
pub use render::{SceneFn, SelfRectFn, ShapeCx, ShapeSpec};
pub use scene::Scene;
pub use selector::Selector;
pub use snapshot::NodeSnapshot;
pub use surface::{DrawContext, ImageData, Surface, SurfaceError, SurfaceFactory};
pub use trellis_transform::Transform;
pub use value::Value;
