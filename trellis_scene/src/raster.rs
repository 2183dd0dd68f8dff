// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node raster caches.
//!
//! A cached node is painted by blitting an owned off-screen image instead of
//! running its drawing callbacks. The image is dropped on any change that
//! alters what it shows.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use log::{debug, error, warn};
use trellis_transform::Transform;

use crate::attr;
use crate::bounds::ClientRectConfig;
use crate::render::DrawItem;
use crate::surface::{ImageData, SurfaceError, pixel_extent};
use crate::{NodeId, Scene};

/// Options for [`Scene::cache`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheConfig {
    /// Area to capture in the node's own space; defaults to its client rect.
    pub rect: Option<Rect>,
    /// Padding added on every side.
    pub offset: f64,
    /// Pixels per unit; defaults to the scene's pixel ratio.
    pub pixel_ratio: Option<f64>,
}

/// Why a node could not be cached.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The node does not exist.
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    /// The node's bounds have no area.
    #[error("cannot cache node {0}: its bounds are empty")]
    EmptyBounds(NodeId),
    /// The backend failed twice.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A cached image of a node, in the node's own space.
pub(crate) struct RasterCache {
    pub(crate) origin: Point,
    pub(crate) pixel_ratio: f64,
    pub(crate) image: Rc<ImageData>,
}

impl Scene {
    /// Renders `id` (a shape or a whole subtree) into an off-screen image that
    /// replaces its drawing until released.
    pub fn cache(&mut self, id: NodeId, config: CacheConfig) -> Result<(), CacheError> {
        if !self.contains(id) {
            warn!("cannot cache missing node {id}");
            return Err(CacheError::MissingNode(id));
        }
        self.clear_cache(id);
        let rect = config
            .rect
            .unwrap_or_else(|| {
                self.client_rect(
                    id,
                    ClientRectConfig {
                        skip_transform: true,
                        relative_to: None,
                    },
                )
            })
            .inflate(config.offset, config.offset);
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            error!("cannot cache node {id}: width and height must be greater than zero");
            return Err(CacheError::EmptyBounds(id));
        }

        let ratio = config.pixel_ratio.unwrap_or(self.config.pixel_ratio);
        let width = pixel_extent(rect.width() * ratio);
        let height = pixel_extent(rect.height() * ratio);
        let mut items = Vec::new();
        self.collect_into(id, Some(id), &mut items);
        let mut base = Transform::IDENTITY;
        base.scale(ratio, ratio).translate(-rect.x0, -rect.y0);

        let image = match self.render_offscreen(width, height, &items, &base) {
            Ok(image) => image,
            Err(first) => {
                warn!("caching node {id} failed ({first}); retrying with a fresh surface");
                match self.render_offscreen(width, height, &items, &base) {
                    Ok(image) => image,
                    Err(err) => {
                        error!("cannot cache node {id}: {err}");
                        return Err(err.into());
                    }
                }
            }
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.raster = Some(RasterCache {
                origin: rect.origin(),
                pixel_ratio: ratio,
                image: Rc::new(image),
            });
        }
        debug!("cached node {id} as a {width}x{height} image");
        self.request_draw(id);
        Ok(())
    }

    fn render_offscreen(
        &mut self,
        width: u32,
        height: u32,
        items: &[DrawItem],
        base: &Transform,
    ) -> Result<ImageData, SurfaceError> {
        let mut surface = self.surfaces.create_surface(width, height)?;
        let ctx = surface.context();
        for item in items {
            item.paint(self, ctx, base);
        }
        surface.snapshot()
    }

    /// Releases the node's raster cache. Returns whether one existed.
    pub fn clear_cache(&mut self, id: NodeId) -> bool {
        let released = self
            .nodes
            .get_mut(&id)
            .and_then(|n| n.raster.take())
            .is_some();
        if released {
            debug!("released raster cache of node {id}");
            self.request_draw(id);
        }
        released
    }

    /// Whether the node is painted from a raster cache.
    #[must_use]
    pub fn is_cached(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.raster.is_some())
    }

    /// Drops every image that `key` changing on `id` makes stale.
    pub(crate) fn invalidate_rasters_for(&mut self, id: NodeId, key: &str) {
        if attr::affects_own_appearance(key) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.hit_raster = None;
                if node.raster.take().is_some() {
                    debug!("\"{key}\" changed on node {id}; raster cache released");
                }
            }
        }
        if !attr::affects_subtree_appearance(key) {
            return;
        }
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for a in ancestors {
            if let Some(node) = self.nodes.get_mut(&a) {
                if node.raster.take().is_some() {
                    debug!("\"{key}\" changed under node {a}; raster cache released");
                }
            }
        }
    }
}
