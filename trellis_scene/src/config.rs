// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene-wide settings.

use smallvec::{SmallVec, smallvec};

use crate::hit::HitStrategy;

/// Settings fixed when a [`Scene`](crate::Scene) is created.
///
/// ```
/// use trellis_scene::SceneConfig;
///
/// let config = SceneConfig::new(640.0, 480.0)
///     .with_pixel_ratio(2.0)
///     .with_drag_distance(5.0);
/// assert_eq!(config.dbl_click_window_ms, 400);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SceneConfig {
    /// Stage width in stage units.
    pub width: f64,
    /// Stage height in stage units.
    pub height: f64,
    /// Device pixels per stage unit for layer and cache surfaces.
    pub pixel_ratio: f64,
    /// Pointer travel, in stage units, before a pending drag starts.
    ///
    /// Overridden per node by the `dragDistance` attribute.
    pub drag_distance: f64,
    /// Mouse buttons that may start a drag.
    pub drag_buttons: SmallVec<[u16; 2]>,
    /// Maximum delay between two clicks that form a double click.
    pub dbl_click_window_ms: u64,
    /// Default hit strategy for shapes without a `hitStrategy` attribute.
    pub hit_strategy: HitStrategy,
    /// Keep dispatching hover and move events while a drag is in flight.
    pub hit_on_drag_enabled: bool,
    /// Capture the pointer to the pressed shape on pointer down.
    pub capture_pointer_events: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            drag_distance: 3.0,
            drag_buttons: smallvec![0],
            dbl_click_window_ms: 400,
            hit_strategy: HitStrategy::PathContainment,
            hit_on_drag_enabled: false,
            capture_pointer_events: false,
        }
    }
}

impl SceneConfig {
    /// Default settings for a stage of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Sets [`SceneConfig::pixel_ratio`].
    #[must_use]
    pub fn with_pixel_ratio(mut self, ratio: f64) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Sets [`SceneConfig::drag_distance`].
    #[must_use]
    pub fn with_drag_distance(mut self, distance: f64) -> Self {
        self.drag_distance = distance;
        self
    }

    /// Sets [`SceneConfig::drag_buttons`].
    #[must_use]
    pub fn with_drag_buttons(mut self, buttons: &[u16]) -> Self {
        self.drag_buttons = buttons.iter().copied().collect();
        self
    }

    /// Sets [`SceneConfig::dbl_click_window_ms`].
    #[must_use]
    pub fn with_dbl_click_window_ms(mut self, ms: u64) -> Self {
        self.dbl_click_window_ms = ms;
        self
    }

    /// Sets [`SceneConfig::hit_strategy`].
    #[must_use]
    pub fn with_hit_strategy(mut self, strategy: HitStrategy) -> Self {
        self.hit_strategy = strategy;
        self
    }

    /// Sets [`SceneConfig::hit_on_drag_enabled`].
    #[must_use]
    pub fn with_hit_on_drag(mut self, enabled: bool) -> Self {
        self.hit_on_drag_enabled = enabled;
        self
    }

    /// Sets [`SceneConfig::capture_pointer_events`].
    #[must_use]
    pub fn with_pointer_capture(mut self, enabled: bool) -> Self {
        self.capture_pointer_events = enabled;
        self
    }
}
