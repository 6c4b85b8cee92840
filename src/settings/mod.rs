// src/settings/mod.rs
pub mod io;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::grid::virtualizer::VirtualizerConfig;

/// Tunables of a grid instance, persisted as `grid_settings.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Resource)]
#[serde(default)]
pub struct GridSettings {
    /// Collections with fewer matching rows than this are held fully in memory.
    pub full_set_threshold: usize,
    pub page_size: usize,
    pub row_height: f32,
    pub overscan: usize,
    pub lookahead_rows: usize,
    pub estimated_viewport_height: f32,
    pub history_limit: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            full_set_threshold: 5_000,
            page_size: 100,
            row_height: 32.0,
            overscan: 5,
            lookahead_rows: 10,
            estimated_viewport_height: 600.0,
            history_limit: 100,
        }
    }
}

impl GridSettings {
    pub fn virtualizer_config(&self) -> VirtualizerConfig {
        VirtualizerConfig {
            row_height: self.row_height,
            overscan: self.overscan,
            lookahead: self.lookahead_rows,
            estimated_viewport_height: self.estimated_viewport_height,
        }
    }

    /// Page size never drops to zero, which would stall infinite scroll.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }
}
