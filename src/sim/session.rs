//! Game session: both levels, the current selection and the pause state
//!
//! Owns everything the page-level callbacks used to share. Asset loads
//! finish at arbitrary times; their results are queued as [`AssetEvent`]s
//! and applied in arrival order at the start of the next [`Session::step`],
//! so level contents only change between ticks.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::input::{self, Key};
use super::level::{Level, LevelId, ObjectKind};
use super::placement::ScatterRegion;
use super::tick::{TickReport, tick};
use crate::assets::LoadedModel;
use crate::consts::OBJECT_COUNT;
use crate::levels::LevelConfig;

/// A finished model load, addressed to the level that requested it
#[derive(Debug, Clone, PartialEq)]
pub enum AssetEvent {
    Base { level: LevelId, model: LoadedModel },
    Object { level: LevelId, model: LoadedModel },
}

impl AssetEvent {
    pub fn level(&self) -> LevelId {
        match self {
            AssetEvent::Base { level, .. } | AssetEvent::Object { level, .. } => *level,
        }
    }
}

/// A model load the platform layer should start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub level: LevelId,
    pub kind: ObjectKind,
    pub path: String,
}

impl AssetRequest {
    /// Wrap the loaded model in the matching event
    pub fn complete(&self, model: LoadedModel) -> AssetEvent {
        match self.kind {
            ObjectKind::Base => AssetEvent::Base {
                level: self.level,
                model,
            },
            ObjectKind::Decoration => AssetEvent::Object {
                level: self.level,
                model,
            },
        }
    }
}

pub struct Session {
    levels: [Level; 2],
    current: LevelId,
    paused: bool,
    rng: Pcg32,
    seed: u64,
    queue: VecDeque<AssetEvent>,
    region: ScatterRegion,
}

impl Session {
    /// Both built-in levels, level one selected, paused
    pub fn new(seed: u64) -> Self {
        Self::with_levels(seed, &LevelConfig::level_one(), &LevelConfig::level_two())
    }

    pub fn with_levels(seed: u64, one: &LevelConfig, two: &LevelConfig) -> Self {
        log::info!("New session with seed {}", seed);
        Self {
            levels: [Level::new(LevelId::One, one), Level::new(LevelId::Two, two)],
            current: LevelId::One,
            paused: true,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            queue: VecDeque::new(),
            region: ScatterRegion::default(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn level(&self, id: LevelId) -> &Level {
        &self.levels[id.index()]
    }

    pub fn level_mut(&mut self, id: LevelId) -> &mut Level {
        &mut self.levels[id.index()]
    }

    pub fn current_id(&self) -> LevelId {
        self.current
    }

    pub fn current(&self) -> &Level {
        self.level(self.current)
    }

    pub fn current_mut(&mut self) -> &mut Level {
        let id = self.current;
        self.level_mut(id)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Switch to a level. Returns whether pointer lock should be requested,
    /// which only happens once the level's platform has loaded.
    pub fn select_level(&mut self, id: LevelId) -> bool {
        self.current = id;
        let ready = self.current().has_base();
        if ready {
            log::info!("Selected {}", id.as_str());
        } else {
            log::warn!("Selected {} before its base loaded", id.as_str());
        }
        ready
    }

    /// Pointer lock gained: gameplay runs
    pub fn lock_acquired(&mut self) {
        self.paused = false;
    }

    /// Pointer lock lost: gameplay freezes and the menu comes back
    pub fn lock_released(&mut self) {
        self.paused = true;
    }

    /// Queue a finished model load
    pub fn enqueue(&mut self, event: AssetEvent) {
        self.queue.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Apply every queued load in arrival order. Returns how many were applied.
    pub fn apply_asset_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.queue.pop_front() {
            let level = &mut self.levels[event.level().index()];
            match event {
                AssetEvent::Base { model, .. } => {
                    level.add_base(&model.path, model.mesh);
                }
                AssetEvent::Object { model, .. } => {
                    level.add_object(&mut self.rng, &self.region, &model.path, model.mesh);
                }
            }
            applied += 1;
        }
        applied
    }

    /// One fixed timestep. Queued loads are always applied; the current
    /// level only advances while unpaused.
    pub fn step(&mut self) -> Option<TickReport> {
        self.apply_asset_events();
        if self.paused {
            return None;
        }
        let report = tick(self.current_mut());
        if report.reset {
            log::debug!("{}: fell out of the world", self.current.as_str());
        }
        Some(report)
    }

    /// Key pressed. Routed to the current level even while paused.
    pub fn key_down(&mut self, key: Key) {
        input::key_down(self.current_mut(), key);
    }

    pub fn key_up(&mut self, key: Key) {
        input::key_up(self.current_mut(), key);
    }

    /// Mouse motion, ignored while paused
    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        if self.paused {
            return;
        }
        self.current_mut().player.look(dx, dy, sensitivity);
    }

    /// Every model load both levels need: one base and the scattered objects
    pub fn asset_requests(&self) -> Vec<AssetRequest> {
        let mut requests = Vec::with_capacity(2 * (OBJECT_COUNT + 1));
        for level in &self.levels {
            requests.push(AssetRequest {
                level: level.id,
                kind: ObjectKind::Base,
                path: level.base_model.clone(),
            });
            for _ in 0..OBJECT_COUNT {
                requests.push(AssetRequest {
                    level: level.id,
                    kind: ObjectKind::Decoration,
                    path: level.object_model.clone(),
                });
            }
        }
        requests
    }
}
