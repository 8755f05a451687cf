//! Frontend Ports
//!
//! Traits the engine calls into for everything it does not own: HUD and
//! banners (`Notifier`), model and material construction (`Renderer`).
//! Both come with headless implementations so the engine runs without a
//! scene graph.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::game::catalog::CharacterId;
use crate::game::obstacle::ObstacleKind;
use crate::game::session::RunOutcome;
use crate::progression::quest::Quest;
use crate::progression::rules::UnlockDelta;
use crate::progression::shop::ShopItem;

// =============================================================================
// NOTIFIER
// =============================================================================

/// HUD and banner hooks. Every hook defaults to a no-op.
pub trait Notifier {
    /// Score HUD.
    fn score_changed(&mut self, _score: u32) {}

    /// Currency HUD.
    fn currency_changed(&mut self, _currency: u32) {}

    /// Level-up / stage banner.
    fn banner(&mut self, _text: &str) {}

    /// Score passed the level's previous best.
    fn new_high_score(&mut self, _score: u32) {}

    /// Something was unlocked.
    fn unlocked(&mut self, _delta: UnlockDelta) {}

    /// A daily quest completed.
    fn quest_completed(&mut self, _quest: &Quest) {}

    /// An item was bought.
    fn purchased(&mut self, _item: &ShopItem) {}

    /// Game-over screen.
    fn game_over(&mut self, _outcome: &RunOutcome) {}
}

/// Notifier that writes every hook to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn score_changed(&mut self, score: u32) {
        if score % 100 == 0 {
            debug!("Score: {}", score);
        }
    }

    fn currency_changed(&mut self, currency: u32) {
        debug!("Stars: {}", currency);
    }

    fn banner(&mut self, text: &str) {
        info!("{}", text);
    }

    fn new_high_score(&mut self, score: u32) {
        info!("New High Score! {}", score);
    }

    fn unlocked(&mut self, delta: UnlockDelta) {
        info!("{}", delta);
    }

    fn quest_completed(&mut self, quest: &Quest) {
        info!("Quest complete: {}", quest.description());
    }

    fn purchased(&mut self, item: &ShopItem) {
        info!("Purchased {}", item.name);
    }

    fn game_over(&mut self, outcome: &RunOutcome) {
        let actions: Vec<String> = outcome.actions.iter().map(|a| a.label()).collect();
        info!(
            "{} Score: {}, stars: {}, options: [{}]",
            outcome.reason,
            outcome.final_score,
            outcome.stars_collected,
            actions.join(", ")
        );
    }
}

/// One recorded hook call.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Score HUD update
    Score(u32),
    /// Currency HUD update
    Currency(u32),
    /// Banner text
    Banner(String),
    /// New high score
    HighScore(u32),
    /// Unlock
    Unlocked(UnlockDelta),
    /// Quest completed
    QuestCompleted(Quest),
    /// Item bought
    Purchased(&'static str),
    /// Game-over screen
    GameOver(RunOutcome),
}

/// Notifier that keeps every call, for headless checks.
#[derive(Clone, Debug, Default)]
pub struct NotificationLog {
    /// Calls in order
    pub entries: Vec<Notification>,
}

impl NotificationLog {
    /// Drain recorded calls.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}

impl Notifier for NotificationLog {
    fn score_changed(&mut self, score: u32) {
        self.entries.push(Notification::Score(score));
    }

    fn currency_changed(&mut self, currency: u32) {
        self.entries.push(Notification::Currency(currency));
    }

    fn banner(&mut self, text: &str) {
        self.entries.push(Notification::Banner(text.to_string()));
    }

    fn new_high_score(&mut self, score: u32) {
        self.entries.push(Notification::HighScore(score));
    }

    fn unlocked(&mut self, delta: UnlockDelta) {
        self.entries.push(Notification::Unlocked(delta));
    }

    fn quest_completed(&mut self, quest: &Quest) {
        self.entries.push(Notification::QuestCompleted(quest.clone()));
    }

    fn purchased(&mut self, item: &ShopItem) {
        self.entries.push(Notification::Purchased(item.id));
    }

    fn game_over(&mut self, outcome: &RunOutcome) {
        self.entries.push(Notification::GameOver(outcome.clone()));
    }
}

// =============================================================================
// RENDERER
// =============================================================================

/// Opaque scene object handle.
pub type Handle = u64;

/// Asset load failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// The file could not be fetched or decoded
    #[error("failed to load {path}: {reason}")]
    LoadFailed {
        /// Asset path
        path: String,
        /// Loader message
        reason: String,
    },
}

/// Surface textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Texture {
    /// Rocket hull
    RocketBody,
    /// Asteroid surface
    AsteroidSurface,
    /// Saturn body
    SaturnPlanet,
    /// Saturn rings
    SaturnRing,
    /// Track floor grid
    SpaceshipFloor,
}

impl Texture {
    /// All textures, in load order.
    pub const ALL: [Texture; 5] = [
        Texture::RocketBody,
        Texture::AsteroidSurface,
        Texture::SaturnPlanet,
        Texture::SaturnRing,
        Texture::SpaceshipFloor,
    ];

    /// File path.
    pub fn path(self) -> &'static str {
        match self {
            Texture::RocketBody => "metal_texture.jpg",
            Texture::AsteroidSurface => "asteroid.jpg",
            Texture::SaturnPlanet => "saturn-colour.jpg",
            Texture::SaturnRing => "saturn-rings.png",
            Texture::SpaceshipFloor => "spaceship_floor_grid.jpg",
        }
    }

    /// Flat color used when the texture is missing.
    pub fn fallback_color(self) -> u32 {
        match self {
            Texture::RocketBody => 0xe5e7eb,
            Texture::AsteroidSurface => 0x8b7355,
            Texture::SaturnPlanet => 0xd4a574,
            Texture::SaturnRing => 0xc2b280,
            Texture::SpaceshipFloor => 0x1a1a2e,
        }
    }
}

/// Scene construction port.
pub trait Renderer {
    /// Load a texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    fn load_texture(&mut self, texture: Texture) -> Result<Handle, AssetError>;

    /// Build the player model, recolored by `skin` if given.
    fn create_character_model(&mut self, character: CharacterId, skin: Option<&ShopItem>) -> Handle;

    /// Build a trail particle material.
    fn create_trail_material(&mut self, color: u32) -> Handle;

    /// Build an obstacle's meshes.
    fn create_obstacle(&mut self, kind: ObstacleKind) -> Handle;

    /// Per-frame character animation (spin, shader time).
    fn animate_character(&mut self, handle: Handle, time_ms: f32);

    /// Dispose of a scene object.
    fn release(&mut self, handle: Handle);
}

/// Renderer that only hands out handles.
#[derive(Clone, Debug, Default)]
pub struct NullRenderer {
    next: Handle,
    live: BTreeSet<Handle>,
    missing: BTreeSet<Texture>,
    /// Trail materials built so far
    pub trail_materials_created: usize,
}

impl NullRenderer {
    /// Renderer with every texture available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a texture fail to load.
    pub fn with_missing(mut self, texture: Texture) -> Self {
        self.missing.insert(texture);
        self
    }

    /// Handles not yet released.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    fn allocate(&mut self) -> Handle {
        self.next += 1;
        self.live.insert(self.next);
        self.next
    }
}

impl Renderer for NullRenderer {
    fn load_texture(&mut self, texture: Texture) -> Result<Handle, AssetError> {
        if self.missing.contains(&texture) {
            return Err(AssetError::LoadFailed {
                path: texture.path().to_string(),
                reason: "not found".to_string(),
            });
        }
        Ok(self.allocate())
    }

    fn create_character_model(&mut self, _character: CharacterId, _skin: Option<&ShopItem>) -> Handle {
        self.allocate()
    }

    fn create_trail_material(&mut self, _color: u32) -> Handle {
        self.trail_materials_created += 1;
        self.allocate()
    }

    fn create_obstacle(&mut self, _kind: ObstacleKind) -> Handle {
        self.allocate()
    }

    fn animate_character(&mut self, _handle: Handle, _time_ms: f32) {}

    fn release(&mut self, handle: Handle) {
        self.live.remove(&handle);
    }
}

// =============================================================================
// ASSETS
// =============================================================================

/// Loaded textures; a missing entry means "use the fallback color".
#[derive(Clone, Debug, Default)]
pub struct TextureTable {
    slots: BTreeMap<Texture, Option<Handle>>,
}

impl TextureTable {
    /// Load every texture. Failures are logged and leave the slot empty.
    pub fn load_all<R: Renderer>(renderer: &mut R) -> Self {
        let slots = Texture::ALL
            .into_iter()
            .map(|texture| match renderer.load_texture(texture) {
                Ok(handle) => (texture, Some(handle)),
                Err(e) => {
                    warn!("{}. Using fallback color.", e);
                    (texture, None)
                }
            })
            .collect();
        Self { slots }
    }

    /// Texture handle, if it loaded.
    pub fn get(&self, texture: Texture) -> Option<Handle> {
        self.slots.get(&texture).copied().flatten()
    }

    /// Material base color: white under a texture, else the fallback.
    pub fn base_color(&self, texture: Texture) -> u32 {
        match self.get(texture) {
            Some(_) => 0xffffff,
            None => texture.fallback_color(),
        }
    }
}

/// Colors a character is drawn with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    /// Body color (0xRRGGBB)
    pub body_color: u32,
    /// Trail color (0xRRGGBB)
    pub trail_color: u32,
    /// Trail particle size
    pub trail_size: f32,
}

/// Character colors with a skin applied, if the skin targets it.
pub fn appearance(character: CharacterId, skin: Option<&ShopItem>) -> Appearance {
    let info = character.info();
    match skin.filter(|s| s.based_on == character) {
        Some(skin) => Appearance {
            body_color: skin.color,
            trail_color: skin.trail_color,
            trail_size: info.trail_size,
        },
        None => Appearance {
            body_color: info.base_color,
            trail_color: info.trail_color,
            trail_size: info.trail_size,
        },
    }
}

/// Trail materials, built once per character and color.
#[derive(Clone, Debug, Default)]
pub struct TrailMaterialCache {
    materials: BTreeMap<(CharacterId, u32), Handle>,
}

impl TrailMaterialCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached material for `character`, creating it on first use.
    pub fn get_or_create<R: Renderer>(
        &mut self,
        renderer: &mut R,
        character: CharacterId,
        skin: Option<&ShopItem>,
    ) -> Handle {
        let color = appearance(character, skin).trail_color;
        *self
            .materials
            .entry((character, color))
            .or_insert_with(|| renderer.create_trail_material(color))
    }

    /// Number of cached materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_texture_uses_fallback() {
        let mut renderer = NullRenderer::new().with_missing(Texture::SpaceshipFloor);
        let table = TextureTable::load_all(&mut renderer);

        assert!(table.get(Texture::RocketBody).is_some());
        assert_eq!(table.base_color(Texture::RocketBody), 0xffffff);
        assert_eq!(table.get(Texture::SpaceshipFloor), None);
        assert_eq!(table.base_color(Texture::SpaceshipFloor), 0x1a1a2e);
    }

    #[test]
    fn test_trail_material_created_once() {
        let mut renderer = NullRenderer::new();
        let mut cache = TrailMaterialCache::new();

        let a = cache.get_or_create(&mut renderer, CharacterId::Rocket, None);
        let b = cache.get_or_create(&mut renderer, CharacterId::Rocket, None);
        assert_eq!(a, b);
        assert_eq!(renderer.trail_materials_created, 1);

        cache.get_or_create(&mut renderer, CharacterId::Orb, None);
        assert_eq!(renderer.trail_materials_created, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_skin_changes_trail_material() {
        let mut renderer = NullRenderer::new();
        let mut cache = TrailMaterialCache::new();
        let skin = ShopItem::find("fire_skin");

        let plain = cache.get_or_create(&mut renderer, CharacterId::Rocket, None);
        let skinned = cache.get_or_create(&mut renderer, CharacterId::Rocket, skin);
        assert_ne!(plain, skinned);
    }

    #[test]
    fn test_appearance_ignores_foreign_skin() {
        let skin = ShopItem::find("ice_asteroid");
        let rocket = appearance(CharacterId::Rocket, skin);
        assert_eq!(rocket.trail_color, 0xff4500);

        let asteroid = appearance(CharacterId::Asteroid, skin);
        assert_eq!(asteroid.body_color, 0x7dd3fc);
        assert_eq!(asteroid.trail_color, 0xbfdbfe);
    }

    #[test]
    fn test_release_handles() {
        let mut renderer = NullRenderer::new();
        let model = renderer.create_character_model(CharacterId::Planet, None);
        let obstacle = renderer.create_obstacle(ObstacleKind::Ufo);
        assert_eq!(renderer.live_handles(), 2);

        renderer.release(model);
        renderer.release(obstacle);
        assert_eq!(renderer.live_handles(), 0);
    }
}
