//! Shop Ledger
//!
//! Cosmetic skins bought with stars. Purchases are monotonic; at most one
//! item is equipped at a time.

use serde::Serialize;
use tracing::info;

use crate::game::catalog::CharacterId;
use crate::progression::profile::PlayerProfile;

/// Shop operation failures. None of them change the profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopError {
    /// No catalog entry with this id
    #[error("unknown shop item: {0}")]
    UnknownItem(String),

    /// Balance below the item price
    #[error("insufficient funds: need {price}, have {balance}")]
    InsufficientFunds { price: u32, balance: u32 },

    /// Item already purchased
    #[error("item already owned: {0}")]
    AlreadyOwned(String),

    /// Equip requested for an item that was never bought
    #[error("item not owned: {0}")]
    NotOwned(String),
}

/// Shop catalog entry. Every item is a skin recoloring one character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    /// Item id, stored in the purchases list
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Price in stars
    pub price: u32,
    /// Character the skin applies to
    pub based_on: CharacterId,
    /// Body color override (0xRRGGBB)
    pub color: u32,
    /// Trail color override (0xRRGGBB)
    pub trail_color: u32,
}

/// Shop catalog, in display order.
pub static SHOP_ITEMS: [ShopItem; 4] = [
    ShopItem {
        id: "nebula_skin",
        name: "Nebula Cruiser",
        price: 50,
        based_on: CharacterId::Rocket,
        color: 0x9333ea,
        trail_color: 0xc084fc,
    },
    ShopItem {
        id: "fire_skin",
        name: "Inferno Rocket",
        price: 75,
        based_on: CharacterId::Rocket,
        color: 0xff3333,
        trail_color: 0xff6b00,
    },
    ShopItem {
        id: "ice_asteroid",
        name: "Frozen Comet",
        price: 100,
        based_on: CharacterId::Asteroid,
        color: 0x7dd3fc,
        trail_color: 0xbfdbfe,
    },
    ShopItem {
        id: "decahedron_skin",
        name: "Quantum Decahedron",
        price: 150,
        based_on: CharacterId::Hypercube,
        color: 0x38bdf8,
        trail_color: 0x67e8f9,
    },
];

impl ShopItem {
    /// Look up a catalog entry.
    pub fn find(id: &str) -> Option<&'static ShopItem> {
        SHOP_ITEMS.iter().find(|item| item.id == id)
    }
}

/// Buy an item.
///
/// Funds are checked before ownership. On success the debit and the grant
/// happen together.
pub fn buy(profile: &mut PlayerProfile, item_id: &str) -> Result<&'static ShopItem, ShopError> {
    let item = ShopItem::find(item_id).ok_or_else(|| ShopError::UnknownItem(item_id.to_string()))?;

    // An owned item the player cannot afford reports the funds error
    if profile.owns(item.id) && profile.can_afford(item.price) {
        return Err(ShopError::AlreadyOwned(item.id.to_string()));
    }
    if !profile.debit(item.price) {
        return Err(ShopError::InsufficientFunds {
            price: item.price,
            balance: profile.currency,
        });
    }
    profile.owned_items.insert(item.id.to_string());

    info!("Purchased {} for {} stars ({} left)", item.id, item.price, profile.currency);
    Ok(item)
}

/// Equip an owned item, replacing any current one.
pub fn equip(profile: &mut PlayerProfile, item_id: &str) -> Result<&'static ShopItem, ShopError> {
    let item = ShopItem::find(item_id).ok_or_else(|| ShopError::UnknownItem(item_id.to_string()))?;
    if !profile.owns(item.id) {
        return Err(ShopError::NotOwned(item.id.to_string()));
    }
    profile.equipped_item = Some(item.id.to_string());
    Ok(item)
}

/// Clear the equipped item. Returns true if something was equipped.
pub fn unequip(profile: &mut PlayerProfile) -> bool {
    profile.equipped_item.take().is_some()
}
