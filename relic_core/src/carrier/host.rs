//! CarrierHost - Where carriers live (held slot, worn slots, pack slots)

use super::Carrier;
use crate::types::{ActorRef, CarrierId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Address of a carrier inside a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierSlot {
    /// Currently held item
    Hand,
    /// Worn equipment, by index
    Worn(usize),
    /// General inventory, by index
    Pack(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown slot '{0}', expected hand, worn:N or pack:N")]
pub struct SlotParseError(pub String);

impl std::str::FromStr for CarrierSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("hand") {
            return Ok(CarrierSlot::Hand);
        }
        let (kind, index) = s
            .split_once(':')
            .ok_or_else(|| SlotParseError(s.to_string()))?;
        let index: usize = index.parse().map_err(|_| SlotParseError(s.to_string()))?;
        match kind {
            "worn" => Ok(CarrierSlot::Worn(index)),
            "pack" => Ok(CarrierSlot::Pack(index)),
            _ => Err(SlotParseError(s.to_string())),
        }
    }
}

impl fmt::Display for CarrierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierSlot::Hand => write!(f, "hand"),
            CarrierSlot::Worn(i) => write!(f, "worn:{}", i),
            CarrierSlot::Pack(i) => write!(f, "pack:{}", i),
        }
    }
}

/// Anything that owns addressable carriers.
///
/// The engines never keep references into a host across calls; they address
/// carriers by slot and re-resolve them through this trait each time.
pub trait CarrierHost {
    /// Actor owning this host, if any
    fn owner(&self) -> Option<&ActorRef>;

    fn carrier(&self, slot: CarrierSlot) -> Option<&Carrier>;

    fn carrier_mut(&mut self, slot: CarrierSlot) -> Option<&mut Carrier>;

    /// Place a carrier in a slot, returning the previous occupant
    fn put(&mut self, slot: CarrierSlot, carrier: Carrier) -> Option<Carrier>;

    /// Occupied slots: held slot first, then every other slot in scan order
    fn occupied_slots(&self) -> Vec<CarrierSlot>;

    /// Find a carrier by identity: held slot first, then a linear scan
    fn locate(&self, id: CarrierId) -> Option<CarrierSlot> {
        self.occupied_slots()
            .into_iter()
            .find(|slot| self.carrier(*slot).and_then(Carrier::identity) == Some(id))
    }
}

/// Built-in host: a held slot, worn equipment and a pack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub owner: Option<ActorRef>,
    pub hand: Option<Carrier>,
    pub worn: Vec<Option<Carrier>>,
    pub pack: Vec<Option<Carrier>>,
}

impl Inventory {
    /// Inventory owned by an actor
    pub fn for_actor(owner: ActorRef) -> Self {
        Inventory {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Ownerless pile of carriers, e.g. a death drop set
    pub fn loose(carriers: Vec<Carrier>) -> Self {
        Inventory {
            owner: None,
            hand: None,
            worn: Vec::new(),
            pack: carriers.into_iter().map(Some).collect(),
        }
    }

    pub fn with_hand(mut self, carrier: Carrier) -> Self {
        self.hand = Some(carrier);
        self
    }

    pub fn with_worn(mut self, carrier: Carrier) -> Self {
        self.worn.push(Some(carrier));
        self
    }

    pub fn with_pack(mut self, carrier: Carrier) -> Self {
        self.pack.push(Some(carrier));
        self
    }

    /// Remove a carrier, leaving the slot empty
    pub fn take(&mut self, slot: CarrierSlot) -> Option<Carrier> {
        match slot {
            CarrierSlot::Hand => self.hand.take(),
            CarrierSlot::Worn(i) => self.worn.get_mut(i).and_then(Option::take),
            CarrierSlot::Pack(i) => self.pack.get_mut(i).and_then(Option::take),
        }
    }

    /// Swap the held item with a pack slot
    pub fn swap_hand_with_pack(&mut self, index: usize) {
        if index >= self.pack.len() {
            self.pack.resize_with(index + 1, || None);
        }
        std::mem::swap(&mut self.hand, &mut self.pack[index]);
    }

    pub fn len(&self) -> usize {
        self.occupied_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slot_in(slots: &mut Vec<Option<Carrier>>, index: usize, carrier: Carrier) -> Option<Carrier> {
    if index >= slots.len() {
        slots.resize_with(index + 1, || None);
    }
    slots[index].replace(carrier)
}

impl CarrierHost for Inventory {
    fn owner(&self) -> Option<&ActorRef> {
        self.owner.as_ref()
    }

    fn carrier(&self, slot: CarrierSlot) -> Option<&Carrier> {
        match slot {
            CarrierSlot::Hand => self.hand.as_ref(),
            CarrierSlot::Worn(i) => self.worn.get(i).and_then(Option::as_ref),
            CarrierSlot::Pack(i) => self.pack.get(i).and_then(Option::as_ref),
        }
    }

    fn carrier_mut(&mut self, slot: CarrierSlot) -> Option<&mut Carrier> {
        match slot {
            CarrierSlot::Hand => self.hand.as_mut(),
            CarrierSlot::Worn(i) => self.worn.get_mut(i).and_then(Option::as_mut),
            CarrierSlot::Pack(i) => self.pack.get_mut(i).and_then(Option::as_mut),
        }
    }

    fn put(&mut self, slot: CarrierSlot, carrier: Carrier) -> Option<Carrier> {
        match slot {
            CarrierSlot::Hand => self.hand.replace(carrier),
            CarrierSlot::Worn(i) => slot_in(&mut self.worn, i, carrier),
            CarrierSlot::Pack(i) => slot_in(&mut self.pack, i, carrier),
        }
    }

    fn occupied_slots(&self) -> Vec<CarrierSlot> {
        let hand = self.hand.iter().map(|_| CarrierSlot::Hand);
        let worn = self
            .worn
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(i, _)| CarrierSlot::Worn(i));
        let pack = self
            .pack
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(i, _)| CarrierSlot::Pack(i));
        hand.chain(worn).chain(pack).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slots() {
        assert_eq!("hand".parse::<CarrierSlot>(), Ok(CarrierSlot::Hand));
        assert_eq!("worn:2".parse::<CarrierSlot>(), Ok(CarrierSlot::Worn(2)));
        assert_eq!("pack:10".parse::<CarrierSlot>(), Ok(CarrierSlot::Pack(10)));
        assert!("belt:1".parse::<CarrierSlot>().is_err());
        assert!("pack:x".parse::<CarrierSlot>().is_err());
        assert_eq!(CarrierSlot::Pack(3).to_string(), "pack:3");
    }

    #[test]
    fn test_locate_prefers_hand_then_scans() {
        let mut sword = Carrier::new("relic:sword");
        let id = sword.ensure_identity(0);
        let mut inv = Inventory::for_actor(ActorRef::new("p1", "Alex"))
            .with_pack(Carrier::new("relic:dirt").with_count(32))
            .with_pack(sword);

        assert_eq!(inv.locate(id), Some(CarrierSlot::Pack(1)));

        inv.swap_hand_with_pack(1);
        assert_eq!(inv.locate(id), Some(CarrierSlot::Hand));
        assert!(inv.carrier(CarrierSlot::Pack(1)).is_none());
    }

    #[test]
    fn test_put_grows_slots() {
        let mut inv = Inventory::default();
        assert!(inv.put(CarrierSlot::Worn(3), Carrier::new("relic:boots")).is_none());
        assert_eq!(inv.worn.len(), 4);
        assert_eq!(inv.occupied_slots(), vec![CarrierSlot::Worn(3)]);
    }

    #[test]
    fn test_loose_pile_has_no_owner() {
        let pile = Inventory::loose(vec![Carrier::new("relic:a"), Carrier::new("relic:b")]);
        assert!(pile.owner().is_none());
        assert_eq!(pile.len(), 2);
    }
}
