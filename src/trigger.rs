//! Global Alt+1..Alt+9 trigger registration.
//!
//! Each [`Slot`] maps to exactly one fixed hotkey and therefore to exactly
//! one hotkey id. Registration claims all nine independently and releases
//! whatever it claimed when dropped.

use global_hotkey::{
    GlobalHotKeyManager,
    hotkey::{Code, HotKey, Modifiers},
};
use tracing::{info, warn};

use crate::snippets::Slot;

/// The fixed key combination for a slot.
pub fn hotkey(slot: Slot) -> HotKey {
    let code = match slot {
        Slot::Slot1 => Code::Digit1,
        Slot::Slot2 => Code::Digit2,
        Slot::Slot3 => Code::Digit3,
        Slot::Slot4 => Code::Digit4,
        Slot::Slot5 => Code::Digit5,
        Slot::Slot6 => Code::Digit6,
        Slot::Slot7 => Code::Digit7,
        Slot::Slot8 => Code::Digit8,
        Slot::Slot9 => Code::Digit9,
    };
    HotKey::new(Some(Modifiers::ALT), code)
}

/// Trigger id delivered by the OS when `slot`'s combination fires.
pub fn trigger_id(slot: Slot) -> u32 {
    hotkey(slot).id()
}

/// Resolve a trigger id back to its slot.
pub fn resolve(id: u32) -> Option<Slot> {
    Slot::ALL.into_iter().find(|&slot| trigger_id(slot) == id)
}

/// Something that can claim and release global hotkeys.
pub trait HotkeyRegistrar {
    /// Claim `hotkey` system-wide.
    fn register(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;
    /// Release a previously claimed `hotkey`.
    fn unregister(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;
}

impl HotkeyRegistrar for GlobalHotKeyManager {
    fn register(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        Self::register(self, hotkey)
    }

    fn unregister(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        Self::unregister(self, hotkey)
    }
}

/// Set of slots whose trigger is currently claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationMask(u16);

impl RegistrationMask {
    /// Mask with every slot set.
    pub const ALL: Self = Self(0b1_1111_1111);

    /// Whether `slot` is in the mask.
    pub const fn contains(self, slot: Slot) -> bool {
        self.0 & (1 << slot.index()) != 0
    }

    /// Add `slot` to the mask.
    pub const fn insert(&mut self, slot: Slot) {
        self.0 |= 1 << slot.index();
    }

    /// Remove `slot` from the mask.
    pub const fn remove(&mut self, slot: Slot) {
        self.0 &= !(1 << slot.index());
    }

    /// Number of slots in the mask.
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether no slot is in the mask.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Slots in the mask, in trigger order.
    pub fn slots(self) -> impl Iterator<Item = Slot> {
        Slot::ALL.into_iter().filter(move |&slot| self.contains(slot))
    }
}

/// Holds the claim on the nine trigger combinations.
pub struct TriggerRegistration<R: HotkeyRegistrar> {
    /// Backend that talks to the OS
    registrar: R,
    /// Slots currently claimed
    claimed: RegistrationMask,
}

impl<R: HotkeyRegistrar> TriggerRegistration<R> {
    /// Claim all nine combinations. A failure on one does not stop the rest.
    pub fn register_all(registrar: R) -> Self {
        let mut claimed = RegistrationMask::default();
        for slot in Slot::ALL {
            match registrar.register(hotkey(slot)) {
                Ok(()) => claimed.insert(slot),
                Err(e) => warn!("Could not register {}: {}", slot, e),
            }
        }

        if claimed == RegistrationMask::ALL {
            info!("Registered triggers Alt+1..Alt+9");
        } else {
            warn!("Registered {} of 9 triggers", claimed.len());
        }

        Self { registrar, claimed }
    }

    /// Slots whose combination this process holds.
    pub const fn mask(&self) -> RegistrationMask {
        self.claimed
    }

    /// Release every claimed combination.
    pub fn unregister_all(&mut self) {
        for slot in self.claimed.slots() {
            if let Err(e) = self.registrar.unregister(hotkey(slot)) {
                warn!("Could not unregister {}: {}", slot, e);
            }
            self.claimed.remove(slot);
        }
    }
}

impl<R: HotkeyRegistrar> Drop for TriggerRegistration<R> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}
