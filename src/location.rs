use crate::constants::*;
use crate::terrain::NEIGHBORS_8;
use serde::*;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Location {
    packed: u16,
}

impl Location {
    pub fn from_coords(x: u32, y: u32) -> Self {
        Location {
            packed: ((x << 8) | y) as u16,
        }
    }

    #[inline]
    pub fn from_xy(x: u8, y: u8) -> Self {
        Self::from_coords(x as u32, y as u32)
    }

    /// Build a location from signed coordinates, returning `None` outside the room.
    pub fn checked_new(x: i16, y: i16) -> Option<Self> {
        if (0..ROOM_WIDTH as i16).contains(&x) && (0..ROOM_HEIGHT as i16).contains(&y) {
            Some(Self::from_xy(x as u8, y as u8))
        } else {
            None
        }
    }

    #[inline]
    pub fn x(self) -> u8 {
        ((self.packed >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn y(self) -> u8 {
        (self.packed & 0xFF) as u8
    }

    #[inline]
    pub fn packed_repr(self) -> u16 {
        self.packed
    }

    #[inline]
    pub fn from_packed(packed: u16) -> Self {
        Location { packed }
    }

    /// Row-major index into a 50x50 room buffer.
    #[inline]
    pub fn index(self) -> usize {
        self.y() as usize * ROOM_WIDTH as usize + self.x() as usize
    }

    pub fn distance_to(self, other: Self) -> u8 {
        let dx = (self.x() as i16) - (other.x() as i16);
        let dy = (self.y() as i16) - (other.y() as i16);

        dx.abs().max(dy.abs()) as u8
    }

    /// The in-room 8-connected neighbours of this tile.
    pub fn neighbors(self) -> impl Iterator<Item = Location> {
        NEIGHBORS_8
            .iter()
            .filter_map(move |&(dx, dy)| Location::checked_new(self.x() as i16 + dx as i16, self.y() as i16 + dy as i16))
    }
}

impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.packed_repr().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let location = Location::from_packed(u16::deserialize(deserializer)?);

        if location.x() >= ROOM_WIDTH || location.y() >= ROOM_HEIGHT {
            return Err(de::Error::custom(format!(
                "location ({}, {}) is outside the room",
                location.x(),
                location.y()
            )));
        }

        Ok(location)
    }
}
