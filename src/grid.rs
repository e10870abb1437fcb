//! Bit-packed 50x50 room grids.
//!
//! A `PackedGrid<W>` stores one small unsigned value per room tile. Cells are
//! packed row-major into a byte buffer: 8-bit grids store one cell per byte,
//! 4-bit grids store two cells per byte with the even index in the low nibble
//! and the odd index in the high nibble.
//!
//! The printable form is the packed buffer in the standard base64 alphabet
//! without padding. It is the only format persisted across restarts, so it must
//! not change. Decoding is lenient: decoding stops at the first character
//! outside the alphabet, a dangling final character is dropped, bytes past the
//! buffer length are ignored and cells past the decoded bytes read as 0.
//! `try_decode` is the strict variant for callers that want to detect damage.

use crate::constants::*;
use crate::location::*;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use screeps::{LocalCostMatrix, RoomXY};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::marker::PhantomData;
use thiserror::Error;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) is outside the room")]
    OutOfBounds { x: u8, y: u8 },
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u8, bits: u8 },
    #[error("encoded grid is malformed")]
    Malformed,
}

/// Bit width of a grid cell.
pub trait CellWidth: Copy + Clone + PartialEq + Eq {
    const BITS: u8;
    const MAX: u8;
    /// Size of the packed buffer in bytes.
    const BYTES: usize;

    fn read(buffer: &[u8], index: usize) -> u8;

    fn write(buffer: &mut [u8], index: usize, value: u8);
}

/// Four bits per cell, two cells per byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nibble;

/// Eight bits per cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Byte;

impl CellWidth for Nibble {
    const BITS: u8 = 4;
    const MAX: u8 = 0x0F;
    const BYTES: usize = (ROOM_AREA + 1) / 2;

    #[inline]
    fn read(buffer: &[u8], index: usize) -> u8 {
        let byte = buffer[index / 2];
        if index % 2 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    #[inline]
    fn write(buffer: &mut [u8], index: usize, value: u8) {
        let byte = &mut buffer[index / 2];
        if index % 2 == 0 {
            *byte = (*byte & 0xF0) | (value & 0x0F);
        } else {
            *byte = (*byte & 0x0F) | ((value & 0x0F) << 4);
        }
    }
}

impl CellWidth for Byte {
    const BITS: u8 = 8;
    const MAX: u8 = u8::MAX;
    const BYTES: usize = ROOM_AREA;

    #[inline]
    fn read(buffer: &[u8], index: usize) -> u8 {
        buffer[index]
    }

    #[inline]
    fn write(buffer: &mut [u8], index: usize, value: u8) {
        buffer[index] = value;
    }
}

/// A 50x50 grid of `W::BITS`-wide cells.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedGrid<W: CellWidth> {
    buffer: Vec<u8>,
    width: PhantomData<W>,
}

pub type Grid4 = PackedGrid<Nibble>;
pub type Grid8 = PackedGrid<Byte>;

impl<W: CellWidth> Default for PackedGrid<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: CellWidth> PackedGrid<W> {
    /// A grid with every cell set to 0.
    pub fn new() -> Self {
        PackedGrid {
            buffer: vec![0; W::BYTES],
            width: PhantomData,
        }
    }

    /// A grid with every cell set to `value`.
    pub fn filled(value: u8) -> Result<Self, GridError> {
        Self::check_value(value)?;

        let mut grid = Self::new();
        for index in 0..ROOM_AREA {
            W::write(&mut grid.buffer, index, value);
        }
        Ok(grid)
    }

    /// Build a grid from a packed buffer. Missing bytes read as 0, extra bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut grid = Self::new();
        let len = bytes.len().min(W::BYTES);
        grid.buffer[..len].copy_from_slice(&bytes[..len]);
        grid
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn check_value(value: u8) -> Result<(), GridError> {
        if value > W::MAX {
            Err(GridError::ValueOutOfRange { value, bits: W::BITS })
        } else {
            Ok(())
        }
    }

    fn index_of(x: u8, y: u8) -> Result<usize, GridError> {
        if x >= ROOM_WIDTH || y >= ROOM_HEIGHT {
            return Err(GridError::OutOfBounds { x, y });
        }
        Ok(y as usize * ROOM_WIDTH as usize + x as usize)
    }

    pub fn get(&self, x: u8, y: u8) -> Result<u8, GridError> {
        Self::index_of(x, y).map(|index| W::read(&self.buffer, index))
    }

    pub fn set(&mut self, x: u8, y: u8, value: u8) -> Result<(), GridError> {
        Self::check_value(value)?;
        let index = Self::index_of(x, y)?;
        W::write(&mut self.buffer, index, value);
        Ok(())
    }

    /// Cell value at a location. Locations outside the room read as 0.
    #[inline]
    pub fn at(&self, loc: Location) -> u8 {
        self.get(loc.x(), loc.y()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, u8)> + '_ {
        (0..ROOM_AREA).map(move |index| {
            let x = (index % ROOM_WIDTH as usize) as u8;
            let y = (index / ROOM_WIDTH as usize) as u8;
            (Location::from_xy(x, y), W::read(&self.buffer, index))
        })
    }

    /// Printable form of the packed buffer.
    pub fn encode(&self) -> String {
        ENGINE.encode(&self.buffer)
    }

    /// Lenient inverse of `encode`; never fails.
    pub fn decode(encoded: &str) -> Self {
        let valid_len = encoded
            .bytes()
            .position(|b| !is_alphabet_byte(b))
            .unwrap_or(encoded.len());

        let mut usable = &encoded[..valid_len];
        if usable.len() % 4 == 1 {
            usable = &usable[..usable.len() - 1];
        }

        let bytes = ENGINE.decode(usable).unwrap_or_default();
        Self::from_bytes(&bytes)
    }

    /// Strict inverse of `encode`: the input must decode to exactly one full buffer.
    pub fn try_decode(encoded: &str) -> Result<Self, GridError> {
        let bytes = ENGINE.decode(encoded).map_err(|_| GridError::Malformed)?;
        if bytes.len() != W::BYTES {
            return Err(GridError::Malformed);
        }
        Ok(Self::from_bytes(&bytes))
    }

    /// Copy into a pathfinder cost matrix.
    pub fn to_cost_matrix(&self) -> LocalCostMatrix {
        let mut matrix = LocalCostMatrix::new();
        for (loc, value) in self.iter() {
            if let Ok(xy) = RoomXY::checked_new(loc.x(), loc.y()) {
                matrix.set(xy, value);
            }
        }
        matrix
    }

    /// Copy from a pathfinder cost matrix. Fails if any cost exceeds the cell width.
    pub fn from_cost_matrix(matrix: &LocalCostMatrix) -> Result<Self, GridError> {
        let mut grid = Self::new();
        for y in 0..ROOM_HEIGHT {
            for x in 0..ROOM_WIDTH {
                if let Ok(xy) = RoomXY::checked_new(x, y) {
                    grid.set(x, y, matrix.get(xy))?;
                }
            }
        }
        Ok(grid)
    }
}

fn is_alphabet_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

impl<W: CellWidth> std::fmt::Debug for PackedGrid<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.iter().filter(|(_, v)| *v != 0).count();
        f.debug_struct("PackedGrid")
            .field("bits", &W::BITS)
            .field("non_zero", &non_zero)
            .finish()
    }
}

impl<W: CellWidth> Serialize for PackedGrid<W> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode().serialize(serializer)
    }
}

impl<'de, W: CellWidth> Deserialize<'de> for PackedGrid<W> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        match Self::try_decode(&encoded) {
            Ok(grid) => Ok(grid),
            Err(err) => {
                log::warn!("Recovering damaged {}-bit grid: {}", W::BITS, err);
                Ok(Self::decode(&encoded))
            }
        }
    }
}
