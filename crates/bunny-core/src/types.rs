//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a v4 id from random bits drawn by the caller, so seeded runs stay reproducible.
    pub fn from_random_bits(bits: u128) -> Self {
        Self(uuid::Builder::from_random_bytes(bits.to_le_bytes()).into_uuid())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D position on the grid. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chessboard distance: the radius of the smallest square window containing both points
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Courtesy title used in lifecycle messages
    pub fn title(&self) -> &'static str {
        match self {
            Sex::Male => "Lord",
            Sex::Female => "Lady",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}

/// Cosmetic coat color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Brown,
    Grey,
    Black,
    Gold,
    Silver,
    Red,
}

impl Color {
    /// Colors a seeded noble may be born with
    pub const SEEDABLE: [Color; 6] = [
        Color::White,
        Color::Brown,
        Color::Grey,
        Color::Black,
        Color::Gold,
        Color::Silver,
    ];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The closed set of agent kinds: four noble houses, the infected kind and the apex predator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Stark,
    Baratheon,
    Lannister,
    Targaryen,
    WhiteWalker,
    Dragon,
}

struct KindTraits {
    name: &'static str,
    adult_glyph: char,
    young_glyph: char,
    sigil: Option<&'static str>,
    saying: Option<&'static str>,
    breedable: bool,
    immortal: bool,
}

// Indexed by `Kind as usize`.
const KIND_TABLE: [KindTraits; 6] = [
    KindTraits {
        name: "Stark",
        adult_glyph: 'S',
        young_glyph: 's',
        sigil: Some("Wolf"),
        saying: Some("Winter Is Coming!"),
        breedable: true,
        immortal: false,
    },
    KindTraits {
        name: "Baratheon",
        adult_glyph: 'B',
        young_glyph: 'b',
        sigil: Some("Stag"),
        saying: Some("Ours Is The Fury!"),
        breedable: true,
        immortal: false,
    },
    KindTraits {
        name: "Lannister",
        adult_glyph: 'L',
        young_glyph: 'l',
        sigil: Some("Lion"),
        saying: Some("Hear Me Roar!"),
        breedable: true,
        immortal: false,
    },
    KindTraits {
        name: "Targaryen",
        adult_glyph: 'T',
        young_glyph: 't',
        sigil: Some("Dragon"),
        saying: Some("Fire And Blood!"),
        breedable: true,
        immortal: false,
    },
    KindTraits {
        name: "White Walker",
        adult_glyph: 'W',
        young_glyph: 'W',
        sigil: None,
        saying: None,
        breedable: false,
        immortal: false,
    },
    KindTraits {
        name: "Dragon",
        adult_glyph: 'D',
        young_glyph: 'D',
        sigil: None,
        saying: None,
        breedable: false,
        immortal: true,
    },
];

// DOMINANCE[attacker][defender] for the four houses, in declaration order.
const DOMINANCE: [[bool; 4]; 4] = [
    // Stark
    [false, false, false, true],
    // Baratheon
    [true, false, false, true],
    // Lannister
    [true, true, false, false],
    // Targaryen
    [false, false, true, false],
];

impl Kind {
    pub const HOUSES: [Kind; 4] = [Kind::Stark, Kind::Baratheon, Kind::Lannister, Kind::Targaryen];

    pub const ALL: [Kind; 6] = [
        Kind::Stark,
        Kind::Baratheon,
        Kind::Lannister,
        Kind::Targaryen,
        Kind::WhiteWalker,
        Kind::Dragon,
    ];

    fn traits(self) -> &'static KindTraits {
        &KIND_TABLE[self as usize]
    }

    fn house_index(self) -> Option<usize> {
        match self {
            Kind::Stark | Kind::Baratheon | Kind::Lannister | Kind::Targaryen => Some(self as usize),
            Kind::WhiteWalker | Kind::Dragon => None,
        }
    }

    pub fn name(self) -> &'static str {
        self.traits().name
    }

    /// Grid glyph; houses render juveniles in lower case
    pub fn glyph(self, adult: bool) -> char {
        let traits = self.traits();
        if adult {
            traits.adult_glyph
        } else {
            traits.young_glyph
        }
    }

    pub fn sigil(self) -> Option<&'static str> {
        self.traits().sigil
    }

    pub fn saying(self) -> Option<&'static str> {
        self.traits().saying
    }

    pub fn is_house(self) -> bool {
        self.house_index().is_some()
    }

    pub fn is_breedable(self) -> bool {
        self.traits().breedable
    }

    pub fn is_infected(self) -> bool {
        self == Kind::WhiteWalker
    }

    pub fn is_immortal(self) -> bool {
        self.traits().immortal
    }

    /// Whether an attacker of this kind beats `defender` outright.
    ///
    /// Only defined between houses; any other pairing is `false`.
    pub fn dominates(self, defender: Kind) -> bool {
        match (self.house_index(), defender.house_index()) {
            (Some(a), Some(d)) => DOMINANCE[a][d],
            _ => false,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
