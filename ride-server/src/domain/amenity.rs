//! Ride amenity flags.

use std::fmt;

/// A boolean ride attribute a passenger can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Amenity {
    MaxTwoInBack,
    HeavyLuggage,
    SmokingAllowed,
    PetsAllowed,
    AirConditioning,
}

impl Amenity {
    /// Every amenity, in display order.
    pub const ALL: [Amenity; 5] = [
        Amenity::MaxTwoInBack,
        Amenity::HeavyLuggage,
        Amenity::SmokingAllowed,
        Amenity::PetsAllowed,
        Amenity::AirConditioning,
    ];

    /// The camelCase key used on the wire and in filter query strings.
    pub fn key(self) -> &'static str {
        match self {
            Amenity::MaxTwoInBack => "maxTwoPassengersInBackSeats",
            Amenity::HeavyLuggage => "heavyLuggage",
            Amenity::SmokingAllowed => "smokingAllowed",
            Amenity::PetsAllowed => "petsAllowed",
            Amenity::AirConditioning => "airConditioning",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Amenity::MaxTwoInBack => "Max. 2 passengers in the back",
            Amenity::HeavyLuggage => "Heavy luggage",
            Amenity::SmokingAllowed => "Smoking allowed",
            Amenity::PetsAllowed => "Pets allowed",
            Amenity::AirConditioning => "Air conditioning",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Amenity::MaxTwoInBack => "👥",
            Amenity::HeavyLuggage => "🧳",
            Amenity::SmokingAllowed => "🚬",
            Amenity::PetsAllowed => "🐾",
            Amenity::AirConditioning => "❄️",
        }
    }

    /// Parse an amenity from its wire key. Returns `None` for unknown keys.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

impl fmt::Display for Amenity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The amenity flags of one ride.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Amenities {
    pub max_two_in_back: bool,
    pub heavy_luggage: bool,
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub air_conditioning: bool,
}

impl Amenities {
    /// Whether the given flag is set.
    pub fn has(&self, amenity: Amenity) -> bool {
        match amenity {
            Amenity::MaxTwoInBack => self.max_two_in_back,
            Amenity::HeavyLuggage => self.heavy_luggage,
            Amenity::SmokingAllowed => self.smoking_allowed,
            Amenity::PetsAllowed => self.pets_allowed,
            Amenity::AirConditioning => self.air_conditioning,
        }
    }

    /// Set or clear a flag.
    pub fn set(&mut self, amenity: Amenity, value: bool) {
        let flag = match amenity {
            Amenity::MaxTwoInBack => &mut self.max_two_in_back,
            Amenity::HeavyLuggage => &mut self.heavy_luggage,
            Amenity::SmokingAllowed => &mut self.smoking_allowed,
            Amenity::PetsAllowed => &mut self.pets_allowed,
            Amenity::AirConditioning => &mut self.air_conditioning,
        };
        *flag = value;
    }

    /// Builder-style variant of [`Amenities::set`].
    pub fn with(mut self, amenity: Amenity) -> Self {
        self.set(amenity, true);
        self
    }

    /// The flags that are set, in display order.
    pub fn present(&self) -> impl Iterator<Item = Amenity> + '_ {
        Amenity::ALL.into_iter().filter(|a| self.has(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for amenity in Amenity::ALL {
            assert_eq!(Amenity::parse(amenity.key()), Some(amenity));
        }
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(Amenity::parse("jacuzzi"), None);
        assert_eq!(Amenity::parse(""), None);
        // Keys are case-sensitive
        assert_eq!(Amenity::parse("SmokingAllowed"), None);
    }

    #[test]
    fn set_and_has() {
        let mut a = Amenities::default();
        assert!(!a.has(Amenity::PetsAllowed));

        a.set(Amenity::PetsAllowed, true);
        assert!(a.has(Amenity::PetsAllowed));
        assert!(!a.has(Amenity::SmokingAllowed));

        a.set(Amenity::PetsAllowed, false);
        assert_eq!(a, Amenities::default());
    }

    #[test]
    fn present_in_display_order() {
        let a = Amenities::default()
            .with(Amenity::AirConditioning)
            .with(Amenity::HeavyLuggage);
        let present: Vec<_> = a.present().collect();
        assert_eq!(present, vec![Amenity::HeavyLuggage, Amenity::AirConditioning]);
    }
}
