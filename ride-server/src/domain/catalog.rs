//! Enumerated option sets shared by every form and view.
//!
//! Cities and vehicle body types are defined once here and reused by the
//! search form, the publish form and the ride pages.

use std::fmt;

/// A city offered as a ride origin or destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum City {
    Ariana,
    BenArous,
    Bizerte,
    Beja,
    Gabes,
    Gafsa,
    Jendouba,
    Kairouan,
    Kasserine,
    Kebili,
    Kef,
    Mahdia,
    Manouba,
    Medenine,
    Monastir,
    Nabeul,
    Sfax,
    SidiBouzid,
    Siliana,
    Sousse,
    Tataouine,
    Tozeur,
    Tunis,
    Zaghouan,
}

impl City {
    /// Every city, in menu order.
    pub const ALL: [City; 24] = [
        City::Ariana,
        City::BenArous,
        City::Bizerte,
        City::Beja,
        City::Gabes,
        City::Gafsa,
        City::Jendouba,
        City::Kairouan,
        City::Kasserine,
        City::Kebili,
        City::Kef,
        City::Mahdia,
        City::Manouba,
        City::Medenine,
        City::Monastir,
        City::Nabeul,
        City::Sfax,
        City::SidiBouzid,
        City::Siliana,
        City::Sousse,
        City::Tataouine,
        City::Tozeur,
        City::Tunis,
        City::Zaghouan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            City::Ariana => "Ariana",
            City::BenArous => "Ben Arous",
            City::Bizerte => "Bizerte",
            City::Beja => "Béja",
            City::Gabes => "Gabès",
            City::Gafsa => "Gafsa",
            City::Jendouba => "Jendouba",
            City::Kairouan => "Kairouan",
            City::Kasserine => "Kasserine",
            City::Kebili => "Kebili",
            City::Kef => "Kef",
            City::Mahdia => "Mahdia",
            City::Manouba => "Manouba",
            City::Medenine => "Medenine",
            City::Monastir => "Monastir",
            City::Nabeul => "Nabeul",
            City::Sfax => "Sfax",
            City::SidiBouzid => "Sidi Bouzid",
            City::Siliana => "Siliana",
            City::Sousse => "Sousse",
            City::Tataouine => "Tataouine",
            City::Tozeur => "Tozeur",
            City::Tunis => "Tunis",
            City::Zaghouan => "Zaghouan",
        }
    }

    /// Stable lowercase slug, e.g. `benarous`, `beja`.
    pub fn slug(self) -> String {
        slugify(self.name())
    }

    /// Image shown for the city on ride pages.
    pub fn image_path(self) -> String {
        format!("/static/cities/{}.svg", self.slug())
    }

    /// Find a city by display name or slug, ignoring case, accents,
    /// spaces and hyphens.
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_server::domain::City;
    ///
    /// assert_eq!(City::find("Béja"), Some(City::Beja));
    /// assert_eq!(City::find("beja"), Some(City::Beja));
    /// assert_eq!(City::find("ben-arous"), Some(City::BenArous));
    /// assert_eq!(City::find("Paris"), None);
    /// ```
    pub fn find(s: &str) -> Option<Self> {
        let wanted = slugify(s);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|c| c.slug() == wanted)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image for a free-text place name, falling back to a default picture.
pub fn place_image(place: &str) -> String {
    City::find(place)
        .map(City::image_path)
        .unwrap_or_else(|| "/static/cities/default.svg".to_string())
}

/// Lowercase, strip common Latin accents, drop spaces and hyphens.
fn slugify(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Vehicle body style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    CityCar,
    Compact,
    Sedan,
    Suv,
    Coupe,
    Minivan,
    Utility,
    Pickup,
    Convertible,
}

impl BodyType {
    pub const ALL: [BodyType; 9] = [
        BodyType::CityCar,
        BodyType::Compact,
        BodyType::Sedan,
        BodyType::Suv,
        BodyType::Coupe,
        BodyType::Minivan,
        BodyType::Utility,
        BodyType::Pickup,
        BodyType::Convertible,
    ];

    /// The value stored by the backend.
    pub fn value(self) -> &'static str {
        match self {
            BodyType::CityCar => "citadine",
            BodyType::Compact => "compacte",
            BodyType::Sedan => "berline",
            BodyType::Suv => "suv",
            BodyType::Coupe => "coupe",
            BodyType::Minivan => "monospace",
            BodyType::Utility => "utilitaire",
            BodyType::Pickup => "pickup",
            BodyType::Convertible => "cabriolet",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BodyType::CityCar => "City car",
            BodyType::Compact => "Compact",
            BodyType::Sedan => "Sedan",
            BodyType::Suv => "SUV",
            BodyType::Coupe => "Coupe",
            BodyType::Minivan => "Minivan",
            BodyType::Utility => "Utility vehicle",
            BodyType::Pickup => "Pickup",
            BodyType::Convertible => "Convertible",
        }
    }

    pub fn image_path(self) -> String {
        format!("/static/cars/{}.svg", self.value())
    }

    /// Parse a backend value. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.value() == value)
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
