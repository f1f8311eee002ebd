//! Listing attributes collected from the operator

use crate::error::FormError;
use crate::types::features::{FeatureValue, SuppliedFeatures};
use std::fmt;
use std::str::FromStr;

/// Property categories offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    House,
    Condominium,
    Loft,
    Townhouse,
    GuestSuite,
    Guesthouse,
    Other,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Condominium,
        PropertyType::Loft,
        PropertyType::Townhouse,
        PropertyType::GuestSuite,
        PropertyType::Guesthouse,
        PropertyType::Other,
    ];

    /// Label as it appears in the training data
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "Apartment",
            PropertyType::House => "House",
            PropertyType::Condominium => "Condominium",
            PropertyType::Loft => "Loft",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::GuestSuite => "Guest suite",
            PropertyType::Guesthouse => "Guesthouse",
            PropertyType::Other => "Other",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|candidate| matches_label(s, candidate.label()))
            .ok_or_else(|| FormError::InvalidValue {
                field: "property_type",
                value: s.to_string(),
                reason: format!("expected one of {}", join_labels(PropertyType::ALL.iter().map(|p| p.label()))),
            })
    }
}

/// Room arrangements offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    EntireHome,
    PrivateRoom,
    SharedRoom,
    HotelRoom,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::EntireHome,
        RoomType::PrivateRoom,
        RoomType::SharedRoom,
        RoomType::HotelRoom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoomType::EntireHome => "Entire home/apt",
            RoomType::PrivateRoom => "Private room",
            RoomType::SharedRoom => "Shared room",
            RoomType::HotelRoom => "Hotel room",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RoomType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomType::ALL
            .into_iter()
            .find(|candidate| matches_label(s, candidate.label()))
            .ok_or_else(|| FormError::InvalidValue {
                field: "room_type",
                value: s.to_string(),
                reason: format!("expected one of {}", join_labels(RoomType::ALL.iter().map(|r| r.label()))),
            })
    }
}

/// Case-insensitive match against a label or its kebab-case slug
/// ("Entire home/apt" also accepts "entire-home-apt").
fn matches_label(input: &str, label: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case(label) || input.eq_ignore_ascii_case(&slug(label))
}

fn slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

/// Column names the form writes into
pub mod columns {
    pub const NEIGHBOURHOOD: &str = "neighbourhood_cleansed";
    pub const PROPERTY_TYPE: &str = "property_type";
    pub const ROOM_TYPE: &str = "room_type";
    pub const ACCOMMODATES: &str = "accommodates";
    pub const BEDROOMS: &str = "bedrooms";
    pub const BATHROOMS: &str = "bathrooms";
    pub const AMENITIES: &str = "n_amenities";
    pub const SUPERHOST: &str = "host_is_superhost";
    pub const MINIMUM_NIGHTS: &str = "minimum_nights";
    pub const AVAILABILITY: &str = "availability_365";

    pub const ALL: [&str; 10] = [
        NEIGHBOURHOOD,
        PROPERTY_TYPE,
        ROOM_TYPE,
        ACCOMMODATES,
        BEDROOMS,
        BATHROOMS,
        AMENITIES,
        SUPERHOST,
        MINIMUM_NIGHTS,
        AVAILABILITY,
    ];
}

/// The listing details an operator can fill in.
///
/// Everything else the model knows about is left missing and handled by
/// the imputation baked into the trained pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetails {
    pub neighbourhood: String,
    pub property_type: PropertyType,
    pub room_type: RoomType,
    /// Number of guests (1-16)
    pub accommodates: u32,
    /// 0-10
    pub bedrooms: u32,
    /// 0.0-5.0 in half steps
    pub bathrooms: f64,
    /// Number of listed amenities (0-60)
    pub amenities: u32,
    pub superhost: bool,
    /// 1-30
    pub minimum_nights: u32,
    /// Available days per year (0-365)
    pub availability_365: u32,
}

impl Default for ListingDetails {
    fn default() -> Self {
        Self {
            neighbourhood: "Back Bay".to_string(),
            property_type: PropertyType::Apartment,
            room_type: RoomType::EntireHome,
            accommodates: 4,
            bedrooms: 1,
            bathrooms: 1.0,
            amenities: 15,
            superhost: true,
            minimum_nights: 2,
            availability_365: 200,
        }
    }
}

impl ListingDetails {
    pub const ACCOMMODATES_RANGE: (u32, u32) = (1, 16);
    pub const BEDROOMS_RANGE: (u32, u32) = (0, 10);
    pub const BATHROOMS_RANGE: (f64, f64) = (0.0, 5.0);
    pub const AMENITIES_RANGE: (u32, u32) = (0, 60);
    pub const MINIMUM_NIGHTS_RANGE: (u32, u32) = (1, 30);
    pub const AVAILABILITY_RANGE: (u32, u32) = (0, 365);

    /// Enforce the bounds the form sliders allow
    pub fn validate(&self) -> Result<(), FormError> {
        check_range("accommodates", self.accommodates, Self::ACCOMMODATES_RANGE)?;
        check_range("bedrooms", self.bedrooms, Self::BEDROOMS_RANGE)?;
        check_range("amenities", self.amenities, Self::AMENITIES_RANGE)?;
        check_range("minimum_nights", self.minimum_nights, Self::MINIMUM_NIGHTS_RANGE)?;
        check_range("availability", self.availability_365, Self::AVAILABILITY_RANGE)?;

        let (min, max) = Self::BATHROOMS_RANGE;
        if !(min..=max).contains(&self.bathrooms) {
            return Err(FormError::OutOfRange {
                field: "bathrooms",
                value: self.bathrooms.to_string(),
                min: format!("{:.1}", min),
                max: format!("{:.1}", max),
            });
        }
        if (self.bathrooms * 2.0).fract() != 0.0 {
            return Err(FormError::InvalidValue {
                field: "bathrooms",
                value: self.bathrooms.to_string(),
                reason: "must be a multiple of 0.5".to_string(),
            });
        }

        Ok(())
    }

    /// Map the form fields onto the training column names
    pub fn to_supplied(&self) -> SuppliedFeatures {
        let mut supplied = SuppliedFeatures::with_capacity(columns::ALL.len());
        supplied.insert(columns::NEIGHBOURHOOD.to_string(), self.neighbourhood.clone().into());
        supplied.insert(columns::PROPERTY_TYPE.to_string(), self.property_type.label().into());
        supplied.insert(columns::ROOM_TYPE.to_string(), self.room_type.label().into());
        supplied.insert(columns::ACCOMMODATES.to_string(), self.accommodates.into());
        supplied.insert(columns::BEDROOMS.to_string(), self.bedrooms.into());
        supplied.insert(columns::BATHROOMS.to_string(), FeatureValue::Float(self.bathrooms));
        supplied.insert(columns::AMENITIES.to_string(), self.amenities.into());
        supplied.insert(columns::SUPERHOST.to_string(), self.superhost.into());
        supplied.insert(columns::MINIMUM_NIGHTS.to_string(), self.minimum_nights.into());
        supplied.insert(columns::AVAILABILITY.to_string(), self.availability_365.into());
        supplied
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), FormError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(FormError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        })
    }
}
