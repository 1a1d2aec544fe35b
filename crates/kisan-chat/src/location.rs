//! Location heuristic for outbound text requests.

/// Pulls a place name out of free text.
pub trait LocationExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<String>;
}

/// Major Indian cities first, then states. Earlier entries win.
const MAJOR_PLACES: &[&str] = &[
    "Delhi",
    "Mumbai",
    "Kolkata",
    "Chennai",
    "Bangalore",
    "Hyderabad",
    "Pune",
    "Ahmedabad",
    "Jaipur",
    "Lucknow",
    "Chandigarh",
    "Ludhiana",
    "Amritsar",
    "Nagpur",
    "Indore",
    "Bhopal",
    "Patna",
    "Surat",
    "Nashik",
    "Karnal",
    "Punjab",
    "Haryana",
    "Maharashtra",
    "Gujarat",
    "Rajasthan",
    "Karnataka",
    "Telangana",
    "Tamil Nadu",
    "Uttar Pradesh",
    "Madhya Pradesh",
    "Bihar",
    "West Bengal",
    "Kerala",
    "Odisha",
];

/// Case-insensitive substring match against a fixed list of place names.
#[derive(Debug, Clone)]
pub struct CityListExtractor {
    places: Vec<String>,
}

impl Default for CityListExtractor {
    fn default() -> Self {
        Self::new(MAJOR_PLACES.iter().map(|p| p.to_string()).collect())
    }
}

impl CityListExtractor {
    pub fn new(places: Vec<String>) -> Self {
        Self { places }
    }
}

impl LocationExtractor for CityListExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        let haystack = text.to_lowercase();
        self.places
            .iter()
            .find(|place| haystack.contains(&place.to_lowercase()))
            .cloned()
    }
}
