//! ISO country directory for display and lookup helpers.
//!
//! Coercion of the `country` type is a format-only check; this directory is
//! only consulted when formatting stored codes for display.

use rand::rngs::StdRng;
use rand::Rng;

/// One directory entry: alpha-2 code, alpha-3 code, English short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub name: &'static str,
}

const DIRECTORY: &[Country] = &[
    Country { alpha2: "AR", alpha3: "ARG", name: "Argentina" },
    Country { alpha2: "AU", alpha3: "AUS", name: "Australia" },
    Country { alpha2: "AT", alpha3: "AUT", name: "Austria" },
    Country { alpha2: "BE", alpha3: "BEL", name: "Belgium" },
    Country { alpha2: "BR", alpha3: "BRA", name: "Brazil" },
    Country { alpha2: "CA", alpha3: "CAN", name: "Canada" },
    Country { alpha2: "CL", alpha3: "CHL", name: "Chile" },
    Country { alpha2: "CN", alpha3: "CHN", name: "China" },
    Country { alpha2: "CO", alpha3: "COL", name: "Colombia" },
    Country { alpha2: "CZ", alpha3: "CZE", name: "Czechia" },
    Country { alpha2: "DK", alpha3: "DNK", name: "Denmark" },
    Country { alpha2: "EG", alpha3: "EGY", name: "Egypt" },
    Country { alpha2: "FI", alpha3: "FIN", name: "Finland" },
    Country { alpha2: "FR", alpha3: "FRA", name: "France" },
    Country { alpha2: "DE", alpha3: "DEU", name: "Germany" },
    Country { alpha2: "GR", alpha3: "GRC", name: "Greece" },
    Country { alpha2: "IN", alpha3: "IND", name: "India" },
    Country { alpha2: "ID", alpha3: "IDN", name: "Indonesia" },
    Country { alpha2: "IE", alpha3: "IRL", name: "Ireland" },
    Country { alpha2: "IL", alpha3: "ISR", name: "Israel" },
    Country { alpha2: "IT", alpha3: "ITA", name: "Italy" },
    Country { alpha2: "JP", alpha3: "JPN", name: "Japan" },
    Country { alpha2: "KE", alpha3: "KEN", name: "Kenya" },
    Country { alpha2: "MX", alpha3: "MEX", name: "Mexico" },
    Country { alpha2: "NL", alpha3: "NLD", name: "Netherlands" },
    Country { alpha2: "NZ", alpha3: "NZL", name: "New Zealand" },
    Country { alpha2: "NG", alpha3: "NGA", name: "Nigeria" },
    Country { alpha2: "NO", alpha3: "NOR", name: "Norway" },
    Country { alpha2: "PL", alpha3: "POL", name: "Poland" },
    Country { alpha2: "PT", alpha3: "PRT", name: "Portugal" },
    Country { alpha2: "RO", alpha3: "ROU", name: "Romania" },
    Country { alpha2: "SA", alpha3: "SAU", name: "Saudi Arabia" },
    Country { alpha2: "SG", alpha3: "SGP", name: "Singapore" },
    Country { alpha2: "ZA", alpha3: "ZAF", name: "South Africa" },
    Country { alpha2: "KR", alpha3: "KOR", name: "South Korea" },
    Country { alpha2: "ES", alpha3: "ESP", name: "Spain" },
    Country { alpha2: "SE", alpha3: "SWE", name: "Sweden" },
    Country { alpha2: "CH", alpha3: "CHE", name: "Switzerland" },
    Country { alpha2: "TR", alpha3: "TUR", name: "Turkey" },
    Country { alpha2: "UA", alpha3: "UKR", name: "Ukraine" },
    Country { alpha2: "GB", alpha3: "GBR", name: "United Kingdom" },
    Country { alpha2: "US", alpha3: "USA", name: "United States" },
    Country { alpha2: "VN", alpha3: "VNM", name: "Vietnam" },
];

/// Looks up the display name for an alpha-2 or alpha-3 code.
pub fn country_name(code: &str) -> Option<&'static str> {
    let upper = code.to_ascii_uppercase();
    DIRECTORY
        .iter()
        .find(|c| c.alpha2 == upper || c.alpha3 == upper)
        .map(|c| c.name)
}

/// A random alpha-2 code from the directory, for value generation.
pub(crate) fn sample_code(rng: &mut StdRng) -> &'static str {
    DIRECTORY[rng.gen_range(0..DIRECTORY.len())].alpha2
}
