//! Embedded port table and country recognition

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{AgentResult, PortInfo, PortLookup};

/// Major container ports: display name, UN/LOCODE, country.
const PORTS: &[(&str, &str, &str)] = &[
    ("Shanghai", "CNSHA", "China"),
    ("Ningbo", "CNNGB", "China"),
    ("Shenzhen", "CNSZX", "China"),
    ("Qingdao", "CNTAO", "China"),
    ("Singapore", "SGSIN", "Singapore"),
    ("Busan", "KRPUS", "South Korea"),
    ("Los Angeles", "USLAX", "USA"),
    ("Long Beach", "USLGB", "USA"),
    ("New York", "USNYC", "USA"),
    ("Savannah", "USSAV", "USA"),
    ("Rotterdam", "NLRTM", "Netherlands"),
    ("Antwerp", "BEANR", "Belgium"),
    ("Hamburg", "DEHAM", "Germany"),
    ("Felixstowe", "GBFXT", "United Kingdom"),
    ("Le Havre", "FRLEH", "France"),
    ("Nhava Sheva", "INNSA", "India"),
    ("Mundra", "INMUN", "India"),
    ("Chennai", "INMAA", "India"),
    ("Jebel Ali", "AEJEA", "UAE"),
    ("Dubai", "AEJEA", "UAE"),
    ("Santos", "BRSSZ", "Brazil"),
    ("Colombo", "LKCMB", "Sri Lanka"),
    ("Port Klang", "MYPKG", "Malaysia"),
    ("Ho Chi Minh City", "VNSGN", "Vietnam"),
    ("Laem Chabang", "THLCH", "Thailand"),
];

/// Country names customers write instead of ports.
const COUNTRIES: &[&str] = &[
    "usa",
    "united states",
    "america",
    "china",
    "india",
    "germany",
    "uk",
    "united kingdom",
    "france",
    "netherlands",
    "belgium",
    "brazil",
    "japan",
    "south korea",
    "malaysia",
    "uae",
    "united arab emirates",
    "vietnam",
    "thailand",
    "indonesia",
    "australia",
    "canada",
    "mexico",
    "spain",
    "italy",
    "turkey",
    "egypt",
    "south africa",
    "sri lanka",
];

/// A recognized location.
pub(crate) enum Location {
    Port { name: String, code: String, country: String },
    Country(String),
    Unknown,
}

/// Classify a free-form location name.
pub(crate) fn classify(name: &str) -> Location {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Location::Unknown;
    }
    for (port, code, country) in PORTS {
        if port.to_lowercase() == needle {
            return Location::Port {
                name: (*port).to_string(),
                code: (*code).to_string(),
                country: (*country).to_string(),
            };
        }
    }
    if COUNTRIES.contains(&needle.as_str()) {
        return Location::Country(canonical_country(&needle));
    }
    Location::Unknown
}

/// Canonical country spelling for aliases.
fn canonical_country(needle: &str) -> String {
    match needle {
        "usa" | "united states" | "america" => "USA".to_string(),
        "uk" | "united kingdom" => "United Kingdom".to_string(),
        "uae" | "united arab emirates" => "UAE".to_string(),
        _ => {
            let mut out = String::new();
            for word in needle.split_whitespace() {
                if !out.is_empty() {
                    out.push(' ');
                }
                let mut chars = word.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            out
        }
    }
}

/// Port lookup backed by the embedded table.
///
/// A country name answers `is_country = true`; an unknown name echoes
/// the input with no code so responses can still display it.
pub struct PortLookupAgent;

#[async_trait]
impl PortLookup for PortLookupAgent {
    async fn lookup(&self, port_name: &str) -> AgentResult<PortInfo> {
        let info = match classify(port_name) {
            Location::Port { name, code, country } => PortInfo {
                port_name: name,
                port_code: Some(code),
                country: Some(country),
                is_country: false,
            },
            Location::Country(country) => PortInfo {
                port_name: country.clone(),
                port_code: None,
                country: Some(country),
                is_country: true,
            },
            Location::Unknown => PortInfo {
                port_name: port_name.trim().to_string(),
                port_code: None,
                country: None,
                is_country: false,
            },
        };
        Ok(info)
    }
}
