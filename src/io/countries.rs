//! Free-text country names → ISO 3166-1 alpha-3 codes.
//!
//! Used by the upload converters only; source adapters keep provider names
//! untouched. Lookup order: manual overrides for renamed or ambiguous entities,
//! then the ISO short name, then alpha-2/alpha-3 codes (all case-insensitive).

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

const ISO_3166_CSV: &str = include_str!("../../assets/iso3166.csv");

/// Common spellings that do not match the ISO short name.
const NAME_FIXES: &[(&str, &str)] = &[
    ("korea, south", "korea, republic of"),
    ("south korea", "korea, republic of"),
    ("republic of korea", "korea, republic of"),
    ("korea, north", "korea, democratic people's republic of"),
    ("north korea", "korea, democratic people's republic of"),
    ("cote d'ivoire", "côte d'ivoire"),
    ("ivory coast", "côte d'ivoire"),
    ("bahamas, the", "bahamas"),
    ("the bahamas", "bahamas"),
    ("gambia, the", "gambia"),
    ("the gambia", "gambia"),
    ("congo, democratic republic of the", "congo, the democratic republic of the"),
    ("democratic republic of the congo", "congo, the democratic republic of the"),
    ("congo, dem. rep.", "congo, the democratic republic of the"),
    ("congo (kinshasa)", "congo, the democratic republic of the"),
    ("dr congo", "congo, the democratic republic of the"),
    ("congo, republic of the", "congo"),
    ("republic of the congo", "congo"),
    ("congo, rep.", "congo"),
    ("congo (brazzaville)", "congo"),
    ("russia", "russian federation"),
    ("bolivia", "bolivia, plurinational state of"),
    ("iran", "iran, islamic republic of"),
    ("moldova", "moldova, republic of"),
    ("syria", "syrian arab republic"),
    ("vietnam", "viet nam"),
    ("lao pdr", "lao people's democratic republic"),
    ("laos", "lao people's democratic republic"),
    ("macedonia", "north macedonia"),
    ("swaziland", "eswatini"),
    ("turkey", "türkiye"),
    ("czech republic", "czechia"),
    ("tanzania", "tanzania, united republic of"),
    ("venezuela", "venezuela, bolivarian republic of"),
    ("brunei", "brunei darussalam"),
    ("micronesia", "micronesia, federated states of"),
    ("palestine", "palestine, state of"),
    ("taiwan", "taiwan, province of china"),
    ("cape verde", "cabo verde"),
    ("burma", "myanmar"),
    ("east timor", "timor-leste"),
    ("vatican", "holy see (vatican city state)"),
    ("united states of america", "united states"),
    ("great britain", "united kingdom"),
    ("uk", "united kingdom"),
];

#[derive(Debug, Deserialize)]
struct IsoRow {
    alpha2: String,
    alpha3: String,
    name: String,
}

struct CountryIndex {
    by_name: HashMap<String, String>,
    by_code: HashMap<String, String>,
}

static INDEX: LazyLock<CountryIndex> = LazyLock::new(build_index);

fn build_index() -> CountryIndex {
    let mut by_name = HashMap::new();
    let mut by_code = HashMap::new();
    let mut reader = csv::Reader::from_reader(ISO_3166_CSV.as_bytes());
    for row in reader.deserialize::<IsoRow>().flatten() {
        by_name.insert(row.name.to_lowercase(), row.alpha3.clone());
        by_code.insert(row.alpha2.to_lowercase(), row.alpha3.clone());
        by_code.insert(row.alpha3.to_lowercase(), row.alpha3);
    }
    CountryIndex { by_name, by_code }
}

/// Resolve a free-text country name (or ISO code) to its alpha-3 code.
pub fn to_iso3(name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    let fixed = NAME_FIXES
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
        .unwrap_or(key.as_str());

    let index: &'static CountryIndex = &INDEX;
    index
        .by_name
        .get(fixed)
        .or_else(|| index.by_code.get(fixed))
        .map(String::as_str)
}
