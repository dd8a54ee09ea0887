//! Small offline gazetteer of manufacturing countries, their major
//! production cities and the Chinese provinces listings tend to name.

pub const CHINA: &str = "China";

pub const CHINA_PROVINCES: &[&str] = &[
    "guangdong",
    "zhejiang",
    "jiangsu",
    "shandong",
    "fujian",
    "shanghai",
    "beijing",
    "tianjin",
    "chongqing",
    "sichuan",
];

pub struct Place {
    pub country: &'static str,
    /// Lowercase spellings that identify the country itself.
    pub aliases: &'static [&'static str],
    pub cities: &'static [&'static str],
}

pub const PLACES: &[Place] = &[
    Place {
        country: CHINA,
        aliases: &["china", "prc"],
        cities: &["shenzhen", "guangzhou", "yiwu", "dongguan", "ningbo", "xiamen", "foshan"],
    },
    Place {
        country: "Vietnam",
        aliases: &["vietnam", "viet nam"],
        cities: &["hanoi", "ho chi minh city", "haiphong", "da nang", "binh duong"],
    },
    Place {
        country: "India",
        aliases: &["india"],
        cities: &["mumbai", "delhi", "bangalore", "chennai", "tiruppur", "ludhiana"],
    },
    Place {
        country: "Mexico",
        aliases: &["mexico"],
        cities: &["monterrey", "guadalajara", "tijuana", "ciudad juarez"],
    },
    Place {
        country: "Bangladesh",
        aliases: &["bangladesh"],
        cities: &["dhaka", "chittagong"],
    },
    Place {
        country: "Indonesia",
        aliases: &["indonesia"],
        cities: &["jakarta", "surabaya", "bandung"],
    },
    Place {
        country: "Thailand",
        aliases: &["thailand"],
        cities: &["bangkok", "chiang mai"],
    },
    Place {
        country: "Malaysia",
        aliases: &["malaysia"],
        cities: &["kuala lumpur", "penang"],
    },
    Place {
        country: "Philippines",
        aliases: &["philippines"],
        cities: &["manila", "cebu"],
    },
    Place {
        country: "Cambodia",
        aliases: &["cambodia"],
        cities: &["phnom penh"],
    },
    Place {
        country: "Taiwan",
        aliases: &["taiwan"],
        cities: &["taipei", "taichung", "hsinchu"],
    },
    Place {
        country: "South Korea",
        aliases: &["south korea", "korea"],
        cities: &["seoul", "busan"],
    },
    Place {
        country: "Japan",
        aliases: &["japan"],
        cities: &["tokyo", "osaka", "nagoya"],
    },
    Place {
        country: "Turkey",
        aliases: &["turkey", "turkiye"],
        cities: &["istanbul", "izmir", "bursa"],
    },
    Place {
        country: "Pakistan",
        aliases: &["pakistan"],
        cities: &["karachi", "lahore", "sialkot"],
    },
    Place {
        country: "Sri Lanka",
        aliases: &["sri lanka"],
        cities: &["colombo"],
    },
    Place {
        country: "Poland",
        aliases: &["poland"],
        cities: &["warsaw", "krakow", "lodz"],
    },
    Place {
        country: "Portugal",
        aliases: &["portugal"],
        cities: &["porto", "lisbon"],
    },
    Place {
        country: "Italy",
        aliases: &["italy"],
        cities: &["milan", "florence", "prato"],
    },
    Place {
        country: "Germany",
        aliases: &["germany"],
        cities: &["berlin", "munich", "stuttgart"],
    },
    Place {
        country: "United States",
        aliases: &["united states", "usa"],
        cities: &["detroit", "los angeles", "chicago"],
    },
    Place {
        country: "Canada",
        aliases: &["canada"],
        cities: &["toronto", "montreal"],
    },
    Place {
        country: "Brazil",
        aliases: &["brazil"],
        cities: &["sao paulo"],
    },
    Place {
        country: "Colombia",
        aliases: &["colombia"],
        cities: &["medellin", "bogota"],
    },
    Place {
        country: "Morocco",
        aliases: &["morocco"],
        cities: &["casablanca", "tangier"],
    },
];

/// Byte offset of `word` in `text` when it appears as whole words.
///
/// `text` is expected to be lowercase with punctuation stripped.
pub fn find_word(text: &str, word: &str) -> Option<usize> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let haystack = format!(" {} ", normalized);
    let needle = format!(" {} ", word);
    haystack.find(&needle)
}

pub fn contains_word(text: &str, word: &str) -> bool {
    find_word(text, word).is_some()
}

/// A country found in text together with the cities that pointed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryMention {
    pub country: &'static str,
    pub cities: Vec<String>,
    position: usize,
}

/// Every gazetteer country mentioned in `text`, ordered by first mention.
pub fn find_countries(text: &str) -> Vec<CountryMention> {
    let mut mentions: Vec<CountryMention> = PLACES
        .iter()
        .filter_map(|place| {
            let alias_pos = place.aliases.iter().filter_map(|a| find_word(text, a)).min();
            let cities: Vec<(usize, &str)> = place
                .cities
                .iter()
                .filter_map(|c| find_word(text, c).map(|pos| (pos, *c)))
                .collect();
            let city_pos = cities.iter().map(|(pos, _)| *pos).min();

            let position = match (alias_pos, city_pos) {
                (Some(a), Some(c)) => a.min(c),
                (Some(a), None) => a,
                (None, Some(c)) => c,
                (None, None) => return None,
            };

            Some(CountryMention {
                country: place.country,
                cities: cities.into_iter().map(|(_, c)| c.to_string()).collect(),
                position,
            })
        })
        .collect();

    mentions.sort_by_key(|m| m.position);
    mentions
}

/// True when `name` is a known country, alias or city.
pub fn is_known_place(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    PLACES
        .iter()
        .any(|p| p.aliases.contains(&name.as_str()) || p.cities.contains(&name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_word_respects_boundaries() {
        assert!(contains_word("made in china", "china"));
        assert!(!contains_word("indiana jones hat", "india"));
        assert_eq!(find_word("ships from ho chi minh city", "ho chi minh city"), Some(11));
    }

    #[test]
    fn test_find_countries_orders_by_first_mention() {
        let found = find_countries("designed in japan assembled in hanoi vietnam");
        let names: Vec<_> = found.iter().map(|m| m.country).collect();
        assert_eq!(names, vec!["Japan", "Vietnam"]);
        assert_eq!(found[1].cities, vec!["hanoi".to_string()]);
    }
}
