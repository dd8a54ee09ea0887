use crate::domain::model::Category;
use crate::utils::error::{HunterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryProfile {
    pub name: String,
    pub common_alternatives: Vec<String>,
    pub labor_cost_index: f64,
    pub lead_time: String,
    /// Tariff applied to alternatives missing from the country table.
    #[serde(default)]
    pub tariff_rate: Option<f64>,
    #[serde(default)]
    pub considerations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    /// Labor cost relative to China.
    pub labor_cost_index: f64,
    pub lead_time: String,
    pub tariff_rate: f64,
}

/// Industry profiles keyed by category name plus per-country cost data.
///
/// A profiles file only needs the entries it overrides; everything else
/// keeps the built-in values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourcingProfiles {
    #[serde(default)]
    pub profiles: BTreeMap<String, IndustryProfile>,
    #[serde(default)]
    pub countries: BTreeMap<String, CountryProfile>,
}

fn profile(
    name: &str,
    alternatives: &[&str],
    labor_cost_index: f64,
    lead_time: &str,
    considerations: &[&str],
) -> IndustryProfile {
    IndustryProfile {
        name: name.to_string(),
        common_alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        labor_cost_index,
        lead_time: lead_time.to_string(),
        tariff_rate: None,
        considerations: considerations.iter().map(|s| s.to_string()).collect(),
    }
}

fn country(labor_cost_index: f64, lead_time: &str, tariff_rate: f64) -> CountryProfile {
    CountryProfile {
        labor_cost_index,
        lead_time: lead_time.to_string(),
        tariff_rate,
    }
}

impl SourcingProfiles {
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "general".to_string(),
            profile(
                "General Products",
                &["Vietnam", "India", "Mexico"],
                0.8,
                "4-6 weeks",
                &[
                    "General manufacturing capabilities required",
                    "Moderate quality expectations",
                ],
            ),
        );
        profiles.insert(
            "electronics".to_string(),
            profile(
                "Consumer Electronics",
                &["Vietnam", "Malaysia", "Taiwan", "Mexico"],
                0.85,
                "6-8 weeks",
                &[
                    "Component supply often still routes through China",
                    "Safety and radio certifications must be redone for a new factory",
                ],
            ),
        );
        profiles.insert(
            "apparel".to_string(),
            profile(
                "Apparel & Textiles",
                &["Bangladesh", "Vietnam", "India", "Cambodia"],
                0.6,
                "6-10 weeks",
                &[
                    "Fabric and trims may still be sourced from China",
                    "Audit labor compliance before switching suppliers",
                ],
            ),
        );
        profiles.insert(
            "home".to_string(),
            profile(
                "Home & Kitchen",
                &["India", "Vietnam", "Turkey", "Mexico"],
                0.8,
                "5-8 weeks",
                &[
                    "Bulky goods make freight a large share of landed cost",
                    "Food-contact items need material testing",
                ],
            ),
        );
        profiles.insert(
            "toys".to_string(),
            profile(
                "Toys & Games",
                &["Vietnam", "Indonesia", "India"],
                0.75,
                "6-8 weeks",
                &[
                    "Toy safety testing is required for each new factory",
                    "Tooling and molds may need to be transferred",
                ],
            ),
        );

        let countries = [
            ("Vietnam", country(0.7, "4-6 weeks", 0.10)),
            ("India", country(0.6, "5-7 weeks", 0.10)),
            ("Mexico", country(1.1, "1-3 weeks", 0.0)),
            ("Bangladesh", country(0.45, "6-8 weeks", 0.10)),
            ("Indonesia", country(0.65, "5-7 weeks", 0.10)),
            ("Thailand", country(0.85, "4-6 weeks", 0.10)),
            ("Malaysia", country(0.9, "4-6 weeks", 0.10)),
            ("Cambodia", country(0.5, "6-8 weeks", 0.10)),
            ("Philippines", country(0.7, "5-7 weeks", 0.10)),
            ("Taiwan", country(1.4, "3-5 weeks", 0.10)),
            ("Turkey", country(0.9, "3-5 weeks", 0.10)),
        ]
        .into_iter()
        .map(|(name, profile)| (name.to_string(), profile))
        .collect();

        Self {
            profiles,
            countries,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HunterError::ConfigValidationError {
            field: "sourcing.profiles_path".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Built-in profiles overlaid with the file at `path`. A missing file
    /// is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut merged = Self::builtin();
        let Some(path) = path else {
            return Ok(merged);
        };

        if !path.exists() {
            tracing::warn!(
                "Sourcing profiles not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(merged);
        }

        let overrides = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(
            "Loaded {} industry profiles and {} countries from {}",
            overrides.profiles.len(),
            overrides.countries.len(),
            path.display()
        );
        merged.profiles.extend(overrides.profiles);
        merged.countries.extend(overrides.countries);
        Ok(merged)
    }

    /// Profile for a category, falling back to `general`.
    pub fn for_category(&self, category: Category) -> Option<&IndustryProfile> {
        self.profiles
            .get(category.as_str())
            .or_else(|| self.profiles.get(Category::General.as_str()))
    }

    pub fn country(&self, name: &str) -> Option<&CountryProfile> {
        self.countries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_general_profile() {
        let profiles = SourcingProfiles::builtin();
        let general = profiles.for_category(Category::General).unwrap();
        assert_eq!(general.name, "General Products");
        assert_eq!(general.common_alternatives, vec!["Vietnam", "India", "Mexico"]);
        assert_eq!(general.lead_time, "4-6 weeks");
        assert_eq!(general.considerations.len(), 2);
    }

    #[test]
    fn test_missing_file_uses_builtin() {
        let profiles =
            SourcingProfiles::load(Some(Path::new("/definitely/not/here.toml"))).unwrap();
        assert_eq!(profiles, SourcingProfiles::builtin());
    }

    #[test]
    fn test_file_overrides_merge_with_builtin() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[profiles.toys]
name = "Plush Toys"
common_alternatives = ["Indonesia", "Cambodia"]
labor_cost_index = 0.6
lead_time = "8-10 weeks"

[countries.Cambodia]
labor_cost_index = 0.4
lead_time = "7-9 weeks"
tariff_rate = 0.05
"#
        )
        .unwrap();

        let profiles = SourcingProfiles::load(Some(file.path())).unwrap();
        let toys = profiles.for_category(Category::Toys).unwrap();
        assert_eq!(toys.name, "Plush Toys");
        assert!(toys.considerations.is_empty());
        assert_eq!(profiles.country("Cambodia").unwrap().tariff_rate, 0.05);
        // 未覆寫的保持預設
        assert!(profiles.for_category(Category::Apparel).is_some());
        assert_eq!(profiles.country("Vietnam").unwrap().labor_cost_index, 0.7);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = SourcingProfiles::from_toml_str("[profiles.general\nname = 1").unwrap_err();
        assert!(matches!(err, HunterError::ConfigValidationError { .. }));
    }
}
