use crate::error::SettingsError;
use serde::Deserialize;
use towerc_resolve_models::{Symbol, names};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TowerSettings {
    /// Resolve through context receiver groups.
    pub context_receivers: bool,
    /// Skip positions whose scope provably lacks the requested name.
    pub prune_by_name: bool,
    pub hides_members_names: Vec<String>,
}

impl Default for TowerSettings {
    fn default() -> Self {
        TowerSettings {
            context_receivers: false,
            prune_by_name: true,
            hides_members_names: names::HIDES_MEMBERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TowerSettings {
    pub fn from_toml(source: &str) -> Result<TowerSettings, SettingsError> {
        let settings: TowerSettings = toml::from_str(source)?;
        if settings.hides_members_names.iter().any(|name| name.is_empty()) {
            return Err(SettingsError::EmptyHidesMembersName);
        }
        Ok(settings)
    }

    pub fn hides_members_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.hides_members_names.iter().map(|name| Symbol::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TowerSettings::default();
        assert!(!settings.context_receivers);
        assert!(settings.prune_by_name);
        assert_eq!(settings.hides_members_names, vec!["forEach", "addSuppressed"]);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(TowerSettings::from_toml("").unwrap(), TowerSettings::default());
    }

    #[test]
    fn test_parse_overrides() {
        let settings = TowerSettings::from_toml(
            r#"
            context-receivers = true
            prune-by-name = false
            hides-members-names = ["forEach"]
            "#,
        )
        .unwrap();
        assert!(settings.context_receivers);
        assert!(!settings.prune_by_name);
        let names: Vec<_> = settings.hides_members_symbols().collect();
        assert_eq!(names, vec![Symbol::new("forEach")]);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            TowerSettings::from_toml("context-receivers = 3"),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(
            TowerSettings::from_toml("hides-members-names = [\"\"]"),
            Err(SettingsError::EmptyHidesMembersName)
        ));
    }
}
