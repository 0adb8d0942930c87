//! Content libraries: hints, poems and achievement definitions.
//!
//! The kernel only keeps cursors into these collections; the collections
//! themselves live here and are loaded from a YAML or JSON file, or taken
//! from the built-in defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A poem shown by the `poem` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poem {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        for line in self.content.lines() {
            writeln!(f, "  {line}")?;
        }
        writeln!(f)?;
        write!(f, "  - {}", self.author)
    }
}

/// An achievement definition.
///
/// `min_explored` is the number of distinct visited locations that earns it;
/// definitions without a threshold are only unlocked by other collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub info: String,
    #[serde(default)]
    pub min_explored: Option<usize>,
}

/// Errors from content operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported content file {0:?}: expected .yaml, .yml or .json")]
    UnsupportedFormat(String),
    #[error("duplicate achievement id {0:?}")]
    DuplicateAchievement(String),
}

/// All auxiliary content a session can present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLibrary {
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub poems: Vec<Poem>,
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
}

impl ContentLibrary {
    /// An empty library: every presentation reports "nothing available".
    pub fn empty() -> Self {
        Self::default()
    }

    /// The library compiled into the binary.
    pub fn builtin() -> Self {
        let hints = [
            "Type 'help' to list every command.",
            "Walk with 'go <direction>' or just 'n', 'e', 's' and 'w'.",
            "The world grows as you walk: every step off the map makes a new place.",
            "'map' draws the places you have already visited.",
            "'save' writes your progress; 'quit' warns you if you forgot.",
            "'config bars' swaps fractions for bars.",
        ];
        let poems = vec![
            Poem {
                title: "Fire and Ice".into(),
                author: "Robert Frost".into(),
                content: "Some say the world will end in fire,\n\
                          Some say in ice.\n\
                          From what I've tasted of desire\n\
                          I hold with those who favor fire.\n\
                          But if it had to perish twice,\n\
                          I think I know enough of hate\n\
                          To say that for destruction ice\n\
                          Is also great\n\
                          And would suffice."
                    .into(),
            },
            Poem {
                title: "Eternity".into(),
                author: "William Blake".into(),
                content: "He who binds to himself a joy\n\
                          Does the winged life destroy;\n\
                          But he who kisses the joy as it flies\n\
                          Lives in eternity's sun rise."
                    .into(),
            },
        ];
        let achievements = vec![
            AchievementDef {
                id: "first_steps".into(),
                name: "First Steps".into(),
                info: "Leave the place where you woke up.".into(),
                min_explored: Some(2),
            },
            AchievementDef {
                id: "wanderer".into(),
                name: "Wanderer".into(),
                info: "Visit 10 different places.".into(),
                min_explored: Some(10),
            },
            AchievementDef {
                id: "cartographer".into(),
                name: "Cartographer".into(),
                info: "Visit 50 different places.".into(),
                min_explored: Some(50),
            },
        ];
        Self {
            hints: hints.iter().map(|h| h.to_string()).collect(),
            poems,
            achievements,
        }
    }

    /// Load a library from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let library: Self = match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_reader(file)?,
            Some("json") => serde_json::from_reader(file)?,
            _ => return Err(ContentError::UnsupportedFormat(path.display().to_string())),
        };
        library.validate()?;
        tracing::info!(
            path = %path.display(),
            hints = library.hints.len(),
            poems = library.poems.len(),
            achievements = library.achievements.len(),
            "loaded content library"
        );
        Ok(library)
    }

    /// Save the library as YAML or JSON, chosen by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::to_writer(std::fs::File::create(path)?, self)?,
            Some("json") => serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?,
            _ => return Err(ContentError::UnsupportedFormat(path.display().to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ContentError> {
        let mut seen = std::collections::BTreeSet::new();
        for a in &self.achievements {
            if !seen.insert(a.id.as_str()) {
                return Err(ContentError::DuplicateAchievement(a.id.clone()));
            }
        }
        Ok(())
    }

    /// Threshold achievements earned by having explored `explored` places
    /// that `is_unlocked` does not already report.
    pub fn earned_by_exploration<'a>(
        &'a self,
        explored: usize,
        is_unlocked: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a AchievementDef> + 'a {
        self.achievements.iter().filter(move |a| {
            a.min_explored.is_some_and(|min| explored >= min) && !is_unlocked(&a.id)
        })
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn crate_info() -> &'static str {
    "dungeon-content v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_is_populated() {
        let lib = ContentLibrary::builtin();
        assert!(!lib.hints.is_empty());
        assert!(!lib.poems.is_empty());
        assert!(lib.achievements.iter().any(|a| a.id == "first_steps"));
        lib.validate().unwrap();
    }

    #[test]
    fn load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.yaml");
        std::fs::write(
            &path,
            "hints:\n  - one\n  - two\npoems:\n  - title: T\n    author: A\n    content: |\n      line 1\n      line 2\n",
        )
        .unwrap();

        let lib = ContentLibrary::load(&path).unwrap();
        assert_eq!(lib.hints, vec!["one", "two"]);
        assert_eq!(lib.poems[0].content, "line 1\nline 2\n");
        assert!(lib.achievements.is_empty());
    }

    #[test]
    fn save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        let lib = ContentLibrary::builtin();
        lib.save(&path).unwrap();
        assert_eq!(ContentLibrary::load(&path).unwrap(), lib);
    }

    #[test]
    fn unknown_extension_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            ContentLibrary::load(tmp.path()),
            Err(ContentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn duplicate_achievements_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.yml");
        std::fs::write(
            &path,
            "achievements:\n  - {id: a, name: A, info: x}\n  - {id: a, name: B, info: y}\n",
        )
        .unwrap();
        assert!(matches!(
            ContentLibrary::load(&path),
            Err(ContentError::DuplicateAchievement(id)) if id == "a"
        ));
    }

    #[test]
    fn exploration_thresholds() {
        let lib = ContentLibrary::builtin();
        let earned: Vec<&str> = lib
            .earned_by_exploration(10, |_| false)
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(earned, vec!["first_steps", "wanderer"]);

        let earned: Vec<&str> = lib
            .earned_by_exploration(10, |id| id == "first_steps")
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(earned, vec!["wanderer"]);

        assert_eq!(lib.earned_by_exploration(1, |_| false).count(), 0);
    }

    #[test]
    fn poem_display_includes_author() {
        let poem = &ContentLibrary::builtin().poems[1];
        let text = poem.to_string();
        assert!(text.starts_with("Eternity"));
        assert!(text.ends_with("- William Blake"));
    }
}
