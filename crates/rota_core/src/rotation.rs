use crate::error::AppError;

pub const DEFAULT_PARTICIPANTS: [&str; 2] = ["Fernand", "Yvonne"];

/// Ordered ring of participants. Completing a task hands it to the next
/// name in the ring; with the default two names this is a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    participants: Vec<String>,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            participants: DEFAULT_PARTICIPANTS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Rotation {
    pub fn new<I, S>(participants: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for raw in participants {
            let name = raw.as_ref().trim();
            if name.is_empty() {
                return Err(AppError::invalid_data("participant names cannot be blank"));
            }
            if names.iter().any(|existing| existing == name) {
                return Err(AppError::invalid_data(format!(
                    "participant '{name}' is listed twice"
                )));
            }
            names.push(name.to_string());
        }

        if names.len() < 2 {
            return Err(AppError::invalid_data(
                "rotation needs at least two participants",
            ));
        }

        Ok(Self {
            participants: names,
        })
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Canonical spelling of `name` if it matches a participant ignoring
    /// case and surrounding whitespace.
    pub fn resolve(&self, name: &str) -> Result<&str, AppError> {
        let trimmed = name.trim();
        self.participants
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "'{trimmed}' is not one of: {}",
                    self.participants.join(", ")
                ))
            })
    }

    pub fn next(&self, current: &str) -> Result<&str, AppError> {
        let index = self.position(current).ok_or_else(|| {
            AppError::invalid_data(format!("'{current}' is not a participant"))
        })?;
        Ok(&self.participants[(index + 1) % self.participants.len()])
    }

    /// The two-person swap. Only an involution when exactly two
    /// participants are configured; otherwise it is `next`.
    pub fn other(&self, current: &str) -> Result<&str, AppError> {
        self.next(current)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.participants.iter().position(|candidate| candidate == name)
    }
}

#[cfg(test)]
mod tests {
    use super::Rotation;

    #[test]
    fn default_rotation_swaps_the_two_names() {
        let rotation = Rotation::default();
        assert_eq!(rotation.other("Fernand").unwrap(), "Yvonne");
        assert_eq!(rotation.other("Yvonne").unwrap(), "Fernand");
    }

    #[test]
    fn other_is_an_involution_for_two_participants() {
        let rotation = Rotation::default();
        for name in rotation.participants() {
            let once = rotation.other(name).unwrap();
            assert_eq!(rotation.other(once).unwrap(), name);
        }
    }

    #[test]
    fn three_participants_rotate_in_order() {
        let rotation = Rotation::new(["Ana", "Ben", "Cleo"]).unwrap();
        assert_eq!(rotation.next("Ana").unwrap(), "Ben");
        assert_eq!(rotation.next("Ben").unwrap(), "Cleo");
        assert_eq!(rotation.next("Cleo").unwrap(), "Ana");
    }

    #[test]
    fn unknown_owner_is_reported() {
        let err = Rotation::default().next("Mallory").unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn resolve_matches_case_insensitively() {
        let rotation = Rotation::default();
        assert_eq!(rotation.resolve(" yvonne ").unwrap(), "Yvonne");
        assert_eq!(rotation.resolve("Bob").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn new_rejects_short_or_duplicate_lists() {
        assert!(Rotation::new(["Solo"]).is_err());
        assert!(Rotation::new(["Ana", "Ana"]).is_err());
        assert!(Rotation::new(["Ana", " "]).is_err());
    }
}
