use ahash::AHashSet;

/// Mints step names that do not collide with any name already in a version.
pub trait StepNamer: Send + Sync {
    fn mint(&self, taken: &AHashSet<String>) -> String;
}

/// Produces `<prefix>_<n>` with the smallest positive `n` not yet taken.
#[derive(Debug, Clone)]
pub struct SequentialNamer {
    prefix: String,
}

impl SequentialNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for SequentialNamer {
    fn default() -> Self {
        Self::new("step")
    }
}

impl StepNamer for SequentialNamer {
    fn mint(&self, taken: &AHashSet<String>) -> String {
        (1..)
            .map(|n| format!("{}_{}", self.prefix, n))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| format!("{}_{}", self.prefix, taken.len() + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_the_lowest_gap() {
        let taken: AHashSet<String> = ["step_1", "step_3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(SequentialNamer::default().mint(&taken), "step_2");
    }

    #[test]
    fn honours_custom_prefix() {
        let namer = SequentialNamer::new("branch_step");
        assert_eq!(namer.mint(&AHashSet::new()), "branch_step_1");
    }
}
