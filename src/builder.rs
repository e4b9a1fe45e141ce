use crate::ast::{Directives, EnvBlock, Environment, NestedRef};

impl Directives {
    /// Create an empty directive tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the script name. Parsing never fills this field.
    #[must_use]
    pub fn name(mut self, text: &str) -> Self {
        self.name = text.to_string();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    /// Replace the block for one environment.
    #[must_use]
    pub fn env_block(mut self, env: Environment, block: EnvBlock) -> Self {
        *self.env_mut(env) = block;
        self
    }
}

impl EnvBlock {
    /// Create an empty environment block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal substitution keyword.
    #[must_use]
    pub fn keyword(mut self, key: &str, value: &str) -> Self {
        self.keywords.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a `sqlmref("name")` reference.
    #[must_use]
    pub fn sqlm_ref(mut self, key: &str, name: &str) -> Self {
        self.nested.push(NestedRef::name(key, name));
        self
    }

    /// Add a `sqlmfile("path")` reference.
    #[must_use]
    pub fn sqlm_file(mut self, key: &str, path: &str) -> Self {
        self.nested.push(NestedRef::file(key, path));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RefSource;

    #[test]
    fn builds_env_blocks() {
        let d = Directives::new().description("loads d").env_block(
            Environment::Prod,
            EnvBlock::new()
                .keyword("t", "A.B")
                .sqlm_ref("x", "proj-x")
                .sqlm_file("y", "y.sql"),
        );
        assert_eq!(d.description, "loads d");
        assert!(d.dev.is_empty());
        assert_eq!(d.prod.keywords["t"], "A.B");
        assert_eq!(d.prod.nested[0].source, RefSource::Name("proj-x".to_string()));
        assert_eq!(d.prod.nested[1].source, RefSource::File("y.sql".to_string()));
    }

    #[test]
    fn name_is_set_by_builder() {
        let d = Directives::new().name("proj loader").description("x");
        assert_eq!(d.name, "proj loader");
        assert_eq!(d.description, "x");
    }
}
