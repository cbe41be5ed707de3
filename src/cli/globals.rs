use crate::{auth::Tier, db::Bindings};

/// Arguments shared by every action that talks to the database.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub tier: Tier,
    pub bindings: Bindings,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(tier: Tier, bindings: Bindings) -> Self {
        Self { tier, bindings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_global_args() {
        let bindings = Bindings::new(
            "HYPERDRIVE".to_string(),
            Some(SecretString::from("postgres://localhost/varco")),
        );
        let args = GlobalArgs::new(Tier::Local, bindings);
        assert_eq!(args.tier, Tier::Local);
        assert_eq!(args.bindings.binding(), "HYPERDRIVE");
        // The connection string never appears in debug output.
        assert!(!format!("{args:?}").contains("postgres://"));
    }
}
