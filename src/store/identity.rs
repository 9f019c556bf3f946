use dashmap::DashMap;
use uuid::Uuid;

use crate::models::actor::Actor;

/// Opaque bearer tokens bound to an actor. Credential checks happen
/// upstream; this only records what the identity provider vouched for.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: DashMap<String, Actor>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, actor: Actor) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), actor);
        token
    }

    pub fn bind(&self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }

    pub fn resolve(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::Role;

    #[test]
    fn issued_token_resolves_to_its_actor() {
        let registry = TokenRegistry::new();
        let actor = Actor::new(Uuid::new_v4(), Role::Rider, "Kemi");
        let token = registry.issue(actor.clone());

        assert_eq!(registry.resolve(&token), Some(actor));
        assert_eq!(registry.resolve("unknown"), None);
    }
}
