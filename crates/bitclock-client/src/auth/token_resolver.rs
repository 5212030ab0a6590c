//! API token lookup: config, then `BITCLOCK_TOKEN`, then the cookie header.

use std::sync::{Mutex, PoisonError};

use bitclock_core::constants::TOKEN_ENV_VAR;
use bitclock_core::{ConfigStore, OneShot};

/// Resolves and memoizes the API token.
///
/// A found token is memoized until [`TokenResolver::reset`] or until the
/// store's token revision moves. A miss is never memoized, so a token that
/// appears later is picked up on the next call.
#[derive(Debug)]
pub struct TokenResolver {
    config: ConfigStore,
    memo: Mutex<Memo>,
}

#[derive(Debug)]
struct Memo {
    revision: u64,
    token: OneShot<Option<String>>,
}

impl TokenResolver {
    pub fn new(config: ConfigStore) -> Self {
        let revision = config.token_revision();
        Self {
            config,
            memo: Mutex::new(Memo {
                revision,
                token: OneShot::new(),
            }),
        }
    }

    pub fn get_token(&self) -> Option<String> {
        let revision = self.config.token_revision();
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if memo.revision != revision {
            memo.revision = revision;
            memo.token.reset();
        }
        let token = memo.token.fire(|| self.lookup());
        if token.is_none() {
            memo.token.reset();
        }
        token
    }

    /// Forget the memoized token.
    pub fn reset(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .reset();
    }

    fn lookup(&self) -> Option<String> {
        let (token, cookie) = self
            .config
            .with(|c| (c.token.clone(), c.cookie.clone()));
        token
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
            .or_else(|| cookie.as_deref().and_then(token_from_cookie))
    }
}

/// Pull the `BITCLOCK_TOKEN` entry out of a `Cookie` header value.
pub fn token_from_cookie(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == TOKEN_ENV_VAR)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
