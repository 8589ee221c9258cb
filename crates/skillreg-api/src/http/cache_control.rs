//! `Cache-Control` response header policy (§6): public list/detail/download
//! responses are edge-cacheable; anything gated by visibility or caller
//! identity is not.

use axum::http::HeaderValue;
use skillreg_types::skill::Visibility;

const MAX_AGE_SECS: u32 = 60;
const STALE_WHILE_REVALIDATE_SECS: u32 = 300;

pub fn public() -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={MAX_AGE_SECS}, stale-while-revalidate={STALE_WHILE_REVALIDATE_SECS}"))
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=60"))
}

pub fn private() -> HeaderValue {
    HeaderValue::from_static("private, no-cache")
}

pub fn for_visibility(visibility: Visibility) -> HeaderValue {
    if visibility == Visibility::Public {
        public()
    } else {
        private()
    }
}

pub fn for_is_public(is_public: bool) -> HeaderValue {
    if is_public { public() } else { private() }
}
