//! Authorization callback detection
//!
//! A visit is a callback iff it carries `state` and either `code` or
//! `access_token`. Parameters are read from the fragment (implicit-flow
//! servers put tokens there) and from the query, the query winning.

use std::collections::HashMap;

use url::Url;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallbackParams {
    pub state: String,
    pub code: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl CallbackParams {
    pub fn parse(url: &Url) -> Option<Self> {
        let mut params: HashMap<String, String> = url
            .fragment()
            .map(|f| form_urlencoded::parse(f.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        params.extend(url.query_pairs().into_owned());

        let state = params.remove("state")?;
        let code = params.remove("code");
        let access_token = params.remove("access_token");
        if code.is_none() && access_token.is_none() {
            return None;
        }

        Some(Self {
            state,
            code,
            access_token,
            refresh_token: params.remove("refresh_token"),
        })
    }
}

/// `url` with query and fragment removed.
pub(crate) fn strip_callback_params(url: &Url) -> Url {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    clean
}
